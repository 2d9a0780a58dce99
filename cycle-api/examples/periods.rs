use cycle_api::{Client, CycleApiError, Request, Transport};

#[tokio::main]
pub async fn main() -> Result<(), CycleApiError> {
    let client = Client::default();

    let tokens = client
        .send(Request::auth().login("ada", "correct horse"), None)
        .await?;

    let req = Request::periods().list(1, 20);
    let periods = client.send(req, Some(&tokens.access_token)).await?;
    for period in periods {
        println!("{} {:?}", period.start_date, period.end_date);
    }
    Ok(())
}
