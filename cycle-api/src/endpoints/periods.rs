use super::{PeriodId, UserId};
use crate::Endpoint;
use crate::macros::setter;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tower_api_client::{EmptyResponse, Method, Request, RequestData};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

// Common

/// One logged period. `end_date` is absent while the period is ongoing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub user_id: UserId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Server-reported length, counting both ends. Analytics derive their own from the dates.
    pub duration: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl Period {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }

    /// Whole days between start and end, `None` while open.
    pub fn duration_days(&self) -> Option<i64> {
        self.end_date
            .map(|end| end.signed_duration_since(self.start_date).num_days())
    }

    /// Chronological order, ties broken by id.
    pub fn chronological_key(&self) -> (NaiveDate, PeriodId) {
        (self.start_date, self.id)
    }
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListPeriods {
    page: u32,
    per_page: u32,
}

impl ListPeriods {
    pub fn new() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }

    setter!(page: u32);
    setter!(per_page: u32);
}

impl Default for ListPeriods {
    fn default() -> Self {
        Self::new()
    }
}

impl Request for ListPeriods {
    type Data = Self;
    type Response = Vec<Period>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/periods".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Query(self)
    }
}

impl Endpoint for ListPeriods {}

#[derive(Debug, Clone, Serialize)]
pub struct GetPeriod {
    period_id: PeriodId,
}

impl GetPeriod {
    pub fn new(period_id: PeriodId) -> Self {
        Self { period_id }
    }
}

impl Request for GetPeriod {
    type Data = ();
    type Response = Period;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/periods/{}", self.period_id).into()
    }
}

impl Endpoint for GetPeriod {}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePeriod {
    start_date: NaiveDate,
}

impl CreatePeriod {
    pub fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }
}

impl Request for CreatePeriod {
    type Data = Self;
    type Response = Period;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        "/periods".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

impl Endpoint for CreatePeriod {}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePeriod {
    #[serde(skip)]
    period_id: PeriodId,
    end_date: NaiveDate,
}

impl UpdatePeriod {
    pub fn new(period_id: PeriodId, end_date: NaiveDate) -> Self {
        Self {
            period_id,
            end_date,
        }
    }
}

impl Request for UpdatePeriod {
    type Data = Self;
    type Response = Period;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/periods/{}", self.period_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

impl Endpoint for UpdatePeriod {}

#[derive(Debug, Clone, Serialize)]
pub struct DeletePeriod {
    period_id: PeriodId,
}

impl DeletePeriod {
    pub fn new(period_id: PeriodId) -> Self {
        Self { period_id }
    }
}

impl Request for DeletePeriod {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/periods/{}", self.period_id).into()
    }
}

impl Endpoint for DeletePeriod {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_and_closed_periods() {
        let periods: Vec<Period> = serde_json::from_value(json!([
            {
                "id": 2,
                "user_id": 1,
                "start_date": "2024-02-25",
                "end_date": null,
                "duration": null,
                "created_at": "2024-02-25T08:12:44.120301"
            },
            {
                "id": 1,
                "user_id": 1,
                "start_date": "2024-01-29",
                "end_date": "2024-02-02",
                "duration": 5,
                "created_at": "2024-01-29T07:00:00"
            }
        ]))
        .unwrap();

        assert!(periods[0].is_open());
        assert_eq!(periods[0].duration_days(), None);
        assert_eq!(periods[1].duration_days(), Some(4));
        assert!(periods[1].chronological_key() < periods[0].chronological_key());
    }

    #[test]
    fn same_start_date_orders_by_id() {
        let mut periods: Vec<Period> = serde_json::from_value(json!([
            {"id": 9, "user_id": 1, "start_date": "2024-03-01", "end_date": null,
             "duration": null, "created_at": "2024-03-01T09:00:00"},
            {"id": 4, "user_id": 1, "start_date": "2024-03-01", "end_date": "2024-03-04",
             "duration": 4, "created_at": "2024-03-01T08:00:00"}
        ]))
        .unwrap();

        periods.sort_by_key(Period::chronological_key);

        let ids: Vec<i64> = periods.iter().map(|p| p.id.inner()).collect();
        assert_eq!(ids, vec![4, 9]);
        assert_ne!(periods[0], periods[1]);
    }

    #[test]
    fn update_body_omits_the_path_id() {
        let request = UpdatePeriod::new(PeriodId::new(9), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(request.endpoint(), "/periods/9");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"end_date": "2024-03-01"})
        );
    }
}
