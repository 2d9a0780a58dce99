use cycle::config::AppConfig;
use cycle::testing::{date, period, FakeServer, PASSWORD};
use cycle::tracker::TrackerError;
use cycle::App;
use cycle_api::endpoints::reports::CycleContext;
use cycle_api::endpoints::PeriodId;
use cycle_api::ErrorKind;
use cycle_auth::{AuthError, FileCredentialStorage, SessionStore};
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn logged_out_app(server: &FakeServer, today: &str) -> App<cycle_api::testing::MockTransport> {
    let today = date(today);
    App::with_transport(
        server.transport(),
        Arc::new(SessionStore::in_memory()),
        &AppConfig::default(),
    )
    .with_clock(move || today)
}

#[tokio::test]
async fn test_logging_a_month_of_cycles() {
    let server = FakeServer::new();
    let app = logged_out_app(&server, "2024-02-26");

    app.auth.login("ada", PASSWORD).await.unwrap();
    assert!(app.auth.is_authenticated());

    app.tracker.start_period(date("2024-01-01")).await.unwrap();
    app.tracker.end_period(date("2024-01-05")).await.unwrap();
    app.tracker.start_period(date("2024-01-29")).await.unwrap();
    app.tracker.end_period(date("2024-02-02")).await.unwrap();
    let report = app.tracker.start_period(date("2024-02-26")).await.unwrap();

    assert_eq!(report.cycle_stats.count, 2);
    assert_eq!(report.cycle_stats.average_length, Some(28.0));
    assert_eq!(report.period_stats.average_duration, Some(4.0));
    assert_eq!(report.predicted_start, Some(date("2024-03-25")));
    assert!(report.context.is_some_and(|c| c.is_period()));
    assert_eq!(server.periods().len(), 3);
}

#[tokio::test]
async fn test_requests_before_login_are_rejected() {
    let server = FakeServer::new();
    let app = logged_out_app(&server, "2024-01-01");

    let err = app.tracker.refresh().await.unwrap_err();

    let TrackerError::Auth(err) = err else {
        panic!("expected an auth failure");
    };
    assert_eq!(err.kind(), ErrorKind::AuthInvalid);
    assert_eq!(server.requests_to("/auth/refresh"), 0);
}

#[tokio::test]
async fn test_wrong_password() {
    let server = FakeServer::new();
    let app = logged_out_app(&server, "2024-01-01");

    let err = app.auth.login("ada", "tr0ub4dor").await.unwrap_err();

    assert!(matches!(err, AuthError::Api(_)));
    assert_eq!(err.kind(), ErrorKind::AuthInvalid);
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(!app.auth.is_authenticated());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_mid_session() {
    let server = FakeServer::with_periods(vec![period(1, "2024-01-01", Some("2024-01-05"))]);
    let app = server.app(date("2024-01-29"));

    server.expire_access_token();
    let report = app.tracker.start_period(date("2024-01-29")).await.unwrap();

    assert_eq!(server.requests_to("/auth/refresh"), 1);
    assert_eq!(
        report.context,
        Some(CycleContext::Period {
            current_period_id: PeriodId::new(2),
            days_running: 0,
        })
    );
    assert!(app.auth.is_authenticated());
}

#[tokio::test]
async fn test_concurrent_reads_share_one_refresh() {
    const N: usize = 6;
    let server = FakeServer::with_periods(vec![period(1, "2024-01-01", Some("2024-01-05"))]);
    let transport = server.transport();
    let gate = transport.hold("/auth/refresh");
    let app = App::with_transport(transport, server.logged_in_session(), &AppConfig::default());
    server.expire_access_token();

    let reads = join_all((0..N).map(|_| app.tracker.history()));
    let release = async {
        let gateway = app.auth.gateway();
        while gateway.transport().count("/auth/refresh") == 0 || gateway.queued_requests() < N - 1 {
            tokio::task::yield_now().await;
        }
        gate.add_permits(1);
    };
    let (results, ()) = tokio::join!(reads, release);

    assert!(results.iter().all(|r| r.as_ref().is_ok_and(|h| h.len() == 1)));
    assert_eq!(server.requests_to("/auth/refresh"), 1);
    // One rejected attempt and one replay each
    assert_eq!(server.requests_to("/periods"), 2 * N);
}

#[tokio::test]
async fn test_session_persists_across_restarts() {
    let dir = TempDir::new().unwrap();
    let server = FakeServer::new();
    let config = AppConfig::default();

    {
        let storage = FileCredentialStorage::in_dir(dir.path()).unwrap();
        let app = App::with_transport(server.transport(), Arc::new(SessionStore::new(storage)), &config);
        app.auth.login("ada@example.com", PASSWORD).await.unwrap();
    }

    let storage = FileCredentialStorage::in_dir(dir.path()).unwrap();
    let app = App::with_transport(server.transport(), Arc::new(SessionStore::new(storage)), &config);
    assert!(!app.auth.is_authenticated());

    let user = app.auth.initialize().await.unwrap().unwrap();
    assert_eq!(user.username, "ada");
    assert!(app.auth.is_authenticated());

    app.auth.logout();
    assert!(!dir.path().join("credentials.json").exists());
}

#[tokio::test]
async fn test_local_report_against_service_figures() {
    let server = FakeServer::with_periods(vec![
        period(1, "2024-01-01", Some("2024-01-05")),
        period(2, "2024-01-29", Some("2024-02-03")),
        period(3, "2024-02-25", Some("2024-03-01")),
    ]);
    // What the service answers for this history on 2024-03-08
    server.set_report(
        "/reports/period-stats",
        json!({"count": 3, "average_duration": 5.67, "max_duration": 6, "min_duration": 5}),
    );
    server.set_report(
        "/reports/cycle-stats",
        json!({"count": 2, "average_length": 27.5, "max_length": 28, "min_length": 27}),
    );
    server.set_report(
        "/reports/predicted-next-period",
        json!({"predicted_start": "2024-03-24"}),
    );
    server.set_report(
        "/reports/ovulation-window",
        json!({
            "ovulation_date": "2024-03-10",
            "fertile_window_start": "2024-03-05",
            "fertile_window_end": "2024-03-10"
        }),
    );
    server.set_report(
        "/reports/cycle-context",
        json!({
            "status": "waiting",
            "cycle_day": 13,
            "cycle_length": 27.5,
            "progress_percent": 47.27,
            "predicted_start": "2024-03-24",
            "days_until_next_period": 16,
            "ovulation_date": "2024-03-10",
            "fertile_window": {"start": "2024-03-05", "end": "2024-03-10"},
            "is_today_ovulation": false,
            "is_in_fertile_window": true
        }),
    );
    let app = server.app(date("2024-03-08"));

    let local = app.tracker.refresh().await.unwrap();
    let remote = app.reports.all().await.unwrap();

    assert_eq!(local.cycle_stats, remote.cycle_stats);
    assert_eq!(local.predicted_start, remote.predicted_start);
    assert_eq!(local.ovulation, remote.ovulation);
    assert_eq!(local.context, remote.context);
    // The service counts both ends of a period, the local figures do not
    assert_eq!(local.period_stats.count, remote.period_stats.count);
    assert_eq!(local.period_stats.max_duration, Some(5));
    assert_eq!(local.period_stats.min_duration, Some(4));
    assert_eq!(local.period_stats.average_duration, Some(4.67));
}

#[tokio::test]
async fn test_deleting_the_account_logs_out() {
    let server = FakeServer::with_periods(vec![period(1, "2024-02-25", None)]);
    let app = server.app(date("2024-02-27"));

    app.auth.delete_account().await.unwrap();

    assert!(!app.auth.is_authenticated());
    assert!(server.periods().is_empty());
}
