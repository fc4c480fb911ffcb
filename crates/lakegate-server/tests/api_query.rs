mod common;

use axum::http::StatusCode;
use common::{fallback_settings, get_json, test_app, write_currency_csv};
use lakegate_server::api::QueryResponse;
use serde_json::json;

#[tokio::test]
async fn query_appends_pagination_and_returns_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_currency_csv(dir.path());
    let app = test_app(fallback_settings(dir.path()));

    let (status, body) = get_json(
        app,
        "/query-ducklake?query=SELECT%20code%2C%20rate%20FROM%20currency%20ORDER%20BY%20code&limit=2&offset=1",
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let response: QueryResponse = serde_json::from_value(body).unwrap();
    assert_eq!(
        response.query,
        "SELECT code, rate FROM currency ORDER BY code LIMIT 2 OFFSET 1"
    );
    assert_eq!(response.row_count, 2);
    assert_eq!(response.data, vec![
        vec![json!("GBP"), json!(0.79)],
        vec![json!("JPY"), json!(151.3)],
    ]);
}

#[tokio::test]
async fn query_uses_default_pagination() {
    let dir = tempfile::tempdir().unwrap();
    write_currency_csv(dir.path());
    let app = test_app(fallback_settings(dir.path()));

    let (status, body) = get_json(app, "/query-ducklake?query=SELECT%20*%20FROM%20currency").await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["query"], "SELECT * FROM currency LIMIT 100 OFFSET 0");
    assert_eq!(body["row_count"], 4);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn invalid_pagination_is_rejected_before_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let lake = fallback_settings(dir.path());

    for params in ["limit=0", "limit=1001", "offset=-1"] {
        let uri = format!("/query-ducklake?query=SELECT%201&{params}");
        let (status, body) = get_json(test_app(lake.clone()), &uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{params}: {body}");
        assert!(body["error"].as_str().unwrap().contains("invalid pagination"));
    }

    assert!(
        !lake.db_path.exists(),
        "rejected requests must not open the database"
    );
}

#[tokio::test]
async fn missing_query_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(fallback_settings(dir.path()));

    let (status, body) = get_json(app, "/query-ducklake?limit=5").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing required parameter: query");
}

#[tokio::test]
async fn non_numeric_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(fallback_settings(dir.path()));

    let (status, body) = get_json(app, "/query-ducklake?query=SELECT%201&limit=ten").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_table_reports_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(fallback_settings(dir.path()));

    let (status, body) =
        get_json(app, "/query-ducklake?query=SELECT%20*%20FROM%20ghost_rates").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("ghost_rates"), "{message}");
    assert!(!message.starts_with("Database connection failed"));
}

#[tokio::test]
async fn syntax_error_reports_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(fallback_settings(dir.path()));

    let (status, body) = get_json(app, "/query-ducklake?query=SELEC%201").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("SELEC"));
}

#[tokio::test]
async fn unopenable_database_is_a_connection_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut lake = fallback_settings(dir.path());
    lake.db_path = dir.path().to_path_buf();
    let app = test_app(lake);

    let (status, body) = get_json(app, "/query-ducklake?query=SELECT%201").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Database connection failed: "));
}
