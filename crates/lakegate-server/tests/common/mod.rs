#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lakegate_db::LakeSettings;
use lakegate_server::{app, AppState};
use serde_json::Value;
use std::path::Path;
use tower::ServiceExt; // for oneshot

/// Lake settings inside `root` that can never attach the catalog: the
/// extension points at a file that does not exist.
pub fn fallback_settings(root: &Path) -> LakeSettings {
    let mut lake = LakeSettings::new(
        root.join("lake_duckdb/ducklake.db"),
        root.join("lake_duckdb/catalog.duckdb"),
        root.join("lake_duckdb/data"),
    );
    lake.extension = root
        .join("missing.duckdb_extension")
        .display()
        .to_string();
    lake.seed_csv = root.join("currency.csv");
    lake
}

pub fn write_currency_csv(root: &Path) {
    std::fs::write(
        root.join("currency.csv"),
        "code,name,rate\nUSD,US Dollar,1.0\nEUR,Euro,0.92\nJPY,Japanese Yen,151.3\nGBP,Pound Sterling,0.79\n",
    )
    .expect("failed to write currency csv");
}

pub fn test_app(lake: LakeSettings) -> Router {
    app(AppState { lake })
}

/// Sends a GET request and returns the status with the parsed JSON body.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}
