//! End-to-end scenarios over the real router: writes, scrapes and reads against a mocked backend.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

use crate::{
    Application,
    metrics::{CO2_EMISSION_BY_MODEL, CO2_EMISSION_BY_USER, REQUESTS_BY_MODEL, TOKEN_COUNT_BY_MODEL},
    sinks::{NocoDbConfig, SinkConfig},
    test_utils::{TEST_TOKEN, create_test_app, create_test_config, sample_report, sample_value},
};

const UNUSED_BACKEND: &str = "http://127.0.0.1:9";

fn report_body() -> Value {
    serde_json::to_value(sample_report()).unwrap()
}

const MODEL_LABELS: [(&str, &str); 2] = [("model", "gpt-x"), ("org", "acme")];
const USER_LABELS: [(&str, &str); 2] = [("user_id", "u1"), ("org", "acme")];

#[test_log::test(tokio::test)]
async fn test_write_then_scrape_shows_all_four_deltas() {
    let app = create_test_app(UNUSED_BACKEND).await;

    app.post("/api/v1/request")
        .authorization_bearer(TEST_TOKEN)
        .json(&report_body())
        .await
        .assert_status_ok();

    let scrape = app.get("/metrics").await.text();
    assert_eq!(sample_value(&scrape, REQUESTS_BY_MODEL, &MODEL_LABELS), Some(1.0));
    assert_eq!(sample_value(&scrape, CO2_EMISSION_BY_USER, &USER_LABELS), Some(1.23));
    assert_eq!(sample_value(&scrape, CO2_EMISSION_BY_MODEL, &MODEL_LABELS), Some(1.23));
    assert_eq!(sample_value(&scrape, TOKEN_COUNT_BY_MODEL, &MODEL_LABELS), Some(50.0));

    let lines: Vec<&str> = scrape.lines().collect();
    assert!(lines.contains(&r#"co2_emission_by_user{user_id="u1",org="acme"} 1.23"#), "{scrape}");
    assert!(lines.contains(&r#"requests_by_model{model="gpt-x",org="acme"} 1"#), "{scrape}");
}

#[test_log::test(tokio::test)]
async fn test_same_report_twice_counts_twice() {
    let app = create_test_app(UNUSED_BACKEND).await;

    for _ in 0..2 {
        app.post("/api/v1/request")
            .authorization_bearer(TEST_TOKEN)
            .json(&report_body())
            .await
            .assert_status_ok();
    }

    let scrape = app.get("/metrics").await.text();
    assert_eq!(sample_value(&scrape, REQUESTS_BY_MODEL, &MODEL_LABELS), Some(2.0));
    assert_eq!(sample_value(&scrape, CO2_EMISSION_BY_USER, &USER_LABELS), Some(2.46));
    assert_eq!(sample_value(&scrape, TOKEN_COUNT_BY_MODEL, &MODEL_LABELS), Some(100.0));
}

#[test_log::test(tokio::test)]
async fn test_rejected_credentials_change_nothing() {
    let app = create_test_app(UNUSED_BACKEND).await;

    let missing = app.post("/api/v1/request").json(&report_body()).await;
    missing.assert_status(StatusCode::UNAUTHORIZED);

    let wrong = app
        .post("/api/v1/request")
        .authorization_bearer("not-the-token")
        .json(&report_body())
        .await;
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    wrong.assert_json(&json!({"message": "Invalid authentication credentials"}));

    let basic = app
        .post("/api/v1/request")
        .add_header("authorization", format!("Basic {TEST_TOKEN}"))
        .json(&report_body())
        .await;
    basic.assert_status(StatusCode::UNAUTHORIZED);

    let scrape = app.get("/metrics").await.text();
    assert_eq!(sample_value(&scrape, REQUESTS_BY_MODEL, &MODEL_LABELS), None);
    assert_eq!(sample_value(&scrape, CO2_EMISSION_BY_USER, &USER_LABELS), None);
}

#[test_log::test(tokio::test)]
async fn test_other_label_sets_are_untouched() {
    let app = create_test_app(UNUSED_BACKEND).await;

    let other = json!({"user_id": "u2", "co2_emission": 5.0, "model": "other", "token_nb": 7, "org": "acme"});
    app.post("/api/v1/request")
        .authorization_bearer(TEST_TOKEN)
        .json(&other)
        .await
        .assert_status_ok();
    app.post("/api/v1/request")
        .authorization_bearer(TEST_TOKEN)
        .json(&report_body())
        .await
        .assert_status_ok();

    let scrape = app.get("/metrics").await.text();
    assert_eq!(
        sample_value(&scrape, CO2_EMISSION_BY_USER, &[("user_id", "u2"), ("org", "acme")]),
        Some(5.0)
    );
    assert_eq!(
        sample_value(&scrape, TOKEN_COUNT_BY_MODEL, &[("model", "other"), ("org", "acme")]),
        Some(7.0)
    );
    assert_eq!(sample_value(&scrape, CO2_EMISSION_BY_USER, &USER_LABELS), Some(1.23));
}

#[test_log::test(tokio::test)]
async fn test_read_is_idempotent_and_unauthenticated() {
    let prometheus = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [{ "metric": { "user_id": "u1" }, "value": [1712345678.0, "12.35"] }]
            }
        })))
        .expect(2)
        .mount(&prometheus)
        .await;

    let app = create_test_app(&prometheus.uri()).await;

    let first: Value = app.get("/api/v1/co2/user/u1").add_query_param("range", "monthly").await.json();
    let second: Value = app.get("/api/v1/co2/user/u1").add_query_param("range", "monthly").await.json();

    assert_eq!(first, second);
    assert_eq!(first["data"]["resultType"], "vector");
    assert_eq!(first["data"]["result"][0]["value"][1], json!(12));
}

#[test_log::test(tokio::test)]
async fn test_backend_query_error_is_500_with_upstream_text() {
    let prometheus = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "errorType": "execution",
            "error": "query timed out in expression evaluation"
        })))
        .mount(&prometheus)
        .await;

    let app = create_test_app(&prometheus.uri()).await;
    let response = app.get("/api/v1/co2/user/u1").add_query_param("range", "daily").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("Metrics backend query failed"), "{message}");
    assert!(message.contains("query timed out in expression evaluation"), "{message}");
}

#[test_log::test(tokio::test)]
async fn test_unreachable_backend_is_500() {
    // Bind then drop to get a port nobody is listening on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let app = create_test_app(&format!("http://{addr}")).await;
    let response = app.get("/api/v1/co2/user/u1").add_query_param("range", "yearly").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert!(
        json["message"].as_str().unwrap().starts_with("Metrics backend unavailable"),
        "{json}"
    );
}

#[test_log::test(tokio::test)]
async fn test_summary_reports_each_window() {
    let prometheus = MockServer::start().await;
    for (lookback, value) in [("1d", "1.99"), ("7d", "12.35"), ("30d", "40.5"), ("365d", "400")] {
        Mock::given(method("GET"))
            .and(path("/api/v1/query"))
            .and(wiremock::matchers::query_param(
                "query",
                format!(r#"round(sum by (user_id) (increase(co2_emission_by_user{{user_id="u1"}}[{lookback}])), 0.01)"#),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": {
                    "resultType": "vector",
                    "result": [{ "metric": { "user_id": "u1" }, "value": [1712345678.0, value] }]
                }
            })))
            .expect(1)
            .mount(&prometheus)
            .await;
    }

    let app = create_test_app(&prometheus.uri()).await;
    let response = app.get("/api/v1/co2/user/u1/summary").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "user_id": "u1",
        "daily": 1,
        "weekly": 12,
        "monthly": 40,
        "yearly": 400
    }));
}

#[test_log::test(tokio::test)]
async fn test_accepted_report_reaches_nocodb_sink() {
    let nocodb = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/tables/tbl1/records"))
        .and(header("xc-token", "xc-secret"))
        .and(body_partial_json(json!({"user": "u1", "co2": 1.23})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": 1})))
        .expect(1)
        .mount(&nocodb)
        .await;

    let mut config = create_test_config(UNUSED_BACKEND);
    config.sinks = vec![SinkConfig::Nocodb(NocoDbConfig {
        url: nocodb.uri().parse().unwrap(),
        token: "xc-secret".to_string(),
        table_id: "tbl1".to_string(),
        timeout: Duration::from_secs(2),
    })];
    let app = Application::new(config).unwrap().into_test_server();

    app.post("/api/v1/request")
        .authorization_bearer(TEST_TOKEN)
        .json(&report_body())
        .await
        .assert_status_ok();

    // Delivery happens on a spawned task
    for _ in 0..50 {
        if !nocodb.received_requests().await.unwrap_or_default().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(nocodb.received_requests().await.unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_failing_sink_does_not_fail_the_write() {
    let nocodb = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&nocodb)
        .await;

    let mut config = create_test_config(UNUSED_BACKEND);
    config.sinks = vec![SinkConfig::Nocodb(NocoDbConfig {
        url: nocodb.uri().parse().unwrap(),
        token: "xc-secret".to_string(),
        table_id: "tbl1".to_string(),
        timeout: Duration::from_secs(2),
    })];
    let app = Application::new(config).unwrap().into_test_server();

    app.post("/api/v1/request")
        .authorization_bearer(TEST_TOKEN)
        .json(&report_body())
        .await
        .assert_status_ok();

    let scrape = app.get("/metrics").await.text();
    assert_eq!(sample_value(&scrape, REQUESTS_BY_MODEL, &MODEL_LABELS), Some(1.0));
}

#[test_log::test(tokio::test)]
async fn test_docs_and_liveness_are_served() {
    let app = create_test_app(UNUSED_BACKEND).await;

    app.get("/").await.assert_json(&json!({"message": "Hello World"}));
    app.get("/docs").await.assert_status_ok();
}
