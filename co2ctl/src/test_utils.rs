//! Shared helpers for unit and end-to-end tests.

use std::time::Duration;

use axum_test::TestServer;

use crate::{
    config::{Config, PrometheusConfig},
    types::EmissionReport,
};

pub const TEST_TOKEN: &str = "test-token";

pub fn sample_report() -> EmissionReport {
    EmissionReport {
        user_id: "u1".to_string(),
        co2_emission: 1.23,
        model: "gpt-x".to_string(),
        token_nb: 50,
        org: "acme".to_string(),
    }
}

/// Find the value of `family{labels}` in a text exposition.
///
/// The label block must match `labels` literally, in the given order.
pub fn sample_value(exposition: &str, family: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let label_text = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(",");
    let prefix = if labels.is_empty() {
        format!("{family} ")
    } else {
        format!("{family}{{{label_text}}} ")
    };

    exposition
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| line.strip_prefix(prefix.as_str())?.trim().parse().ok())
}

pub fn create_test_config(prometheus_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        auth_token: TEST_TOKEN.to_string(),
        prometheus: PrometheusConfig {
            url: prometheus_url.parse().expect("valid test Prometheus URL"),
            timeout: Duration::from_secs(2),
        },
        ..Default::default()
    }
}

/// Full router over a fresh counter registry, pointed at `prometheus_url` for reads
pub async fn create_test_app(prometheus_url: &str) -> TestServer {
    crate::Application::new(create_test_config(prometheus_url))
        .expect("Failed to create application")
        .into_test_server()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_value_matches_label_order() {
        let text = "# HELP x help\n# TYPE x counter\nx{user_id=\"u1\",org=\"acme\"} 2.5\nx{user_id=\"u2\",org=\"acme\"} 1\n";
        assert_eq!(sample_value(text, "x", &[("user_id", "u1"), ("org", "acme")]), Some(2.5));
        assert_eq!(sample_value(text, "x", &[("user_id", "u2"), ("org", "acme")]), Some(1.0));
        assert_eq!(sample_value(text, "x", &[("user_id", "u3"), ("org", "acme")]), None);
        // Same set, other order
        assert_eq!(sample_value(text, "x", &[("org", "acme"), ("user_id", "u1")]), None);
    }

    #[test]
    fn test_sample_value_does_not_match_prefixed_family() {
        let text = "x_total{a=\"b\"} 3\n";
        assert_eq!(sample_value(text, "x", &[("a", "b")]), None);
    }
}
