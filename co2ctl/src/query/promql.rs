//! PromQL construction for the per-user emission aggregate.

use crate::{metrics::CO2_EMISSION_BY_USER, query::EmissionRange};

/// Quote `value` as a PromQL double-quoted string literal.
///
/// Label values come straight from the URL path, so anything that could close the literal or the
/// selector has to be escaped.
pub fn quote_label_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Total grams emitted by `user_id` over `range`, across all orgs, rounded to hundredths.
///
/// The rounding happens in the backend; callers truncate the result to whole grams afterwards.
pub fn user_emission_query(user_id: &str, range: EmissionRange) -> String {
    format!(
        "round(sum by (user_id) (increase({metric}{{user_id={user}}}[{lookback}])), 0.01)",
        metric = CO2_EMISSION_BY_USER,
        user = quote_label_value(user_id),
        lookback = range.lookback(),
    )
}
