//! Custom MiniJinja filters for financial prompts

use minijinja::{Environment, Error, ErrorKind, Value};

/// Format a number with thousands separators and fixed decimals
///
/// `1234567.891` with 0 decimals renders as `1,234,567`. Non-finite values are
/// rendered as-is.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let formatted = format!("{value:.decimals$}");
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Register the finlens filters on an environment
pub(crate) fn register(env: &mut Environment<'_>) {
    env.add_filter("thousands", |value: f64, decimals: Option<usize>| {
        format_thousands(value, decimals.unwrap_or(0))
    });
    env.add_filter("pretty_json", |value: Value| {
        serde_json::to_string_pretty(&value).map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, "value is not JSON serializable")
                .with_source(e)
        })
    });
}
