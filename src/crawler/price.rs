//! Price text parsing

use crate::ParseError;

/// Parses listing price text into a non-negative amount
///
/// Currency symbols around the number, surrounding whitespace and `,`
/// thousands separators are ignored: `"₹1,250.00"` is `1250.0`.
pub fn parse_price(text: &str) -> Result<f64, ParseError> {
    let cleaned: String = text
        .trim()
        .trim_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    match cleaned.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ParseError {
            text: text.to_string(),
        }),
    }
}

/// Parses price text, falling back to the 0.0 sentinel
///
/// A malformed price never blocks ingestion of a product.
pub fn parse_price_or_zero(text: &str) -> f64 {
    parse_price(text).unwrap_or_else(|e| {
        tracing::debug!("{}; using 0.0", e);
        0.0
    })
}
