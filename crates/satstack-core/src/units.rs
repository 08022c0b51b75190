//! Amount and timestamp parsing for values rendered by the node.

use bitcoin::{Amount, Denomination};
use time::OffsetDateTime;

use crate::error::CoreError;

/// Parse a BTC amount from a JSON value into satoshis.
///
/// Number values are parsed via `Amount::from_float_in` to support scientific
/// notation, while string values are parsed via `Amount::from_str_in`.
/// Anything else, including negative or sub-satoshi values, is a
/// [`CoreError::MalformedAmount`].
pub fn parse_btc_amount(value: &serde_json::Value) -> Result<Amount, CoreError> {
    match value {
        serde_json::Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| CoreError::MalformedAmount(format!("invalid BTC amount `{value}`")))?;
            Amount::from_float_in(parsed, Denomination::Bitcoin)
                .map_err(|e| CoreError::MalformedAmount(format!("invalid BTC amount `{value}`: {e}")))
        }
        serde_json::Value::String(s) => Amount::from_str_in(s, Denomination::Bitcoin)
            .map_err(|e| CoreError::MalformedAmount(format!("invalid BTC amount `{s}`: {e}"))),
        _ => Err(CoreError::MalformedAmount(format!(
            "expected numeric BTC amount, got: {value}"
        ))),
    }
}

/// Convert a Unix timestamp reported by the node. Out-of-range values yield
/// `None` rather than an error.
pub fn parse_unix_timestamp(secs: u64) -> Option<OffsetDateTime> {
    let secs = i64::try_from(secs).ok()?;
    OffsetDateTime::from_unix_timestamp(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_btc_amount_integer() {
        let val = serde_json::json!(3);
        let amount = parse_btc_amount(&val).expect("should parse integer");
        assert_eq!(amount, Amount::from_sat(300_000_000));
    }

    #[test]
    fn parse_btc_amount_fractional() {
        let val = serde_json::json!(0.00001);
        let amount = parse_btc_amount(&val).expect("should parse fractional");
        assert_eq!(amount, Amount::from_sat(1000));
    }

    #[test]
    fn parse_btc_amount_has_no_float_drift() {
        // 4.9 is not exactly representable in binary floating point.
        let val = serde_json::json!(4.9);
        let amount = parse_btc_amount(&val).expect("should parse");
        assert_eq!(amount, Amount::from_sat(490_000_000));
    }

    #[test]
    fn parse_btc_amount_string() {
        let val = serde_json::json!("0.5");
        let amount = parse_btc_amount(&val).expect("should parse string");
        assert_eq!(amount, Amount::from_sat(50_000_000));
    }

    #[test]
    fn parse_btc_amount_scientific_number() {
        let val = serde_json::json!(6.6e-6);
        let amount = parse_btc_amount(&val).expect("should parse scientific notation");
        assert_eq!(amount, Amount::from_sat(660));
    }

    #[test]
    fn parse_btc_amount_rejects_non_numeric() {
        let err = parse_btc_amount(&serde_json::json!(true)).expect_err("bool is not an amount");
        assert!(matches!(err, CoreError::MalformedAmount(_)));
    }

    #[test]
    fn parse_btc_amount_rejects_negative() {
        let err = parse_btc_amount(&serde_json::json!(-1.0)).expect_err("negative amount");
        assert!(matches!(err, CoreError::MalformedAmount(_)));
    }

    #[test]
    fn parse_btc_amount_rejects_garbage_string() {
        let err = parse_btc_amount(&serde_json::json!("lots")).expect_err("garbage string");
        assert!(matches!(err, CoreError::MalformedAmount(_)));
    }

    #[test]
    fn parse_unix_timestamp_converts_seconds() {
        let ts = parse_unix_timestamp(1_231_006_505).expect("genesis time is in range");
        assert_eq!(ts.unix_timestamp(), 1_231_006_505);
    }

    #[test]
    fn parse_unix_timestamp_out_of_range_is_none() {
        assert!(parse_unix_timestamp(u64::MAX).is_none());
    }
}
