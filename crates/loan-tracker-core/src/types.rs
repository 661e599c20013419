use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Identifier of a user in a loan book
pub type UserId = u64;

/// Identifier of a loan in a loan book
pub type LoanId = u64;

/// Decimal places used for every reported currency value
pub const CURRENCY_DP: u32 = 2;

/// Round a currency value for reporting. Banker's rounding, applied only at
/// the output boundary.
pub fn round_currency(value: Money) -> Money {
    value.round_dp(CURRENCY_DP)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_currency_half_even() {
        assert_eq!(round_currency(dec!(0.125)), dec!(0.12));
        assert_eq!(round_currency(dec!(0.135)), dec!(0.14));
        assert_eq!(round_currency(dec!(918.5591848781995)), dec!(918.56));
    }

    #[test]
    fn test_with_metadata_envelope() {
        let out = with_metadata(
            "Test",
            &serde_json::json!({"k": "v"}),
            vec!["w".into()],
            7,
            dec!(1.5),
        );
        assert_eq!(out.methodology, "Test");
        assert_eq!(out.warnings, vec!["w".to_string()]);
        assert_eq!(out.metadata.computation_time_us, 7);
        assert_eq!(out.metadata.version, env!("CARGO_PKG_VERSION"));
    }
}
