use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Number of fractional digits in a Stellar "stroops" amount: 10^7 stroops = 1 unit.
pub const STROOP_SCALE: u32 = 7;

/// A Stellar asset identity: native (XLM) or credit (code + issuer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Native,
    Credit { code: String, issuer: String },
}

/// The four on-wire asset type strings used by enriched operations and
/// asset listings (classic `alphanum4`/`alphanum12`, pool shares, native).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Native,
    CreditAlphanum4,
    CreditAlphanum12,
    PoolShare,
}

impl Asset {
    /// Parse the textual form used throughout the operation catalog:
    /// `"XLM"` for native, `"CODE:ISSUER"` otherwise.
    pub fn parse(s: &str) -> Result<Self, QueryError> {
        if s.eq_ignore_ascii_case("xlm") || s.eq_ignore_ascii_case("native") {
            return Ok(Asset::Native);
        }
        let mut parts = s.splitn(2, ':');
        let code = parts
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| QueryError::InvalidArgument(format!("malformed asset: {s}")))?;
        let issuer = parts
            .next()
            .ok_or_else(|| QueryError::InvalidArgument("asset_issuer required for non-native asset".into()))?;
        if issuer.is_empty() {
            return Err(QueryError::InvalidArgument(
                "asset_issuer required for non-native asset".into(),
            ));
        }
        if !(1..=12).contains(&code.len()) {
            return Err(QueryError::InvalidArgument(format!(
                "asset code must be 1-12 chars: {code}"
            )));
        }
        Ok(Asset::Credit {
            code: code.to_string(),
            issuer: issuer.to_string(),
        })
    }

    pub fn code(&self) -> &str {
        match self {
            Asset::Native => "XLM",
            Asset::Credit { code, .. } => code,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Asset::Native => None,
            Asset::Credit { issuer, .. } => Some(issuer),
        }
    }

    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Native => AssetType::Native,
            Asset::Credit { code, .. } if code.len() <= 4 => AssetType::CreditAlphanum4,
            Asset::Credit { .. } => AssetType::CreditAlphanum12,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "XLM"),
            Asset::Credit { code, issuer } => write!(f, "{code}:{issuer}"),
        }
    }
}

impl FromStr for Asset {
    type Err = QueryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::parse(s)
    }
}

/// Format a stroops integer (10^7 units per whole unit) as a decimal string
/// with exactly 7 fractional digits, zero-padded below one unit.
///
/// The decimal string is the authoritative representation (§3.3); this is
/// only used to present the auxiliary 64-bit denormalization.
pub fn format_stroops(stroops: i64) -> String {
    let decimal = Decimal::new(stroops, STROOP_SCALE);
    decimal.to_string()
}

/// Parse a decimal balance string into its stroops (10^7-scaled) integer
/// form, returning an error instead of silently truncating to zero when the
/// value does not fit in 64 bits (§9: the source implementation zeroes
/// silently on overflow; this implementation surfaces `InvalidArgument`).
pub fn parse_stroops(s: &str) -> Result<i64, QueryError> {
    let decimal = Decimal::from_str(s)
        .map_err(|e| QueryError::InvalidArgument(format!("malformed decimal amount '{s}': {e}")))?;
    let scaled = decimal
        .checked_mul(Decimal::new(10i64.pow(STROOP_SCALE), 0))
        .ok_or_else(|| QueryError::InvalidArgument(format!("amount overflows stroops scale: {s}")))?;
    let scaled = scaled.round();
    scaled
        .to_string()
        .parse::<i64>()
        .map_err(|_| QueryError::InvalidArgument(format!("amount does not fit in 64-bit stroops: {s}")))
}

/// A balance value as transported on the wire: decimal string is
/// authoritative, stroops is present only when it fits (§3.3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAmount {
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroops: Option<i64>,
}

impl BalanceAmount {
    pub fn from_decimal(d: Decimal) -> Self {
        let stroops = parse_stroops(&d.to_string()).ok();
        BalanceAmount {
            amount: d.to_string(),
            stroops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_native_asset() {
        assert_eq!(Asset::parse("XLM").unwrap(), Asset::Native);
        assert_eq!(Asset::parse("native").unwrap(), Asset::Native);
    }

    #[test]
    fn parses_credit_asset() {
        let a = Asset::parse("USDC:GA5Z0000000000000000000000000000000000000000000000000000").unwrap();
        assert_eq!(a.code(), "USDC");
        assert_eq!(a.asset_type(), AssetType::CreditAlphanum4);
        assert_eq!(
            a.to_string(),
            "USDC:GA5Z0000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn rejects_missing_issuer() {
        assert!(matches!(
            Asset::parse("USDC"),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(matches!(
            Asset::parse("USDC:"),
            Err(QueryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_overlong_code() {
        assert!(Asset::parse("THIRTEENCHARS:GISSUER").is_err());
    }

    #[test]
    fn balance_formatting_round_trip() {
        // a value that fits in 64-bit stroops must round-trip exactly
        let s = "100.9982800";
        let stroops = parse_stroops(s).unwrap();
        assert_eq!(format_stroops(stroops), s);
    }

    #[test]
    fn balance_formatting_pads_below_one_unit() {
        let stroops = parse_stroops("0.0000001").unwrap();
        assert_eq!(stroops, 1);
        assert_eq!(format_stroops(stroops), "0.0000001");
    }

    #[test]
    fn parse_stroops_surfaces_overflow_instead_of_zeroing() {
        // 10^13 units * 10^7 stroops/unit overflows i64 (max ~9.2e18, so
        // 10^13 * 10^7 = 10^20 overflows)
        let huge = "10000000000000.0000000";
        assert!(parse_stroops(huge).is_err());
    }
}
