//! C1: opaque, sort-aware pagination cursors.
//!
//! Every variant carries exactly the fields needed to resume a
//! deterministically sorted query. Encoding joins fields with `:` and
//! base64-url-encodes the result (no padding); decoding never succeeds
//! silently on malformed input — every failure mode maps to
//! [`QueryError::InvalidCursor`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::QueryError;

const SEP: char = ':';

fn encode_fields(fields: &[String]) -> String {
    let joined = fields.join(&SEP.to_string());
    URL_SAFE_NO_PAD.encode(joined.as_bytes())
}

fn decode_fields(token: &str) -> Result<Vec<String>, QueryError> {
    let raw = URL_SAFE_NO_PAD
        .decode(token.as_bytes())
        .map_err(|e| QueryError::InvalidCursor(format!("not valid base64: {e}")))?;
    let text = String::from_utf8(raw)
        .map_err(|e| QueryError::InvalidCursor(format!("not valid utf-8: {e}")))?;
    Ok(text.split(SEP).map(|s| s.to_string()).collect())
}

fn expect_fields(fields: &[String], n: usize, variant: &str) -> Result<(), QueryError> {
    if fields.len() != n {
        return Err(QueryError::InvalidCursor(format!(
            "{variant} cursor expects {n} fields, got {}",
            fields.len()
        )));
    }
    Ok(())
}

fn parse_field<T: std::str::FromStr>(fields: &[String], idx: usize, name: &str) -> Result<T, QueryError> {
    fields[idx]
        .parse::<T>()
        .map_err(|_| QueryError::InvalidCursor(format!("unparseable field '{name}': {}", fields[idx])))
}

/// Sort parameters carried by a cursor, checked against the request's
/// `sort_by`/`sort_order` by [`crate::facade`] before the cursor is applied.
pub trait SortBound {
    fn cursor_sort(&self) -> (&str, &str);

    fn check_sort(&self, sort_by: &str, sort_order: &str) -> Result<(), QueryError> {
        let (cursor_sort_by, cursor_sort_order) = self.cursor_sort();
        if cursor_sort_by != sort_by || cursor_sort_order != sort_order {
            return Err(QueryError::CursorSortMismatch {
                cursor_sort_by: cursor_sort_by.to_string(),
                cursor_sort_order: cursor_sort_order.to_string(),
            });
        }
        Ok(())
    }
}

/// `operations(...)` pagination: `(ledger_seq desc, op_index desc)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationCursor {
    pub ledger_seq: i64,
    pub op_index: i32,
}

impl OperationCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[self.ledger_seq.to_string(), self.op_index.to_string()])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 2, "operation")?;
        Ok(Self {
            ledger_seq: parse_field(&f, 0, "ledger_seq")?,
            op_index: parse_field(&f, 1, "op_index")?,
        })
    }
}

/// `token_transfers(...)` pagination: `(ledger_seq desc, ts desc)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCursor {
    pub ledger_seq: i64,
    /// RFC-3339, nanosecond precision.
    pub timestamp: String,
}

impl TransferCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[self.ledger_seq.to_string(), self.timestamp.clone()])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 2, "transfer")?;
        let ledger_seq = parse_field(&f, 0, "ledger_seq")?;
        chrono::DateTime::parse_from_rfc3339(&f[1])
            .map_err(|_| QueryError::InvalidCursor(format!("unparseable field 'timestamp': {}", f[1])))?;
        Ok(Self {
            ledger_seq,
            timestamp: f[1].clone(),
        })
    }
}

/// `account_history(...)` pagination: `ledger_seq desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountHistoryCursor {
    pub ledger_seq: i64,
}

impl AccountHistoryCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[self.ledger_seq.to_string()])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 1, "account_history")?;
        Ok(Self {
            ledger_seq: parse_field(&f, 0, "ledger_seq")?,
        })
    }
}

/// `accounts_list(...)` pagination, sort-bound.
///
/// Full form is 5 fields; a legacy 2-field form (`balance:account_id`) is
/// accepted and treated as `{sort_by=balance, sort_order=desc}` with no
/// `last_modified_ledger` tie-break available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountListCursor {
    pub balance: String,
    pub last_modified_ledger: Option<i64>,
    pub sort_by: String,
    pub sort_order: String,
    pub account_id: String,
}

impl AccountListCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[
            self.balance.clone(),
            self.last_modified_ledger.map(|v| v.to_string()).unwrap_or_default(),
            self.sort_by.clone(),
            self.sort_order.clone(),
            self.account_id.clone(),
        ])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        match f.len() {
            2 => Ok(Self {
                balance: f[0].clone(),
                last_modified_ledger: None,
                sort_by: "balance".to_string(),
                sort_order: "desc".to_string(),
                account_id: f[1].clone(),
            }),
            5 => Ok(Self {
                balance: f[0].clone(),
                last_modified_ledger: if f[1].is_empty() {
                    None
                } else {
                    Some(parse_field(&f, 1, "last_modified_ledger")?)
                },
                sort_by: f[2].clone(),
                sort_order: f[3].clone(),
                account_id: f[4].clone(),
            }),
            n => Err(QueryError::InvalidCursor(format!(
                "account_list cursor expects 2 (legacy) or 5 fields, got {n}"
            ))),
        }
    }
}

impl SortBound for AccountListCursor {
    fn cursor_sort(&self) -> (&str, &str) {
        (&self.sort_by, &self.sort_order)
    }
}

/// `asset_list(...)` pagination, sort-bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetListCursor {
    pub holder_count: i64,
    pub volume_24h: String,
    pub sort_by: String,
    pub sort_order: String,
    pub code: String,
    pub issuer: String,
}

impl AssetListCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[
            self.holder_count.to_string(),
            self.volume_24h.clone(),
            self.sort_by.clone(),
            self.sort_order.clone(),
            self.code.clone(),
            self.issuer.clone(),
        ])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 6, "asset_list")?;
        Ok(Self {
            holder_count: parse_field(&f, 0, "holder_count")?,
            volume_24h: f[1].clone(),
            sort_by: f[2].clone(),
            sort_order: f[3].clone(),
            code: f[4].clone(),
            issuer: f[5].clone(),
        })
    }
}

impl SortBound for AssetListCursor {
    fn cursor_sort(&self) -> (&str, &str) {
        (&self.sort_by, &self.sort_order)
    }
}

/// `token_holders(...)` pagination: `(balance desc, account_id asc)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHolderCursor {
    pub balance: String,
    pub account_id: String,
}

impl TokenHolderCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[self.balance.clone(), self.account_id.clone()])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 2, "token_holder")?;
        Ok(Self {
            balance: f[0].clone(),
            account_id: f[1].clone(),
        })
    }
}

/// Shared by `offers`, `liquidity_pools`, `claimable_balances`: `id asc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCursor {
    pub id: String,
}

impl IdCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[self.id.clone()])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 1, "id")?;
        Ok(Self { id: f[0].clone() })
    }
}

/// `trades`/`effects` pagination: composite event ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventCursor {
    pub ledger_seq: i64,
    pub tx_hash: String,
    pub op_index: i32,
    pub sub_index: i32,
}

impl EventCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[
            self.ledger_seq.to_string(),
            self.tx_hash.clone(),
            self.op_index.to_string(),
            self.sub_index.to_string(),
        ])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 4, "event")?;
        Ok(Self {
            ledger_seq: parse_field(&f, 0, "ledger_seq")?,
            tx_hash: f[1].clone(),
            op_index: parse_field(&f, 2, "op_index")?,
            sub_index: parse_field(&f, 3, "sub_index")?,
        })
    }
}

/// Shared by `ttl`, `evicted_keys`/`restored_keys`, `contract_data`:
/// `(ledger_seq desc, key_hash asc)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SorobanKeyCursor {
    pub ledger_seq: i64,
    pub key_hash: String,
}

impl SorobanKeyCursor {
    pub fn encode(&self) -> String {
        encode_fields(&[self.ledger_seq.to_string(), self.key_hash.clone()])
    }

    pub fn decode(token: &str) -> Result<Self, QueryError> {
        let f = decode_fields(token)?;
        expect_fields(&f, 2, "soroban_key")?;
        Ok(Self {
            ledger_seq: parse_field(&f, 0, "ledger_seq")?,
            key_hash: f[1].clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_cursor_round_trips() {
        let c = OperationCursor {
            ledger_seq: 48_123_456,
            op_index: 3,
        };
        assert_eq!(OperationCursor::decode(&c.encode()).unwrap(), c);
    }

    #[test]
    fn transfer_cursor_round_trips() {
        let c = TransferCursor {
            ledger_seq: 48_123_456,
            timestamp: "2025-06-01T12:00:00.123456789Z".to_string(),
        };
        assert_eq!(TransferCursor::decode(&c.encode()).unwrap(), c);
    }

    #[test]
    fn transfer_cursor_rejects_unparseable_timestamp() {
        let token = encode_fields(&["1".to_string(), "not-a-date".to_string()]);
        assert!(matches!(
            TransferCursor::decode(&token),
            Err(QueryError::InvalidCursor(_))
        ));
    }

    #[test]
    fn account_list_cursor_round_trips_full_form() {
        let c = AccountListCursor {
            balance: "100.0000000".to_string(),
            last_modified_ledger: Some(42),
            sort_by: "balance".to_string(),
            sort_order: "desc".to_string(),
            account_id: "GA".to_string(),
        };
        assert_eq!(AccountListCursor::decode(&c.encode()).unwrap(), c);
    }

    #[test]
    fn account_list_cursor_accepts_legacy_two_field_form() {
        let token = encode_fields(&["50.0000000".to_string(), "GB".to_string()]);
        let decoded = AccountListCursor::decode(&token).unwrap();
        assert_eq!(decoded.sort_by, "balance");
        assert_eq!(decoded.sort_order, "desc");
        assert_eq!(decoded.account_id, "GB");
        assert_eq!(decoded.last_modified_ledger, None);
    }

    #[test]
    fn account_list_cursor_rejects_wrong_field_count() {
        let token = encode_fields(&["a".to_string(), "b".to_string(), "c".to_string()]);
        assert!(AccountListCursor::decode(&token).is_err());
    }

    #[test]
    fn sort_mismatch_is_rejected() {
        let c = AccountListCursor {
            balance: "10".to_string(),
            last_modified_ledger: None,
            sort_by: "balance".to_string(),
            sort_order: "desc".to_string(),
            account_id: "GA".to_string(),
        };
        assert!(c.check_sort("balance", "desc").is_ok());
        let err = c.check_sort("last_modified", "desc").unwrap_err();
        assert!(matches!(err, QueryError::CursorSortMismatch { .. }));
    }

    #[test]
    fn decode_rejects_non_base64() {
        assert!(matches!(
            OperationCursor::decode("not valid base64!!"),
            Err(QueryError::InvalidCursor(_))
        ));
    }

    #[test]
    fn token_holder_and_id_and_event_cursors_round_trip() {
        let th = TokenHolderCursor {
            balance: "50.0000000".to_string(),
            account_id: "GB".to_string(),
        };
        assert_eq!(TokenHolderCursor::decode(&th.encode()).unwrap(), th);

        let id = IdCursor { id: "offer-42".to_string() };
        assert_eq!(IdCursor::decode(&id.encode()).unwrap(), id);

        let ev = EventCursor {
            ledger_seq: 10,
            tx_hash: "abc123".to_string(),
            op_index: 1,
            sub_index: 2,
        };
        assert_eq!(EventCursor::decode(&ev.encode()).unwrap(), ev);

        let sk = SorobanKeyCursor {
            ledger_seq: 10,
            key_hash: "deadbeef".to_string(),
        };
        assert_eq!(SorobanKeyCursor::decode(&sk.encode()).unwrap(), sk);
    }
}
