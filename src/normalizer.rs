//! Turns a raw vendor extract into the canonical transaction table.
//!
//! The pipeline is schema mapping → column pruning → type coercion →
//! categorical translation → derived fields. It is a batch operation: the
//! first bad cell fails the whole file, no row is skipped.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

use crate::error::{DashError, Result};
use crate::models::{RawCell, RawTable, Transaction, TransactionType};

pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";
const TIMESTAMP_PATTERN: &str = r"^\d{4}\.\d{2}\.\d{2} \d{2}:\d{2}:\d{2}$";

/// Canonical fields, in `COLUMN_MAP` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    Remarks,
    TransactionType,
    BankName,
    AccountNumber,
    Amount,
    BalanceAfter,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::Remarks => "remarks",
            Self::TransactionType => "transaction_type",
            Self::BankName => "bank_name",
            Self::AccountNumber => "account_number",
            Self::Amount => "amount",
            Self::BalanceAfter => "balance_after",
        }
    }
}

/// Vendor header → canonical field. Every entry is required.
pub const COLUMN_MAP: &[(&str, Field)] = &[
    ("거래 일시", Field::Timestamp),
    ("적요", Field::Remarks),
    ("거래 유형", Field::TransactionType),
    ("거래 기관", Field::BankName),
    ("계좌번호", Field::AccountNumber),
    ("거래 금액", Field::Amount),
    ("거래 후 잔액", Field::BalanceAfter),
];

/// Free-text memo column, dropped when present.
pub const MEMO_COLUMN: &str = "메모";

/// Columns with no canonical meaning. Missing ones are simply not dropped.
pub fn is_pruned_column(header: &str) -> bool {
    header == MEMO_COLUMN || header.starts_with("Unnamed:")
}

/// Resolved column positions for each canonical field.
struct ColumnIndex {
    positions: [usize; COLUMN_MAP.len()],
}

impl ColumnIndex {
    fn resolve(table: &RawTable) -> Result<Self> {
        let mut positions = [0usize; COLUMN_MAP.len()];
        let mut missing = Vec::new();
        for (vendor, field) in COLUMN_MAP {
            match table.column_index(vendor) {
                Some(pos) => positions[*field as usize] = pos,
                None => missing.push((*vendor).to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(DashError::Schema { missing });
        }
        Ok(Self { positions })
    }

    fn cell<'a>(&self, row: &'a [RawCell], field: Field) -> &'a RawCell {
        row.get(self.positions[field as usize]).unwrap_or(&RawCell::Empty)
    }
}

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is valid"))
}

fn parse_error(row: usize, field: Field, cell: &RawCell, expected: &'static str) -> DashError {
    DashError::Parse {
        row,
        column: field.name(),
        value: cell.as_text(),
        expected,
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

pub fn parse_timestamp(cell: &RawCell, row: usize) -> Result<NaiveDateTime> {
    let err = || parse_error(row, Field::Timestamp, cell, "YYYY.MM.DD HH:MM:SS");
    match cell {
        RawCell::DateTime(dt) => Ok(*dt),
        RawCell::Text(s) => {
            if !timestamp_regex().is_match(s) {
                return Err(err());
            }
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).map_err(|_| err())
        }
        _ => Err(err()),
    }
}

/// Strip thousands separators and the won sign.
fn clean_number(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '₩' | ' '))
        .collect()
}

pub fn parse_amount(cell: &RawCell, row: usize, field: Field) -> Result<f64> {
    match cell {
        RawCell::Empty => Ok(0.0),
        RawCell::Int(i) => Ok(*i as f64),
        RawCell::Float(f) if f.is_finite() => Ok(*f),
        RawCell::Text(s) if s.trim().is_empty() => Ok(0.0),
        RawCell::Text(s) => clean_number(s)
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| parse_error(row, field, cell, "a number")),
        _ => Err(parse_error(row, field, cell, "a number")),
    }
}

/// Account numbers become non-negative integers; blank becomes 0.
pub fn parse_account_number(cell: &RawCell, row: usize) -> Result<u64> {
    let err = || parse_error(row, Field::AccountNumber, cell, "a non-negative integer");
    match cell {
        RawCell::Empty => Ok(0),
        RawCell::Int(i) => u64::try_from(*i).map_err(|_| err()),
        RawCell::Float(f) if f.is_finite() && *f >= 0.0 => Ok(f.trunc() as u64),
        RawCell::Text(s) => {
            let digits: String = s
                .trim()
                .chars()
                .filter(|c| !matches!(c, '-' | ' '))
                .collect();
            if digits.is_empty() {
                return Ok(0);
            }
            if let Ok(n) = digits.parse::<u64>() {
                return Ok(n);
            }
            // spreadsheets sometimes stringify whole numbers as "1234.0"
            match digits.parse::<f64>() {
                Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as u64),
                _ => Err(err()),
            }
        }
        _ => Err(err()),
    }
}

// ---------------------------------------------------------------------------
// normalize
// ---------------------------------------------------------------------------

/// The normalized, immutable transaction table for one uploaded file.
/// Row order is the source's row order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
    transactions: Vec<Transaction>,
}

impl CanonicalTable {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Vendor labels that had no translation, with their row counts.
    pub fn untranslated_types(&self) -> Vec<(String, usize)> {
        let mut counts: std::collections::BTreeMap<String, usize> = Default::default();
        for t in &self.transactions {
            if !t.transaction_type.is_translated() {
                *counts.entry(t.transaction_type.label().to_string()).or_default() += 1;
            }
        }
        counts.into_iter().collect()
    }
}

pub fn normalize(raw: &RawTable) -> Result<CanonicalTable> {
    let columns = ColumnIndex::resolve(raw)?;
    let pruned = raw.headers.iter().filter(|h| is_pruned_column(h)).count();
    debug!(pruned, "schema mapped");

    let mut transactions = Vec::with_capacity(raw.rows.len());
    for (i, row) in raw.rows.iter().enumerate() {
        let row_no = i + 1;
        let timestamp = parse_timestamp(columns.cell(row, Field::Timestamp), row_no)?;
        let account_number = parse_account_number(columns.cell(row, Field::AccountNumber), row_no)?;
        let amount = parse_amount(columns.cell(row, Field::Amount), row_no, Field::Amount)?;
        let balance_after =
            parse_amount(columns.cell(row, Field::BalanceAfter), row_no, Field::BalanceAfter)?;
        let transaction_type =
            TransactionType::from_vendor(&columns.cell(row, Field::TransactionType).as_text());

        transactions.push(Transaction::new(
            timestamp,
            columns.cell(row, Field::Remarks).as_text(),
            transaction_type,
            columns.cell(row, Field::BankName).as_text(),
            account_number,
            amount,
            balance_after,
        ));
    }

    debug!(rows = transactions.len(), "normalized");
    Ok(CanonicalTable::new(transactions))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const HEADERS: &[&str] = &[
        "Unnamed: 0",
        "거래 일시",
        "적요",
        "거래 유형",
        "거래 기관",
        "계좌번호",
        "거래 금액",
        "거래 후 잔액",
        "메모",
    ];

    fn text(s: &str) -> RawCell {
        if s.is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }

    /// (timestamp, remarks, vendor type, account, amount, balance)
    pub(crate) fn raw(rows: &[(&str, &str, &str, &str, &str, &str)]) -> RawTable {
        RawTable {
            headers: HEADERS.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, (ts, rem, ty, acct, amt, bal))| {
                    vec![
                        RawCell::Int(i as i64),
                        text(ts),
                        text(rem),
                        text(ty),
                        text("토스뱅크"),
                        text(acct),
                        text(amt),
                        text(bal),
                        text("memo"),
                    ]
                })
                .collect(),
        }
    }

    #[test]
    fn test_normalize_maps_and_translates() {
        let table = normalize(&raw(&[
            ("2024.01.15 09:30:00", "급여", "입금", "1000-2000", "100,000", "150000"),
            ("2024.02.01 21:05:10", "편의점", "체크카드결제", "", "-4,500", "145500"),
        ]))
        .unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.transactions()[0];
        assert_eq!(first.remarks, "급여");
        assert_eq!(first.transaction_type, TransactionType::Deposit);
        assert_eq!(first.account_number, 10002000);
        assert_eq!(first.amount, 100_000.0);
        assert_eq!(first.bank_name, "토스뱅크");
        assert_eq!(first.month_key, "2024-01");
        let second = &table.transactions()[1];
        assert_eq!(second.transaction_type, TransactionType::CheckCard);
        assert_eq!(second.amount, -4500.0);
        assert_eq!(second.balance_after, 145_500.0);
        assert_eq!(second.hour(), 21);
    }

    #[test]
    fn test_blank_account_number_is_zero() {
        let table = normalize(&raw(&[("2024.01.15 09:30:00", "x", "입금", "", "1", "1")])).unwrap();
        assert_eq!(table.transactions()[0].account_number, 0);
    }

    #[test]
    fn test_unmapped_type_passes_through() {
        let table =
            normalize(&raw(&[("2024.01.15 09:30:00", "x", "해외송금", "", "-1", "1")])).unwrap();
        assert_eq!(
            table.transactions()[0].transaction_type,
            TransactionType::Other("해외송금".into())
        );
        assert_eq!(table.untranslated_types(), vec![("해외송금".to_string(), 1)]);
    }

    #[test]
    fn test_missing_required_columns_is_schema_error() {
        let mut table = raw(&[("2024.01.15 09:30:00", "x", "입금", "", "1", "1")]);
        table.headers[6] = "금액".to_string();
        table.headers[1] = "일시".to_string();
        match normalize(&table).unwrap_err() {
            DashError::Schema { missing } => {
                assert_eq!(missing, vec!["거래 일시".to_string(), "거래 금액".to_string()]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_pruned_columns_may_be_absent() {
        let mut table = raw(&[("2024.01.15 09:30:00", "x", "입금", "", "1", "1")]);
        table.headers.remove(8);
        table.headers.remove(0);
        for row in &mut table.rows {
            row.remove(8);
            row.remove(0);
        }
        assert_eq!(normalize(&table).unwrap().len(), 1);
    }

    #[test]
    fn test_bad_timestamp_fails_whole_batch() {
        let err = normalize(&raw(&[
            ("2024.01.15 09:30:00", "ok", "입금", "", "1", "1"),
            ("2024-01-16 09:30:00", "bad", "입금", "", "1", "1"),
        ]))
        .unwrap_err();
        match err {
            DashError::Parse { row, column, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "timestamp");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_rejects_loose_and_impossible_values() {
        assert!(parse_timestamp(&RawCell::Text("2024.1.5 09:30:00".into()), 1).is_err());
        assert!(parse_timestamp(&RawCell::Text("2024.02.30 09:30:00".into()), 1).is_err());
        assert!(parse_timestamp(&RawCell::Text("2024.01.05 24:00:00".into()), 1).is_err());
        assert!(parse_timestamp(&RawCell::Empty, 1).is_err());
        assert!(parse_timestamp(&RawCell::Text("2024.02.29 23:59:59".into()), 1).is_ok());
    }

    #[test]
    fn test_workbook_datetime_cells_accepted() {
        let dt = NaiveDateTime::parse_from_str("2024.03.01 08:00:00", TIMESTAMP_FORMAT).unwrap();
        assert_eq!(parse_timestamp(&RawCell::DateTime(dt), 1).unwrap(), dt);
    }

    #[test]
    fn test_parse_amount_variants() {
        let f = Field::Amount;
        assert_eq!(parse_amount(&RawCell::Text("₩1,234".into()), 1, f).unwrap(), 1234.0);
        assert_eq!(parse_amount(&RawCell::Text("-40,000".into()), 1, f).unwrap(), -40000.0);
        assert_eq!(parse_amount(&RawCell::Int(-5), 1, f).unwrap(), -5.0);
        assert_eq!(parse_amount(&RawCell::Empty, 1, f).unwrap(), 0.0);
        assert!(parse_amount(&RawCell::Text("abc".into()), 1, f).is_err());
    }

    #[test]
    fn test_parse_account_number_variants() {
        assert_eq!(parse_account_number(&RawCell::Float(123456.0), 1).unwrap(), 123456);
        assert_eq!(parse_account_number(&RawCell::Text("1234.0".into()), 1).unwrap(), 1234);
        assert_eq!(parse_account_number(&RawCell::Text(" ".into()), 1).unwrap(), 0);
        assert!(parse_account_number(&RawCell::Int(-1), 1).is_err());
        assert!(parse_account_number(&RawCell::Text("acct".into()), 1).is_err());
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let input = raw(&[
            ("2024.01.15 09:30:00", "급여", "입금", "1", "100000", "100000"),
            ("2024.01.15 12:00:00", "점심", "체크카드결제", "", "-9000", "91000"),
        ]);
        let a = serde_json::to_vec(normalize(&input).unwrap().transactions()).unwrap();
        let b = serde_json::to_vec(normalize(&input).unwrap().transactions()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_table_normalizes_to_empty() {
        let table = normalize(&raw(&[])).unwrap();
        assert!(table.is_empty());
    }
}
