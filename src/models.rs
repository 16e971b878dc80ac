use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

/// A single loosely typed cell as read from the source extract.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A cell the workbook already stores as a date.
    DateTime(NaiveDateTime),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for error messages and pass-through string fields.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::DateTime(dt) => dt.format("%Y.%m.%d %H:%M:%S").to_string(),
        }
    }
}

/// Header names plus rows of cells, before any schema mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    CheckCard,
    Cashback,
    OpenBanking,
    InterestDeposit,
    AtmWithdrawal,
    AtmDeposit,
    KbBank,
    /// A vendor label with no translation, kept verbatim.
    Other(String),
}

impl TransactionType {
    /// Vendor label → canonical type. Exact match only; unknown labels are kept.
    pub fn from_vendor(label: &str) -> Self {
        match label {
            "체크카드결제" => Self::CheckCard,
            "입금" => Self::Deposit,
            "출금" => Self::Withdrawal,
            "프로모션입금" => Self::Cashback,
            "오픈뱅킹" => Self::OpenBanking,
            "이자입금" => Self::InterestDeposit,
            "ATM출금" => Self::AtmWithdrawal,
            "KB국민은행" => Self::KbBank,
            "BC카드" => Self::AtmDeposit,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::CheckCard => "Check Card",
            Self::Cashback => "Cashback",
            Self::OpenBanking => "Open Banking",
            Self::InterestDeposit => "Interest Deposit",
            Self::AtmWithdrawal => "ATM Withdrawal",
            Self::AtmDeposit => "ATM Deposit",
            Self::KbBank => "KB Bank",
            Self::Other(s) => s,
        }
    }

    pub fn is_translated(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TransactionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One canonical, normalized transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub timestamp: NaiveDateTime,
    pub remarks: String,
    pub transaction_type: TransactionType,
    pub bank_name: String,
    pub account_number: u64,
    pub amount: f64,
    pub balance_after: f64,
    pub date_only: NaiveDate,
    pub time_of_day: NaiveTime,
    pub month_key: String,
}

impl Transaction {
    /// Builds a transaction, deriving the date, time and month key from `timestamp`.
    pub fn new(
        timestamp: NaiveDateTime,
        remarks: String,
        transaction_type: TransactionType,
        bank_name: String,
        account_number: u64,
        amount: f64,
        balance_after: f64,
    ) -> Self {
        Self {
            date_only: timestamp.date(),
            time_of_day: timestamp.time(),
            month_key: month_key(&timestamp),
            timestamp,
            remarks,
            transaction_type,
            bank_name,
            account_number,
            amount,
            balance_after,
        }
    }

    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

pub fn month_key(ts: &NaiveDateTime) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}
