//! Derived summaries over a filtered set of transactions.
//!
//! Every function here is total: an empty slice produces zeroed metrics and
//! empty series, never an error.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::FilteredSet;
use crate::models::{Transaction, TransactionType};

pub const DEFAULT_TOP_N: usize = 15;

// ---------------------------------------------------------------------------
// KPI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiMetrics {
    pub deposit: f64,
    pub withdrawal: f64,
    pub balance: f64,
    pub count: usize,
    pub cashback: f64,
    pub interest: f64,
}

pub fn kpi_metrics(rows: &[&Transaction]) -> KpiMetrics {
    let mut kpi = KpiMetrics {
        count: rows.len(),
        ..Default::default()
    };
    for t in rows {
        if t.amount > 0.0 {
            kpi.deposit += t.amount;
        } else if t.amount < 0.0 {
            kpi.withdrawal += -t.amount;
        }
        match t.transaction_type {
            TransactionType::Cashback => kpi.cashback += t.amount,
            TransactionType::InterestDeposit => kpi.interest += t.amount,
            _ => {}
        }
    }
    kpi.balance = latest(rows).map(|t| t.balance_after).unwrap_or(0.0);
    kpi
}

/// Transaction with the greatest timestamp. Among equal timestamps the
/// earliest source row wins.
pub fn latest<'a>(rows: &[&'a Transaction]) -> Option<&'a Transaction> {
    let mut best: Option<&'a Transaction> = None;
    for &t in rows {
        match best {
            Some(b) if t.timestamp <= b.timestamp => {}
            _ => best = Some(t),
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Monthly series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// Income and expense per month present in the set, ascending by month key.
/// Only non-zero amounts place a month in the series; gaps are not back-filled.
pub fn monthly_flow(rows: &[&Transaction]) -> Vec<MonthlyFlow> {
    let mut months: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for t in rows {
        if t.amount == 0.0 {
            continue;
        }
        let entry = months.entry(t.month_key.as_str()).or_default();
        if t.amount > 0.0 {
            entry.0 += t.amount;
        } else {
            entry.1 += -t.amount;
        }
    }
    months
        .into_iter()
        .map(|(month, (income, expense))| MonthlyFlow {
            month: month.to_string(),
            income,
            expense,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NetBucket {
    Positive,
    NonPositive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetIncome {
    pub month: String,
    pub net: f64,
}

impl NetIncome {
    /// Zero lands in the non-positive bucket.
    pub fn bucket(&self) -> NetBucket {
        if self.net > 0.0 {
            NetBucket::Positive
        } else {
            NetBucket::NonPositive
        }
    }
}

pub fn net_income(rows: &[&Transaction]) -> Vec<NetIncome> {
    monthly_flow(rows)
        .into_iter()
        .map(|m| NetIncome {
            net: m.income - m.expense,
            month: m.month,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Hourly histogram
// ---------------------------------------------------------------------------

/// Transactions per hour of day. Hours with no transactions are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HourlyHistogram(BTreeMap<u32, usize>);

impl HourlyHistogram {
    pub fn count(&self, hour: u32) -> usize {
        self.0.get(&hour).copied().unwrap_or(0)
    }

    pub fn hours(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.0.iter().map(|(h, c)| (*h, *c))
    }

    pub fn zero_filled(&self) -> [usize; 24] {
        std::array::from_fn(|h| self.count(h as u32))
    }
}

pub fn hourly_histogram(rows: &[&Transaction]) -> HourlyHistogram {
    let mut hours = BTreeMap::new();
    for t in rows {
        *hours.entry(t.hour()).or_insert(0) += 1;
    }
    HourlyHistogram(hours)
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    fn admits(self, amount: f64) -> bool {
        match self {
            Self::Positive => amount > 0.0,
            Self::Negative => amount < 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemarkTotal {
    pub remarks: String,
    pub total: f64,
}

/// Largest remarks by absolute summed amount, restricted to one sign.
///
/// Remarks are grouped on the raw string and visited in key order; the sort
/// is stable so equal totals keep that order. Fewer groups than `limit`
/// yields a shorter list.
pub fn top_remarks(rows: &[&Transaction], sign: Sign, limit: usize) -> Vec<RemarkTotal> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for t in rows.iter().filter(|t| sign.admits(t.amount)) {
        *groups.entry(t.remarks.as_str()).or_default() += t.amount;
    }
    let mut ranked: Vec<RemarkTotal> = groups
        .into_iter()
        .map(|(remarks, sum)| RemarkTotal {
            remarks: remarks.to_string(),
            total: sum.abs(),
        })
        .collect();
    ranked.sort_by(|a, b| b.total.total_cmp(&a.total));
    ranked.truncate(limit);
    ranked
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeTotal {
    pub transaction_type: TransactionType,
    pub total: f64,
}

/// Signed sum per transaction type, largest magnitude first.
pub fn type_totals(rows: &[&Transaction]) -> Vec<TypeTotal> {
    let mut groups: BTreeMap<&TransactionType, f64> = BTreeMap::new();
    for t in rows {
        *groups.entry(&t.transaction_type).or_default() += t.amount;
    }
    let mut totals: Vec<TypeTotal> = groups
        .into_iter()
        .map(|(ty, total)| TypeTotal {
            transaction_type: ty.clone(),
            total,
        })
        .collect();
    totals.sort_by(|a, b| b.total.abs().total_cmp(&a.total.abs()));
    totals
}

// ---------------------------------------------------------------------------
// Cash-flow split and the bundled view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashFlowSplit {
    pub income: f64,
    pub expense: f64,
}

impl CashFlowSplit {
    pub fn from_kpi(kpi: &KpiMetrics) -> Self {
        Self {
            income: kpi.deposit,
            expense: kpi.withdrawal,
        }
    }

    /// Income as a fraction of total flow; 0 when there is no flow.
    pub fn income_share(&self) -> f64 {
        let total = self.income + self.expense;
        if total > 0.0 {
            self.income / total
        } else {
            0.0
        }
    }
}

/// Everything the dashboard and reports render for one filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateView {
    pub kpi: KpiMetrics,
    pub cash_flow: CashFlowSplit,
    pub monthly: Vec<MonthlyFlow>,
    pub net_income: Vec<NetIncome>,
    pub hourly: HourlyHistogram,
    pub top_withdrawals: Vec<RemarkTotal>,
    pub top_deposits: Vec<RemarkTotal>,
    pub type_totals: Vec<TypeTotal>,
}

impl AggregateView {
    pub fn compute(set: &FilteredSet<'_>, top_n: usize) -> Self {
        let rows = set.rows();
        let kpi = kpi_metrics(rows);
        Self {
            cash_flow: CashFlowSplit::from_kpi(&kpi),
            kpi,
            monthly: monthly_flow(rows),
            net_income: net_income(rows),
            hourly: hourly_histogram(rows),
            top_withdrawals: top_remarks(rows, Sign::Negative, top_n),
            top_deposits: top_remarks(rows, Sign::Positive, top_n),
            type_totals: type_totals(rows),
        }
    }
}
