use serde::Serialize;

use crate::filter::FilteredSet;
use crate::fmt::won;

/// Placeholder for a redacted cell.
pub const MASK: &str = "****";

/// One display row of the transaction register, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRow {
    pub timestamp: String,
    pub transaction_type: String,
    pub remarks: String,
    pub amount: String,
    pub balance: String,
    pub bank: String,
    /// Sign of the underlying amount, kept for coloring even when masked.
    #[serde(skip)]
    pub negative: bool,
}

/// Register rows in source order. With `privacy` on, remarks, amount,
/// balance and bank are replaced by [`MASK`]; only the display is affected.
pub fn rows(set: &FilteredSet<'_>, privacy: bool) -> Vec<RegisterRow> {
    let redact = |value: String| if privacy { MASK.to_string() } else { value };
    set.rows()
        .iter()
        .map(|t| RegisterRow {
            timestamp: t.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            transaction_type: t.transaction_type.label().to_string(),
            remarks: redact(t.remarks.clone()),
            amount: redact(won(t.amount)),
            balance: redact(won(t.balance_after)),
            bank: redact(t.bank_name.clone()),
            negative: t.amount < 0.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{AggregateView, DEFAULT_TOP_N};
    use crate::filter::tests::txn;
    use crate::filter::PeriodFilter;
    use crate::models::TransactionType;
    use crate::normalizer::CanonicalTable;

    fn table() -> CanonicalTable {
        CanonicalTable::new(vec![
            txn("2024-05-01 09:15:30", "급여", TransactionType::Deposit, 2_500_000.0, 2_500_000.0),
            txn("2024-05-02 13:00:00", "식당", TransactionType::CheckCard, -12_000.0, 2_488_000.0),
        ])
    }

    #[test]
    fn test_rows_formatted_without_privacy() {
        let table = table();
        let set = table.filter(&PeriodFilter::all());
        let rows = rows(&set, false);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, "2024-05-01 09:15");
        assert_eq!(rows[0].amount, "₩2,500,000");
        assert_eq!(rows[1].transaction_type, "Check Card");
        assert_eq!(rows[1].amount, "-₩12,000");
        assert_eq!(rows[1].balance, "₩2,488,000");
        assert_eq!(rows[1].bank, "토스뱅크");
        assert!(rows[1].negative);
    }

    #[test]
    fn test_privacy_masks_sensitive_columns_only() {
        let table = table();
        let set = table.filter(&PeriodFilter::all());
        let masked = rows(&set, true);
        for row in &masked {
            assert_eq!(row.remarks, MASK);
            assert_eq!(row.amount, MASK);
            assert_eq!(row.balance, MASK);
            assert_eq!(row.bank, MASK);
        }
        assert_eq!(masked[0].timestamp, "2024-05-01 09:15");
        assert_eq!(masked[0].transaction_type, "Deposit");
    }

    #[test]
    fn test_privacy_does_not_touch_aggregates() {
        let table = table();
        let set = table.filter(&PeriodFilter::all());
        let before = AggregateView::compute(&set, DEFAULT_TOP_N);
        let _ = rows(&set, true);
        let after = AggregateView::compute(&set, DEFAULT_TOP_N);
        assert_eq!(before, after);
        assert_eq!(after.top_withdrawals[0].remarks, "식당");
    }
}
