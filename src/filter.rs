use std::collections::BTreeSet;

use crate::models::Transaction;
use crate::normalizer::CanonicalTable;

/// One axis of the period filter.
///
/// `All` means "no constraint". `Only` with an empty set matches nothing:
/// deselecting every month must produce an empty result, never fall back to
/// showing everything. Keep these two states distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord + Copy> Selection<T> {
    pub fn only(values: impl IntoIterator<Item = T>) -> Self {
        Self::Only(values.into_iter().collect())
    }

    pub fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    pub fn contains(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Only(set) if set.is_empty())
    }

    /// Flip one value, expanding `All` against the given universe first.
    pub fn toggle(&mut self, value: T, universe: &[T]) {
        if let Self::All = self {
            *self = Self::only(universe.iter().copied());
        }
        if let Self::Only(set) = self {
            if !set.remove(&value) {
                set.insert(value);
            }
        }
    }
}

/// Selected years ∩ selected months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodFilter {
    pub years: Selection<i32>,
    pub months: Selection<u32>,
}

impl PeriodFilter {
    pub fn all() -> Self {
        Self {
            years: Selection::All,
            months: Selection::All,
        }
    }

    /// Latest year in the data, every month present in that year. A table
    /// with no rows gets no constraint at all.
    pub fn dashboard_default(table: &CanonicalTable) -> Self {
        match table.available_years().last() {
            Some(&year) => {
                let years = Selection::only([year]);
                let months = Selection::only(table.available_months(&years));
                Self { years, months }
            }
            None => Self::all(),
        }
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        self.years.contains(&t.year()) && self.months.contains(&t.month())
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.months.is_empty()
    }
}

/// A read-only view of the canonical table, in source order.
#[derive(Debug, Clone, Default)]
pub struct FilteredSet<'a> {
    rows: Vec<&'a Transaction>,
}

impl<'a> FilteredSet<'a> {
    pub fn rows(&self) -> &[&'a Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> FromIterator<&'a Transaction> for FilteredSet<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Transaction>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl CanonicalTable {
    pub fn filter(&self, filter: &PeriodFilter) -> FilteredSet<'_> {
        self.transactions()
            .iter()
            .filter(|t| filter.matches(t))
            .collect()
    }

    pub fn available_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.transactions().iter().map(|t| t.year()).collect();
        years.into_iter().collect()
    }

    /// Months present in the data once the year selection is applied.
    pub fn available_months(&self, years: &Selection<i32>) -> Vec<u32> {
        let months: BTreeSet<u32> = self
            .transactions()
            .iter()
            .filter(|t| years.contains(&t.year()))
            .map(|t| t.month())
            .collect();
        months.into_iter().collect()
    }
}
