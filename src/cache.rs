use std::rc::Rc;

use tracing::{debug, info};

use crate::error::Result;
use crate::intake::{read_raw_table, SourceFile};
use crate::normalizer::{normalize, CanonicalTable};

/// Session memo for the normalized table.
///
/// Holds at most one entry keyed by the SHA-256 of the file content. Loading a
/// file with the same content returns the shared table without re-parsing;
/// different content replaces the entry. A failed load leaves the previous
/// entry in place.
#[derive(Debug)]
pub struct SessionCache {
    skip_rows: usize,
    entry: Option<(String, Rc<CanonicalTable>)>,
    hits: usize,
    misses: usize,
}

impl SessionCache {
    pub fn new(skip_rows: usize) -> Self {
        Self {
            skip_rows,
            entry: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn load(&mut self, source: &SourceFile) -> Result<Rc<CanonicalTable>> {
        if let Some((key, table)) = &self.entry {
            if *key == source.checksum {
                self.hits += 1;
                debug!(checksum = source.short_checksum(), "cache hit");
                return Ok(Rc::clone(table));
            }
        }

        self.misses += 1;
        let raw = read_raw_table(source, self.skip_rows)?;
        let table = Rc::new(normalize(&raw)?);
        info!(
            file = %source.name,
            transactions = table.len(),
            "normalized transaction table"
        );
        self.entry = Some((source.checksum.clone(), Rc::clone(&table)));
        Ok(table)
    }

    pub fn current_key(&self) -> Option<&str> {
        self.entry.as_ref().map(|(k, _)| k.as_str())
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
