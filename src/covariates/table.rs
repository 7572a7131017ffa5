use crate::covariates::types::{CovariateBucket, CovariateKey};
use std::collections::HashMap;

/// Sparse covariate counts for one read group. Buckets appear on first use
/// and are never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CovariateTable {
    buckets: HashMap<CovariateKey, CovariateBucket>,
}

impl CovariateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, key: CovariateKey) -> &mut CovariateBucket {
        self.buckets.entry(key).or_default()
    }

    pub fn get(&self, key: &CovariateKey) -> Option<&CovariateBucket> {
        self.buckets.get(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CovariateKey, &CovariateBucket)> {
        self.buckets.iter()
    }

    /// Buckets in report order (dinucleotide, quality, cycle).
    pub fn sorted(&self) -> Vec<(&CovariateKey, &CovariateBucket)> {
        let mut entries: Vec<_> = self.buckets.iter().collect();
        entries.sort_by_key(|(key, _)| key.report_order());
        entries
    }

    pub fn total_observations(&self) -> u64 {
        self.buckets.values().map(|b| b.observations()).sum()
    }

    pub fn total_mismatches(&self) -> u64 {
        self.buckets.values().map(|b| b.mismatches()).sum()
    }

    /// Adds every bucket of `other` into this table.
    pub fn merge(&mut self, other: &CovariateTable) {
        for (key, bucket) in &other.buckets {
            self.get_or_create(*key).merge(bucket);
        }
    }
}
