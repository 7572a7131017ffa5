use crate::covariates::options::PlatformFilter;
use crate::covariates::table::CovariateTable;
use log::warn;
use std::collections::HashMap;

/// `@RG` header entry as far as covariate counting cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroupInfo {
    pub id: String,
    pub platform: Option<String>,
}

impl ReadGroupInfo {
    pub fn new(id: impl Into<String>, platform: Option<&str>) -> Self {
        Self {
            id: id.into(),
            platform: platform.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadGroupEntry {
    pub info: ReadGroupInfo,
    pub table: CovariateTable,
}

/// One covariate table per eligible read group, kept in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadGroupRegistry {
    groups: Vec<ReadGroupEntry>,
    index: HashMap<String, usize>,
}

impl ReadGroupRegistry {
    /// Registers every read group whose platform passes `platforms`.
    pub fn from_read_groups<I>(read_groups: I, platforms: &PlatformFilter) -> Self
    where
        I: IntoIterator<Item = ReadGroupInfo>,
    {
        let mut registry = Self::default();
        for info in read_groups {
            if info.platform.is_none() {
                warn!(
                    "PL attribute for read group {} is unset; assuming all reads are supported",
                    info.id
                );
            }
            if !platforms.allows(info.platform.as_deref()) {
                continue;
            }
            registry.register(info);
        }
        registry
    }

    fn register(&mut self, info: ReadGroupInfo) -> usize {
        if let Some(&idx) = self.index.get(&info.id) {
            return idx;
        }
        let idx = self.groups.len();
        self.index.insert(info.id.clone(), idx);
        self.groups.push(ReadGroupEntry {
            info,
            table: CovariateTable::new(),
        });
        idx
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, read_group: &str) -> bool {
        self.index.contains_key(read_group)
    }

    pub fn table(&self, read_group: &str) -> Option<&CovariateTable> {
        self.index.get(read_group).map(|&idx| &self.groups[idx].table)
    }

    pub fn table_mut(&mut self, read_group: &str) -> Option<&mut CovariateTable> {
        self.index
            .get(read_group)
            .map(|&idx| &mut self.groups[idx].table)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ReadGroupEntry> {
        self.groups.iter()
    }

    pub fn bucket_count(&self) -> usize {
        self.groups.iter().map(|g| g.table.len()).sum()
    }

    /// Same read groups, no observations. Used to seed per-worker registries.
    pub fn clone_empty(&self) -> Self {
        let mut registry = Self::default();
        for entry in &self.groups {
            registry.register(entry.info.clone());
        }
        registry
    }

    /// Sums `other` into this registry. Read groups unknown here are appended
    /// after the existing ones.
    pub fn merge(&mut self, other: &ReadGroupRegistry) {
        for entry in &other.groups {
            let idx = self.register(entry.info.clone());
            self.groups[idx].table.merge(&entry.table);
        }
    }
}
