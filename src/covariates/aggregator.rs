use crate::covariates::options::CountOptions;
use crate::covariates::read::AlignedRead;
use crate::covariates::registry::ReadGroupRegistry;
use crate::covariates::update::update_from_read;
use crate::error::CovariateError;
use serde::Serialize;
use std::ops::AddAssign;

/// One reference position and the reads covering it.
#[derive(Debug, Clone)]
pub struct PileupSite<R> {
    pub contig: String,
    /// 0-based
    pub pos: u64,
    pub ref_base: u8,
    /// Each read paired with the offset of the base aligned to `pos`.
    pub reads: Vec<(R, usize)>,
    pub is_known_variant: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SiteCounters {
    pub counted_sites: u64,
    pub counted_bases: u64,
    pub skipped_sites: u64,
}

impl SiteCounters {
    /// Skipped sites per counted site; `None` when nothing was skipped.
    /// Infinite when sites were skipped but none counted.
    pub fn skip_fraction(&self) -> Option<f64> {
        if self.skipped_sites == 0 {
            return None;
        }
        Some(self.skipped_sites as f64 / self.counted_sites as f64)
    }
}

impl AddAssign for SiteCounters {
    fn add_assign(&mut self, other: Self) {
        self.counted_sites += other.counted_sites;
        self.counted_bases += other.counted_bases;
        self.skipped_sites += other.skipped_sites;
    }
}

/// Feeds pileup sites into a read-group registry and keeps the run counters.
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: ReadGroupRegistry,
    options: CountOptions,
    counters: SiteCounters,
}

impl Aggregator {
    pub fn new(registry: ReadGroupRegistry, options: CountOptions) -> Self {
        Self {
            registry,
            options,
            counters: SiteCounters::default(),
        }
    }

    /// Fresh aggregator over the same read groups and options.
    pub fn fork(&self) -> Self {
        Self::new(self.registry.clone_empty(), self.options.clone())
    }

    pub fn registry(&self) -> &ReadGroupRegistry {
        &self.registry
    }

    pub fn counters(&self) -> SiteCounters {
        self.counters
    }

    pub fn options(&self) -> &CountOptions {
        &self.options
    }

    pub fn into_parts(self) -> (ReadGroupRegistry, SiteCounters) {
        (self.registry, self.counters)
    }

    /// Counts the usable bases at `site`, returning how many were counted.
    ///
    /// Any read longer than the configured maximum aborts with
    /// [`CovariateError::ReadTooLong`] before the registry is touched.
    pub fn process_site<R: AlignedRead>(
        &mut self,
        site: &PileupSite<R>,
    ) -> Result<u64, CovariateError> {
        if site.is_known_variant {
            self.counters.skipped_sites += 1;
            return Ok(0);
        }

        if let Some((read, _)) = site
            .reads
            .iter()
            .find(|(read, _)| read.len() > self.options.max_read_length)
        {
            return Err(CovariateError::ReadTooLong {
                read_name: read.name(),
                length: read.len(),
                max_length: self.options.max_read_length,
            });
        }

        let collapse = self.options.collapse;
        let mut counted = 0;
        for (read, offset) in &site.reads {
            let Some(rg) = read.read_group() else {
                continue;
            };
            if !self.options.selects_read_group(rg)
                || read.mapping_quality() < self.options.min_mapping_quality
            {
                continue;
            }
            let Some(table) = self.registry.table_mut(rg) else {
                continue;
            };
            if *offset == 0 || *offset + 1 >= read.len() {
                continue;
            }
            if update_from_read(table, read, *offset, site.ref_base, collapse) {
                counted += 1;
            }
        }

        self.counters.counted_sites += 1;
        self.counters.counted_bases += counted;
        Ok(counted)
    }

    /// Adds another aggregator's observations and counters into this one.
    pub fn merge(&mut self, other: &Aggregator) {
        self.registry.merge(&other.registry);
        self.counters += other.counters;
    }
}
