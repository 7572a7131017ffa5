use anyhow::{Context, Result};
use log::{debug, info};
use rust_htslib::bcf::{self, Read};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Answers whether a reference position is a known variant site.
pub trait VariantLookup: Sync {
    /// `pos` is 0-based.
    fn is_known_variant(&self, contig: &str, pos: u64) -> bool;
}

/// No known variants; every site is counted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoKnownSites;

impl VariantLookup for NoKnownSites {
    fn is_known_variant(&self, _contig: &str, _pos: u64) -> bool {
        false
    }
}

/// Known SNP positions, keyed by contig.
#[derive(Debug, Clone, Default)]
pub struct KnownSites {
    by_contig: HashMap<String, HashSet<u64>>,
}

impl KnownSites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contig: &str, pos: u64) {
        self.by_contig
            .entry(contig.to_string())
            .or_default()
            .insert(pos);
    }

    pub fn len(&self) -> usize {
        self.by_contig.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_contig.values().all(HashSet::is_empty)
    }

    /// Loads the SNP records of every VCF/BCF in `paths`. Indels and other
    /// multi-base records are ignored.
    pub fn from_vcfs<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut sites = Self::new();
        for path in paths {
            sites.load_vcf(path.as_ref())?;
        }
        Ok(sites)
    }

    fn load_vcf(&mut self, path: &Path) -> Result<()> {
        let mut reader = bcf::Reader::from_path(path)
            .with_context(|| format!("Failed to open known sites file {}", path.display()))?;
        let header = reader.header().clone();

        let mut loaded = 0usize;
        let mut ignored = 0usize;
        for r in reader.records() {
            let record = r.with_context(|| format!("Malformed record in {}", path.display()))?;
            let Some(rid) = record.rid() else {
                continue;
            };
            let is_snp = {
                let alleles = record.alleles();
                alleles.len() > 1 && alleles.iter().all(|a| a.len() == 1 && *a != b"*")
            };
            if !is_snp {
                ignored += 1;
                continue;
            }
            let contig = std::str::from_utf8(header.rid2name(rid)?)?;
            self.insert(contig, record.pos() as u64);
            loaded += 1;
        }

        debug!("Ignored {} non-SNP records in {}", ignored, path.display());
        info!("Loaded {} known SNP sites from {}", loaded, path.display());
        Ok(())
    }
}

impl VariantLookup for KnownSites {
    fn is_known_variant(&self, contig: &str, pos: u64) -> bool {
        self.by_contig
            .get(contig)
            .is_some_and(|positions| positions.contains(&pos))
    }
}
