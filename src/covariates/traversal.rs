use crate::covariates::aggregator::PileupSite;
use crate::covariates::known_sites::VariantLookup;
use crate::covariates::registry::ReadGroupInfo;
use crate::error::CovariateError;
use anyhow::{Context, Result};
use bio::io::fasta::IndexedReader;
use indicatif::ProgressBar;
use rust_htslib::bam;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const MAX_PILEUP_DEPTH: u32 = 1_000_000;
const PROGRESS_INTERVAL: u64 = 10_000;

/// `@RG` entries of a BAM header, in header order.
pub fn read_groups_from_header(header: &bam::HeaderView) -> Vec<ReadGroupInfo> {
    let header = bam::Header::from_template(header);
    let records = header.to_hashmap();
    records
        .get("RG")
        .map(|groups| {
            groups
                .iter()
                .filter_map(|rg| {
                    rg.get("ID")
                        .map(|id| ReadGroupInfo::new(id.as_str(), rg.get("PL").map(String::as_str)))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Indexed FASTA that keeps the current contig in memory.
pub struct ReferenceSequences {
    path: PathBuf,
    reader: IndexedReader<File>,
    contig: String,
    sequence: Vec<u8>,
}

impl ReferenceSequences {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = IndexedReader::from_file(&path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to open indexed reference {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            contig: String::new(),
            sequence: Vec::new(),
        })
    }

    fn load(&mut self, contig: &str) -> Result<(), CovariateError> {
        let missing = || CovariateError::MissingReference {
            contig: contig.to_string(),
            path: self.path.clone(),
        };
        self.sequence.clear();
        self.reader.fetch_all(contig).map_err(|_| missing())?;
        self.reader.read(&mut self.sequence).map_err(|_| missing())?;
        self.contig = contig.to_string();
        Ok(())
    }

    /// Reference base at 0-based `pos`; `N` past the end of the contig.
    pub fn base(&mut self, contig: &str, pos: u64) -> Result<u8, CovariateError> {
        if self.contig != contig {
            self.load(contig)?;
        }
        Ok(self
            .sequence
            .get(pos as usize)
            .map_or(b'N', |b| b.to_ascii_uppercase()))
    }
}

/// Walks every pileup column `bam` yields and hands each one to `visit` as a
/// [`PileupSite`]. Deletions and reference skips don't contribute a read.
/// Stops early, without error, once `cancel` is set.
pub fn walk_pileups<B, F>(
    bam: &mut B,
    header: &bam::HeaderView,
    reference: &mut ReferenceSequences,
    known_sites: &dyn VariantLookup,
    cancel: &AtomicBool,
    progress: &ProgressBar,
    mut visit: F,
) -> Result<()>
where
    B: bam::Read,
    F: FnMut(&PileupSite<bam::Record>) -> Result<u64, CovariateError>,
{
    let mut pileups = bam.pileup();
    pileups.set_max_depth(MAX_PILEUP_DEPTH);

    let mut sites = 0u64;
    for p in pileups {
        if cancel.load(Ordering::Relaxed) {
            break;
        }
        let pileup = p.context("Failed to read pileup")?;
        let contig = std::str::from_utf8(header.tid2name(pileup.tid()))?;
        let pos = pileup.pos() as u64;

        let reads: Vec<_> = pileup
            .alignments()
            .filter(|aln| !aln.is_del() && !aln.is_refskip())
            .filter_map(|aln| aln.qpos().map(|qpos| (aln.record(), qpos)))
            .collect();

        let site = PileupSite {
            contig: contig.to_string(),
            pos,
            ref_base: reference.base(contig, pos)?,
            reads,
            is_known_variant: known_sites.is_known_variant(contig, pos),
        };
        visit(&site)?;

        sites += 1;
        if sites % PROGRESS_INTERVAL == 0 {
            progress.set_message(format!("Processing {}:{}", contig, pos + 1));
            progress.tick();
        }
    }
    Ok(())
}
