pub mod aggregator;
pub mod known_sites;
pub mod options;
pub mod output;
pub mod read;
pub mod registry;
pub mod report;
pub mod table;
pub mod traversal;
pub mod types;
pub mod update;

pub use aggregator::{Aggregator, PileupSite, SiteCounters};
pub use known_sites::{KnownSites, NoKnownSites, VariantLookup};
pub use options::{CountOptions, PlatformFilter};
pub use read::{AlignedRead, ReadRecord};
pub use registry::{ReadGroupInfo, ReadGroupRegistry};
pub use report::RunSummary;
pub use table::CovariateTable;
pub use types::{CollapseOptions, CovariateBucket, CovariateKey, Dinucleotide, MAX_QUAL};

use crate::covariates::output::{report_path, PendingReport};
use crate::covariates::traversal::{read_groups_from_header, walk_pileups, ReferenceSequences};
use crate::error::CovariateError;
use crate::utils::bam_reader::BamReaderFactory;
use crate::utils::progress_bar_builder::ProgressBarBuilder;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use indicatif::ProgressBar;
use log::{debug, info};
use rust_htslib::bam::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Files a counting run reads and writes.
#[derive(Clone, Debug)]
pub struct CountInputs {
    pub bam_file: PathBuf,
    pub reference_file: PathBuf,
    pub known_sites: Vec<PathBuf>,
    pub output_root: String,
    pub covariate_counts: bool,
    pub summary_json: Option<PathBuf>,
    pub quiet: bool,
}

/// Counts covariates over `inputs.bam_file` and writes
/// `<output_root>.recal_data.csv` (and the long-form counts if requested).
/// Nothing is written if the run fails.
pub fn run(inputs: &CountInputs, options: CountOptions) -> Result<RunSummary> {
    let recal_report = PendingReport::create(report_path(&inputs.output_root, "recal_data.csv"))?;
    let counts_report = inputs
        .covariate_counts
        .then(|| PendingReport::create(report_path(&inputs.output_root, "covariate_counts.csv")))
        .transpose()?;

    let header = {
        let bam = BamReaderFactory::open(&inputs.bam_file, Some(inputs.reference_file.as_path()))?;
        bam.header().clone()
    };
    let registry = ReadGroupRegistry::from_read_groups(read_groups_from_header(&header), &options.platforms);
    info!(
        "Created recalibration data collectors for {} read group(s)",
        registry.len()
    );

    let known_sites = KnownSites::from_vcfs(inputs.known_sites.as_slice())?;
    let threads = options.threads.max(1);
    let aggregator = Aggregator::new(registry, options);

    let progress = ProgressBarBuilder::new("Counting covariates...")
        .with_template("{spinner:.green} [{elapsed_precise}] {msg}")
        .with_tick()
        .hidden(inputs.quiet)
        .build()?;

    let aggregator = if threads == 1 {
        count_sequential(aggregator, inputs, &known_sites, &progress)?
    } else {
        count_parallel(aggregator, inputs, &known_sites, threads, &progress)?
    };
    progress.finish_with_message("Covariate counting complete");

    let collapse = aggregator.options().collapse;
    let (registry, counters) = aggregator.into_parts();
    let summary = RunSummary::new(Utc::now(), collapse, counters, &registry);
    summary.write_info(&mut std::io::stdout().lock())?;

    info!("Writing raw recalibration data");
    let mut recal_report = recal_report;
    recal_report.write_with(|w| report::write_recal_table(w, &registry, &summary))?;
    let saved = recal_report.persist()?;
    info!("Wrote {}", saved.display());

    if let Some(mut counts_report) = counts_report {
        counts_report.write_with(|w| report::write_covariate_counts(w, &registry))?;
        let saved = counts_report.persist()?;
        info!("Wrote {}", saved.display());
    }

    if let Some(path) = &inputs.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?;
    }

    Ok(summary)
}

fn count_sequential(
    mut aggregator: Aggregator,
    inputs: &CountInputs,
    known_sites: &dyn VariantLookup,
    progress: &ProgressBar,
) -> Result<Aggregator> {
    let mut bam = BamReaderFactory::open(&inputs.bam_file, Some(inputs.reference_file.as_path()))?;
    let header = bam.header().clone();
    let mut reference = ReferenceSequences::open(&inputs.reference_file)?;
    let never = AtomicBool::new(false);

    walk_pileups(
        &mut bam,
        &header,
        &mut reference,
        known_sites,
        &never,
        progress,
        |site| aggregator.process_site(site),
    )?;
    Ok(aggregator)
}

/// Splits the traversal by contig over `threads` workers, each filling its own
/// registry, then merges the results. The first failing worker cancels the rest.
fn count_parallel(
    mut aggregator: Aggregator,
    inputs: &CountInputs,
    known_sites: &dyn VariantLookup,
    threads: usize,
    progress: &ProgressBar,
) -> Result<Aggregator> {
    let header = BamReaderFactory::open_indexed(&inputs.bam_file, Some(inputs.reference_file.as_path()))?
        .header()
        .clone();

    let (tx, rx) = crossbeam_channel::unbounded::<u32>();
    for tid in 0..header.target_count() {
        tx.send(tid)?;
    }
    drop(tx);
    debug!(
        "Distributing {} contigs over {} workers",
        header.target_count(),
        threads
    );

    let cancel = AtomicBool::new(false);
    let results: Vec<Result<Aggregator>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let rx = rx.clone();
                let mut worker = aggregator.fork();
                let cancel = &cancel;
                scope.spawn(move || {
                    let outcome = (|| -> Result<Aggregator> {
                        let mut bam = BamReaderFactory::open_indexed(
                            &inputs.bam_file,
                            Some(inputs.reference_file.as_path()),
                        )?;
                        let header = bam.header().clone();
                        let mut reference = ReferenceSequences::open(&inputs.reference_file)?;
                        while let Ok(tid) = rx.recv() {
                            if cancel.load(Ordering::Relaxed) {
                                break;
                            }
                            let len = header.target_len(tid).unwrap_or(0);
                            bam.fetch((tid, 0, len))?;
                            walk_pileups(
                                &mut bam,
                                &header,
                                &mut reference,
                                known_sites,
                                cancel,
                                progress,
                                |site| worker.process_site(site),
                            )?;
                        }
                        Ok(worker)
                    })();
                    if outcome.is_err() {
                        cancel.store(true, Ordering::Relaxed);
                    }
                    outcome
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err(anyhow!("Covariate worker panicked"))))
            .collect()
    });

    let mut failure = None;
    for result in results {
        match result {
            Ok(worker) => aggregator.merge(&worker),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(aggregator),
    }
}

/// Feeds an already-materialised stream of sites through `aggregator`, for
/// callers that drive the traversal themselves.
pub fn count_sites<R, I>(aggregator: &mut Aggregator, sites: I) -> Result<SiteCounters, CovariateError>
where
    R: AlignedRead,
    I: IntoIterator<Item = PileupSite<R>>,
{
    for site in sites {
        aggregator.process_site(&site)?;
    }
    Ok(aggregator.counters())
}
