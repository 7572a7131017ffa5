use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count base mismatches per read group, cycle, reported quality and dinucleotide
    CountCovariates(CountCovariatesArgs),

    /// Write the default configuration to the user config directory
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CountCovariatesArgs {
    /// Coordinate-sorted BAM/CRAM file (indexed when --threads > 1)
    pub bam_file: PathBuf,

    /// Indexed FASTA reference the reads were aligned to
    #[arg(short = 'R', long = "reference")]
    pub reference_file: PathBuf,

    /// VCF/BCF of known variant sites to exclude (repeatable)
    #[arg(short = 'D', long = "known-sites")]
    pub known_sites: Vec<PathBuf>,

    /// Filename root for the output tables [config default: output]
    #[arg(long = "outroot", visible_alias = "output-fileroot")]
    pub output_root: Option<String>,

    /// Only use reads with at least this mapping quality [config default: 1]
    #[arg(long = "minmap", visible_alias = "min-mapping-quality")]
    pub min_mapping_quality: Option<u8>,

    /// Only use reads from this read group (@RG ID)
    #[arg(long = "rg", visible_alias = "read-group")]
    pub read_group: Option<String>,

    /// Only calibrate read groups from these platforms (* for all) [config default: *]
    #[arg(long = "pl", visible_alias = "platform")]
    pub platforms: Vec<String>,

    /// Report all cycles as a single position
    #[arg(long = "collapsePos", visible_alias = "collapse-pos")]
    pub collapse_pos: bool,

    /// Report all dinucleotide contexts as one
    #[arg(long = "collapseDinuc", visible_alias = "collapse-dinuc")]
    pub collapse_dinuc: bool,

    /// Abort if a read is longer than this [config default: 100000]
    #[arg(long = "max-read-length", visible_alias = "buggyMaxReadLen")]
    pub max_read_length: Option<usize>,

    /// Worker threads; contigs are split between them [config default: 1]
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Also write the long-form <outroot>.covariate_counts.csv
    #[arg(long = "covariate-counts")]
    pub covariate_counts: bool,

    /// Write a JSON run summary to this path
    #[arg(long = "summary-json")]
    pub summary_json: Option<PathBuf>,

    /// Read defaults from this TOML file instead of the user config
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Hide the progress spinner
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}
