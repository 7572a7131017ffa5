use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a covariate counting run.
#[derive(Error, Debug)]
pub enum CovariateError {
    /// A read longer than the configured ceiling means the input is malformed.
    #[error(
        "Unexpectedly long read '{read_name}' ({length} bases > {max_length}); \
         increase the maximum read length with --max-read-length"
    )]
    ReadTooLong {
        read_name: String,
        length: usize,
        max_length: usize,
    },

    /// A contig with coverage has no sequence in the reference.
    #[error("Reference sequence '{contig}' not found in {path}")]
    MissingReference { contig: String, path: PathBuf },

    /// The report could not be created at the requested location.
    #[error("Couldn't open output file {path}: {source}")]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
