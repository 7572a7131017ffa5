// src/utils/bam_reader.rs
use anyhow::{Context, Result};
use rust_htslib::bam;
use std::path::Path;

pub struct BamReaderFactory;

fn is_cram(bam_path: &Path) -> bool {
    bam_path.extension().is_some_and(|ext| ext == "cram")
}

impl BamReaderFactory {
    pub fn open_indexed(bam_path: &Path, reference_path: Option<&Path>) -> Result<bam::IndexedReader> {
        let mut reader = bam::IndexedReader::from_path(bam_path)
            .with_context(|| format!("Failed to open indexed alignments {}", bam_path.display()))?;
        if let (true, Some(ref_path)) = (is_cram(bam_path), reference_path) {
            reader
                .set_reference(ref_path)
                .with_context(|| format!("Failed to set CRAM reference {}", ref_path.display()))?;
        }
        Ok(reader)
    }

    pub fn open(bam_path: &Path, reference_path: Option<&Path>) -> Result<bam::Reader> {
        let mut reader = bam::Reader::from_path(bam_path)
            .with_context(|| format!("Failed to open alignments {}", bam_path.display()))?;
        if let (true, Some(ref_path)) = (is_cram(bam_path), reference_path) {
            reader
                .set_reference(ref_path)
                .with_context(|| format!("Failed to set CRAM reference {}", ref_path.display()))?;
        }
        Ok(reader)
    }
}
