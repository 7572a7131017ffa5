//! Per-base covariate computation.
//!
//! Observations are recorded by machine cycle rather than by offset into the
//! stored read: a reverse-strand read was sequenced from its last stored base
//! backwards, so both the cycle and the preceding base flip with orientation.

use crate::covariates::read::AlignedRead;
use crate::covariates::table::CovariateTable;
use crate::covariates::types::{
    base_index, complement, CollapseOptions, CovariateKey, Dinucleotide, MAX_QUAL,
};

/// Covariate key and match outcome for one base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseObservation {
    pub key: CovariateKey,
    pub mismatch: bool,
}

/// Computes the key for the base at `offset`, or `None` when the base cannot
/// be counted (read edge, quality 0 or missing, ambiguous base).
pub fn observe<R: AlignedRead>(
    read: &R,
    offset: usize,
    ref_base: u8,
    collapse: CollapseOptions,
) -> Option<BaseObservation> {
    let len = read.len();
    if offset == 0 || offset + 1 >= len {
        return None;
    }

    let quality = read.quality(offset);
    if quality == 0 || quality > MAX_QUAL {
        return None;
    }

    let (cycle, base, prev_base, ref_base) = if read.is_reverse() {
        (
            len - (offset + 1),
            complement(read.base(offset)),
            complement(read.base(offset + 1)),
            complement(ref_base),
        )
    } else {
        (
            offset,
            read.base(offset).to_ascii_uppercase(),
            read.base(offset - 1).to_ascii_uppercase(),
            ref_base.to_ascii_uppercase(),
        )
    };

    base_index(ref_base)?;
    let dinuc = Dinucleotide::from_bases(prev_base, base)?;

    Some(BaseObservation {
        key: CovariateKey::new(cycle as u32, quality, dinuc, collapse),
        mismatch: base != ref_base,
    })
}

/// Applies the base at `offset` to `table`. Returns whether it was counted.
pub fn update_from_read<R: AlignedRead>(
    table: &mut CovariateTable,
    read: &R,
    offset: usize,
    ref_base: u8,
    collapse: CollapseOptions,
) -> bool {
    match observe(read, offset, ref_base, collapse) {
        Some(observation) => {
            table
                .get_or_create(observation.key)
                .increment(observation.mismatch);
            true
        }
        None => false,
    }
}
