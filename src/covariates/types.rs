use serde::Serialize;
use std::fmt;

/// Highest reported quality a covariate key can hold (the SAM/BAM ceiling).
pub const MAX_QUAL: u8 = 93;

/// Printed in place of a collapsed position or dinucleotide.
pub const COLLAPSED_MARKER: &str = "*";

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Index of an unambiguous base in `A, C, G, T` order.
pub fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Watson-Crick complement; anything that isn't ACGT becomes `N`.
pub fn complement(base: u8) -> u8 {
    match base.to_ascii_uppercase() {
        b'A' => b'T',
        b'C' => b'G',
        b'G' => b'C',
        b'T' => b'A',
        _ => b'N',
    }
}

/// Ordered (previous, current) base pair in sequencing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dinucleotide(u8);

impl Dinucleotide {
    pub const COUNT: usize = 16;

    pub fn from_bases(prev: u8, current: u8) -> Option<Self> {
        let p = base_index(prev)?;
        let c = base_index(current)?;
        Some(Dinucleotide((p * 4 + c) as u8))
    }

    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::COUNT).then_some(Dinucleotide(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn bases(self) -> [u8; 2] {
        [BASES[self.index() / 4], BASES[self.index() % 4]]
    }
}

impl fmt::Display for Dinucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [prev, current] = self.bases();
        write!(f, "{}{}", prev as char, current as char)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollapseOptions {
    pub collapse_pos: bool,
    pub collapse_dinuc: bool,
}

/// (cycle, reported quality, dinucleotide) with `None` standing for a collapsed
/// component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CovariateKey {
    cycle: Option<u32>,
    quality: u8,
    dinuc: Option<Dinucleotide>,
}

impl CovariateKey {
    pub fn new(cycle: u32, quality: u8, dinuc: Dinucleotide, collapse: CollapseOptions) -> Self {
        debug_assert!(quality > 0 && quality <= MAX_QUAL);
        Self {
            cycle: (!collapse.collapse_pos).then_some(cycle),
            quality,
            dinuc: (!collapse.collapse_dinuc).then_some(dinuc),
        }
    }

    pub fn cycle(&self) -> Option<u32> {
        self.cycle
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn dinuc(&self) -> Option<Dinucleotide> {
        self.dinuc
    }

    /// Sort key for reports: dinucleotide, then quality, then cycle.
    pub fn report_order(&self) -> (Option<Dinucleotide>, u8, Option<u32>) {
        (self.dinuc, self.quality, self.cycle)
    }

    pub fn cycle_label(&self) -> String {
        self.cycle
            .map_or_else(|| COLLAPSED_MARKER.to_string(), |c| c.to_string())
    }

    pub fn dinuc_label(&self) -> String {
        self.dinuc
            .map_or_else(|| COLLAPSED_MARKER.to_string(), |d| d.to_string())
    }
}

/// Observation counters for one covariate key. `mismatches <= observations`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CovariateBucket {
    observations: u64,
    mismatches: u64,
}

impl CovariateBucket {
    pub fn increment(&mut self, mismatch: bool) {
        self.observations += 1;
        if mismatch {
            self.mismatches += 1;
        }
    }

    pub fn merge(&mut self, other: &CovariateBucket) {
        self.observations += other.observations;
        self.mismatches += other.mismatches;
    }

    /// N
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// B
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }

    pub fn matches(&self) -> u64 {
        self.observations - self.mismatches
    }

    /// Phred-scaled observed error rate, capped at `MAX_QUAL` so that a
    /// bucket without mismatches stays finite.
    pub fn empirical_quality(&self) -> f64 {
        if self.observations == 0 {
            return 0.0;
        }
        let floor = 10f64.powf(-(MAX_QUAL as f64) / 10.0);
        let rate = (self.mismatches as f64 / self.observations as f64).max(floor);
        -10.0 * rate.log10()
    }
}
