use rust_htslib::bam::{self, record::Aux};

/// The view of an aligned read the covariate counter needs. Implemented for
/// htslib records and for plain in-memory reads.
pub trait AlignedRead {
    fn name(&self) -> String;
    fn len(&self) -> usize;
    /// Base at `offset`, in stored (reference-forward) orientation.
    fn base(&self, offset: usize) -> u8;
    fn quality(&self, offset: usize) -> u8;
    fn is_reverse(&self) -> bool;
    fn mapping_quality(&self) -> u8;
    fn read_group(&self) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlignedRead for bam::Record {
    fn name(&self) -> String {
        String::from_utf8_lossy(self.qname()).into_owned()
    }

    fn len(&self) -> usize {
        self.seq_len()
    }

    fn base(&self, offset: usize) -> u8 {
        self.seq()[offset]
    }

    fn quality(&self, offset: usize) -> u8 {
        self.qual()[offset]
    }

    fn is_reverse(&self) -> bool {
        bam::Record::is_reverse(self)
    }

    fn mapping_quality(&self) -> u8 {
        self.mapq()
    }

    fn read_group(&self) -> Option<&str> {
        match self.aux(b"RG") {
            Ok(Aux::String(rg)) => Some(rg),
            _ => None,
        }
    }
}

/// In-memory read, for callers that drive the counter without a BAM file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRecord {
    pub name: String,
    pub bases: Vec<u8>,
    pub qualities: Vec<u8>,
    pub reverse: bool,
    pub mapping_quality: u8,
    pub read_group: Option<String>,
}

impl ReadRecord {
    /// # Panics
    ///
    /// Panics if `bases` and `qualities` differ in length.
    pub fn new(name: &str, bases: &[u8], qualities: &[u8]) -> Self {
        assert_eq!(bases.len(), qualities.len(), "bases and qualities differ in length");
        Self {
            name: name.to_string(),
            bases: bases.to_vec(),
            qualities: qualities.to_vec(),
            reverse: false,
            mapping_quality: 60,
            read_group: None,
        }
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn with_mapping_quality(mut self, mapq: u8) -> Self {
        self.mapping_quality = mapq;
        self
    }

    pub fn with_read_group(mut self, read_group: &str) -> Self {
        self.read_group = Some(read_group.to_string());
        self
    }
}

impl AlignedRead for ReadRecord {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn len(&self) -> usize {
        self.bases.len()
    }

    fn base(&self, offset: usize) -> u8 {
        self.bases[offset]
    }

    fn quality(&self, offset: usize) -> u8 {
        self.qualities[offset]
    }

    fn is_reverse(&self) -> bool {
        self.reverse
    }

    fn mapping_quality(&self) -> u8 {
        self.mapping_quality
    }

    fn read_group(&self) -> Option<&str> {
        self.read_group.as_deref()
    }
}

impl<R: AlignedRead + ?Sized> AlignedRead for &R {
    fn name(&self) -> String {
        (**self).name()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn base(&self, offset: usize) -> u8 {
        (**self).base(offset)
    }

    fn quality(&self, offset: usize) -> u8 {
        (**self).quality(offset)
    }

    fn is_reverse(&self) -> bool {
        (**self).is_reverse()
    }

    fn mapping_quality(&self) -> u8 {
        (**self).mapping_quality()
    }

    fn read_group(&self) -> Option<&str> {
        (**self).read_group()
    }
}
