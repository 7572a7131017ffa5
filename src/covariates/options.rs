use crate::covariates::types::CollapseOptions;

pub const DEFAULT_MAX_READ_LENGTH: usize = 100_000;
pub const DEFAULT_MIN_MAPPING_QUALITY: u8 = 1;
pub const ALL_PLATFORMS: &str = "*";

/// Platform (`@RG PL`) allow-list. `*` admits everything.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformFilter {
    platforms: Vec<String>,
}

impl Default for PlatformFilter {
    fn default() -> Self {
        Self {
            platforms: vec![ALL_PLATFORMS.to_string()],
        }
    }
}

impl PlatformFilter {
    pub fn new(platforms: Vec<String>) -> Self {
        if platforms.is_empty() {
            return Self::default();
        }
        Self {
            platforms: platforms.into_iter().map(|p| p.trim().to_string()).collect(),
        }
    }

    /// Read groups without a platform are always allowed.
    pub fn allows(&self, platform: Option<&str>) -> bool {
        let Some(platform) = platform else {
            return true;
        };
        self.platforms
            .iter()
            .any(|p| p == ALL_PLATFORMS || p.eq_ignore_ascii_case(platform.trim()))
    }
}

#[derive(Clone, Debug)]
pub struct CountOptions {
    pub min_mapping_quality: u8,
    pub read_group: Option<String>,
    pub platforms: PlatformFilter,
    pub collapse: CollapseOptions,
    pub max_read_length: usize,
    pub threads: usize,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            min_mapping_quality: DEFAULT_MIN_MAPPING_QUALITY,
            read_group: None,
            platforms: PlatformFilter::default(),
            collapse: CollapseOptions::default(),
            max_read_length: DEFAULT_MAX_READ_LENGTH,
            threads: 1,
        }
    }
}

impl CountOptions {
    pub fn with_read_group(mut self, read_group: Option<String>) -> Self {
        self.read_group = read_group.filter(|rg| !rg.is_empty());
        self
    }

    pub fn with_collapse(mut self, collapse_pos: bool, collapse_dinuc: bool) -> Self {
        self.collapse = CollapseOptions { collapse_pos, collapse_dinuc };
        self
    }

    pub fn with_platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = PlatformFilter::new(platforms);
        self
    }

    /// True when the single read-group filter is unset or matches `read_group`.
    pub fn selects_read_group(&self, read_group: &str) -> bool {
        self.read_group.as_deref().map_or(true, |rg| rg == read_group)
    }
}
