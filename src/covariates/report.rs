use crate::covariates::aggregator::SiteCounters;
use crate::covariates::registry::ReadGroupRegistry;
use crate::covariates::types::CollapseOptions;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::io::{self, Write};

pub const RECAL_TABLE_HEADER: &str = "rg,pos,Qrep,dn,nBases,nMismatches,Qemp";
pub const COVARIATE_COUNTS_HEADER: &str = "rg,dn,logitQ,pos,indicator,count";

/// What a finished run reports about itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(serialize_with = "serialize_datetime")]
    pub date: DateTime<Utc>,
    pub collapsed_pos: bool,
    pub collapsed_dinuc: bool,
    pub counters: SiteCounters,
    pub skip_fraction: Option<f64>,
    pub fraction_skipped: String,
    pub read_groups: Vec<String>,
    pub buckets: usize,
}

fn serialize_datetime<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.to_rfc3339())
}

/// `1/<counted per skipped>`, `none` when no site was skipped, and `1/0`
/// when every site was.
fn fraction_skipped_label(counters: &SiteCounters) -> String {
    match (counters.skipped_sites, counters.counted_sites) {
        (0, _) => "none".to_string(),
        (_, 0) => "1/0".to_string(),
        (skipped, counted) => format!("1/{:.0}", counted as f64 / skipped as f64),
    }
}

impl RunSummary {
    pub fn new(
        date: DateTime<Utc>,
        collapse: CollapseOptions,
        counters: SiteCounters,
        registry: &ReadGroupRegistry,
    ) -> Self {
        Self {
            date,
            collapsed_pos: collapse.collapse_pos,
            collapsed_dinuc: collapse.collapse_dinuc,
            counters,
            skip_fraction: counters.skip_fraction().filter(|f| f.is_finite()),
            fraction_skipped: fraction_skipped_label(&counters),
            read_groups: registry.iter().map(|e| e.info.id.clone()).collect(),
            buckets: registry.bucket_count(),
        }
    }

    pub fn fraction_skipped_label(&self) -> &str {
        &self.fraction_skipped
    }

    /// `#`-prefixed metadata block that opens every report.
    pub fn write_info<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "# date          {}", self.date.to_rfc3339())?;
        writeln!(out, "# collapsed_pos {}", self.collapsed_pos)?;
        writeln!(out, "# collapsed_dinuc {}", self.collapsed_dinuc)?;
        writeln!(out, "# counted_sites {}", self.counters.counted_sites)?;
        writeln!(out, "# counted_bases {}", self.counters.counted_bases)?;
        writeln!(out, "# skipped_sites {}", self.counters.skipped_sites)?;
        writeln!(out, "# fraction_skipped {}", self.fraction_skipped_label())?;
        Ok(())
    }
}

/// Writes the recalibration table: metadata, header, then one row per
/// non-empty bucket grouped by read group in registration order.
pub fn write_recal_table<W: Write>(
    out: &mut W,
    registry: &ReadGroupRegistry,
    summary: &RunSummary,
) -> io::Result<()> {
    summary.write_info(out)?;
    writeln!(out, "{}", RECAL_TABLE_HEADER)?;
    for entry in registry.iter() {
        for (key, bucket) in entry.table.sorted() {
            if bucket.observations() == 0 {
                continue;
            }
            writeln!(
                out,
                "{},{},{},{},{},{},{}",
                entry.info.id,
                key.cycle_label(),
                key.quality(),
                key.dinuc_label(),
                bucket.observations(),
                bucket.mismatches(),
                bucket.empirical_quality().round() as i64
            )?;
        }
    }
    Ok(())
}

/// Long-form counts: a `0` row for matches and a `1` row for mismatches,
/// each only when its count is positive.
pub fn write_covariate_counts<W: Write>(out: &mut W, registry: &ReadGroupRegistry) -> io::Result<()> {
    writeln!(out, "{}", COVARIATE_COUNTS_HEADER)?;
    for entry in registry.iter() {
        for (key, bucket) in entry.table.sorted() {
            let dinuc = key.dinuc_label();
            let pos = key.cycle_label();
            if bucket.matches() > 0 {
                writeln!(
                    out,
                    "{},{},{},{},0,{}",
                    entry.info.id,
                    dinuc,
                    key.quality(),
                    pos,
                    bucket.matches()
                )?;
            }
            if bucket.mismatches() > 0 {
                writeln!(
                    out,
                    "{},{},{},{},1,{}",
                    entry.info.id,
                    dinuc,
                    key.quality(),
                    pos,
                    bucket.mismatches()
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariates::options::PlatformFilter;
    use crate::covariates::registry::ReadGroupInfo;
    use crate::covariates::types::{CovariateKey, Dinucleotide};
    use chrono::TimeZone;

    fn registry() -> ReadGroupRegistry {
        let mut registry = ReadGroupRegistry::from_read_groups(
            vec![ReadGroupInfo::new("rgB", None), ReadGroupInfo::new("rgA", None)],
            &PlatformFilter::default(),
        );
        let key = |cycle, q, d: &[u8]| {
            CovariateKey::new(
                cycle,
                q,
                Dinucleotide::from_bases(d[0], d[1]).unwrap(),
                CollapseOptions::default(),
            )
        };
        let b = registry.table_mut("rgB").unwrap();
        b.get_or_create(key(2, 30, b"CG")).increment(false);
        b.get_or_create(key(1, 30, b"AC")).increment(false);
        b.get_or_create(key(1, 30, b"AC")).increment(true);
        let a = registry.table_mut("rgA").unwrap();
        for i in 0..10 {
            a.get_or_create(key(5, 20, b"TT")).increment(i == 0);
        }
        registry
    }

    fn summary(counters: SiteCounters, registry: &ReadGroupRegistry) -> RunSummary {
        RunSummary::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            CollapseOptions::default(),
            counters,
            registry,
        )
    }

    #[test]
    fn test_recal_table_rows() {
        let registry = registry();
        let counters = SiteCounters {
            counted_sites: 300,
            counted_bases: 13,
            skipped_sites: 3,
        };
        let mut out = Vec::new();
        write_recal_table(&mut out, &registry, &summary(counters, &registry)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "# date          2024-01-02T03:04:05+00:00");
        assert_eq!(lines[3], "# counted_sites 300");
        assert_eq!(lines[6], "# fraction_skipped 1/100");
        assert_eq!(lines[7], RECAL_TABLE_HEADER);
        assert_eq!(
            &lines[8..],
            &["rgB,1,30,AC,2,1,3", "rgB,2,30,CG,1,0,93", "rgA,5,20,TT,10,1,10"]
        );
    }

    #[test]
    fn test_fraction_skipped_without_skips() {
        let registry = registry();
        let s = summary(SiteCounters { counted_sites: 5, ..Default::default() }, &registry);
        assert_eq!(s.fraction_skipped_label(), "none");
        assert_eq!(s.read_groups, vec!["rgB", "rgA"]);
        assert_eq!(s.buckets, 3);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["counters"]["counted_sites"], 5);
        assert_eq!(json["date"], "2024-01-02T03:04:05+00:00");
        assert!(json["skip_fraction"].is_null());
    }

    #[test]
    fn test_fraction_skipped_when_everything_skipped() {
        let registry = registry();
        let counters = SiteCounters {
            skipped_sites: 7,
            ..Default::default()
        };
        let s = summary(counters, &registry);
        assert_eq!(s.fraction_skipped_label(), "1/0");
        assert!(s.skip_fraction.is_none());
        assert_eq!(serde_json::to_value(&s).unwrap()["fraction_skipped"], "1/0");

        let mut out = Vec::new();
        s.write_info(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("# skipped_sites 7\n"));
        assert!(text.ends_with("# fraction_skipped 1/0\n"));
    }

    #[test]
    fn test_covariate_counts_rows() {
        let mut out = Vec::new();
        write_covariate_counts(&mut out, &registry()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                COVARIATE_COUNTS_HEADER,
                "rgB,AC,30,1,0,1",
                "rgB,AC,30,1,1,1",
                "rgB,CG,30,2,0,1",
                "rgA,TT,20,5,0,9",
                "rgA,TT,20,5,1,1",
            ]
        );
    }
}
