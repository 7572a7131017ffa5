use covariate_counter::covariates::report::{COVARIATE_COUNTS_HEADER, RECAL_TABLE_HEADER};
use covariate_counter::{covariates, CountInputs, CountOptions, CovariateError};
use rust_htslib::bam::{self, Read};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REFERENCE: &str = "ACGTACGTACGTACGTACGTACGTACGTACGTACGTACGT";

struct Fixture {
    dir: TempDir,
    sam: PathBuf,
    fasta: PathBuf,
    vcf: PathBuf,
}

/// chr1 is 40bp of repeating ACGT. rg1 (ILLUMINA) carries a forward read over
/// 1-4 and a reverse read over 11-15; rg2 (PACBIO) and a MAPQ 0 rg1 read sit
/// over 21-24. chr1:13 is a known SNP.
fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let fasta = dir.path().join("ref.fa");
    fs::write(&fasta, format!(">chr1\n{}\n", REFERENCE)).unwrap();
    fs::write(dir.path().join("ref.fa.fai"), "chr1\t40\t6\t40\t41\n").unwrap();

    let vcf = dir.path().join("known.vcf");
    let mut file = fs::File::create(&vcf).unwrap();
    writeln!(file, "##fileformat=VCFv4.2").unwrap();
    writeln!(file, "##contig=<ID=chr1,length=40>").unwrap();
    writeln!(file, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
    writeln!(file, "chr1\t13\trs1\tA\tT\t.\t.\t.").unwrap();
    drop(file);

    let sam = dir.path().join("sample.sam");
    let mut file = fs::File::create(&sam).unwrap();
    writeln!(file, "@HD\tVN:1.6\tSO:coordinate").unwrap();
    writeln!(file, "@SQ\tSN:chr1\tLN:40").unwrap();
    writeln!(file, "@RG\tID:rg1\tPL:ILLUMINA").unwrap();
    writeln!(file, "@RG\tID:rg2\tPL:PACBIO").unwrap();
    writeln!(file, "r1\t0\tchr1\t1\t60\t4M\t*\t0\t0\tACGA\t????\tRG:Z:rg1").unwrap();
    writeln!(file, "r2\t16\tchr1\t11\t60\t5M\t*\t0\t0\tGTTCG\t5555?\tRG:Z:rg1").unwrap();
    writeln!(file, "r3\t0\tchr1\t21\t60\t4M\t*\t0\t0\tACGT\t????\tRG:Z:rg2").unwrap();
    writeln!(file, "r4\t0\tchr1\t21\t0\t4M\t*\t0\t0\tACGT\t????\tRG:Z:rg1").unwrap();
    drop(file);

    Fixture { dir, sam, fasta, vcf }
}

fn inputs(fixture: &Fixture, alignments: &Path) -> CountInputs {
    CountInputs {
        bam_file: alignments.to_path_buf(),
        reference_file: fixture.fasta.clone(),
        known_sites: vec![fixture.vcf.clone()],
        output_root: fixture.dir.path().join("sample").to_string_lossy().into_owned(),
        covariate_counts: true,
        summary_json: Some(fixture.dir.path().join("summary.json")),
        quiet: true,
    }
}

fn illumina_only() -> CountOptions {
    CountOptions::default().with_platforms(vec!["ILLUMINA".to_string()])
}

fn table_rows(text: &str) -> Vec<&str> {
    text.lines().filter(|l| !l.starts_with('#')).collect()
}

#[test]
fn counts_covariates_from_sam() {
    let fixture = fixture();
    let inputs = inputs(&fixture, &fixture.sam);

    let summary = covariates::run(&inputs, illumina_only()).unwrap();
    assert_eq!(summary.counters.counted_sites, 12);
    assert_eq!(summary.counters.skipped_sites, 1);
    assert_eq!(summary.counters.counted_bases, 4);
    assert_eq!(summary.read_groups, vec!["rg1"]);

    let recal = fs::read_to_string(fixture.dir.path().join("sample.recal_data.csv")).unwrap();
    assert!(recal.contains("# counted_sites 12\n"));
    assert!(recal.contains("# fraction_skipped 1/12\n"));
    assert_eq!(
        table_rows(&recal),
        vec![
            RECAL_TABLE_HEADER,
            "rg1,3,20,AA,1,0,93",
            "rg1,1,30,AC,1,0,93",
            "rg1,1,20,CG,1,0,93",
            "rg1,2,30,CG,1,0,93",
        ]
    );

    let counts =
        fs::read_to_string(fixture.dir.path().join("sample.covariate_counts.csv")).unwrap();
    assert_eq!(
        counts.lines().collect::<Vec<_>>(),
        vec![
            COVARIATE_COUNTS_HEADER,
            "rg1,AA,20,3,0,1",
            "rg1,AC,30,1,0,1",
            "rg1,CG,20,1,0,1",
            "rg1,CG,30,2,0,1",
        ]
    );

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.dir.path().join("summary.json")).unwrap())
            .unwrap();
    assert_eq!(json["counters"]["counted_bases"], 4);
    assert_eq!(json["buckets"], 4);
}

#[test]
fn collapsed_run_reports_wildcards() {
    let fixture = fixture();
    let mut inputs = inputs(&fixture, &fixture.sam);
    inputs.covariate_counts = false;

    covariates::run(&inputs, illumina_only().with_collapse(true, true)).unwrap();

    let recal = fs::read_to_string(fixture.dir.path().join("sample.recal_data.csv")).unwrap();
    assert!(recal.contains("# collapsed_pos true\n"));
    assert_eq!(
        table_rows(&recal),
        vec![RECAL_TABLE_HEADER, "rg1,*,20,*,2,0,93", "rg1,*,30,*,2,0,93"]
    );
    assert!(!fixture.dir.path().join("sample.covariate_counts.csv").exists());
}

#[test]
fn oversized_read_leaves_no_reports() {
    let fixture = fixture();
    let inputs = inputs(&fixture, &fixture.sam);
    let options = CountOptions {
        max_read_length: 4,
        ..illumina_only()
    };

    let err = covariates::run(&inputs, options).unwrap_err();
    match err.downcast_ref::<CovariateError>() {
        Some(CovariateError::ReadTooLong { read_name, length, .. }) => {
            assert_eq!(read_name, "r2");
            assert_eq!(*length, 5);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!fixture.dir.path().join("sample.recal_data.csv").exists());
    assert!(!fixture.dir.path().join("sample.covariate_counts.csv").exists());
}

#[test]
fn parallel_run_matches_sequential() {
    let fixture = fixture();

    let bam_path = fixture.dir.path().join("sample.bam");
    {
        let mut reader = bam::Reader::from_path(&fixture.sam).unwrap();
        let header = bam::Header::from_template(reader.header());
        let mut writer = bam::Writer::from_path(&bam_path, &header, bam::Format::Bam).unwrap();
        for record in reader.records() {
            writer.write(&record.unwrap()).unwrap();
        }
    }
    bam::index::build(&bam_path, None, bam::index::Type::Bai, 1).unwrap();

    let sequential = covariates::run(&inputs(&fixture, &fixture.sam), illumina_only()).unwrap();
    let recal_path = fixture.dir.path().join("sample.recal_data.csv");
    let expected = fs::read_to_string(&recal_path).unwrap();

    let options = CountOptions {
        threads: 2,
        ..illumina_only()
    };
    let parallel = covariates::run(&inputs(&fixture, &bam_path), options).unwrap();
    let actual = fs::read_to_string(&recal_path).unwrap();

    assert_eq!(parallel.counters, sequential.counters);
    assert_eq!(table_rows(&actual), table_rows(&expected));
}
