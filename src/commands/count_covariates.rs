use crate::cli::CountCovariatesArgs;
use crate::config::Config;
use crate::covariates::{self, CountInputs, CountOptions};
use anyhow::Result;
use log::info;

pub fn run(args: CountCovariatesArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let (inputs, options) = resolve(args, &config);
    info!(
        "Counting covariates in {} (min MAPQ {}, max read length {}, {} thread(s))",
        inputs.bam_file.display(),
        options.min_mapping_quality,
        options.max_read_length,
        options.threads
    );

    covariates::run(&inputs, options)?;
    Ok(())
}

/// Command-line values win over the config file.
fn resolve(args: CountCovariatesArgs, config: &Config) -> (CountInputs, CountOptions) {
    let platforms = if args.platforms.is_empty() {
        config.platforms.clone()
    } else {
        args.platforms
    };

    let options = CountOptions {
        min_mapping_quality: args.min_mapping_quality.unwrap_or(config.min_mapping_quality),
        max_read_length: args.max_read_length.unwrap_or(config.max_read_length),
        threads: args.threads.unwrap_or(config.threads).max(1),
        ..CountOptions::default()
    }
    .with_read_group(args.read_group)
    .with_platforms(platforms)
    .with_collapse(args.collapse_pos, args.collapse_dinuc);

    let inputs = CountInputs {
        bam_file: args.bam_file,
        reference_file: args.reference_file,
        known_sites: args.known_sites,
        output_root: args.output_root.unwrap_or_else(|| config.output_root.clone()),
        covariate_counts: args.covariate_counts,
        summary_json: args.summary_json,
        quiet: args.quiet,
    };

    (inputs, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Args, Commands};
    use clap::Parser;

    fn parse(extra: &[&str]) -> CountCovariatesArgs {
        let mut argv = vec!["covariate-counter", "count-covariates", "in.bam", "-R", "ref.fa"];
        argv.extend_from_slice(extra);
        match Args::try_parse_from(argv).unwrap().command {
            Commands::CountCovariates(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_config_supplies_defaults() {
        let config = Config {
            min_mapping_quality: 30,
            platforms: vec!["ILLUMINA".to_string()],
            threads: 0,
            output_root: "runs/sample".to_string(),
            ..Config::default()
        };
        let (inputs, options) = resolve(parse(&[]), &config);
        assert_eq!(options.min_mapping_quality, 30);
        assert!(!options.platforms.allows(Some("PACBIO")));
        assert_eq!(options.threads, 1);
        assert_eq!(options.max_read_length, 100_000);
        assert_eq!(inputs.output_root, "runs/sample");
        assert!(options.read_group.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            min_mapping_quality: 30,
            ..Config::default()
        };
        let (inputs, options) = resolve(
            parse(&[
                "--minmap",
                "5",
                "--rg",
                "rg1",
                "--collapseDinuc",
                "--buggyMaxReadLen",
                "250",
                "--outroot",
                "x",
            ]),
            &config,
        );
        assert_eq!(options.min_mapping_quality, 5);
        assert_eq!(options.read_group.as_deref(), Some("rg1"));
        assert!(options.collapse.collapse_dinuc);
        assert!(!options.collapse.collapse_pos);
        assert_eq!(options.max_read_length, 250);
        assert_eq!(inputs.output_root, "x");
    }
}
