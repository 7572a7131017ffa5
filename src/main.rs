use clap::Parser;
use covariate_counter::{cli, commands};
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = cli::Args::parse();

    let result = match args.command {
        cli::Commands::CountCovariates(count_args) => commands::count_covariates::run(count_args),
        cli::Commands::InitConfig => commands::init_config::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
