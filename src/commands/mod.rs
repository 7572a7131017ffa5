pub mod count_covariates;
pub mod init_config;
