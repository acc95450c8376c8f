use std::path::PathBuf;

use aws_acm_cert::CertificateError;
use aws_cfn_stack::StackError;
use cfn_lib::CfnError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read environment variables\n{0}")]
    Env(#[from] envy::Error),

    #[error("Failed to read dotenv file {path:?}\n{source}")]
    Dotenv {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid account id {0:?}. Must be exactly 12 digits")]
    InvalidAccount(String),

    #[error("{reason}")]
    InvalidRegion { region: String, reason: String },

    #[error("Invalid stage {stage:?}\n{reason}")]
    InvalidStage { stage: String, reason: String },

    #[error(transparent)]
    Cfn(#[from] CfnError),
}

#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Certificate(#[from] CertificateError),

    #[error(transparent)]
    Cfn(#[from] CfnError),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("The distribution must have exactly one origin, found {0}")]
    OriginCount(usize),
}
