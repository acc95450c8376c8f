//! environment driven configuration. Every setting comes from an environment variable,
//! optionally backed by a `.env` file: values in the real environment win over the file.
//! An empty value counts as unset.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use aws_acm_cert::PLACEHOLDER_CERTIFICATE_ARN;
use aws_cfn_stack::{StackEnvironment, TemplateFormat};
use aws_cloudfront_distribution::OAC_NAME_MAX_LEN;
use cfn_lib::naming::validate_stack_name;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_STACK_NAME: &str = "QuantumBrosStack";
pub const DEFAULT_OUTPUT_DIR: &str = "cfn.out";
pub const DEFAULT_DOTENV_PATH: &str = ".env";
pub const OAC_NAME_PREFIX: &str = "QuantumBros Front Bucket OAC ";
/// the stage is appended to the origin access control name, which cloudfront caps.
pub const STAGE_MAX_LEN: usize = OAC_NAME_MAX_LEN - OAC_NAME_PREFIX.len();

/// what to synthesize. Loaded from:
///   - `AWS_ACCOUNT_ID`      (optional, 12 digits)
///   - `AWS_REGION`          (optional, must be a known region)
///   - `STAGE`               (default `dev`, at most `STAGE_MAX_LEN` characters)
///   - `ACM_CERTIFICATE_ARN` (default: a placeholder arn that cannot be deployed)
///   - `STACK_NAME`          (default `QuantumBrosStack`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StackConfig {
    #[serde(rename = "aws_account_id", default)]
    pub account: Option<String>,

    #[serde(rename = "aws_region", default)]
    pub region: Option<String>,

    #[serde(default = "default_stage")]
    pub stage: String,

    #[serde(rename = "acm_certificate_arn", default = "default_certificate_arn")]
    pub certificate_arn: String,

    #[serde(default = "default_stack_name")]
    pub stack_name: String,
}

fn default_stage() -> String {
    DEFAULT_STAGE.to_string()
}

fn default_certificate_arn() -> String {
    PLACEHOLDER_CERTIFICATE_ARN.to_string()
}

fn default_stack_name() -> String {
    DEFAULT_STACK_NAME.to_string()
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            account: None,
            region: None,
            stage: default_stage(),
            certificate_arn: default_certificate_arn(),
            stack_name: default_stack_name(),
        }
    }
}

impl StackConfig {
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: StackConfig = envy::from_iter(non_empty(vars))?;
        config.validate()?;
        Ok(config)
    }

    /// the certificate arn is checked when the certificate is referenced, everything else here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(account) = &self.account {
            validate_account_id(account)?;
        }
        if let Some(region) = &self.region {
            if let Some(reason) = aws_regions::verify_region(region) {
                return Err(ConfigError::InvalidRegion { region: region.clone(), reason });
            }
        }
        validate_stage(&self.stage)?;
        validate_stack_name(&self.stack_name)?;
        Ok(())
    }

    pub fn environment(&self) -> StackEnvironment {
        StackEnvironment {
            account: self.account.clone(),
            region: self.region.clone(),
        }
    }
}

/// where and how the synthesized template is written. Loaded from `SYNTH_OUTPUT_DIR`
/// (default `cfn.out`) and `SYNTH_FORMAT` (`json` or `yaml`, default `json`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SynthSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub format: TemplateFormat,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl SynthSettings {
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed("SYNTH_").from_iter(non_empty(vars))?)
    }
}

fn non_empty<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter().filter(|(_, v)| !v.is_empty())
}

pub fn validate_account_id(account: &str) -> Result<(), ConfigError> {
    if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidAccount(account.to_string()));
    }
    Ok(())
}

/// the stage suffixes logical ids, output keys and resource names.
pub fn validate_stage(stage: &str) -> Result<(), ConfigError> {
    let reason = if stage.is_empty() {
        "Must contain at least 1 character".to_string()
    } else if stage.len() > STAGE_MAX_LEN {
        format!("Must be at most {STAGE_MAX_LEN} characters")
    } else if !stage.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        "Can only contain alphanumeric characters and hyphens".to_string()
    } else {
        return Ok(());
    };
    Err(ConfigError::InvalidStage { stage: stage.to_string(), reason })
}

/// parses `KEY=value` lines. Blank lines and lines starting with `#` are skipped,
/// surrounding quotes are removed from values.
pub fn parse_dotenv(contents: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, val)) = line.split_once('=') {
            map.insert(key.trim().to_string(), unquote(val.trim()).to_string());
        }
    }
    map
}

fn unquote(val: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = val.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    val
}

/// a missing file is not an error: the `.env` file is optional.
pub fn load_dotenv(path: &Path) -> Result<IndexMap<String, String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let map = parse_dotenv(&contents);
            tracing::debug!(path = ?path, variables = map.len(), "loaded dotenv file");
            Ok(map)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = ?path, "no dotenv file");
            Ok(IndexMap::new())
        }
        Err(source) => Err(ConfigError::Dotenv { path: path.to_path_buf(), source }),
    }
}

/// the dotenv values with the process environment laid on top.
/// An empty process variable does not hide a value from the file.
pub fn overlay_env<I>(dotenv: IndexMap<String, String>, process: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut merged = dotenv;
    for (key, val) in process {
        if !val.is_empty() {
            merged.insert(key, val);
        }
    }
    merged.into_iter().collect()
}

/// drops variables whose name or value is not valid unicode. None of them can be a setting.
pub fn utf8_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter().filter_map(|(key, val)| match (key.into_string(), val.into_string()) {
        (Ok(key), Ok(val)) => Some((key, val)),
        (key, _) => {
            tracing::debug!(key = ?key, "skipping non unicode environment variable");
            None
        }
    })
}

/// the process environment overlaid on the dotenv file at `dotenv_path`.
pub fn environment_with_dotenv(dotenv_path: &Path) -> Result<Vec<(String, String)>, ConfigError> {
    Ok(overlay_env(load_dotenv(dotenv_path)?, utf8_vars(std::env::vars_os())))
}
