use std::path::PathBuf;

use anyhow::Context;
use aws_cfn_stack::{render_template, write_artifacts};
use quantum_bros_front::config::{environment_with_dotenv, DEFAULT_DOTENV_PATH};
use quantum_bros_front::{synthesize, StackConfig, SynthSettings};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dotenv_path = std::env::var("DOTENV_PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOTENV_PATH));
    let vars = environment_with_dotenv(&dotenv_path).context("failed to load dotenv file")?;

    let config = StackConfig::from_vars(vars.clone()).context(
        "failed to load stack config from AWS_ACCOUNT_ID, AWS_REGION, STAGE, ACM_CERTIFICATE_ARN and STACK_NAME",
    )?;
    let settings = SynthSettings::from_vars(vars).context("failed to load SYNTH_* settings")?;
    tracing::info!(
        stack_name = %config.stack_name,
        stage = %config.stage,
        environment = %config.environment(),
        "synthesizing"
    );

    let graph = synthesize(&config).with_context(|| format!("failed to synthesize stack {}", config.stack_name))?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let body = render_template(&graph.stack, settings.format)?;
        tracing::debug!(template = %body, "rendered template");
    }

    let artifacts = write_artifacts(&graph.stack, &settings.output_dir, settings.format)
        .with_context(|| format!("failed to write artifacts to {:?}", settings.output_dir))?;
    tracing::info!(
        template = ?artifacts.template_path,
        manifest = ?artifacts.manifest_path,
        "done"
    );
    Ok(())
}
