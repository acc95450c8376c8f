//! assembles the resources declared by the other modules into a single
//! cloudformation stack, and writes the synthesized template to disk.

use std::path::{Path, PathBuf};

use cfn_lib::naming::validate_stack_name;
use cfn_lib::serde_json::Value;
use cfn_lib::{CfnError, Resource, ResourceOutput, SavedTemplate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "manifest.json";
const UNKNOWN_ACCOUNT: &str = "unknown-account";
const UNKNOWN_REGION: &str = "unknown-region";

#[derive(Debug, Error)]
pub enum StackError {
    #[error(transparent)]
    Cfn(#[from] CfnError),

    #[error("Failed to write {path:?}\n{source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize template as yaml\n{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to serialize json\n{0}")]
    Json(#[from] serde_json::Error),
}

/// the account/region a stack targets. Left empty, the deploying tool's
/// defaults are used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEnvironment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl std::fmt::Display for StackEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let account = self.account.as_deref().unwrap_or(UNKNOWN_ACCOUNT);
        let region = self.region.as_deref().unwrap_or(UNKNOWN_REGION);
        write!(f, "aws://{account}/{region}")
    }
}

/// a raw patch applied to a resource after every module has declared its resources.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyOverride {
    pub logical_id: String,
    pub path: String,
    pub value: Value,
}

#[derive(Default)]
pub struct Input {
    pub stack_name: String,
    pub environment: StackEnvironment,
    pub description: Option<String>,
    pub resources: Vec<Resource>,
    /// applied in order, after all resources were rendered.
    pub overrides: Vec<PropertyOverride>,
    pub outputs: Vec<(String, ResourceOutput)>,
}

/// a synthesized stack: the stack name next to its template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedStack {
    pub stack_name: String,
    pub environment: StackEnvironment,
    pub template: SavedTemplate,
}

fn validate_resources_to_template(resources: &[Resource]) -> Result<SavedTemplate, CfnError> {
    let mut out_template = SavedTemplate::default();
    for resource in resources.iter() {
        out_template.add_resource(resource)?;
    }
    Ok(out_template)
}

/// renders every declared resource, applies overrides and outputs,
/// then checks that all references resolve inside the template.
pub fn config(input: Input) -> Result<SavedStack, StackError> {
    validate_stack_name(&input.stack_name)?;
    let mut template = validate_resources_to_template(&input.resources)?;
    template.description = input.description;

    for o in input.overrides.iter() {
        tracing::debug!(logical_id = %o.logical_id, path = %o.path, "applying property override");
        template
            .resource_mut(&o.logical_id)?
            .add_property_override(&o.path, o.value.clone())?;
    }
    for (key, output) in input.outputs {
        template.add_output(&key, output)?;
    }
    template.validate_references()?;

    tracing::info!(
        stack_name = %input.stack_name,
        environment = %input.environment,
        resources = template.resources.len(),
        outputs = template.outputs.len(),
        "synthesized stack"
    );
    Ok(SavedStack {
        stack_name: input.stack_name,
        environment: input.environment,
        template,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    #[default]
    Json,
    Yaml,
}

impl TemplateFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TemplateFormat::Json => "json",
            TemplateFormat::Yaml => "yaml",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub template_file: String,
    pub environment: String,
    pub outputs: Vec<String>,
}

/// describes what a synth run produced so a deploy pipeline can find it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub stacks: IndexMap<String, ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthArtifacts {
    pub template_path: PathBuf,
    pub manifest_path: PathBuf,
}

pub fn render_template(stack: &SavedStack, format: TemplateFormat) -> Result<String, StackError> {
    let body = match format {
        TemplateFormat::Json => stack.template.to_json_pretty()?,
        TemplateFormat::Yaml => serde_yaml::to_string(&stack.template)?,
    };
    Ok(body)
}

fn write_file(path: &Path, contents: &str) -> Result<(), StackError> {
    std::fs::write(path, contents).map_err(|source| StackError::Io { path: path.to_path_buf(), source })
}

/// writes `<out_dir>/<stack_name>.template.<ext>` and `<out_dir>/manifest.json`.
pub fn write_artifacts(stack: &SavedStack, out_dir: &Path, format: TemplateFormat) -> Result<SynthArtifacts, StackError> {
    std::fs::create_dir_all(out_dir).map_err(|source| StackError::Io { path: out_dir.to_path_buf(), source })?;

    let template_file = format!("{}.template.{}", stack.stack_name, format.extension());
    let template_path = out_dir.join(&template_file);
    write_file(&template_path, &render_template(stack, format)?)?;

    let mut manifest = Manifest { stacks: IndexMap::new() };
    manifest.stacks.insert(
        stack.stack_name.clone(),
        ManifestEntry {
            template_file,
            environment: stack.environment.to_string(),
            outputs: stack.template.outputs.keys().cloned().collect(),
        },
    );
    let manifest_path = out_dir.join(MANIFEST_FILE);
    write_file(&manifest_path, &serde_json::to_string_pretty(&manifest)?)?;

    tracing::info!(template = ?template_path, manifest = ?manifest_path, "wrote synth artifacts");
    Ok(SynthArtifacts { template_path, manifest_path })
}
