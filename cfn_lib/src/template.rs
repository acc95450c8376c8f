use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CfnError, Result};
use crate::intrinsics::referenced_ids;
use crate::naming::verify_resource_name;
use crate::overrides::apply_override;

pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// anything that can be declared as a resource in a template.
pub trait CfnResource {
    /// eg: `AWS::S3::Bucket`
    fn type_string(&self) -> &'static str;
    fn properties(&self) -> Result<Value>;
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// renders a typed properties struct.
pub fn serialize_properties<T: Serialize>(properties: &T) -> Result<Value> {
    Ok(serde_json::to_value(properties)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// a resource as declared by a module, before it gets validated into a template.
pub struct Resource {
    pub name: String,
    pub properties: Box<dyn CfnResource>,
    pub depends_on: Vec<String>,
    pub deletion_policy: Option<DeletionPolicy>,
    pub update_replace_policy: Option<DeletionPolicy>,
}

impl Resource {
    pub fn new<R: CfnResource + 'static>(name: impl Into<String>, properties: R) -> Self {
        Self {
            name: name.into(),
            properties: Box::new(properties),
            depends_on: vec![],
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    /// sets both the deletion and the update-replace policy.
    pub fn removal_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty", default)]
    pub depends_on: Vec<String>,
    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none", default)]
    pub update_replace_policy: Option<DeletionPolicy>,
    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none", default)]
    pub deletion_policy: Option<DeletionPolicy>,
}

impl SavedResource {
    /// patches the already rendered properties of this resource.
    /// see [`crate::overrides`] for the path syntax.
    pub fn add_property_override(&mut self, path: &str, value: Value) -> Result<()> {
        apply_override(&mut self.properties, path, value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(rename = "Value")]
    pub value: Value,
}

impl ResourceOutput {
    pub fn new(value: Value) -> Self {
        Self { description: None, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(rename = "Resources")]
    pub resources: IndexMap<String, SavedResource>,
    #[serde(rename = "Outputs", skip_serializing_if = "IndexMap::is_empty", default)]
    pub outputs: IndexMap<String, ResourceOutput>,
}

impl Default for SavedTemplate {
    fn default() -> Self {
        Self {
            version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: None,
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl SavedTemplate {
    fn ensure_unique(&self, logical_id: &str) -> Result<()> {
        if self.resources.contains_key(logical_id) || self.outputs.contains_key(logical_id) {
            return Err(CfnError::DuplicateLogicalId(logical_id.to_string()));
        }
        Ok(())
    }

    /// validates the resource and renders its properties into the template.
    pub fn add_resource(&mut self, resource: &Resource) -> Result<()> {
        verify_resource_name(&resource.name)?;
        self.ensure_unique(&resource.name)?;
        resource.properties.validate().map_err(|reason| CfnError::Validation {
            name: resource.name.clone(),
            reason,
        })?;
        let saved = SavedResource {
            ty: resource.properties.type_string().to_string(),
            properties: resource.properties.properties()?,
            depends_on: resource.depends_on.clone(),
            update_replace_policy: resource.update_replace_policy,
            deletion_policy: resource.deletion_policy,
        };
        tracing::debug!(logical_id = %resource.name, ty = %saved.ty, "added resource");
        self.resources.insert(resource.name.clone(), saved);
        Ok(())
    }

    pub fn add_output(&mut self, key: &str, output: ResourceOutput) -> Result<()> {
        verify_resource_name(key)?;
        self.ensure_unique(key)?;
        self.outputs.insert(key.to_string(), output);
        Ok(())
    }

    pub fn resource(&self, logical_id: &str) -> Option<&SavedResource> {
        self.resources.get(logical_id)
    }

    pub fn resource_mut(&mut self, logical_id: &str) -> Result<&mut SavedResource> {
        self.resources
            .get_mut(logical_id)
            .ok_or_else(|| CfnError::MissingResource(logical_id.to_string()))
    }

    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a SavedResource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }

    /// every Ref / GetAtt / Sub / DependsOn must point at a resource declared in this template.
    pub fn validate_references(&self) -> Result<()> {
        for (name, resource) in self.resources.iter() {
            let targets = referenced_ids(&resource.properties)
                .into_iter()
                .chain(resource.depends_on.iter().cloned());
            for target in targets {
                if !self.resources.contains_key(&target) {
                    return Err(CfnError::Validation {
                        name: name.clone(),
                        reason: format!("references '{target}' which is not declared in this template"),
                    });
                }
            }
        }
        for (key, output) in self.outputs.iter() {
            for target in referenced_ids(&output.value) {
                if !self.resources.contains_key(&target) {
                    return Err(CfnError::Validation {
                        name: key.clone(),
                        reason: format!("output references '{target}' which is not declared in this template"),
                    });
                }
            }
        }
        Ok(())
    }

    /// we make it pretty so if a user needs to look at the stack in the Cfn console, it looks nice
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
