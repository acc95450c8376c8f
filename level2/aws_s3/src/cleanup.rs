//! a bucket that still holds objects (or object versions) cannot be deleted by
//! cloudformation. Auto-delete adds a custom resource backed by a small lambda
//! function that empties the bucket when the stack gets deleted.

use aws_cfn_stack::Input as StackInput;
use cfn_lib::naming::logical_id;
use cfn_lib::policy::assume_role_policy_doc;
use cfn_lib::serde_json::{self, Value};
use cfn_lib::{
    get_att, get_ref, intrinsics, serialize_properties, sub, CfnError, CfnResource, PolicyDocument, PolicyStatement, Resource,
    LAMBDA_SERVICE_PRINCIPAL,
};
use serde::Serialize;

pub const CLEANUP_RESOURCE_TYPE: &str = "Custom::S3AutoDeleteObjects";
pub const HANDLER_SOURCE: &str = include_str!("auto_delete_handler.js");
const BASIC_EXECUTION_POLICY: &str = "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlinePolicy {
    #[serde(rename = "PolicyName")]
    pub policy_name: String,
    #[serde(rename = "PolicyDocument")]
    pub policy_document: PolicyDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnRole {
    #[serde(rename = "AssumeRolePolicyDocument")]
    pub assume_role_policy_document: PolicyDocument,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ManagedPolicyArns", skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<Value>,
    #[serde(rename = "Policies", skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<InlinePolicy>,
}

impl CfnResource for CfnRole {
    fn type_string(&self) -> &'static str {
        "AWS::IAM::Role"
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        serialize_properties(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCode {
    #[serde(rename = "ZipFile")]
    pub zip_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfnFunction {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Runtime")]
    pub runtime: String,
    #[serde(rename = "Handler")]
    pub handler: String,
    #[serde(rename = "Role")]
    pub role: Value,
    #[serde(rename = "Timeout")]
    pub timeout: u32,
    #[serde(rename = "MemorySize")]
    pub memory_size: u32,
    #[serde(rename = "Code")]
    pub code: FunctionCode,
}

impl CfnResource for CfnFunction {
    fn type_string(&self) -> &'static str {
        "AWS::Lambda::Function"
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        serialize_properties(self)
    }
    fn validate(&self) -> Result<(), String> {
        // lambda caps inline ZipFile code at 4MB
        if self.code.zip_file.len() > 4 * 1024 * 1024 {
            return Err("Inline function code must be smaller than 4MB".into());
        }
        if !(1..=900).contains(&self.timeout) {
            return Err(format!("Timeout {} must be between 1 and 900 seconds", self.timeout));
        }
        Ok(())
    }
}

pub struct CleanupResource {
    pub lambda_logical_id: String,
    pub bucket_logical_id: String,
}

impl CfnResource for CleanupResource {
    fn type_string(&self) -> &'static str {
        CLEANUP_RESOURCE_TYPE
    }
    fn properties(&self) -> cfn_lib::Result<Value> {
        let mut map = serde_json::Map::new();
        map.insert("ServiceToken".to_string(), get_att(&self.lambda_logical_id, "Arn"));
        map.insert("BucketName".to_string(), get_ref(&self.bucket_logical_id));
        Ok(Value::Object(map))
    }
}

/// logical ids of everything the auto-delete setup creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOutput {
    pub logical_role_name: String,
    pub logical_fn_name: String,
    pub logical_cleanup_resource_name: String,
}

/// the cleanup role can list and delete, but never read object contents.
fn cleanup_policy(bucket_logical_id: &str) -> PolicyDocument {
    PolicyDocument::new(vec![
        PolicyStatement::allow()
            .action("s3:ListBucket")
            .action("s3:ListBucketVersions")
            .resource(get_att(bucket_logical_id, "Arn")),
        PolicyStatement::allow()
            .action("s3:DeleteObject")
            .action("s3:DeleteObjectVersion")
            .resource(intrinsics::objects_arn(bucket_logical_id, "*")),
    ])
}

pub fn config(bucket_id: &str, bucket_logical_id: &str, stackinp: &mut StackInput) -> Result<CleanupOutput, CfnError> {
    let logical_role_name = logical_id(&[bucket_id, "AutoDeleteObjectsRole"])?;
    let logical_fn_name = logical_id(&[bucket_id, "AutoDeleteObjectsFunction"])?;
    let logical_cleanup_resource_name = logical_id(&[bucket_id, "AutoDeleteObjectsCustomResource", "Default"])?;

    let role = CfnRole {
        assume_role_policy_document: assume_role_policy_doc(LAMBDA_SERVICE_PRINCIPAL),
        description: Some(format!("auto generated cleanup role for {bucket_id}")),
        managed_policy_arns: vec![sub(BASIC_EXECUTION_POLICY)],
        policies: vec![InlinePolicy {
            policy_name: format!("{logical_role_name}Policy"),
            policy_document: cleanup_policy(bucket_logical_id),
        }],
    };
    let function = CfnFunction {
        description: Some(format!("Empties {bucket_id} when the stack is deleted")),
        runtime: "nodejs20.x".to_string(),
        handler: "index.handler".to_string(),
        role: get_att(&logical_role_name, "Arn"),
        timeout: 900,
        memory_size: 128,
        code: FunctionCode { zip_file: HANDLER_SOURCE.to_string() },
    };
    let cleanup = CleanupResource {
        lambda_logical_id: logical_fn_name.clone(),
        bucket_logical_id: bucket_logical_id.to_string(),
    };

    stackinp.resources.push(Resource::new(logical_role_name.clone(), role));
    stackinp.resources.push(Resource::new(logical_fn_name.clone(), function).depends_on(logical_role_name.clone()));
    stackinp.resources.push(Resource::new(logical_cleanup_resource_name.clone(), cleanup));

    tracing::debug!(bucket = %bucket_logical_id, function = %logical_fn_name, "added auto-delete cleanup resources");
    Ok(CleanupOutput {
        logical_role_name,
        logical_fn_name,
        logical_cleanup_resource_name,
    })
}
