//! this is a higher level module for creating S3 buckets easily.
//! By default the bucket is private: every public access block flag is set and
//! objects can only be read by principals granted in the bucket's resource policy.
//!
//! In addition to the S3 bucket, by default we create custom cloudformation resources
//! for cleanup. That is: a lambda function will be created that will delete the contents
//! of this S3 bucket (every version) when the cloudformation stack gets deleted.
//! This enables easy teardown. See the input section to customize this behavior.

use aws_cfn_stack::Input as StackInput;
use cfn_lib::naming::logical_id;
use cfn_lib::serde_json::Value;
use cfn_lib::{get_att, get_ref, intrinsics, CfnError, DeletionPolicy, PolicyDocument, PolicyStatement, Resource};

pub mod bucket;
pub mod cleanup;

pub use bucket::{
    validate_bucket_name, AccessControl, CfnBucket, CfnBucketPolicy, PublicAccessBlockConfiguration,
    VersioningConfiguration, VersioningStatus,
};
pub use cleanup::CleanupOutput;

pub struct Input {
    /// the construct id of the bucket. The logical id is derived from it.
    pub id: String,
    pub versioned: bool,
    pub block_public_access: bool,
    pub access_control: AccessControl,
    /// applied as both the deletion and the update-replace policy.
    pub removal_policy: DeletionPolicy,
    /// By default, every s3 bucket gets a cleanup resource created for it.
    /// this includes:
    /// - a cloudformation custom resource
    /// - a lambda function that will perform the cleanup
    /// - a role for the lambda function that allows it to cleanup the S3 bucket.
    ///
    /// Without a cleanup resource, deleting a stack with an S3 bucket that is not empty will fail.
    /// Auto delete only makes sense when the removal policy is Delete.
    pub auto_delete_objects: bool,
    /// this module makes no customization, instead opting for cloudformation
    /// to create the s3 bucket name for you based on the logical resource name.
    pub bucket_name: Option<String>,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            id: String::new(),
            versioned: false,
            block_public_access: true,
            access_control: AccessControl::Private,
            removal_policy: DeletionPolicy::Retain,
            auto_delete_objects: false,
            bucket_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub id: String,
    /// the logical name of the resource in cloudformation.
    /// Reference this value in other modules, for example
    /// allowing permissions to read/write from this bucket,
    /// pointing a cloudfront distribution to this bucket, etc.
    pub logical_bucket_name: String,
    pub cleanup: Option<CleanupOutput>,
}

impl Output {
    /// resolves to the physical bucket name.
    pub fn bucket_name(&self) -> Value {
        get_ref(&self.logical_bucket_name)
    }

    pub fn bucket_arn(&self) -> Value {
        get_att(&self.logical_bucket_name, "Arn")
    }

    /// eg: `bucket.s3.us-east-1.amazonaws.com`, the domain cloudfront should use for an s3 origin.
    pub fn regional_domain_name(&self) -> Value {
        get_att(&self.logical_bucket_name, "RegionalDomainName")
    }

    pub fn arn_for_objects(&self, key_pattern: &str) -> Value {
        intrinsics::objects_arn(&self.logical_bucket_name, key_pattern)
    }
}

pub fn config(myinput: &Input, stackinp: &mut StackInput) -> Result<Output, CfnError> {
    if myinput.auto_delete_objects && myinput.removal_policy != DeletionPolicy::Delete {
        return Err(CfnError::Validation {
            name: myinput.id.clone(),
            reason: "Cannot use auto_delete_objects if removal_policy is not Delete".into(),
        });
    }
    let logical_bucket_name = logical_id(&[&myinput.id, "Resource"])?;

    let bucket = CfnBucket {
        access_control: Some(myinput.access_control),
        bucket_name: myinput.bucket_name.clone(),
        public_access_block_configuration: myinput
            .block_public_access
            .then(PublicAccessBlockConfiguration::block_all),
        versioning_configuration: myinput
            .versioned
            .then_some(VersioningConfiguration { status: VersioningStatus::Enabled }),
    };
    stackinp
        .resources
        .push(Resource::new(logical_bucket_name.clone(), bucket).removal_policy(myinput.removal_policy));
    tracing::debug!(id = %myinput.id, logical_id = %logical_bucket_name, "added bucket");

    // optionally setup cleanup resources:
    let cleanup = if myinput.auto_delete_objects {
        Some(cleanup::config(&myinput.id, &logical_bucket_name, stackinp)?)
    } else {
        None
    };

    Ok(Output {
        id: myinput.id.clone(),
        logical_bucket_name,
        cleanup,
    })
}

/// attaches a resource policy with the given statements to the bucket.
/// Returns the logical id of the created bucket policy.
pub fn add_to_resource_policy(
    bucket: &Output,
    statements: Vec<PolicyStatement>,
    stackinp: &mut StackInput,
) -> Result<String, CfnError> {
    let logical_policy_name = logical_id(&[&bucket.id, "Policy", "Resource"])?;
    let policy = CfnBucketPolicy {
        bucket: bucket.bucket_name(),
        policy_document: PolicyDocument::new(statements),
    };
    stackinp.resources.push(Resource::new(logical_policy_name.clone(), policy));
    Ok(logical_policy_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_lib::serde_json::json;

    fn private_input() -> Input {
        Input {
            id: "SiteBucketdev".into(),
            versioned: true,
            removal_policy: DeletionPolicy::Delete,
            auto_delete_objects: true,
            ..Default::default()
        }
    }

    #[test]
    fn bucket_is_private_versioned_and_destroyed() {
        let mut stackinp = StackInput::default();
        let out = config(&private_input(), &mut stackinp).unwrap();
        let bucket = &stackinp.resources[0];
        assert_eq!(bucket.name, out.logical_bucket_name);
        assert_eq!(bucket.deletion_policy, Some(DeletionPolicy::Delete));
        assert_eq!(bucket.update_replace_policy, Some(DeletionPolicy::Delete));
        let props = bucket.properties.properties().unwrap();
        assert_eq!(props["AccessControl"], json!("Private"));
        assert_eq!(props["VersioningConfiguration"]["Status"], json!("Enabled"));
        assert_eq!(props["PublicAccessBlockConfiguration"]["RestrictPublicBuckets"], json!(true));
        assert!(props.get("BucketName").is_none());
        assert!(out.cleanup.is_some());
        assert_eq!(stackinp.resources.len(), 4);
    }

    #[test]
    fn no_cleanup_resources_without_auto_delete() {
        let mut stackinp = StackInput::default();
        let inp = Input { auto_delete_objects: false, ..private_input() };
        let out = config(&inp, &mut stackinp).unwrap();
        assert!(out.cleanup.is_none());
        assert_eq!(stackinp.resources.len(), 1);
    }

    #[test]
    fn auto_delete_requires_delete_removal_policy() {
        let mut stackinp = StackInput::default();
        let inp = Input { removal_policy: DeletionPolicy::Retain, ..private_input() };
        assert!(matches!(config(&inp, &mut stackinp), Err(CfnError::Validation { .. })));
        assert!(stackinp.resources.is_empty());
    }

    #[test]
    fn resource_policy_targets_the_bucket() {
        let mut stackinp = StackInput::default();
        let out = config(&private_input(), &mut stackinp).unwrap();
        let statement = PolicyStatement::allow()
            .action("s3:GetObject")
            .service_principal("cloudfront.amazonaws.com")
            .resource(out.arn_for_objects("*"));
        let policy_id = add_to_resource_policy(&out, vec![statement], &mut stackinp).unwrap();
        assert!(policy_id.starts_with("SiteBucketdevPolicy"));
        let policy = stackinp.resources.last().unwrap().properties.properties().unwrap();
        assert_eq!(policy["Bucket"], get_ref(&out.logical_bucket_name));
        assert_eq!(policy["PolicyDocument"]["Statement"][0]["Principal"]["Service"], json!("cloudfront.amazonaws.com"));
    }
}
