//! shared building blocks for declaring cloudformation templates:
//! the template model, intrinsic functions, iam policy documents,
//! naming rules and raw property overrides.

pub mod error;
pub mod intrinsics;
pub mod naming;
pub mod overrides;
pub mod policy;
pub mod template;

pub use error::{CfnError, Result};
pub use intrinsics::{get_att, get_ref, join, sub};
pub use policy::{PolicyDocument, PolicyStatement, Principal, CLOUDFRONT_SERVICE_PRINCIPAL, LAMBDA_SERVICE_PRINCIPAL};
pub use template::{
    serialize_properties, CfnResource, DeletionPolicy, Resource, ResourceOutput, SavedResource, SavedTemplate,
};

// re-exported so resource modules don't each need their own serde_json dependency
pub use serde_json;
