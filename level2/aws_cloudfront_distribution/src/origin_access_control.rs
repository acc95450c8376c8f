//! an origin access control lets cloudfront sign its requests to an origin,
//! so the origin (eg: a private s3 bucket) can stay closed to everyone else.

use aws_cfn_stack::Input as StackInput;
use cfn_lib::naming::logical_id;
use cfn_lib::serde_json::Value;
use cfn_lib::{get_att, CfnError, Resource};

use crate::{CfnOriginAccessControl, OriginAccessControlConfig};

pub struct Input {
    pub id: String,
    /// must be unique within the account.
    pub name: String,
    pub origin_type: String,
    pub signing_behavior: String,
    pub signing_protocol: String,
}

impl Default for Input {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            origin_type: "s3".to_string(),
            signing_behavior: "always".to_string(),
            signing_protocol: "sigv4".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub logical_oac_name: String,
}

impl Output {
    pub fn oac_id(&self) -> Value {
        get_att(&self.logical_oac_name, "Id")
    }
}

pub fn config(myinput: &Input, stackinp: &mut StackInput) -> Result<Output, CfnError> {
    let logical_oac_name = logical_id(&[&myinput.id])?;
    let oac = CfnOriginAccessControl {
        origin_access_control_config: OriginAccessControlConfig {
            name: myinput.name.clone(),
            origin_type: myinput.origin_type.clone(),
            signing_behavior: myinput.signing_behavior.clone(),
            signing_protocol: myinput.signing_protocol.clone(),
        },
    };
    stackinp.resources.push(Resource::new(logical_oac_name.clone(), oac));
    tracing::debug!(logical_id = %logical_oac_name, name = %myinput.name, "added origin access control");
    Ok(Output { logical_oac_name })
}
