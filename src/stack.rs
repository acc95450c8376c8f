//! declares the front end stack: a private bucket served through cloudfront.
//! Resources are declared in dependency order: bucket, origin access control,
//! certificate, distribution, bucket policy, then the outputs.

use aws_cfn_stack::Input as StackInput;
use aws_cloudfront_distribution::{origin_access_control, s3_origin_distribution, CustomErrorResponse};
use cfn_lib::{DeletionPolicy, ResourceOutput};

use crate::config::{StackConfig, OAC_NAME_PREFIX};
use crate::error::SynthError;
use crate::graph::{OutputKeys, ResourceGraph};

pub const OAC_ID: &str = "AOC";
pub const DISTRIBUTION_ID: &str = "CDN";

/// cloudfront answers a missing object in a private bucket with 403. Rewriting it
/// to the app shell lets the client side router handle the path.
pub fn spa_error_responses() -> Vec<CustomErrorResponse> {
    vec![CustomErrorResponse {
        error_code: 403,
        response_code: Some(200),
        response_page_path: Some("/index.html".to_string()),
        error_caching_min_ttl: Some(0),
    }]
}

/// the access control override is hardwired to origin 0, so any other origin
/// would be served unsigned.
pub fn ensure_single_origin(distrinput: &aws_cloudfront_distribution::Input) -> Result<(), SynthError> {
    match distrinput.origins.len() {
        1 => Ok(()),
        count => Err(SynthError::OriginCount(count)),
    }
}

pub fn synthesize(config: &StackConfig) -> Result<ResourceGraph, SynthError> {
    config.validate()?;
    let stage = &config.stage;
    let mut stackinp = StackInput {
        stack_name: config.stack_name.clone(),
        environment: config.environment(),
        description: Some(format!("QuantumBros front end ({stage})")),
        ..Default::default()
    };

    let bucket = aws_s3::config(
        &aws_s3::Input {
            id: format!("QuantumBrosFrontBucket{stage}"),
            versioned: true,
            removal_policy: DeletionPolicy::Delete,
            auto_delete_objects: true,
            ..Default::default()
        },
        &mut stackinp,
    )?;

    let oac = origin_access_control::config(
        &origin_access_control::Input {
            id: OAC_ID.to_string(),
            name: format!("{OAC_NAME_PREFIX}{stage}"),
            ..Default::default()
        },
        &mut stackinp,
    )?;

    let certificate = aws_acm_cert::config(&aws_acm_cert::Input {
        id: format!("QuantumBrosFrontCertificate-{stage}"),
        certificate_arn: config.certificate_arn.clone(),
    })?;

    let mut distrinput = aws_cloudfront_distribution::Input {
        id: DISTRIBUTION_ID.to_string(),
        comment: Some(format!("QuantumBros Front Distribution {stage}")),
        min_ttl: 0,
        default_ttl: 3600,
        max_ttl: 86400,
        custom_error_responses: spa_error_responses(),
        ..Default::default()
    };
    let mut s3_origin = s3_origin_distribution::Input::new(bucket.clone());
    s3_origin.certificate = Some(certificate.clone());
    s3_origin_distribution::config(&s3_origin, &mut distrinput);
    ensure_single_origin(&distrinput)?;
    let distribution = aws_cloudfront_distribution::config(&distrinput, &mut stackinp)?;
    stackinp
        .overrides
        .push(aws_cloudfront_distribution::origin_access_control_override(&distribution, &oac, 0));

    let logical_bucket_policy_name = aws_s3::add_to_resource_policy(
        &bucket,
        vec![s3_origin_distribution::bucket_read_statement(&bucket)],
        &mut stackinp,
    )?;

    let output_keys = OutputKeys::for_stage(stage);
    let output = |description: &str, value| ResourceOutput {
        description: Some(description.to_string()),
        ..ResourceOutput::new(value)
    };
    stackinp.outputs = vec![
        (output_keys.bucket_name.clone(), output("Front end bucket name", bucket.bucket_name())),
        (output_keys.distribution_id.clone(), output("CloudFront distribution id", distribution.distribution_id())),
        (
            output_keys.distribution_domain_name.clone(),
            output("CloudFront distribution domain name", distribution.domain_name()),
        ),
    ];

    let stack = aws_cfn_stack::config(stackinp)?;
    tracing::info!(
        stage = %stage,
        bucket = %bucket.logical_bucket_name,
        distribution = %distribution.logical_distr_name,
        placeholder_certificate = certificate.is_placeholder(),
        "synthesized front end stack"
    );
    Ok(ResourceGraph {
        stack,
        bucket,
        origin_access_control: oac,
        certificate,
        distribution,
        logical_bucket_policy_name,
        output_keys,
    })
}
