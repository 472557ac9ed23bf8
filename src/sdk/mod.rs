//! Dynamic dispatch over the real AWS SDK crates.
//!
//! The public AWS Rust SDK has no generic "call this operation with a JSON
//! blob" entry point the way boto3 does — every operation is a strongly
//! typed builder. [`AwsService::call_pages`] is where that gap gets
//! bridged: each per-service module matches on the canonical action name,
//! builds the typed request from the untyped [`ParamMap`], drives the
//! operation's own paginator, and converts each page straight to
//! `serde_json::Value`, the way the per-service wrappers elsewhere in this
//! lineage (e.g. the EKS/EC2/S3 service adapters) already convert typed
//! SDK types to JSON for display.

pub mod json;
pub mod services;

use crate::error::AwsqueryError;
use crate::params::ParamMap;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use serde_json::Value;
use std::collections::HashMap;

/// Build the `SdkConfig` this invocation's calls share, honoring
/// `--region`/`--profile` overrides on top of the standard AWS credential
/// and region chain (§6: credential/region resolution is an external
/// collaborator, only its contract — "honor the standard chain plus
/// explicit overrides" — is specified here).
pub async fn load_config(region: Option<&str>, profile: Option<&str>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_types::region::Region::new(region.to_string()));
    }
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    loader.load().await
}

/// One page of a dispatched call, already converted to JSON.
pub struct Page {
    pub value: Value,
}

#[async_trait]
pub trait AwsService: Send + Sync {
    /// Execute `action` with `params`, returning up to `max_pages` pages.
    /// Implementations drive the operation's own SDK paginator and stop
    /// early once `max_pages` is reached (§4.F page-cap safety limit).
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        config: &aws_config::SdkConfig,
        max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError>;
}

/// Maps a service id to its dispatch implementation. Built once per
/// invocation; the catalog and registry are kept as separate collaborators
/// on purpose (design notes: "avoid ambient singletons").
pub struct Registry {
    services: HashMap<String, Box<dyn AwsService>>,
}

impl Registry {
    /// Build a registry from an arbitrary service map, bypassing the real
    /// AWS SDK wiring — used in integration tests to drive the resolver and
    /// invoker against a stub [`AwsService`] implementation.
    pub fn from_services(services: HashMap<String, Box<dyn AwsService>>) -> Self {
        Self { services }
    }

    pub fn new() -> Self {
        let mut services: HashMap<String, Box<dyn AwsService>> = HashMap::new();
        services.insert("ec2".to_string(), Box::new(services::ec2::Ec2Service));
        services.insert("eks".to_string(), Box::new(services::eks::EksService));
        services.insert("iam".to_string(), Box::new(services::iam::IamService));
        services.insert("s3".to_string(), Box::new(services::s3::S3Service));
        services.insert("ssm".to_string(), Box::new(services::ssm::SsmService));
        services.insert(
            "cloudformation".to_string(),
            Box::new(services::cloudformation::CloudFormationService),
        );
        services.insert(
            "lambda".to_string(),
            Box::new(services::lambda::LambdaService),
        );
        Self { services }
    }

    pub fn get(&self, service: &str) -> Option<&dyn AwsService> {
        self.services.get(service).map(|b| b.as_ref())
    }

    /// The service ids this registry actually dispatches, used for
    /// "did you mean" suggestions on an unrecognized service name.
    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
