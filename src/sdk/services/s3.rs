//! S3 dispatch: `ListBuckets`. Unlike the other services, bucket listing
//! is a single non-paginated call (grounded on the teacher's
//! `aws_services/s3.rs::list_buckets`).

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::params::ParamMap;
use crate::sdk::json::{insert_string, insert_timestamp};
use crate::sdk::{AwsService, Page};
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use aws_sdk_s3::error::ProvideErrorMetadata;
use serde_json::{Map, Value};

pub struct S3Service;

#[async_trait]
impl AwsService for S3Service {
    async fn call_pages(
        &self,
        action: &str,
        _params: &ParamMap,
        config: &aws_config::SdkConfig,
        _max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        let client = s3::Client::new(config);
        match canonical_action(action).as_str() {
            "ListBuckets" => list_buckets(&client).await,
            other => Err(AwsqueryError::UnknownAction {
                service: "s3".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

async fn list_buckets(client: &s3::Client) -> Result<Vec<Page>, AwsqueryError> {
    let response = client
        .list_buckets()
        .send()
        .await
        .map_err(|err| sdk_error("s3", "ListBuckets", err))?;

    let buckets: Vec<Value> = response
        .buckets
        .unwrap_or_default()
        .iter()
        .map(bucket_to_json)
        .collect();

    let mut root = Map::new();
    root.insert("Buckets".to_string(), Value::Array(buckets));
    Ok(vec![Page { value: Value::Object(root) }])
}

fn bucket_to_json(bucket: &s3::types::Bucket) -> Value {
    let mut json = Map::new();
    insert_string(&mut json, "Name", &bucket.name);
    insert_timestamp(&mut json, "CreationDate", bucket.creation_date.as_ref());
    Value::Object(json)
}

fn sdk_error(service: &str, action: &str, err: impl std::fmt::Display + ProvideErrorMetadata) -> AwsqueryError {
    AwsqueryError::SdkError {
        service: service.to_string(),
        action: action.to_string(),
        code: err.code().unwrap_or("Unknown").to_string(),
        message: err.to_string(),
    }
}
