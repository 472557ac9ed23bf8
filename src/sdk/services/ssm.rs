//! SSM dispatch: `DescribeParameters`, `GetParameters`.

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::params::ParamMap;
use crate::sdk::json::insert_string;
use crate::sdk::{AwsService, Page};
use async_trait::async_trait;
use aws_sdk_ssm as ssm;
use aws_sdk_ssm::error::ProvideErrorMetadata;
use serde_json::{Map, Value};

pub struct SsmService;

#[async_trait]
impl AwsService for SsmService {
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        config: &aws_config::SdkConfig,
        max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        let client = ssm::Client::new(config);
        match canonical_action(action).as_str() {
            "DescribeParameters" => describe_parameters(&client, max_pages).await,
            "GetParameters" => {
                let names = required_string_list(params, "Names")?;
                get_parameters(&client, names).await.map(|page| vec![page])
            }
            other => Err(AwsqueryError::UnknownAction {
                service: "ssm".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

async fn describe_parameters(
    client: &ssm::Client,
    max_pages: usize,
) -> Result<Vec<Page>, AwsqueryError> {
    let mut paginator = client.describe_parameters().into_paginator().send();
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let page = match paginator.next().await {
            Some(page) => page.map_err(|err| sdk_error("ssm", "DescribeParameters", err))?,
            None => break,
        };

        let parameters: Vec<Value> = page
            .parameters
            .unwrap_or_default()
            .iter()
            .map(parameter_metadata_to_json)
            .collect();

        let mut root = Map::new();
        root.insert("Parameters".to_string(), Value::Array(parameters));
        pages.push(Page { value: Value::Object(root) });
    }

    Ok(pages)
}

fn parameter_metadata_to_json(parameter: &ssm::types::ParameterMetadata) -> Value {
    let mut json = Map::new();
    insert_string(&mut json, "Name", &parameter.name);
    if let Some(kind) = &parameter.r#type {
        json.insert("Type".to_string(), Value::String(kind.as_str().to_string()));
    }
    if let Some(tier) = &parameter.tier {
        json.insert("Tier".to_string(), Value::String(tier.as_str().to_string()));
    }
    Value::Object(json)
}

async fn get_parameters(client: &ssm::Client, names: Vec<String>) -> Result<Page, AwsqueryError> {
    let response = client
        .get_parameters()
        .set_names(Some(names))
        .send()
        .await
        .map_err(|err| sdk_error("ssm", "GetParameters", err))?;

    let parameters: Vec<Value> = response
        .parameters
        .unwrap_or_default()
        .iter()
        .map(parameter_to_json)
        .collect();

    let mut root = Map::new();
    root.insert("Parameters".to_string(), Value::Array(parameters));
    Ok(Page { value: Value::Object(root) })
}

fn parameter_to_json(parameter: &ssm::types::Parameter) -> Value {
    let mut json = Map::new();
    insert_string(&mut json, "Name", &parameter.name);
    insert_string(&mut json, "Value", &parameter.value);
    if let Some(kind) = &parameter.r#type {
        json.insert("Type".to_string(), Value::String(kind.as_str().to_string()));
    }
    Value::Object(json)
}

fn required_string_list(params: &ParamMap, key: &str) -> Result<Vec<String>, AwsqueryError> {
    let value = params
        .get(key)
        .ok_or_else(|| AwsqueryError::BadArgument(format!("missing required parameter '{key}'")))?;

    match value {
        Value::Array(items) => Ok(items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()),
        Value::String(s) => Ok(vec![s.clone()]),
        _ => Err(AwsqueryError::BadArgument(format!(
            "parameter '{key}' must be a string or list of strings"
        ))),
    }
}

fn sdk_error(service: &str, action: &str, err: impl std::fmt::Display + ProvideErrorMetadata) -> AwsqueryError {
    AwsqueryError::SdkError {
        service: service.to_string(),
        action: action.to_string(),
        code: err.code().unwrap_or("Unknown").to_string(),
        message: err.to_string(),
    }
}
