//! CloudFormation dispatch: `ListStacks`, `DescribeStacks`.

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::params::ParamMap;
use crate::sdk::json::{insert_string, insert_timestamp};
use crate::sdk::{AwsService, Page};
use async_trait::async_trait;
use aws_sdk_cloudformation as cfn;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use futures::TryStreamExt;
use serde_json::{Map, Value};

pub struct CloudFormationService;

#[async_trait]
impl AwsService for CloudFormationService {
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        config: &aws_config::SdkConfig,
        max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        let client = cfn::Client::new(config);
        match canonical_action(action).as_str() {
            "ListStacks" => list_stacks(&client, max_pages).await,
            "DescribeStacks" => {
                let stack_name = params.get("StackName").and_then(|v| v.as_str());
                describe_stacks(&client, stack_name, max_pages).await
            }
            other => Err(AwsqueryError::UnknownAction {
                service: "cloudformation".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

async fn list_stacks(client: &cfn::Client, max_pages: usize) -> Result<Vec<Page>, AwsqueryError> {
    let mut paginator = client.list_stacks().into_paginator().send();
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let page = match paginator.try_next().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(err) => return Err(sdk_error("cloudformation", "ListStacks", err)),
        };

        let summaries: Vec<Value> = page
            .stack_summaries
            .unwrap_or_default()
            .iter()
            .map(stack_summary_to_json)
            .collect();

        let mut root = Map::new();
        root.insert("StackSummaries".to_string(), Value::Array(summaries));
        pages.push(Page { value: Value::Object(root) });
    }

    Ok(pages)
}

fn stack_summary_to_json(summary: &cfn::types::StackSummary) -> Value {
    let mut json = Map::new();
    json.insert("StackName".to_string(), Value::String(summary.stack_name.clone()));
    json.insert(
        "StackStatus".to_string(),
        Value::String(summary.stack_status.as_str().to_string()),
    );
    insert_string(&mut json, "StackId", &summary.stack_id);
    insert_string(&mut json, "TemplateDescription", &summary.template_description);
    insert_timestamp(&mut json, "CreationTime", Some(&summary.creation_time));
    Value::Object(json)
}

async fn describe_stacks(
    client: &cfn::Client,
    stack_name: Option<&str>,
    max_pages: usize,
) -> Result<Vec<Page>, AwsqueryError> {
    let mut paginator = client
        .describe_stacks()
        .set_stack_name(stack_name.map(str::to_string))
        .into_paginator()
        .send();
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let page = match paginator.try_next().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(err) => return Err(sdk_error("cloudformation", "DescribeStacks", err)),
        };

        let stacks: Vec<Value> = page
            .stacks
            .unwrap_or_default()
            .iter()
            .map(stack_to_json)
            .collect();

        let mut root = Map::new();
        root.insert("Stacks".to_string(), Value::Array(stacks));
        pages.push(Page { value: Value::Object(root) });
    }

    Ok(pages)
}

fn stack_to_json(stack: &cfn::types::Stack) -> Value {
    let mut json = Map::new();
    json.insert("StackName".to_string(), Value::String(stack.stack_name.clone()));
    json.insert("StackId".to_string(), Value::String(stack.stack_id.clone().unwrap_or_default()));
    json.insert(
        "StackStatus".to_string(),
        Value::String(stack.stack_status.as_str().to_string()),
    );
    insert_string(&mut json, "Description", &stack.description);
    insert_timestamp(&mut json, "CreationTime", Some(&stack.creation_time));
    if let Some(outputs) = &stack.outputs {
        let outputs_json: Vec<Value> = outputs
            .iter()
            .map(|output| {
                let mut output_json = Map::new();
                insert_string(&mut output_json, "OutputKey", &output.output_key);
                insert_string(&mut output_json, "OutputValue", &output.output_value);
                Value::Object(output_json)
            })
            .collect();
        json.insert("Outputs".to_string(), Value::Array(outputs_json));
    }
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
