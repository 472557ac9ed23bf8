//! Lambda dispatch: `ListFunctions`.

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::params::ParamMap;
use crate::sdk::json::{insert_i64, insert_string};
use crate::sdk::{AwsService, Page};
use async_trait::async_trait;
use aws_sdk_lambda as lambda;
use aws_sdk_lambda::error::ProvideErrorMetadata;
use serde_json::{Map, Value};

pub struct LambdaService;

#[async_trait]
impl AwsService for LambdaService {
    async fn call_pages(
        &self,
        action: &str,
        _params: &ParamMap,
        config: &aws_config::SdkConfig,
        max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        let client = lambda::Client::new(config);
        match canonical_action(action).as_str() {
            "ListFunctions" => list_functions(&client, max_pages).await,
            other => Err(AwsqueryError::UnknownAction {
                service: "lambda".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

async fn list_functions(
    client: &lambda::Client,
    max_pages: usize,
) -> Result<Vec<Page>, AwsqueryError> {
    let mut paginator = client.list_functions().into_paginator().send();
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let page = match paginator.next().await {
            Some(page) => page.map_err(|err| sdk_error("lambda", "ListFunctions", err))?,
            None => break,
        };

        let functions: Vec<Value> = page
            .functions
            .unwrap_or_default()
            .iter()
            .map(function_to_json)
            .collect();

        let mut root = Map::new();
        root.insert("Functions".to_string(), Value::Array(functions));
        pages.push(Page { value: Value::Object(root) });
    }

    Ok(pages)
}

fn function_to_json(function: &lambda::types::FunctionConfiguration) -> Value {
    let mut json = Map::new();
    insert_string(&mut json, "FunctionName", &function.function_name);
    insert_string(&mut json, "FunctionArn", &function.function_arn);
    if let Some(runtime) = &function.runtime {
        json.insert("Runtime".to_string(), Value::String(runtime.as_str().to_string()));
    }
    insert_string(&mut json, "Role", &function.role);
    insert_string(&mut json, "Handler", &function.handler);
    insert_i64(&mut json, "CodeSize", Some(function.code_size));
    insert_string(&mut json, "LastModified", &function.last_modified);
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
