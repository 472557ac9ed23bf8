//! IAM dispatch: `ListUsers`, `ListAccessKeys`.

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::params::ParamMap;
use crate::sdk::json::{insert_string, insert_timestamp};
use crate::sdk::{AwsService, Page};
use async_trait::async_trait;
use aws_sdk_iam as iam;
use aws_sdk_iam::error::ProvideErrorMetadata;
use serde_json::{Map, Value};

pub struct IamService;

#[async_trait]
impl AwsService for IamService {
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        config: &aws_config::SdkConfig,
        max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        let client = iam::Client::new(config);
        match canonical_action(action).as_str() {
            "ListUsers" => list_users(&client, max_pages).await,
            "ListAccessKeys" => {
                let user_name = required_string(params, "UserName")?;
                list_access_keys(&client, &user_name, max_pages).await
            }
            other => Err(AwsqueryError::UnknownAction {
                service: "iam".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

async fn list_users(client: &iam::Client, max_pages: usize) -> Result<Vec<Page>, AwsqueryError> {
    let mut marker: Option<String> = None;
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let mut request = client.list_users().max_items(100);
        if let Some(marker) = &marker {
            request = request.marker(marker);
        }
        let response = request
            .send()
            .await
            .map_err(|err| sdk_error("iam", "ListUsers", err))?;

        let users: Vec<Value> = response.users.iter().map(user_to_json).collect();
        let mut root = Map::new();
        root.insert("Users".to_string(), Value::Array(users));
        pages.push(Page { value: Value::Object(root) });

        if response.is_truncated {
            marker = response.marker;
        } else {
            break;
        }
    }

    Ok(pages)
}

fn user_to_json(user: &iam::types::User) -> Value {
    let mut json = Map::new();
    json.insert("UserName".to_string(), Value::String(user.user_name.clone()));
    json.insert("UserId".to_string(), Value::String(user.user_id.clone()));
    json.insert("Arn".to_string(), Value::String(user.arn.clone()));
    insert_timestamp(&mut json, "CreateDate", Some(&user.create_date));
    insert_string(&mut json, "PasswordLastUsed", &user.password_last_used.map(|d| d.to_string()));
    Value::Object(json)
}

async fn list_access_keys(
    client: &iam::Client,
    user_name: &str,
    max_pages: usize,
) -> Result<Vec<Page>, AwsqueryError> {
    let mut marker: Option<String> = None;
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let mut request = client.list_access_keys().user_name(user_name);
        if let Some(marker) = &marker {
            request = request.marker(marker);
        }
        let response = request
            .send()
            .await
            .map_err(|err| sdk_error("iam", "ListAccessKeys", err))?;

        let keys: Vec<Value> = response
            .access_key_metadata
            .iter()
            .map(access_key_to_json)
            .collect();
        let mut root = Map::new();
        root.insert("AccessKeyMetadata".to_string(), Value::Array(keys));
        pages.push(Page { value: Value::Object(root) });

        if response.is_truncated {
            marker = response.marker;
        } else {
            break;
        }
    }

    Ok(pages)
}

fn access_key_to_json(key: &iam::types::AccessKeyMetadata) -> Value {
    let mut json = Map::new();
    insert_string(&mut json, "UserName", &key.user_name);
    insert_string(&mut json, "AccessKeyId", &key.access_key_id);
    if let Some(status) = &key.status {
        json.insert("Status".to_string(), Value::String(status.as_str().to_string()));
    }
    insert_timestamp(&mut json, "CreateDate", key.create_date.as_ref());
    Value::Object(json)
}

fn required_string(params: &ParamMap, key: &str) -> Result<String, AwsqueryError> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| AwsqueryError::BadArgument(format!("missing required parameter '{key}'")))
}

fn sdk_error(service: &str, action: &str, err: impl std::fmt::Display + ProvideErrorMetadata) -> AwsqueryError {
    AwsqueryError::SdkError {
        service: service.to_string(),
        action: action.to_string(),
        code: err.code().unwrap_or("Unknown").to_string(),
        message: err.to_string(),
    }
}
