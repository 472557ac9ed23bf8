//! EKS dispatch: `ListClusters`, `DescribeCluster`, `ListNodegroups`,
//! `DescribeNodegroup`. Grounded on the teacher's `aws_services/eks.rs`
//! `cluster_to_json`-style manual field conversion.

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::params::ParamMap;
use crate::sdk::json::{insert_string, insert_string_list, insert_timestamp};
use crate::sdk::{AwsService, Page};
use async_trait::async_trait;
use aws_sdk_eks as eks;
use aws_sdk_eks::error::ProvideErrorMetadata;
use futures::TryStreamExt;
use serde_json::{Map, Value};

pub struct EksService;

#[async_trait]
impl AwsService for EksService {
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        config: &aws_config::SdkConfig,
        max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        let client = eks::Client::new(config);
        match canonical_action(action).as_str() {
            "ListClusters" => list_clusters(&client, max_pages).await,
            "DescribeCluster" => {
                let name = required_string(params, "name")?;
                describe_cluster(&client, &name).await.map(|page| vec![page])
            }
            "ListNodegroups" => {
                let cluster_name = required_string(params, "clusterName")?;
                list_nodegroups(&client, &cluster_name, max_pages).await
            }
            "DescribeNodegroup" => {
                let cluster_name = required_string(params, "clusterName")?;
                let nodegroup_name = required_string(params, "nodegroupName")?;
                describe_nodegroup(&client, &cluster_name, &nodegroup_name)
                    .await
                    .map(|page| vec![page])
            }
            other => Err(AwsqueryError::UnknownAction {
                service: "eks".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

async fn list_clusters(client: &eks::Client, max_pages: usize) -> Result<Vec<Page>, AwsqueryError> {
    let mut paginator = client.list_clusters().into_paginator().send();
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let page = match paginator.try_next().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(err) => return Err(sdk_error("eks", "ListClusters", err)),
        };

        let mut root = Map::new();
        insert_string_list(&mut root, "clusters", &page.clusters);
        pages.push(Page { value: Value::Object(root) });
    }

    Ok(pages)
}

async fn describe_cluster(client: &eks::Client, name: &str) -> Result<Page, AwsqueryError> {
    let response = client
        .describe_cluster()
        .name(name)
        .send()
        .await
        .map_err(|err| sdk_error("eks", "DescribeCluster", err))?;

    let cluster = response.cluster.ok_or_else(|| AwsqueryError::SdkError {
        service: "eks".to_string(),
        action: "DescribeCluster".to_string(),
        code: "NotFound".to_string(),
        message: format!("cluster '{name}' not found"),
    })?;

    Ok(Page { value: cluster_to_json(&cluster) })
}

fn cluster_to_json(cluster: &eks::types::Cluster) -> Value {
    let mut json = Map::new();
    insert_string(&mut json, "name", &cluster.name);
    insert_string(&mut json, "arn", &cluster.arn);
    insert_timestamp(&mut json, "createdAt", cluster.created_at.as_ref());
    insert_string(&mut json, "version", &cluster.version);
    insert_string(&mut json, "endpoint", &cluster.endpoint);
    insert_string(&mut json, "roleArn", &cluster.role_arn);
    if let Some(status) = &cluster.status {
        json.insert("status".to_string(), Value::String(status.as_str().to_string()));
    }
    if let Some(vpc_config) = &cluster.resources_vpc_config {
        let mut vpc_json = Map::new();
        insert_string_list(&mut vpc_json, "subnetIds", &vpc_config.subnet_ids);
        insert_string_list(&mut vpc_json, "securityGroupIds", &vpc_config.security_group_ids);
        json.insert("resourcesVpcConfig".to_string(), Value::Object(vpc_json));
    }
    Value::Object(json)
}

async fn list_nodegroups(
    client: &eks::Client,
    cluster_name: &str,
    max_pages: usize,
) -> Result<Vec<Page>, AwsqueryError> {
    let mut paginator = client
        .list_nodegroups()
        .cluster_name(cluster_name)
        .into_paginator()
        .send();
    let mut pages = Vec::new();

    while pages.len() < max_pages {
        let page = match paginator.try_next().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(err) => return Err(sdk_error("eks", "ListNodegroups", err)),
        };

        let mut root = Map::new();
        insert_string_list(&mut root, "nodegroups", &page.nodegroups);
        pages.push(Page { value: Value::Object(root) });
    }

    Ok(pages)
}

async fn describe_nodegroup(
    client: &eks::Client,
    cluster_name: &str,
    nodegroup_name: &str,
) -> Result<Page, AwsqueryError> {
    let response = client
        .describe_nodegroup()
        .cluster_name(cluster_name)
        .nodegroup_name(nodegroup_name)
        .send()
        .await
        .map_err(|err| sdk_error("eks", "DescribeNodegroup", err))?;

    let nodegroup = response.nodegroup.ok_or_else(|| AwsqueryError::SdkError {
        service: "eks".to_string(),
        action: "DescribeNodegroup".to_string(),
        code: "NotFound".to_string(),
        message: format!("nodegroup '{nodegroup_name}' not found on cluster '{cluster_name}'"),
    })?;

    let mut json = Map::new();
    insert_string(&mut json, "nodegroupName", &nodegroup.nodegroup_name);
    insert_string(&mut json, "clusterName", &nodegroup.cluster_name);
    if let Some(status) = &nodegroup.status {
        json.insert("status".to_string(), Value::String(status.as_str().to_string()));
    }
    insert_string(&mut json, "nodeRole", &nodegroup.node_role);
    insert_string_list(&mut json, "subnets", &nodegroup.subnets);
    insert_timestamp(&mut json, "createdAt", nodegroup.created_at.as_ref());

    Ok(Page { value: Value::Object(json) })
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
