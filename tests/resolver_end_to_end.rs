//! End-to-end scenarios driven against a stub `AwsService`, covering the
//! full pipeline — policy check, parameter resolution, fan-out, filtering —
//! without touching the real AWS SDK or network.

use async_trait::async_trait;
use awsquery::catalog::StaticCatalog;
use awsquery::error::AwsqueryError;
use awsquery::filter::apply_value_filters;
use awsquery::params::ParamMap;
use awsquery::policy::{PolicyGate, PolicyRule};
use awsquery::resolver::Resolver;
use awsquery::sdk::{AwsService, Page, Registry};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;

struct StubEks;

#[async_trait]
impl AwsService for StubEks {
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        _config: &aws_config::SdkConfig,
        _max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        match action {
            "ListClusters" => Ok(vec![Page {
                value: json!({"clusters": [{"Name": "prod"}, {"Name": "staging"}]}),
            }]),
            "DescribeCluster" => {
                let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
                Ok(vec![Page { value: json!({"Name": name, "Status": "ACTIVE"}) }])
            }
            other => Err(AwsqueryError::UnknownAction {
                service: "eks".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

/// Unlike `StubEks`, models `ListNodegroups` requiring `clusterName` and
/// `DescribeNodegroup` requiring both `clusterName` and `nodegroupName` —
/// the two-required-field shape that a hintless, independent per-field
/// resolution would wrongly cross-product.
struct StubEksWithNodegroups;

#[async_trait]
impl AwsService for StubEksWithNodegroups {
    async fn call_pages(
        &self,
        action: &str,
        params: &ParamMap,
        _config: &aws_config::SdkConfig,
        _max_pages: usize,
    ) -> Result<Vec<Page>, AwsqueryError> {
        match action {
            "ListClusters" => Ok(vec![Page {
                value: json!({"clusters": [{"Name": "prod"}, {"Name": "stage"}]}),
            }]),
            "ListNodegroups" => {
                let cluster = params.get("clusterName").and_then(|v| v.as_str()).unwrap_or("unknown");
                let nodegroups: Vec<Value> = match cluster {
                    "prod" => vec![json!({"Name": "prod-workers-a"}), json!({"Name": "prod-workers-b"})],
                    "stage" => vec![json!({"Name": "stage-workers"})],
                    _ => vec![],
                };
                Ok(vec![Page { value: json!({"nodegroups": nodegroups}) }])
            }
            "DescribeNodegroup" => {
                let cluster = params.get("clusterName").and_then(|v| v.as_str()).unwrap_or("unknown");
                let nodegroup = params.get("nodegroupName").and_then(|v| v.as_str()).unwrap_or("unknown");
                Ok(vec![Page {
                    value: json!({"clusterName": cluster, "nodegroupName": nodegroup, "Status": "ACTIVE"}),
                }])
            }
            other => Err(AwsqueryError::UnknownAction {
                service: "eks".to_string(),
                action: other.to_string(),
                suggestion: None,
            }),
        }
    }
}

fn gate(rules: &[&str]) -> PolicyGate {
    PolicyGate::from_rules(rules.iter().map(|r| PolicyRule::parse(r).unwrap()).collect())
}

fn stub_registry() -> Registry {
    let mut services: HashMap<String, Box<dyn AwsService>> = HashMap::new();
    services.insert("eks".to_string(), Box::new(StubEks));
    Registry::from_services(services)
}

fn stub_registry_with_nodegroups() -> Registry {
    let mut services: HashMap<String, Box<dyn AwsService>> = HashMap::new();
    services.insert("eks".to_string(), Box::new(StubEksWithNodegroups));
    Registry::from_services(services)
}

#[tokio::test]
async fn missing_cluster_name_resolves_by_fanning_out_over_list_clusters() {
    let catalog = StaticCatalog;
    let policy = gate(&["eks:Describe*", "eks:List*"]);
    let invoker = awsquery::invoker::Invoker::new(stub_registry());
    let config = aws_config::SdkConfig::builder().build();

    let resolver = Resolver { catalog: &catalog, policy: &policy, invoker: &invoker, config: &config };

    let outcome = resolver
        .resolve("eks", "DescribeCluster", &ParamMap::new(), &[], &[])
        .await
        .unwrap();

    let mut names: Vec<String> = outcome
        .param_maps
        .iter()
        .map(|m| m.get("name").and_then(|v| v.as_str()).unwrap().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["prod".to_string(), "staging".to_string()]);
    assert!(!outcome.trace.is_empty());

    let (outcomes, errors) = invoker
        .invoke_fan_out("eks", "DescribeCluster", outcome.param_maps, &config, false)
        .await;
    assert!(errors.is_empty());

    let mut statuses = Vec::new();
    for result in outcomes {
        if let awsquery::invoker::InvokeOutcome::Records(records) = result {
            statuses.extend(records);
        }
    }
    assert_eq!(statuses.len(), 2);

    let filtered = apply_value_filters(&statuses, &["prod".to_string()]);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].get("Name"), Some(&json!("prod")));
}

#[tokio::test]
async fn an_explicit_user_parameter_short_circuits_resolution() {
    let catalog = StaticCatalog;
    let policy = gate(&["eks:Describe*"]);
    let invoker = awsquery::invoker::Invoker::new(stub_registry());
    let config = aws_config::SdkConfig::builder().build();
    let resolver = Resolver { catalog: &catalog, policy: &policy, invoker: &invoker, config: &config };

    let mut user_params = ParamMap::new();
    user_params.insert("name".to_string(), json!("prod"));

    let outcome = resolver.resolve("eks", "DescribeCluster", &user_params, &[], &[]).await.unwrap();

    assert_eq!(outcome.param_maps.len(), 1);
    assert!(outcome.trace.is_empty());
    assert_eq!(outcome.param_maps[0].get("name"), Some(&json!("prod")));
}

#[tokio::test]
async fn resource_filters_narrow_the_harvested_source_values() {
    let catalog = StaticCatalog;
    let policy = gate(&["eks:Describe*", "eks:List*"]);
    let invoker = awsquery::invoker::Invoker::new(stub_registry());
    let config = aws_config::SdkConfig::builder().build();
    let resolver = Resolver { catalog: &catalog, policy: &policy, invoker: &invoker, config: &config };

    let resource_filters = vec!["staging".to_string()];
    let outcome = resolver
        .resolve("eks", "DescribeCluster", &ParamMap::new(), &[], &resource_filters)
        .await
        .unwrap();

    assert_eq!(outcome.param_maps.len(), 1);
    assert_eq!(outcome.param_maps[0].get("name"), Some(&json!("staging")));
}

#[tokio::test]
async fn dependent_required_fields_chain_instead_of_cross_producting() {
    let catalog = StaticCatalog;
    let policy = gate(&["eks:Describe*", "eks:List*"]);
    let invoker = awsquery::invoker::Invoker::new(stub_registry_with_nodegroups());
    let config = aws_config::SdkConfig::builder().build();
    let resolver = Resolver { catalog: &catalog, policy: &policy, invoker: &invoker, config: &config };

    let outcome = resolver
        .resolve("eks", "DescribeNodegroup", &ParamMap::new(), &[], &[])
        .await
        .unwrap();

    // A cross-product over independently-harvested clusterName/nodegroupName
    // values would yield 4 combos, including nonsensical ones like
    // clusterName=stage paired with nodegroupName=prod-workers-a. Chaining
    // nodegroupName's harvest through each branch's own clusterName yields
    // exactly the 3 real (clusterName, nodegroupName) pairs.
    let mut pairs: Vec<(String, String)> = outcome
        .param_maps
        .iter()
        .map(|m| {
            let cluster = m.get("clusterName").and_then(|v| v.as_str()).unwrap().to_string();
            let nodegroup = m.get("nodegroupName").and_then(|v| v.as_str()).unwrap().to_string();
            (cluster, nodegroup)
        })
        .collect();
    pairs.sort();

    assert_eq!(
        pairs,
        vec![
            ("prod".to_string(), "prod-workers-a".to_string()),
            ("prod".to_string(), "prod-workers-b".to_string()),
            ("stage".to_string(), "stage-workers".to_string()),
        ]
    );
}

#[tokio::test]
async fn policy_denial_stops_resolution_before_any_call() {
    let policy = gate(&["s3:ListBuckets"]);
    assert!(policy.check("eks", "DescribeCluster").is_err());
}
