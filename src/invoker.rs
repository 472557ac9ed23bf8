//! Invoker (§4.F): executes one concrete operation and, for the final
//! fanned-out target call, runs every resolved parameter map to completion
//! and concatenates the flattened results.

use crate::catalog::actions::canonical_action;
use crate::error::AwsqueryError;
use crate::flatten::flatten;
use crate::params::ParamMap;
use crate::record::Record;
use crate::sdk::{AwsService, Page, Registry};
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Safety cap on pages consumed per call (§4.F).
pub const MAX_PAGES: usize = 50;

/// Bounded concurrency for fanned-out target calls (§5).
const MAX_CONCURRENT_CALLS: usize = 8;

pub enum InvokeOutcome {
    DryRun(String),
    Records(Vec<Record>),
}

/// One fanned-out call's outcome, tagged with the parameter map it was
/// built from so results can be sorted back into a deterministic order
/// (§5: "sorting fanned-out responses by the harvested parameter value").
pub struct FanOutResult {
    pub params: ParamMap,
    pub records: Vec<Record>,
}

pub struct Invoker {
    registry: Registry,
}

impl Invoker {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    fn service(&self, service: &str) -> Result<&dyn AwsService, AwsqueryError> {
        self.registry.get(service).ok_or_else(|| AwsqueryError::UnknownService {
            service: service.to_string(),
            suggestion: crate::catalog::actions::suggest_closest(
                self.registry.service_names(),
                service,
            ),
        })
    }

    /// Run one operation to completion: drive pagination, merge pages, and
    /// flatten the result. Used both for the resolver's source-operation
    /// harvesting calls and (via [`Invoker::invoke_fan_out`]) for the final
    /// target call.
    pub async fn invoke(
        &self,
        service: &str,
        action: &str,
        params: &ParamMap,
        config: &aws_config::SdkConfig,
    ) -> Result<Vec<Record>, AwsqueryError> {
        let action = canonical_action(action);
        let service_impl = self.service(service)?;
        let pages = service_impl
            .call_pages(&action, params, config, MAX_PAGES)
            .await?;
        let merged = merge_pages(pages);
        Ok(flatten(&merged))
    }

    /// Dry-run description `service action {k: v, ...}` (§4.F), issuing no
    /// SDK call.
    pub fn describe_dry_run(service: &str, action: &str, params: &ParamMap) -> String {
        let action = canonical_action(action);
        let rendered = params
            .iter()
            .map(|(k, v)| format!("{k}: {}", render_scalar(v)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{service} {action} {{{rendered}}}")
    }

    /// Execute the final target call once per resolved parameter map,
    /// bounded to [`MAX_CONCURRENT_CALLS`] in flight at a time. A call that
    /// fails at the SDK layer is reported for that one parameter map only
    /// (§4.E failure semantics); the others still complete.
    pub async fn invoke_fan_out(
        &self,
        service: &str,
        action: &str,
        param_maps: Vec<ParamMap>,
        config: &aws_config::SdkConfig,
        dry_run: bool,
    ) -> (Vec<InvokeOutcome>, Vec<String>) {
        if dry_run {
            let lines = param_maps
                .into_iter()
                .map(|params| InvokeOutcome::DryRun(Self::describe_dry_run(service, action, &params)))
                .collect();
            return (lines, Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_CALLS));
        let mut in_flight = FuturesUnordered::new();

        for params in param_maps {
            let semaphore = Arc::clone(&semaphore);
            in_flight.push(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                let records = self.invoke(service, action, &params, config).await;
                (params, records)
            });
        }

        let mut results: Vec<FanOutResult> = Vec::new();
        let mut errors = Vec::new();

        while let Some((params, outcome)) = in_flight.next().await {
            match outcome {
                Ok(records) => results.push(FanOutResult { params, records }),
                Err(err) => errors.push(format!("{service}:{action} failed for {params:?}: {err}")),
            }
        }

        results.sort_by(|a, b| sort_key(&a.params).cmp(&sort_key(&b.params)));
        let outcomes = results
            .into_iter()
            .map(|r| InvokeOutcome::Records(r.records))
            .collect();
        (outcomes, errors)
    }
}

/// Deterministic ordering key: the parameter map's values joined in
/// declaration order (§5 determinism).
fn sort_key(params: &ParamMap) -> String {
    params
        .values()
        .map(render_scalar)
        .collect::<Vec<_>>()
        .join("\u{0}")
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Merge pages by concatenating arrays for keys that repeat and otherwise
/// taking the last value written (§4.F / §9 primary-list merge rule).
fn merge_pages(pages: Vec<Page>) -> Value {
    let mut merged: Map<String, Value> = Map::new();
    for page in pages {
        let map = match page.value {
            Value::Object(map) => map,
            _ => continue,
        };
        for (key, value) in map {
            match (merged.get_mut(&key), value) {
                (Some(Value::Array(existing)), Value::Array(incoming)) => {
                    existing.extend(incoming);
                }
                (_, value) => {
                    merged.insert(key, value);
                }
            }
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_service_suggests_the_nearest_registered_name() {
        let invoker = Invoker::new(Registry::new());
        let err = invoker.service("eks2").unwrap_err();
        match err {
            AwsqueryError::UnknownService { suggestion, .. } => {
                assert_eq!(suggestion, Some("eks".to_string()));
            }
            other => panic!("expected UnknownService, got {other:?}"),
        }
    }

    #[test]
    fn merge_pages_concatenates_matching_arrays() {
        let pages = vec![
            Page { value: json!({"Parameters": [{"Name": "a"}]}) },
            Page { value: json!({"Parameters": [{"Name": "b"}]}) },
        ];
        let merged = merge_pages(pages);
        assert_eq!(merged, json!({"Parameters": [{"Name": "a"}, {"Name": "b"}]}));
    }

    #[test]
    fn merge_pages_last_write_wins_for_scalars() {
        let pages = vec![
            Page { value: json!({"NextToken": "abc", "Parameters": []}) },
            Page { value: json!({"NextToken": "xyz", "Parameters": []}) },
        ];
        let merged = merge_pages(pages);
        assert_eq!(merged["NextToken"], json!("xyz"));
    }

    #[test]
    fn dry_run_description_matches_scenario_format() {
        let mut params = ParamMap::new();
        params.insert("UserName".to_string(), Value::String("alice".to_string()));
        assert_eq!(
            Invoker::describe_dry_run("iam", "ListAccessKeys", &params),
            "iam ListAccessKeys {UserName: alice}"
        );
    }
}
