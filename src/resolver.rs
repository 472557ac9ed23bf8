//! Parameter Resolver (§4.E) — the heart of the system. Given a target
//! `(service, action)` and whatever parameters the user already supplied,
//! figures out which required fields are still missing, picks a source
//! list/describe operation to harvest each one from, recurses to resolve
//! that source operation itself, harvests candidate values with the Field
//! Extractor, and fans the target operation's parameter map out across the
//! cartesian product of the harvested values.

use crate::catalog::actions::{field_entity, suggest_closest};
use crate::catalog::model::OperationShape;
use crate::catalog::ServiceCatalog;
use crate::error::AwsqueryError;
use crate::extract::extract_with_aws_fallback;
use crate::filter::apply_value_filters;
use crate::invoker::Invoker;
use crate::params::{coerce_to_field_kind, ParamMap, ResolutionHint};
use crate::policy::PolicyGate;
use crate::record::Record;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::HashMap;

/// Hard ceiling on the cartesian product of fanned-out values (§9 "Cartesian
/// fan-out").
pub const FANOUT_CEILING: usize = 100;

/// What the resolver produced for one target call: the parameter maps ready
/// to invoke, plus a human-readable trace of the resolution path taken (used
/// in `--debug` output and attached to `unresolvable-parameter` errors).
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    pub param_maps: Vec<ParamMap>,
    pub trace: Vec<String>,
}

pub struct Resolver<'a> {
    pub catalog: &'a dyn ServiceCatalog,
    pub policy: &'a PolicyGate,
    pub invoker: &'a Invoker,
    pub config: &'a aws_config::SdkConfig,
}

impl<'a> Resolver<'a> {
    /// Resolve `service:action`, merging in `user_params` and honoring one
    /// `-i` hint per unresolved required field, in declaration order.
    ///
    /// `resource_filters` is the rare three-segment CLI form's leading
    /// segment (§9 open question (a)): value-filter tokens applied to each
    /// chosen source operation's own response before harvesting, so an
    /// operator can narrow *which* resolved value gets picked (e.g. only
    /// fan out over clusters whose name contains "prod"). Recursive
    /// sub-resolutions of the source operation itself never receive it —
    /// it scopes only the immediate harvest for this target's unsatisfied
    /// fields.
    pub fn resolve<'f>(
        &'f self,
        service: &'f str,
        action: &'f str,
        user_params: &'f ParamMap,
        hints: &'f [ResolutionHint],
        resource_filters: &'f [String],
    ) -> BoxFuture<'f, Result<ResolveOutcome, AwsqueryError>> {
        async move {
            let shape = self.catalog.describe(service, action).ok_or_else(|| {
                let known = self.catalog.list_operations(service);
                AwsqueryError::UnknownAction {
                    service: service.to_string(),
                    action: action.to_string(),
                    suggestion: suggest_closest(known.iter().map(String::as_str), action),
                }
            })?;

            let mut working: ParamMap = ParamMap::new();
            for (key, value) in user_params {
                let coerced = match shape.field(key) {
                    Some(field) => coerce_to_field_kind(value.clone(), field.kind),
                    None => value.clone(),
                };
                working.insert(key.clone(), coerced);
            }

            let unsatisfied: Vec<_> = shape
                .required_fields()
                .filter(|field| !working.contains_key(&field.name))
                .collect();

            if unsatisfied.is_empty() {
                return Ok(ResolveOutcome { param_maps: vec![working], trace: Vec::new() });
            }

            // Combos are built incrementally, one field at a time, rather
            // than as independent per-field value lists cross-producted at
            // the end: a later field's source operation may itself require
            // an earlier field already resolved in this same call (e.g.
            // `DescribeNodegroup`'s `nodegroupName` harvests from
            // `ListNodegroups`, which itself requires `clusterName`). Each
            // existing branch is extended with values harvested by calling
            // that branch's source operation with its own already-resolved
            // fields threaded in, so a nodegroup harvested for "prod" is
            // never paired with "stage"'s cluster name.
            let mut combos: Vec<Vec<(String, Value)>> = vec![Vec::new()];
            let mut trace = Vec::new();
            let mut known_names: Vec<String> = working.keys().cloned().collect();

            for (idx, field) in unsatisfied.iter().enumerate() {
                let hint = hints.get(idx).cloned().unwrap_or_default();

                let candidate =
                    self.pick_source_operation(service, action, &field.name, &hint, &known_names)?;

                trace.push(format!(
                    "{service}:{action} needs {field} <- {service}:{candidate}",
                    field = field.name,
                    candidate = candidate,
                ));

                let source_shape = self.catalog.describe(service, &candidate);
                let mut cache: HashMap<String, Vec<Value>> = HashMap::new();
                let mut values_per_combo: Vec<Vec<Value>> = Vec::with_capacity(combos.len());

                for combo in &combos {
                    let sub_params = dependent_params(&working, combo, source_shape.as_ref());
                    let cache_key = params_cache_key(&sub_params);

                    let harvested = if let Some(cached) = cache.get(&cache_key) {
                        cached.clone()
                    } else {
                        // Resolve (and thereby execute, via the invoker) the
                        // chosen source operation, threading through
                        // whichever of this branch's already-resolved
                        // fields it requires.
                        let sub_outcome =
                            self.resolve(service, &candidate, &sub_params, &[], &[]).await?;
                        trace.extend(sub_outcome.trace.clone());

                        let mut records = Vec::new();
                        for sub_p in &sub_outcome.param_maps {
                            let sub_records =
                                self.invoker.invoke(service, &candidate, sub_p, self.config).await?;
                            records.extend(sub_records);
                        }

                        let filtered_records: Vec<Record> = if resource_filters.is_empty() {
                            records
                        } else {
                            apply_value_filters(&records, resource_filters)
                                .into_iter()
                                .cloned()
                                .collect()
                        };

                        let harvested = extract_with_aws_fallback(
                            &filtered_records,
                            hint.field_hint.as_deref(),
                            &candidate,
                        );
                        let limit = hint.limit.map(|l| l.min(FANOUT_CEILING)).unwrap_or(FANOUT_CEILING);
                        let harvested: Vec<Value> = harvested.into_iter().take(limit).collect();
                        cache.insert(cache_key, harvested.clone());
                        harvested
                    };

                    values_per_combo.push(harvested);
                }

                // A branch whose source op happens to have nothing to
                // harvest (e.g. a cluster with no nodegroups) simply
                // contributes no rows; only error out when every branch
                // came back empty, i.e. the field is unresolvable outright.
                if values_per_combo.iter().all(Vec::is_empty) {
                    return Err(AwsqueryError::UnresolvableParameter {
                        service: service.to_string(),
                        action: action.to_string(),
                        field: field.name.clone(),
                        trace,
                    });
                }

                combos = extend_combos_per_branch(&combos, &field.name, &values_per_combo, FANOUT_CEILING)
                    .ok_or_else(|| AwsqueryError::UnresolvableParameter {
                        service: service.to_string(),
                        action: action.to_string(),
                        field: field.name.clone(),
                        trace: trace.clone(),
                    })?;

                known_names.push(field.name.clone());
            }

            let mut param_maps = Vec::with_capacity(combos.len());
            for combo in combos {
                let mut map = working.clone();
                for (name, value) in combo {
                    let coerced = match shape.field(&name) {
                        Some(field) => coerce_to_field_kind(value, field.kind),
                        None => value,
                    };
                    map.insert(name, coerced);
                }
                param_maps.push(map);
            }
            param_maps.sort_by(|a, b| sort_key(&shape, a).cmp(&sort_key(&shape, b)));

            Ok(ResolveOutcome { param_maps, trace })
        }
        .boxed()
    }

    /// §4.E step 2: pick the source operation to harvest `field` from.
    /// `known_fields` are the names already resolved in this call (explicit
    /// user params plus fields resolved by earlier iterations of the same
    /// loop) — a candidate may itself require one of them, e.g.
    /// `ListNodegroups` requiring `clusterName` when resolving
    /// `nodegroupName` after `clusterName` is already in hand.
    fn pick_source_operation(
        &self,
        service: &str,
        action: &str,
        field: &str,
        hint: &ResolutionHint,
        known_fields: &[String],
    ) -> Result<String, AwsqueryError> {
        let mut candidates = self.ranked_candidates(service, field, hint, known_fields);
        candidates.retain(|candidate_action| self.policy.is_allowed(service, candidate_action));

        candidates.into_iter().next().ok_or_else(|| AwsqueryError::UnresolvableParameter {
            service: service.to_string(),
            action: action.to_string(),
            field: field.to_string(),
            trace: Vec::new(),
        })
    }

    fn ranked_candidates(
        &self,
        service: &str,
        field: &str,
        hint: &ResolutionHint,
        known_fields: &[String],
    ) -> Vec<String> {
        let operations = self.catalog.list_operations(service);

        if let Some(source_hint) = &hint.source_hint {
            let needle = normalize(source_hint);
            let mut matches: Vec<String> = operations
                .into_iter()
                .filter(|op| normalize(op).contains(&needle))
                .collect();
            matches.sort();
            return matches;
        }

        let entity = field_entity(field);
        let mut scored: Vec<(bool, usize, String)> = operations
            .into_iter()
            .filter_map(|op| {
                let shape = self.catalog.describe(service, &op)?;
                // An op with no required fields always qualifies; one whose
                // required fields are already known (e.g. a parent
                // identifier resolved earlier this call) qualifies too.
                let satisfiable = shape
                    .required_fields()
                    .all(|f| known_fields.iter().any(|k| k.eq_ignore_ascii_case(&f.name)));
                if !satisfiable {
                    return None;
                }
                if !(op.starts_with("List") || op.starts_with("Describe")) {
                    return None;
                }
                let contains_entity = normalize(&op).contains(&entity.to_lowercase());
                Some((!contains_entity, op.len(), op))
            })
            .collect();
        scored.sort();
        scored.into_iter().map(|(_, _, op)| op).collect()
    }
}

/// Build the parameters to call `source_shape` with for one branch: its own
/// required fields, filled in from whichever of `working` (explicit user
/// params) or `combo` (fields this branch already resolved) supplies them.
fn dependent_params(
    working: &ParamMap,
    combo: &[(String, Value)],
    source_shape: Option<&OperationShape>,
) -> ParamMap {
    let mut params = ParamMap::new();
    let Some(shape) = source_shape else {
        return params;
    };
    for field in shape.required_fields() {
        if let Some((_, value)) = combo.iter().find(|(name, _)| name.eq_ignore_ascii_case(&field.name)) {
            params.insert(field.name.clone(), value.clone());
        } else if let Some(value) = working.get(&field.name) {
            params.insert(field.name.clone(), value.clone());
        }
    }
    params
}

/// Canonical key for memoizing a branch's source-operation call: branches
/// that resolve to the same params (the common case — a source op with no
/// dependency on anything just-resolved) share one harvest instead of
/// re-issuing it per branch.
fn params_cache_key(params: &ParamMap) -> String {
    let mut pairs: Vec<String> =
        params.iter().map(|(k, v)| format!("{k}={}", render_scalar(v))).collect();
    pairs.sort();
    pairs.join("\u{0}")
}

fn normalize(s: &str) -> String {
    s.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase()
}

fn sort_key(shape: &OperationShape, params: &ParamMap) -> String {
    shape
        .inputs
        .iter()
        .filter_map(|field| params.get(&field.name))
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

/// Cross-product of each field's harvested candidate values, bounded by
/// `ceiling`. Returns `None` if the product would exceed it (§9: abort
/// rather than silently truncate).
fn cartesian_product(
    fields: &[(String, Vec<Value>)],
    ceiling: usize,
) -> Option<Vec<Vec<(String, Value)>>> {
    let mut combos: Vec<Vec<(String, Value)>> = vec![Vec::new()];
    for (name, values) in fields {
        let values_per_combo = vec![values.clone(); combos.len()];
        combos = extend_combos_per_branch(&combos, name, &values_per_combo, ceiling)?;
    }
    Some(combos)
}

/// Extend each existing combo with its own branch-specific harvested values
/// for `field_name` — `combos[i]` pairs only with `values_per_combo[i]`, so
/// a value harvested for one branch (e.g. a nodegroup harvested by calling
/// `ListNodegroups` with that branch's own `clusterName`) is never paired
/// with another branch's resolved fields. `cartesian_product` is the
/// special case where every branch shares the same values.
fn extend_combos_per_branch(
    combos: &[Vec<(String, Value)>],
    field_name: &str,
    values_per_combo: &[Vec<Value>],
    ceiling: usize,
) -> Option<Vec<Vec<(String, Value)>>> {
    let mut next = Vec::new();
    for (combo, values) in combos.iter().zip(values_per_combo) {
        for value in values {
            if next.len() >= ceiling {
                return None;
            }
            let mut extended = combo.clone();
            extended.push((field_name.to_string(), value.clone()));
            next.push(extended);
        }
    }
    Some(next)
}
