//! Policy Gate (§4.A): validates `service:action` against an allowlist of
//! wildcard patterns, with a hard-coded denylist of mutation verbs that
//! dominates the allowlist no matter what the rules say.
//!
//! Modeled after the allow/deny evaluation in AWS-facing tool gates
//! elsewhere in this lineage (e.g. `use_aws`'s `eval_perm`), but collapsed
//! to the single allow/deny decision this tool needs — there's no "ask the
//! user" tier here, every call this tool makes must already be safe.

use crate::catalog::actions::{canonical_action, canonical_service};
use crate::error::AwsqueryError;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Verb prefixes that can never be allowed, even if a rule matches them.
/// Checked against the canonical (CamelCase) action name.
const MUTATION_PREFIXES: &[&str] = &[
    "Create", "Put", "Delete", "Update", "Modify", "Reboot", "Start", "Stop", "Terminate", "Send",
    "Attach", "Detach", "Run", "Cancel", "Restore", "Reset",
];

#[derive(Debug, Clone)]
pub struct PolicyRule {
    raw: String,
    service_regex: Regex,
    action_regex: Regex,
}

impl PolicyRule {
    pub fn parse(rule: &str) -> Result<Self> {
        let (service, action) = rule.split_once(':').ok_or_else(|| {
            AwsqueryError::BadArgument(format!(
                "policy rule '{rule}' is not of the form service:Action"
            ))
        })?;
        Ok(Self {
            raw: rule.to_string(),
            service_regex: wildcard_regex(service)?,
            action_regex: wildcard_regex(action)?,
        })
    }

    fn matches(&self, service: &str, canonical_action: &str) -> bool {
        self.service_regex.is_match(service) && self.action_regex.is_match(canonical_action)
    }
}

impl std::fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Compile a `*`-as-greedy-wildcard pattern to an anchored, case-insensitive
/// regex: every non-`*` run is escaped literally, `*` becomes `.*`.
fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let segments: Vec<String> = pattern.split('*').map(regex::escape).collect();
    let compiled = format!("^{}$", segments.join(".*"));
    RegexBuilder::new(&compiled)
        .case_insensitive(true)
        .build()
        .map_err(|err| anyhow::anyhow!("invalid policy pattern '{pattern}': {err}"))
}

#[derive(Debug, Clone)]
pub struct PolicyGate {
    rules: Vec<PolicyRule>,
}

#[derive(Debug, Deserialize)]
struct PolicyFile(Vec<String>);

impl PolicyGate {
    pub fn from_rules(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Locate the policy file per §6: `$AWSQUERY_POLICY`, then
    /// `./policy.json`, then a file named `policy.json` next to the
    /// running executable. A missing file is a fatal startup error.
    pub fn locate_policy_file() -> Result<PathBuf> {
        if let Ok(path) = env::var("AWSQUERY_POLICY") {
            let path = PathBuf::from(path);
            if path.is_file() {
                return Ok(path);
            }
            anyhow::bail!("AWSQUERY_POLICY points to '{}', which does not exist", path.display());
        }

        let cwd_candidate = Path::new("policy.json");
        if cwd_candidate.is_file() {
            return Ok(cwd_candidate.to_path_buf());
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                let bundled = dir.join("policy.json");
                if bundled.is_file() {
                    return Ok(bundled);
                }
            }
        }

        anyhow::bail!(
            "no policy file found (checked $AWSQUERY_POLICY, ./policy.json, and next to the executable)"
        )
    }

    pub fn load() -> Result<Self> {
        let path = Self::locate_policy_file()?;
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy file {}", path.display()))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let PolicyFile(entries) = serde_json::from_str(raw)
            .context("policy file must be a JSON array of \"service:Action\" strings")?;
        let rules = entries
            .iter()
            .map(|r| PolicyRule::parse(r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_rules(rules))
    }

    /// §4.A's allow/deny decision. Consulted before any AWS call, including
    /// the resolver's own source-operation sub-calls (§4.E step 6).
    pub fn check(&self, service: &str, action: &str) -> Result<(), AwsqueryError> {
        let service = canonical_service(service);
        let action = canonical_action(action);

        if is_mutation(&action) {
            return Err(AwsqueryError::PolicyDenied { service, action });
        }

        let allowed = self.rules.iter().any(|rule| rule.matches(&service, &action));
        if allowed {
            Ok(())
        } else {
            Err(AwsqueryError::PolicyDenied { service, action })
        }
    }

    pub fn is_allowed(&self, service: &str, action: &str) -> bool {
        self.check(service, action).is_ok()
    }
}

fn is_mutation(canonical_action: &str) -> bool {
    MUTATION_PREFIXES
        .iter()
        .any(|verb| canonical_action.starts_with(verb))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(rules: &[&str]) -> PolicyGate {
        PolicyGate::from_rules(
            rules
                .iter()
                .map(|r| PolicyRule::parse(r).unwrap())
                .collect(),
        )
    }

    #[test]
    fn exact_match_allows() {
        let gate = gate(&["ec2:DescribeInstances"]);
        assert!(gate.is_allowed("ec2", "describe-instances"));
    }

    #[test]
    fn wildcard_action_allows_any_describe() {
        let gate = gate(&["eks:Describe*"]);
        assert!(gate.is_allowed("eks", "describe-cluster"));
        assert!(gate.is_allowed("eks", "DescribeNodegroup"));
        assert!(!gate.is_allowed("eks", "ListClusters"));
    }

    #[test]
    fn wildcard_service_allows_any_service() {
        let gate = gate(&["*:List*"]);
        assert!(gate.is_allowed("s3", "ListBuckets"));
        assert!(gate.is_allowed("iam", "ListUsers"));
    }

    #[test]
    fn mutation_denylist_dominates_allowlist() {
        let gate = gate(&["ec2:*"]);
        assert!(!gate.is_allowed("ec2", "TerminateInstances"));
        assert!(!gate.is_allowed("ec2", "terminate-instances"));
        assert!(gate.is_allowed("ec2", "DescribeInstances"));
    }

    #[test]
    fn unknown_service_is_denied() {
        let gate = gate(&["ec2:Describe*"]);
        assert!(!gate.is_allowed("iam", "ListUsers"));
    }

    #[test]
    fn kebab_and_camel_case_actions_match_identically() {
        let gate = gate(&["ssm:DescribeParameters"]);
        assert!(gate.is_allowed("ssm", "describe-parameters"));
        assert!(gate.is_allowed("ssm", "describe_parameters"));
        assert!(gate.is_allowed("ssm", "DescribeParameters"));
    }

    #[test]
    fn parse_rejects_rule_without_colon() {
        assert!(PolicyRule::parse("ec2-DescribeInstances").is_err());
    }

    #[test]
    fn policy_monotonicity_no_flag_combination_unlocks_a_denied_action() {
        let gate = gate(&["ec2:Describe*"]);
        for action in ["TerminateInstances", "StopInstances", "RunInstances"] {
            assert!(!gate.is_allowed("ec2", action));
        }
    }

    #[test]
    fn load_from_path_reads_a_real_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"["ec2:Describe*", "s3:ListBuckets"]"#).unwrap();

        let gate = PolicyGate::load_from_path(&path).unwrap();
        assert!(gate.is_allowed("ec2", "DescribeInstances"));
        assert!(gate.is_allowed("s3", "ListBuckets"));
        assert!(!gate.is_allowed("iam", "ListUsers"));
    }

    #[test]
    fn load_from_path_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(PolicyGate::load_from_path(&path).is_err());
    }

    #[test]
    fn locate_policy_file_prefers_the_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom-policy.json");
        std::fs::write(&path, "[]").unwrap();

        // SAFETY: this test owns `AWSQUERY_POLICY` for its duration and
        // restores it before returning; cargo test runs this crate's tests
        // in one process but each test here uses a distinct, freshly
        // created path so concurrent runs don't observe each other's value.
        let previous = env::var("AWSQUERY_POLICY").ok();
        env::set_var("AWSQUERY_POLICY", &path);
        let located = PolicyGate::locate_policy_file().unwrap();
        match previous {
            Some(value) => env::set_var("AWSQUERY_POLICY", value),
            None => env::remove_var("AWSQUERY_POLICY"),
        }
        assert_eq!(located, path);
    }
}
