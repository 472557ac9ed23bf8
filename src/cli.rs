//! CLI Frontend (§4.H): parses
//! `awsquery [global-flags] SERVICE ACTION [value-filters] [-- column-filters]`
//! with the rare three-segment form
//! `SERVICE ACTION [resource-filters] -- [value-filters] -- [column-filters]`
//! (§9 open question (a), codified here).
//!
//! Global flag parsing follows `clap`'s derive API, the way the rest of
//! this lineage's CLI-shaped tools (`flowctl`, `agtrace-cli`) do it. The
//! `SERVICE ACTION [...]` tail isn't a good fit for clap's own positional
//! matching — the number of `--`-delimited segments is only known once
//! we've seen the tokens — so it's captured as one raw trailing vector and
//! split by hand.

use crate::error::AwsqueryError;
use crate::params::{ResolutionHint, UserParameter};
use clap::{ArgAction, Parser};

/// Raw flag surface. `rest` is everything after the recognized global
/// flags: `SERVICE`, `ACTION`, and the `--`-delimited filter segments,
/// captured verbatim (clap stops interpreting flags once this trailing
/// positional starts consuming, so later literal `--` tokens survive).
#[derive(Debug, Parser)]
#[command(
    name = "awsquery",
    about = "Invoke a read-only AWS API operation by service + action, auto-resolving missing parameters"
)]
struct RawArgs {
    /// Describe what would be called instead of calling it.
    #[arg(long)]
    dry_run: bool,

    /// Render output as JSON instead of a table.
    #[arg(short = 'j', long)]
    json: bool,

    /// Print the union of record paths instead of rendering values.
    #[arg(short = 'k', long)]
    keys: bool,

    /// Raise log verbosity and print `[DEBUG]` trace lines to stderr.
    #[arg(short = 'd', long)]
    debug: bool,

    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// `KEY=VALUE`, repeatable; accumulates into a list on repeat.
    #[arg(short = 'p', value_name = "KEY=VALUE", action = ArgAction::Append)]
    param: Vec<String>,

    /// `source:field:limit`, repeatable, one per unresolved parameter.
    #[arg(short = 'i', value_name = "SRC:FIELD:LIMIT", action = ArgAction::Append)]
    hint: Vec<String>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

/// What `awsquery` should do, once parsed: either list services, or
/// dispatch `service:action` with the parsed filters/params/hints.
#[derive(Debug)]
pub struct ParsedCommand {
    pub service: Option<String>,
    pub action: Option<String>,
    /// Segment applied to the resolver's own source-listing step, only
    /// present in the three-segment form (§9 open question (a)).
    pub resource_filters: Vec<String>,
    pub value_filters: Vec<String>,
    pub column_filters: Vec<String>,
    pub params: Vec<UserParameter>,
    pub hints: Vec<ResolutionHint>,
    pub dry_run: bool,
    pub json: bool,
    pub keys: bool,
    pub debug: bool,
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl ParsedCommand {
    /// True for the bare `awsquery` invocation: list available services
    /// (§6: "`awsquery` with no args lists available services").
    pub fn is_list_services(&self) -> bool {
        self.service.is_none()
    }
}

/// Parse a full argv (including argv[0]) into a [`ParsedCommand`].
pub fn parse<I, T>(args: I) -> Result<ParsedCommand, AwsqueryError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let raw = RawArgs::try_parse_from(args)
        .map_err(|err| AwsqueryError::BadArgument(err.to_string()))?;

    let params = raw
        .param
        .iter()
        .map(|p| UserParameter::parse(p))
        .collect::<Result<Vec<_>, _>>()?;

    let hints = raw
        .hint
        .iter()
        .map(|h| ResolutionHint::parse(h))
        .collect::<Result<Vec<_>, _>>()?;

    let mut tokens = raw.rest.into_iter();
    let service = tokens.next();
    let action = tokens.next();
    let filter_tokens: Vec<String> = tokens.collect();

    let segments: Vec<&[String]> = split_on_separator(&filter_tokens);
    let (resource_filters, value_filters, column_filters) = match segments.as_slice() {
        [] => (Vec::new(), Vec::new(), Vec::new()),
        [values] => (Vec::new(), values.to_vec(), Vec::new()),
        [values, columns] => (Vec::new(), values.to_vec(), columns.to_vec()),
        [resources, values, columns] => (resources.to_vec(), values.to_vec(), columns.to_vec()),
        _ => {
            return Err(AwsqueryError::BadArgument(
                "at most two '--' separators are allowed (resource-filter -- value-filter -- column-filter)"
                    .to_string(),
            ))
        }
    };

    if service.is_some() && action.is_none() {
        return Err(AwsqueryError::BadArgument(
            "an ACTION is required when SERVICE is given".to_string(),
        ));
    }

    Ok(ParsedCommand {
        service,
        action,
        resource_filters,
        value_filters,
        column_filters,
        params,
        hints,
        dry_run: raw.dry_run,
        json: raw.json,
        keys: raw.keys,
        debug: raw.debug,
        region: raw.region,
        profile: raw.profile,
    })
}

/// Split `tokens` on the literal string `"--"`, returning up to three
/// slices (more than two separators is a caller error).
fn split_on_separator(tokens: &[String]) -> Vec<&[String]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, token) in tokens.iter().enumerate() {
        if token == "--" {
            segments.push(&tokens[start..idx]);
            start = idx + 1;
        }
    }
    segments.push(&tokens[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        std::iter::once("awsquery".to_string())
            .chain(s.split_whitespace().map(str::to_string))
            .collect()
    }

    #[test]
    fn no_args_means_list_services() {
        let parsed = parse(args("")).unwrap();
        assert!(parsed.is_list_services());
    }

    #[test]
    fn service_and_action_with_no_separator_are_all_value_filters() {
        let parsed = parse(args("ec2 describe-instances running stopped")).unwrap();
        assert_eq!(parsed.service.as_deref(), Some("ec2"));
        assert_eq!(parsed.action.as_deref(), Some("describe-instances"));
        assert_eq!(parsed.value_filters, vec!["running", "stopped"]);
        assert!(parsed.column_filters.is_empty());
    }

    #[test]
    fn single_separator_splits_value_and_column_filters() {
        let parsed = parse(args("ec2 describe-instances -- InstanceId State.Name")).unwrap();
        assert!(parsed.value_filters.is_empty());
        assert_eq!(parsed.column_filters, vec!["InstanceId", "State.Name"]);
    }

    #[test]
    fn value_filters_precede_the_separator() {
        let parsed = parse(args("ec2 describe-instances running -- InstanceId")).unwrap();
        assert_eq!(parsed.value_filters, vec!["running"]);
        assert_eq!(parsed.column_filters, vec!["InstanceId"]);
    }

    #[test]
    fn two_separators_produce_three_segments() {
        let parsed = parse(args("eks describe-nodegroup prod -- running -- clusterName")).unwrap();
        assert_eq!(parsed.resource_filters, vec!["prod"]);
        assert_eq!(parsed.value_filters, vec!["running"]);
        assert_eq!(parsed.column_filters, vec!["clusterName"]);
    }

    #[test]
    fn more_than_two_separators_is_a_bad_argument() {
        assert!(parse(args("ec2 describe-instances -- a -- b -- c")).is_err());
    }

    #[test]
    fn global_flags_and_repeatable_options_parse() {
        let mut argv = args("--dry-run -j -d eks describe-nodegroup");
        argv.insert(1, "-i".to_string());
        argv.insert(2, "list-clus:cluster".to_string());
        argv.insert(3, "-p".to_string());
        argv.insert(4, "clusterName=prod".to_string());
        let parsed = parse(argv).unwrap();
        assert!(parsed.dry_run);
        assert!(parsed.json);
        assert!(parsed.debug);
        assert_eq!(parsed.hints.len(), 1);
        assert_eq!(parsed.params.len(), 1);
    }

    #[test]
    fn service_without_action_is_a_bad_argument() {
        assert!(parse(args("ec2")).is_err());
    }

    #[test]
    fn kebab_and_snake_case_actions_both_parse_as_raw_tokens() {
        // Canonicalization happens downstream (catalog::actions); the CLI
        // layer just captures whatever spelling the operator typed.
        let a = parse(args("ec2 describe-instances")).unwrap();
        let b = parse(args("ec2 describe_instances")).unwrap();
        assert_eq!(a.action.as_deref(), Some("describe-instances"));
        assert_eq!(b.action.as_deref(), Some("describe_instances"));
    }
}
