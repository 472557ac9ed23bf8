//! Top-level orchestration: wires the CLI-parsed command through the
//! Policy Gate, Parameter Resolver, Invoker, Filter & Projection Engine,
//! and a renderer. Kept separate from `main` so it can be driven by tests
//! without touching `std::env`/`std::process`.

use crate::catalog::{ServiceCatalog, StaticCatalog};
use crate::cli::ParsedCommand;
use crate::error::{exit_code_for, AwsqueryError, ExitCode};
use crate::filter::{apply_value_filters, default_columns, resolve_columns};
use crate::invoker::{InvokeOutcome, Invoker};
use crate::params::merge_user_parameters;
use crate::policy::PolicyGate;
use crate::record::Record;
use crate::render::{render_json, render_keys, render_table};
use crate::resolver::Resolver;
use crate::sdk::{load_config, Registry};
use anyhow::Result;

/// Run one parsed command to completion, returning the process exit code.
/// Never panics on a recoverable failure — every `AwsqueryError` variant
/// maps to a distinct code via [`exit_code_for`].
pub async fn run(cmd: ParsedCommand, policy: &PolicyGate) -> Result<i32> {
    let catalog = StaticCatalog;

    if cmd.is_list_services() {
        return list_services(&catalog, policy);
    }

    let service = cmd.service.as_deref().expect("checked by is_list_services");
    let action = cmd.action.as_deref().expect("CLI requires ACTION with SERVICE");

    policy.check(service, action).map_err(anyhow::Error::from)?;

    let config = load_config(cmd.region.as_deref(), cmd.profile.as_deref()).await;
    let registry = Registry::new();
    let invoker = Invoker::new(registry);
    let resolver = Resolver { catalog: &catalog, policy, invoker: &invoker, config: &config };

    let user_params = merge_user_parameters(&cmd.params);

    let outcome = resolver
        .resolve(service, action, &user_params, &cmd.hints, &cmd.resource_filters)
        .await
        .map_err(|err| {
            if cmd.debug {
                if let AwsqueryError::UnresolvableParameter { trace, .. } = &err {
                    for line in trace {
                        eprintln!("[DEBUG] {line}");
                    }
                }
            }
            anyhow::Error::from(err)
        })?;

    let (outcomes, call_errors) = invoker
        .invoke_fan_out(service, action, outcome.param_maps, &config, cmd.dry_run)
        .await;

    for error in &call_errors {
        eprintln!("error: {error}");
    }

    if cmd.dry_run {
        for result in outcomes {
            if let InvokeOutcome::DryRun(line) = result {
                println!("{line}");
            }
        }
        return Ok(ExitCode::Success.code());
    }

    let mut records: Vec<Record> = Vec::new();
    for result in outcomes {
        if let InvokeOutcome::Records(rs) = result {
            records.extend(rs);
        }
    }

    let filtered: Vec<Record> = if cmd.value_filters.is_empty() {
        records
    } else {
        apply_value_filters(&records, &cmd.value_filters).into_iter().cloned().collect()
    };

    render_output(&cmd, &filtered)?;

    // A fan-out that partially failed still renders what succeeded, but a
    // caller scripting against this tool should see it in the exit code.
    if !call_errors.is_empty() {
        return Ok(ExitCode::SdkError.code());
    }

    Ok(ExitCode::Success.code())
}

fn render_output(cmd: &ParsedCommand, records: &[Record]) -> Result<()> {
    if cmd.keys {
        println!("{}", render_keys(records));
        return Ok(());
    }

    if cmd.json {
        let columns = (!cmd.column_filters.is_empty())
            .then(|| resolve_columns(records, &cmd.column_filters, cmd.debug));
        println!("{}", render_json(records, columns.as_deref())?);
        return Ok(());
    }

    let columns = if cmd.column_filters.is_empty() {
        default_columns(records)
    } else {
        resolve_columns(records, &cmd.column_filters, cmd.debug)
    };
    println!("{}", render_table(records, &columns));
    Ok(())
}

fn list_services(catalog: &dyn ServiceCatalog, policy: &PolicyGate) -> Result<i32> {
    let mut services: Vec<String> = catalog
        .list_services()
        .into_iter()
        .filter(|service| {
            catalog
                .list_operations(service)
                .iter()
                .any(|action| policy.is_allowed(service, action))
        })
        .collect();
    services.sort();
    for service in services {
        println!("{service}");
    }
    Ok(ExitCode::Success.code())
}

/// Map a top-level run failure to its exit code, used by `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    exit_code_for(err).code()
}
