//! awsquery — a dynamic-dispatch CLI for read-only AWS API operations.
//!
//! Given a service and an action name, the core here figures out what input
//! parameters the operation needs, resolves any it's missing by calling
//! other list/describe operations on the same service, executes the
//! (possibly fanned-out) call, and renders the flattened result as a table,
//! JSON, or a key listing.
//!
//! # Module map
//!
//! - [`policy`] — read-only action allowlist with wildcard matching.
//! - [`catalog`] — operation shape lookup (required/optional inputs, output root).
//! - [`flatten`] — turns a nested response `Value` into flat [`record::Record`]s.
//! - [`extract`] — pulls scalar values for a (possibly fuzzy) field name.
//! - [`resolver`] — the parameter-resolution core; fans a target call out.
//! - [`invoker`] — executes one concrete operation with pagination.
//! - [`sdk`] — per-service dispatch over the real AWS SDK crates.
//! - [`filter`] — value/column filtering and default column selection.
//! - [`render`] — table/JSON/keys output.
//! - [`cli`] — argument grammar.
//! - [`error`] — error kinds and their exit codes.

pub mod catalog;
pub mod cli;
pub mod error;
pub mod extract;
pub mod filter;
pub mod flatten;
pub mod invoker;
pub mod params;
pub mod policy;
pub mod record;
pub mod render;
pub mod resolver;
pub mod run;
pub mod sdk;

pub use error::{AwsqueryError, ExitCode};
pub use record::Record;
