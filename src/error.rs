//! Error taxonomy for awsquery.
//!
//! Each variant maps to exactly one exit code and one user-facing line, per
//! the error handling design: policy denial, unresolvable parameters, SDK
//! failures, catalog misses, and CLI parse failures are distinct failure
//! modes with distinct exit codes, never collapsed into a generic "error".

use std::fmt;

/// Process exit code, mirroring the table in the error handling design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Other = 1,
    PolicyDenied = 2,
    UnresolvableParameter = 3,
    SdkError = 4,
    Interrupted = 130,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AwsqueryError {
    #[error("policy denied: {service}:{action} is not allowed")]
    PolicyDenied { service: String, action: String },

    #[error("could not resolve required parameter '{field}' for {service}:{action}{}", trace_suffix(.trace))]
    UnresolvableParameter {
        service: String,
        action: String,
        field: String,
        trace: Vec<String>,
    },

    #[error("{service}:{action} failed: {code}: {message}")]
    SdkError {
        service: String,
        action: String,
        code: String,
        message: String,
    },

    #[error("unknown service: {service}{}", suggestion_suffix(.suggestion))]
    UnknownService {
        service: String,
        suggestion: Option<String>,
    },

    #[error("unknown action: {service}:{action}{}", suggestion_suffix(.suggestion))]
    UnknownAction {
        service: String,
        action: String,
        suggestion: Option<String>,
    },

    #[error("bad argument: {0}")]
    BadArgument(String),
}

fn trace_suffix(trace: &[String]) -> String {
    if trace.is_empty() {
        String::new()
    } else {
        format!(" (resolver path: {})", trace.join(" -> "))
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(candidate) => format!(" (did you mean '{candidate}'?)"),
        None => String::new(),
    }
}

impl AwsqueryError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AwsqueryError::PolicyDenied { .. } => ExitCode::PolicyDenied,
            AwsqueryError::UnresolvableParameter { .. } => ExitCode::UnresolvableParameter,
            AwsqueryError::SdkError { .. } => ExitCode::SdkError,
            AwsqueryError::UnknownService { .. } | AwsqueryError::UnknownAction { .. } => {
                ExitCode::SdkError
            }
            AwsqueryError::BadArgument(_) => ExitCode::Other,
        }
    }
}

/// Convert a top-level `anyhow::Error` chain into an exit code, falling back
/// to `Other` when the failure didn't originate from a known
/// [`AwsqueryError`] (e.g. an I/O error reading the policy file).
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<AwsqueryError>()
        .map(AwsqueryError::exit_code)
        .unwrap_or(ExitCode::Other)
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_denied_maps_to_exit_2() {
        let err = AwsqueryError::PolicyDenied {
            service: "ec2".into(),
            action: "TerminateInstances".into(),
        };
        assert_eq!(err.exit_code(), ExitCode::PolicyDenied);
        assert_eq!(err.exit_code().code(), 2);
    }

    #[test]
    fn unresolvable_parameter_maps_to_exit_3() {
        let err = AwsqueryError::UnresolvableParameter {
            service: "eks".into(),
            action: "DescribeNodegroup".into(),
            field: "clusterName".into(),
            trace: vec!["eks:ListClusters".into()],
        };
        assert_eq!(err.exit_code(), ExitCode::UnresolvableParameter);
        assert!(err.to_string().contains("resolver path"));
    }

    #[test]
    fn sdk_error_maps_to_exit_4() {
        let err = AwsqueryError::SdkError {
            service: "s3".into(),
            action: "ListBuckets".into(),
            code: "AccessDenied".into(),
            message: "no".into(),
        };
        assert_eq!(err.exit_code(), ExitCode::SdkError);
    }

    #[test]
    fn unknown_action_includes_suggestion_when_present() {
        let err = AwsqueryError::UnknownAction {
            service: "eks".into(),
            action: "DescribeClustre".into(),
            suggestion: Some("DescribeCluster".into()),
        };
        assert!(err.to_string().contains("did you mean 'DescribeCluster'?"));
    }

    #[test]
    fn unknown_action_omits_suggestion_when_absent() {
        let err = AwsqueryError::UnknownAction {
            service: "eks".into(),
            action: "Xyz".into(),
            suggestion: None,
        };
        assert!(!err.to_string().contains("did you mean"));
    }

    #[test]
    fn exit_code_for_unwraps_anyhow_chain() {
        let wrapped = anyhow::Error::new(AwsqueryError::BadArgument("bad -p".into()))
            .context("while parsing arguments");
        assert_eq!(exit_code_for(&wrapped), ExitCode::Other);
    }
}
