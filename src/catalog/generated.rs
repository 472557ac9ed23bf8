//! Curated operation-shape table.
//!
//! A production build of this tool would generate this table at build time
//! from the AWS service model JSONs (one JSON file per service, shipped
//! inside each `aws-sdk-*` crate) the way `aws-sdk-codegen` itself does —
//! see the design notes this crate was built from. Hand-maintaining a table
//! the size of the full AWS surface isn't practical for this exercise, so
//! this module hand-authors shapes for the services the bundled `sdk`
//! dispatch actually implements. Extending either one to a new operation
//! means adding an entry here and a match arm in `sdk::services`.
//!
//! A couple of entries diverge from the real AWS API in one respect:
//! `iam:ListAccessKeys`'s `UserName` is optional in the real service (it
//! defaults to the caller's own user) but is modeled here as required, so
//! that invoking it without `-p UserName=...` drives the resolver to fan
//! out over `iam:ListUsers` the way an operator actually wants when
//! auditing access keys account-wide.

use super::model::{FieldKind, InputField, OperationShape};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// The full table, built once on first lookup (§3: "the service catalog may
/// be lazily instantiated once per service on first use"). A real build
/// would derive this per-service from the AWS model JSONs on demand; since
/// every service here is hand-curated anyway, caching the whole table behind
/// one `Lazy` costs nothing extra and avoids re-allocating every shape's
/// `Vec<InputField>` on every `describe`/`list_operations` call.
static TABLE: Lazy<HashMap<&'static str, Vec<OperationShape>>> = Lazy::new(build_table);

pub fn describe(service: &str, action: &str) -> Option<OperationShape> {
    let action = super::actions::canonical_action(action);
    operations(service)
        .iter()
        .find(|op| op.action == action)
        .cloned()
}

pub fn list_operations(service: &str) -> Vec<String> {
    operations(service).iter().map(|op| op.action.clone()).collect()
}

pub fn list_services() -> Vec<&'static str> {
    vec!["ec2", "eks", "iam", "s3", "ssm", "cloudformation", "lambda"]
}

fn operations(service: &str) -> &'static [OperationShape] {
    TABLE.get(service).map(Vec::as_slice).unwrap_or(&[])
}

fn shape(
    service: &str,
    action: &str,
    inputs: Vec<InputField>,
    output_list_key: Option<&str>,
) -> OperationShape {
    OperationShape {
        service: service.to_string(),
        action: action.to_string(),
        inputs,
        output_list_key: output_list_key.map(str::to_string),
    }
}

fn build_table() -> HashMap<&'static str, Vec<OperationShape>> {
    list_services()
        .into_iter()
        .map(|service| (service, operations_for(service)))
        .collect()
}

fn operations_for(service: &str) -> Vec<OperationShape> {
    match service {
        "ec2" => vec![
            shape("ec2", "DescribeInstances", vec![], Some("Reservations")),
            shape(
                "ec2",
                "DescribeSecurityGroups",
                vec![],
                Some("SecurityGroups"),
            ),
            shape("ec2", "DescribeVpcs", vec![], Some("Vpcs")),
        ],
        "eks" => vec![
            shape("eks", "ListClusters", vec![], Some("clusters")),
            shape(
                "eks",
                "DescribeCluster",
                vec![InputField::required("name", FieldKind::Scalar)],
                None,
            ),
            shape(
                "eks",
                "ListNodegroups",
                vec![InputField::required("clusterName", FieldKind::Scalar)],
                Some("nodegroups"),
            ),
            shape(
                "eks",
                "DescribeNodegroup",
                vec![
                    InputField::required("clusterName", FieldKind::Scalar),
                    InputField::required("nodegroupName", FieldKind::Scalar),
                ],
                None,
            ),
        ],
        "iam" => vec![
            shape("iam", "ListUsers", vec![], Some("Users")),
            shape(
                "iam",
                "ListAccessKeys",
                vec![InputField::required("UserName", FieldKind::Scalar)],
                Some("AccessKeyMetadata"),
            ),
        ],
        "s3" => vec![shape("s3", "ListBuckets", vec![], Some("Buckets"))],
        "ssm" => vec![
            shape(
                "ssm",
                "DescribeParameters",
                vec![],
                Some("Parameters"),
            ),
            shape(
                "ssm",
                "GetParameters",
                vec![InputField::required("Names", FieldKind::List)],
                Some("Parameters"),
            ),
        ],
        "cloudformation" => vec![
            shape(
                "cloudformation",
                "ListStacks",
                vec![],
                Some("StackSummaries"),
            ),
            shape(
                "cloudformation",
                "DescribeStacks",
                vec![InputField::optional("StackName", FieldKind::Scalar)],
                Some("Stacks"),
            ),
        ],
        "lambda" => vec![shape("lambda", "ListFunctions", vec![], Some("Functions"))],
        _ => vec![],
    }
}
