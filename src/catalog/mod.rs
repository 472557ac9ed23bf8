//! Service Catalog Adapter (§4.B): enumerate services, enumerate operations
//! per service, and describe an operation's input/output shape.

pub mod actions;
mod generated;
pub mod model;

pub use model::{FieldKind, InputField, OperationShape};

/// Trait boundary so the resolver can be tested against a stub catalog
/// without touching the real AWS service model table.
pub trait ServiceCatalog {
    fn list_services(&self) -> Vec<String>;
    fn list_operations(&self, service: &str) -> Vec<String>;
    fn describe(&self, service: &str, action: &str) -> Option<OperationShape>;
}

/// The catalog backed by the curated, hand-authored operation table in
/// [`generated`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticCatalog;

impl ServiceCatalog for StaticCatalog {
    fn list_services(&self) -> Vec<String> {
        generated::list_services()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn list_operations(&self, service: &str) -> Vec<String> {
        let service = actions::canonical_service(service);
        generated::list_operations(&service)
    }

    fn describe(&self, service: &str, action: &str) -> Option<OperationShape> {
        let service = actions::canonical_service(service);
        generated::describe(&service, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_catalog_lists_known_services() {
        let catalog = StaticCatalog;
        let services = catalog.list_services();
        assert!(services.contains(&"eks".to_string()));
        assert!(services.contains(&"s3".to_string()));
    }

    #[test]
    fn static_catalog_describes_case_insensitively() {
        let catalog = StaticCatalog;
        let shape = catalog.describe("EKS", "describe-nodegroup").unwrap();
        assert_eq!(shape.action, "DescribeNodegroup");
    }
}
