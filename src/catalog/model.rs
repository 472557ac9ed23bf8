//! Operation shape types: the machine-readable description of an
//! operation's inputs and outputs that the resolver reasons over.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Scalar,
    List,
    Struct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub name: String,
    pub required: bool,
    pub kind: FieldKind,
}

impl InputField {
    pub fn required(name: &str, kind: FieldKind) -> Self {
        Self { name: name.to_string(), required: true, kind }
    }

    pub fn optional(name: &str, kind: FieldKind) -> Self {
        Self { name: name.to_string(), required: false, kind }
    }
}

/// Input/output description of one operation, as reported by
/// [`crate::catalog::ServiceCatalog::describe`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationShape {
    pub service: String,
    /// Canonical (CamelCase) action name.
    pub action: String,
    pub inputs: Vec<InputField>,
    /// Response key under which the primary list lives, e.g. `Reservations`.
    /// `None` means the whole response is the record (§3 OperationShape).
    pub output_list_key: Option<String>,
}

impl OperationShape {
    pub fn required_fields(&self) -> impl Iterator<Item = &InputField> {
        self.inputs.iter().filter(|f| f.required)
    }

    pub fn field(&self, name: &str) -> Option<&InputField> {
        self.inputs.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// An operation with no required inputs can be called with no
    /// resolution at all — the resolver's "parameter-free listing op"
    /// candidate filter (§4.E step 2a) relies on this.
    pub fn takes_no_required_params(&self) -> bool {
        self.required_fields().next().is_none()
    }
}
