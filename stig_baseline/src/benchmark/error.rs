/// Benchmark binding errors
///
/// Raised when the generic document tree is missing required structure.
/// Scalar fields default to empty strings instead of failing; list-valued
/// fields are required because a benchmark without groups or profiles is
/// meaningless.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Benchmark document has no '{field}' element")]
    MissingDocumentRoot { field: String },

    #[error("{entity} is missing required '{field}' list")]
    MissingList { entity: String, field: String },

    #[error("{entity} '{field}' must be a mapping, found {actual}")]
    MalformedEntry {
        entity: String,
        field: String,
        actual: String,
    },

    #[error(
        "Profile '{profile}' select '{idref}' does not resolve to any group id in the benchmark"
    )]
    UnresolvedSelect { profile: String, idref: String },
}

impl ParseError {
    pub fn missing_list(entity: &str, field: &str) -> Self {
        Self::MissingList {
            entity: entity.to_string(),
            field: field.to_string(),
        }
    }

    pub fn malformed_entry(entity: &str, field: &str, actual: &str) -> Self {
        Self::MalformedEntry {
            entity: entity.to_string(),
            field: field.to_string(),
            actual: actual.to_string(),
        }
    }
}
