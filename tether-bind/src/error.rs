/// Failures surfaced by rendering and rehydration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Existing markup does not line up with what the template produces.
    #[error("structural mismatch at {path}: expected {expected}, found {found}")]
    StructuralMismatch {
        path: String,
        expected: String,
        found: String,
    },
    /// An asynchronous value settled to something its position cannot show.
    #[error("asynchronous value for {slot} settled to unrenderable {found}")]
    Unrenderable { slot: &'static str, found: String },
    #[error("asynchronous value rejected: {0}")]
    Rejected(String),
    #[error("pending value was already consumed")]
    AlreadyConsumed,
}
