/// Errors raised while deriving an occurrence signature.
///
/// Report calls never propagate these; a failed extraction turns the call into
/// a silent no-op.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityExtractionError {
    /// The subject carries no name at all.
    #[error("{kind} has no name")]
    MissingName { kind: String },

    /// A custom extractor rejected the subject.
    #[error("cannot extract identity: {0}")]
    Rejected(String),
}
