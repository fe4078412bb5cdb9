use thiserror::Error;

/// Canonical error type exposed by the core primitives.
#[derive(Debug, Error)]
pub enum PartNetError {
    /// A part addressed a slot outside the header's range.
    #[error("part index {index} out of range for a set of {total} parts")]
    InvalidIndex { index: usize, total: usize },

    /// A part's membership proof failed against the committed root. Covers
    /// tampered sibling digests and tampered chunk bytes alike; the two are
    /// indistinguishable to the verifier.
    #[error("part {index} does not match the committed root")]
    InvalidProof { index: usize },

    /// Reconstruction was requested before every slot was filled.
    #[error("part set is incomplete ({count}/{total} parts present)")]
    NotComplete { count: usize, total: usize },

    /// Build-side partitioning rejected its input.
    #[error("partition error: {0}")]
    Partition(&'static str),

    /// Merkle tree builder failure.
    #[error("merkle error: {0}")]
    Merkle(String),
}
