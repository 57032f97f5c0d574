//! Engine errors

/// Failure to resolve a player surface in the document.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocateError {
    #[error("element {selector:?} not found within {timeout_ms}ms")]
    NotFound { selector: String, timeout_ms: u64 },

    #[error("no selector resolved: {tried:?}")]
    NoneResolved { tried: Vec<String> },
}

/// Failure while establishing a binding.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// A resolved element left the document between resolution and binding.
    #[error("resolved element left the document before binding")]
    StaleResolution,
}
