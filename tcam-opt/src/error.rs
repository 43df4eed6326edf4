use tcam_filter::FilterError;

/// Caller errors, reported synchronously through `Result`. Algorithmic
/// preconditions (matching success, a chosen bit existing, expansion-map
/// consistency) are not represented here: a violation of one of those is a
/// bug in this crate and panics instead, per the crate's error-handling
/// design.
#[derive(Debug, thiserror::Error)]
pub enum TcamError {
    #[error("rule table must not be empty")]
    EmptyInput,
    #[error(transparent)]
    Filter(#[from] FilterError),
}

pub type Result<T> = std::result::Result<T, TcamError>;
