use thiserror::Error;

/// Failures that stop an engine from being constructed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("corpus source not readable: {path}: {source}")]
    SourceNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corpus source is not a well-formed table: {path}: {reason}")]
    SourceUnparseable { path: String, reason: String },
}
