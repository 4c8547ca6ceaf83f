use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed reading scene document: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scene document: {0}")]
    MalformedDocument(String),

    #[error("dangling reference '{reference}' in {section}")]
    DanglingReference { reference: String, section: String },

    #[error("could not determine shader type for material url '{0}'")]
    UnresolvedShaderType(String),

    #[error("no content roots configured")]
    ContentRootNotFound,
}

pub type Result<T> = std::result::Result<T, ResolveError>;
