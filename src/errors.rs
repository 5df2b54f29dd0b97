use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no such file: {1}")]
    NoSuchFile(std::io::Error, String),

    #[error("bad storage config: {0}")]
    BadConfig(String),

    #[error("bad system description: {0}")]
    BadSystem(String),

    #[error("bad product definition: {0}")]
    BadProduct(String),

    #[error("bad config model: {0}")]
    BadModel(String),

    #[error("bad size: {0}")]
    BadSize(String),

    #[error("bad cli arguments: {0}")]
    BadArgs(String),

    #[error("storage config has {0} error(s)")]
    ValidationFailed(usize),
}
