use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Invalid transport URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Source repository cannot be modified")]
    SourceImmutable,

    #[error("Repository {0} has not been cloned yet")]
    NotCloned(String),

    #[error("HEAD of {0} is detached, cannot determine the branch to push")]
    DetachedHead(String),

    #[error("Push to {remote} rejected: {message}")]
    PushRejected { remote: String, message: String },

    #[error("Git error: {}", .0.message())]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type GitResult<T> = Result<T, GitError>;
