//! Git transport handling for project imports
//!
//! Wraps libgit2 for the handful of operations an import needs: cloning a
//! checkout, committing its whole working tree and force-pushing it back.

pub mod error;
pub mod plugin;
pub mod services;

pub use error::{GitError, GitResult};
pub use plugin::GitPlugin;
pub use services::repo_handler::{
    CheckoutRole, GitCredentials, GitSettings, PushSummary, RepoHandler,
};
pub use services::transport_url::TransportUrl;
