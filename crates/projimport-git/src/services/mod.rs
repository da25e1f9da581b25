pub mod repo_handler;
pub mod transport_url;
