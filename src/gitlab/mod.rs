//! GitLab REST API access: the HTTP client and the error taxonomy every
//! tool reports its failures through.

pub mod client;
pub mod error;

pub use client::GitLabClient;
pub use error::GitLabError;
