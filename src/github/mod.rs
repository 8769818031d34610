//! GitHub API wire shapes served by the mock.

pub mod types;

pub use types::{
    github_timestamp, ContentFile, ErrorEnvelope, FileDiffRecord, FileStatus, RepoLinks,
    Repository, User,
};
