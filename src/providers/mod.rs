//! The providers which are always available.

mod github;
mod gitlab;

pub use self::github::{GitHub, GitHubBuilder};
pub use self::gitlab::{GitLab, GitLabBuilder};

use crate::RepositoryManagementBuilder;

/// The branch reported when a provider doesn't tell us a repository's
/// default branch (e.g. an empty GitLab project).
pub const DEFAULT_BRANCH: &str = "master";

static DEFAULT_BUILDERS: [&dyn RepositoryManagementBuilder; 2] = [&GitHubBuilder, &GitLabBuilder];

/// The built-in builders, in the order they are tried.
pub fn default_builders() -> &'static [&'static dyn RepositoryManagementBuilder] {
    &DEFAULT_BUILDERS
}
