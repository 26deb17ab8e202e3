use crate::{Options, Repository};
use failure::Error;

/// Something which knows how to query a source hosting provider.
pub trait RepositoryManagement {
    /// Get every repository belonging to an organisation.
    fn repositories(&self, organization: &str) -> Result<Vec<Repository>, Error>;

    /// Read a file from a particular branch of a repository.
    fn file_content(
        &self,
        organization: &str,
        repository: &str,
        branch: &str,
        file_path: &str,
    ) -> Result<String, Error>;
}

/// A factory which inspects some [`Options`] and, if they belong to its
/// provider, creates a [`RepositoryManagement`] bound to them.
pub trait RepositoryManagementBuilder: Send + Sync {
    /// A human-friendly name used in log messages.
    fn name(&self) -> &str;

    /// Try to create a provider for these options.
    ///
    /// Returning `Ok(None)` means "not mine". An error should only be
    /// returned when the builder recognises the options but they're invalid.
    fn build(
        &self,
        options: &Options,
    ) -> Result<Option<Box<dyn RepositoryManagement>>, Error>;
}
