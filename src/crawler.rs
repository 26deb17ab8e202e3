use failure::Error;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::errors::NoMatchingProvider;
use crate::providers;
use crate::registry::{self, Registry};
use crate::{Options, Repository, RepositoryManagement, RepositoryManagementBuilder};

/// Entry point which wraps around every available [`RepositoryManagement`]
/// implementation.
///
/// Each call looks for a provider afresh: builders from the [`Registry`]
/// are asked first, in registration order, then the built-in GitHub and
/// GitLab builders. Whatever the first applicable provider returns
/// (including errors) is handed straight back to the caller.
#[derive(Clone)]
pub struct ProjectCrawler {
    options: Options,
    registry: Arc<Registry>,
    defaults: &'static [&'static dyn RepositoryManagementBuilder],
}

impl ProjectCrawler {
    /// Create a crawler which uses the [global registry](registry::global).
    pub fn new(options: Options) -> ProjectCrawler {
        ProjectCrawler::with_registry(options, registry::global())
    }

    pub fn with_registry(options: Options, registry: Arc<Registry>) -> ProjectCrawler {
        ProjectCrawler {
            options,
            registry,
            defaults: providers::default_builders(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Find the first provider which accepts our [`Options`].
    pub fn resolve(&self) -> Result<Box<dyn RepositoryManagement>, Error> {
        let discovered = self.registry.builders();

        if let Some(management) =
            first_matching(discovered.iter().map(|b| &**b), &self.options)?
        {
            return Ok(management);
        }

        match first_matching(self.defaults.iter().cloned(), &self.options)? {
            Some(management) => Ok(management),
            None => Err(NoMatchingProvider {
                root_url: self.options.root_url.clone(),
            }
            .into()),
        }
    }
}

impl RepositoryManagement for ProjectCrawler {
    fn repositories(&self, organization: &str) -> Result<Vec<Repository>, Error> {
        self.resolve()?.repositories(organization)
    }

    fn file_content(
        &self,
        organization: &str,
        repository: &str,
        branch: &str,
        file_path: &str,
    ) -> Result<String, Error> {
        self.resolve()?
            .file_content(organization, repository, branch, file_path)
    }
}

impl Debug for ProjectCrawler {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let defaults: Vec<&str> = self.defaults.iter().map(|b| b.name()).collect();

        f.debug_struct("ProjectCrawler")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("defaults", &defaults)
            .finish()
    }
}

fn first_matching<'a, I>(
    builders: I,
    options: &Options,
) -> Result<Option<Box<dyn RepositoryManagement>>, Error>
where
    I: IntoIterator<Item = &'a (dyn RepositoryManagementBuilder + 'static)>,
{
    for builder in builders {
        trace!("Asking the \"{}\" builder about {}", builder.name(), options.root_url);

        if let Some(management) = builder.build(options)? {
            debug!("Using the \"{}\" provider for {}", builder.name(), options.root_url);
            return Ok(Some(management));
        }
    }

    Ok(None)
}
