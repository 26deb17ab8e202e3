//! Find repositories and read files from whichever source hosting provider
//! claims a particular root URL.
//!
//! The [`ProjectCrawler`] doesn't know how to talk to anything itself. Every
//! time you call one of its methods it asks each registered
//! [`RepositoryManagementBuilder`] whether it recognises the [`Options`],
//! trying builders added through [`registry::register()`] first and then the
//! built-in GitHub and GitLab providers. The first builder to say yes gets
//! the call.
//!
//! ```rust,no_run
//! # use project_crawler::{Options, ProjectCrawler, RepositoryManagement};
//! # fn main() -> Result<(), failure::Error> {
//! let options = Options::builder()
//!     .root_url("https://github.com/")
//!     .exclude("^.*-archived$")
//!     .build()?;
//! let crawler = ProjectCrawler::new(options);
//!
//! for repo in crawler.repositories("cloudpipelines")? {
//!     println!("{}", repo.name);
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod config;
mod crawler;
pub mod errors;
mod management;
mod options;
pub mod providers;
pub mod registry;
mod repository;
mod utils;

pub use crate::config::Config;
pub use crate::crawler::ProjectCrawler;
pub use crate::errors::{FailedRequest, InvalidPath, InvalidRootUrl, NoMatchingProvider};
pub use crate::management::{RepositoryManagement, RepositoryManagementBuilder};
pub use crate::options::{Exclusions, Options, OptionsBuilder, ProviderKind};
pub use crate::registry::Registry;
pub use crate::repository::Repository;
