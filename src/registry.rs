//! Registration of third-party [`RepositoryManagementBuilder`]s.
//!
//! Builders added to the [`global()`] registry are consulted by every
//! [`ProjectCrawler`] before the built-in providers, in the order they were
//! registered. This lets other crates teach the crawler about new hosting
//! providers without touching this one, typically by calling [`register()`]
//! at the top of `main()`.
//!
//! [`ProjectCrawler`]: crate::ProjectCrawler

use crate::RepositoryManagementBuilder;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

lazy_static! {
    static ref GLOBAL: Arc<Registry> = Arc::new(Registry::new());
}

/// The process-wide registry used by [`ProjectCrawler::new()`].
///
/// [`ProjectCrawler::new()`]: crate::ProjectCrawler::new
pub fn global() -> Arc<Registry> {
    Arc::clone(&GLOBAL)
}

/// Add a builder to the [`global()`] registry.
pub fn register<B>(builder: B)
where
    B: RepositoryManagementBuilder + 'static,
{
    GLOBAL.register(builder);
}

/// An ordered collection of builders.
#[derive(Default)]
pub struct Registry {
    builders: RwLock<Vec<Arc<dyn RepositoryManagementBuilder>>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register<B>(&self, builder: B)
    where
        B: RepositoryManagementBuilder + 'static,
    {
        debug!("Registering the \"{}\" builder", builder.name());

        self.builders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(builder));
    }

    /// A snapshot of the registered builders, in registration order.
    pub fn builders(&self) -> Vec<Arc<dyn RepositoryManagementBuilder>> {
        self.builders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.builders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let builders = self.builders();
        f.debug_list()
            .entries(builders.iter().map(|b| b.name()))
            .finish()
    }
}
