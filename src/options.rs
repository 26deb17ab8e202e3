use failure::{Error, ResultExt};
use regex::RegexSet;
use sec::Secret;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// The root URL used when nothing else is configured.
pub const DEFAULT_ROOT_URL: &str = "https://github.com/";

/// Everything a [`RepositoryManagementBuilder`] needs to decide whether it
/// can handle a request, and everything the resulting provider needs to
/// talk to its server.
///
/// [`RepositoryManagementBuilder`]: crate::RepositoryManagementBuilder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[serde(rename_all = "kebab-case")]
pub struct Options {
    /// The base address of the hosting provider (e.g. `https://github.com/`
    /// or `https://gitlab.example.com/`).
    pub root_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Secret<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<Secret<String>>,
    /// Explicitly pick a provider instead of guessing from the root URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<ProviderKind>,
    /// Repositories whose name matches any of these patterns are skipped.
    pub exclude: Exclusions,
}

impl Options {
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Should the repository with this name be reported?
    pub fn is_included(&self, name: &str) -> bool {
        !self.exclude.is_match(name)
    }

    /// Do these options point at a particular kind of provider?
    ///
    /// An explicitly configured `repository` always wins, otherwise we look
    /// for the provider's name somewhere in the root URL.
    pub fn targets(&self, kind: ProviderKind) -> bool {
        match self.repository {
            Some(explicit) => explicit == kind,
            None => self.root_url.to_lowercase().contains(kind.marker()),
        }
    }
}

impl Default for Options {
    fn default() -> Options {
        Options {
            root_url: DEFAULT_ROOT_URL.to_string(),
            username: None,
            password: None,
            token: None,
            repository: None,
            exclude: Exclusions::default(),
        }
    }
}

/// Incrementally construct a set of [`Options`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    root_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
    repository: Option<ProviderKind>,
    exclude: Vec<String>,
}

impl OptionsBuilder {
    pub fn root_url<S: Into<String>>(mut self, root_url: S) -> Self {
        self.root_url = Some(root_url.into());
        self
    }

    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn token<S: Into<String>>(mut self, token: S) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn repository(mut self, kind: ProviderKind) -> Self {
        self.repository = Some(kind);
        self
    }

    /// Skip any repository whose name matches this regular expression.
    pub fn exclude<S: Into<String>>(mut self, pattern: S) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn build(self) -> Result<Options, Error> {
        let exclude = Exclusions::new(self.exclude)?;

        Ok(Options {
            root_url: self
                .root_url
                .unwrap_or_else(|| DEFAULT_ROOT_URL.to_string()),
            username: self.username,
            password: self.password.map(Secret::new),
            token: self.token.map(Secret::new),
            repository: self.repository,
            exclude,
        })
    }
}

/// The well-known hosting providers this crate ships with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl ProviderKind {
    fn marker(self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.marker())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<ProviderKind, Error> {
        match s.to_lowercase().as_str() {
            "github" => Ok(ProviderKind::GitHub),
            "gitlab" => Ok(ProviderKind::GitLab),
            other => Err(failure::format_err!("Unknown provider \"{}\"", other)),
        }
    }
}

/// A compiled set of exclusion patterns.
#[derive(Debug, Clone)]
pub struct Exclusions(RegexSet);

impl Exclusions {
    pub fn new<I, S>(patterns: I) -> Result<Exclusions, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = RegexSet::new(patterns)
            .context("Unable to compile the exclusion patterns")?;
        Ok(Exclusions(set))
    }

    pub fn patterns(&self) -> &[String] {
        self.0.patterns()
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

impl Default for Exclusions {
    fn default() -> Exclusions {
        Exclusions(RegexSet::empty())
    }
}

impl PartialEq for Exclusions {
    fn eq(&self, other: &Exclusions) -> bool {
        self.patterns() == other.patterns()
    }
}

mod exclusions_serde_shim {
    use super::Exclusions;
    use serde::de::{Deserialize, Deserializer, Error as DeError};
    use serde::ser::{Serialize, Serializer};

    impl Serialize for Exclusions {
        fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
            self.patterns().serialize(ser)
        }
    }

    impl<'de> Deserialize<'de> for Exclusions {
        fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Exclusions, D::Error> {
            let patterns = Vec::<String>::deserialize(de)?;
            Exclusions::new(&patterns).map_err(D::Error::custom)
        }
    }
}
