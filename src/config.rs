use failure::{Error, ResultExt};
use std::fs;
use std::path::Path;

use crate::{Options, ProviderKind};

/// The configuration file read by the `project-crawler` binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub options: Options,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        debug!("Reading config from {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;

        Config::from_toml(&content)
    }

    pub fn from_toml(src: &str) -> Result<Config, Error> {
        let cfg = toml::from_str(src).context("Invalid config")?;
        Ok(cfg)
    }

    /// A config showing off the available settings.
    pub fn example() -> Config {
        let mut options = Options::default();
        options.token = Some(sec::Secret::new(String::from("<your-api-token>")));
        options.repository = Some(ProviderKind::GitHub);

        Config { options }
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        let serialized =
            toml::to_string_pretty(self).context("Unable to serialize the config")?;
        Ok(serialized)
    }
}
