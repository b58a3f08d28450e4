use std::path::Path;

use tokio::io::AsyncReadExt;

use super::{Config, ConfigError};

/// Serialization of a loaded configuration
pub trait ConfigExt {
    /// Render the configuration as pretty-printed TOML
    fn to_string(&self) -> Result<String, toml::ser::Error>;
}

impl ConfigExt for Config {
    fn to_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Config {
    /// Load a configuration file
    ///
    /// Files with a `.toml` extension are parsed as TOML, anything else as
    /// JSON.
    pub async fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut full = String::new();
        file.read_to_string(&mut full).await?;

        let is_toml = path
            .extension()
            .map_or(false, |extension| extension.eq_ignore_ascii_case("toml"));

        if is_toml {
            Ok(toml::from_str(&full)?)
        } else {
            Ok(serde_json::from_str(&full)?)
        }
    }
}
