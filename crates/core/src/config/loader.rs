use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Environment variable prefix for overrides, e.g. `REELCAST_CACHE__PASSWORD`.
pub const ENV_PREFIX: &str = "REELCAST_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[catalog]
folder_id = "abc"

[cache]
username = "u"
password = "p"

[distributor]
group_chat_id = "@group"

[publisher]
poll_interval_secs = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.catalog.folder_id, "abc");
        assert_eq!(config.publisher.poll_interval_secs, 5);
    }

    #[test]
    fn test_load_config_from_str_missing_sections() {
        let toml = r#"
[staging]
dir = "/tmp/staging"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/reelcast.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[staging]
dir = "/var/lib/reelcast/staging"

[catalog]
folder_id = "folder-xyz"
access_token = "token"

[cache]
host = "cache.internal"
port = 6380
username = "u"
password = "p"

[distributor]
bot_token = "1:x"
group_chat_id = "-100123"

[publisher]
access_token = "x"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.cache.host, "cache.internal");
        assert_eq!(config.cache.port, 6380);
        assert_eq!(
            config.staging.dir.to_str().unwrap(),
            "/var/lib/reelcast/staging"
        );
    }
}
