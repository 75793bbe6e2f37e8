use noughts::session::{validate_username, UsernameError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PREFIX: &str = "noughts";
const FILE_NAME: &str = "client.json";
const DEFAULT_USERNAME: &str = "player";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
    #[error("json: {0}")]
    JSON(#[from] serde_json::Error),
    #[error("xdg: {0}")]
    Xdg(#[from] xdg::BaseDirectoriesError),
    #[error("{0}")]
    Username(#[from] UsernameError),
}

/// Contents of `$XDG_CONFIG_HOME/noughts/client.json`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
}

impl Settings {
    pub fn path() -> Result<Option<PathBuf>, Error> {
        Ok(xdg::BaseDirectories::with_prefix(PREFIX)?.find_config_file(FILE_NAME))
    }

    /// Missing file means defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self, Error> {
        match Self::path()? {
            Some(path) => Self::read(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn read(path: &Path) -> Result<Self, Error> {
        let bytes = std::fs::read(path)?;
        let settings = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %path.display(), ?settings, "Loaded settings");
        Ok(settings)
    }
}

/// Command-line flags; each one beats the settings file.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct Overrides {
    /// Server host [default: 127.0.0.1]
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port [default: 9000]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Name sent to the server [default: $USER]
    #[arg(short, long, global = true)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub username: String,
}

impl Config {
    /// Picks each value from the flags, then the settings file, then the
    /// built-in default. The username must be one the server will accept.
    pub fn resolve(
        settings: Settings,
        overrides: Overrides,
        user: Option<String>,
    ) -> Result<Self, Error> {
        let username = overrides
            .username
            .or(settings.username)
            .or(user)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_owned());
        let username = validate_username(&username)?.to_owned();
        Ok(Self {
            host: overrides
                .host
                .or(settings.host)
                .unwrap_or_else(|| noughts::HOST.to_owned()),
            port: overrides.port.or(settings.port).unwrap_or(noughts::PORT),
            username,
        })
    }

    pub fn address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod settings {
        use super::*;

        #[test]
        fn partial() {
            let settings: Settings = serde_json::from_str(r#"{ "port": 9100 }"#).unwrap();
            assert_eq!(
                settings,
                Settings {
                    port: Some(9100),
                    ..Settings::default()
                }
            );
        }

        #[test]
        fn unknown_key() {
            assert!(serde_json::from_str::<Settings>(r#"{ "prot": 9100 }"#).is_err());
        }

        #[test]
        fn read_from_disk() {
            let path = std::env::temp_dir().join(format!("noughts-{}.json", std::process::id()));
            std::fs::write(&path, r#"{ "host": "10.0.0.2", "username": "zoe" }"#).unwrap();
            let settings = Settings::read(&path);
            std::fs::remove_file(&path).unwrap();

            let settings = settings.unwrap();
            assert_eq!(settings.host.as_deref(), Some("10.0.0.2"));
            assert_eq!(settings.username.as_deref(), Some("zoe"));
            assert_eq!(settings.port, None);
        }
    }

    mod resolve {
        use super::*;

        #[test]
        fn defaults() {
            let config = Config::resolve(Settings::default(), Overrides::default(), None).unwrap();
            assert_eq!(config.address(), ("127.0.0.1", 9000));
            assert_eq!(config.username, "player");
        }

        #[test]
        fn flags_beat_settings_beat_environment() {
            let settings = Settings {
                host: Some("example.org".into()),
                port: Some(9100),
                username: Some("from-file".into()),
            };
            let overrides = Overrides {
                port: Some(9200),
                ..Overrides::default()
            };
            let config = Config::resolve(settings, overrides, Some("from-env".into())).unwrap();
            assert_eq!(config.address(), ("example.org", 9200));
            assert_eq!(config.username, "from-file");
        }

        #[test]
        fn environment_user() {
            let config =
                Config::resolve(Settings::default(), Overrides::default(), Some("ada".into()))
                    .unwrap();
            assert_eq!(config.username, "ada");
        }

        #[test]
        fn blank_username_falls_back() {
            let overrides = Overrides {
                username: Some("  ".into()),
                ..Overrides::default()
            };
            let config = Config::resolve(Settings::default(), overrides, None).unwrap();
            assert_eq!(config.username, "player");
        }

        #[test]
        fn username_the_server_would_refuse() {
            let with_newline = Overrides {
                username: Some("mal\nlory".into()),
                ..Overrides::default()
            };
            assert!(matches!(
                Config::resolve(Settings::default(), with_newline, None),
                Err(Error::Username(UsernameError::ControlCharacter))
            ));

            let settings = Settings {
                username: Some("x".repeat(65)),
                ..Settings::default()
            };
            assert!(matches!(
                Config::resolve(settings, Overrides::default(), None),
                Err(Error::Username(UsernameError::TooLong))
            ));

            assert!(matches!(
                Config::resolve(Settings::default(), Overrides::default(), Some("\u{0300}x".into())),
                Err(Error::Username(UsernameError::AdminPrefix))
            ));
        }
    }
}
