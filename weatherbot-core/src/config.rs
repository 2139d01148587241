use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const TELEGRAM_TOKEN_ENV: &str = "WEATHERBOT_TELEGRAM_TOKEN";
pub const OPENWEATHER_API_KEY_ENV: &str = "WEATHERBOT_OPENWEATHER_API_KEY";
pub const DB_PATH_ENV: &str = "WEATHERBOT_DB_PATH";

const DEFAULT_DB_FILE: &str = "requests.db";

/// On-disk configuration. Every field is optional here; validation
/// happens when the runtime [`Config`] is assembled.
///
/// Example TOML:
/// ```toml
/// telegram_token = "123456:ABC..."
/// openweather_api_key = "..."
/// db_path = "/var/lib/weatherbot/requests.db"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawConfig {
    pub telegram_token: Option<String>,
    pub openweather_api_key: Option<String>,
    pub db_path: Option<PathBuf>,
}

impl RawConfig {
    /// Load from disk, or return an empty default if the file doesn't
    /// exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let raw: RawConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(raw)
    }
}

/// Validated startup configuration: both secrets are guaranteed present.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub openweather_api_key: String,
    pub db_path: PathBuf,
}

impl Config {
    /// Assemble the runtime configuration. Environment variables win
    /// over the TOML file; a missing secret is a fatal startup error.
    pub fn load(config_path: Option<&Path>, db_override: Option<PathBuf>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Self::config_file_path()?,
        };

        let raw = RawConfig::load(&path)?;
        Self::resolve(raw, &path, |key| env::var(key).ok(), db_override)
    }

    fn resolve(
        raw: RawConfig,
        path: &Path,
        env_var: impl Fn(&str) -> Option<String>,
        db_override: Option<PathBuf>,
    ) -> Result<Self> {
        let telegram_token = env_var(TELEGRAM_TOKEN_ENV)
            .or(raw.telegram_token)
            .ok_or_else(|| {
                anyhow!(
                    "No Telegram bot token configured.\n\
                     Hint: set {TELEGRAM_TOKEN_ENV} or add `telegram_token` to {}.",
                    path.display()
                )
            })?;

        let openweather_api_key = env_var(OPENWEATHER_API_KEY_ENV)
            .or(raw.openweather_api_key)
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: set {OPENWEATHER_API_KEY_ENV} or add `openweather_api_key` to {}.",
                    path.display()
                )
            })?;

        let db_path = db_override
            .or_else(|| env_var(DB_PATH_ENV).map(PathBuf::from))
            .or(raw.db_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));

        Ok(Self {
            telegram_token,
            openweather_api_key,
            db_path,
        })
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherbot", "weatherbot")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_telegram_token_is_fatal() {
        let raw = RawConfig {
            openweather_api_key: Some("OW".to_string()),
            ..RawConfig::default()
        };

        let err = Config::resolve(raw, Path::new("config.toml"), no_env, None).unwrap_err();

        assert!(err.to_string().contains("No Telegram bot token configured"));
        assert!(err.to_string().contains(TELEGRAM_TOKEN_ENV));
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let raw = RawConfig {
            telegram_token: Some("TG".to_string()),
            ..RawConfig::default()
        };

        let err = Config::resolve(raw, Path::new("config.toml"), no_env, None).unwrap_err();

        assert!(err.to_string().contains("No OpenWeather API key configured"));
    }

    #[test]
    fn environment_wins_over_file() {
        let raw = RawConfig {
            telegram_token: Some("FILE_TG".to_string()),
            openweather_api_key: Some("FILE_OW".to_string()),
            db_path: Some(PathBuf::from("file.db")),
        };
        let env: HashMap<&str, &str> = HashMap::from([
            (TELEGRAM_TOKEN_ENV, "ENV_TG"),
            (DB_PATH_ENV, "env.db"),
        ]);

        let cfg = Config::resolve(
            raw,
            Path::new("config.toml"),
            |key| env.get(key).map(|v| (*v).to_string()),
            None,
        )
        .expect("config resolves");

        assert_eq!(cfg.telegram_token, "ENV_TG");
        assert_eq!(cfg.openweather_api_key, "FILE_OW");
        assert_eq!(cfg.db_path, PathBuf::from("env.db"));
    }

    #[test]
    fn db_override_wins_over_everything() {
        let raw = RawConfig {
            telegram_token: Some("TG".to_string()),
            openweather_api_key: Some("OW".to_string()),
            db_path: Some(PathBuf::from("file.db")),
        };

        let cfg = Config::resolve(
            raw,
            Path::new("config.toml"),
            no_env,
            Some(PathBuf::from("cli.db")),
        )
        .expect("config resolves");

        assert_eq!(cfg.db_path, PathBuf::from("cli.db"));
    }

    #[test]
    fn db_path_defaults_to_working_directory_file() {
        let raw = RawConfig {
            telegram_token: Some("TG".to_string()),
            openweather_api_key: Some("OW".to_string()),
            db_path: None,
        };

        let cfg =
            Config::resolve(raw, Path::new("config.toml"), no_env, None).expect("config resolves");

        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_FILE));
    }

    #[test]
    fn raw_config_parses_from_toml_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).expect("create file");
        writeln!(
            file,
            "telegram_token = \"TG\"\nopenweather_api_key = \"OW\"\ndb_path = \"bot.db\""
        )
        .expect("write file");

        let raw = RawConfig::load(&path).expect("load");

        assert_eq!(raw.telegram_token.as_deref(), Some("TG"));
        assert_eq!(raw.openweather_api_key.as_deref(), Some("OW"));
        assert_eq!(raw.db_path, Some(PathBuf::from("bot.db")));
    }

    #[test]
    fn absent_file_loads_as_empty_default() {
        let dir = tempfile::tempdir().expect("tempdir");

        let raw = RawConfig::load(&dir.path().join("missing.toml")).expect("load");

        assert!(raw.telegram_token.is_none());
        assert!(raw.openweather_api_key.is_none());
    }
}
