/// Config file loading and creation for the h2h CLI.
///
/// Config lives at ~/.config/h2h/config.toml unless `--config` points
/// elsewhere. All fields are optional; CLI args override config values.
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::bail;

#[derive(Debug, Deserialize, Default)]
pub struct H2hConfig {
    pub base_url: Option<String>,
    pub goal: Option<String>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# h2h configuration
# All values here can be overridden by CLI flags.

# racetime.gg instance to read race history from
# base_url = \"https://racetime.gg\"

# Goal used by `h2h table` when --goal is not given
# goal = \"Beat the game\"
";

/// Returns the default config path: ~/.config/h2h/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("h2h").join("config.toml")
}

fn parse_config(content: &str) -> Result<H2hConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> H2hConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == ErrorKind::NotFound => H2hConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

/// Write the default template to `path`, creating parent directories.
/// Fails with `AlreadyExists` rather than overwriting an existing file.
fn write_default_config(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
}

/// Create the default config file at `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    write_default_config(path).unwrap_or_else(|e| match e.kind() {
        ErrorKind::AlreadyExists => {
            bail(format!("Config file already exists at {}", path.display()))
        }
        _ => bail(format!("Failed to write config to {}: {e}", path.display())),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_parses_to_empty_config() {
        let cfg = parse_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(cfg.base_url.is_none());
        assert!(cfg.goal.is_none());
    }

    #[test]
    fn test_parse_config_values() {
        let cfg = parse_config("base_url = \"http://localhost:8000\"\ngoal = \"any%\"\n").unwrap();
        assert_eq!(cfg.base_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cfg.goal.as_deref(), Some("any%"));
    }

    #[test]
    fn test_parse_config_rejects_wrong_types() {
        assert!(parse_config("goal = 3").is_err());
    }

    #[test]
    fn test_missing_file_gives_default() {
        let cfg = load_config(Path::new("/nonexistent/h2h/config.toml"));
        assert!(cfg.base_url.is_none());
    }

    #[test]
    fn test_write_default_config_to_custom_path() {
        let dir = std::env::temp_dir().join(format!("h2h-config-test-{}", std::process::id()));
        let path = dir.join("nested").join("h2h.toml");
        let _ = std::fs::remove_dir_all(&dir);

        write_default_config(&path).unwrap();
        let cfg = load_config(&path);
        assert!(cfg.base_url.is_none());
        assert!(cfg.goal.is_none());

        // A second write must not clobber the existing file.
        std::fs::write(&path, "goal = \"any%\"\n").unwrap();
        let err = write_default_config(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(load_config(&path).goal.as_deref(), Some("any%"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
