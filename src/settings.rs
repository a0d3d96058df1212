use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
}

fn default_database_file() -> String {
    "movimientos.db".to_string()
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            database_file: default_database_file(),
        }
    }
}

impl Settings {
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.database_file)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("movimientos")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("movimientos")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| EtlError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_database_path() -> PathBuf {
    load_settings().database_path()
}

/// Expand a leading `~` or `~/` to the home directory. Other paths pass through.
pub fn shellexpand_path(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return path.to_string(),
    };
    match dirs::home_dir() {
        Some(home) => format!("{}{rest}", home.to_string_lossy()),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            database_file: "cuenta.db".to_string(),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.database_file, "cuenta.db");
        assert_eq!(loaded.database_path(), PathBuf::from("/tmp/test/cuenta.db"));
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.database_file, "movimientos.db");
        assert!(s.data_dir.ends_with("movimientos"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/srv/banco"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.database_file, "movimientos.db");
        assert_eq!(s.database_path(), PathBuf::from("/srv/banco/movimientos.db"));
    }

    #[test]
    fn test_missing_data_dir_keeps_database_file() {
        let json = r#"{"database_file": "cuenta.db"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.database_file, "cuenta.db");
        assert_eq!(s.data_dir, Settings::default().data_dir);
    }

    #[test]
    fn test_shellexpand_keeps_unknown_paths() {
        assert_eq!(shellexpand_path("/no/such/dir/here"), "/no/such/dir/here");
        assert_eq!(shellexpand_path("relative/data"), "relative/data");
        assert_eq!(shellexpand_path("~user/data"), "~user/data");
    }

    #[test]
    fn test_shellexpand_home_prefix() {
        let home = dirs::home_dir().unwrap().to_string_lossy().to_string();
        assert_eq!(shellexpand_path("~/banco"), format!("{home}/banco"));
        assert_eq!(shellexpand_path("~"), home);
    }
}
