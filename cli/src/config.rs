use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

const DB_ENV: &str = "MEALWISE_DB";

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Resolves the database path. `MEALWISE_DB` wins over the platform data
    /// directory.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
            let db_path = PathBuf::from(path);
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            return Ok(Config { db_path });
        }

        let proj_dirs =
            ProjectDirs::from("", "", "mealwise").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("mealwise.db"),
        })
    }
}
