// src/config.rs
//! Runtime configuration.
//!
//! Precedence: TOML file (env `CALENDAR_SYNC_CONFIG`, fallback
//! `config/calendar_sync.toml`), env overrides for endpoint/credential
//! wiring, built-in defaults otherwise. Persistence of the user-facing
//! settings lives with the caller; this module only reads.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::fetch::CALENDAR_URL;
use crate::orchestrator::Settings;
use crate::parser::Period;

const ENV_CONFIG_PATH: &str = "CALENDAR_SYNC_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/calendar_sync.toml";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub settings: Settings,
    pub calendar_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Also fire the remote refresh edge function at startup.
    pub remote_refresh_enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    auto_update_enabled: Option<bool>,
    update_interval_secs: Option<u64>,
    upload_enabled: Option<bool>,
    period: Option<Period>,
    calendar_url: Option<String>,
    supabase_url: Option<String>,
    supabase_anon_key: Option<String>,
    remote_refresh_enabled: Option<bool>,
}

impl AppConfig {
    /// Load using env var + fallbacks:
    /// 1) $CALENDAR_SYNC_CONFIG
    /// 2) config/calendar_sync.toml
    /// 3) defaults (credentials must then come from the environment)
    pub fn load_default() -> Result<Self> {
        let file = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            load_file(&pb)?
        } else {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if pb.exists() {
                load_file(&pb)?
            } else {
                FileConfig::default()
            }
        };
        Self::from_file_config(file)
    }

    fn from_file_config(file: FileConfig) -> Result<Self> {
        let settings = Settings {
            auto_update_enabled: file.auto_update_enabled.unwrap_or(true),
            update_interval_secs: file.update_interval_secs.unwrap_or(3600),
            upload_enabled: file.upload_enabled.unwrap_or(true),
            period: file.period.unwrap_or_default(),
        };
        // Env wins over the file for endpoints and credentials.
        let supabase_url = std::env::var("SUPABASE_URL")
            .ok()
            .or(file.supabase_url)
            .ok_or_else(|| anyhow!("SUPABASE_URL is not set"))?;
        let supabase_anon_key = std::env::var("SUPABASE_ANON_KEY")
            .ok()
            .or(file.supabase_anon_key)
            .ok_or_else(|| anyhow!("SUPABASE_ANON_KEY is not set"))?;
        let calendar_url = std::env::var("CALENDAR_URL")
            .ok()
            .or(file.calendar_url)
            .unwrap_or_else(|| CALENDAR_URL.to_string());

        Ok(Self {
            settings,
            calendar_url,
            supabase_url,
            supabase_anon_key,
            remote_refresh_enabled: file.remote_refresh_enabled.unwrap_or(false),
        })
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config from {}", path.display()))
}
