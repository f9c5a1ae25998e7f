// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tgcli_api::ApiCredentials;
use tgcli_app::DEFAULT_PAGE_SIZE;
use tgcli_tui::Theme;
use url::Url;

pub const APP_NAME: &str = "tgcli";
const CONFIG_VERSION: i64 = 1;
const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8081";
const DEFAULT_API_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub session: Session,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ui: Ui::default(),
            api: Api::default(),
            session: Session::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub page_size: Option<usize>,
    pub theme: Option<String>,
    pub only_unread: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            theme: Some(Theme::Default.name().to_owned()),
            only_unread: Some(false),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub api_id: Option<i64>,
    pub api_hash: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            api_id: None,
            api_hash: None,
            timeout: Some(DEFAULT_API_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    pub dir: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TGCLI_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TGCLI_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    /// Loads the file, writing a default one first when it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create config directory {}", parent.display()))?;
            }
            fs::write(path, Self::example_config(path))
                .with_context(|| format!("write default config {}", path.display()))?;
            eprintln!("tgcli: wrote default config to {}", path.display());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [ui], [api], and [session]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(page_size) = self.ui.page_size
            && !(1..=MAX_PAGE_SIZE).contains(&page_size)
        {
            bail!(
                "ui.page_size in {} must be between 1 and {}, got {}",
                path.display(),
                MAX_PAGE_SIZE,
                page_size
            );
        }

        if let Some(theme) = &self.ui.theme
            && Theme::parse(theme).is_none()
        {
            let known = Theme::ALL.map(Theme::name).join(", ");
            bail!(
                "ui.theme in {} must be one of: {}; got {:?}",
                path.display(),
                known,
                theme
            );
        }

        if let Some(base_url) = &self.api.base_url {
            Url::parse(base_url).with_context(|| {
                format!("api.base_url in {} is not a valid URL", path.display())
            })?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(dir) = &self.session.dir
            && !Path::new(dir).is_absolute()
        {
            bail!(
                "session.dir in {} must be an absolute path, got {:?}",
                path.display(),
                dir
            );
        }

        Ok(())
    }

    pub fn page_size(&self) -> usize {
        self.ui.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn only_unread(&self) -> bool {
        self.ui.only_unread.unwrap_or(false)
    }

    pub fn theme(&self) -> Theme {
        self.ui
            .theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default()
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_API_TIMEOUT))
    }

    pub fn credentials(&self, path: &Path) -> Result<ApiCredentials> {
        let api_id = self.api.api_id.filter(|id| *id > 0);
        let api_hash = self
            .api
            .api_hash
            .as_deref()
            .map(str::trim)
            .filter(|hash| !hash.is_empty());
        match (api_id, api_hash) {
            (Some(api_id), Some(api_hash)) => Ok(ApiCredentials {
                api_id,
                api_hash: api_hash.to_owned(),
            }),
            _ => bail!(
                "api.api_id and api.api_hash are not set in {}; register an application with the platform and add both under [api]",
                path.display()
            ),
        }
    }

    pub fn session_dir(&self) -> Result<PathBuf> {
        match &self.session.dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => data_dir(),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# tgcli config\n# Place this file at: {}\n\nversion = 1\n\n[ui]\npage_size = {}\ntheme = \"default\"  # default | mono\nonly_unread = false\n\n[api]\nbase_url = \"{}\"\n# Required. Issued by the platform for your application.\n# api_id = 12345\n# api_hash = \"0123456789abcdef\"\ntimeout = \"{}\"\n\n[session]\n# Optional. Default is the platform data dir (for example ~/.local/share/tgcli)\n# dir = \"/absolute/path\"\n",
            path.display(),
            DEFAULT_PAGE_SIZE,
            DEFAULT_API_BASE_URL,
            DEFAULT_API_TIMEOUT,
        )
    }
}

/// Per-user data directory holding the session files and the log.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(path) = env::var_os("TGCLI_DATA_DIR") {
        return Ok(PathBuf::from(path));
    }
    let data_root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set TGCLI_DATA_DIR or [session].dir")
    })?;
    Ok(data_root.join(APP_NAME))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
