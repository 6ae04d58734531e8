use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use url::Url;

use crate::sync::SyncPolicy;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const SETTINGS_FILE: &str = "portal.toml";

/// Demo account used for both the seed call and the login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoCredentials {
    pub email: String,
    pub password: String,
}

impl Default for DemoCredentials {
    fn default() -> Self {
        Self {
            email: "admin@example.com".into(),
            password: "admin123".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub credentials: DemoCredentials,
    pub sync_policy: SyncPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            credentials: DemoCredentials::default(),
            sync_policy: SyncPolicy::default(),
        }
    }
}

/// Defaults, then `portal.toml` in the working directory if present, then the
/// process environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(None, |key| std::env::var(key).ok())
}

/// Same layering as [`load_settings`] with an explicit file and environment.
///
/// An explicit `path` must exist; the default file is optional.
pub fn load_settings_from(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (file, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(SETTINGS_FILE), false),
    };
    if let Some(file_cfg) = read_settings_file(&file, required)? {
        if let Some(v) = file_cfg.get("backend_url") {
            settings.backend_url = v.clone();
        }
        if let Some(v) = file_cfg.get("admin_email") {
            settings.credentials.email = v.clone();
        }
        if let Some(v) = file_cfg.get("admin_password") {
            settings.credentials.password = v.clone();
        }
        if let Some(v) = file_cfg.get("sync_policy") {
            settings.sync_policy = v
                .parse()
                .with_context(|| format!("invalid sync_policy in {}", file.display()))?;
        }
    }

    for key in ["BACKEND_URL", "VITE_BACKEND_URL", "APP__BACKEND_URL"] {
        if let Some(v) = env(key) {
            settings.backend_url = v;
        }
    }
    if let Some(v) = env("APP__ADMIN_EMAIL") {
        settings.credentials.email = v;
    }
    if let Some(v) = env("APP__ADMIN_PASSWORD") {
        settings.credentials.password = v;
    }
    if let Some(v) = env("APP__SYNC_POLICY") {
        settings.sync_policy = v.parse().context("invalid APP__SYNC_POLICY")?;
    }

    settings.backend_url = normalize_backend_url(&settings.backend_url)?;
    Ok(settings)
}

fn read_settings_file(
    path: &Path,
    required: bool,
) -> anyhow::Result<Option<HashMap<String, String>>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Some(file_cfg))
}

/// Validates an http(s) base URL and strips trailing slashes so paths can be
/// appended verbatim.
pub fn normalize_backend_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).with_context(|| format!("invalid backend url `{trimmed}`"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("backend url `{trimmed}` must use http or https");
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
