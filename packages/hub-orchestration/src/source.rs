use crate::error::{HubError, Result};
use serde::{Deserialize, Serialize};

/// Configured data source, as read from the hub configuration.
///
/// `name` may be omitted, in which case it is derived from the version
/// URL's parent folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub url: String,
}

impl SourceConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            name: None,
            url: url.into(),
        }
    }

    pub fn named(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: url.into(),
        }
    }
}

/// Resolved source: unique name, remote location and the backend index
/// its data lands in. Immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    pub index_name: String,
}

impl Source {
    /// Resolve a config entry against the deployment's base index name.
    pub fn from_config(config: &SourceConfig, base_index: &str) -> Result<Self> {
        let folder = match &config.name {
            Some(name) => name.clone(),
            None => folder_name_from_url(&config.url).ok_or_else(|| {
                HubError::Config(format!(
                    "Cannot derive source name from URL '{}'",
                    config.url
                ))
            })?,
        };

        let (index_name, name) = derive_index_name(base_index, &folder)?;
        Ok(Self {
            name,
            url: config.url.clone(),
            index_name,
        })
    }
}

/// Derive the index-name suffix from a storage-folder token.
///
/// Convention: a folder named `app-suffix` belongs to a deployment with
/// more than one index, and the suffix completes the index name. Edge
/// cases: no delimiter means a single source (no suffix); more than one
/// delimiter, or a trailing delimiter with nothing after it, is rejected
/// as an invalid folder name.
pub fn derive_index_suffix(folder: &str) -> Result<Option<&str>> {
    let mut parts = folder.split('-');
    let _head = parts.next();
    match (parts.next(), parts.next()) {
        (None, _) => Ok(None),
        (Some(""), None) => Err(HubError::Config(format!(
            "Empty suffix, invalid folder name: '{}'",
            folder
        ))),
        (Some(suffix), None) => Ok(Some(suffix)),
        (Some(_), Some(_)) => Err(HubError::Config(format!(
            "More than one '-' found, invalid folder name: '{}'",
            folder
        ))),
    }
}

/// Derive (backend index name, source name) for a folder token.
///
/// A suffixed folder maps to `<base>_<suffix>` and the suffix becomes the
/// source name; a plain folder maps to the base index unchanged.
pub fn derive_index_name(base_index: &str, folder: &str) -> Result<(String, String)> {
    match derive_index_suffix(folder)? {
        Some(suffix) => Ok((format!("{}_{}", base_index, suffix), suffix.to_string())),
        None => Ok((base_index.to_string(), folder.to_string())),
    }
}

/// Source name from a bare version URL: the basename of the URL's parent
/// folder (e.g. `https://host/data/demo/versions.json` -> `demo`). A
/// trailing slash is an empty final component, so a directory-style URL
/// names the directory itself (`https://host/data/demo/` -> `demo`).
pub fn folder_name_from_url(url: &str) -> Option<String> {
    let dir = match url.strip_suffix('/') {
        Some(rest) => rest,
        None => url.rsplit_once('/')?.0,
    };
    let folder = dir.rsplit('/').next()?;
    if folder.is_empty() {
        return None;
    }
    Some(folder.to_string())
}
