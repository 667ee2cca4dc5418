use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::upstream::http::{DEFAULT_BASE_URL, Timeouts};

pub const PROJECT_DIR: &str = ".huntdiff";
pub const TOKEN_ENV: &str = "SUBLIME_API_TOKEN";
pub const API_URL_ENV: &str = "HUNTDIFF_API_URL";
pub const DATA_DIR_ENV: &str = "HUNTDIFF_DATA_DIR";

/// One config file layer. Unset keys fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamSection {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSection {
    /// Relative paths resolve against the project root.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Values taken from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub format: Option<String>,
}

impl EnvOverrides {
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_url: var(API_URL_ENV),
            token: var(TOKEN_ENV),
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            format: var("FORMAT"),
        }
    }
}

/// Values passed as command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub json: bool,
    pub format: Option<String>,
    pub token: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub snapshot_dir: Option<PathBuf>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeouts: Timeouts,
    pub data_dir: PathBuf,
    /// Replay saved responses from here instead of calling the API.
    pub snapshot_dir: Option<PathBuf>,
    pub resolved_output: String,
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ConfigFile>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<project_root>/.huntdiff/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ConfigFile> {
    read_config_file(&project_root.join(PROJECT_DIR).join("config.toml"))
}

/// Load `<config_dir>/huntdiff/config.toml`, or defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<ConfigFile> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    read_config_file(&config_dir.join("huntdiff/config.toml"))
}

/// Resolve settings from files, environment, and flags.
///
/// # Errors
///
/// Returns an error if a config file cannot be parsed or an output mode is
/// unrecognized.
pub fn resolve_config(project_root: &Path, cli: &CliOverrides) -> Result<EffectiveConfig> {
    let user = load_user_config()?;
    let project = load_project_config(project_root)?;
    merge(project_root, &user, &project, &EnvOverrides::from_env(), cli)
}

/// Layer defaults < user file < project file < environment < flags.
///
/// # Errors
///
/// Returns an error if an explicit output mode is unrecognized.
pub fn merge(
    project_root: &Path,
    user: &ConfigFile,
    project: &ConfigFile,
    env: &EnvOverrides,
    cli: &CliOverrides,
) -> Result<EffectiveConfig> {
    let base_url = env
        .api_url
        .clone()
        .or_else(|| project.upstream.base_url.clone())
        .or_else(|| user.upstream.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let defaults = Timeouts::default();
    let connect = project
        .upstream
        .connect_timeout_secs
        .or(user.upstream.connect_timeout_secs)
        .map_or(defaults.connect, Duration::from_secs);
    let read = project
        .upstream
        .read_timeout_secs
        .or(user.upstream.read_timeout_secs)
        .map_or(defaults.read, Duration::from_secs);

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| env.data_dir.clone())
        .or_else(|| project.storage.data_dir.clone())
        .or_else(|| user.storage.data_dir.clone())
        .unwrap_or_else(|| PathBuf::from(PROJECT_DIR).join("data"));
    let data_dir = if data_dir.is_absolute() {
        data_dir
    } else {
        project_root.join(data_dir)
    };

    let file_output = project.output.clone().or_else(|| user.output.clone());
    let requested_format = cli.format.clone().or_else(|| env.format.clone());
    let resolved_output = resolve_output(cli.json, file_output, requested_format)?;

    Ok(EffectiveConfig {
        base_url,
        token: cli
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| env.token.clone()),
        timeouts: Timeouts {
            connect,
            read,
            write: read,
        },
        data_dir,
        snapshot_dir: cli.snapshot_dir.clone(),
        resolved_output,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

fn resolve_output(
    cli_json: bool,
    file_output: Option<String>,
    requested: Option<String>,
) -> Result<String> {
    if cli_json {
        return Ok("json".to_string());
    }

    if let Some(raw) = requested.as_deref() {
        return normalize_output_mode(raw)
            .map(str::to_string)
            .with_context(|| format!("unknown output format '{raw}' (use pretty, text, or json)"));
    }

    if let Some(mode) = file_output.as_deref().and_then(normalize_output_mode) {
        return Ok(mode.to_string());
    }

    if std::io::stdout().is_terminal() {
        Ok("pretty".to_string())
    } else {
        Ok("text".to_string())
    }
}
