//! Configuration: config file, environment and interactive fallbacks
//!
//! The config file lives at `<config dir>/tg/config.toml`:
//!
//! ```toml
//! default_account = "acme"
//!
//! [api]
//! timeout_secs = 30
//! page_size = 50
//!
//! [accounts.acme]
//! api_key = "..."
//! ```
//!
//! Environment variables (also read from `.env`) take precedence over the file.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use dialoguer::Input;
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};

use crate::api::ClientConfig;

pub const ACCOUNT_ENV: &str = "TG_ACCOUNT";
pub const API_KEY_ENV: &str = "TG_API_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub default_account: Option<String>,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub timeout_secs: u64,
    pub page_size: u32,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountSettings {
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Config {
    /// `<config dir>/tg/config.toml`
    pub fn path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine configuration directory")?;
        Ok(base.join("tg").join("config.toml"))
    }

    /// Load the config file; a missing file yields the defaults
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };

        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::builder()
            .timeout_secs(self.api.timeout_secs)
            .page_size(self.api.page_size)
            .build()
    }

    pub fn api_key_for(&self, account: &str) -> Option<&str> {
        self.accounts
            .get(account)
            .and_then(|a| a.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Account and API key for one run
#[derive(Clone)]
pub struct Credentials {
    pub account: String,
    pub api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("api_key", &"***")
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Account from the flag, then the environment, then the config default
pub fn resolve_account(flag: Option<&str>, env: Option<String>, config: &Config) -> Option<String> {
    non_blank(flag.map(str::to_string))
        .or_else(|| non_blank(env))
        .or_else(|| non_blank(config.default_account.clone()))
}

/// API key from the environment, then the account's config section
pub fn resolve_api_key(env: Option<String>, config: &Config, account: &str) -> Option<String> {
    non_blank(env).or_else(|| config.api_key_for(account).map(str::to_string))
}

/// Resolve credentials, prompting on a terminal when nothing is configured
pub fn resolve_credentials(flag: Option<&str>, config: &Config) -> Result<Credentials> {
    let interactive = io::stdin().is_terminal();

    let account = match resolve_account(flag, std::env::var(ACCOUNT_ENV).ok(), config) {
        Some(account) => account,
        None if interactive => Input::<String>::new()
            .with_prompt("Twingate account name")
            .interact_text()
            .context("Failed to read account name")?
            .trim()
            .to_string(),
        None => bail!(
            "No account name given. Use --account-name, set {} or default_account in {}",
            ACCOUNT_ENV,
            Config::path()?.display()
        ),
    };
    if account.is_empty() {
        bail!("Account name must not be empty");
    }

    let api_key = match resolve_api_key(std::env::var(API_KEY_ENV).ok(), config, &account) {
        Some(key) => key,
        None if interactive => {
            rpassword::prompt_password(format!("API key for '{}': ", account))
                .context("Failed to read API key")?
                .trim()
                .to_string()
        }
        None => bail!(
            "No API key for account '{}'. Set {} or [accounts.{}] api_key in the config file",
            account,
            API_KEY_ENV,
            account
        ),
    };
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    log::debug!("Using account '{}'", account);
    Ok(Credentials { account, api_key })
}
