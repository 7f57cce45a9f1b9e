/*
 * Responsibility
 * - Read environment / .env (port, negotiation provider, authority, HTTP limits)
 * - Validate values (missing or invalid → startup fails)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::HeaderName;

use crate::services::auth::principal::{DEFAULT_GRANTED_AUTHORITY, NameFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Which negotiation provider fronts the delegator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    TrustedHeader,
    None,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted-header" | "trusted_header" => Ok(Self::TrustedHeader),
            "none" | "" => Ok(Self::None),
            _ => Err(ConfigError::Invalid("NEGOTIATE_PROVIDER")),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct NegotiateConfig {
    pub provider: ProviderKind,
    pub protocols: Vec<String>,
    pub trusted_user_header: HeaderName,
    pub trusted_sid_header: HeaderName,
    pub trusted_groups_header: HeaderName,
    pub allow_guest_login: bool,
    pub principal_format: NameFormat,
    pub role_format: NameFormat,
    pub default_granted_authority: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthorityConfig {
    // Unset → no authority, negotiated principals pass through unchanged.
    pub required_role: Option<String>,
    pub denied_users: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            body_limit_bytes: 1024 * 1024,
        }
    }
}

pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub negotiate: NegotiateConfig,
    pub authority: AuthorityConfig,
    pub http: HttpConfig,
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn header_name(key: &'static str, default: &'static str) -> Result<HeaderName, ConfigError> {
    match var(key) {
        Some(raw) => HeaderName::from_str(raw.trim()).map_err(|_| ConfigError::Invalid(key)),
        None => Ok(HeaderName::from_static(default)),
    }
}

fn name_format(key: &'static str) -> Result<NameFormat, ConfigError> {
    var(key)
        .map(|raw| raw.parse::<NameFormat>().map_err(|_| ConfigError::Invalid(key)))
        .transpose()
        .map(Option::unwrap_or_default)
}

fn flag(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes") => Ok(true),
        Some(v) if matches!(v.as_str(), "false" | "0" | "no") => Ok(false),
        Some(_) => Err(ConfigError::Invalid(key)),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let provider = var("NEGOTIATE_PROVIDER")
            .map(|v| v.parse::<ProviderKind>())
            .transpose()?
            .unwrap_or(ProviderKind::TrustedHeader);

        let protocols = list(&var("NEGOTIATE_PROTOCOLS").unwrap_or_else(|| "Negotiate,NTLM".into()));
        if provider != ProviderKind::None && protocols.is_empty() {
            return Err(ConfigError::Missing("NEGOTIATE_PROTOCOLS"));
        }

        // An explicitly empty value disables the default authority.
        let default_granted_authority = match std::env::var("DEFAULT_GRANTED_AUTHORITY") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(v.trim().to_string()),
            Err(_) => Some(DEFAULT_GRANTED_AUTHORITY.to_string()),
        };

        let negotiate = NegotiateConfig {
            provider,
            protocols,
            trusted_user_header: header_name("TRUSTED_USER_HEADER", "x-remote-user")?,
            trusted_sid_header: header_name("TRUSTED_SID_HEADER", "x-remote-sid")?,
            trusted_groups_header: header_name("TRUSTED_GROUPS_HEADER", "x-remote-groups")?,
            allow_guest_login: flag("ALLOW_GUEST_LOGIN", true)?,
            principal_format: name_format("PRINCIPAL_FORMAT")?,
            role_format: name_format("ROLE_FORMAT")?,
            default_granted_authority,
        };

        let authority = AuthorityConfig {
            required_role: var("AUTHORITY_REQUIRED_ROLE").map(|v| v.trim().to_string()),
            denied_users: var("AUTHORITY_DENIED_USERS")
                .map(|v| list(&v))
                .unwrap_or_default(),
        };
        if authority.required_role.is_none() && !authority.denied_users.is_empty() {
            return Err(ConfigError::Missing("AUTHORITY_REQUIRED_ROLE"));
        }

        let defaults = HttpConfig::default();
        let http = HttpConfig {
            timeout_seconds: var("HTTP_TIMEOUT_SECONDS")
                .map(|v| v.parse::<u64>().map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECONDS")))
                .transpose()?
                .unwrap_or(defaults.timeout_seconds),
            body_limit_bytes: var("HTTP_BODY_LIMIT_BYTES")
                .map(|v| v.parse::<usize>().map_err(|_| ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES")))
                .transpose()?
                .unwrap_or(defaults.body_limit_bytes),
        };

        Ok(Self {
            addr,
            app_env,
            negotiate,
            authority,
            http,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_env_parsing() {
        assert_eq!(AppEnv::parse("PROD"), AppEnv::Production);
        assert!(AppEnv::parse("production").is_production());
        assert_eq!(AppEnv::parse("staging"), AppEnv::Development);
    }

    #[test]
    fn provider_kind_parsing() {
        assert_eq!("trusted-header".parse::<ProviderKind>().unwrap(), ProviderKind::TrustedHeader);
        assert_eq!("None".parse::<ProviderKind>().unwrap(), ProviderKind::None);
        assert!(matches!(
            "kerberos".parse::<ProviderKind>(),
            Err(ConfigError::Invalid("NEGOTIATE_PROVIDER"))
        ));
    }

    #[test]
    fn list_trims_and_drops_empty_entries() {
        assert_eq!(list(" Negotiate, ,NTLM,"), ["Negotiate", "NTLM"]);
        assert!(list("").is_empty());
    }
}
