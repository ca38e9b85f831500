use anyhow::{Context, bail};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings of one [`Client`](crate::Client). Immutable once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host serving the SODA API, e.g. `data.cityofnewyork.us`.
    pub domain: String,
    /// Application token, sent as `X-App-Token`. Without one the host throttles harder.
    pub app_token: Option<String>,
    /// OAuth 2.0 access token, sent as `Authorization: OAuth <token>`.
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
    /// `https` unless pointed at a local test server.
    pub scheme: String,
}

impl ClientConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            app_token: None,
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("sodapi/{}", env!("CARGO_PKG_VERSION")),
            scheme: "https".to_string(),
        }
    }

    pub fn app_token(mut self, token: impl Into<String>) -> Self {
        self.app_token = Some(token.into());
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(Error::Config("a domain is required".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }
        if self.scheme != "https" && self.scheme != "http" {
            return Err(Error::Config(format!(
                "unsupported scheme `{}` (expected https or http)",
                self.scheme
            )));
        }
        Ok(())
    }
}

/// Parses a timeout given in (possibly fractional) seconds.
pub(crate) fn parse_timeout(raw: &str) -> Result<Duration> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("timeout must be numeric, got `{}`", raw)))?;
    if secs.is_nan() || secs <= 0.0 {
        return Err(Error::Config("timeout must be positive".to_string()));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("timeout out of range: {}", e)))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RcConfig {
    domain: Option<String>,
    app_token: Option<String>,
    access_token: Option<String>,
    timeout: Option<String>,
}

impl RcConfig {
    fn set(&mut self, key: &str, value: &str) {
        let slot = match key {
            "domain" => &mut self.domain,
            "app_token" => &mut self.app_token,
            "access_token" => &mut self.access_token,
            "timeout" => &mut self.timeout,
            _ => return,
        };
        *slot = Some(value.to_string());
    }
}

/// Resolves a configuration from explicit values, then `SODAPY_*` environment variables,
/// then the first rc file found.
pub(crate) fn load_config(
    domain: Option<String>,
    app_token: Option<String>,
) -> Result<ClientConfig> {
    load_config_with(domain, app_token, |name| std::env::var(name).ok())
}

fn load_config_with(
    domain: Option<String>,
    app_token: Option<String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    let (mut cfg, timeout) =
        resolve(domain, app_token, &env).map_err(|e| Error::Config(format!("{:#}", e)))?;
    if let Some(raw) = timeout {
        cfg.timeout = parse_timeout(&raw)?;
    }
    Ok(cfg)
}

fn resolve(
    domain: Option<String>,
    app_token: Option<String>,
    env: &dyn Fn(&str) -> Option<String>,
) -> anyhow::Result<(ClientConfig, Option<String>)> {
    let var = |name: &str| env(name).filter(|v| !v.is_empty());

    let mut domain = domain.or_else(|| var("SODAPY_DOMAIN"));
    let mut app_token = app_token.or_else(|| var("SODAPY_APPTOKEN"));
    let mut access_token = var("SODAPY_ACCESS_TOKEN");
    let mut timeout = var("SODAPY_TIMEOUT");

    let rc_candidates = rc_candidates(env);
    if domain.is_none() || app_token.is_none() || access_token.is_none() || timeout.is_none() {
        if let Some(rc_path) = rc_candidates.iter().find(|p| p.exists()) {
            let rc = read_rc(rc_path).with_context(|| {
                format!("failed to read configuration file {}", rc_path.display())
            })?;
            domain = domain.or(rc.domain);
            app_token = app_token.or(rc.app_token);
            access_token = access_token.or(rc.access_token);
            timeout = timeout.or(rc.timeout);
        }
    }

    let Some(domain) = domain else {
        bail!(
            "missing configuration: domain (set SODAPY_DOMAIN or put `domain:` in one of: {})",
            rc_candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let mut cfg = ClientConfig::new(domain);
    cfg.app_token = app_token;
    cfg.access_token = access_token;
    Ok((cfg, timeout))
}

fn read_rc(path: &Path) -> anyhow::Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    // `key:` may be followed by its value on the next line.
    let mut pending_key: Option<&str> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(key) = pending_key.take() {
            if !line.contains(':') {
                cfg.set(key, strip_quotes(line));
                continue;
            }
        }

        if let Some((k, v)) = line.split_once(':') {
            let k = k.trim();
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                pending_key = Some(k);
            } else {
                cfg.set(k, v);
            }
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates(env: &dyn Fn(&str) -> Option<String>) -> Vec<PathBuf> {
    // SODAPY_RC wins outright, otherwise ./.sodapyrc then ~/.sodapyrc.
    if let Some(p) = env("SODAPY_RC").filter(|p| !p.is_empty()) {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".sodapyrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".sodapyrc"));
    }
    v
}
