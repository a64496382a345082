use crate::domain::policy::PolicyConfig;
use crate::domain::value_objects::IpSource;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Server settings
    pub listen_addr: String,
    pub debug: bool,

    // Location lookup settings
    pub lookup_url: String,
    pub lookup_timeout_ms: u64,
    pub geoip_path: Option<String>,

    // Client address trust order
    #[serde(skip)]
    pub ip_sources: Vec<IpSource>,

    // Policy settings
    pub policy_path: Option<String>,
    pub allowed_countries: Option<Vec<String>>,
    pub allowed_cities: Option<Vec<String>>,
    pub denied_message: Option<String>,
    pub denied_status: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            debug: false,
            lookup_url: "http://geoip.samagra.io".to_string(),
            lookup_timeout_ms: 5000,
            geoip_path: None,
            ip_sources: vec![IpSource::Header("ip".to_string())],
            policy_path: None,
            allowed_countries: None,
            allowed_cities: None,
            denied_message: None,
            denied_status: None,
        }
    }
}

impl Config {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the config from an arbitrary variable lookup.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let listen_addr = var("GEOGATE_LISTEN_ADDR").unwrap_or(defaults.listen_addr);

    let debug = var("DEBUG").is_some();

    let lookup_url = var("GEOGATE_LOOKUP_URL").unwrap_or(defaults.lookup_url);

    let lookup_timeout_ms = var("GEOGATE_LOOKUP_TIMEOUT_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.lookup_timeout_ms);

    let geoip_path = var("GEOGATE_GEOIP_PATH").filter(|v| !v.is_empty());

    let ip_sources = match var("GEOGATE_IP_SOURCES") {
        Some(raw) => parse_ip_sources(&raw)?,
        None => defaults.ip_sources,
    };

    let policy_path = var("GEOGATE_POLICY_PATH").filter(|v| !v.is_empty());

    let allowed_countries = var("GEOGATE_ALLOWED_COUNTRIES").map(|v| split_list(&v));
    let allowed_cities = var("GEOGATE_ALLOWED_CITIES").map(|v| split_list(&v));

    let denied_message = var("GEOGATE_DENIED_MESSAGE");
    let denied_status = var("GEOGATE_DENIED_STATUS").and_then(|v| match v.trim().parse::<u16>() {
        Ok(status) => Some(status),
        Err(_) => {
            tracing::warn!(
                "GEOGATE_DENIED_STATUS={:?} is not a status code, using the policy default",
                v
            );
            None
        }
    });

    Ok(Config {
        listen_addr,
        debug,
        lookup_url,
        lookup_timeout_ms,
        geoip_path,
        ip_sources,
        policy_path,
        allowed_countries,
        allowed_cities,
        denied_message,
        denied_status,
    })
}

/// Load the allow-list policy.
///
/// A policy file, when configured, is authoritative. Otherwise the
/// `GEOGATE_ALLOWED_*` / `GEOGATE_DENIED_*` variables override the defaults.
pub fn load_policy(cfg: &Config) -> anyhow::Result<PolicyConfig> {
    if let Some(path) = &cfg.policy_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy file {}", path))?;
        let policy = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse policy file {}", path))?;
        return Ok(policy);
    }

    let mut policy = PolicyConfig::default();
    if let Some(countries) = &cfg.allowed_countries {
        policy.countries = countries.clone();
    }
    if let Some(cities) = &cfg.allowed_cities {
        policy.cities = cities.clone();
    }
    if let Some(message) = &cfg.denied_message {
        policy.access_denied_message = message.clone();
    }
    if let Some(status) = cfg.denied_status {
        policy.access_denied_status_code = status;
    }
    Ok(policy)
}

fn parse_ip_sources(raw: &str) -> anyhow::Result<Vec<IpSource>> {
    let sources = raw
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| IpSource::parse(s).with_context(|| format!("unknown IP source {:?}", s.trim())))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if sources.is_empty() {
        anyhow::bail!("GEOGATE_IP_SOURCES must name at least one source");
    }
    Ok(sources)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
