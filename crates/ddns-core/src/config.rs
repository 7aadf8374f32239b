//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! Configuration is loaded once at startup and never mutated afterwards.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default "what is my IP" endpoint
pub const DEFAULT_IP_URL: &str = "https://api.ipify.org";

/// Main DDNS configuration
#[derive(Clone, Deserialize)]
pub struct DdnsConfig {
    /// Provider API token
    #[serde(default)]
    pub login_token: String,

    /// Provider account email (used together with `password`)
    #[serde(default)]
    pub email: String,

    /// Provider account password
    #[serde(default)]
    pub password: String,

    /// URL returning the caller's public IP as plain text
    #[serde(default = "default_ip_url")]
    pub ip_url: String,

    /// Optional SOCKS5 proxy for provider traffic (`host:port` or URL)
    #[serde(default)]
    pub socks5_proxy: Option<String>,

    /// Domains to keep updated
    pub domains: Vec<DomainConfig>,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Optional notification settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

// Custom Debug implementation that hides the credentials
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("credentials", &self.credentials().ok())
            .field("ip_url", &self.ip_url)
            .field("socks5_proxy", &self.socks5_proxy)
            .field("domains", &self.domains)
            .field("engine", &self.engine)
            .field("notify", &self.notify)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a new configuration with defaults and no domains
    pub fn new() -> Self {
        Self {
            login_token: String::new(),
            email: String::new(),
            password: String::new(),
            ip_url: default_ip_url(),
            socks5_proxy: None,
            domains: Vec::new(),
            engine: EngineConfig::default(),
            notify: NotifyConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials()?;

        if self.domains.is_empty() {
            return Err(crate::Error::config("No domains configured"));
        }

        for domain in &self.domains {
            domain.validate()?;
        }

        if self.ip_url.is_empty() {
            return Err(crate::Error::config("IP lookup URL cannot be empty"));
        }

        if !self.ip_url.starts_with("https://") && !self.ip_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "IP lookup URL must use HTTP or HTTPS scheme. Got: {}",
                self.ip_url
            )));
        }

        if let Some(proxy) = &self.socks5_proxy
            && proxy.trim().is_empty()
        {
            return Err(crate::Error::config("SOCKS5 proxy address cannot be empty"));
        }

        self.engine.validate()?;
        self.notify.validate()?;

        Ok(())
    }

    /// Resolve the configured credentials
    ///
    /// A login token wins over email/password when both are present.
    pub fn credentials(&self) -> Result<Credentials, crate::Error> {
        if !self.login_token.is_empty() {
            return Ok(Credentials::Token(self.login_token.clone()));
        }

        if !self.email.is_empty() && !self.password.is_empty() {
            return Ok(Credentials::Account {
                email: self.email.clone(),
                password: self.password.clone(),
            });
        }

        Err(crate::Error::config(
            "Input email/password or login token cannot be empty",
        ))
    }
}

impl Default for DdnsConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}

/// Provider credentials
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// API token
    Token(String),
    /// Account email and password
    Account { email: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<REDACTED>)"),
            Credentials::Account { email, .. } => f
                .debug_struct("Account")
                .field("email", email)
                .field("password", &"<REDACTED>")
                .finish(),
        }
    }
}

/// One domain and the subdomains to keep pointed at the public IP
#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    /// Domain name as registered with the provider (e.g. "example.com")
    pub domain_name: String,

    /// Subdomains to update, processed in this order
    pub sub_domains: Vec<String>,
}

impl DomainConfig {
    /// Create a new domain configuration
    pub fn new<I, S>(domain_name: impl Into<String>, sub_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domain_name: domain_name.into(),
            sub_domains: sub_domains.into_iter().map(Into::into).collect(),
        }
    }

    /// Fully-qualified name of one of this domain's subdomains
    pub fn fqdn(&self, sub_domain: &str) -> String {
        format!("{}.{}", sub_domain, self.domain_name)
    }

    /// Validate the domain configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain_name.trim().is_empty() {
            return Err(crate::Error::config("Domain name cannot be empty"));
        }

        if self.sub_domains.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain {} has no subdomains configured",
                self.domain_name
            )));
        }

        if self.sub_domains.iter().any(|s| s.trim().is_empty()) {
            return Err(crate::Error::config(format!(
                "Domain {} has an empty subdomain name",
                self.domain_name
            )));
        }

        Ok(())
    }
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Delay between completed cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Delay before retrying a cycle that failed to resolve the domain or IP (in seconds)
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Delay before restarting a crashed domain loop (in seconds)
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,

    /// Maximum restarts per domain loop; unlimited when unset
    #[serde(default)]
    pub max_restarts: Option<u32>,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Update interval must be > 0"));
        }
        if self.retry_interval_secs == 0 {
            return Err(crate::Error::config("Retry interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.restart_delay_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            restart_delay_secs: default_restart_delay_secs(),
            max_restarts: None,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_retry_interval_secs() -> u64 {
    5
}

fn default_restart_delay_secs() -> u64 {
    10
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Notification configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    /// Whether to send a notification after each successful update
    #[serde(default)]
    pub enabled: bool,

    /// Webhook receiving the notification
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Recipient forwarded to the webhook
    #[serde(default)]
    pub send_to: Option<String>,
}

impl NotifyConfig {
    /// Validate the notification configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.enabled {
            return Ok(());
        }

        match self.webhook_url.as_deref() {
            None | Some("") => Err(crate::Error::config(
                "Notification webhook URL is required when notifications are enabled",
            )),
            Some(url) if !url.starts_with("https://") && !url.starts_with("http://") => {
                Err(crate::Error::config(format!(
                    "Notification webhook URL must use HTTP or HTTPS scheme. Got: {}",
                    url
                )))
            }
            Some(_) => Ok(()),
        }
    }
}
