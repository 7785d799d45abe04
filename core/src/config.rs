//! Client configuration.
//!
//! # Design
//! `ClientConfig` is assembled once through [`ClientConfigBuilder`] and never
//! mutated afterwards; the client keeps it behind an `Arc` and every call
//! reads from it without locking. The `Authorization` and client-identity
//! header values are composed at build time. Changing any setting means
//! building a new client.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{ClientIdentity, Credentials};
use crate::error::ConfigError;
use crate::http::{ReqwestTransport, Transport};
use crate::logger::LogOptions;
use crate::timeout::CancellationMode;

/// Base URL of the sandbox environment.
pub const SANDBOX_URL: &str = "https://sandbox-rest.avatax.com";

/// Base URL of the production environment.
pub const PRODUCTION_URL: &str = "https://rest.avatax.com";

/// Default per-call deadline: 20 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1_200_000);

/// Which service deployment the client talks to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
    Custom(String),
}

impl Environment {
    pub fn base_url(&self) -> &str {
        match self {
            Environment::Sandbox => SANDBOX_URL,
            Environment::Production => PRODUCTION_URL,
            Environment::Custom(url) => url.trim_end_matches('/'),
        }
    }

    /// `sandbox` and `production` (any case) select the well-known
    /// deployments; anything else is taken as a base URL.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "sandbox" => Environment::Sandbox,
            "production" => Environment::Production,
            _ => Environment::Custom(value.trim().to_string()),
        }
    }
}

/// Immutable settings shared by every call made through one client.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) auth_header: Option<String>,
    pub(crate) client_header: String,
    pub(crate) strict_type_conversion: bool,
    pub(crate) cancellation: CancellationMode,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) logging: LogOptions,
}

impl ClientConfig {
    pub fn builder(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        machine_name: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder::new(ClientIdentity::new(app_name, app_version, machine_name))
    }

    /// Build a configuration from `AVATAX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let machine = get("AVATAX_MACHINE_NAME")
            .or_else(|| get("HOSTNAME"))
            .or_else(|| get("COMPUTERNAME"))
            .unwrap_or_default();
        let mut builder = Self::builder(
            get("AVATAX_APP_NAME").unwrap_or_default(),
            get("AVATAX_APP_VERSION").unwrap_or_default(),
            machine,
        );

        if let Some(env) = get("AVATAX_ENVIRONMENT") {
            builder = builder.environment(Environment::parse(&env));
        }
        if let Some(ms) = get("AVATAX_TIMEOUT_MS") {
            let ms: u64 = ms.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "AVATAX_TIMEOUT_MS",
                value: ms.clone(),
            })?;
            builder = builder.timeout(Duration::from_millis(ms));
        }
        builder = builder.credentials(Credentials {
            username: get("AVATAX_USERNAME"),
            password: get("AVATAX_PASSWORD"),
            account_id: get("AVATAX_ACCOUNT_ID"),
            license_key: get("AVATAX_LICENSE_KEY"),
            bearer_token: get("AVATAX_BEARER_TOKEN"),
        });
        if let Some(enabled) = get("AVATAX_LOG_ENABLED") {
            let enabled = parse_flag("AVATAX_LOG_ENABLED", &enabled)?;
            builder = builder.logging(LogOptions {
                enabled,
                sink: None,
            });
        }
        if let Some(strict) = get("AVATAX_STRICT_TYPES") {
            builder = builder.strict_type_conversion(parse_flag("AVATAX_STRICT_TYPES", &strict)?);
        }
        builder.build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn strict_type_conversion(&self) -> bool {
        self.strict_type_conversion
    }

    pub fn cancellation(&self) -> CancellationMode {
        self.cancellation
    }

    /// Value of the client-identity header sent with every call.
    pub fn client_header(&self) -> &str {
        &self.client_header
    }

    pub fn has_credentials(&self) -> bool {
        self.auth_header.is_some()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("has_credentials", &self.auth_header.is_some())
            .field("client_header", &self.client_header)
            .field("strict_type_conversion", &self.strict_type_conversion)
            .field("cancellation", &self.cancellation)
            .field("logging", &self.logging)
            .finish_non_exhaustive()
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            name,
            value: value.to_string(),
        }),
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    identity: ClientIdentity,
    environment: Environment,
    timeout: Duration,
    credentials: Credentials,
    strict_type_conversion: bool,
    cancellation: CancellationMode,
    transport: Option<Arc<dyn Transport>>,
    logging: LogOptions,
}

impl ClientConfigBuilder {
    fn new(identity: ClientIdentity) -> Self {
        Self {
            identity,
            environment: Environment::default(),
            timeout: DEFAULT_TIMEOUT,
            credentials: Credentials::default(),
            strict_type_conversion: false,
            cancellation: CancellationMode::default(),
            transport: None,
            logging: LogOptions::default(),
        }
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn strict_type_conversion(mut self, enabled: bool) -> Self {
        self.strict_type_conversion = enabled;
        self
    }

    pub fn cancellation(mut self, mode: CancellationMode) -> Self {
        self.cancellation = mode;
        self
    }

    /// Replace the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn logging(mut self, logging: LogOptions) -> Self {
        self.logging = logging;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        if self.identity.app_name.trim().is_empty() {
            return Err(ConfigError::MissingAppName);
        }
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new().map_err(ConfigError::Transport)?),
        };
        Ok(ClientConfig {
            base_url: self.environment.base_url().to_string(),
            timeout: self.timeout,
            auth_header: self.credentials.authorization_header(),
            client_header: self.identity.header_value(),
            strict_type_conversion: self.strict_type_conversion,
            cancellation: self.cancellation,
            transport,
            logging: self.logging,
        })
    }
}
