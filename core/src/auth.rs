//! `Authorization` and client-identity header composition.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Marker identifying this SDK inside the client-identity header.
pub const SDK_MARKER: &str = "RustSdk";

/// Version reported inside the client-identity header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Caller-supplied credentials. Several may be set; the first satisfied pair
/// in the order username/password, account/license key, bearer token wins.
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub account_id: Option<String>,
    pub license_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("account_id", &self.account_id)
            .field("has_password", &self.password.is_some())
            .field("has_license_key", &self.license_key.is_some())
            .field("has_bearer_token", &self.bearer_token.is_some())
            .finish()
    }
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn account(account_id: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            license_key: Some(license_key.into()),
            ..Self::default()
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// The `Authorization` header value, or `None` when no credential is complete.
    pub fn authorization_header(&self) -> Option<String> {
        if let Some(value) = basic_pair(&self.username, &self.password) {
            return Some(value);
        }
        if let Some(value) = basic_pair(&self.account_id, &self.license_key) {
            return Some(value);
        }
        non_empty(&self.bearer_token).map(|token| format!("Bearer {token}"))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn basic_pair(user: &Option<String>, secret: &Option<String>) -> Option<String> {
    let user = non_empty(user)?;
    let secret = non_empty(secret)?;
    Some(format!("Basic {}", STANDARD.encode(format!("{user}:{secret}"))))
}

/// Identifies the calling application on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub app_name: String,
    pub app_version: String,
    pub machine_name: String,
}

impl ClientIdentity {
    pub fn new(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        machine_name: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            machine_name: machine_name.into(),
        }
    }

    /// `app; version; RustSdk; sdk version; machine`
    pub fn header_value(&self) -> String {
        format!(
            "{}; {}; {SDK_MARKER}; {SDK_VERSION}; {}",
            self.app_name, self.app_version, self.machine_name
        )
    }
}
