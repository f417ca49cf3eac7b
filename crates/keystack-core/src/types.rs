//! Tenant and environment types shared across crates.

use std::fmt;
use std::str::FromStr;

use crate::KeystackError;

/// Root tenant identifier (the `buildableId` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a new tenant id.
    ///
    /// # Errors
    /// Returns an error if the id is empty or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, KeystackError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(KeystackError::InvalidTenantId(id));
        }
        Ok(Self(id))
    }

    /// Get the tenant id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deployment environment a credential is scoped to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Sandbox traffic.
    #[default]
    Test,
    /// Production traffic.
    Live,
}

impl Environment {
    /// Both environments, in issuance order.
    pub const ALL: [Self; 2] = [Self::Test, Self::Live];

    /// Returns the wire name of the environment.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Live => "live",
        }
    }
}

impl FromStr for Environment {
    type Err = KeystackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "test" => Ok(Self::Test),
            "live" => Ok(Self::Live),
            other => Err(KeystackError::InvalidEnvironment(other.to_owned())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tenant ownership attached to every issued credential.
///
/// `buildable_id` is the root tenant; the narrower scopes fall back to it when
/// the caller does not supply them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ownership {
    /// Root tenant.
    pub buildable_id: TenantId,
    /// OAuth client scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Organization scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Project scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Acting user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Ownership {
    /// Ownership where every scope equals the tenant id.
    #[must_use]
    pub fn for_tenant(tenant: TenantId) -> Self {
        let id = tenant.as_str().to_owned();
        Self {
            buildable_id: tenant,
            client_id: Some(id.clone()),
            organization_id: Some(id.clone()),
            project_id: Some(id.clone()),
            user_id: Some(id),
        }
    }

    /// Fill every missing scope with the tenant id.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let id = self.buildable_id.as_str();
        for slot in [
            &mut self.client_id,
            &mut self.organization_id,
            &mut self.project_id,
            &mut self.user_id,
        ] {
            if slot.is_none() {
                *slot = Some(id.to_owned());
            }
        }
        self
    }

    /// The acting user, falling back to the tenant.
    #[must_use]
    pub fn user_or_tenant(&self) -> &str {
        self.user_id
            .as_deref()
            .unwrap_or_else(|| self.buildable_id.as_str())
    }
}
