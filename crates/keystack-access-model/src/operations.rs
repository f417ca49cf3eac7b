//! Event access action enum.

use std::fmt;

/// All event access actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessOperation {
    // Verification
    /// Verify exactly one of a secret or an identifier.
    Verify,
    /// Look up a secret key.
    VerifySecret,
    /// Decode and authenticate an identifier key.
    VerifyIdentifier,
    /// Check a webhook signature through an integration handler.
    VerifySignature,

    // Key management
    /// Issue a test + live secret pair.
    CreateSecret,
    /// Issue an identifier-style record.
    CreateIdentifier,
    /// List the tenant's secrets.
    ListSecrets,
    /// Fetch one secret by record id.
    GetSecret,
    /// Soft-delete a named secret pair.
    DeleteSecret,
    /// Replace a named secret pair.
    RotateSecret,
}

impl AccessOperation {
    /// All actions.
    pub const ALL: [Self; 10] = [
        Self::Verify,
        Self::VerifySecret,
        Self::VerifyIdentifier,
        Self::VerifySignature,
        Self::CreateSecret,
        Self::CreateIdentifier,
        Self::ListSecrets,
        Self::GetSecret,
        Self::DeleteSecret,
        Self::RotateSecret,
    ];

    /// Returns the action name string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verify => "Verify",
            Self::VerifySecret => "VerifySecret",
            Self::VerifyIdentifier => "VerifyIdentifier",
            Self::VerifySignature => "VerifySignature",
            Self::CreateSecret => "CreateSecret",
            Self::CreateIdentifier => "CreateIdentifier",
            Self::ListSecrets => "ListSecrets",
            Self::GetSecret => "GetSecret",
            Self::DeleteSecret => "DeleteSecret",
            Self::RotateSecret => "RotateSecret",
        }
    }

    /// Parse an action name string.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Whether the action can be called without a tenant identity.
    #[must_use]
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Self::Verify | Self::VerifySecret | Self::VerifyIdentifier | Self::VerifySignature
        )
    }
}

impl fmt::Display for AccessOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
