//! Caller identity as handed over by the identity collaborator.
//!
//! Nothing here verifies credentials. A [`Caller`] is trusted as-is; the
//! only checks are role gates.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EscrowError, MerchantId, Result, UserId};

/// Which side of the exchange a caller is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Crypto holder requesting fiat.
    User,
    /// Fiat payer accepting orders.
    Merchant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Merchant => write!(f, "merchant"),
        }
    }
}

impl FromStr for Role {
    type Err = EscrowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "merchant" => Ok(Self::Merchant),
            other => Err(EscrowError::Serialization(format!("unknown role '{other}'"))),
        }
    }
}

/// An authenticated party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Caller {
    pub id: Uuid,
    pub role: Role,
}

impl Caller {
    #[must_use]
    pub fn user(id: UserId) -> Self {
        Self {
            id: id.0,
            role: Role::User,
        }
    }

    #[must_use]
    pub fn merchant(id: MerchantId) -> Self {
        Self {
            id: id.0,
            role: Role::Merchant,
        }
    }

    /// # Errors
    /// Returns `RoleDenied` unless the caller is a user.
    pub fn require_user(&self) -> Result<UserId> {
        self.require(Role::User).map(|()| UserId(self.id))
    }

    /// # Errors
    /// Returns `RoleDenied` unless the caller is a merchant.
    pub fn require_merchant(&self) -> Result<MerchantId> {
        self.require(Role::Merchant).map(|()| MerchantId(self.id))
    }

    fn require(&self, required: Role) -> Result<()> {
        if self.role == required {
            Ok(())
        } else {
            Err(EscrowError::RoleDenied {
                required,
                actual: self.role,
            })
        }
    }
}
