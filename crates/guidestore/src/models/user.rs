use crate::clock;
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use guidestore_core::{Document, EntityId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a user may do in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    /// Can author and delete guides.
    Admin,
    /// Can follow guides.
    Technician,
}

impl UserRole {
    /// Name as stored and displayed.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Technician => "Technician",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`UserRole`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for UserRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "technician" => Ok(Self::Technician),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// An activated installation user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity.
    pub id: EntityId,
    /// License key the user activated with. Opaque to the store.
    pub product_key: String,
    /// Role.
    pub role: UserRole,
    /// Activation time.
    #[serde(with = "ts_milliseconds")]
    pub activated_at: DateTime<Utc>,
    /// Most recent login.
    #[serde(with = "ts_milliseconds")]
    pub last_login: DateTime<Utc>,
}

impl User {
    /// Creates an unsaved user activated now.
    pub fn new(product_key: impl Into<String>, role: UserRole) -> Self {
        let now = clock::now();
        Self {
            id: EntityId::nil(),
            product_key: product_key.into(),
            role,
            activated_at: now,
            last_login: now,
        }
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }
}
