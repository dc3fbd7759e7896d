//! User Aggregate
//!
//! A registered wallet owner. Users are created once and never change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User Aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    id: Uuid,

    /// Email (unique, stored as given)
    email: String,

    /// When the user registered
    created_at: DateTime<Utc>,
}

impl User {
    /// Register a new user with a fresh ID
    pub fn register(email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild a user from stored state
    pub fn from_parts(id: Uuid, email: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            email,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
