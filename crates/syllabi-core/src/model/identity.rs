use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyllabiError};

/// A registered account. Keyed by email; never edited after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub credential: Credential,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(name: String, email: String, password: &str) -> Result<Self> {
        Ok(Self {
            name,
            email,
            credential: Credential::derive(password)?,
            created_at: Utc::now(),
        })
    }

    /// The public part of the identity, safe to hand to a front-end.
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Argon2id hash of a password in PHC string form (salt and parameters included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub hash: String,
}

impl Credential {
    pub fn derive(password: &str) -> Result<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| SyllabiError::Credential(e.to_string()))?
            .to_string();
        Ok(Self { hash })
    }

    /// A stored hash that no longer parses never verifies.
    pub fn verify(&self, password: &str) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("unreadable credential hash: {e}");
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

/// The authenticated identity of this profile. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: Profile,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user: Profile) -> Self {
        Self {
            user,
            started_at: Utc::now(),
        }
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }
}
