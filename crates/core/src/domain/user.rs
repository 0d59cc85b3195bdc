use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account. Credentials and session tokens live only in the identity
/// store and are never part of this record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Caller identity established once by token resolution and passed explicitly into
/// every cart and order operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self { user_id: user.id, username: user.username }
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    /// Surrounding whitespace is not part of a username.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        let username: String = username.into();
        Self {
            username: username.trim().to_string(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.username.is_empty() || self.password.expose_secret().is_empty()
    }
}

/// Opaque bearer credential issued at login.
#[derive(Clone, Debug)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn generate() -> Self {
        Self(SecretString::from(uuid::Uuid::new_v4().to_string()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<String> for SessionToken {
    fn from(value: String) -> Self {
        Self(SecretString::from(value))
    }
}
