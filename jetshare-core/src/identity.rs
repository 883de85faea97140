use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated caller, as established by the auth provider's access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
    #[serde(skip_serializing, default)]
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// The capability a data client is acquired with.
///
/// `User` clients act on behalf of the session holder and are subject to
/// row-level security; `Privileged` clients bypass it and are reserved for
/// administrative reads.
#[derive(Debug, Clone)]
pub enum ClientScope {
    Anonymous,
    User(Session),
    Privileged,
}

impl ClientScope {
    pub fn label(&self) -> &'static str {
        match self {
            ClientScope::Anonymous => "anonymous",
            ClientScope::User(_) => "user",
            ClientScope::Privileged => "privileged",
        }
    }
}
