use serde::{Deserialize, Serialize};

/// The parts of a user record the notifier reads. Users are owned by the
/// auth subsystem; this service never writes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContact {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserContact {
    /// Usable email address, if any.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or("Investor")
    }
}

/// Authenticated caller, injected by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}
