//! Session owner lookup

/// Supplies the owner id of the current session
pub trait SessionProvider: Send + Sync {
    /// `None` when nobody is signed in
    fn current_owner_id(&self) -> Option<String>;
}

/// Session with a fixed owner (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    owner_id: Option<String>,
}

impl StaticSession {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { owner_id: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_owner_id(&self) -> Option<String> {
        self.owner_id.clone()
    }
}
