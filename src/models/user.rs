use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User record handed over by the credential store at login time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub rights: BTreeSet<String>,
}

impl UserRecord {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            rights: BTreeSet::new(),
        }
    }

    pub fn with_right(mut self, right: impl Into<String>) -> Self {
        self.rights.insert(right.into());
        self
    }

    pub fn has_right(&self, right: &str) -> bool {
        self.rights.contains(right)
    }
}
