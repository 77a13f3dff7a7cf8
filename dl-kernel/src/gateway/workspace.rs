//! Named values shared between the host and kernel adapter code.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// Table of named values.
///
/// The gateway only hands out a shared reference; adapter code decides what
/// lives here and when.
#[derive(Debug, Default)]
pub struct Workspace {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<serde_json::Value> {
        self.values.read().await.get(name).cloned()
    }

    /// Store a value, returning the one it replaced.
    pub async fn set(
        &self,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.values.write().await.insert(name.into(), value)
    }

    pub async fn remove(&self, name: &str) -> Option<serde_json::Value> {
        self.values.write().await.remove(name)
    }

    /// All names currently set, sorted.
    pub async fn names(&self) -> Vec<String> {
        let values = self.values.read().await;
        let mut names: Vec<String> = values.keys().cloned().collect();
        names.sort();
        names
    }
}
