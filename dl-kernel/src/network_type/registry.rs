//! Network type registry.

use std::sync::Arc;

use dl_kernel_common::NetworkTypeInfo;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{NetworkType, RawModel};
use crate::error::{Error, Result};

/// How the registry treats backend prefixes shared by two network types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPolicy {
    /// Accept overlaps; resolution picks the earliest registered match.
    #[default]
    FirstRegisteredWins,
    /// Refuse to register a network type whose prefixes overlap an existing one.
    Reject,
}

/// Registry of all known network types.
///
/// Network types are kept in registration order. The registry allows looking
/// up a network type by identifier or finding the one that owns a model.
pub struct NetworkTypeRegistry {
    policy: PrefixPolicy,
    network_types: RwLock<Vec<Arc<dyn NetworkType>>>,
}

impl NetworkTypeRegistry {
    pub fn new() -> Self {
        Self::with_policy(PrefixPolicy::default())
    }

    pub fn with_policy(policy: PrefixPolicy) -> Self {
        Self {
            policy,
            network_types: RwLock::new(Vec::new()),
        }
    }

    pub fn policy(&self) -> PrefixPolicy {
        self.policy
    }

    /// Register a new network type.
    ///
    /// Fails if the identifier is already taken. Replacing a network type
    /// requires unregistering the old one first.
    pub async fn register(&self, network_type: Arc<dyn NetworkType>) -> Result<()> {
        let mut network_types = self.network_types.write().await;
        let identifier = network_type.identifier();

        if network_types.iter().any(|n| n.identifier() == identifier) {
            return Err(Error::DuplicateIdentifier(identifier.to_string()));
        }

        if let Some((existing, prefix)) = find_overlap(&network_types, network_type.as_ref()) {
            match self.policy {
                PrefixPolicy::Reject => {
                    return Err(Error::OverlappingPrefix {
                        identifier: identifier.to_string(),
                        prefix,
                        existing,
                    });
                }
                PrefixPolicy::FirstRegisteredWins => {
                    tracing::warn!(
                        identifier = %identifier,
                        prefix = %prefix,
                        existing = %existing,
                        "Network type prefix overlaps an existing network type; earlier registration wins"
                    );
                }
            }
        }

        tracing::debug!("Registered network type {}", identifier);
        network_types.push(network_type);
        Ok(())
    }

    /// Remove a network type. Returns whether it was registered.
    pub async fn unregister(&self, identifier: &str) -> bool {
        let mut network_types = self.network_types.write().await;
        let before = network_types.len();
        network_types.retain(|n| n.identifier() != identifier);
        let removed = network_types.len() != before;
        if removed {
            tracing::debug!("Unregistered network type {}", identifier);
        }
        removed
    }

    /// Get a network type by identifier.
    pub async fn lookup_by_id(&self, identifier: &str) -> Result<Arc<dyn NetworkType>> {
        let network_types = self.network_types.read().await;
        network_types
            .iter()
            .find(|n| n.identifier() == identifier)
            .cloned()
            .ok_or_else(|| Error::UnknownIdentifier(identifier.to_string()))
    }

    /// Find the network type that owns a model.
    pub async fn resolve_by_model(&self, model: &dyn RawModel) -> Result<Arc<dyn NetworkType>> {
        self.resolve_type_name(&model.type_name()).await
    }

    /// Find the network type that owns models of the given runtime type.
    ///
    /// Returns the first network type, in registration order, with a backend
    /// prefix matching the start of `type_name`.
    pub async fn resolve_type_name(&self, type_name: &str) -> Result<Arc<dyn NetworkType>> {
        let network_types = self.network_types.read().await;
        network_types
            .iter()
            .find(|n| n.owns_type_name(type_name))
            .cloned()
            .ok_or_else(|| Error::UnresolvedModelType(type_name.to_string()))
    }

    /// Get all registered network types in registration order.
    pub async fn all(&self) -> Vec<Arc<dyn NetworkType>> {
        self.network_types.read().await.clone()
    }

    pub async fn infos(&self) -> Vec<NetworkTypeInfo> {
        let network_types = self.network_types.read().await;
        network_types.iter().map(|n| n.info()).collect()
    }

    pub async fn contains(&self, identifier: &str) -> bool {
        let network_types = self.network_types.read().await;
        network_types.iter().any(|n| n.identifier() == identifier)
    }

    pub async fn len(&self) -> usize {
        self.network_types.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.network_types.read().await.is_empty()
    }
}

impl Default for NetworkTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first registered network type sharing a prefix with `candidate`.
///
/// Two prefixes overlap when one starts with the other, since a type name
/// matching the longer one also matches the shorter one.
fn find_overlap(
    registered: &[Arc<dyn NetworkType>],
    candidate: &dyn NetworkType,
) -> Option<(String, String)> {
    for existing in registered {
        for prefix in candidate.backend_module_names() {
            let overlaps = existing
                .backend_module_names()
                .iter()
                .any(|other| prefix.starts_with(other.as_str()) || other.starts_with(prefix.as_str()));
            if overlaps {
                return Some((existing.identifier().to_string(), prefix.clone()));
            }
        }
    }
    None
}
