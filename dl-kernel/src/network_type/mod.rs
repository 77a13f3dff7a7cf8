//! Network type plugin layer.
//!
//! This module defines the `NetworkType` trait that describes a deep learning
//! framework (Keras, ONNX, etc.) to the kernel, plus the registry that maps
//! identifiers and model runtime types to the registered network types.

mod declared;
mod registry;

pub use declared::{DeclaredNetworkType, JsonSpecReader};
pub use registry::{NetworkTypeRegistry, PrefixPolicy};

use std::borrow::Cow;
use std::path::Path;

use async_trait::async_trait;
use dl_kernel_common::{NetworkSpec, NetworkTypeInfo};

use crate::error::Result;

/// An opaque model instance produced by some backend framework.
pub trait RawModel: Send + Sync {
    /// Fully qualified runtime type name of the model.
    ///
    /// Models proxied from a foreign framework override this with the
    /// framework's own class path (e.g., "keras.engine.training.Model").
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Input/output description, if the model can report one.
    fn describe(&self) -> Option<NetworkSpec> {
        None
    }
}

/// A model wrapped into the kernel's common network abstraction.
pub trait Network: Send + Sync {
    /// Identifier of the network type that produced this network.
    fn network_type(&self) -> &str;

    /// Input/output description of the network.
    fn spec(&self) -> Result<NetworkSpec>;
}

/// Reads networks of one network type from disk.
#[async_trait]
pub trait NetworkReader: Send + Sync {
    async fn read(&self, path: &Path) -> Result<Box<dyn Network>>;
}

/// Primary trait for network type plugins.
///
/// Each supported framework implements this trait once and is registered
/// with the `NetworkTypeRegistry` at start-up.
pub trait NetworkType: Send + Sync {
    /// Unique identifier for this network type (e.g., "keras").
    fn identifier(&self) -> &str;

    /// Runtime type name prefixes of models owned by this network type.
    fn backend_module_names(&self) -> &[String];

    /// Create a reader for this network type's model format.
    fn reader(&self) -> Box<dyn NetworkReader>;

    /// Wrap a raw model into a network.
    fn wrap_model(&self, model: Box<dyn RawModel>) -> Result<Box<dyn Network>>;

    /// Whether a model of the given runtime type belongs to this network type.
    fn owns_type_name(&self, type_name: &str) -> bool {
        self.backend_module_names()
            .iter()
            .any(|prefix| type_name.starts_with(prefix.as_str()))
    }

    fn info(&self) -> NetworkTypeInfo {
        NetworkTypeInfo {
            identifier: self.identifier().to_string(),
            backend_module_names: self.backend_module_names().to_vec(),
        }
    }
}

impl std::fmt::Debug for dyn NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkType")
            .field("identifier", &self.identifier())
            .field("backend_module_names", &self.backend_module_names())
            .finish()
    }
}

impl std::fmt::Debug for dyn Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("network_type", &self.network_type())
            .finish()
    }
}
