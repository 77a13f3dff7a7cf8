//! Network types declared in configuration.
//!
//! A declared network type has no framework code behind it. Its reader loads
//! a serialized `NetworkSpec` from a JSON file, and wrapped models report
//! their spec through `RawModel::describe`.

use std::path::Path;

use async_trait::async_trait;
use dl_kernel_common::NetworkSpec;

use super::{Network, NetworkReader, NetworkType, RawModel};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct DeclaredNetworkType {
    identifier: String,
    backend_module_names: Vec<String>,
}

impl DeclaredNetworkType {
    pub fn new(identifier: impl Into<String>, backend_module_names: Vec<String>) -> Self {
        Self {
            identifier: identifier.into(),
            backend_module_names,
        }
    }
}

impl NetworkType for DeclaredNetworkType {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn backend_module_names(&self) -> &[String] {
        &self.backend_module_names
    }

    fn reader(&self) -> Box<dyn NetworkReader> {
        Box::new(JsonSpecReader::new(self.identifier.clone()))
    }

    fn wrap_model(&self, model: Box<dyn RawModel>) -> Result<Box<dyn Network>> {
        Ok(Box::new(WrappedModel {
            network_type: self.identifier.clone(),
            model,
        }))
    }
}

/// Reads a `NetworkSpec` serialized as JSON.
pub struct JsonSpecReader {
    network_type: String,
}

impl JsonSpecReader {
    pub fn new(network_type: impl Into<String>) -> Self {
        Self {
            network_type: network_type.into(),
        }
    }
}

#[async_trait]
impl NetworkReader for JsonSpecReader {
    async fn read(&self, path: &Path) -> Result<Box<dyn Network>> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::ReadFailed(format!("{}: {}", path.display(), e)))?;

        let spec: NetworkSpec = serde_json::from_str(&contents)
            .map_err(|e| Error::ReadFailed(format!("{}: {}", path.display(), e)))?;

        if spec.network_type != self.network_type {
            return Err(Error::ReadFailed(format!(
                "{}: network belongs to type '{}', expected '{}'",
                path.display(),
                spec.network_type,
                self.network_type
            )));
        }

        tracing::debug!("Read {} network from {}", self.network_type, path.display());
        Ok(Box::new(SpecNetwork { spec }))
    }
}

/// Network loaded from a spec file.
struct SpecNetwork {
    spec: NetworkSpec,
}

impl Network for SpecNetwork {
    fn network_type(&self) -> &str {
        &self.spec.network_type
    }

    fn spec(&self) -> Result<NetworkSpec> {
        Ok(self.spec.clone())
    }
}

/// Raw model wrapped by a declared network type.
struct WrappedModel {
    network_type: String,
    model: Box<dyn RawModel>,
}

impl Network for WrappedModel {
    fn network_type(&self) -> &str {
        &self.network_type
    }

    fn spec(&self) -> Result<NetworkSpec> {
        let mut spec = self
            .model
            .describe()
            .ok_or_else(|| Error::SpecUnavailable(self.model.type_name().into_owned()))?;
        spec.network_type = self.network_type.clone();
        Ok(spec)
    }
}
