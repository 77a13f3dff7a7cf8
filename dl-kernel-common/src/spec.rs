//! Network and tensor spec value objects.

use serde::{Deserialize, Serialize};

/// Description of a single input or output tensor of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSpec {
    /// Tensor name as reported by the backend (e.g., "input_1:0")
    pub name: String,
    /// Fixed batch size, if the network declares one
    #[serde(default)]
    pub batch_size: Option<u64>,
    /// Shape without the batch dimension. `None` marks an unknown dimension.
    #[serde(default)]
    pub shape: Vec<Option<u64>>,
    /// Element type (e.g., "float32")
    pub element_type: String,
}

/// Input/output description of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Identifier of the network type that owns this network
    pub network_type: String,
    #[serde(default)]
    pub input_specs: Vec<TensorSpec>,
    #[serde(default)]
    pub intermediate_output_specs: Vec<TensorSpec>,
    #[serde(default)]
    pub output_specs: Vec<TensorSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_spec_unknown_dimension() {
        let json = r#"{"name": "input_1:0", "shape": [null, 28, 1], "element_type": "float32"}"#;
        let spec: TensorSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.batch_size, None);
        assert_eq!(spec.shape, vec![None, Some(28), Some(1)]);
    }

    #[test]
    fn test_network_spec_defaults_empty_lists() {
        let json = r#"{"network_type": "keras"}"#;
        let spec: NetworkSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.network_type, "keras");
        assert!(spec.input_specs.is_empty());
        assert!(spec.intermediate_output_specs.is_empty());
        assert!(spec.output_specs.is_empty());
    }
}
