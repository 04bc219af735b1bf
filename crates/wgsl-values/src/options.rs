//! Codec configuration

use serde::{Deserialize, Serialize};

/// Number of example elements generated for a runtime-sized array
pub const DEFAULT_RUNTIME_ARRAY_LEN: usize = 6;

/// Tunables for layout resolution and default value generation
///
/// Every field has a default, so a partial YAML or JSON document is enough
/// to override a single setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CodecOptions {
    /// Force a 16-byte stride for arrays of 3-component vectors
    ///
    /// Some reflectors report the packed 12-byte size as the stride of
    /// `array<vec3<T>, N>`. Host-shareable layout always rounds it up to 16.
    /// Disable this when the reflector in use reports correct strides.
    pub vec3_stride_override: bool,
    /// Number of elements written into the default text of a runtime-sized array
    pub runtime_array_len: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            vec3_stride_override: true,
            runtime_array_len: DEFAULT_RUNTIME_ARRAY_LEN,
        }
    }
}

impl CodecOptions {
    /// Parses options from a YAML document
    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }
}
