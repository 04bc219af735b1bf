//! Buffer to text decoding

use bytes::Buf;
use serde::Serialize;

use crate::{BufferSpec, Component, TypeDescriptor};

/// A decoded data component, serialized as a bare JSON number
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
enum DecodedValue {
    F32(f32),
    U32(u32),
    I32(i32),
}

pub(super) fn decode_spec(spec: &BufferSpec, ty: &TypeDescriptor, buffer: &[u8]) -> String {
    let components = if spec.repeat {
        let element_size = spec.byte_size();
        if element_size == 0 {
            return format!("Could not decode {ty}: element has no components");
        }
        if buffer.len() % element_size != 0 {
            tracing::warn!(ty = %ty, len = buffer.len(), element_size, "ignoring trailing bytes of a partial element");
        }
        spec.tiled(buffer.len() / element_size)
    } else {
        if buffer.len() < spec.byte_size() {
            return format!("Could not decode {ty}: expected {} bytes, found {}", spec.byte_size(), buffer.len());
        }
        spec.components()
    };

    let mut reader = buffer;
    let mut values = Vec::with_capacity(components.len());
    for component in components {
        match component {
            Component::F32 => values.push(DecodedValue::F32(reader.get_f32_le())),
            Component::U32 => values.push(DecodedValue::U32(reader.get_u32_le())),
            Component::I32 => values.push(DecodedValue::I32(reader.get_i32_le())),
            Component::Padding => reader.advance(Component::SIZE),
        }
    }

    let result = match values.as_slice() {
        [value] => serde_json::to_string(value),
        values => serde_json::to_string(values),
    };
    result.unwrap_or_else(|e| format!("Could not format values: {e}"))
}
