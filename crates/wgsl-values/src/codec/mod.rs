//! Value codec
//!
//! Converts between an editable JSON-with-comments text form and the raw bytes
//! of a GPU buffer, driven by the [`BufferSpec`] of a type. All operations are
//! pure functions of their inputs.

mod decode;
mod default_text;
mod encode;

pub use encode::EncodeError;

use bytes::Bytes;

use crate::{BufferSpec, CodecOptions, LayoutError, StructTable, TypeDescriptor, layout};

/// Layout resolution, default text generation and value conversion for one set of options
///
/// The codec holds no state besides its options, so a single instance can be
/// shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct ValueCodec {
    options: CodecOptions,
}

impl ValueCodec {
    pub fn new(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Resolves the buffer layout of `ty`
    pub fn resolve(&self, ty: &TypeDescriptor, structs: &StructTable) -> Result<BufferSpec, LayoutError> {
        layout::try_resolve_layout(ty, structs, &self.options)
    }

    /// Generates the default editable text for a value of type `ty`
    ///
    /// # Returns
    /// The text, or a message explaining why values of this type cannot be edited
    pub fn default_text(&self, ty: &TypeDescriptor, structs: &StructTable) -> Result<String, String> {
        default_text::generate(self, ty, structs)
    }

    /// Parses edited text into a buffer laid out for `ty`
    ///
    /// # Returns
    /// The encoded buffer, or the first problem found in the text
    pub fn try_encode(&self, ty: &TypeDescriptor, structs: &StructTable, text: &str) -> Result<Bytes, EncodeError> {
        let spec = self.resolve(ty, structs)?;
        encode::encode_spec(&spec, text)
    }

    /// Parses edited text into a buffer laid out for `ty`
    ///
    /// Returns `None` when the text does not match the layout. Editor input is
    /// expected to be invalid while the user is typing, so the reason is only
    /// logged at debug level.
    pub fn encode(&self, ty: &TypeDescriptor, structs: &StructTable, text: &str) -> Option<Bytes> {
        self.try_encode(ty, structs, text)
            .inspect_err(|e| {
                tracing::debug!(ty = %ty, "rejected input: {e}");
            })
            .ok()
    }

    /// Renders a buffer read back from the GPU as compact JSON text
    ///
    /// Never fails: problems are reported as a diagnostic message in place of the values.
    pub fn decode(&self, ty: &TypeDescriptor, structs: &StructTable, buffer: &[u8]) -> String {
        match self.resolve(ty, structs) {
            Ok(spec) => decode::decode_spec(&spec, ty, buffer),
            Err(e) => format!("Could not get buffer spec: {e}"),
        }
    }
}

/// Generates the default editable text for `ty` with default options
pub fn default_text(ty: &TypeDescriptor, structs: &StructTable) -> Result<String, String> {
    ValueCodec::default().default_text(ty, structs)
}

/// Parses edited text into a buffer for `ty` with default options
pub fn encode(ty: &TypeDescriptor, structs: &StructTable, text: &str) -> Option<Bytes> {
    ValueCodec::default().encode(ty, structs, text)
}

/// Renders a buffer as JSON text for `ty` with default options
pub fn decode(ty: &TypeDescriptor, structs: &StructTable, buffer: &[u8]) -> String {
    ValueCodec::default().decode(ty, structs, buffer)
}
