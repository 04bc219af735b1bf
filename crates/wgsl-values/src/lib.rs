//! Layout and value codec for WGSL host-shareable buffers
//!
//! Given a reflected shader type, this crate computes its flattened buffer
//! layout, generates editable default text for it, and converts between that
//! text and the raw bytes a GPU buffer holds. Padding placement follows the
//! host-shareable layout reported by the reflector, so encoded buffers can be
//! uploaded as-is.
//!
//! ```
//! use wgsl_values::{ScalarKind, StructTable, TypeDescriptor};
//!
//! let ty = TypeDescriptor::runtime_array(TypeDescriptor::scalar(ScalarKind::I32), 4);
//! let structs = StructTable::new();
//!
//! let bytes = wgsl_values::encode(&ty, &structs, "[1, 2, 3, 4]").unwrap();
//! assert_eq!(bytes.len(), 16);
//! assert_eq!(wgsl_values::decode(&ty, &structs, &bytes), "[1,2,3,4]");
//! ```

mod options;
mod types;

pub mod codec;
pub mod field_layout;
pub mod layout;

pub use codec::{EncodeError, ValueCodec, decode, default_text, encode};
pub use field_layout::{FieldBox, field_layout};
pub use layout::{BufferSpec, Component, LayoutError, resolve_layout, try_resolve_layout};
pub use options::{CodecOptions, DEFAULT_RUNTIME_ARRAY_LEN};
pub use types::{OPAQUE_HANDLE_TYPES, ScalarKind, StructDef, StructMember, StructTable, TypeDescriptor, is_texture_or_sampler};
