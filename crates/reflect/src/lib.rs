//! WGSL reflection for the value codec
//!
//! Parses WGSL with naga and exposes the shader's resource bindings and struct
//! definitions in the form [`wgsl_values`] consumes, so each buffer binding can
//! be given editable default text and encoded into upload-ready bytes.

mod convert;

use bytes::Bytes;
use serde::Serialize;
use wgsl_values::{EncodeError, StructTable, TypeDescriptor, ValueCodec};

use crate::convert::TypeConverter;

/// Errors raised while reflecting a shader or preparing its resources
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// The WGSL source failed to parse
    #[error("failed to parse WGSL:\n{0}")]
    Parse(String),
    /// No default text can be generated for a buffer binding
    #[error("binding {id}: {message}")]
    DefaultValue { id: String, message: String },
    /// Default text was generated but does not encode
    #[error("binding {id}: could not encode default value")]
    Encode {
        id: String,
        #[source]
        source: EncodeError,
    },
}

/// How a binding is accessed by the shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingKind {
    Uniform,
    Storage { writable: bool },
    /// Textures and samplers
    Handle,
}

impl BindingKind {
    /// Whether the binding is backed by a buffer the codec can fill
    pub fn is_buffer(self) -> bool {
        !matches!(self, Self::Handle)
    }
}

/// A resource binding declared by the shader
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub group: u32,
    pub binding: u32,
    pub name: String,
    pub ty: TypeDescriptor,
    pub kind: BindingKind,
}

impl Binding {
    /// `"group:binding"`, the key resources are addressed by
    pub fn id(&self) -> String {
        format!("{}:{}", self.group, self.binding)
    }
}

/// A buffer binding with its default text and encoded contents
#[derive(Debug, Clone, PartialEq)]
pub struct BindingResource {
    pub id: String,
    pub name: String,
    /// Editable value text
    pub input: String,
    /// Bytes encoded from `input`
    pub output: Bytes,
}

/// Bindings and struct definitions reflected from one shader module
#[derive(Debug, Clone)]
pub struct Reflection {
    pub structs: StructTable,
    /// Sorted by group, then binding
    pub bindings: Vec<Binding>,
}

impl Reflection {
    /// Parses WGSL source and reflects it
    pub fn parse(source: &str) -> Result<Self, ReflectError> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| ReflectError::Parse(e.emit_to_string(source)))?;
        Ok(Self::from_module(&module))
    }

    /// Reflects an already parsed module
    pub fn from_module(module: &naga::Module) -> Self {
        let converter = TypeConverter::new(module);
        let structs = converter.struct_table();

        let mut bindings: Vec<Binding> = module
            .global_variables
            .iter()
            .filter_map(|(_, var)| {
                let resource = var.binding.as_ref()?;
                let kind = match var.space {
                    naga::AddressSpace::Uniform => BindingKind::Uniform,
                    naga::AddressSpace::Storage { access } => BindingKind::Storage {
                        writable: access.contains(naga::StorageAccess::STORE),
                    },
                    naga::AddressSpace::Handle => BindingKind::Handle,
                    _ => return None,
                };
                Some(Binding {
                    group: resource.group,
                    binding: resource.binding,
                    name: var.name.clone().unwrap_or_default(),
                    ty: converter.convert(var.ty),
                    kind,
                })
            })
            .collect();
        bindings.sort_by_key(|b| (b.group, b.binding));

        tracing::debug!(structs = structs.len(), bindings = bindings.len(), "reflected shader module");

        Self { structs, bindings }
    }

    /// Looks up a binding by its group and binding index
    pub fn binding(&self, group: u32, binding: u32) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.group == group && b.binding == binding)
    }

    /// Default text and bytes for every buffer binding
    ///
    /// Fails on the first binding whose type the codec cannot represent.
    pub fn default_resources(&self, codec: &ValueCodec) -> Result<Vec<BindingResource>, ReflectError> {
        self.bindings
            .iter()
            .filter(|binding| binding.kind.is_buffer())
            .map(|binding| {
                let id = binding.id();
                let input = codec
                    .default_text(&binding.ty, &self.structs)
                    .map_err(|message| ReflectError::DefaultValue { id: id.clone(), message })?;
                let output = codec
                    .try_encode(&binding.ty, &self.structs, &input)
                    .map_err(|source| ReflectError::Encode { id: id.clone(), source })?;
                Ok(BindingResource {
                    id,
                    name: binding.name.clone(),
                    input,
                    output,
                })
            })
            .collect()
    }
}
