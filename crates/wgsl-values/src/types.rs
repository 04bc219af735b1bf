//! Shader type descriptors
//!
//! These types describe the shape of a shader-visible value as reported by a
//! reflector: scalars, vectors, matrices, arrays, structs and opaque handles.
//! Byte sizes, offsets and strides are taken from the reflector as-is; nothing
//! in this module parses shader source.

use std::collections::HashMap;
use std::fmt;

/// Texture and sampler type names that can never be edited as numeric data
pub const OPAQUE_HANDLE_TYPES: &[&str] = &[
    "texture_1d",
    "texture_2d",
    "texture_2d_array",
    "texture_3d",
    "texture_cube",
    "texture_cube_array",
    "texture_multisampled_2d",
    "texture_depth_multisampled_2d",
    "texture_external",
    "texture_storage_1d",
    "texture_storage_2d",
    "texture_storage_2d_array",
    "texture_storage_3d",
    "texture_depth_2d",
    "texture_depth_2d_array",
    "texture_depth_cube",
    "texture_depth_cube_array",
    "sampler",
    "sampler_comparison",
];

/// Returns true if `name` is a WGSL texture or sampler type
pub fn is_texture_or_sampler(name: &str) -> bool {
    OPAQUE_HANDLE_TYPES.contains(&name)
}

/// Scalar formats a reflector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 32-bit IEEE-754 float
    F32,
    /// 32-bit unsigned integer
    U32,
    /// 32-bit signed integer
    I32,
    /// 16-bit float (never encodable)
    F16,
    /// Boolean (never encodable)
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::F32 => "f32",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F16 => "f16",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// The shape of a shader-visible type
///
/// Struct types are referenced by name and resolved against a [`StructTable`]
/// built from the same reflection pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// A single scalar value
    Scalar(ScalarKind),
    /// A 2, 3 or 4 component vector
    ///
    /// `kind` is `None` when the reflector could not determine a concrete
    /// scalar format for a templated vector.
    Vector { kind: Option<ScalarKind>, width: u32 },
    /// A `columns` x `rows` matrix
    Matrix { kind: Option<ScalarKind>, columns: u32, rows: u32 },
    /// A fixed-size (`count: Some`) or runtime-sized (`count: None`) array
    Array {
        /// Element type
        element: Box<TypeDescriptor>,
        /// Number of elements, `None` for runtime-sized arrays
        count: Option<u32>,
        /// Byte stride between elements as reported by the reflector
        stride: u32,
    },
    /// A reference to a struct definition by name
    Struct(String),
    /// Anything that is not plain numeric data, such as textures and samplers
    Opaque(String),
}

impl TypeDescriptor {
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }

    pub fn vector(kind: ScalarKind, width: u32) -> Self {
        Self::Vector { kind: Some(kind), width }
    }

    pub fn matrix(kind: ScalarKind, columns: u32, rows: u32) -> Self {
        Self::Matrix { kind: Some(kind), columns, rows }
    }

    pub fn array(element: TypeDescriptor, count: u32, stride: u32) -> Self {
        Self::Array {
            element: Box::new(element),
            count: Some(count),
            stride,
        }
    }

    pub fn runtime_array(element: TypeDescriptor, stride: u32) -> Self {
        Self::Array {
            element: Box::new(element),
            count: None,
            stride,
        }
    }

    pub fn struct_ref(name: impl Into<String>) -> Self {
        Self::Struct(name.into())
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::Opaque(name.into())
    }

    /// Returns true for any 3-component vector, regardless of its scalar kind
    pub fn is_vec3(&self) -> bool {
        matches!(self, Self::Vector { width: 3, .. })
    }

    /// Returns true for an array without a fixed element count
    pub fn is_runtime_array(&self) -> bool {
        matches!(self, Self::Array { count: None, .. })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{kind}"),
            Self::Vector { kind: Some(kind), width } => write!(f, "vec{width}<{kind}>"),
            Self::Vector { kind: None, width } => write!(f, "vec{width}"),
            Self::Matrix { kind: Some(kind), columns, rows } => write!(f, "mat{columns}x{rows}<{kind}>"),
            Self::Matrix { kind: None, columns, rows } => write!(f, "mat{columns}x{rows}"),
            Self::Array { element, count: Some(count), .. } => write!(f, "array<{element}, {count}>"),
            Self::Array { element, count: None, .. } => write!(f, "array<{element}>"),
            Self::Struct(name) | Self::Opaque(name) => f.write_str(name),
        }
    }
}

/// A single member of a struct definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMember {
    /// Member name as declared in the shader
    pub name: String,
    /// Byte offset from the start of the struct
    pub offset: u32,
    /// Byte size of the member
    pub size: u32,
    /// Member type
    pub ty: TypeDescriptor,
}

impl StructMember {
    pub fn new(name: impl Into<String>, offset: u32, size: u32, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
            ty,
        }
    }

    /// Byte offset just past the end of this member
    pub fn end(&self) -> u32 {
        self.offset.saturating_add(self.size)
    }
}

/// A struct definition with its reflected layout
///
/// Members are ordered by ascending offset. Gaps between members are padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    /// Struct name
    pub name: String,
    /// Total byte size including trailing padding
    pub size: u32,
    /// Members in offset order
    pub members: Vec<StructMember>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, size: u32, members: Vec<StructMember>) -> Self {
        Self {
            name: name.into(),
            size,
            members,
        }
    }

    /// Offset where the padding after member `index` ends
    ///
    /// This is the next member's offset, or the struct size for the last member.
    pub fn next_offset(&self, index: usize) -> u32 {
        self.members.get(index + 1).map_or(self.size, |member| member.offset)
    }

    /// Number of padding bytes between member `index` and whatever follows it
    pub fn padding_after(&self, index: usize) -> Option<u32> {
        let member = self.members.get(index)?;
        self.next_offset(index).checked_sub(member.end())
    }
}

/// All struct definitions produced by one reflection pass, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTable {
    structs: HashMap<String, StructDef>,
}

impl StructTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a struct, replacing any previous definition with the same name
    pub fn insert(&mut self, def: StructDef) {
        self.structs.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    pub fn len(&self) -> usize {
        self.structs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values()
    }
}

impl FromIterator<StructDef> for StructTable {
    fn from_iter<I: IntoIterator<Item = StructDef>>(iter: I) -> Self {
        let mut table = Self::new();
        for def in iter {
            table.insert(def);
        }
        table
    }
}
