//! Layout resolution
//!
//! Maps a [`TypeDescriptor`] onto a [`BufferSpec`]: a flattened list of 4-byte
//! components grouped into lines, with explicit padding slots wherever the
//! host-shareable layout rules leave gaps. Resolution either succeeds for the
//! whole type or fails; a partially resolved layout is never returned.

use serde::Serialize;

use crate::{CodecOptions, ScalarKind, StructTable, TypeDescriptor};

/// A single 4-byte slot in a buffer layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// 32-bit float
    F32,
    /// 32-bit unsigned integer
    U32,
    /// 32-bit signed integer
    I32,
    /// Alignment padding with no associated value
    Padding,
}

impl Component {
    /// Byte width of every component
    pub const SIZE: usize = 4;

    pub fn is_padding(self) -> bool {
        self == Self::Padding
    }

    /// Literal used for this component in generated default text
    pub fn default_literal(self) -> &'static str {
        match self {
            Self::F32 => "1.0",
            Self::U32 | Self::I32 => "1",
            Self::Padding => "null",
        }
    }
}

/// Flattened, padding-aware layout of a shader type
///
/// `lines` group components for display: one line per struct member, array
/// element or matrix row. When `repeat` is set the spec describes a single
/// element of a runtime-sized array and `lines` holds exactly that element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferSpec {
    /// Component groups in buffer order
    pub lines: Vec<Vec<Component>>,
    /// Whether the single line repeats to fill the buffer
    pub repeat: bool,
}

impl BufferSpec {
    fn single(line: Vec<Component>) -> Self {
        Self { lines: vec![line], repeat: false }
    }

    /// Number of components in one line, the element width for repeated specs
    pub fn line_width(&self) -> usize {
        self.lines.first().map_or(0, Vec::len)
    }

    /// Total number of components across all lines
    pub fn component_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    /// Byte size described by the spec (one element when `repeat` is set)
    pub fn byte_size(&self) -> usize {
        self.component_count() * Component::SIZE
    }

    /// All components in buffer order
    pub fn components(&self) -> Vec<Component> {
        self.lines.iter().flatten().copied().collect()
    }

    /// Components of `elements` consecutive copies of the first line
    pub fn tiled(&self, elements: usize) -> Vec<Component> {
        self.lines.first().map_or_else(Vec::new, |line| line.repeat(elements))
    }
}

/// Reasons a type cannot be laid out as host-visible numeric data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The type, or a type nested inside it, has no numeric encoding
    #[error("{0} is not supported")]
    Unsupported(String),
    /// A struct reference is missing from the struct table
    #[error("struct {0} is not defined")]
    UnknownStruct(String),
    /// A runtime-sized array appears anywhere but the top level
    #[error("runtime-sized {0} is only allowed as a whole binding")]
    NestedRuntimeArray(String),
    /// The first member of a struct does not start at offset zero
    #[error("member {member} of {name} starts at offset {offset} instead of 0")]
    LeadingGap { name: String, member: String, offset: u32 },
    /// A member extends past the offset of the next member or the struct end
    #[error("member {member} of {name} overlaps what follows it")]
    Overlap { name: String, member: String },
    /// A gap cannot be filled with whole 4-byte padding slots
    #[error("{gap} bytes of padding after member {member} of {name} is not a multiple of 4")]
    MisalignedGap { name: String, member: String, gap: u32 },
    /// An array stride is smaller than its element or not 4-byte aligned
    #[error("stride {stride} of {name} does not fit a {element_size}-byte element")]
    InvalidStride { name: String, stride: u32, element_size: u32 },
    /// The reported member size disagrees with the size of its resolved layout
    #[error("member {member} of {name} is reported as {reported} bytes but lays out as {resolved}")]
    SizeMismatch { name: String, member: String, reported: u32, resolved: u32 },
}

/// Resolves the layout of `ty`, returning `None` if it cannot be represented
///
/// Uses the default [`CodecOptions`].
pub fn resolve_layout(ty: &TypeDescriptor, structs: &StructTable) -> Option<BufferSpec> {
    try_resolve_layout(ty, structs, &CodecOptions::default()).ok()
}

/// Resolves the layout of `ty`, explaining why when it cannot be represented
///
/// # Arguments
/// * `ty` - The top-level type, typically a binding or function argument
/// * `structs` - Struct definitions from the same reflection pass as `ty`
/// * `options` - Resolution tunables
pub fn try_resolve_layout(ty: &TypeDescriptor, structs: &StructTable, options: &CodecOptions) -> Result<BufferSpec, LayoutError> {
    let resolver = LayoutResolver { structs, options };
    resolver.resolve(ty, true).inspect_err(|e| {
        tracing::debug!(ty = %ty, "could not resolve layout: {e}");
    })
}

struct LayoutResolver<'a> {
    structs: &'a StructTable,
    options: &'a CodecOptions,
}

impl LayoutResolver<'_> {
    fn resolve(&self, ty: &TypeDescriptor, top_level: bool) -> Result<BufferSpec, LayoutError> {
        match ty {
            TypeDescriptor::Scalar(kind) => Ok(BufferSpec::single(vec![data_component(Some(*kind), ty)?])),
            TypeDescriptor::Vector { kind, width } => {
                if !(2..=4).contains(width) {
                    return Err(LayoutError::Unsupported(ty.to_string()));
                }
                let component = data_component(*kind, ty)?;
                Ok(BufferSpec::single(vec![component; *width as usize]))
            }
            TypeDescriptor::Matrix { kind, columns, rows } => self.resolve_matrix(ty, *kind, *columns, *rows),
            TypeDescriptor::Array { element, count, stride } => self.resolve_array(ty, element, *count, *stride, top_level),
            TypeDescriptor::Struct(name) => self.resolve_struct(name),
            TypeDescriptor::Opaque(name) => Err(LayoutError::Unsupported(name.clone())),
        }
    }

    /// Matrices are grouped one line per row for editing. This is a display
    /// convention only: values are written in the order they are listed.
    ///
    /// Column vectors of three rows are 16 bytes apart in memory, so those
    /// matrices are grouped per column with a trailing padding slot instead.
    fn resolve_matrix(&self, ty: &TypeDescriptor, kind: Option<ScalarKind>, columns: u32, rows: u32) -> Result<BufferSpec, LayoutError> {
        if !(2..=4).contains(&columns) || !(2..=4).contains(&rows) {
            return Err(LayoutError::Unsupported(ty.to_string()));
        }
        let component = data_component(kind, ty)?;

        let lines = if rows == 3 {
            let column = vec![component, component, component, Component::Padding];
            vec![column; columns as usize]
        } else {
            vec![vec![component; columns as usize]; rows as usize]
        };

        Ok(BufferSpec { lines, repeat: false })
    }

    fn resolve_array(&self, ty: &TypeDescriptor, element: &TypeDescriptor, count: Option<u32>, stride: u32, top_level: bool) -> Result<BufferSpec, LayoutError> {
        if count.is_none() && !top_level {
            return Err(LayoutError::NestedRuntimeArray(ty.to_string()));
        }

        let mut line = self.resolve(element, false)?.components();
        let element_size = (line.len() * Component::SIZE) as u32;

        let stride = if self.options.vec3_stride_override && element.is_vec3() { 16 } else { stride };
        if stride < element_size || stride % 4 != 0 {
            return Err(LayoutError::InvalidStride {
                name: ty.to_string(),
                stride,
                element_size,
            });
        }
        line.extend(padding(stride - element_size));

        match count {
            Some(count) => Ok(BufferSpec {
                lines: vec![line; count as usize],
                repeat: false,
            }),
            None => Ok(BufferSpec { lines: vec![line], repeat: true }),
        }
    }

    fn resolve_struct(&self, name: &str) -> Result<BufferSpec, LayoutError> {
        let def = self.structs.get(name).ok_or_else(|| LayoutError::UnknownStruct(name.to_string()))?;

        if let Some(first) = def.members.first().filter(|member| member.offset != 0) {
            return Err(LayoutError::LeadingGap {
                name: def.name.clone(),
                member: first.name.clone(),
                offset: first.offset,
            });
        }

        let mut lines = Vec::with_capacity(def.members.len());
        for (index, member) in def.members.iter().enumerate() {
            let mut line = self.resolve(&member.ty, false)?.components();

            let resolved = (line.len() * Component::SIZE) as u32;
            if resolved != member.size {
                return Err(LayoutError::SizeMismatch {
                    name: def.name.clone(),
                    member: member.name.clone(),
                    reported: member.size,
                    resolved,
                });
            }

            let gap = def.padding_after(index).ok_or_else(|| LayoutError::Overlap {
                name: def.name.clone(),
                member: member.name.clone(),
            })?;
            if gap % 4 != 0 {
                return Err(LayoutError::MisalignedGap {
                    name: def.name.clone(),
                    member: member.name.clone(),
                    gap,
                });
            }
            line.extend(padding(gap));

            lines.push(line);
        }

        Ok(BufferSpec { lines, repeat: false })
    }
}

/// Maps a scalar kind onto an encodable component
fn data_component(kind: Option<ScalarKind>, ty: &TypeDescriptor) -> Result<Component, LayoutError> {
    match kind {
        Some(ScalarKind::F32) => Ok(Component::F32),
        Some(ScalarKind::U32) => Ok(Component::U32),
        Some(ScalarKind::I32) => Ok(Component::I32),
        // f16 has no typed array support in browsers and bool has no defined host layout
        Some(ScalarKind::F16 | ScalarKind::Bool) | None => Err(LayoutError::Unsupported(ty.to_string())),
    }
}

fn padding(bytes: u32) -> impl Iterator<Item = Component> {
    std::iter::repeat(Component::Padding).take(bytes as usize / Component::SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StructDef, StructMember};
    use Component::{F32, I32, Padding, U32};

    fn f32_ty() -> TypeDescriptor {
        TypeDescriptor::scalar(ScalarKind::F32)
    }

    fn vec3f() -> TypeDescriptor {
        TypeDescriptor::vector(ScalarKind::F32, 3)
    }

    fn resolve(ty: &TypeDescriptor, structs: &StructTable) -> Result<BufferSpec, LayoutError> {
        try_resolve_layout(ty, structs, &CodecOptions::default())
    }

    fn padded_struct() -> StructTable {
        [StructDef::new(
            "S",
            32,
            vec![StructMember::new("a", 0, 4, f32_ty()), StructMember::new("b", 16, 12, vec3f())],
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_scalars() {
        let structs = StructTable::new();
        for (kind, component) in [(ScalarKind::F32, F32), (ScalarKind::U32, U32), (ScalarKind::I32, I32)] {
            let spec = resolve(&TypeDescriptor::scalar(kind), &structs).unwrap();
            assert_eq!(spec, BufferSpec::single(vec![component]));
        }
    }

    #[test]
    fn test_vector_and_matrix() {
        let structs = StructTable::new();

        let spec = resolve(&TypeDescriptor::vector(ScalarKind::U32, 4), &structs).unwrap();
        assert_eq!(spec.lines, vec![vec![U32, U32, U32, U32]]);

        let spec = resolve(&TypeDescriptor::matrix(ScalarKind::F32, 4, 4), &structs).unwrap();
        assert_eq!(spec.lines.len(), 4);
        assert!(spec.lines.iter().all(|line| line == &vec![F32; 4]));

        // mat2x4: four rows of two columns, eight contiguous floats
        let spec = resolve(&TypeDescriptor::matrix(ScalarKind::F32, 2, 4), &structs).unwrap();
        assert_eq!(spec.lines, vec![vec![F32, F32]; 4]);
        assert_eq!(spec.byte_size(), 32);
    }

    #[test]
    fn test_three_row_matrix_pads_columns() {
        let structs = StructTable::new();

        let spec = resolve(&TypeDescriptor::matrix(ScalarKind::F32, 3, 3), &structs).unwrap();
        assert_eq!(spec.lines, vec![vec![F32, F32, F32, Padding]; 3]);
        assert_eq!(spec.byte_size(), 48);

        let spec = resolve(&TypeDescriptor::matrix(ScalarKind::F32, 2, 3), &structs).unwrap();
        assert_eq!(spec.byte_size(), 32);
    }

    #[test]
    fn test_padded_struct() {
        let spec = resolve(&TypeDescriptor::struct_ref("S"), &padded_struct()).unwrap();

        assert!(!spec.repeat);
        assert_eq!(spec.lines, vec![vec![F32, Padding, Padding, Padding], vec![F32, F32, F32, Padding]]);
        assert_eq!(spec.byte_size(), 32);
    }

    #[test]
    fn test_nested_struct_array() {
        let mut structs = padded_struct();
        structs.insert(StructDef::new(
            "Outer",
            80,
            vec![
                StructMember::new("count", 0, 4, TypeDescriptor::scalar(ScalarKind::U32)),
                StructMember::new("items", 16, 64, TypeDescriptor::array(TypeDescriptor::struct_ref("S"), 2, 32)),
            ],
        ));

        let spec = resolve(&TypeDescriptor::struct_ref("Outer"), &structs).unwrap();
        assert_eq!(spec.lines.len(), 2);
        assert_eq!(spec.lines[0], vec![U32, Padding, Padding, Padding]);
        assert_eq!(spec.lines[1].len(), 16);
        assert_eq!(spec.byte_size(), 80);
    }

    #[test]
    fn test_vec3_array_stride_override() {
        let structs = StructTable::new();

        // Reported stride of 12 is ignored
        let spec = resolve(&TypeDescriptor::array(vec3f(), 3, 12), &structs).unwrap();
        assert_eq!(spec.lines, vec![vec![F32, F32, F32, Padding]; 3]);

        let spec = resolve(&TypeDescriptor::array(TypeDescriptor::vector(ScalarKind::I32, 3), 2, 16), &structs).unwrap();
        assert_eq!(spec.lines, vec![vec![I32, I32, I32, Padding]; 2]);
    }

    #[test]
    fn test_vec3_array_stride_override_disabled() {
        let options = CodecOptions {
            vec3_stride_override: false,
            ..CodecOptions::default()
        };
        let structs = StructTable::new();

        let spec = try_resolve_layout(&TypeDescriptor::array(vec3f(), 2, 12), &structs, &options).unwrap();
        assert_eq!(spec.lines, vec![vec![F32, F32, F32]; 2]);

        let spec = try_resolve_layout(&TypeDescriptor::array(vec3f(), 2, 16), &structs, &options).unwrap();
        assert_eq!(spec.lines, vec![vec![F32, F32, F32, Padding]; 2]);
    }

    #[test]
    fn test_array_stride_padding() {
        let structs = StructTable::new();
        let spec = resolve(&TypeDescriptor::array(f32_ty(), 2, 16), &structs).unwrap();
        assert_eq!(spec.lines, vec![vec![F32, Padding, Padding, Padding]; 2]);
    }

    #[test]
    fn test_runtime_array() {
        let structs = StructTable::new();
        let spec = resolve(&TypeDescriptor::runtime_array(TypeDescriptor::scalar(ScalarKind::I32), 4), &structs).unwrap();

        assert!(spec.repeat);
        assert_eq!(spec.lines, vec![vec![I32]]);
        assert_eq!(spec.tiled(3), vec![I32, I32, I32]);
    }

    #[test]
    fn test_nested_runtime_array_is_rejected() {
        let structs: StructTable = [StructDef::new(
            "Particles",
            16,
            vec![
                StructMember::new("count", 0, 4, TypeDescriptor::scalar(ScalarKind::U32)),
                StructMember::new("items", 4, 4, TypeDescriptor::runtime_array(f32_ty(), 4)),
            ],
        )]
        .into_iter()
        .collect();

        let err = resolve(&TypeDescriptor::struct_ref("Particles"), &structs).unwrap_err();
        assert_eq!(err, LayoutError::NestedRuntimeArray("array<f32>".to_string()));

        let nested = TypeDescriptor::array(TypeDescriptor::runtime_array(f32_ty(), 4), 2, 4);
        assert!(resolve(&nested, &structs).is_err());
    }

    #[test]
    fn test_unsupported_types_at_any_depth() {
        let bool_ty = TypeDescriptor::scalar(ScalarKind::Bool);
        let f16_ty = TypeDescriptor::scalar(ScalarKind::F16);
        let structs: StructTable = [
            StructDef::new("WithBool", 8, vec![StructMember::new("a", 0, 4, f32_ty()), StructMember::new("flag", 4, 4, bool_ty.clone())]),
            StructDef::new("WithTexture", 4, vec![StructMember::new("t", 0, 4, TypeDescriptor::opaque("texture_2d"))]),
        ]
        .into_iter()
        .collect();

        let rejected = [
            bool_ty.clone(),
            f16_ty.clone(),
            TypeDescriptor::vector(ScalarKind::Bool, 2),
            TypeDescriptor::vector(ScalarKind::F16, 4),
            TypeDescriptor::matrix(ScalarKind::F16, 2, 2),
            TypeDescriptor::Vector { kind: None, width: 3 },
            TypeDescriptor::opaque("texture_2d"),
            TypeDescriptor::opaque("sampler"),
            TypeDescriptor::array(bool_ty, 4, 4),
            TypeDescriptor::runtime_array(f16_ty, 2),
            TypeDescriptor::struct_ref("WithBool"),
            TypeDescriptor::struct_ref("WithTexture"),
            TypeDescriptor::array(TypeDescriptor::struct_ref("WithBool"), 2, 8),
        ];
        for ty in rejected {
            assert!(resolve_layout(&ty, &structs).is_none(), "{ty} should not resolve");
        }
    }

    #[test]
    fn test_unsupported_error_names_inner_type() {
        let structs: StructTable = [StructDef::new("Flags", 4, vec![StructMember::new("on", 0, 4, TypeDescriptor::scalar(ScalarKind::Bool))])]
            .into_iter()
            .collect();

        let err = resolve(&TypeDescriptor::struct_ref("Flags"), &structs).unwrap_err();
        assert_eq!(err, LayoutError::Unsupported("bool".to_string()));
    }

    #[test]
    fn test_unknown_struct() {
        let err = resolve(&TypeDescriptor::struct_ref("Missing"), &StructTable::new()).unwrap_err();
        assert_eq!(err, LayoutError::UnknownStruct("Missing".to_string()));
    }

    #[test]
    fn test_inconsistent_structs_are_rejected() {
        let overlap: StructTable = [StructDef::new("O", 8, vec![StructMember::new("a", 0, 8, TypeDescriptor::vector(ScalarKind::F32, 2)), StructMember::new("b", 4, 4, f32_ty())])]
            .into_iter()
            .collect();
        assert!(matches!(resolve(&TypeDescriptor::struct_ref("O"), &overlap), Err(LayoutError::Overlap { .. })));

        let misaligned: StructTable = [StructDef::new("M", 6, vec![StructMember::new("a", 0, 4, f32_ty())])].into_iter().collect();
        assert!(matches!(resolve(&TypeDescriptor::struct_ref("M"), &misaligned), Err(LayoutError::MisalignedGap { gap: 2, .. })));

        let wrong_size: StructTable = [StructDef::new("W", 16, vec![StructMember::new("a", 0, 8, f32_ty())])].into_iter().collect();
        assert!(matches!(
            resolve(&TypeDescriptor::struct_ref("W"), &wrong_size),
            Err(LayoutError::SizeMismatch { reported: 8, resolved: 4, .. })
        ));

        let leading: StructTable = [StructDef::new("L", 8, vec![StructMember::new("a", 4, 4, f32_ty())])].into_iter().collect();
        assert!(matches!(resolve(&TypeDescriptor::struct_ref("L"), &leading), Err(LayoutError::LeadingGap { offset: 4, .. })));
    }

    #[test]
    fn test_invalid_stride() {
        let structs = StructTable::new();
        let err = resolve(&TypeDescriptor::array(TypeDescriptor::vector(ScalarKind::F32, 4), 2, 8), &structs).unwrap_err();
        assert_eq!(
            err,
            LayoutError::InvalidStride {
                name: "array<vec4<f32>, 2>".to_string(),
                stride: 8,
                element_size: 16,
            }
        );
    }
}
