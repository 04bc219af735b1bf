//! naga type conversion
//!
//! Translates naga's type arena into [`TypeDescriptor`]s and a [`StructTable`].
//! Sizes, offsets and strides are taken from naga's own layout computation.

use naga::{ArraySize, Handle, ImageClass, ImageDimension, Module, Scalar, Type, TypeInner};
use wgsl_values::{ScalarKind, StructDef, StructMember, StructTable, TypeDescriptor};

/// Converts types of a single naga module
pub(crate) struct TypeConverter<'a> {
    module: &'a Module,
}

impl<'a> TypeConverter<'a> {
    pub(crate) fn new(module: &'a Module) -> Self {
        Self { module }
    }

    /// Converts the type behind `handle`
    ///
    /// Types with no numeric buffer representation become [`TypeDescriptor::Opaque`]
    /// named after their WGSL spelling, so they can be reported to the user.
    pub(crate) fn convert(&self, handle: Handle<Type>) -> TypeDescriptor {
        let ty = &self.module.types[handle];
        match &ty.inner {
            // Atomics share the layout of their underlying scalar
            TypeInner::Scalar(scalar) | TypeInner::Atomic(scalar) => match scalar_kind(*scalar) {
                Some(kind) => TypeDescriptor::Scalar(kind),
                None => TypeDescriptor::Opaque(scalar_name(*scalar)),
            },
            TypeInner::Vector { size, scalar } => TypeDescriptor::Vector {
                kind: scalar_kind(*scalar),
                width: *size as u32,
            },
            TypeInner::Matrix { columns, rows, scalar } => TypeDescriptor::Matrix {
                kind: scalar_kind(*scalar),
                columns: *columns as u32,
                rows: *rows as u32,
            },
            TypeInner::Array { base, size, stride } => {
                let element = Box::new(self.convert(*base));
                match size {
                    ArraySize::Constant(count) => TypeDescriptor::Array {
                        element,
                        count: Some(count.get()),
                        stride: *stride,
                    },
                    ArraySize::Dynamic => TypeDescriptor::Array {
                        element,
                        count: None,
                        stride: *stride,
                    },
                    // Override-sized arrays have no length until pipeline creation
                    #[allow(unreachable_patterns)]
                    _ => TypeDescriptor::Opaque(format!("array<{element}, override>")),
                }
            }
            TypeInner::Struct { .. } => TypeDescriptor::Struct(self.struct_name(handle)),
            TypeInner::Image { dim, arrayed, class } => TypeDescriptor::Opaque(image_name(*dim, *arrayed, class)),
            TypeInner::Sampler { comparison: false } => TypeDescriptor::Opaque("sampler".to_string()),
            TypeInner::Sampler { comparison: true } => TypeDescriptor::Opaque("sampler_comparison".to_string()),
            _ => TypeDescriptor::Opaque(ty.name.clone().unwrap_or_else(|| "unknown".to_string())),
        }
    }

    /// Collects every struct type in the module
    pub(crate) fn struct_table(&self) -> StructTable {
        self.module
            .types
            .iter()
            .filter_map(|(handle, ty)| match &ty.inner {
                TypeInner::Struct { members, span } => {
                    let members = members
                        .iter()
                        .enumerate()
                        .map(|(index, member)| {
                            let name = member.name.clone().unwrap_or_else(|| format!("member{index}"));
                            let size = self.module.types[member.ty].inner.size(self.module.to_ctx());
                            StructMember::new(name, member.offset, size, self.convert(member.ty))
                        })
                        .collect();
                    Some(StructDef::new(self.struct_name(handle), *span, members))
                }
                _ => None,
            })
            .collect()
    }

    fn struct_name(&self, handle: Handle<Type>) -> String {
        self.module.types[handle].name.clone().unwrap_or_else(|| format!("__struct{}", handle.index()))
    }
}

fn scalar_kind(scalar: Scalar) -> Option<ScalarKind> {
    match (scalar.kind, scalar.width) {
        (naga::ScalarKind::Float, 4) => Some(ScalarKind::F32),
        (naga::ScalarKind::Float, 2) => Some(ScalarKind::F16),
        (naga::ScalarKind::Uint, 4) => Some(ScalarKind::U32),
        (naga::ScalarKind::Sint, 4) => Some(ScalarKind::I32),
        (naga::ScalarKind::Bool, _) => Some(ScalarKind::Bool),
        _ => None,
    }
}

fn scalar_name(scalar: Scalar) -> String {
    let prefix = match scalar.kind {
        naga::ScalarKind::Float => "f",
        naga::ScalarKind::Uint => "u",
        naga::ScalarKind::Sint => "i",
        naga::ScalarKind::Bool => return "bool".to_string(),
        naga::ScalarKind::AbstractInt => return "AbstractInt".to_string(),
        naga::ScalarKind::AbstractFloat => return "AbstractFloat".to_string(),
    };
    format!("{prefix}{}", u32::from(scalar.width) * 8)
}

/// WGSL spelling of a texture type, e.g. `texture_depth_2d_array`
fn image_name(dim: ImageDimension, arrayed: bool, class: &ImageClass) -> String {
    let dim = match dim {
        ImageDimension::D1 => "1d",
        ImageDimension::D2 => "2d",
        ImageDimension::D3 => "3d",
        ImageDimension::Cube => "cube",
    };
    let array = if arrayed { "_array" } else { "" };

    match class {
        ImageClass::Sampled { multi: true, .. } => format!("texture_multisampled_{dim}"),
        ImageClass::Sampled { .. } => format!("texture_{dim}{array}"),
        ImageClass::Depth { multi: true } => format!("texture_depth_multisampled_{dim}"),
        ImageClass::Depth { .. } => format!("texture_depth_{dim}{array}"),
        ImageClass::Storage { .. } => format!("texture_storage_{dim}{array}"),
        #[allow(unreachable_patterns)]
        _ => "texture_external".to_string(),
    }
}
