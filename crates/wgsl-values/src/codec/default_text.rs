//! Default value text generation

use super::ValueCodec;
use crate::{BufferSpec, Component, ScalarKind, StructDef, StructTable, TypeDescriptor, is_texture_or_sampler};

/// Lines rendered no wider than this are kept on a single line
const INLINE_LINE_WIDTH: usize = 3;

const INDENT: &str = "    ";

pub(super) fn generate(codec: &ValueCodec, ty: &TypeDescriptor, structs: &StructTable) -> Result<String, String> {
    match ty {
        TypeDescriptor::Scalar(ScalarKind::F16 | ScalarKind::Bool) => {
            return Err(format!("{ty} not supported due to limited browser support"));
        }
        TypeDescriptor::Opaque(name) if is_texture_or_sampler(name) => {
            return Err(format!("{name} not supported"));
        }
        _ => {}
    }

    let spec = codec.resolve(ty, structs).map_err(|e| format!("Unknown type: {ty} ({e})"))?;

    match ty {
        TypeDescriptor::Struct(name) => structs.get(name).map(|def| struct_text(def, &spec)).ok_or_else(|| format!("Unknown type: {ty}")),
        TypeDescriptor::Array { .. } => {
            let lines = if spec.repeat {
                vec![spec.lines.first().cloned().unwrap_or_default(); codec.options().runtime_array_len]
            } else {
                spec.lines
            };
            Ok(list_text(&lines))
        }
        _ => Ok(plain_text(&spec)),
    }
}

fn line_text(line: &[Component]) -> String {
    line.iter().map(|component| component.default_literal()).collect::<Vec<_>>().join(", ")
}

/// One commented line per member, e.g.
///
/// ```text
/// [
///     // a: f32 (+12 bytes padding)
///     1.0, null, null, null,
///     // b: vec3<f32> (+4 bytes padding)
///     1.0, 1.0, 1.0, null
/// ]
/// ```
fn struct_text(def: &StructDef, spec: &BufferSpec) -> String {
    let last = def.members.len().saturating_sub(1);

    let mut lines = Vec::with_capacity(def.members.len() * 2);
    for (index, (member, line)) in def.members.iter().zip(&spec.lines).enumerate() {
        let padding = match def.padding_after(index) {
            Some(bytes) if bytes > 0 => format!(" (+{bytes} bytes padding)"),
            _ => String::new(),
        };
        lines.push(format!("{INDENT}// {}: {}{padding}", member.name, member.ty));

        let separator = if index == last { "" } else { "," };
        lines.push(format!("{INDENT}{}{separator}", line_text(line)));
    }

    format!("[\n{}\n]", lines.join("\n"))
}

fn list_text(lines: &[Vec<Component>]) -> String {
    let rendered: Vec<String> = lines.iter().map(|line| line_text(line)).collect();

    if rendered.iter().all(|line| line.len() <= INLINE_LINE_WIDTH) {
        format!("[ {} ]", rendered.join(", "))
    } else {
        let indented: Vec<String> = rendered.iter().map(|line| format!("{INDENT}{line}")).collect();
        format!("[\n{}\n]", indented.join(",\n"))
    }
}

fn plain_text(spec: &BufferSpec) -> String {
    match spec.lines.as_slice() {
        [line] if line.len() == 1 => line_text(line),
        [line] => format!("[ {} ]", line_text(line)),
        lines => list_text(lines),
    }
}
