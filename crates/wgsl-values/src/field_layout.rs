//! Struct memory grid
//!
//! Places each struct member, and each run of padding after it, on a grid of
//! 16-byte rows and 4-byte columns so the layout can be drawn as a table.

use serde::Serialize;

use crate::StructDef;

/// Bytes per grid row
pub const ROW_BYTES: u32 = 16;
/// Bytes per grid column
pub const COLUMN_BYTES: u32 = 4;

/// A member or padding run placed on the memory grid
///
/// Rows and columns are zero-based and inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldBox {
    /// Member name, or `"padding"`
    pub name: String,
    /// Member type, or the padding size in bytes
    pub description: String,
    pub start_row: u32,
    pub start_column: u32,
    pub end_row: u32,
    pub end_column: u32,
    /// Whether this box is padding rather than a member
    pub padding: bool,
}

impl FieldBox {
    /// Builds a box spanning the 4-byte words from `start` up to but excluding `end`
    fn spanning(name: String, description: String, start: u32, end: u32, padding: bool) -> Self {
        let last_word = end.saturating_sub(COLUMN_BYTES).max(start);
        Self {
            name,
            description,
            start_row: start / ROW_BYTES,
            start_column: (start % ROW_BYTES) / COLUMN_BYTES,
            end_row: last_word / ROW_BYTES,
            end_column: (last_word % ROW_BYTES) / COLUMN_BYTES,
            padding,
        }
    }
}

/// Lays out the members of `def` on the memory grid, in offset order
pub fn field_layout(def: &StructDef) -> Vec<FieldBox> {
    let mut boxes = Vec::with_capacity(def.members.len() * 2);

    for (index, member) in def.members.iter().enumerate() {
        boxes.push(FieldBox::spanning(member.name.clone(), member.ty.to_string(), member.offset, member.end(), false));

        if let Some(gap) = def.padding_after(index).filter(|gap| *gap > 0) {
            boxes.push(FieldBox::spanning("padding".to_string(), format!("{gap} bytes"), member.end(), def.next_offset(index), true));
        }
    }

    boxes
}
