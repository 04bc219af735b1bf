//! Text to buffer encoding

use std::sync::LazyLock;

use bytes::{BufMut, Bytes, BytesMut};
use regex::Regex;
use serde_json::{Number, Value};

use crate::{BufferSpec, Component, LayoutError};

/// `//` comments run to the end of the line
static LINE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"//[^\n]*").unwrap());

/// Reasons edited text cannot be encoded into a buffer
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The type itself has no buffer layout
    #[error(transparent)]
    Layout(#[from] LayoutError),
    /// The text is not valid JSON once comments are removed
    #[error("invalid value text: {0}")]
    Json(#[from] serde_json::Error),
    /// Something other than a number, `null` or an array was found
    #[error("expected a number or null, found {0}")]
    NotNumeric(String),
    /// The number of values does not match a fixed-size layout
    #[error("expected {expected} values, found {found}")]
    Length { expected: usize, found: usize },
    /// The number of values is not a whole number of runtime array elements
    #[error("expected a positive multiple of {width} values, found {found}")]
    RepeatLength { width: usize, found: usize },
    /// A padding slot holds a value
    #[error("value at index {index} falls on padding and must be null")]
    PaddingValue { index: usize },
    /// A data slot holds `null`
    #[error("missing value at index {index}")]
    MissingValue { index: usize },
    /// A value does not fit the component it is written to
    #[error("value {value} at index {index} does not fit {component:?}")]
    OutOfRange { index: usize, value: Number, component: Component },
}

/// Encodes `text` against an already resolved layout
///
/// Values are matched against the layout in one of two forms:
/// * full: one value per component, with `null` at every padding slot
/// * compact: one value per data component, as produced by decoding
///
/// A list without any `null` is read in the compact form whenever the layout
/// has padding. Padding is always written as zero bytes.
pub(super) fn encode_spec(spec: &BufferSpec, text: &str) -> Result<Bytes, EncodeError> {
    let stripped = LINE_COMMENT.replace_all(text, "");
    let value: Value = serde_json::from_str(&stripped)?;

    let mut values = Vec::new();
    flatten(value, &mut values)?;

    let has_padding = spec.lines.iter().flatten().any(|component| component.is_padding());
    let compact = has_padding && values.iter().all(Option::is_some);
    let value_width = |components: &[Component]| if compact { components.iter().filter(|c| !c.is_padding()).count() } else { components.len() };

    let components = if spec.repeat {
        let width = spec.lines.first().map_or(0, |line| value_width(line));
        if width == 0 || values.is_empty() || values.len() % width != 0 {
            return Err(EncodeError::RepeatLength { width, found: values.len() });
        }
        spec.tiled(values.len() / width)
    } else {
        let components = spec.components();
        let expected = value_width(&components);
        if expected != values.len() {
            return Err(EncodeError::Length { expected, found: values.len() });
        }
        components
    };

    let mut buffer = BytesMut::with_capacity(components.len() * Component::SIZE);
    let mut values = values.into_iter().enumerate();
    for component in components {
        if compact && component.is_padding() {
            buffer.put_u32_le(0);
            continue;
        }
        let Some((index, value)) = values.next() else {
            break;
        };

        match (component, value) {
            (Component::Padding, None) => buffer.put_u32_le(0),
            (Component::Padding, Some(_)) => return Err(EncodeError::PaddingValue { index }),
            (_, None) => return Err(EncodeError::MissingValue { index }),
            (Component::F32, Some(number)) => buffer.put_f32_le(to_f32(&number).ok_or(EncodeError::OutOfRange { index, value: number, component })?),
            (Component::U32, Some(number)) => {
                let value = to_integer(&number).and_then(|v| u32::try_from(v).ok());
                buffer.put_u32_le(value.ok_or(EncodeError::OutOfRange { index, value: number, component })?);
            }
            (Component::I32, Some(number)) => {
                let value = to_integer(&number).and_then(|v| i32::try_from(v).ok());
                buffer.put_i32_le(value.ok_or(EncodeError::OutOfRange { index, value: number, component })?);
            }
        }
    }

    Ok(buffer.freeze())
}

/// Flattens nested arrays depth-first; a bare number counts as one value
fn flatten(value: Value, out: &mut Vec<Option<Number>>) -> Result<(), EncodeError> {
    match value {
        Value::Null => out.push(None),
        Value::Number(number) => out.push(Some(number)),
        Value::Array(items) => {
            for item in items {
                flatten(item, out)?;
            }
        }
        other => return Err(EncodeError::NotNumeric(other.to_string())),
    }
    Ok(())
}

/// Rounds to the nearest f32, rejecting finite values beyond the f32 range
fn to_f32(number: &Number) -> Option<f32> {
    let wide = number.as_f64()?;
    let narrow = wide as f32;
    (narrow.is_finite() || !wide.is_finite()).then_some(narrow)
}

/// Integral value of `number`, accepting `3` and `3.0` but not `3.5`
fn to_integer(number: &Number) -> Option<i64> {
    if let Some(value) = number.as_i64() {
        return Some(value);
    }
    if let Some(value) = number.as_u64() {
        return i64::try_from(value).ok();
    }
    let value = number.as_f64()?;
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64).then_some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Component::{F32, I32, Padding, U32};

    fn spec(lines: Vec<Vec<Component>>, repeat: bool) -> BufferSpec {
        BufferSpec { lines, repeat }
    }

    #[test]
    fn test_comments_are_stripped() {
        let spec = spec(vec![vec![F32, Padding], vec![U32]], false);
        let text = "[\n    // a: f32 (+4 bytes padding)\n    2.0, null, // trailing\n    // b: u32\n    7\n] // end";

        let bytes = encode_spec(&spec, text).unwrap();
        let mut expected = Vec::new();
        expected.extend_from_slice(&2.0f32.to_le_bytes());
        expected.extend_from_slice(&[0; 4]);
        expected.extend_from_slice(&7u32.to_le_bytes());
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn test_nested_arrays_are_flattened() {
        let spec = spec(vec![vec![I32, I32], vec![I32, I32]], false);
        let bytes = encode_spec(&spec, "[[1, -2], [3, [4]]]").unwrap();
        assert_eq!(bytes.as_ref(), bytemuck::cast_slice::<i32, u8>(&[1, -2, 3, 4]));
    }

    #[test]
    fn test_bare_number() {
        let spec = spec(vec![vec![F32]], false);
        let bytes = encode_spec(&spec, "2.5").unwrap();
        assert_eq!(bytes.as_ref(), 2.5f32.to_le_bytes());
    }

    #[test]
    fn test_padding_must_be_null() {
        let spec = spec(vec![vec![F32, Padding], vec![F32, Padding]], false);
        assert!(matches!(encode_spec(&spec, "[1.0, 0, 2.0, null]"), Err(EncodeError::PaddingValue { index: 1 })));
        assert!(matches!(encode_spec(&spec, "[null, null, 2.0, null]"), Err(EncodeError::MissingValue { index: 0 })));
    }

    #[test]
    fn test_compact_form_skips_padding() {
        let spec = spec(vec![vec![F32, Padding, Padding, Padding], vec![U32, U32, U32, Padding]], false);
        let full = encode_spec(&spec, "[1.5, null, null, null, 2, 3, 4, null]").unwrap();
        let compact = encode_spec(&spec, "[1.5, 2, 3, 4]").unwrap();
        assert_eq!(full, compact);
        assert_eq!(full.len(), 32);

        // Every slot filled with numbers puts values on padding
        assert!(matches!(encode_spec(&spec, "[1, 2, 3, 4, 5, 6, 7, 8]"), Err(EncodeError::Length { expected: 4, found: 8 })));
    }

    #[test]
    fn test_compact_form_for_repeated_elements() {
        let spec = spec(vec![vec![F32, F32, F32, Padding]], true);
        assert_eq!(encode_spec(&spec, "[1, 2, 3, 4, 5, 6]").unwrap().len(), 32);
        assert_eq!(encode_spec(&spec, "[1, 2, 3, null]").unwrap().len(), 16);
        assert!(matches!(encode_spec(&spec, "[1, 2, 3, 4]"), Err(EncodeError::RepeatLength { width: 3, found: 4 })));
    }

    #[test]
    fn test_length_mismatch() {
        let spec = spec(vec![vec![F32, F32, F32]], false);
        assert!(matches!(encode_spec(&spec, "[1, 2]"), Err(EncodeError::Length { expected: 3, found: 2 })));
        assert!(matches!(encode_spec(&spec, "[1, 2, 3, 4]"), Err(EncodeError::Length { expected: 3, found: 4 })));
    }

    #[test]
    fn test_repeat_requires_whole_elements() {
        let spec = spec(vec![vec![U32, U32]], true);
        assert_eq!(encode_spec(&spec, "[1, 2, 3, 4]").unwrap().len(), 16);
        assert_eq!(encode_spec(&spec, "[1, 2]").unwrap().len(), 8);
        assert!(matches!(encode_spec(&spec, "[1, 2, 3]"), Err(EncodeError::RepeatLength { width: 2, found: 3 })));
        assert!(matches!(encode_spec(&spec, "[]"), Err(EncodeError::RepeatLength { width: 2, found: 0 })));
    }

    #[test]
    fn test_malformed_text() {
        let spec = spec(vec![vec![F32]], false);
        assert!(matches!(encode_spec(&spec, "[1.0,"), Err(EncodeError::Json(_))));
        assert!(matches!(encode_spec(&spec, "\"1.0\""), Err(EncodeError::NotNumeric(_))));
        assert!(matches!(encode_spec(&spec, "[true]"), Err(EncodeError::NotNumeric(_))));
    }

    #[test]
    fn test_integer_ranges() {
        let unsigned = spec(vec![vec![U32]], false);
        assert_eq!(encode_spec(&unsigned, "4294967295").unwrap().as_ref(), u32::MAX.to_le_bytes());
        assert_eq!(encode_spec(&unsigned, "3.0").unwrap().as_ref(), 3u32.to_le_bytes());
        assert!(matches!(encode_spec(&unsigned, "4294967296"), Err(EncodeError::OutOfRange { .. })));
        assert!(matches!(encode_spec(&unsigned, "-1"), Err(EncodeError::OutOfRange { .. })));
        assert!(matches!(encode_spec(&unsigned, "1.5"), Err(EncodeError::OutOfRange { .. })));

        let signed = spec(vec![vec![I32]], false);
        assert_eq!(encode_spec(&signed, "-2147483648").unwrap().as_ref(), i32::MIN.to_le_bytes());
        assert!(matches!(encode_spec(&signed, "2147483648"), Err(EncodeError::OutOfRange { .. })));
    }

    #[test]
    fn test_float_range() {
        let spec = spec(vec![vec![F32]], false);
        assert_eq!(encode_spec(&spec, "0.1").unwrap().as_ref(), 0.1f32.to_le_bytes());
        assert_eq!(encode_spec(&spec, "-3").unwrap().as_ref(), (-3.0f32).to_le_bytes());
        assert!(matches!(encode_spec(&spec, "1e39"), Err(EncodeError::OutOfRange { .. })));
    }

    #[test]
    fn test_identical_text_gives_identical_bytes() {
        let spec = spec(vec![vec![F32, F32, Padding, Padding], vec![I32, U32]], false);
        let text = "[0.25, -7.5, null, null, -9, 12]";
        assert_eq!(encode_spec(&spec, text).unwrap(), encode_spec(&spec, text).unwrap());
    }
}
