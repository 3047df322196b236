//! # Decoded field values
//!
//! The output side of the structured payload decoder: one variant per
//! [`FieldFormat`](crate::converter::FieldFormat).

use std::fmt;

use crate::logging::format_hex_packet;

/// A single value decoded from a response payload.
///
/// | Variant | Source bytes |
/// |---------|--------------|
/// | Bool | 1 bit |
/// | U16/I16 | 2 |
/// | U32/I32/F32 | 4 |
/// | U64/I64/F64 | 8 |
/// | Text | any (UTF-8, lossy) |
/// | Raw | any |
///
/// ```rust
/// use modbus_tcp_master::FieldValue;
///
/// let temp = FieldValue::F32(25.5);
/// assert_eq!(temp.as_f64(), Some(25.5));
/// assert_eq!(FieldValue::from("ok").as_text(), Some("ok"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    U64(u64),
    I64(i64),
    F64(f64),
    Text(String),
    Raw(Vec<u8>),
}

impl FieldValue {
    /// Numeric view of the value; `None` for text and raw bytes.
    pub fn as_f64(&self) -> Option<f64> {
        Some(match self {
            FieldValue::Bool(b) => f64::from(u8::from(*b)),
            FieldValue::U16(v) => f64::from(*v),
            FieldValue::I16(v) => f64::from(*v),
            FieldValue::U32(v) => f64::from(*v),
            FieldValue::I32(v) => f64::from(*v),
            FieldValue::F32(v) => f64::from(*v),
            FieldValue::U64(v) => *v as f64,
            FieldValue::I64(v) => *v as f64,
            FieldValue::F64(v) => *v,
            FieldValue::Text(_) | FieldValue::Raw(_) => return None,
        })
    }

    /// Integer view; floats are rounded, `u64` wraps.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match self {
            FieldValue::Bool(b) => i64::from(*b),
            FieldValue::U16(v) => i64::from(*v),
            FieldValue::I16(v) => i64::from(*v),
            FieldValue::U32(v) => i64::from(*v),
            FieldValue::I32(v) => i64::from(*v),
            FieldValue::F32(v) => v.round() as i64,
            FieldValue::U64(v) => *v as i64,
            FieldValue::I64(v) => *v,
            FieldValue::F64(v) => v.round() as i64,
            FieldValue::Text(_) | FieldValue::Raw(_) => return None,
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Raw(b) => Some(b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::U16(_) => "u16",
            FieldValue::I16(_) => "i16",
            FieldValue::U32(_) => "u32",
            FieldValue::I32(_) => "i32",
            FieldValue::F32(_) => "f32",
            FieldValue::U64(_) => "u64",
            FieldValue::I64(_) => "i64",
            FieldValue::F64(_) => "f64",
            FieldValue::Text(_) => "text",
            FieldValue::Raw(_) => "raw",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::U16(v) => write!(f, "{}", v),
            FieldValue::I16(v) => write!(f, "{}", v),
            FieldValue::U32(v) => write!(f, "{}", v),
            FieldValue::I32(v) => write!(f, "{}", v),
            FieldValue::F32(v) => write!(f, "{}", v),
            FieldValue::U64(v) => write!(f, "{}", v),
            FieldValue::I64(v) => write!(f, "{}", v),
            FieldValue::F64(v) => write!(f, "{}", v),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Raw(b) => write!(f, "[{}]", format_hex_packet(b)),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                fn from(v: $ty) -> Self {
                    FieldValue::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    f32 => F32,
    u64 => U64,
    i64 => I64,
    f64 => F64,
    String => Text,
    Vec<u8> => Raw,
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_f64() {
        assert_eq!(FieldValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(FieldValue::I16(-50).as_f64(), Some(-50.0));
        assert_eq!(FieldValue::U32(100000).as_f64(), Some(100000.0));
        assert_eq!(FieldValue::I64(-7).as_f64(), Some(-7.0));
        assert_eq!(FieldValue::F64(3.5).as_f64(), Some(3.5));
        assert_eq!(FieldValue::Text("1".into()).as_f64(), None);
        assert_eq!(FieldValue::Raw(vec![1]).as_f64(), None);
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(FieldValue::F32(3.7).as_i64(), Some(4));
        assert_eq!(FieldValue::F64(-2.3).as_i64(), Some(-2));
        assert_eq!(FieldValue::U64(u64::MAX).as_i64(), Some(-1));
        assert_eq!(FieldValue::Raw(vec![]).as_i64(), None);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::U16(1).as_bool(), None);
        assert_eq!(FieldValue::from(vec![1u8, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(FieldValue::from(String::from("abc")).as_text(), Some("abc"));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::I16(-1234).to_string(), "-1234");
        assert_eq!(FieldValue::from("pump").to_string(), "pump");
        assert_eq!(FieldValue::Raw(vec![0x0A, 0xFF]).to_string(), "[0A FF]");
    }

    #[test]
    fn test_type_name() {
        assert_eq!(FieldValue::from(0u16).type_name(), "u16");
        assert_eq!(FieldValue::from(0.0f32).type_name(), "f32");
        assert_eq!(FieldValue::from("x").type_name(), "text");
        assert_eq!(FieldValue::Raw(vec![]).type_name(), "raw");
    }
}
