//! # Structured payload decoding
//!
//! Maps byte ranges of a response payload onto the fields of a plain Rust
//! struct. Converters are registered once at startup, keyed by the target
//! type, and applied to whatever bytes a read returns.
//!
//! ```rust
//! use modbus_tcp_master::{ByteOrder, ConverterRegistry, FieldConverter, FieldFormat, TypeConverter};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Meter {
//!     voltage: f32,
//!     status: u16,
//! }
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register(
//!     TypeConverter::<Meter>::new()
//!         .with_field(FieldConverter::new("voltage", 0, 4, FieldFormat::F32, |m: &mut Meter, v| {
//!             m.voltage = v.as_f64().unwrap_or_default() as f32;
//!         }))
//!         .with_field(
//!             FieldConverter::new("status", 4, 2, FieldFormat::U16, |m: &mut Meter, v| {
//!                 m.status = v.as_i64().unwrap_or_default() as u16;
//!             })
//!             .with_byte_order(ByteOrder::BigEndian16),
//!         ),
//! );
//!
//! let meter = registry
//!     .convert::<Meter>(&[0x43, 0x66, 0x00, 0x00, 0x00, 0x01])
//!     .unwrap();
//! assert_eq!(meter, Meter { voltage: 230.0, status: 1 });
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::bytes::{wire_to_be_2, wire_to_be_4, wire_to_be_8, ByteOrder};
use crate::value::FieldValue;

/// How the bytes of one field are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// One bit, counted LSB-first from the first byte of the field
    Bool { bit: u8 },
    /// UTF-8, invalid sequences replaced
    Text,
    Raw,
}

impl FieldFormat {
    /// Byte width of the fixed-size numeric formats
    pub fn width(&self) -> Option<usize> {
        match self {
            FieldFormat::I16 | FieldFormat::U16 => Some(2),
            FieldFormat::I32 | FieldFormat::U32 | FieldFormat::F32 => Some(4),
            FieldFormat::I64 | FieldFormat::U64 | FieldFormat::F64 => Some(8),
            FieldFormat::Bool { .. } | FieldFormat::Text | FieldFormat::Raw => None,
        }
    }

    /// Decode `bytes` as this format.
    ///
    /// Numeric input shorter than the width is right-aligned in a zero
    /// buffer before the byte order is applied; longer input decodes as zero.
    pub fn decode(&self, bytes: &[u8], order: ByteOrder) -> FieldValue {
        match self {
            FieldFormat::I16 => i16::from_be_bytes(wire_to_be_2(padded(bytes), order)).into(),
            FieldFormat::U16 => u16::from_be_bytes(wire_to_be_2(padded(bytes), order)).into(),
            FieldFormat::I32 => i32::from_be_bytes(wire_to_be_4(padded(bytes), order)).into(),
            FieldFormat::U32 => u32::from_be_bytes(wire_to_be_4(padded(bytes), order)).into(),
            FieldFormat::F32 => f32::from_be_bytes(wire_to_be_4(padded(bytes), order)).into(),
            FieldFormat::I64 => i64::from_be_bytes(wire_to_be_8(padded(bytes), order)).into(),
            FieldFormat::U64 => u64::from_be_bytes(wire_to_be_8(padded(bytes), order)).into(),
            FieldFormat::F64 => f64::from_be_bytes(wire_to_be_8(padded(bytes), order)).into(),
            FieldFormat::Bool { bit } => {
                let byte = bytes.get(usize::from(*bit / 8)).copied().unwrap_or(0);
                FieldValue::Bool((byte >> (bit % 8)) & 1 == 1)
            }
            FieldFormat::Text => FieldValue::Text(String::from_utf8_lossy(bytes).into_owned()),
            FieldFormat::Raw => FieldValue::Raw(bytes.to_vec()),
        }
    }
}

fn padded<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut buf = [0u8; N];
    if bytes.len() <= N {
        buf[N - bytes.len()..].copy_from_slice(bytes);
    }
    buf
}

/// Assigns a decoded value to a field of `T`
pub type FieldSetter<T> = fn(&mut T, FieldValue);

/// One field: where its bytes live in the payload and where the value goes
pub struct FieldConverter<T> {
    pub field: String,
    pub offset: usize,
    pub length: usize,
    pub format: FieldFormat,
    pub byte_order: ByteOrder,
    pub setter: FieldSetter<T>,
}

impl<T> FieldConverter<T> {
    pub fn new(
        field: impl Into<String>,
        offset: usize,
        length: usize,
        format: FieldFormat,
        setter: FieldSetter<T>,
    ) -> Self {
        Self {
            field: field.into(),
            offset,
            length,
            format,
            byte_order: ByteOrder::BigEndian,
            setter,
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// The field's bytes, or `None` when the payload is too short
    fn slice<'a>(&self, payload: &'a [u8]) -> Option<&'a [u8]> {
        let end = self.offset.checked_add(self.length)?;
        payload.get(self.offset..end)
    }
}

impl<T> Clone for FieldConverter<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            offset: self.offset,
            length: self.length,
            format: self.format,
            byte_order: self.byte_order,
            setter: self.setter,
        }
    }
}

impl<T> fmt::Debug for FieldConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConverter")
            .field("field", &self.field)
            .field("offset", &self.offset)
            .field("length", &self.length)
            .field("format", &self.format)
            .field("byte_order", &self.byte_order)
            .finish()
    }
}

/// Ordered field converters for one target type
pub struct TypeConverter<T> {
    fields: Vec<FieldConverter<T>>,
}

impl<T> Default for TypeConverter<T> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<T> fmt::Debug for TypeConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConverter")
            .field("fields", &self.fields)
            .finish()
    }
}

impl<T> TypeConverter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field; a converter already registered under the same name is
    /// replaced in place.
    pub fn add(&mut self, converter: FieldConverter<T>) {
        match self.fields.iter_mut().find(|f| f.field == converter.field) {
            Some(existing) => *existing = converter,
            None => self.fields.push(converter),
        }
    }

    pub fn with_field(mut self, converter: FieldConverter<T>) -> Self {
        self.add(converter);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldConverter<T>> {
        self.fields.iter().find(|f| f.field == name)
    }

    pub fn fields(&self) -> &[FieldConverter<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<T: Default> TypeConverter<T> {
    /// Build a `T` from `payload`, leaving fields whose range falls outside
    /// the payload at their default.
    pub fn convert(&self, payload: &[u8]) -> T {
        let mut target = T::default();
        for converter in &self.fields {
            match converter.slice(payload) {
                Some(bytes) => {
                    let value = converter.format.decode(bytes, converter.byte_order);
                    (converter.setter)(&mut target, value);
                }
                None => debug!(
                    "Field '{}' ({}..+{}) outside payload of {} bytes, skipped",
                    converter.field,
                    converter.offset,
                    converter.length,
                    payload.len()
                ),
            }
        }
        target
    }
}

/// Type-keyed collection of [`TypeConverter`]s
#[derive(Default)]
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.converters.len())
            .finish()
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the converter for `T`, replacing any earlier one.
    pub fn register<T: 'static>(&mut self, converter: TypeConverter<T>) {
        debug!(
            "Registering converter for {} ({} fields)",
            std::any::type_name::<T>(),
            converter.len()
        );
        self.converters.insert(TypeId::of::<T>(), Box::new(converter));
    }

    pub fn get<T: 'static>(&self) -> Option<&TypeConverter<T>> {
        self.converters
            .get(&TypeId::of::<T>())
            .and_then(|c| c.downcast_ref::<TypeConverter<T>>())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    /// Decode `payload` into a `T`; `None` when no converter is registered.
    pub fn convert<T: Default + 'static>(&self, payload: &[u8]) -> Option<T> {
        self.get::<T>().map(|converter| converter.convert(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Frame {
        header: Vec<u8>,
        body: Vec<u8>,
    }

    #[derive(Debug, Default)]
    struct Unregistered;

    fn set_header(f: &mut Frame, v: FieldValue) {
        if let FieldValue::Raw(bytes) = v {
            f.header = bytes;
        }
    }

    fn set_body(f: &mut Frame, v: FieldValue) {
        if let FieldValue::Raw(bytes) = v {
            f.body = bytes;
        }
    }

    fn frame_converter() -> TypeConverter<Frame> {
        TypeConverter::new()
            .with_field(FieldConverter::new("header", 0, 5, FieldFormat::Raw, set_header))
            .with_field(FieldConverter::new("body", 5, 2, FieldFormat::Raw, set_body))
    }

    #[test]
    fn test_header_body_split() {
        let frame = frame_converter().convert(&[1, 2, 3, 4, 5, 3, 4]);
        assert_eq!(frame.header, vec![1, 2, 3, 4, 5]);
        assert_eq!(frame.body, vec![3, 4]);
    }

    #[test]
    fn test_short_payload_skips_field() {
        let frame = frame_converter().convert(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(frame.header, vec![1, 2, 3, 4, 5]);
        assert!(frame.body.is_empty());
    }

    #[test]
    fn test_same_field_replaces() {
        let mut converter = frame_converter();
        converter.add(FieldConverter::new("header", 0, 2, FieldFormat::Raw, set_header));
        assert_eq!(converter.len(), 2);
        assert_eq!(converter.fields()[0].field, "header");
        assert_eq!(converter.field("header").map(|f| f.length), Some(2));
        assert!(converter.field("missing").is_none());

        let frame = converter.convert(&[9, 8, 7, 6, 5, 4, 3]);
        assert_eq!(frame.header, vec![9, 8]);
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = ConverterRegistry::new();
        registry.register(frame_converter());
        registry.register(frame_converter());

        assert!(registry.contains::<Frame>());
        assert!(!registry.contains::<Unregistered>());
        assert!(registry.get::<Unregistered>().is_none());
        assert!(registry.convert::<Unregistered>(&[1, 2]).is_none());
        assert_eq!(registry.get::<Frame>().map(|c| c.len()), Some(2));

        let frame = registry.convert::<Frame>(&[1, 2, 3, 4, 5, 6, 7]).unwrap();
        assert_eq!(frame.body, vec![6, 7]);
    }

    #[test]
    fn test_integer_formats() {
        assert_eq!(FieldFormat::I16.decode(&[0xFF, 0xFE], ByteOrder::BigEndian), FieldValue::I16(-2));
        assert_eq!(FieldFormat::U16.decode(&[0x12, 0x34], ByteOrder::BigEndian), FieldValue::U16(0x1234));
        assert_eq!(
            FieldFormat::U16.decode(&[0x34, 0x12], ByteOrder::LittleEndian16),
            FieldValue::U16(0x1234)
        );
        assert_eq!(
            FieldFormat::U32.decode(&[0x78, 0x56, 0x34, 0x12], ByteOrder::LittleEndian),
            FieldValue::U32(0x1234_5678)
        );
        assert_eq!(
            FieldFormat::I32.decode(&[0x56, 0x78, 0x12, 0x34], ByteOrder::BigEndianSwap),
            FieldValue::I32(0x1234_5678)
        );
        assert_eq!(
            FieldFormat::I64.decode(&(-5i64).to_be_bytes(), ByteOrder::BigEndian),
            FieldValue::I64(-5)
        );
        assert_eq!(
            FieldFormat::U64.decode(&7u64.to_le_bytes(), ByteOrder::LittleEndian),
            FieldValue::U64(7)
        );
    }

    #[test]
    fn test_float_formats() {
        assert_eq!(
            FieldFormat::F32.decode(&[0x41, 0xC8, 0x00, 0x00], ByteOrder::BigEndian),
            FieldValue::F32(25.0)
        );
        assert_eq!(
            FieldFormat::F64.decode(&1.5f64.to_le_bytes(), ByteOrder::LittleEndian),
            FieldValue::F64(1.5)
        );
    }

    #[test]
    fn test_short_input_is_right_aligned() {
        assert_eq!(FieldFormat::U16.decode(&[0x07], ByteOrder::BigEndian), FieldValue::U16(7));
        assert_eq!(FieldFormat::I64.decode(&[0x01, 0x00], ByteOrder::BigEndian), FieldValue::I64(256));
        // little-endian pads the same way, so the lone byte lands on top
        assert_eq!(
            FieldFormat::U32.decode(&[0x01], ByteOrder::LittleEndian),
            FieldValue::U32(0x0100_0000)
        );
        assert_eq!(FieldFormat::U16.decode(&[], ByteOrder::BigEndian), FieldValue::U16(0));
    }

    #[test]
    fn test_long_input_is_zero() {
        assert_eq!(FieldFormat::U16.decode(&[1, 2, 3], ByteOrder::BigEndian), FieldValue::U16(0));
        assert_eq!(FieldFormat::F64.decode(&[0xFF; 9], ByteOrder::LittleEndian), FieldValue::F64(0.0));
    }

    #[test]
    fn test_bool_and_text() {
        assert_eq!(FieldFormat::Bool { bit: 0 }.decode(&[0x01], ByteOrder::BigEndian), FieldValue::Bool(true));
        assert_eq!(FieldFormat::Bool { bit: 9 }.decode(&[0x00, 0x02], ByteOrder::BigEndian), FieldValue::Bool(true));
        assert_eq!(FieldFormat::Bool { bit: 16 }.decode(&[0xFF, 0xFF], ByteOrder::BigEndian), FieldValue::Bool(false));
        assert_eq!(FieldFormat::Text.decode(b"PUMP-1", ByteOrder::BigEndian), FieldValue::from("PUMP-1"));
        assert_eq!(
            FieldFormat::Text.decode(&[0x41, 0xFF], ByteOrder::BigEndian),
            FieldValue::from("A\u{FFFD}")
        );
    }

    #[test]
    fn test_widths() {
        assert_eq!(FieldFormat::I16.width(), Some(2));
        assert_eq!(FieldFormat::F32.width(), Some(4));
        assert_eq!(FieldFormat::U64.width(), Some(8));
        assert_eq!(FieldFormat::Text.width(), None);
    }

    #[test]
    fn test_offset_overflow_is_skipped() {
        let converter = TypeConverter::<Frame>::new()
            .with_field(FieldConverter::new("header", usize::MAX, 2, FieldFormat::Raw, set_header));
        assert_eq!(converter.convert(&[1, 2, 3]), Frame::default());
    }
}
