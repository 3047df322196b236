//! # Byte and word order
//!
//! Devices disagree on how multi-register values are laid out. The ABCD
//! notation names the wire order of the bytes of a value, A being the most
//! significant byte.
//!
//! For the 32-bit value `0x12345678`:
//! - `BigEndian (ABCD)`: \[0x12, 0x34, 0x56, 0x78\]
//! - `LittleEndian (DCBA)`: \[0x78, 0x56, 0x34, 0x12\]
//! - `BigEndianSwap (CDAB)`: \[0x56, 0x78, 0x12, 0x34\]
//! - `LittleEndianSwap (BADC)`: \[0x34, 0x12, 0x78, 0x56\]
//!
//! Every helper here returns bytes in canonical big-endian order, ready for
//! `from_be_bytes`.

use std::fmt;

/// Wire layout of a 16/32/64-bit value.
///
/// ```rust
/// use modbus_tcp_master::ByteOrder;
///
/// let order = ByteOrder::from_str("CDAB").unwrap();
/// assert_eq!(order, ByteOrder::BigEndianSwap);
/// assert!(order.has_word_swap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// ABCD, network order
    #[default]
    BigEndian,
    /// DCBA
    LittleEndian,
    /// CDAB: big-endian words, low word first
    BigEndianSwap,
    /// BADC: byte-swapped words, high word first
    LittleEndianSwap,
    /// AB, single register
    BigEndian16,
    /// BA, single register
    LittleEndian16,
}

impl ByteOrder {
    /// Parse the notations found in device maps and config files.
    ///
    /// Accepts "ABCD", "DCBA", "CDAB", "BADC", "AB", "BA" (hyphens allowed),
    /// as well as "BE" / "LE" and the spelled-out names. Case-insensitive.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "ABCD" | "BE" | "BIGENDIAN" | "ABCDEFGH" => Some(Self::BigEndian),
            "DCBA" | "LE" | "LITTLEENDIAN" | "HGFEDCBA" => Some(Self::LittleEndian),
            "CDAB" | "BIGENDIANSWAP" => Some(Self::BigEndianSwap),
            "BADC" | "LITTLEENDIANSWAP" => Some(Self::LittleEndianSwap),
            "AB" => Some(Self::BigEndian16),
            "BA" => Some(Self::LittleEndian16),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BigEndian => "ABCD (Big-Endian)",
            Self::LittleEndian => "DCBA (Little-Endian)",
            Self::BigEndianSwap => "CDAB (Big-Endian Swap)",
            Self::LittleEndianSwap => "BADC (Little-Endian Swap)",
            Self::BigEndian16 => "AB (Big-Endian 16)",
            Self::LittleEndian16 => "BA (Little-Endian 16)",
        }
    }

    #[inline]
    pub fn is_16bit_only(&self) -> bool {
        matches!(self, Self::BigEndian16 | Self::LittleEndian16)
    }

    /// True when the bytes inside each register are swapped
    #[inline]
    pub fn is_little_endian(&self) -> bool {
        matches!(
            self,
            Self::LittleEndian | Self::LittleEndianSwap | Self::LittleEndian16
        )
    }

    #[inline]
    pub fn has_word_swap(&self) -> bool {
        matches!(self, Self::BigEndianSwap | Self::LittleEndianSwap)
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Interpret one register according to `order`.
#[inline]
pub fn reg_to_u16(reg: u16, order: ByteOrder) -> u16 {
    if order.is_little_endian() {
        reg.swap_bytes()
    } else {
        reg
    }
}

/// Two registers as they arrived, reordered to big-endian bytes.
///
/// ```rust
/// use modbus_tcp_master::{ByteOrder, regs_to_bytes_4};
///
/// let regs = [0x1234, 0x5678];
/// assert_eq!(regs_to_bytes_4(&regs, ByteOrder::BigEndian), [0x12, 0x34, 0x56, 0x78]);
/// assert_eq!(regs_to_bytes_4(&regs, ByteOrder::BigEndianSwap), [0x56, 0x78, 0x12, 0x34]);
/// ```
#[inline]
pub fn regs_to_bytes_4(regs: &[u16; 2], order: ByteOrder) -> [u8; 4] {
    let [h0, h1] = [regs[0].to_be_bytes(), regs[1].to_be_bytes()];

    match order {
        ByteOrder::BigEndian | ByteOrder::BigEndian16 => [h0[0], h0[1], h1[0], h1[1]],
        ByteOrder::LittleEndian | ByteOrder::LittleEndian16 => [h1[1], h1[0], h0[1], h0[0]],
        ByteOrder::BigEndianSwap => [h1[0], h1[1], h0[0], h0[1]],
        ByteOrder::LittleEndianSwap => [h0[1], h0[0], h1[1], h1[0]],
    }
}

/// Four registers as they arrived, reordered to big-endian bytes.
#[inline]
pub fn regs_to_bytes_8(regs: &[u16; 4], order: ByteOrder) -> [u8; 8] {
    let [h0, h1, h2, h3] = [
        regs[0].to_be_bytes(),
        regs[1].to_be_bytes(),
        regs[2].to_be_bytes(),
        regs[3].to_be_bytes(),
    ];

    match order {
        ByteOrder::BigEndian | ByteOrder::BigEndian16 => {
            [h0[0], h0[1], h1[0], h1[1], h2[0], h2[1], h3[0], h3[1]]
        }
        ByteOrder::LittleEndian | ByteOrder::LittleEndian16 => {
            [h3[1], h3[0], h2[1], h2[0], h1[1], h1[0], h0[1], h0[0]]
        }
        ByteOrder::BigEndianSwap => [h3[0], h3[1], h2[0], h2[1], h1[0], h1[1], h0[0], h0[1]],
        ByteOrder::LittleEndianSwap => [h0[1], h0[0], h1[1], h1[0], h2[1], h2[0], h3[1], h3[0]],
    }
}

/// Wire bytes of a 16-bit value in canonical order
#[inline]
pub fn wire_to_be_2(wire: [u8; 2], order: ByteOrder) -> [u8; 2] {
    reg_to_u16(u16::from_be_bytes(wire), order).to_be_bytes()
}

/// Wire bytes of a 32-bit value in canonical order
#[inline]
pub fn wire_to_be_4(wire: [u8; 4], order: ByteOrder) -> [u8; 4] {
    let regs = [
        u16::from_be_bytes([wire[0], wire[1]]),
        u16::from_be_bytes([wire[2], wire[3]]),
    ];
    regs_to_bytes_4(&regs, order)
}

/// Wire bytes of a 64-bit value in canonical order
#[inline]
pub fn wire_to_be_8(wire: [u8; 8], order: ByteOrder) -> [u8; 8] {
    let regs = [
        u16::from_be_bytes([wire[0], wire[1]]),
        u16::from_be_bytes([wire[2], wire[3]]),
        u16::from_be_bytes([wire[4], wire[5]]),
        u16::from_be_bytes([wire[6], wire[7]]),
    ];
    regs_to_bytes_8(&regs, order)
}

/// Combine two holding registers into an `f32`.
///
/// ```rust
/// use modbus_tcp_master::{ByteOrder, regs_to_f32};
///
/// // 25.0 is 0x41C80000
/// assert_eq!(regs_to_f32(&[0x41C8, 0x0000], ByteOrder::BigEndian), 25.0);
/// assert_eq!(regs_to_f32(&[0x0000, 0x41C8], ByteOrder::BigEndianSwap), 25.0);
/// ```
#[inline]
pub fn regs_to_f32(regs: &[u16; 2], order: ByteOrder) -> f32 {
    f32::from_be_bytes(regs_to_bytes_4(regs, order))
}

#[inline]
pub fn regs_to_u32(regs: &[u16; 2], order: ByteOrder) -> u32 {
    u32::from_be_bytes(regs_to_bytes_4(regs, order))
}
