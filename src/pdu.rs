//! Request PDU assembly
//!
//! A fixed-size stack buffer bounded by the 253-byte PDU limit. The frame codec
//! builds every request PDU here before wrapping it in an MBAP header, so an
//! oversized write payload is rejected before anything touches the socket.

use tracing::debug;

use crate::constants::MAX_PDU_SIZE;
use crate::error::{ModbusError, ModbusResult};

/// Stack-allocated request PDU
#[derive(Debug, Clone)]
pub struct ModbusPdu {
    data: [u8; MAX_PDU_SIZE],
    len: usize,
}

impl ModbusPdu {
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0; MAX_PDU_SIZE],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, byte: u8) -> ModbusResult<()> {
        self.extend(&[byte])
    }

    /// Push a big-endian word
    #[inline]
    pub fn push_u16(&mut self, value: u16) -> ModbusResult<()> {
        self.extend(&value.to_be_bytes())
    }

    pub fn extend(&mut self, bytes: &[u8]) -> ModbusResult<()> {
        let end = self.len + bytes.len();
        if end > MAX_PDU_SIZE {
            return Err(ModbusError::invalid_data(format!(
                "PDU would be {} bytes (max {})",
                end, MAX_PDU_SIZE
            )));
        }
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn function_code(&self) -> Option<u8> {
        self.as_slice().first().copied()
    }
}

impl Default for ModbusPdu {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent PDU builder
///
/// ```
/// use modbus_tcp_master::pdu::PduBuilder;
///
/// let pdu = PduBuilder::new()
///     .function_code(0x03)?
///     .word(0x006B)?
///     .word(3)?
///     .build();
/// assert_eq!(pdu.as_slice(), &[0x03, 0x00, 0x6B, 0x00, 0x03]);
/// # Ok::<(), modbus_tcp_master::ModbusError>(())
/// ```
#[derive(Debug, Default)]
pub struct PduBuilder {
    pdu: ModbusPdu,
}

impl PduBuilder {
    #[inline]
    pub fn new() -> Self {
        Self {
            pdu: ModbusPdu::new(),
        }
    }

    #[inline]
    pub fn function_code(mut self, fc: u8) -> ModbusResult<Self> {
        self.pdu.push(fc)?;
        Ok(self)
    }

    /// Append an address, quantity or register value
    #[inline]
    pub fn word(mut self, value: u16) -> ModbusResult<Self> {
        self.pdu.push_u16(value)?;
        Ok(self)
    }

    #[inline]
    pub fn byte(mut self, b: u8) -> ModbusResult<Self> {
        self.pdu.push(b)?;
        Ok(self)
    }

    #[inline]
    pub fn data(mut self, bytes: &[u8]) -> ModbusResult<Self> {
        self.pdu.extend(bytes)?;
        Ok(self)
    }

    pub fn build(self) -> ModbusPdu {
        debug!(
            "PDU built: FC={:02X?}, len={}",
            self.pdu.function_code(),
            self.pdu.len()
        );
        self.pdu
    }
}
