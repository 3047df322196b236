//! Modbus TCP framing constants and protocol limits
//!
//! Byte offsets below are positions within a complete ADU
//! (MBAP header followed by the PDU).

// ============================================================================
// MBAP header layout
// ============================================================================

/// Transaction id(2) + protocol id(2) + length(2); the length field counts
/// everything after itself.
pub const MBAP_HEADER_LEN: usize = 6;

/// Protocol identifier, always zero for Modbus
pub const MODBUS_PROTOCOL_ID: u16 = 0;

/// Offset of the big-endian transaction id
pub const OFFSET_TRANSACTION_ID: usize = 0;

/// Offset of the big-endian length field
pub const OFFSET_LENGTH: usize = 4;

/// Offset of the unit id
pub const OFFSET_UNIT_ID: usize = 6;

/// Offset of the function code
pub const OFFSET_FUNCTION: usize = 7;

/// Offset of the read byte count, the exception code, or the write echo
pub const OFFSET_PDU_DATA: usize = 8;

/// Offset of the first data byte in a read response
pub const OFFSET_READ_DATA: usize = 9;

/// MBAP + function code + byte count; the shortest response accepted
pub const READ_RESPONSE_HEADER_LEN: usize = 9;

/// Read requests are always 12 bytes on the wire
pub const READ_REQUEST_LEN: usize = 12;

/// Unit id + function code + address + quantity
pub const READ_REQUEST_MBAP_LENGTH: u16 = 6;

/// Write responses echo four bytes after the function code
pub const WRITE_ECHO_LEN: usize = 4;

/// Largest PDU a device may send (RS485 ADU 256 minus address and CRC)
pub const MAX_PDU_SIZE: usize = 253;

/// Largest acceptable MBAP length field (unit id + PDU)
pub const MAX_MBAP_LENGTH: usize = 1 + MAX_PDU_SIZE;

/// Largest complete frame that can arrive on the socket
pub const MAX_ADU_SIZE: usize = MBAP_HEADER_LEN + MAX_MBAP_LENGTH;

// ============================================================================
// Value encodings
// ============================================================================

/// Function-code bit set by a device in an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Coil ON as carried by FC05
pub const COIL_ON: u16 = 0xFF00;

/// Coil OFF as carried by FC05
pub const COIL_OFF: u16 = 0x0000;

// ============================================================================
// Quantity limits
// ============================================================================

/// FC03/FC04: 1 + 1 + 2N <= 253
pub const MAX_READ_REGISTERS: usize = 125;

/// FC16: 1 + 2 + 2 + 1 + 2N <= 253
pub const MAX_WRITE_REGISTERS: usize = 123;

/// FC01/FC02
pub const MAX_READ_COILS: usize = 2000;

/// FC15 (0x7B0)
pub const MAX_WRITE_COILS: usize = 1968;

// ============================================================================
// Function codes
// ============================================================================

pub const FC_READ_COILS: u8 = 0x01;
pub const FC_READ_DISCRETE_INPUTS: u8 = 0x02;
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const FC_READ_INPUT_REGISTERS: u8 = 0x04;
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

// ============================================================================
// Exception codes
// ============================================================================

pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;
pub const EXCEPTION_SERVER_DEVICE_FAILURE: u8 = 0x04;
pub const EXCEPTION_ACKNOWLEDGE: u8 = 0x05;
pub const EXCEPTION_SERVER_DEVICE_BUSY: u8 = 0x06;
pub const EXCEPTION_MEMORY_PARITY_ERROR: u8 = 0x08;
pub const EXCEPTION_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;
pub const EXCEPTION_GATEWAY_TARGET_FAILED: u8 = 0x0B;
