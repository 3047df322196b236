//! Error types for Modbus TCP master operations
//!
//! Every failure a client can report falls into one of four groups:
//!
//! | Group | Variants |
//! |-------|----------|
//! | Transport | `NotConnected`, `Connection`, `Timeout`, `Cancelled`, `Io` |
//! | Malformed response | `FrameTooShort`, `TransactionMismatch`, `FunctionCodeMismatch`, `LengthByteCountMismatch`, `WriteEchoMismatch` |
//! | Device exception | `DeviceException` |
//! | Caller error | `InvalidData`, `InvalidFunction`, `Configuration` |
//!
//! `ModbusError` is `Clone` so a client can keep the most recent failure
//! around for [`last_error`](crate::client::ModbusTcpClient::last_error).

use thiserror::Error;

use crate::protocol::ModbusException;

/// Result alias used throughout the crate
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Modbus TCP master error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModbusError {
    /// An operation was attempted without an open connection
    #[error("Not connected")]
    NotConnected,

    /// Connecting, sending or receiving on the socket failed
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// A deadline elapsed
    #[error("Timeout during {operation} after {timeout_ms} ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The client's cancellation token fired while waiting
    #[error("Cancelled during {operation}")]
    Cancelled { operation: String },

    /// Low-level I/O failure not tied to a connection attempt
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Response shorter than the 9-byte read header or than its payload needs
    #[error("Frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort { expected: usize, actual: usize },

    /// Response transaction id differs from the id of the last request
    #[error("Transaction id mismatch: expected {expected}, got {actual}")]
    TransactionMismatch { expected: u16, actual: u16 },

    /// Response function code is neither the request code nor its exception form
    #[error("Function code mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    FunctionCodeMismatch { expected: u8, actual: u8 },

    /// Read response byte count disagrees with the received frame length
    #[error("Byte count mismatch: frame length {actual}, byte count implies {expected}")]
    LengthByteCountMismatch { expected: usize, actual: usize },

    /// The device answered with an exception PDU
    #[error("Device exception for function 0x{function:02X}: {} (code 0x{code:02X})", exception_name(*.code))]
    DeviceException { function: u8, code: u8 },

    /// Write response did not echo the address/value or address/count that was sent
    #[error("Write echo mismatch for function 0x{function:02X}: sent {expected:02X?}, echoed {actual:02X?}")]
    WriteEchoMismatch {
        function: u8,
        expected: Vec<u8>,
        actual: Vec<u8>,
    },

    /// Caller supplied data that cannot be encoded
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Function code not usable for the requested operation
    #[error("Invalid function code: 0x{code:02X}")]
    InvalidFunction { code: u8 },

    /// Options or endpoints are unusable
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

fn exception_name(code: u8) -> &'static str {
    ModbusException::from_u8(code)
        .map(|e| e.description())
        .unwrap_or("Unknown exception")
}

impl ModbusError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create a cancellation error
    pub fn cancelled<S: Into<String>>(operation: S) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid function error
    pub fn invalid_function(code: u8) -> Self {
        Self::InvalidFunction { code }
    }

    /// Socket-level failure (the request may or may not have reached the device)
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::Connection { .. }
                | Self::Timeout { .. }
                | Self::Cancelled { .. }
                | Self::Io { .. }
        )
    }

    /// The device replied, but the reply failed structural validation
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            Self::FrameTooShort { .. }
                | Self::TransactionMismatch { .. }
                | Self::FunctionCodeMismatch { .. }
                | Self::LengthByteCountMismatch { .. }
                | Self::WriteEchoMismatch { .. }
        )
    }

    pub fn is_device_exception(&self) -> bool {
        matches!(self, Self::DeviceException { .. })
    }

    /// Raw exception byte when the device rejected the request
    pub fn exception_code(&self) -> Option<u8> {
        match self {
            Self::DeviceException { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::UnexpectedEof => Self::Connection {
                message: err.to_string(),
            },
            _ => Self::Io {
                message: err.to_string(),
            },
        }
    }
}
