//! # Modbus TCP Master
//!
//! An async Modbus TCP client (master) for talking to PLCs, meters and other
//! field devices over Ethernet.
//!
//! ## Features
//!
//! - **Frame codec**: MBAP framing, transaction ids, response validation
//! - **Client**: typed read/write operations over a pluggable transport
//! - **Client registry**: process-wide named pool with get-or-create
//! - **Structured decoding**: map payload bytes onto plain structs
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Client |
//! |------|----------|--------|
//! | 0x01 | Read Coils | ✅ |
//! | 0x02 | Read Discrete Inputs | ✅ |
//! | 0x03 | Read Holding Registers | ✅ |
//! | 0x04 | Read Input Registers | ✅ |
//! | 0x05 | Write Single Coil | ✅ |
//! | 0x06 | Write Single Register | ✅ |
//! | 0x0F | Write Multiple Coils | ✅ |
//! | 0x10 | Write Multiple Registers | ✅ |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modbus_tcp_master::{ClientOptions, ModbusClient, ModbusResult, ModbusTcpClient};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let client = ModbusTcpClient::from_address("127.0.0.1:502", ClientOptions::default()).await?;
//!
//!     let values = client.read_03(1, 0, 10).await?;
//!     println!("Read registers: {:?}", values);
//!
//!     client.write_06(1, 100, 0x1234).await?;
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

/// Error types and result handling
pub mod error;

/// Protocol constants: MBAP layout, function codes, limits
pub mod constants;

/// Function code and exception enums
pub mod protocol;

/// Stack-allocated PDU
pub mod pdu;

/// MBAP framing and response validation
pub mod frame;

/// Payload encoding and response data decoding
pub mod codec;

/// Client configuration
pub mod options;

/// Byte stream transport
pub mod transport;

/// Modbus client
pub mod client;

/// Named client pool
pub mod registry;

/// Packet tracing helpers
pub mod logging;

/// Byte and word order handling
pub mod bytes;

/// Decoded field values
pub mod value;

/// Structured payload decoding
pub mod converter;

// === Async runtime and cancellation (users can use modbus_tcp_master::tokio) ===
pub use tokio;
pub use tokio_util;

// === Core client API ===
pub use client::{ModbusClient, ModbusTcpClient};
pub use options::ClientOptions;
pub use registry::{ClientRegistry, TransportFactory};

// === Error handling ===
pub use error::{ModbusError, ModbusResult};

// === Protocol ===
pub use frame::FrameCodec;
pub use protocol::{ModbusException, ModbusFunction, SlaveId, TransactionId};

// === Payload helpers ===
pub use codec::{pack_bits, registers_to_bytes, unpack_bits};

// === Transport ===
pub use transport::{ModbusTransport, TcpTransport, TransportStats};

// === Structured decoding ===
pub use bytes::{regs_to_bytes_4, regs_to_bytes_8, regs_to_f32, regs_to_u32, ByteOrder};
pub use converter::{ConverterRegistry, FieldConverter, FieldFormat, FieldSetter, TypeConverter};
pub use value::FieldValue;

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    MAX_PDU_SIZE, MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS, MAX_WRITE_REGISTERS,
};

// === PDU (advanced usage) ===
pub use pdu::{ModbusPdu, PduBuilder};

/// Modbus TCP default port
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn info() -> String {
    format!("Modbus TCP Master v{} - async Modbus TCP client library", VERSION)
}
