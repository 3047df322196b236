//! Modbus TCP master client
//!
//! One [`ModbusTcpClient`] owns one transport connection and one
//! [`FrameCodec`]. Each operation runs
//! `build request -> send -> await one response -> validate -> decode`
//! while holding the client's session lock, so at most one request is ever
//! in flight per connection and every response can be matched to its
//! request by transaction id. Concurrent callers simply queue on the lock.
//!
//! # API Naming Convention
//!
//! Like the rest of the crate, [`ModbusClient`] offers a **dual-track API**:
//!
//! | Function Code | Primary Name | Semantic Alias |
//! |---------------|--------------|----------------|
//! | 0x01 | `read_01()` | `read_coils()` |
//! | 0x02 | `read_02()` | `read_inputs()` |
//! | 0x03 | `read_03()` | `read_holding_registers()` |
//! | 0x04 | `read_04()` | `read_input_registers()` |
//! | 0x05 | `write_05()` | `write_coil()` |
//! | 0x06 | `write_06()` | `write_register()` |
//! | 0x0F | `write_0f()` | `write_multiple_coils()` |
//! | 0x10 | `write_10()` | `write_multiple_registers()` |
//!
//! # Errors
//!
//! Every operation returns a [`ModbusResult`]. The error of the most recent
//! operation is also kept on the client ([`ModbusTcpClient::last_error`]) and
//! cleared by the next success. Nothing is retried internally.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use modbus_tcp_master::{ClientOptions, ModbusClient, ModbusResult, ModbusTcpClient};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let client = ModbusTcpClient::new(ClientOptions::default());
//!     client.connect("127.0.0.1:502".parse().unwrap()).await?;
//!
//!     let registers = client.read_holding_registers(1, 0, 10).await?;
//!     println!("Registers: {:?}", registers);
//!
//!     client.write_register(1, 100, 0x1234).await?;
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::{decode_bits, decode_registers, encode_bit_payload, encode_register_payload};
use crate::error::{ModbusError, ModbusResult};
use crate::frame::FrameCodec;
use crate::options::ClientOptions;
use crate::protocol::{ModbusFunction, SlaveId};
use crate::transport::{ModbusTransport, TcpTransport, TransportStats};

/// Async Modbus master operations.
///
/// # Protocol Limits
///
/// Read quantities are passed to the device as given; out-of-range reads are
/// answered by the device with an exception. Writes are checked locally:
///
/// | Operation | Limit |
/// |-----------|-------|
/// | Read Coils / Discrete Inputs | 1-2000 (device enforced) |
/// | Read Holding / Input Registers | 1-125 (device enforced) |
/// | Write Multiple Coils (0x0F) | 1-1968 coils |
/// | Write Multiple Registers (0x10) | 1-123 registers |
pub trait ModbusClient: Send + Sync {
    /// Read coils (function code 0x01).
    ///
    /// # Arguments
    ///
    /// * `slave_id` - Unit id placed in the MBAP header
    /// * `address` - Starting coil address
    /// * `quantity` - Number of coils to read
    fn read_01(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send;

    /// Read discrete inputs (function code 0x02).
    fn read_02(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send;

    /// Read holding registers (function code 0x03).
    ///
    /// # Returns
    ///
    /// `quantity` register values in request order.
    fn read_03(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<u16>>> + Send;

    /// Read input registers (function code 0x04).
    fn read_04(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<u16>>> + Send;

    /// Write single coil (function code 0x05).
    ///
    /// Succeeds only when the device echoes the address and value exactly.
    fn write_05(
        &self,
        slave_id: SlaveId,
        address: u16,
        value: bool,
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write single register (function code 0x06).
    fn write_06(
        &self,
        slave_id: SlaveId,
        address: u16,
        value: u16,
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write multiple coils (function code 0x0F).
    ///
    /// A single value is sent as FC05 instead. Succeeds only when the device
    /// echoes the start address and count.
    fn write_0f(
        &self,
        slave_id: SlaveId,
        address: u16,
        values: &[bool],
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write multiple registers (function code 0x10).
    ///
    /// A single value is sent as FC06 instead.
    fn write_10(
        &self,
        slave_id: SlaveId,
        address: u16,
        values: &[u16],
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Whether the transport reported an open connection after the last operation
    fn is_connected(&self) -> bool;

    /// Cancel any outstanding receive and close the transport. Idempotent.
    fn close(&self) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Snapshot of the transport counters
    fn get_stats(&self) -> impl Future<Output = TransportStats> + Send;

    // ===== Semantic name aliases =====

    /// Alias for `read_01` - Read coils
    #[inline]
    fn read_coils(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send {
        self.read_01(slave_id, address, quantity)
    }

    /// Alias for `read_02` - Read discrete inputs
    #[inline]
    fn read_inputs(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send {
        self.read_02(slave_id, address, quantity)
    }

    /// Alias for `read_03` - Read holding registers
    #[inline]
    fn read_holding_registers(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<u16>>> + Send {
        self.read_03(slave_id, address, quantity)
    }

    /// Alias for `read_04` - Read input registers
    #[inline]
    fn read_input_registers(
        &self,
        slave_id: SlaveId,
        address: u16,
        quantity: u16,
    ) -> impl Future<Output = ModbusResult<Vec<u16>>> + Send {
        self.read_04(slave_id, address, quantity)
    }

    /// Alias for `write_05` - Write single coil
    #[inline]
    fn write_coil(
        &self,
        slave_id: SlaveId,
        address: u16,
        value: bool,
    ) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_05(slave_id, address, value)
    }

    /// Alias for `write_06` - Write single register
    #[inline]
    fn write_register(
        &self,
        slave_id: SlaveId,
        address: u16,
        value: u16,
    ) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_06(slave_id, address, value)
    }

    /// Alias for `write_0f` - Write multiple coils
    #[inline]
    fn write_multiple_coils(
        &self,
        slave_id: SlaveId,
        address: u16,
        values: &[bool],
    ) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_0f(slave_id, address, values)
    }

    /// Alias for `write_10` - Write multiple registers
    #[inline]
    fn write_multiple_registers(
        &self,
        slave_id: SlaveId,
        address: u16,
        values: &[u16],
    ) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_10(slave_id, address, values)
    }
}

/// State that only the caller holding the session lock may touch
struct Session<T> {
    transport: T,
    codec: FrameCodec,
}

impl<T: ModbusTransport> Session<T> {
    /// Send `request` and return the reply that carries its transaction id.
    ///
    /// Late replies to earlier requests are dropped while the read timeout
    /// lasts; any other frame is returned for validation.
    async fn exchange(
        &mut self,
        request: &[u8],
        cancel: &CancellationToken,
        read_timeout: Duration,
    ) -> ModbusResult<Bytes> {
        if cancel.is_cancelled() {
            return Err(ModbusError::cancelled("request"));
        }

        self.transport.send(request).await?;
        let deadline = Instant::now() + read_timeout;
        let mut response = self.transport.receive(cancel).await?;
        while self.codec.is_stale_response(&response) {
            warn!(
                "Dropping late response {:02X?} while waiting for transaction {}",
                &response[..2],
                self.codec.current_transaction_id()
            );
            response = timeout_at(deadline, self.transport.receive(cancel))
                .await
                .map_err(|_| {
                    ModbusError::timeout("receive response", read_timeout.as_millis() as u64)
                })??;
        }
        Ok(response)
    }
}

/// Modbus TCP master bound to one transport
///
/// All operations take `&self`; wrap the client in an `Arc` to share it.
pub struct ModbusTcpClient<T: ModbusTransport = TcpTransport> {
    session: tokio::sync::Mutex<Session<T>>,
    /// Created on first use, replaced after it has been cancelled
    cancel: Mutex<Option<CancellationToken>>,
    last_error: Mutex<Option<ModbusError>>,
    connected: AtomicBool,
    options: ClientOptions,
}

impl ModbusTcpClient<TcpTransport> {
    /// Create a disconnected client backed by a [`TcpTransport`]
    pub fn new(options: ClientOptions) -> Self {
        Self::with_transport(TcpTransport::new(options.clone()), options)
    }

    /// Create a client and connect it to `addr` (e.g. `"192.168.1.10:502"`)
    pub async fn from_address(addr: &str, options: ClientOptions) -> ModbusResult<Self> {
        let endpoint: SocketAddr = addr
            .parse()
            .map_err(|e| ModbusError::configuration(format!("Invalid address {}: {}", addr, e)))?;
        let client = Self::new(options);
        client.connect(endpoint).await?;
        Ok(client)
    }

    /// Enable or disable hex logging of every frame
    pub async fn set_packet_logging(&self, enabled: bool) {
        self.session.lock().await.transport.set_packet_logging(enabled);
    }

    /// Address of the device last connected to
    pub async fn peer_address(&self) -> Option<SocketAddr> {
        self.session.lock().await.transport.peer_address()
    }
}

impl<T: ModbusTransport> ModbusTcpClient<T> {
    /// Create a client over any transport
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        Self {
            session: tokio::sync::Mutex::new(Session {
                transport,
                codec: FrameCodec::new(),
            }),
            cancel: Mutex::new(None),
            last_error: Mutex::new(None),
            connected: AtomicBool::new(false),
            options,
        }
    }

    /// Options this client was created with
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Error produced by the most recent operation, `None` if it succeeded
    pub fn last_error(&self) -> Option<ModbusError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Token observed by the next receive; a fresh one replaces a cancelled one
    pub fn cancellation_token(&self) -> CancellationToken {
        let mut slot = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(token) if !token.is_cancelled() => token.clone(),
            _ => {
                let token = CancellationToken::new();
                *slot = Some(token.clone());
                token
            }
        }
    }

    /// Abort an outstanding connect or receive without closing the connection
    pub fn cancel_pending(&self) {
        if let Some(token) = self.take_token() {
            token.cancel();
        }
    }

    fn take_token(&self) -> Option<CancellationToken> {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Connect to `endpoint` within the configured connect timeout
    pub async fn connect(&self, endpoint: SocketAddr) -> ModbusResult<()> {
        let result = match self.options.validate() {
            Ok(()) => {
                let token = self.cancellation_token();
                let mut session = self.session.lock().await;
                let result = session.transport.connect(endpoint, &token).await;
                self.connected
                    .store(session.transport.is_connected(), Ordering::Release);
                result
            }
            Err(e) => Err(e),
        };
        if result.is_ok() {
            info!("Modbus client connected to {}", endpoint);
        }
        self.record(result)
    }

    /// Connect to [`ClientOptions::remote_endpoint`]
    pub async fn connect_remote(&self) -> ModbusResult<()> {
        match self.options.remote_endpoint {
            Some(endpoint) => self.connect(endpoint).await,
            None => self.record(Err(ModbusError::configuration(
                "No remote endpoint configured",
            ))),
        }
    }

    fn record<R>(&self, result: ModbusResult<R>) -> ModbusResult<R> {
        let mut last = self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match &result {
            Ok(_) => *last = None,
            Err(e) => {
                debug!("Modbus operation failed: {}", e);
                *last = Some(e.clone());
            }
        }
        result
    }

    async fn read_bits(
        &self,
        unit: SlaveId,
        function: ModbusFunction,
        address: u16,
        quantity: u16,
    ) -> ModbusResult<Vec<bool>> {
        let result = self
            .read(unit, function, address, quantity)
            .await
            .and_then(|response| decode_bits(&response, quantity as usize));
        self.record(result)
    }

    async fn read_registers(
        &self,
        unit: SlaveId,
        function: ModbusFunction,
        address: u16,
        quantity: u16,
    ) -> ModbusResult<Vec<u16>> {
        let result = self
            .read(unit, function, address, quantity)
            .await
            .and_then(|response| decode_registers(&response, quantity as usize));
        self.record(result)
    }

    /// Send one read request and return its validated response
    async fn read(
        &self,
        unit: SlaveId,
        function: ModbusFunction,
        address: u16,
        quantity: u16,
    ) -> ModbusResult<Bytes> {
        // Taken before queueing so a close issued meanwhile is observed
        let token = self.cancellation_token();
        let mut guard = self.session.lock().await;
        let session = &mut *guard;

        let result: ModbusResult<Bytes> = async {
            if !session.transport.is_connected() {
                return Err(ModbusError::NotConnected);
            }
            let request = session
                .codec
                .build_read_request(unit, function, address, quantity);
            let response = session
                .exchange(&request, &token, self.options.read_timeout)
                .await?;
            session.codec.try_validate_read_response(&response, function)?;
            Ok(response)
        }
        .await;

        self.connected
            .store(session.transport.is_connected(), Ordering::Release);
        result
    }

    async fn write(
        &self,
        unit: SlaveId,
        function: ModbusFunction,
        payload: ModbusResult<Bytes>,
    ) -> ModbusResult<()> {
        let result = match payload {
            Ok(payload) => self.send_write(unit, function, &payload).await,
            Err(e) => Err(e),
        };
        self.record(result)
    }

    async fn send_write(
        &self,
        unit: SlaveId,
        function: ModbusFunction,
        payload: &[u8],
    ) -> ModbusResult<()> {
        let token = self.cancellation_token();
        let mut guard = self.session.lock().await;
        let session = &mut *guard;

        let result: ModbusResult<()> = async {
            if !session.transport.is_connected() {
                return Err(ModbusError::NotConnected);
            }
            let request = session.codec.build_write_request(unit, function, payload)?;
            let response = session
                .exchange(&request, &token, self.options.read_timeout)
                .await?;
            session
                .codec
                .try_validate_write_response(&response, function, payload)
        }
        .await;

        self.connected
            .store(session.transport.is_connected(), Ordering::Release);
        result
    }
}

impl<T: ModbusTransport> ModbusClient for ModbusTcpClient<T> {
    async fn read_01(&self, slave_id: SlaveId, address: u16, quantity: u16) -> ModbusResult<Vec<bool>> {
        self.read_bits(slave_id, ModbusFunction::ReadCoils, address, quantity)
            .await
    }

    async fn read_02(&self, slave_id: SlaveId, address: u16, quantity: u16) -> ModbusResult<Vec<bool>> {
        self.read_bits(slave_id, ModbusFunction::ReadDiscreteInputs, address, quantity)
            .await
    }

    async fn read_03(&self, slave_id: SlaveId, address: u16, quantity: u16) -> ModbusResult<Vec<u16>> {
        self.read_registers(slave_id, ModbusFunction::ReadHoldingRegisters, address, quantity)
            .await
    }

    async fn read_04(&self, slave_id: SlaveId, address: u16, quantity: u16) -> ModbusResult<Vec<u16>> {
        self.read_registers(slave_id, ModbusFunction::ReadInputRegisters, address, quantity)
            .await
    }

    async fn write_05(&self, slave_id: SlaveId, address: u16, value: bool) -> ModbusResult<()> {
        let payload = encode_bit_payload(address, &[value]);
        self.write(slave_id, ModbusFunction::WriteSingleCoil, payload)
            .await
    }

    async fn write_06(&self, slave_id: SlaveId, address: u16, value: u16) -> ModbusResult<()> {
        let payload = encode_register_payload(address, &[value]);
        self.write(slave_id, ModbusFunction::WriteSingleRegister, payload)
            .await
    }

    async fn write_0f(&self, slave_id: SlaveId, address: u16, values: &[bool]) -> ModbusResult<()> {
        let function = if values.len() == 1 {
            ModbusFunction::WriteSingleCoil
        } else {
            ModbusFunction::WriteMultipleCoils
        };
        let payload = encode_bit_payload(address, values);
        self.write(slave_id, function, payload).await
    }

    async fn write_10(&self, slave_id: SlaveId, address: u16, values: &[u16]) -> ModbusResult<()> {
        let function = if values.len() == 1 {
            ModbusFunction::WriteSingleRegister
        } else {
            ModbusFunction::WriteMultipleRegisters
        };
        let payload = encode_register_payload(address, values);
        self.write(slave_id, function, payload).await
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn close(&self) -> ModbusResult<()> {
        // Cancel first so a pending receive releases the session lock and
        // operations already queued on it return without sending
        self.cancel_pending();
        let mut session = self.session.lock().await;
        let result = session.transport.close().await;
        self.connected.store(false, Ordering::Release);
        result
    }

    async fn get_stats(&self) -> TransportStats {
        self.session.lock().await.transport.get_stats()
    }
}

impl<T: ModbusTransport> Drop for ModbusTcpClient<T> {
    fn drop(&mut self) {
        if let Some(token) = self
            .cancel
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            token.cancel();
        }
    }
}
