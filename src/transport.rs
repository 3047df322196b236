//! Network transport for Modbus TCP
//!
//! [`ModbusTransport`] is the only thing the protocol engine needs from the
//! network: connect, send one frame, receive one frame, close. It knows
//! nothing about function codes or transaction ids.
//!
//! [`TcpTransport`] is the tokio implementation. It delivers exactly one
//! MBAP-delimited frame per [`receive`](ModbusTransport::receive) call and
//! never reconnects on its own; after an I/O failure it reports
//! disconnected and the caller decides whether to connect again.
//!
//! ```rust,no_run
//! use modbus_tcp_master::{ClientOptions, ModbusTransport, TcpTransport};
//! use modbus_tcp_master::tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> modbus_tcp_master::ModbusResult<()> {
//! let mut transport = TcpTransport::new(ClientOptions::default());
//! let token = CancellationToken::new();
//! transport.connect("127.0.0.1:502".parse().unwrap(), &token).await?;
//!
//! let stats = transport.get_stats();
//! println!("Requests sent: {}", stats.requests_sent);
//! println!("Timeouts: {}", stats.timeouts);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::{
    MAX_ADU_SIZE, MAX_MBAP_LENGTH, MBAP_HEADER_LEN, OFFSET_LENGTH, OFFSET_UNIT_ID,
};
use crate::error::{ModbusError, ModbusResult};
use crate::logging::log_packet;
use crate::options::ClientOptions;

/// Byte-level collaborator used by [`ModbusTcpClient`](crate::client::ModbusTcpClient)
///
/// Implementations must be `Send + Sync` so clients can be shared across tasks.
pub trait ModbusTransport: Send + Sync {
    /// Open a connection to `endpoint`, giving up when `cancel` fires
    fn connect(
        &mut self,
        endpoint: SocketAddr,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write one complete request frame
    fn send(&mut self, frame: &[u8]) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Read one complete response frame, giving up when `cancel` fires
    fn receive(
        &mut self,
        cancel: &CancellationToken,
    ) -> impl Future<Output = ModbusResult<Bytes>> + Send;

    fn is_connected(&self) -> bool;

    /// Close the connection; closing twice is not an error
    fn close(&mut self) -> impl Future<Output = ModbusResult<()>> + Send;

    fn get_stats(&self) -> TransportStats;
}

/// Transport counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportStats {
    pub requests_sent: u64,
    pub responses_received: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    /// Time of the last completed send or receive
    pub last_activity: Option<DateTime<Utc>>,
}

/// Modbus TCP transport over a tokio socket
pub struct TcpTransport {
    stream: Option<TcpStream>,
    options: ClientOptions,
    peer: Option<SocketAddr>,
    stats: TransportStats,
    packet_logging: bool,
    /// Bytes received but not yet returned as a frame
    read_buf: BytesMut,
}

impl TcpTransport {
    /// Create a disconnected transport
    pub fn new(options: ClientOptions) -> Self {
        Self {
            stream: None,
            options,
            peer: None,
            stats: TransportStats::default(),
            packet_logging: false,
            read_buf: BytesMut::with_capacity(MAX_ADU_SIZE),
        }
    }

    /// Enable or disable hex logging of every frame
    pub fn set_packet_logging(&mut self, enabled: bool) {
        self.packet_logging = enabled;
    }

    /// Address of the device last connected to
    pub fn peer_address(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Count an error and drop the connection
    fn fail(&mut self, err: ModbusError) -> ModbusError {
        warn!("TCP transport failure ({:?}): {}", self.peer, err);
        self.stats.errors += 1;
        self.stream = None;
        self.read_buf.clear();
        err
    }

    async fn open_socket(&self, endpoint: SocketAddr) -> ModbusResult<TcpStream> {
        let socket = if endpoint.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        let local = self.options.local_endpoint;
        if self.options.binds_local_endpoint() {
            if local.is_ipv4() != endpoint.is_ipv4() {
                return Err(ModbusError::configuration(format!(
                    "Local endpoint {} and remote endpoint {} use different address families",
                    local, endpoint
                )));
            }
            socket.bind(local)?;
        }

        socket
            .connect(endpoint)
            .await
            .map_err(|e| ModbusError::connection(format!("Failed to connect to {}: {}", endpoint, e)))
    }

    /// Split one complete frame off the front of `buf`, if it holds one
    fn take_frame(buf: &mut BytesMut) -> ModbusResult<Option<Bytes>> {
        if buf.len() < MBAP_HEADER_LEN {
            return Ok(None);
        }
        let length = u16::from_be_bytes([buf[OFFSET_LENGTH], buf[OFFSET_LENGTH + 1]]) as usize;
        if length == 0 || length > MAX_MBAP_LENGTH {
            return Err(ModbusError::connection(format!(
                "Invalid MBAP length field: {}",
                length
            )));
        }
        let total = MBAP_HEADER_LEN + length;
        if buf.len() < total {
            return Ok(None);
        }
        Ok(Some(buf.split_to(total).freeze()))
    }

    /// Read until `buf` holds the frame its MBAP length field announces.
    ///
    /// Cancel safe: bytes read before an interruption stay in `buf` and the
    /// next call resumes the same frame.
    async fn read_frame(stream: &mut TcpStream, buf: &mut BytesMut) -> ModbusResult<Bytes> {
        loop {
            if let Some(frame) = Self::take_frame(buf)? {
                return Ok(frame);
            }
            if stream.read_buf(buf).await? == 0 {
                return Err(ModbusError::connection("Connection closed by peer"));
            }
        }
    }
}

impl ModbusTransport for TcpTransport {
    async fn connect(&mut self, endpoint: SocketAddr, cancel: &CancellationToken) -> ModbusResult<()> {
        if let Some(mut old) = self.stream.take() {
            debug!("Replacing existing connection to {:?}", self.peer);
            let _ = old.shutdown().await;
        }
        self.read_buf.clear();

        let connect_timeout = self.options.connect_timeout;
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ModbusError::cancelled("connect")),
            r = timeout(connect_timeout, self.open_socket(endpoint)) => match r {
                Ok(r) => r,
                Err(_) => Err(ModbusError::timeout("connect", connect_timeout.as_millis() as u64)),
            },
        };

        if let Err(ModbusError::Timeout { .. }) = result {
            self.stats.timeouts += 1;
        }
        let stream = result.map_err(|e| self.fail(e))?;
        let _ = stream.set_nodelay(true);
        self.stream = Some(stream);
        self.peer = Some(endpoint);
        info!("Connected to Modbus device at {}", endpoint);
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> ModbusResult<()> {
        let write_timeout = self.options.write_timeout;
        let stream = self.stream.as_mut().ok_or(ModbusError::NotConnected)?;

        let result = timeout(write_timeout, stream.write_all(frame)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.fail(e.into())),
            Err(_) => {
                self.stats.timeouts += 1;
                return Err(self.fail(ModbusError::timeout(
                    "send request",
                    write_timeout.as_millis() as u64,
                )));
            }
        }

        self.stats.requests_sent += 1;
        self.stats.bytes_sent += frame.len() as u64;
        self.stats.last_activity = Some(Utc::now());
        if self.packet_logging {
            log_packet("send", frame, frame.get(OFFSET_UNIT_ID).copied());
        }
        Ok(())
    }

    async fn receive(&mut self, cancel: &CancellationToken) -> ModbusResult<Bytes> {
        let read_timeout = self.options.read_timeout;
        let Self {
            stream, read_buf, ..
        } = self;
        let stream = stream.as_mut().ok_or(ModbusError::NotConnected)?;

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(ModbusError::cancelled("receive")),
            r = timeout(read_timeout, Self::read_frame(stream, read_buf)) => match r {
                Ok(r) => r,
                Err(_) => Err(ModbusError::timeout(
                    "receive response",
                    read_timeout.as_millis() as u64,
                )),
            },
        };

        match result {
            Ok(frame) => {
                self.stats.responses_received += 1;
                self.stats.bytes_received += frame.len() as u64;
                self.stats.last_activity = Some(Utc::now());
                if self.packet_logging {
                    log_packet("receive", &frame, frame.get(OFFSET_UNIT_ID).copied());
                }
                Ok(frame)
            }
            // The socket stays open; partial input stays buffered and a late
            // reply is dropped by the client as stale
            Err(err @ ModbusError::Timeout { .. }) => {
                self.stats.timeouts += 1;
                self.stats.errors += 1;
                Err(err)
            }
            Err(err @ ModbusError::Cancelled { .. }) => Err(err),
            Err(err) => Err(self.fail(err)),
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn close(&mut self) -> ModbusResult<()> {
        self.read_buf.clear();
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
            info!("Closed connection to {:?}", self.peer);
        }
        Ok(())
    }

    fn get_stats(&self) -> TransportStats {
        self.stats.clone()
    }
}
