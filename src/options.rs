//! Client configuration
//!
//! The transport applies the timeouts and endpoints. The client validates
//! the options before connecting, bounds its wait for a reply by the read
//! timeout and takes the target of `connect_remote` from `remote_endpoint`.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{ModbusError, ModbusResult};

/// Default connect timeout (5 seconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Default read timeout (1 second)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default write timeout (1 second)
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

/// Connection options for one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub connect_timeout: Duration,
    /// Deadline for one complete response frame
    pub read_timeout: Duration,
    /// Deadline for writing one request frame
    pub write_timeout: Duration,
    /// Local address to bind before connecting; port 0 lets the OS choose
    pub local_endpoint: SocketAddr,
    /// Device address used by [`connect_remote`](crate::client::ModbusTcpClient::connect_remote)
    pub remote_endpoint: Option<SocketAddr>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            local_endpoint: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            remote_endpoint: None,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_local_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.local_endpoint = endpoint;
        self
    }

    pub fn with_remote_endpoint(mut self, endpoint: SocketAddr) -> Self {
        self.remote_endpoint = Some(endpoint);
        self
    }

    /// True when a specific local address or port was requested
    pub fn binds_local_endpoint(&self) -> bool {
        !self.local_endpoint.ip().is_unspecified() || self.local_endpoint.port() != 0
    }

    pub fn validate(&self) -> ModbusResult<()> {
        for (name, value) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
        ] {
            if value.is_zero() {
                return Err(ModbusError::configuration(format!("{} must be non-zero", name)));
            }
        }
        Ok(())
    }
}
