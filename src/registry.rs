//! Named client pool
//!
//! A process-wide map from caller-chosen names to long-lived clients, backed
//! by [`DashMap`] so lookups from many tasks never contend on a global lock.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use modbus_tcp_master::{ClientRegistry, ModbusClient};
//!
//! # async fn example() -> modbus_tcp_master::ModbusResult<()> {
//! let registry = ClientRegistry::new();
//! let plc = registry.get_or_create("line-1", |options| {
//!     options.read_timeout = Duration::from_millis(500);
//!     options.remote_endpoint = Some("192.168.1.10:502".parse().unwrap());
//! });
//! plc.connect_remote().await?;
//! let registers = plc.read_holding_registers(1, 0, 4).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::client::{ModbusClient, ModbusTcpClient};
use crate::options::ClientOptions;
use crate::transport::{ModbusTransport, TcpTransport};

/// Produces a fresh, unconnected transport for each new client
pub type TransportFactory<T> = Box<dyn Fn(&ClientOptions) -> T + Send + Sync>;

/// Concurrency-safe name -> client mapping
pub struct ClientRegistry<T: ModbusTransport = TcpTransport> {
    clients: DashMap<String, Arc<ModbusTcpClient<T>>>,
    factory: TransportFactory<T>,
}

impl Default for ClientRegistry<TcpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientRegistry<TcpTransport> {
    /// Registry whose clients talk over [`TcpTransport`]
    pub fn new() -> Self {
        Self::with_factory(|options: &ClientOptions| TcpTransport::new(options.clone()))
    }
}

impl<T: ModbusTransport> ClientRegistry<T> {
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&ClientOptions) -> T + Send + Sync + 'static,
    {
        Self {
            clients: DashMap::new(),
            factory: Box::new(factory),
        }
    }

    /// Return the client registered as `name`, creating it on first use.
    ///
    /// `configure` runs against default options only when this call creates
    /// the client; an existing client is returned unchanged. Concurrent first
    /// calls for one name construct exactly one client: construction happens
    /// under the map entry's lock, so `configure` must not call back into
    /// this registry.
    pub fn get_or_create<F>(&self, name: &str, configure: F) -> Arc<ModbusTcpClient<T>>
    where
        F: FnOnce(&mut ClientOptions),
    {
        if let Some(existing) = self.clients.get(name) {
            return existing.value().clone();
        }

        self.clients
            .entry(name.to_string())
            .or_insert_with(|| {
                let mut options = ClientOptions::default();
                configure(&mut options);
                info!(
                    "Creating Modbus client '{}' (remote: {:?})",
                    name, options.remote_endpoint
                );
                let transport = (self.factory)(&options);
                Arc::new(ModbusTcpClient::with_transport(transport, options))
            })
            .value()
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModbusTcpClient<T>>> {
        self.clients.get(name).map(|entry| entry.value().clone())
    }

    /// Detach and return the client registered as `name`.
    ///
    /// The client is not closed; the caller now owns its teardown. A later
    /// [`get_or_create`](Self::get_or_create) with the same name builds a new client.
    pub fn remove(&self, name: &str) -> Option<Arc<ModbusTcpClient<T>>> {
        let removed = self.clients.remove(name).map(|(_, client)| client);
        if removed.is_some() {
            info!("Removed Modbus client '{}'", name);
        }
        removed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clients.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.clients.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Remove and close every client; returns how many were closed.
    ///
    /// Close failures are logged and do not stop the sweep.
    pub async fn close_all(&self) -> usize {
        let mut closed = 0;
        for name in self.names() {
            let Some(client) = self.remove(&name) else {
                continue;
            };
            if let Err(e) = client.close().await {
                warn!("Failed to close Modbus client '{}': {}", name, e);
            }
            closed += 1;
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    use crate::error::{ModbusError, ModbusResult};
    use crate::transport::TransportStats;

    #[derive(Default)]
    struct IdleTransport {
        connected: bool,
    }

    impl ModbusTransport for IdleTransport {
        async fn connect(&mut self, _endpoint: SocketAddr, _cancel: &CancellationToken) -> ModbusResult<()> {
            self.connected = true;
            Ok(())
        }

        async fn send(&mut self, _frame: &[u8]) -> ModbusResult<()> {
            Ok(())
        }

        async fn receive(&mut self, _cancel: &CancellationToken) -> ModbusResult<Bytes> {
            Err(ModbusError::connection("idle"))
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn close(&mut self) -> ModbusResult<()> {
            self.connected = false;
            Ok(())
        }

        fn get_stats(&self) -> TransportStats {
            TransportStats::default()
        }
    }

    fn counting_registry(built: Arc<AtomicUsize>) -> ClientRegistry<IdleTransport> {
        ClientRegistry::with_factory(move |_: &ClientOptions| {
            built.fetch_add(1, Ordering::SeqCst);
            IdleTransport::default()
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_get_or_create_builds_once() {
        let built = Arc::new(AtomicUsize::new(0));
        let configured = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(counting_registry(built.clone()));

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let registry = registry.clone();
                let configured = configured.clone();
                tokio::spawn(async move {
                    registry.get_or_create("plc", move |options| {
                        configured.fetch_add(1, Ordering::SeqCst);
                        options.read_timeout = Duration::from_millis(250);
                    })
                })
            })
            .collect();

        let mut clients = Vec::new();
        for task in tasks {
            clients.push(task.await.unwrap());
        }

        assert_eq!(configured.load(Ordering::SeqCst), 1);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(clients.iter().all(|c| Arc::ptr_eq(c, &clients[0])));
        assert_eq!(clients[0].options().read_timeout, Duration::from_millis(250));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_existing_client_ignores_configure() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        let first = registry.get_or_create("a", |o| o.read_timeout = Duration::from_millis(10));
        let second = registry.get_or_create("a", |_| panic!("configure must not run twice"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.options().read_timeout, Duration::from_millis(10));
    }

    #[test]
    fn test_names_are_independent() {
        let built = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(built.clone());
        let a = registry.get_or_create("a", |_| {});
        let b = registry.get_or_create("b", |_| {});
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 2);

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert!(registry.contains("a"));
        assert!(registry.get("c").is_none());
    }

    #[test]
    fn test_remove_semantics() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        assert!(registry.remove("missing").is_none());

        let original = registry.get_or_create("plc", |_| {});
        let removed = registry.remove("plc").unwrap();
        assert!(Arc::ptr_eq(&original, &removed));
        assert!(registry.is_empty());
        assert!(registry.remove("plc").is_none());

        let replacement = registry.get_or_create("plc", |_| {});
        assert!(!Arc::ptr_eq(&original, &replacement));
    }

    #[tokio::test]
    async fn test_remove_does_not_close() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        let client = registry.get_or_create("plc", |_| {});
        client.connect("127.0.0.1:502".parse().unwrap()).await.unwrap();

        let removed = registry.remove("plc").unwrap();
        assert!(removed.is_connected());
        removed.close().await.unwrap();
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_close_all() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        let a = registry.get_or_create("a", |_| {});
        let b = registry.get_or_create("b", |_| {});
        a.connect("127.0.0.1:502".parse().unwrap()).await.unwrap();
        b.connect("127.0.0.1:503".parse().unwrap()).await.unwrap();

        assert_eq!(registry.close_all().await, 2);
        assert!(registry.is_empty());
        assert!(!a.is_connected());
        assert!(!b.is_connected());
    }
}
