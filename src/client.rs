//! Client builder and query session.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the target
//! device. Each [`Client::query`] runs one short session:
//! 1. Resolve the target in the registry
//! 2. Connect to the device
//! 3. Send a READ frame
//! 4. Receive one response frame and check its object ID
//! 5. Decode the payload and shut the socket down
//!
//! # Example
//!
//! ```ignore
//! use rctclient::{Client, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder().host("192.168.0.10").build();
//!     let value = client.query(&Target::Name("battery.soc".into())).await?;
//!     println!("{}", value);
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::codec::{decode_value, Value};
use crate::error::{QueryError, Result};
use crate::protocol::{build_frame, Command};
use crate::registry::{ObjectDescriptor, Registry};
use crate::transport::{connect, StreamReceiver};

/// Default device port.
pub const DEFAULT_PORT: u16 = 8899;

/// Default wait for response data.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default wait for the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Object selection, by ID or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(u32),
    Name(String),
}

impl Target {
    /// Build a target from optional `--id` / `--name` values.
    ///
    /// Exactly one must be given. IDs take the form `0xXXXXXXXX`.
    pub fn from_options(id: Option<&str>, name: Option<&str>) -> Result<Self> {
        match (id, name) {
            (Some(id), None) => parse_object_id(id).map(Target::Id),
            (None, Some(name)) => Ok(Target::Name(name.to_string())),
            _ => Err(QueryError::Validation(
                "Please specify either --id or --name".to_string(),
            )),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Id(id) => write!(f, "0x{:08X}", id),
            Target::Name(name) => f.write_str(name),
        }
    }
}

fn parse_object_id(id: &str) -> Result<u32> {
    let invalid = || QueryError::Validation(format!("Invalid --id parameter, can't parse: {id}"));

    let digits = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(invalid)?;
    let object_id = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;

    tracing::debug!("Parsed ID: 0x{:X}", object_id);
    Ok(object_id)
}

/// A decoded value together with the descriptor it was read for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub descriptor: ObjectDescriptor,
    pub value: Value,
}

/// Connection settings for a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Idle timeout while waiting for the response.
    pub timeout: Duration,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Builder for configuring and creating a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    registry: Option<Arc<Registry>>,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            registry: None,
        }
    }

    /// Set the device host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the device port.
    ///
    /// Default: 8899
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the response idle timeout.
    ///
    /// Default: 2 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    ///
    /// Default: 5 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Use a custom object registry instead of the built-in table.
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Build the client.
    pub fn build(self) -> Client {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(Registry::builtin()));
        Client::new(self.config, registry)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for reading objects from a device.
///
/// Holds no connection; every query opens and closes its own.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    registry: Arc<Registry>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from a config and registry.
    pub fn new(config: ClientConfig, registry: Arc<Registry>) -> Self {
        Self { config, registry }
    }

    /// The connection settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The object registry used to resolve targets.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read the value of one object.
    pub async fn query(&self, target: &Target) -> Result<Value> {
        self.read(target).await.map(|reading| reading.value)
    }

    /// Read one object, returning its descriptor along with the value.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NotFound`] before any connection is attempted
    /// - [`QueryError::Connection`] if the device cannot be reached
    /// - [`QueryError::Receive`] on timeout, close or a corrupt frame
    /// - [`QueryError::UnexpectedResponse`] if the answer is for another object
    /// - [`QueryError::Decode`] if the payload does not fit the data type
    pub async fn read(&self, target: &Target) -> Result<Reading> {
        let descriptor = self.registry.resolve(target)?.clone();
        tracing::debug!(object = %descriptor.name, "Object info: 0x{:08X}", descriptor.object_id);

        let request = build_frame(Command::Read, descriptor.object_id, &[])?;

        let mut stream = connect(
            &self.config.host,
            self.config.port,
            self.config.connect_timeout,
        )
        .await?;

        stream.write_all(&request).await?;
        tracing::debug!(bytes = request.len(), "Sent READ frame");

        let mut receiver = StreamReceiver::new(&mut stream, self.config.timeout);
        let response = receiver.receive().await?;
        tracing::debug!(
            command = ?response.command(),
            payload = response.payload().len(),
            "Got response frame"
        );

        if response.object_id() != descriptor.object_id {
            return Err(QueryError::UnexpectedResponse {
                expected: descriptor.object_id,
                actual: response.object_id(),
            });
        }

        let value = decode_value(descriptor.response_data_type, response.payload())?;

        if let Err(e) = stream.shutdown().await {
            tracing::error!("Error closing socket: {}", e);
        }

        Ok(Reading { descriptor, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DataType;

    #[test]
    fn test_target_from_id() {
        assert_eq!(
            Target::from_options(Some("0x959930BF"), None).unwrap(),
            Target::Id(0x959930BF)
        );
        assert_eq!(
            Target::from_options(Some("0Xabcd"), None).unwrap(),
            Target::Id(0xABCD)
        );
    }

    #[test]
    fn test_target_from_name() {
        assert_eq!(
            Target::from_options(None, Some("battery.soc")).unwrap(),
            Target::Name("battery.soc".to_string())
        );
    }

    #[test]
    fn test_target_requires_exactly_one() {
        assert!(matches!(
            Target::from_options(None, None),
            Err(QueryError::Validation(_))
        ));
        assert!(matches!(
            Target::from_options(Some("0x1"), Some("battery.soc")),
            Err(QueryError::Validation(_))
        ));
    }

    #[test]
    fn test_target_rejects_bad_ids() {
        for id in ["1234", "0x", "0xZZ", "0x123456789"] {
            assert!(
                matches!(Target::from_options(Some(id), None), Err(QueryError::Validation(_))),
                "{id} should be rejected"
            );
        }
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Id(0xAB).to_string(), "0x000000AB");
        assert_eq!(Target::Name("a.b".into()).to_string(), "a.b");
    }

    #[test]
    fn test_builder_defaults() {
        let client = ClientBuilder::default().build();
        assert_eq!(client.config(), &ClientConfig::default());
        assert_eq!(client.config().port, 8899);
        assert_eq!(client.config().timeout, Duration::from_secs(2));
        assert!(!client.registry().is_empty());
    }

    #[test]
    fn test_builder_method_chaining() {
        let registry = Registry::new(vec![ObjectDescriptor::new(1, "x", DataType::Bool)]).unwrap();
        let client = Client::builder()
            .host("10.0.0.2")
            .port(1234)
            .timeout(Duration::from_millis(500))
            .connect_timeout(Duration::from_secs(1))
            .registry(Arc::new(registry))
            .build();

        assert_eq!(client.config().host, "10.0.0.2");
        assert_eq!(client.config().port, 1234);
        assert_eq!(client.config().timeout, Duration::from_millis(500));
        assert_eq!(client.config().connect_timeout, Duration::from_secs(1));
        assert_eq!(client.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_target_fails_before_connecting() {
        // Nothing listens on port 1; resolution must fail first.
        let client = Client::builder().host("127.0.0.1").port(1).build();
        let err = client.query(&Target::Id(0xDEADBEEF)).await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound(_)));
    }
}
