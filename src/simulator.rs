//! Device simulator.
//!
//! Listens on TCP and answers read requests with the `sim_value` of the
//! requested object (or the neutral default of its data type). Writes,
//! unknown objects and corrupt frames are logged and dropped.
//!
//! At most [`MAX_SIMULATOR_CLIENTS`] connections are served at once. A
//! permit is taken before `accept`, so further clients wait in the listen
//! backlog until a slot frees up.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rctclient::{Registry, Simulator};
//!
//! let simulator = Simulator::bind("127.0.0.1", 0, Arc::new(Registry::builtin())).await?;
//! let address = simulator.local_addr()?;
//! tokio::spawn(simulator.run());
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::codec::{default_value, encode_value};
use crate::error::SimulatorError;
use crate::protocol::{Command, Frame, FrameBuffer, MAX_BODY_LENGTH};
use crate::registry::Registry;
use crate::transport::{bind, DEFAULT_CHUNK_SIZE};

/// Connections served concurrently.
pub const MAX_SIMULATOR_CLIENTS: usize = 5;

/// A running simulator socket.
pub struct Simulator {
    listener: TcpListener,
    registry: Arc<Registry>,
    max_clients: usize,
}

impl Simulator {
    /// Bind the listening socket.
    pub async fn bind(
        host: &str,
        port: u16,
        registry: Arc<Registry>,
    ) -> Result<Self, SimulatorError> {
        let listener = bind(host, port).await?;
        Ok(Self {
            listener,
            registry,
            max_clients: MAX_SIMULATOR_CLIENTS,
        })
    }

    /// Set the number of connections served at once.
    ///
    /// Default: 5
    pub fn max_clients(mut self, limit: usize) -> Self {
        self.max_clients = limit.max(1);
        self
    }

    /// The bound address (useful after binding port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, SimulatorError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the listener fails.
    pub async fn run(self) -> Result<(), SimulatorError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Connections already accepted keep running until their peer closes.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), SimulatorError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let semaphore = Arc::new(Semaphore::new(self.max_clients));
        tracing::info!(
            address = ?self.listener.local_addr().ok(),
            max_clients = self.max_clients,
            "Simulator listening"
        );

        loop {
            let permit = tokio::select! {
                _ = &mut shutdown => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            let (stream, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => accepted?,
            };
            tracing::info!(%peer, "Client connected");

            let registry = self.registry.clone();
            tokio::spawn(async move {
                // Permit is held until this task completes
                let _permit = permit;

                if let Err(e) = serve_connection(stream, &registry).await {
                    tracing::error!(%peer, "Connection error: {}", e);
                }
                tracing::info!(%peer, "Client disconnected");
            });
        }

        tracing::info!("Simulator stopped");
        Ok(())
    }
}

/// Read frames from one client and answer them until it disconnects.
async fn serve_connection(mut stream: TcpStream, registry: &Registry) -> std::io::Result<()> {
    let mut frames = FrameBuffer::new();
    let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];

    loop {
        let n = match stream.read(&mut buf).await? {
            0 => return Ok(()),
            n => n,
        };
        tracing::debug!(bytes = n, "Received chunk");
        frames.extend(&buf[..n]);

        loop {
            match frames.next_frame() {
                Ok(Some(frame)) => {
                    if let Some(response) = respond(registry, &frame) {
                        stream.write_all(&response.encode()).await?;
                    }
                }
                Ok(None) => break,
                Err(e) => tracing::warn!("Dropping frame: {}", e),
            }
        }
    }
}

/// Build the answer to one request frame, if it gets one.
pub fn respond(registry: &Registry, request: &Frame) -> Option<Frame> {
    let object_id = request.object_id();

    if !request.command().is_read() {
        tracing::debug!(command = ?request.command(), object_id, "Ignoring non-read request");
        return None;
    }

    let descriptor = match registry.resolve_by_id(object_id) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("Ignoring request: {}", e);
            return None;
        }
    };

    let value = descriptor
        .sim_value
        .clone()
        .unwrap_or_else(|| default_value(descriptor.response_data_type));
    let payload = match encode_value(&value, descriptor.response_data_type) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(object = %descriptor.name, "Cannot encode simulated value: {}", e);
            return None;
        }
    };

    let long = request.command().prefix_len() + payload.len() > MAX_BODY_LENGTH;
    let command = match (request.command().response(), long) {
        (Command::Response, true) => Command::LongResponse,
        (Command::PlantResponse, true) => Command::PlantLongResponse,
        (command, _) => command,
    };

    tracing::debug!(object = %descriptor.name, %value, "Answering read");
    match Frame::build(command, request.address(), object_id, payload) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::warn!(object_id, "Cannot build response: {}", e);
            None
        }
    }
}
