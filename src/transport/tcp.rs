//! TCP connection setup for the client and the simulator.
//!
//! # Example
//!
//! ```ignore
//! use rctclient::transport::connect;
//! use std::time::Duration;
//!
//! let stream = connect("192.168.0.10", 8899, Duration::from_secs(5)).await?;
//! ```

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::error::{QueryError, SimulatorError};

/// Format `host:port`, bracketing bare IPv6 addresses.
pub fn socket_address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Open a TCP connection, giving up after `timeout`.
///
/// Nagle is disabled; requests are single small frames.
pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, QueryError> {
    let address = socket_address(host, port);
    tracing::debug!(%address, "Connecting");

    let stream = match tokio::time::timeout(timeout, TcpStream::connect(&address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(source)) => return Err(QueryError::Connection { address, source }),
        Err(_) => {
            return Err(QueryError::Connection {
                address,
                source: std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("no connection within {:?}", timeout),
                ),
            })
        }
    };

    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!("Failed to set TCP_NODELAY: {}", e);
    }
    Ok(stream)
}

/// Bind a listening socket.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, SimulatorError> {
    let address = socket_address(host, port);
    TcpListener::bind(&address)
        .await
        .map_err(|source| SimulatorError::Bind { address, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_address() {
        assert_eq!(socket_address("localhost", 8899), "localhost:8899");
        assert_eq!(socket_address("10.0.0.1", 1), "10.0.0.1:1");
        assert_eq!(socket_address("::1", 8899), "[::1]:8899");
        assert_eq!(socket_address("[::1]", 8899), "[::1]:8899");
    }

    #[tokio::test]
    async fn test_connect_and_bind() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (accepted, connected) = tokio::join!(
            listener.accept(),
            connect("127.0.0.1", port, Duration::from_secs(1))
        );
        assert!(accepted.is_ok());
        assert!(connected.unwrap().nodelay().unwrap());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Grab a free port and close it again.
        let port = {
            let listener = bind("127.0.0.1", 0).await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = connect("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap_err();
        match err {
            QueryError::Connection { address, .. } => {
                assert_eq!(address, format!("127.0.0.1:{}", port))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bind_error_carries_address() {
        let taken = bind("127.0.0.1", 0).await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind("127.0.0.1", port).await.unwrap_err();
        let expected = format!("127.0.0.1:{}", port);
        assert!(matches!(err, SimulatorError::Bind { ref address, .. } if *address == expected));
    }
}
