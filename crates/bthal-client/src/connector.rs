use std::time::Duration;

use bthal_frame::{FrameConfig, FrameReader, FrameWriter};
#[cfg(unix)]
use bthal_transport::HalSocket;
use bthal_transport::{Endpoint, HalStream};
use tracing::debug;

use crate::client::{HalClient, DEFAULT_REQUEST_TIMEOUT};
use crate::error::Result;

/// Client connected over a [`HalStream`].
pub type HalConnection = HalClient<HalStream, HalStream>;

/// Connection settings for the controller side.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Where the HAL service listens.
    pub endpoint: Endpoint,
    /// How long a command may wait for its response.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Connect to the HAL service at `endpoint` with default settings.
pub fn connect(endpoint: &Endpoint) -> Result<HalConnection> {
    connect_with_config(&ClientConfig {
        endpoint: endpoint.clone(),
        ..ClientConfig::default()
    })
}

/// Connect with explicit configuration.
pub fn connect_with_config(config: &ClientConfig) -> Result<HalConnection> {
    #[cfg(not(unix))]
    {
        return Err(bthal_transport::TransportError::Unsupported(format!(
            "cannot connect to {}: the HAL socket requires Unix domain sockets",
            config.endpoint
        ))
        .into());
    }

    #[cfg(unix)]
    {
        let stream = HalSocket::connect(&config.endpoint)?;
        debug!(endpoint = %config.endpoint, "connected to HAL service");
        HalClient::from_stream(stream, config.request_timeout)
    }
}

impl HalClient<HalStream, HalStream> {
    /// Build a client over an already connected stream.
    ///
    /// The request timeout doubles as the socket read timeout.
    pub fn from_stream(stream: HalStream, request_timeout: Duration) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let frame_config = FrameConfig {
            read_timeout: Some(request_timeout),
            write_timeout: Some(request_timeout),
        };

        let reader = FrameReader::with_config_hal(reader_stream, frame_config.clone())?;
        let writer = FrameWriter::with_config_hal(stream, frame_config)?;

        let mut client = HalClient::new(reader, writer);
        client.set_request_timeout(request_timeout);
        Ok(client)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;
    use std::thread;

    use bthal_proto::schema::control;
    use bthal_proto::service;

    use super::*;
    use crate::listener::ServiceListener;

    fn make_sock_path(tag: &str) -> PathBuf {
        let dir = PathBuf::from(format!(
            "/tmp/bthal-c-{}-{}-{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir.join("hal.sock")
    }

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, Endpoint::abstract_name("bluez_hal_socket"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn connect_and_register() {
        let sock_path = make_sock_path("register");
        let endpoint = Endpoint::path(&sock_path);
        let listener = ServiceListener::bind(&endpoint).expect("listener should bind");

        let server = thread::spawn(move || {
            let mut service = listener.accept().expect("listener should accept");
            let frame = service.recv_command().expect("should receive command");
            service
                .respond(service::CORE, control::REGISTER_MODULE, &frame.payload)
                .expect("should confirm");
        });

        let mut client = connect(&endpoint).expect("client should connect");
        client
            .register_module(service::HIDHOST)
            .expect("register should succeed");
        assert!(client.is_ready(service::HIDHOST));

        server.join().expect("server thread should complete");
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn connect_to_missing_service_fails() {
        let sock_path = make_sock_path("missing");
        let err = connect(&Endpoint::path(&sock_path)).err().expect("connect should fail");
        assert!(matches!(err, crate::ClientError::Transport(_)));
        if let Some(parent) = sock_path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }
}
