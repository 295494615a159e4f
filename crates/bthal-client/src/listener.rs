use std::io::{Read, Write};

use bthal_frame::{Frame, FrameConfig, FrameReader, FrameWriter};
use bthal_proto::{is_command, is_event, HalStatus, ServiceId, OP_ERROR};
use bthal_transport::{Endpoint, HalSocket, HalStream};
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Service side of the HAL socket: accepts controller connections.
pub struct ServiceListener {
    socket: HalSocket,
    frame_config: FrameConfig,
}

impl ServiceListener {
    /// Bind to `endpoint`.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        let socket = HalSocket::bind(endpoint)?;
        info!(
            endpoint = %endpoint,
            transport = socket.transport_name(),
            "HAL service listening"
        );
        Ok(Self {
            socket,
            frame_config: FrameConfig::default(),
        })
    }

    /// Override the frame configuration applied to accepted connections.
    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// Accept the next controller connection.
    pub fn accept(&self) -> Result<ServiceEndpoint<HalStream, HalStream>> {
        let stream = self.socket.accept()?;
        match stream.peer_credentials() {
            Some((uid, _gid, pid)) => debug!(pid, uid, "controller connected"),
            None => debug!("controller connected"),
        }
        ServiceEndpoint::from_stream(stream, self.frame_config.clone())
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.socket.endpoint()
    }
}

/// One accepted controller connection, seen from the service.
pub struct ServiceEndpoint<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl ServiceEndpoint<HalStream, HalStream> {
    /// Wrap a connected stream.
    pub fn from_stream(stream: HalStream, config: FrameConfig) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let reader = FrameReader::with_config_hal(reader_stream, config.clone())?;
        let writer = FrameWriter::with_config_hal(stream, config)?;
        Ok(Self::new(reader, writer))
    }
}

impl<R: Read, W: Write> ServiceEndpoint<R, W> {
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>) -> Self {
        Self { reader, writer }
    }

    /// Wait for the next command from the controller.
    ///
    /// Controllers only send commands; anything outside the command range
    /// is rejected.
    pub fn recv_command(&mut self) -> Result<Frame> {
        let frame = self.reader.read_frame().map_err(|err| match err {
            bthal_frame::FrameError::ConnectionClosed => {
                ClientError::Disconnected("controller closed the connection".to_string())
            }
            other => ClientError::Frame(other),
        })?;
        if !is_command(frame.opcode) {
            return Err(ClientError::UnexpectedResponse(format!(
                "controller sent non-command opcode {:#04x} to service {}",
                frame.opcode, frame.service_id
            )));
        }
        Ok(frame)
    }

    /// Send the success response for a command.
    pub fn respond(&mut self, service_id: ServiceId, opcode: u8, payload: &[u8]) -> Result<()> {
        if !is_command(opcode) {
            return Err(ClientError::InvalidArgument(format!(
                "response opcode {opcode:#04x} is outside the command range"
            )));
        }
        self.writer.send(service_id, opcode, payload)?;
        Ok(())
    }

    /// Send an error response carrying `status`.
    pub fn respond_error(&mut self, service_id: ServiceId, status: HalStatus) -> Result<()> {
        debug!(service_id, %status, "responding with error");
        self.writer.send(service_id, OP_ERROR, &[status.code()])?;
        Ok(())
    }

    /// Push an unsolicited event.
    pub fn send_event(&mut self, service_id: ServiceId, opcode: u8, payload: &[u8]) -> Result<()> {
        if !is_event(opcode) {
            return Err(ClientError::InvalidArgument(format!(
                "event opcode {opcode:#04x} is below the event range"
            )));
        }
        self.writer.send(service_id, opcode, payload)?;
        Ok(())
    }
}
