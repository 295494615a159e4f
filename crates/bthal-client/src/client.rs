use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bthal_frame::{FrameError, FrameReader, FrameWriter};
use bthal_proto::payload::{decode_register_response, module_command};
use bthal_proto::schema::control;
use bthal_proto::{
    classify, is_command, service, Event, HalStatus, Message, ProtoError, ReadyServices,
    Response, ServiceId,
};
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::events::{EventQueue, EventSink};
use crate::pending::{PendingRequest, PendingSlot};

/// Default time to wait for a command response.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Controller side of the HAL socket.
///
/// Commands are strictly sequential: [`request`](Self::request) writes one
/// frame and reads until the matching response arrives. Events read in the
/// meantime go to the event sink.
pub struct HalClient<R, W, S = EventQueue> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    ready: ReadyServices,
    pending: PendingSlot,
    /// Request given up on whose reply may still arrive.
    abandoned: Option<PendingRequest>,
    sink: S,
    request_timeout: Duration,
}

impl<R: Read, W: Write> HalClient<R, W> {
    /// Create a client that queues events for [`take_events`](Self::take_events).
    pub fn new(reader: FrameReader<R>, writer: FrameWriter<W>) -> Self {
        Self::with_sink(reader, writer, EventQueue::new())
    }

    /// Drain queued events in arrival order.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.sink.drain()
    }
}

impl<R: Read, W: Write, S: EventSink> HalClient<R, W, S> {
    /// Create a client delivering events to `sink`.
    pub fn with_sink(reader: FrameReader<R>, writer: FrameWriter<W>, sink: S) -> Self {
        Self {
            reader,
            writer,
            ready: ReadyServices::new(),
            pending: PendingSlot::new(),
            abandoned: None,
            sink,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn set_request_timeout(&mut self, timeout: Duration) {
        self.request_timeout = timeout;
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Send a command and wait for its response payload.
    ///
    /// Non-core services must be registered first; otherwise this fails
    /// with [`ClientError::ServiceNotReady`] and nothing is written.
    pub fn request(&mut self, service_id: ServiceId, opcode: u8, payload: &[u8]) -> Result<Bytes> {
        if !is_command(opcode) {
            return Err(ClientError::InvalidArgument(format!(
                "opcode {opcode:#04x} is not a command"
            )));
        }
        if !service::is_valid(service_id) {
            return Err(ProtoError::UnknownService(service_id).into());
        }
        if let Err(ProtoError::NotReady { id, name }) = self.ready.require_ready(service_id) {
            return Err(ClientError::ServiceNotReady { id, name });
        }

        let pending = self.pending.begin(service_id, opcode)?;
        let result = self.exchange(pending, payload);
        self.pending.complete();
        result
    }

    /// Register `service_id` with the core service.
    ///
    /// The confirmation must echo the service id. Registering a service that
    /// is already ready sends nothing.
    pub fn register_module(&mut self, service_id: ServiceId) -> Result<()> {
        if !service::is_valid(service_id) {
            return Err(ProtoError::UnknownService(service_id).into());
        }
        if self.ready.is_ready(service_id) {
            debug!(service_id, "service already registered");
            return Ok(());
        }

        let payload = self.request(
            service::CORE,
            control::REGISTER_MODULE,
            &module_command(service_id),
        )?;
        let echoed = decode_register_response(&payload)?;
        if echoed != service_id {
            return Err(ClientError::UnexpectedResponse(format!(
                "registration of service {service_id} confirmed service {echoed}"
            )));
        }

        self.ready.mark_ready(service_id)?;
        info!(
            service_id,
            service = service::display_name(service_id),
            "service registered"
        );
        Ok(())
    }

    /// Unregister `service_id`. Returns whether it was registered.
    ///
    /// Unregistering a service that is not registered is not an error, on
    /// either side of the socket.
    pub fn unregister_module(&mut self, service_id: ServiceId) -> Result<bool> {
        if !self.ready.is_ready(service_id) || service_id == service::CORE {
            debug!(service_id, "service not registered");
            return Ok(false);
        }

        let result = self.request(
            service::CORE,
            control::UNREGISTER_MODULE,
            &module_command(service_id),
        );
        let was_ready = self.ready.mark_unregistered(service_id);
        match result {
            Ok(_) => {
                info!(service_id, "service unregistered");
                Ok(was_ready)
            }
            Err(ClientError::Status {
                status: HalStatus::NotReady | HalStatus::Done,
                ..
            }) => {
                debug!(service_id, "service already unregistered on the service side");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Read one frame while no request is outstanding.
    ///
    /// Events go to the sink. The late reply of an abandoned request is
    /// dropped. Any other response has no request to answer; it is logged
    /// and reported as [`ClientError::UnexpectedResponse`].
    pub fn poll_event(&mut self) -> Result<()> {
        if let Some(current) = self.pending.current() {
            return Err(ClientError::RequestInFlight {
                service_id: current.service_id,
                opcode: current.opcode,
            });
        }

        let frame = match self.reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::Io(err)) if is_timeout(err.kind()) => {
                return Err(ClientError::Timeout(self.request_timeout));
            }
            Err(err) => return Err(map_read_error(err)),
        };

        match classify(frame)? {
            Message::Event(event) => {
                self.route_event(event);
                Ok(())
            }
            Message::Response(response)
                if self.take_late_reply(response.service_id(), response.opcode()) =>
            {
                Ok(())
            }
            Message::Response(response) => {
                warn!(
                    service_id = response.service_id(),
                    opcode = response.opcode(),
                    "response received with no request outstanding"
                );
                Err(ClientError::UnexpectedResponse(format!(
                    "service {} opcode {:#04x} with no request outstanding",
                    response.service_id(),
                    response.opcode()
                )))
            }
        }
    }

    pub fn is_ready(&self, service_id: ServiceId) -> bool {
        self.ready.is_ready(service_id)
    }

    pub fn ready_services(&self) -> &ReadyServices {
        &self.ready
    }

    /// The request currently awaiting a response, if any.
    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.current()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the client and return its reader and writer.
    pub fn into_parts(self) -> (FrameReader<R>, FrameWriter<W>) {
        (self.reader, self.writer)
    }

    fn exchange(&mut self, pending: PendingRequest, payload: &[u8]) -> Result<Bytes> {
        self.writer
            .send(pending.service_id, pending.opcode, payload)?;
        debug!(
            service_id = pending.service_id,
            opcode = pending.opcode,
            len = payload.len(),
            "request sent"
        );

        let deadline = pending.issued_at + self.request_timeout;
        loop {
            let frame = match self.reader.read_frame() {
                Ok(frame) => frame,
                Err(FrameError::Io(err)) if is_timeout(err.kind()) => {
                    if Instant::now() >= deadline {
                        let timeout = ClientError::Timeout(self.request_timeout);
                        return Err(self.abandon(pending, timeout));
                    }
                    continue;
                }
                Err(err) => return Err(map_read_error(err)),
            };

            let (service_id, opcode) = (frame.service_id, frame.opcode);
            let message = match classify(frame) {
                Ok(message) => message,
                Err(err) => {
                    if self.take_late_reply(service_id, opcode) {
                        continue;
                    }
                    if pending.answered_by(service_id, opcode) {
                        return Err(err.into());
                    }
                    warn!(service_id, opcode, error = %err, "skipping unreadable frame");
                    continue;
                }
            };

            let response = match message {
                Message::Event(event) => {
                    self.route_event(event);
                    if Instant::now() >= deadline {
                        let timeout = ClientError::Timeout(self.request_timeout);
                        return Err(self.abandon(pending, timeout));
                    }
                    continue;
                }
                Message::Response(response) => response,
            };

            if self.take_late_reply(response.service_id(), response.opcode()) {
                continue;
            }

            if !pending.matches(&response) {
                warn!(
                    expected_service = pending.service_id,
                    expected_opcode = pending.opcode,
                    service_id = response.service_id(),
                    opcode = response.opcode(),
                    "response does not match pending request"
                );
                let err = ClientError::UnexpectedResponse(format!(
                    "expected service {} opcode {:#04x}, got service {} opcode {:#04x}",
                    pending.service_id,
                    pending.opcode,
                    response.service_id(),
                    response.opcode()
                ));
                return Err(self.abandon(pending, err));
            }

            self.abandoned = None;
            return match response {
                Response::Error { service_id, status } => Err(ClientError::Status {
                    service_id,
                    opcode: pending.opcode,
                    status,
                }),
                Response::Success { payload, .. } => Ok(payload),
            };
        }
    }

    /// Remember `pending` so its reply is dropped if it turns up later.
    fn abandon(&mut self, pending: PendingRequest, err: ClientError) -> ClientError {
        debug!(
            service_id = pending.service_id,
            opcode = pending.opcode,
            "request abandoned"
        );
        self.abandoned = Some(pending);
        err
    }

    /// Consume the abandoned request's reply if this frame is it.
    ///
    /// The service answers in order, so the first response that fits the
    /// abandoned request is its late reply.
    fn take_late_reply(&mut self, service_id: ServiceId, opcode: u8) -> bool {
        match self.abandoned {
            Some(late) if late.answered_by(service_id, opcode) => {
                debug!(service_id, opcode, "dropping late reply");
                self.abandoned = None;
                true
            }
            _ => false,
        }
    }

    fn route_event(&mut self, event: Event) {
        debug!(
            service_id = event.service_id,
            opcode = event.opcode,
            name = event.name(),
            "event received"
        );
        self.sink.deliver(event);
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn map_read_error(err: FrameError) -> ClientError {
    match err {
        FrameError::ConnectionClosed => {
            ClientError::Disconnected("connection closed by service".to_string())
        }
        other => ClientError::Frame(other),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::os::unix::net::UnixStream;
    use std::thread;

    use bthal_frame::{Frame, FrameConfig};
    use bthal_proto::schema::bluetooth;
    use bthal_transport::HalStream;
    use bytes::BytesMut;

    use super::*;
    use crate::listener::ServiceEndpoint;

    type TestClient = HalClient<HalStream, HalStream>;

    fn connected() -> (TestClient, ServiceEndpoint<HalStream, HalStream>) {
        let (left, right) = UnixStream::pair().unwrap();
        let client = HalClient::from_stream(HalStream::from_unix(left), Duration::from_secs(2))
            .unwrap();
        let service =
            ServiceEndpoint::from_stream(HalStream::from_unix(right), FrameConfig::default())
                .unwrap();
        (client, service)
    }

    fn wire(frames: &[Frame]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for frame in frames {
            bthal_frame::encode_frame(frame.service_id, frame.opcode, &frame.payload, &mut buf)
                .unwrap();
        }
        buf.to_vec()
    }

    fn scripted(frames: &[Frame]) -> HalClient<Cursor<Vec<u8>>, Cursor<Vec<u8>>> {
        HalClient::new(
            FrameReader::new(Cursor::new(wire(frames))),
            FrameWriter::new(Cursor::new(Vec::new())),
        )
    }

    fn written(client: HalClient<Cursor<Vec<u8>>, Cursor<Vec<u8>>>) -> Vec<u8> {
        client.into_parts().1.into_inner().into_inner()
    }

    #[test]
    fn register_then_request() {
        let (mut client, mut service) = connected();

        let server = thread::spawn(move || {
            let register = service.recv_command().unwrap();
            assert_eq!(
                (register.service_id, register.opcode),
                (service::CORE, control::REGISTER_MODULE)
            );
            service
                .respond(service::CORE, control::REGISTER_MODULE, &register.payload)
                .unwrap();

            let enable = service.recv_command().unwrap();
            assert_eq!(enable.opcode, bluetooth::ENABLE);
            service
                .respond(service::BLUETOOTH, bluetooth::ENABLE, &[])
                .unwrap();
        });

        client.register_module(service::BLUETOOTH).unwrap();
        assert!(client.is_ready(service::BLUETOOTH));
        let payload = client
            .request(service::BLUETOOTH, bluetooth::ENABLE, &[])
            .unwrap();
        assert!(payload.is_empty());
        assert!(client.pending().is_none());

        server.join().unwrap();
    }

    #[test]
    fn request_before_registration_writes_nothing() {
        let mut client = scripted(&[]);
        let err = client
            .request(service::HIDHOST, 0x01, &[0; 6])
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::ServiceNotReady {
                id: service::HIDHOST,
                name: "hidhost"
            }
        ));
        assert!(written(client).is_empty());
    }

    #[test]
    fn events_during_request_go_to_sink() {
        let mut client = scripted(&[
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::BLUETOOTH]),
            Frame::new(
                service::BLUETOOTH,
                bluetooth::EV_ADAPTER_STATE_CHANGED,
                vec![0x01],
            ),
            Frame::new(
                service::BLUETOOTH,
                bluetooth::EV_DISCOVERY_STATE_CHANGED,
                vec![0x01],
            ),
            Frame::new(service::BLUETOOTH, bluetooth::START_DISCOVERY, Vec::new()),
        ]);

        client.register_module(service::BLUETOOTH).unwrap();
        client
            .request(service::BLUETOOTH, bluetooth::START_DISCOVERY, &[])
            .unwrap();

        let events = client.take_events();
        let opcodes: Vec<u8> = events.iter().map(|ev| ev.opcode).collect();
        assert_eq!(
            opcodes,
            vec![
                bluetooth::EV_ADAPTER_STATE_CHANGED,
                bluetooth::EV_DISCOVERY_STATE_CHANGED
            ]
        );
        assert!(client.take_events().is_empty());
    }

    #[test]
    fn error_response_becomes_status() {
        let mut client = scripted(&[Frame::new(service::CORE, 0x00, vec![0x04])]);
        let err = client.register_module(service::A2DP).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Status {
                service_id: service::CORE,
                opcode: control::REGISTER_MODULE,
                status: HalStatus::Busy,
            }
        ));
        assert_eq!(err.status(), Some(HalStatus::Busy));
        assert!(!client.is_ready(service::A2DP));
    }

    #[test]
    fn mismatched_response_is_reported() {
        let mut client = scripted(&[Frame::new(
            service::CORE,
            control::UNREGISTER_MODULE,
            vec![service::A2DP],
        )]);
        let err = client.register_module(service::A2DP).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(_)));
        assert!(client.pending().is_none());
    }

    #[test]
    fn reply_left_behind_by_mismatch_is_dropped() {
        let mut client = scripted(&[
            Frame::new(service::CORE, control::UNREGISTER_MODULE, vec![service::A2DP]),
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::A2DP]),
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::A2DP]),
        ]);
        assert!(client.register_module(service::A2DP).is_err());

        client.register_module(service::A2DP).unwrap();
        assert!(client.is_ready(service::A2DP));
    }

    #[test]
    fn unreadable_frame_mid_request_is_skipped() {
        let mut client = scripted(&[
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::BLUETOOTH]),
            Frame::new(0x42, 0x01, Vec::new()),
            Frame::new(service::BLUETOOTH, bluetooth::START_DISCOVERY, Vec::new()),
        ]);
        client.register_module(service::BLUETOOTH).unwrap();

        let payload = client
            .request(service::BLUETOOTH, bluetooth::START_DISCOVERY, &[])
            .unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn malformed_reply_to_pending_request_fails_it() {
        let mut client = scripted(&[
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::BLUETOOTH]),
            Frame::new(service::BLUETOOTH, 0x00, vec![0x7f]),
        ]);
        client.register_module(service::BLUETOOTH).unwrap();

        let err = client
            .request(service::BLUETOOTH, bluetooth::ENABLE, &[])
            .unwrap_err();
        assert!(matches!(err, ClientError::Proto(ProtoError::BadStatus(_))));
        assert!(client.pending().is_none());
    }

    #[test]
    fn confirmation_must_echo_service() {
        let mut client = scripted(&[Frame::new(
            service::CORE,
            control::REGISTER_MODULE,
            vec![service::HIDHOST],
        )]);
        let err = client.register_module(service::A2DP).unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedResponse(_)));
        assert!(!client.is_ready(service::A2DP));
    }

    #[test]
    fn registering_twice_sends_once() {
        let mut client = scripted(&[Frame::new(
            service::CORE,
            control::REGISTER_MODULE,
            vec![service::GATT],
        )]);
        client.register_module(service::GATT).unwrap();
        client.register_module(service::GATT).unwrap();
        assert_eq!(written(client), vec![0x00, 0x01, 0x01, 0x00, service::GATT]);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut client = scripted(&[
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::PAN]),
            Frame::new(service::CORE, control::UNREGISTER_MODULE, Vec::new()),
        ]);

        assert!(!client.unregister_module(service::PAN).unwrap());
        client.register_module(service::PAN).unwrap();
        assert!(client.unregister_module(service::PAN).unwrap());
        assert!(!client.unregister_module(service::PAN).unwrap());
        assert!(!client.is_ready(service::PAN));
    }

    #[test]
    fn unregister_tolerates_not_ready_status() {
        let mut client = scripted(&[
            Frame::new(service::CORE, control::REGISTER_MODULE, vec![service::PAN]),
            Frame::new(service::CORE, 0x00, vec![0x02]),
        ]);
        client.register_module(service::PAN).unwrap();
        assert!(!client.unregister_module(service::PAN).unwrap());
        assert!(!client.is_ready(service::PAN));
    }

    #[test]
    fn disconnect_while_waiting() {
        let mut client = scripted(&[]);
        let err = client.register_module(service::HEALTH).unwrap_err();
        assert!(matches!(err, ClientError::Disconnected(_)));
        assert!(client.pending().is_none());
    }

    #[test]
    fn event_opcode_cannot_be_requested() {
        let mut client = scripted(&[]);
        assert!(matches!(
            client.request(service::CORE, 0x81, &[]),
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[test]
    fn poll_event_routes_and_flags_stray_responses() {
        let mut client = scripted(&[
            Frame::new(
                service::BLUETOOTH,
                bluetooth::EV_ACL_STATE_CHANGED,
                vec![0, 1, 2, 3, 4, 5, 6, 0],
            ),
            Frame::new(service::BLUETOOTH, bluetooth::ENABLE, Vec::new()),
        ]);

        client.poll_event().unwrap();
        assert_eq!(client.sink().len(), 1);
        assert!(matches!(
            client.poll_event(),
            Err(ClientError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn custom_sink_receives_events() {
        let mut seen = Vec::new();
        {
            let mut client = HalClient::with_sink(
                FrameReader::new(Cursor::new(wire(&[Frame::new(
                    service::BLUETOOTH,
                    bluetooth::EV_ADAPTER_STATE_CHANGED,
                    vec![0x00],
                )]))),
                FrameWriter::new(Cursor::new(Vec::new())),
                |event: Event| seen.push(event.name()),
            );
            client.poll_event().unwrap();
        }
        assert_eq!(seen, vec!["adapter_state_changed"]);
    }

    #[test]
    fn request_times_out() {
        let (left, _right) = UnixStream::pair().unwrap();
        let mut client =
            HalClient::from_stream(HalStream::from_unix(left), Duration::from_millis(20))
                .unwrap();
        let err = client.register_module(service::AVRCP).unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        assert!(client.pending().is_none());
    }

    #[test]
    fn late_reply_after_timeout_does_not_shift_later_replies() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut client =
            HalClient::from_stream(HalStream::from_unix(left), Duration::from_millis(100))
                .unwrap();
        let mut service =
            ServiceEndpoint::from_stream(HalStream::from_unix(right), FrameConfig::default())
                .unwrap();
        let (timed_out_tx, timed_out_rx) = std::sync::mpsc::channel::<()>();

        let server = thread::spawn(move || {
            let register = service.recv_command().unwrap();
            service
                .respond(service::CORE, control::REGISTER_MODULE, &register.payload)
                .unwrap();

            let enable = service.recv_command().unwrap();
            assert_eq!(enable.opcode, bluetooth::ENABLE);
            timed_out_rx.recv().unwrap();
            service
                .respond(service::BLUETOOTH, bluetooth::ENABLE, &[])
                .unwrap();

            for expected in [bluetooth::START_DISCOVERY, bluetooth::CANCEL_DISCOVERY] {
                let command = service.recv_command().unwrap();
                assert_eq!(command.opcode, expected);
                service
                    .respond(service::BLUETOOTH, command.opcode, &[])
                    .unwrap();
            }
        });

        client.register_module(service::BLUETOOTH).unwrap();
        let err = client
            .request(service::BLUETOOTH, bluetooth::ENABLE, &[])
            .unwrap_err();
        assert!(matches!(err, ClientError::Timeout(_)));
        timed_out_tx.send(()).unwrap();

        client.set_request_timeout(Duration::from_secs(2));
        client
            .request(service::BLUETOOTH, bluetooth::START_DISCOVERY, &[])
            .unwrap();
        client
            .request(service::BLUETOOTH, bluetooth::CANCEL_DISCOVERY, &[])
            .unwrap();

        server.join().unwrap();
    }
}
