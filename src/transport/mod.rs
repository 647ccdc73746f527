//! A blocking UDP client that speaks to a single BACnet/IP device: send a confirmed
//! request, detect segmentation in the reply, acknowledge each segment, and hand the
//! reassembled APDU to [`crate::service`].
//!
//! One [`BacnetIpTransport`] owns one socket connected to one device. The invoke_id this
//! client uses is always [`crate::app::INVOKE_ID`] (static `1`), which is only legal
//! because `in_flight` serializes confirmed requests so no second request can be in
//! flight to reuse it.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;
use std::time::Duration;

use bytes::BytesMut;

use crate::app::{
    encode_segment_ack, unwrap_bvlc_npdu, wrap_bvlc_npdu, ApduHeaderByte, ApduType, INVOKE_ID,
    MAX_APDU_LENGTH_ACCEPTED, MAX_DATAGRAM_LEN, MAX_SEGMENTS_ACCEPTED,
};
use crate::encoding::DecodeError;
use crate::error::ClientError;
use crate::service::{
    decode_read_property_multiple_ack, decode_simple_ack, encode_read_property_multiple, encode_write_property,
    DeviceState, PropertyDescriptor, PropertyValue, SERVICE_READ_PROPERTY_MULTIPLE, SERVICE_WRITE_PROPERTY,
};

/// Default per-step timeout used for both the initial reply and every subsequent segment.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection parameters for one device. `Default` supplies sensible numeric defaults;
/// `remote_addr` has no sensible default and must always be set explicitly.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub remote_addr: SocketAddr,
    pub bind_addr: SocketAddr,
    pub response_timeout: Duration,
    pub max_response_segments: u8,
    pub max_apdu_octets: u8,
}

impl ClientConfig {
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self { remote_addr, ..Self::default() }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            remote_addr: SocketAddr::from(([127, 0, 0, 1], crate::app::DEFAULT_BACNET_PORT)),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            max_response_segments: MAX_SEGMENTS_ACCEPTED,
            max_apdu_octets: MAX_APDU_LENGTH_ACCEPTED,
        }
    }
}

/// Hex-dump tracing of every sent/received datagram, gated on the `DEBUG` environment
/// variable. Read once at construction — the codec itself never consults the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer {
    enabled: bool,
}

impl Tracer {
    pub fn from_env() -> Self {
        let enabled = std::env::var_os("DEBUG").map(|v| !v.is_empty()).unwrap_or(false);
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    fn trace(&self, direction: &str, datagram: &[u8]) {
        if self.enabled {
            log::debug!("{direction} {} bytes: {}", datagram.len(), hex::encode(datagram));
        }
    }
}

/// A connected UDP endpoint for one device, implementing the `Idle -> Sent -> (Single |
/// Segmenting) -> Done` state machine of a confirmed request/reply exchange.
pub struct BacnetIpTransport {
    socket: UdpSocket,
    config: ClientConfig,
    tracer: Tracer,
    in_flight: Mutex<()>,
}

impl BacnetIpTransport {
    pub fn connect(config: ClientConfig, tracer: Tracer) -> Result<Self, ClientError> {
        let socket = UdpSocket::bind(config.bind_addr)?;
        socket.set_read_timeout(Some(config.response_timeout))?;
        socket.connect(config.remote_addr)?;
        Ok(Self { socket, config, tracer, in_flight: Mutex::new(()) })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Issue a ReadPropertyMultiple request for the given descriptors and decode the
    /// (possibly segmented) reply into a [`DeviceState`].
    pub fn read_property_multiple(&self, descriptors: &[PropertyDescriptor]) -> Result<DeviceState, ClientError> {
        let _guard = self.in_flight.lock().expect("transport mutex poisoned");
        let request = encode_read_property_multiple(descriptors)?;
        let reply = self.send_confirmed_request(&request, SERVICE_READ_PROPERTY_MULTIPLE)?;
        Ok(decode_read_property_multiple_ack(&reply)?)
    }

    /// Issue a WriteProperty request and wait for its SimpleAck.
    pub fn write_property(&self, descriptor: &PropertyDescriptor, value: &PropertyValue) -> Result<(), ClientError> {
        let _guard = self.in_flight.lock().expect("transport mutex poisoned");
        let request = encode_write_property(descriptor, value)?;
        let reply = self.send_confirmed_request(&request, SERVICE_WRITE_PROPERTY)?;
        match decode_simple_ack(&reply, INVOKE_ID, SERVICE_WRITE_PROPERTY) {
            Ok(()) => Ok(()),
            Err(DecodeError::UnexpectedInvokeId { expected, got }) => {
                Err(ClientError::UnexpectedInvokeId { expected, got })
            }
            Err(DecodeError::UnexpectedServiceChoice { expected, got }) => {
                Err(ClientError::UnexpectedServiceChoice { expected, got })
            }
            Err(other) => Err(ClientError::Decode(other)),
        }
    }

    /// Send one confirmed request, wait for the first reply, and either return its APDU
    /// directly (Single) or drive the segment-reassembly loop (Segmenting).
    fn send_confirmed_request(&self, apdu: &[u8], service_choice: u8) -> Result<Vec<u8>, ClientError> {
        let datagram = wrap_bvlc_npdu(apdu);
        self.tracer.trace("send", &datagram);
        self.socket.send(&datagram)?;

        let (first_apdu, header) = self.recv_apdu()?;

        match header.pdu_type {
            ApduType::ComplexAck if !header.is_segmented() => Ok(first_apdu),
            ApduType::ComplexAck if header.more_segments() => self.reassemble_segments(&first_apdu, service_choice),
            ApduType::SimpleAck => Ok(first_apdu),
            other => Err(ClientError::Decode(DecodeError::UnexpectedApduType {
                expected: ApduType::ComplexAck as u8,
                got: other as u8,
            })),
        }
    }

    /// Receive one datagram, strip BVLC/NPDU, and parse its APDU header byte.
    fn recv_apdu(&self) -> Result<(Vec<u8>, ApduHeaderByte), ClientError> {
        let mut buf = BytesMut::zeroed(MAX_DATAGRAM_LEN);
        let n = self.socket.recv(&mut buf).map_err(map_timeout)?;
        self.tracer.trace("recv", &buf[..n]);
        let apdu = unwrap_bvlc_npdu(&buf[..n])?;
        let header = ApduHeaderByte::parse(apdu[0])?;
        Ok((apdu.to_vec(), header))
    }

    /// Drive the segmented-reply loop: the first segmented APDU carries the service
    /// choice (`[flags][invoke_id][seq][window][service_choice][payload...]`); every
    /// subsequent one omits it. Ack each segment as it arrives; stop once `MORE_SEGMENTS`
    /// clears, then synthesize a single non-segmented COMPLEX_ACK for the decoder.
    fn reassemble_segments(&self, first_segment: &[u8], service_choice: u8) -> Result<Vec<u8>, ClientError> {
        if first_segment.len() < 5 {
            return Err(ClientError::Decode(DecodeError::UnexpectedEof));
        }
        let invoke_id = first_segment[1];
        if invoke_id != INVOKE_ID {
            return Err(ClientError::UnexpectedInvokeId { expected: INVOKE_ID, got: invoke_id });
        }
        let mut sequence_number = first_segment[2];
        let mut window_size = first_segment[3];
        let mut payload = first_segment[5..].to_vec();
        let mut header = ApduHeaderByte::parse(first_segment[0])?;

        self.send_segment_ack(invoke_id, sequence_number, window_size)?;

        while header.more_segments() {
            let (segment, next_header) = self.recv_apdu()?;
            if segment.len() < 4 {
                return Err(ClientError::Decode(DecodeError::UnexpectedEof));
            }
            if segment[1] != invoke_id {
                return Err(ClientError::UnexpectedInvokeId { expected: invoke_id, got: segment[1] });
            }
            sequence_number = segment[2];
            window_size = segment[3];
            payload.extend_from_slice(&segment[4..]);
            header = next_header;
            self.send_segment_ack(invoke_id, sequence_number, window_size)?;
        }

        let mut synthesized = Vec::with_capacity(3 + payload.len());
        synthesized.push((ApduType::ComplexAck as u8) << 4);
        synthesized.push(invoke_id);
        synthesized.push(service_choice);
        synthesized.extend_from_slice(&payload);
        Ok(synthesized)
    }

    fn send_segment_ack(&self, invoke_id: u8, sequence_number: u8, window_size: u8) -> Result<(), ClientError> {
        let ack_apdu = encode_segment_ack(invoke_id, sequence_number, window_size);
        let datagram = wrap_bvlc_npdu(&ack_apdu);
        self.tracer.trace("send", &datagram);
        self.socket.send(&datagram)?;
        Ok(())
    }
}

fn map_timeout(err: io::Error) -> ClientError {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ClientError::Timeout,
        _ => ClientError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{pdu_flags, wrap_bvlc_npdu as wrap};
    use crate::service::{ObjectType, PropertyDescriptor};
    use std::net::UdpSocket as StdUdpSocket;

    fn loopback_pair() -> (StdUdpSocket, SocketAddr) {
        let sock = StdUdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = sock.local_addr().unwrap();
        (sock, addr)
    }

    // S6: a two-segment reply; the client must ack both segments in order and present
    // the decoder with the concatenated payload.
    #[test]
    fn segmented_reply_is_reassembled_and_acked_in_order() {
        let (device_socket, device_addr) = loopback_pair();
        let config = ClientConfig::new(device_addr);
        let client = BacnetIpTransport::connect(config, Tracer::disabled()).unwrap();

        let descriptor = PropertyDescriptor::new(ObjectType::AnalogValue, 134);
        let request = encode_read_property_multiple(&[descriptor]).unwrap();

        let server = std::thread::spawn(move || {
            let mut buf = [0u8; 1497];
            let (n, client_addr) = device_socket.recv_from(&mut buf).unwrap();
            let _ = &buf[..n]; // the request itself isn't re-validated here

            // Segment 0: flags has MORE_SEGMENTS|SEGMENTED_REQUEST unset but this is a
            // reply, so only MORE_SEGMENTS applies; carries the service choice.
            let mut seg0 = vec![(ApduType::ComplexAck as u8) << 4 | pdu_flags::MORE_SEGMENTS, INVOKE_ID, 0, 16, SERVICE_READ_PROPERTY_MULTIPLE];
            seg0.extend_from_slice(&[0xAA, 0xBB]);
            device_socket.send_to(&wrap(&seg0), client_addr).unwrap();

            let mut ack_buf = [0u8; 64];
            let (n, _) = device_socket.recv_from(&mut ack_buf).unwrap();
            assert_eq!(ack_buf[n - 2], 0); // sequence_number acked

            let mut seg1 = vec![(ApduType::ComplexAck as u8) << 4, INVOKE_ID, 1, 16];
            seg1.extend_from_slice(&[0xCC, 0xDD]);
            device_socket.send_to(&wrap(&seg1), client_addr).unwrap();

            let (n, _) = device_socket.recv_from(&mut ack_buf).unwrap();
            assert_eq!(ack_buf[n - 2], 1);
        });

        let result = client.send_confirmed_request(&request, SERVICE_READ_PROPERTY_MULTIPLE).unwrap();
        server.join().unwrap();

        assert_eq!(result, vec![(ApduType::ComplexAck as u8) << 4, INVOKE_ID, SERVICE_READ_PROPERTY_MULTIPLE, 0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn config_default_matches_bacnet_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.response_timeout, Duration::from_secs(1));
        assert_eq!(config.max_response_segments, 4);
        assert_eq!(config.max_apdu_octets, 4);
    }
}
