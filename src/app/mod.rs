//! Wire framing: BVLC, NPDU, and the APDU header bytes that distinguish confirmed
//! requests, simple/complex acks, and segment acks.
//!
//! Every datagram on the wire is `BVLC || NPDU || APDU`. This module owns the first two
//! layers (fixed-size, no routing) and the small set of APDU header shapes this client
//! needs to recognise; the service-specific APDU bodies (ReadPropertyMultiple,
//! WriteProperty) live in [`crate::service`].

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::encoding::{DecodeError, DecodeResult};

/// BVLC `type` byte for all BACnet/IP messages.
pub const BVLC_TYPE: u8 = 0x81;
/// BVLC `function` byte for a directed (unicast) NPDU — the only function this client emits or accepts.
pub const BVLC_FUNCTION_UNICAST: u8 = 0x0A;
/// Size in bytes of the BVLC header.
pub const BVLC_HEADER_LEN: usize = 4;

/// Fixed NPDU header this client always emits: protocol version 1, "expecting reply",
/// no source/destination network fields.
pub const NPDU_VERSION: u8 = 0x01;
pub const NPDU_CONTROL_EXPECTING_REPLY: u8 = 0x04;
pub const NPDU_HEADER_LEN: usize = 2;

/// Default BACnet/IP UDP port (0xBAC0).
pub const DEFAULT_BACNET_PORT: u16 = 47808;

/// Largest BACnet/IP datagram this client will allocate a receive buffer for (the
/// standard's maximum BACnet/IP MPDU size).
pub const MAX_DATAGRAM_LEN: usize = 1497;

/// APDU PDU types, the high nibble of the first APDU byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

impl ApduType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ConfirmedRequest),
            1 => Some(Self::UnconfirmedRequest),
            2 => Some(Self::SimpleAck),
            3 => Some(Self::ComplexAck),
            4 => Some(Self::SegmentAck),
            5 => Some(Self::Error),
            6 => Some(Self::Reject),
            7 => Some(Self::Abort),
            _ => None,
        }
    }
}

/// PDU flag bits carried in the low nibble of a confirmed-request or complex-ack header.
pub mod pdu_flags {
    pub const SEGMENTED_RESPONSE_ACCEPTED: u8 = 0x02;
    pub const MORE_SEGMENTS: u8 = 0x04;
    pub const SEGMENTED_REQUEST: u8 = 0x08;
}

/// Static invoke ID used for every confirmed request this client sends. Legal only
/// because the client serializes confirmed requests per destination device (see
/// [`crate::transport`]).
pub const INVOKE_ID: u8 = 1;

/// `(max_segments << 4) | max_apdu`: accept up to 16 response segments of up to 1024
/// octets each.
pub const MAX_SEGMENTS_ACCEPTED: u8 = 4;
pub const MAX_APDU_LENGTH_ACCEPTED: u8 = 4;

/// Prepend a BVLC header and the fixed NPDU header to an already-encoded APDU.
pub fn wrap_bvlc_npdu(apdu: &[u8]) -> Vec<u8> {
    let total_len = BVLC_HEADER_LEN + NPDU_HEADER_LEN + apdu.len();
    let mut out = Vec::with_capacity(total_len);
    out.push(BVLC_TYPE);
    out.push(BVLC_FUNCTION_UNICAST);
    out.extend_from_slice(&(total_len as u16).to_be_bytes());
    out.push(NPDU_VERSION);
    out.push(NPDU_CONTROL_EXPECTING_REPLY);
    out.extend_from_slice(apdu);
    out
}

/// Validate and strip the BVLC+NPDU prefix from a received datagram, returning the APDU
/// slice that follows.
pub fn unwrap_bvlc_npdu(datagram: &[u8]) -> DecodeResult<&[u8]> {
    if datagram.len() < BVLC_HEADER_LEN + NPDU_HEADER_LEN {
        return Err(DecodeError::UnexpectedEof);
    }
    if datagram[0] != BVLC_TYPE || datagram[1] != BVLC_FUNCTION_UNICAST {
        return Err(DecodeError::ExpectedApplicationTag);
    }
    Ok(&datagram[BVLC_HEADER_LEN + NPDU_HEADER_LEN..])
}

/// Build the three-byte confirmed-request header plus service choice, ready to have the
/// service body appended.
pub fn confirmed_request_header(service_choice: u8) -> [u8; 4] {
    [
        (ApduType::ConfirmedRequest as u8) << 4 | pdu_flags::SEGMENTED_RESPONSE_ACCEPTED,
        (MAX_SEGMENTS_ACCEPTED << 4) | MAX_APDU_LENGTH_ACCEPTED,
        INVOKE_ID,
        service_choice,
    ]
}

/// Encode a SegmentAck APDU (no NAK variant is ever emitted by this client).
pub fn encode_segment_ack(invoke_id: u8, sequence_number: u8, window_size: u8) -> [u8; 4] {
    [(ApduType::SegmentAck as u8) << 4, invoke_id, sequence_number, window_size]
}

/// The first byte of any APDU: `(pdu_type:4, flags:4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApduHeaderByte {
    pub pdu_type: ApduType,
    pub flags: u8,
}

impl ApduHeaderByte {
    pub fn parse(byte: u8) -> DecodeResult<Self> {
        let pdu_type = ApduType::from_u8(byte >> 4).ok_or(DecodeError::ExpectedApplicationTag)?;
        Ok(Self { pdu_type, flags: byte & 0x0F })
    }

    pub fn more_segments(&self) -> bool {
        self.flags & pdu_flags::MORE_SEGMENTS != 0
    }

    pub fn is_segmented(&self) -> bool {
        self.flags & pdu_flags::SEGMENTED_REQUEST != 0 || self.more_segments()
    }
}
