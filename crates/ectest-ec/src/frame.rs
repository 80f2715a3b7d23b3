// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! SMBus/MCTP/ODP framing of embedded controller requests and responses.
//!
//! A request is a single packet:
//!
//! ```text
//! SMBus  02 0F <len> 01           len counts every byte after the SMBus header
//! MCTP   01 <dst> 80 D3 7D
//! ODP    02 <dst>
//!        <cmd code, big endian u16> <payload>
//! ```
//!
//! A response may span several packets. The MCTP flags byte marks the first
//! (SOM) and last (EOM) packet of a message; only the SOM packet carries the
//! ODP header and command code.

use std::mem;

use thiserror::Error;
use tracing::trace;

/// Bytes before the SMBus length byte's payload
pub const SMBUS_HEADER_LEN: usize = 4;
const SMBUS_LEN_INDEX: usize = 2;
const MCTP_HEADER_LEN: usize = 5;
const MCTP_FLAGS_INDEX: usize = 7;
const ODP_HEADER_LEN: usize = 2;
const HEADER_LEN: usize = SMBUS_HEADER_LEN + MCTP_HEADER_LEN + ODP_HEADER_LEN;
const CMD_CODE_LEN: usize = 2;

/// Longest packet body, i.e. the largest value of the SMBus length byte
pub const MAX_PACKET_LEN: usize = 69;
/// Longest reassembled response payload
pub const MAX_MESSAGE_LEN: usize = 256;

const START_OF_MESSAGE: u8 = 0x80;
const END_OF_MESSAGE: u8 = 0x40;

/// Errors that could result from framing or reassembling packets
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The request does not fit in one packet
    #[error("Request of {0} bytes does not fit in a {MAX_PACKET_LEN} byte packet")]
    RequestTooLarge(usize),
    /// The SMBus length byte is outside the valid range
    #[error("Invalid MCTP packet length {0}")]
    InvalidLength(usize),
    /// Fewer bytes than the header announced
    #[error("Packet is {actual} bytes, expected {expected}")]
    Truncated {
        /// Bytes the header announced
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// A start packet too short to hold the ODP header and command code
    #[error("Start of message packet of length {0} has no command code")]
    MissingCommandCode(usize),
    /// A continuation packet arrived before any start packet
    #[error("Packet continues a message that was never started")]
    MissingStart,
    /// The reassembled payload grew past [`MAX_MESSAGE_LEN`]
    #[error("Response does not fit in {MAX_MESSAGE_LEN} bytes")]
    Overflow,
}

/// Embedded controller service a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Battery service
    Battery,
    /// Thermal and fan service
    Thermal,
    /// Time and alarm service
    TimeAlarm,
}

impl Destination {
    /// Endpoint address used in the MCTP and ODP headers
    #[must_use]
    pub const fn address(self) -> u8 {
        match self {
            Self::Battery => 0x08,
            Self::Thermal => 0x09,
            Self::TimeAlarm => 0x0B,
        }
    }
}

/// Builds the single packet carrying `cmd_code` and `payload` to `dst`.
///
/// # Errors
///
/// Returns [`FrameError::RequestTooLarge`] when the packet body would exceed
/// [`MAX_PACKET_LEN`].
pub fn encode_request(
    dst: Destination,
    cmd_code: u16,
    payload: &[u8],
) -> Result<Vec<u8>, FrameError> {
    let len = MCTP_HEADER_LEN + ODP_HEADER_LEN + CMD_CODE_LEN + payload.len();
    let len_byte = u8::try_from(len)
        .ok()
        .filter(|_| len <= MAX_PACKET_LEN)
        .ok_or(FrameError::RequestTooLarge(len))?;
    let address = dst.address();

    let mut packet = Vec::with_capacity(SMBUS_HEADER_LEN + len);
    packet.extend_from_slice(&[0x02, 0x0F, len_byte, 0x01]);
    packet.extend_from_slice(&[0x01, address, 0x80, 0xD3, 0x7D]);
    packet.extend_from_slice(&[1 << 1, address]);
    packet.extend_from_slice(&cmd_code.to_be_bytes());
    packet.extend_from_slice(payload);
    trace!("Encoded {dst:?} request {cmd_code:#06x}: {packet:02X?}");
    Ok(packet)
}

/// Reads the body length from an SMBus header, the number of bytes that
/// follow the first [`SMBUS_HEADER_LEN`].
///
/// # Errors
///
/// Returns [`FrameError::Truncated`] when `header` is shorter than an SMBus
/// header and [`FrameError::InvalidLength`] when the length cannot hold an
/// MCTP header or exceeds [`MAX_PACKET_LEN`].
pub fn packet_len(header: &[u8]) -> Result<usize, FrameError> {
    let len = header
        .get(SMBUS_LEN_INDEX)
        .filter(|_| header.len() >= SMBUS_HEADER_LEN)
        .map(|&len| usize::from(len))
        .ok_or(FrameError::Truncated {
            expected: SMBUS_HEADER_LEN,
            actual: header.len(),
        })?;
    if !(MCTP_HEADER_LEN..=MAX_PACKET_LEN).contains(&len) {
        return Err(FrameError::InvalidLength(len));
    }
    Ok(len)
}

/// A reassembled response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Command code from the start packet
    pub cmd_code: u16,
    /// Payload of every packet, in order
    pub payload: Vec<u8>,
}

/// Collects response packets until the end of a message.
#[derive(Debug, Default)]
pub struct Reassembler {
    cmd_code: Option<u16>,
    payload: Vec<u8>,
}

impl Reassembler {
    /// Adds one complete packet, SMBus header included. Returns the response
    /// once `packet` is flagged as the end of the message.
    ///
    /// A start packet discards anything collected before it. After an error
    /// the reassembler waits for the next start packet.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] when the packet length is invalid or does not
    /// match the header, a start packet has no command code, a continuation
    /// packet arrives first or the payload overflows.
    pub fn push(&mut self, packet: &[u8]) -> Result<Option<Response>, FrameError> {
        let result = self.accept(packet);
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn accept(&mut self, packet: &[u8]) -> Result<Option<Response>, FrameError> {
        let len = packet_len(packet)?;
        if packet.len() != SMBUS_HEADER_LEN + len {
            return Err(FrameError::Truncated {
                expected: SMBUS_HEADER_LEN + len,
                actual: packet.len(),
            });
        }

        let flags = packet[MCTP_FLAGS_INDEX];
        let data = if flags & START_OF_MESSAGE == 0 {
            if self.cmd_code.is_none() {
                return Err(FrameError::MissingStart);
            }
            &packet[SMBUS_HEADER_LEN + MCTP_HEADER_LEN..]
        } else {
            let Some(&[high, low]) = packet.get(HEADER_LEN..HEADER_LEN + CMD_CODE_LEN) else {
                return Err(FrameError::MissingCommandCode(len));
            };
            self.payload.clear();
            self.cmd_code = Some(u16::from_be_bytes([high, low]));
            &packet[HEADER_LEN + CMD_CODE_LEN..]
        };

        if self.payload.len() + data.len() > MAX_MESSAGE_LEN {
            return Err(FrameError::Overflow);
        }
        self.payload.extend_from_slice(data);
        trace!(
            "Accepted {} byte(s), flags {flags:#04x}, {} byte(s) so far",
            data.len(),
            self.payload.len()
        );

        if flags & END_OF_MESSAGE == 0 {
            return Ok(None);
        }
        Ok(self.cmd_code.take().map(|cmd_code| Response {
            cmd_code,
            payload: mem::take(&mut self.payload),
        }))
    }

    fn reset(&mut self) {
        self.cmd_code = None;
        self.payload.clear();
    }
}
