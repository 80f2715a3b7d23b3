// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Request/response exchange with the embedded controller over a serial link

use std::{
    io::{Read, Write},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::debug;

use crate::{
    Error,
    frame::{self, Destination, MAX_PACKET_LEN, Reassembler, Response, SMBUS_HEADER_LEN},
};

/// Sends framed requests over a byte stream and reassembles the responses.
///
/// The port is shared between clones so that several readers can poll the
/// same controller; each exchange holds the port until its response is
/// complete. Read timeouts are the port's concern.
#[derive(Debug)]
pub struct SerialTransport<P> {
    port: Arc<Mutex<P>>,
}

impl<P> Clone for SerialTransport<P> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
        }
    }
}

impl<P: Read + Write> SerialTransport<P> {
    /// Wraps an open port
    pub fn new(port: P) -> Self {
        Self {
            port: Arc::new(Mutex::new(port)),
        }
    }

    /// Sends one request and waits for the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`] when the request does not fit in a packet or
    /// a response packet is malformed, and [`Error::Io`] when the port fails.
    pub fn transact(
        &self,
        dst: Destination,
        cmd_code: u16,
        payload: &[u8],
    ) -> Result<Response, Error> {
        let request = frame::encode_request(dst, cmd_code, payload)?;

        let mut port = self.port.lock().unwrap_or_else(PoisonError::into_inner);
        port.write_all(&request)?;
        port.flush()?;
        debug!("Sent {dst:?} request {cmd_code:#06x}");

        let mut reassembler = Reassembler::default();
        let mut packet = [0u8; SMBUS_HEADER_LEN + MAX_PACKET_LEN];
        loop {
            port.read_exact(&mut packet[..SMBUS_HEADER_LEN])?;
            let len = frame::packet_len(&packet[..SMBUS_HEADER_LEN])?;
            port.read_exact(&mut packet[SMBUS_HEADER_LEN..SMBUS_HEADER_LEN + len])?;

            if let Some(response) = reassembler.push(&packet[..SMBUS_HEADER_LEN + len])? {
                debug!(
                    "Received response {:#06x} with {} byte(s)",
                    response.cmd_code,
                    response.payload.len()
                );
                return Ok(response);
            }
        }
    }
}
