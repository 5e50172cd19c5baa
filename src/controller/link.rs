// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! The wire connection to the controller.
//!
//! [`PlcLink`] is a thin blocking wrapper around a `TcpStream` speaking the
//! S7 ISO-on-TCP dialect: connection setup performs the COTP connection
//! request and the S7 communication setup exchange, after which
//! [`PlcLink::read_block`] issues one data-block read per call.
//!
//! Every socket operation runs under a bounded timeout. The link itself
//! never retries; a failed read is reported to the caller and the poll
//! cadence is the retry policy.

use std::{
    io::{Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use thiserror::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const IO_TIMEOUT: Duration = Duration::from_millis(500);

// TPKT frames are small; anything bigger than this is garbage.
const MAX_FRAME: usize = 1024;

#[derive(Debug, Error)]
pub(crate) enum LinkError {
    #[error("not connected to the controller")]
    NotConnected,

    #[error("controller i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("controller protocol error: {0}")]
    Protocol(&'static str),
}

/// An established controller connection.
pub(crate) struct PlcLink {
    stream: TcpStream,
    sequence: u16,
}

impl PlcLink {
    /// Connects to the controller and performs the protocol handshake.
    ///
    /// # Arguments
    ///
    /// * `host` - Controller host name or address.
    /// * `port` - ISO-on-TCP port, normally 102.
    /// * `rack` / `slot` - CPU position, encoded into the remote TSAP.
    pub(crate) fn connect(host: &str, port: u16, rack: u8, slot: u8) -> Result<Self, LinkError> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or(LinkError::Protocol("controller address does not resolve"))?;

        let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.set_nodelay(true)?;

        let mut link = Self {
            stream,
            sequence: 0,
        };
        link.negotiate(rack, slot)?;

        Ok(link)
    }

    /// Reads `len` raw bytes from offset `offset` of data block `db_number`.
    ///
    /// One request, one response; the payload is returned exactly as the
    /// controller sent it.
    pub(crate) fn read_block(
        &mut self,
        db_number: u16,
        offset: u16,
        len: u16,
    ) -> Result<Vec<u8>, LinkError> {
        self.sequence = self.sequence.wrapping_add(1);
        let bit_address = u32::from(offset) * 8;

        let request = [
            // TPKT, 31 bytes total
            0x03, 0x00, 0x00, 0x1f,
            // COTP data transfer
            0x02, 0xf0, 0x80,
            // S7 job header, sequence number, 14 parameter bytes
            0x32, 0x01, 0x00, 0x00,
            (self.sequence >> 8) as u8, self.sequence as u8,
            0x00, 0x0e, 0x00, 0x00,
            // Read-var, one item
            0x04, 0x01,
            // Item: byte access into a data block, bit-granular address
            0x12, 0x0a, 0x10, 0x02,
            (len >> 8) as u8, len as u8,
            (db_number >> 8) as u8, db_number as u8,
            0x84,
            (bit_address >> 16) as u8, (bit_address >> 8) as u8, bit_address as u8,
        ];

        self.stream.write_all(&request)?;
        let response = self.read_frame()?;

        if response.len() < 25 + len as usize {
            return Err(LinkError::Protocol("short read response"));
        }
        if response[7] != 0x32 || response[8] != 0x03 {
            return Err(LinkError::Protocol("unexpected response pdu"));
        }
        if response[17] != 0 || response[18] != 0 {
            return Err(LinkError::Protocol("controller rejected the read"));
        }
        if response[21] != 0xff {
            return Err(LinkError::Protocol("register read failed"));
        }

        Ok(response[25..25 + len as usize].to_vec())
    }

    // COTP connection request followed by S7 communication setup.
    fn negotiate(&mut self, rack: u8, slot: u8) -> Result<(), LinkError> {
        let local_tsap: u16 = 0x0100;
        let remote_tsap: u16 = 0x0100 | (u16::from(rack) * 0x20 + u16::from(slot));

        let connection_request = [
            // TPKT, 22 bytes total
            0x03, 0x00, 0x00, 0x16,
            // COTP connection request
            0x11, 0xe0, 0x00, 0x00, 0x00, 0x01, 0x00,
            // Preferred TPDU size 1024
            0xc0, 0x01, 0x0a,
            // Calling / called TSAPs
            0xc1, 0x02, (local_tsap >> 8) as u8, local_tsap as u8,
            0xc2, 0x02, (remote_tsap >> 8) as u8, remote_tsap as u8,
        ];

        self.stream.write_all(&connection_request)?;
        let response = self.read_frame()?;
        if response.len() < 6 || response[5] != 0xd0 {
            return Err(LinkError::Protocol("connection request rejected"));
        }

        let setup = [
            // TPKT, 25 bytes total
            0x03, 0x00, 0x00, 0x19,
            // COTP data transfer
            0x02, 0xf0, 0x80,
            // S7 job header, 8 parameter bytes
            0x32, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00,
            // Setup communication: one job/ack each way, PDU size 480
            0xf0, 0x00, 0x00, 0x01, 0x00, 0x01, 0x01, 0xe0,
        ];

        self.stream.write_all(&setup)?;
        let response = self.read_frame()?;
        if response.len() < 19 || response[7] != 0x32 || response[8] != 0x03 {
            return Err(LinkError::Protocol("communication setup rejected"));
        }
        if response[17] != 0 || response[18] != 0 {
            return Err(LinkError::Protocol("communication setup failed"));
        }

        Ok(())
    }

    // Reads one complete TPKT frame, header included.
    fn read_frame(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut header = [0u8; 4];
        self.stream.read_exact(&mut header)?;

        let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
        if length < 4 || length > MAX_FRAME {
            return Err(LinkError::Protocol("implausible frame length"));
        }

        let mut frame = vec![0u8; length];
        frame[..4].copy_from_slice(&header);
        self.stream.read_exact(&mut frame[4..])?;

        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    // Reads one TPKT frame off the fake PLC's socket.
    fn read_request(stream: &mut TcpStream) -> Vec<u8> {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).expect("request header");
        let length = usize::from(u16::from_be_bytes([header[2], header[3]]));
        let mut frame = vec![0u8; length];
        frame[..4].copy_from_slice(&header);
        stream.read_exact(&mut frame[4..]).expect("request body");
        frame
    }

    fn cotp_connection_confirm() -> Vec<u8> {
        vec![0x03, 0x00, 0x00, 0x0b, 0x06, 0xd0, 0x00, 0x01, 0x00, 0x01, 0x00]
    }

    fn setup_ack() -> Vec<u8> {
        vec![
            0x03, 0x00, 0x00, 0x1b,
            0x02, 0xf0, 0x80,
            0x32, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00,
            0xf0, 0x00, 0x00, 0x01, 0x00, 0x01, 0x01, 0xe0,
        ]
    }

    fn read_ack(register: [u8; 2]) -> Vec<u8> {
        vec![
            0x03, 0x00, 0x00, 0x1b,
            0x02, 0xf0, 0x80,
            0x32, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x02, 0x00, 0x06, 0x00, 0x00,
            0x04, 0x01,
            0xff, 0x04, 0x00, 0x10,
            register[0], register[1],
        ]
    }

    // Accepts one client, completes the handshake, then serves reads from a
    // fixed register value.
    fn spawn_fake_plc(register: [u8; 2], reads_to_serve: usize) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = read_request(&mut stream);
            stream.write_all(&cotp_connection_confirm()).expect("cc");
            let _ = read_request(&mut stream);
            stream.write_all(&setup_ack()).expect("setup ack");
            for _ in 0..reads_to_serve {
                let _ = read_request(&mut stream);
                stream.write_all(&read_ack(register)).expect("read ack");
            }
        });

        port
    }

    #[test]
    fn read_block_returns_the_register_bytes() {
        let port = spawn_fake_plc([1, 7], 1);
        let mut link = PlcLink::connect("127.0.0.1", port, 0, 1).expect("connect");

        let bytes = link.read_block(1, 0, 2).expect("read");

        assert_eq!(bytes, vec![1, 7]);
    }

    #[test]
    fn repeated_reads_reuse_the_connection() {
        let port = spawn_fake_plc([0, 3], 3);
        let mut link = PlcLink::connect("127.0.0.1", port, 0, 1).expect("connect");

        for _ in 0..3 {
            assert_eq!(link.read_block(1, 0, 2).expect("read"), vec![0, 3]);
        }
    }

    #[test]
    fn a_read_fails_when_the_controller_goes_away() {
        let port = spawn_fake_plc([1, 7], 0);
        let mut link = PlcLink::connect("127.0.0.1", port, 0, 1).expect("connect");

        // The fake hangs up after the handshake; the read must fail, not
        // hang.
        let started = Instant::now();
        assert!(link.read_block(1, 0, 2).is_err());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn a_stalled_controller_read_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = read_request(&mut stream);
            stream.write_all(&cotp_connection_confirm()).expect("cc");
            let _ = read_request(&mut stream);
            stream.write_all(&setup_ack()).expect("setup ack");
            // Swallow the read request and stall without answering.
            let _ = read_request(&mut stream);
            thread::sleep(Duration::from_secs(3));
        });

        let mut link = PlcLink::connect("127.0.0.1", port, 0, 1).expect("connect");

        let started = Instant::now();
        assert!(matches!(link.read_block(1, 0, 2), Err(LinkError::Io(_))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn a_non_cotp_handshake_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("addr").port();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let _ = read_request(&mut stream);
            // A well-formed TPKT frame that is not a connection confirm.
            stream
                .write_all(&[0x03, 0x00, 0x00, 0x07, 0x02, 0xf0, 0x80])
                .expect("junk");
        });

        assert!(matches!(
            PlcLink::connect("127.0.0.1", port, 0, 1),
            Err(LinkError::Protocol(_))
        ));
    }
}
