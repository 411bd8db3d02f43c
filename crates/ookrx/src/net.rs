//! Multicast transport for bursts
//!
//! A capture daemon publishes each burst as one UDP datagram to a
//! multicast group; any number of listeners may subscribe. One
//! datagram carries exactly one wire record.

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use std::time::Duration;

use log::warn;

use crate::burst::Burst;

// One wire record per datagram; this bounds the receive buffer
const MAX_DATAGRAM: usize = 65536;

/// Receives bursts from a multicast group
pub struct BurstListener {
    socket: UdpSocket,
    buf: Vec<u8>,
}

impl BurstListener {
    /// Join `group` on the interface with address `interface`
    pub fn bind(group: SocketAddrV4, interface: Ipv4Addr) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, group.port()))?;
        socket.join_multicast_v4(group.ip(), &interface)?;
        Ok(Self {
            socket,
            buf: vec![0u8; MAX_DATAGRAM],
        })
    }

    /// Bound receives so a caller can poll a shutdown flag
    ///
    /// With a poll interval set, [`poll()`](BurstListener::poll)
    /// returns `Ok(None)` when the interval elapses without a
    /// datagram.
    pub fn set_poll_interval(&self, interval: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(interval)
    }

    /// Receive the next burst
    ///
    /// Returns `Ok(None)` on a receive timeout or on a datagram that
    /// does not decode as a burst record; a bad packet from the
    /// network is logged and skipped, not fatal.
    pub fn poll(&mut self) -> io::Result<Option<Burst>> {
        match self.socket.recv(&mut self.buf) {
            Ok(received) => match Burst::decode_from(&self.buf[..received]) {
                Ok(burst) => Ok(Some(burst)),
                Err(err) => {
                    warn!("discarding undecodable datagram ({} bytes): {}", received, err);
                    Ok(None)
                }
            },
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Publishes bursts to a multicast group
pub struct BurstPublisher {
    socket: UdpSocket,
}

impl BurstPublisher {
    /// New publisher sending to `group` from the interface with
    /// address `interface`
    pub fn connect(group: SocketAddrV4, interface: Ipv4Addr) -> io::Result<Self> {
        let socket = UdpSocket::bind(SocketAddrV4::new(interface, 0))?;
        socket.connect(group)?;
        Ok(Self { socket })
    }

    /// Transmit one burst as a single datagram
    pub fn send(&self, burst: &Burst) -> io::Result<()> {
        let mut record = Vec::new();
        burst.encode_to(&mut record)?;

        let sent = self.socket.send(&record)?;
        if sent != record.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "truncated burst datagram",
            ));
        }
        Ok(())
    }
}
