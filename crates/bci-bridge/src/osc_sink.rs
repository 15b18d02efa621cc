//! OSC over UDP message sink
//!
//! One datagram per message, each value encoded as a 32-bit OSC float.
//! The socket is non-blocking; datagrams the kernel will not take right
//! away are dropped and counted.

use bci_core::{BciError, BciResult, MessageSink, SinkConnector, SinkTarget};
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use tracing::trace;

/// Creates [`OscSink`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct OscConnector;

impl SinkConnector for OscConnector {
    fn connect(&self, target: &SinkTarget) -> BciResult<Box<dyn MessageSink>> {
        Ok(Box::new(OscSink::connect(target)?))
    }
}

pub struct OscSink {
    socket: UdpSocket,
    destination: SocketAddr,
    target: SinkTarget,
    sent: u64,
    dropped: u64,
}

impl OscSink {
    pub fn connect(target: &SinkTarget) -> BciResult<Self> {
        let destination = (target.address.as_str(), target.port)
            .to_socket_addrs()
            .map_err(|e| BciError::sink(format!("Cannot resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| BciError::sink(format!("No address found for {}", target)))?;

        let local = if destination.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(local)
            .map_err(|e| BciError::sink(format!("Failed to bind UDP socket: {}", e)))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| BciError::sink(format!("Failed to make socket non-blocking: {}", e)))?;

        Ok(OscSink {
            socket,
            destination,
            target: target.clone(),
            sent: 0,
            dropped: 0,
        })
    }

    /// Datagrams handed to the kernel
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Datagrams discarded because the socket was not ready
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn encode(tag: &str, values: &[f64]) -> BciResult<Vec<u8>> {
        let packet = OscPacket::Message(OscMessage {
            addr: tag.to_string(),
            args: values.iter().map(|&v| OscType::Float(v as f32)).collect(),
        });

        encoder::encode(&packet)
            .map_err(|e| BciError::processing(format!("Failed to encode OSC message: {:?}", e)))
    }
}

impl MessageSink for OscSink {
    fn send(&mut self, tag: &str, values: &[f64]) -> BciResult<()> {
        let datagram = Self::encode(tag, values)?;

        match self.socket.send_to(&datagram, self.destination) {
            Ok(_) => {
                self.sent += 1;
                Ok(())
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::ConnectionRefused) => {
                self.dropped += 1;
                trace!(dropped = self.dropped, "OSC datagram dropped: {}", e);
                Ok(())
            }
            // The socket stays usable, so this is not a connection failure
            Err(e) => Err(BciError::processing(format!(
                "Failed to send to {}: {}",
                self.target, e
            ))),
        }
    }

    fn target(&self) -> &SinkTarget {
        &self.target
    }
}
