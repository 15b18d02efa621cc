//! Outbound message sink collaborator

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::error::BciResult;

/// Destination of outbound messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkTarget {
    pub address: String,
    pub port: u16,
}

impl SinkTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Creates sinks for a target
pub trait SinkConnector: Send {
    fn connect(&self, target: &SinkTarget) -> BciResult<Box<dyn MessageSink>>;
}

/// Fire-and-forget message emitter.
///
/// One call is one datagram. No acknowledgement, no retry.
pub trait MessageSink: Send {
    fn send(&mut self, tag: &str, values: &[f64]) -> BciResult<()>;

    fn target(&self) -> &SinkTarget;
}
