//! Acquisition device collaborator
//!
//! The bridge never speaks a device protocol itself. Drivers implement these
//! two traits and the cycle driver only opens, starts, polls and stops.

use crate::board::{BoardId, DeviceIdentity};
use crate::error::BciResult;
use crate::sample_buffer::SampleBuffer;

/// Opens sessions for a device identity
pub trait BoardConnector: Send {
    /// Prepare a session. The returned session is not streaming yet.
    fn open(&self, identity: &DeviceIdentity) -> BciResult<Box<dyn BoardSession>>;
}

/// One open connection to an acquisition board
pub trait BoardSession: Send {
    /// Board this session talks to
    fn board(&self) -> BoardId;

    /// Begin streaming into the session's internal buffer
    fn start(&mut self) -> BciResult<()>;

    /// Latest `window` samples of every board row, without consuming them.
    ///
    /// Never blocks; returns an empty buffer when nothing has arrived yet
    /// and fewer samples than requested while the buffer is filling.
    fn poll(&mut self, window: usize) -> BciResult<SampleBuffer>;

    /// Stop streaming and release the device
    fn stop(&mut self) -> BciResult<()>;
}
