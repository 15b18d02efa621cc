//! BCI-Core: Foundation types for the EEG bridge
//!
//! Sample buffers, board descriptors, errors and the collaborator traits
//! implemented by device drivers and message sinks.

pub mod sample_buffer;
pub mod board;
pub mod device;
pub mod sink;
pub mod error;

pub use sample_buffer::*;
pub use board::*;
pub use device::{BoardConnector, BoardSession};
pub use sink::{MessageSink, SinkConnector, SinkTarget};
pub use error::{BciError, BciResult};
