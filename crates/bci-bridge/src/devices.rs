//! Board driver registry

use bci_core::{BciError, BciResult, BoardConnector, BoardId, BoardSession, DeviceIdentity};
use bci_simulation::{SyntheticBoard, SyntheticConfig};

/// Opens sessions with whichever driver handles the requested board.
///
/// Only the synthetic board ships with a driver; hardware boards are known
/// by their layout but fail to open.
pub struct DeviceRegistry {
    synthetic: SyntheticBoard,
}

impl DeviceRegistry {
    pub fn new(synthetic: SyntheticConfig) -> Self {
        DeviceRegistry {
            synthetic: SyntheticBoard::new(synthetic),
        }
    }
}

impl BoardConnector for DeviceRegistry {
    fn open(&self, identity: &DeviceIdentity) -> BciResult<Box<dyn BoardSession>> {
        match identity.board {
            BoardId::Synthetic => self.synthetic.open(identity),
            other => Err(BciError::device(format!(
                "No driver available for {} on {}",
                other, identity.serial_port
            ))),
        }
    }
}
