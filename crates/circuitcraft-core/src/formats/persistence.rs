//! # Persistence Format
//!
//! Binary serialization for circuit boards.
//!
//! Format: Header (5 bytes) + postcard-serialized [`SerializableBoard`].
//! - 4 bytes: Magic ("CIRC")
//! - 1 byte: Version
//!
//! ## Input validation
//!
//! Size limits and the header are checked before the payload is decoded, so
//! corrupted input fails cleanly instead of driving large allocations.

use super::SerializableBoard;
use crate::primitives::{FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES, MAX_PERSISTENCE_PAYLOAD_SIZE};
use crate::{CircuitBoard, CircuitError, CompFactory};
use std::path::Path;
use tracing::debug;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The persistence header precedes all board data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), CircuitError> {
        if &self.magic != MAGIC_BYTES {
            return Err(CircuitError::Serialization(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(CircuitError::Serialization(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let [m0, m1, m2, m3] = self.magic;
        [m0, m1, m2, m3, self.version]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CircuitError> {
        match bytes {
            [m0, m1, m2, m3, version, ..] => Ok(Self {
                magic: [*m0, *m1, *m2, *m3],
                version: *version,
            }),
            _ => Err(CircuitError::Serialization(
                "Header too short".to_string(),
            )),
        }
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a board to bytes (header + payload).
///
/// This is a pure transformation - no file I/O.
pub fn board_to_bytes(board: &CircuitBoard) -> Result<Vec<u8>, CircuitError> {
    let serializable = SerializableBoard::try_from(board)?;

    let payload = postcard::to_stdvec(&serializable)
        .map_err(|e| CircuitError::Serialization(e.to_string()))?;
    check_payload_size(payload.len())?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);

    Ok(result)
}

/// The limit applies to the payload only; the header is not counted.
fn check_payload_size(len: usize) -> Result<(), CircuitError> {
    if len > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(CircuitError::Serialization(format!(
            "Payload size {} bytes exceeds maximum allowed {} bytes",
            len, MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// Deserialize a board from bytes, rebuilding comps with `factory`.
///
/// This is a pure transformation - no file I/O.
pub fn board_from_bytes(
    bytes: &[u8],
    factory: Option<&dyn CompFactory>,
) -> Result<CircuitBoard, CircuitError> {
    if bytes.len() < HEADER_LEN {
        return Err(CircuitError::Serialization(format!(
            "Data too short: minimum {} bytes required",
            HEADER_LEN
        )));
    }

    let payload = bytes.get(HEADER_LEN..).unwrap_or_default();
    check_payload_size(payload.len())?;

    PersistenceHeader::from_bytes(bytes)?.validate()?;

    let serializable: SerializableBoard = postcard::from_bytes(payload).map_err(|e| {
        CircuitError::Serialization(format!("Failed to deserialize board data: {}", e))
    })?;

    serializable.into_board(factory)
}

impl CircuitBoard {
    /// Write the board to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CircuitError> {
        let path = path.as_ref();
        let bytes = board_to_bytes(self)?;
        std::fs::write(path, &bytes)
            .map_err(|e| CircuitError::Io(format!("{}: {}", path.display(), e)))?;
        debug!(board = %self.name(), path = %path.display(), bytes = bytes.len(), "board saved");
        Ok(())
    }

    /// Read a board from `path`, rebuilding comps with `factory`.
    pub fn load(
        path: impl AsRef<Path>,
        factory: Option<&dyn CompFactory>,
    ) -> Result<Self, CircuitError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| CircuitError::Io(format!("{}: {}", path.display(), e)))?;
        let board = board_from_bytes(&bytes, factory)?;
        debug!(board = %board.name(), path = %path.display(), "board loaded");
        Ok(board)
    }
}

// =============================================================================
// TESTS
// =============================================================================
