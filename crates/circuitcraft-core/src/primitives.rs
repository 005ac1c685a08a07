//! # Primitives
//!
//! Compiled-in constants for the circuit engine.
//!
//! These are fixed at build time. Per-board choices (which slots act as
//! boundary slots, strict vs permissive updates) live in [`crate::BoardConfig`].

/// Default backward-value slot.
///
/// Backward movers read and write this slot by convention, and the
/// backward-terminal perches must have it set before solving.
pub const UP_SLOT: &str = "up";

/// Default forward-value slot.
///
/// Forward-initial perches must have it set before simulating.
pub const DOWN_SLOT: &str = "down";

/// Magic bytes for the CircuitCraft binary format header.
///
/// - File Header = Magic Bytes ("CIRC") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"CIRC";

/// Current serialization format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

/// Header length: magic + version byte.
pub const HEADER_LEN: usize = 5;

/// Maximum accepted postcard payload size (64 MB), header excluded.
///
/// Checked before decoding so that corrupted input cannot trigger huge
/// allocations.
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 64 * 1024 * 1024;

/// Maximum accepted size of a whole persisted file: header plus payload.
pub const MAX_PERSISTED_FILE_SIZE: usize = HEADER_LEN + MAX_PERSISTENCE_PAYLOAD_SIZE;
