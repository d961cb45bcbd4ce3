//! Our error types for PMBus exchanges.

use thiserror::Error;

pub type Result<T, B> = core::result::Result<T, Error<B>>;

/// Custom error type for PMBus communications, generic over the bus adapter's
/// own error type.
///
/// Bus faults are never retried here: the underlying bus cannot reliably tell
/// transient from permanent failures, so the caller decides what to do.
#[derive(Error, Debug)]
pub enum Error<B: core::fmt::Debug> {
    /// The bus transaction itself failed.
    #[error("bus transaction failed: {0:?}")]
    Bus(B),
    /// Extended (0xFExx / 0xFFxx) commands need a two-byte command transfer,
    /// which this layer does not implement. A protocol limitation, not a bus fault.
    #[error("extended command {0:#06x} cannot use single-byte transfers")]
    ExtendedCommand(u16),
    /// The command code is outside the 8-bit standard command space.
    #[error("{0:#06x} is not a valid PMBus command code")]
    InvalidCommand(u16),
    /// The bus adapter implements none of the transfer strategies this
    /// operation could use.
    #[error("bus adapter lacks the transfers needed for this operation")]
    NotSupported,
    /// A process-call reply violated the expected wire layout.
    #[error("malformed process-call reply")]
    MalformedReply,
    /// Caller supplied a payload the protocol cannot carry (empty, or over 255 bytes).
    #[error("invalid block payload length {0}")]
    InvalidLength(usize),
}
