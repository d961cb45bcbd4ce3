//! The bus adapter seam.
//!
//! Everything in this crate talks to the device through [`SmbusBus`], which models
//! the transaction primitives an SMBus-capable adapter exposes (on Linux these map
//! onto the `i2c-dev` ioctls). Adapters rarely implement all of them, so the trait
//! also reports a [`Functionality`] mask; the transport layer picks a strategy per
//! call from that mask.

use modular_bitfield::prelude::*;

/// Which transfers (and options) the bus adapter actually implements.
///
/// `read_block`/`write_block` and `block_proc_call` are the commonly missing ones;
/// when absent the transport falls back to raw `i2c` message exchanges, so an
/// adapter advertising only `i2c` is still usable.
#[bitfield]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Functionality {
    pub quick: bool,
    pub byte: bool,
    pub byte_data: bool,
    pub word_data: bool,
    pub proc_call: bool,
    pub read_block: bool,
    pub write_block: bool,
    pub block_proc_call: bool,
    pub i2c: bool,
    pub pec: bool,
    #[skip]
    __: B6,
}

/// One SMBus-capable bus handle, already attached to a single device address.
///
/// All methods are blocking: each performs exactly one bus transaction and returns
/// only once it has completed or failed. The adapter is expected to enforce its own
/// transaction timeout; none is applied here. Word values are host order in both
/// directions, the adapter handles any wire byte-swapping.
pub trait SmbusBus {
    type Error: core::fmt::Debug;

    /// The transfer support mask for this adapter.
    fn functionality(&self) -> Functionality;

    /// Zero-data presence check. PMBus forbids the read-direction variant (it
    /// would begin a transaction with the read bit set), so only write-quick
    /// is modeled.
    fn quick_write(&mut self) -> Result<(), Self::Error>;

    /// Send a lone command byte with no payload ("send byte").
    fn send_byte(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Read one data byte for a command.
    fn read_byte_data(&mut self, command: u8) -> Result<u8, Self::Error>;

    /// Write one data byte for a command.
    fn write_byte_data(&mut self, command: u8, value: u8) -> Result<(), Self::Error>;

    /// Read a 16-bit word for a command.
    fn read_word_data(&mut self, command: u8) -> Result<u16, Self::Error>;

    /// Write a 16-bit word for a command.
    fn write_word_data(&mut self, command: u8, value: u16) -> Result<(), Self::Error>;

    /// SMBus block read: the adapter consumes the length prefix and returns just
    /// the payload (at most 32 bytes, the SMBus transaction ceiling).
    fn read_block_data(&mut self, command: u8) -> Result<Vec<u8>, Self::Error>;

    /// SMBus block write of up to 32 payload bytes.
    fn write_block_data(&mut self, command: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Word process call: write a word, read a word back, as one transaction.
    fn proc_call(&mut self, command: u8, value: u16) -> Result<u16, Self::Error>;

    /// Block process call: write a block, read a block back, as one transaction.
    /// Length prefixes are handled by the adapter on both sides.
    fn block_proc_call(&mut self, command: u8, write: &[u8]) -> Result<Vec<u8>, Self::Error>;

    /// Raw two-message exchange: write `write`, then fill `read`, with no bus
    /// release in between. This is the fallback for everything the adapter's
    /// SMBus engine cannot do.
    fn i2c_transfer(&mut self, write: &[u8], read: &mut [u8]) -> Result<(), Self::Error>;

    /// Raw single write message.
    fn i2c_write(&mut self, write: &[u8]) -> Result<(), Self::Error>;

    /// Enable or disable per-transaction packet error checking.
    fn set_pec(&mut self, enable: bool) -> Result<(), Self::Error>;
}
