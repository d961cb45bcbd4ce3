//! This crate provides a protocol engine for interrogating PMBus power-management
//! devices over SMBus/I2C.
//!
//! PMBus layers a standard command set on top of SMBus bus transactions. A PMBus 1.1
//! device can advertise, per command, whether it implements that command and in which
//! numeric format its values travel. This crate knows the full command table from the
//! specification and can:
//!
//! * discover which commands a device supports (the QUERY process call),
//! * fetch the per-command DIRECT-format coefficients where the device supplies them,
//! * decode raw register words into engineering units (LINEAR11, DIRECT and
//!   VOUT-mode encodings),
//! * degrade gracefully between the SMBus block primitives and raw I2C message
//!   exchanges, depending on what the bus adapter actually implements.
//!
//! It works against anything that implements [`bus::SmbusBus`], so the same code runs
//! over a Linux `i2c-dev` handle, a bit-banged adapter, or the in-crate mock used by
//! the tests. Command-line handling and report formatting are left to callers; this
//! crate only speaks the protocol.
//!
//! Discovery results live for the lifetime of one [`device::PmbusDevice`] session and
//! are never persisted. One session maps to exactly one bus handle and one device
//! address; transactions are synchronous and never overlap.

pub mod bus;
pub mod command;
pub mod device;
pub mod error;
pub mod format;

#[cfg(test)]
mod mock_bus;
