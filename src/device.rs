//! One PMBus device session: the transport strategies and the per-command
//! capability probe.
//!
//! [`PmbusDevice`] owns the bus handle and a 256-slot discovery table. The
//! specification metadata stays in the shared, immutable [`crate::command`]
//! registry; everything learned from the device at runtime (QUERY bytes,
//! DIRECT coefficients, the VOUT_MODE byte) lives here, so several sessions can
//! coexist without stepping on each other.

use log::{debug, warn};
use modular_bitfield::prelude::*;

use crate::{
    bus::{Functionality, SmbusBus},
    command::{self, Unit},
    error::{Error, Result},
    format::{
        Coefficients, Direction, ValueFormat, decode_direct, decode_linear11, decode_vout,
        vout_mode_is_linear,
    },
};

/// Payload ceiling of a single SMBus block transaction.
pub const SMBUS_BLOCK_MAX: usize = 32;

/// A QUERY response byte, as the device sends it.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct QueryResponse {
    #[skip]
    __: B2,
    /// Numeric format selector, see [`ValueFormat`].
    pub format: B3,
    /// Command is readable.
    pub read: bool,
    /// Command is writable.
    pub write: bool,
    /// Command is implemented at all.
    pub supported: bool,
}

/// The CAPABILITY register byte.
#[bitfield]
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    #[skip]
    __: B4,
    /// SMBALERT# is wired up.
    pub alert: bool,
    /// Bus speed class: 0 = 100 kHz, 1 = 400 kHz.
    pub speed: B2,
    /// Packet error checking is supported.
    pub pec: bool,
}

/// What discovery has concluded about one command so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Supported,
    Unsupported,
    /// Discovery could not tell: the command is on an extended page, the device
    /// cannot QUERY, or the command was never probed. Callers should attempt
    /// the operation anyway and downgrade a failure to a silent skip.
    Unknown,
}

/// Everything a successful QUERY taught us about one command.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandCapability {
    /// The raw QUERY response byte.
    pub query: u8,
    /// DIRECT coefficient triples, write direction at index 0, read at index 1.
    pub coefficients: [Coefficients; 2],
}

impl CommandCapability {
    pub fn response(&self) -> QueryResponse {
        QueryResponse::from_bytes([self.query])
    }

    pub fn format(&self) -> Option<ValueFormat> {
        ValueFormat::from_query(self.response().format())
    }

    pub fn coefficients_for(&self, direction: Direction) -> &Coefficients {
        &self.coefficients[direction as usize]
    }
}

/// Discovery state of one command slot.
#[derive(Debug, Clone, Copy, Default)]
enum CommandState {
    #[default]
    Unknown,
    Unsupported,
    Supported(CommandCapability),
}

/// Result of a block read. A reply longer than the caller's buffer is not an
/// error: the bytes that fit are delivered and `truncated` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReply {
    /// Bytes actually copied into the caller's buffer.
    pub len: usize,
    /// The device declared more bytes than the buffer could hold.
    pub truncated: bool,
}

/// One PMBus device on one bus handle. Single-threaded and synchronous: every
/// method blocks for exactly the bus transactions it issues.
pub struct PmbusDevice<B: SmbusBus> {
    bus: B,
    funcs: Functionality,
    address: u8,
    pec: bool,
    /// Set once a QUERY exchange itself fails; PMBus 1.0 devices lack the
    /// command entirely, so asking again is pointless for the whole session.
    query_broken: bool,
    revision: Option<u8>,
    capability: Option<u8>,
    /// The device-wide VOUT_MODE byte. Only set by an actual successful read;
    /// a fabricated default would silently mis-scale every VOUT word.
    vout_mode: Option<u8>,
    states: [CommandState; 256],
}

impl<B: SmbusBus> PmbusDevice<B> {
    /// Create a session for the device at `address`. The adapter's transfer
    /// support mask is captured once, here.
    pub fn new(bus: B, address: u8) -> Self {
        let funcs = bus.functionality();
        Self {
            bus,
            funcs,
            address,
            pec: false,
            query_broken: false,
            revision: None,
            capability: None,
            vout_mode: None,
            states: [CommandState::Unknown; 256],
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn functionality(&self) -> Functionality {
        self.funcs
    }

    /// Whether per-transaction error checking was negotiated by [`Self::scan`].
    pub fn pec_enabled(&self) -> bool {
        self.pec
    }

    /// Whether a failed QUERY exchange has disabled discovery for the session.
    pub fn discovery_disabled(&self) -> bool {
        self.query_broken
    }

    /// PMBUS_REVISION byte, if [`Self::scan`] could read one.
    pub fn revision(&self) -> Option<u8> {
        self.revision
    }

    /// CAPABILITY byte, if [`Self::scan`] could read one.
    pub fn capability(&self) -> Option<Capability> {
        self.capability.map(|byte| Capability::from_bytes([byte]))
    }

    /// What discovery recorded for a command, once it has been probed as supported.
    pub fn command_capability(&self, code: u16) -> Option<&CommandCapability> {
        if code as usize >= self.states.len() {
            return None;
        }
        match &self.states[code as usize] {
            CommandState::Supported(capability) => Some(capability),
            _ => None,
        }
    }

    /// The device-wide VOUT_MODE byte, if discovery has fetched it. `None`
    /// until a read of the mode register has actually succeeded.
    pub fn vout_mode(&self) -> Option<u8> {
        self.vout_mode
    }

    fn standard_code(code: u16) -> Result<u8, B::Error> {
        if command::is_extended(code) {
            // Needs a two-byte command transfer, which PMBus 1.1 does not
            // specify for these operations.
            return Err(Error::ExtendedCommand(code));
        }
        if !command::is_standard(code) {
            return Err(Error::InvalidCommand(code));
        }
        Ok(code as u8)
    }

    /// Zero-data presence check. PMBus only permits the write-direction form.
    pub fn quick(&mut self) -> Result<(), B::Error> {
        self.bus.quick_write().map_err(Error::Bus)
    }

    /// Issue a command with no payload ("send byte").
    pub fn send_byte(&mut self, code: u16) -> Result<(), B::Error> {
        let code = Self::standard_code(code)?;
        self.bus.send_byte(code).map_err(Error::Bus)
    }

    pub fn read_byte(&mut self, code: u16) -> Result<u8, B::Error> {
        let code = Self::standard_code(code)?;
        self.bus.read_byte_data(code).map_err(Error::Bus)
    }

    pub fn write_byte(&mut self, code: u16, value: u8) -> Result<(), B::Error> {
        let code = Self::standard_code(code)?;
        self.bus.write_byte_data(code, value).map_err(Error::Bus)
    }

    pub fn read_word(&mut self, code: u16) -> Result<u16, B::Error> {
        let code = Self::standard_code(code)?;
        self.bus.read_word_data(code).map_err(Error::Bus)
    }

    pub fn write_word(&mut self, code: u16, value: u16) -> Result<(), B::Error> {
        let code = Self::standard_code(code)?;
        self.bus.write_word_data(code, value).map_err(Error::Bus)
    }

    /// Read a length-prefixed block into `buf`.
    ///
    /// The declared length is learned first with a plain byte read of the same
    /// command, so a block bigger than the SMBus transaction ceiling never
    /// traverses the adapter's fault path. That partial read would trip PEC,
    /// so checking is paused around it. Depending on the declared length and
    /// the adapter's support mask this then uses either the SMBus block
    /// primitive or a raw write-then-read exchange; both deliver the same
    /// [`BlockReply`] shape.
    pub fn read_block(&mut self, code: u16, buf: &mut [u8]) -> Result<BlockReply, B::Error> {
        if buf.is_empty() {
            return Err(Error::InvalidLength(0));
        }
        let code = Self::standard_code(code)?;

        if self.pec {
            self.bus.set_pec(false).map_err(Error::Bus)?;
        }
        let declared = self.bus.read_byte_data(code);
        if self.pec {
            self.bus.set_pec(true).map_err(Error::Bus)?;
        }
        let declared = declared.map_err(Error::Bus)? as usize;

        if declared <= SMBUS_BLOCK_MAX && self.funcs.read_block() {
            let data = self.bus.read_block_data(code).map_err(Error::Bus)?;
            return Ok(Self::fill(&data, buf));
        }

        if !self.funcs.i2c() {
            return Err(Error::NotSupported);
        }
        debug!("block read {code:#04x}: raw exchange, {declared} declared bytes");
        let mut raw = vec![0u8; declared + 1];
        self.bus.i2c_transfer(&[code], &mut raw).map_err(Error::Bus)?;
        // The length inside the transaction is authoritative, but we only
        // asked for `declared` payload bytes.
        let announced = raw[0] as usize;
        let reply = Self::fill(&raw[1..1 + announced.min(declared)], buf);
        Ok(BlockReply {
            truncated: reply.truncated || announced > buf.len(),
            ..reply
        })
    }

    fn fill(data: &[u8], buf: &mut [u8]) -> BlockReply {
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        BlockReply {
            len,
            truncated: data.len() > buf.len(),
        }
    }

    /// Write a length-prefixed block of 1..=255 bytes.
    pub fn write_block(&mut self, code: u16, data: &[u8]) -> Result<(), B::Error> {
        if data.is_empty() || data.len() > 255 {
            return Err(Error::InvalidLength(data.len()));
        }
        let code = Self::standard_code(code)?;

        if data.len() <= SMBUS_BLOCK_MAX && self.funcs.write_block() {
            return self.bus.write_block_data(code, data).map_err(Error::Bus);
        }

        if !self.funcs.i2c() {
            return Err(Error::NotSupported);
        }
        debug!("block write {code:#04x}: raw message, {} bytes", data.len());
        let mut message = Vec::with_capacity(data.len() + 2);
        message.push(code);
        message.push(data.len() as u8);
        message.extend_from_slice(data);
        self.bus.i2c_write(&message).map_err(Error::Bus)
    }

    /// Ask the device whether it implements `target`, returning the raw QUERY
    /// response byte.
    ///
    /// QUERY is specified as a block process call, which few adapters
    /// implement; the word process call carries the same payload and is
    /// used instead. The reply must echo the one-byte count in its low byte.
    pub fn query_process_call(&mut self, target: u16) -> Result<u8, B::Error> {
        let target = Self::standard_code(target)?;
        let request = ((target as u16) << 8) | 1;
        let reply = self
            .bus
            .proc_call(command::QUERY as u8, request)
            .map_err(Error::Bus)?;
        if reply & 0x00ff != 1 {
            return Err(Error::MalformedReply);
        }
        Ok((reply >> 8) as u8)
    }

    /// Fetch the DIRECT coefficient triple for `target` in one direction.
    ///
    /// Prefers the atomic block process call; falls back to a raw exchange
    /// with the identical wire layout (4-byte request, 6-byte reply:
    /// length, m, b, R) when the adapter lacks it.
    pub fn coefficients_process_call(
        &mut self,
        target: u16,
        direction: Direction,
    ) -> Result<Coefficients, B::Error> {
        let target = Self::standard_code(target)?;
        let request = [2u8, target, direction as u8];

        let reply: Vec<u8> = if self.funcs.block_proc_call() {
            self.bus
                .block_proc_call(command::COEFFICIENTS as u8, &request)
                .map_err(Error::Bus)?
        } else if self.funcs.i2c() {
            debug!("coefficients for {target:#04x}: raw exchange");
            let message = [command::COEFFICIENTS as u8, request[0], request[1], request[2]];
            let mut wire = [0u8; 6];
            self.bus.i2c_transfer(&message, &mut wire).map_err(Error::Bus)?;
            if wire[0] != 5 {
                return Err(Error::MalformedReply);
            }
            wire[1..6].to_vec()
        } else {
            return Err(Error::NotSupported);
        };

        if reply.len() != 5 {
            return Err(Error::MalformedReply);
        }
        Ok(Coefficients {
            m: i16::from_le_bytes([reply[0], reply[1]]),
            b: i16::from_le_bytes([reply[2], reply[3]]),
            r: reply[4] as i8,
            valid: true,
        })
    }

    /// Run discovery for one command and record the outcome.
    fn probe(&mut self, code: u16) {
        let byte = match self.query_process_call(code) {
            Ok(byte) => byte,
            Err(err) => {
                // A device that cannot answer QUERY at all is pre-1.1 or
                // non-conformant; stop asking for the rest of the session.
                warn!(
                    "device {:#04x}: QUERY failed ({err}), discovery disabled",
                    self.address
                );
                self.query_broken = true;
                return;
            }
        };

        let response = QueryResponse::from_bytes([byte]);
        if !response.supported() {
            self.states[code as usize] = CommandState::Unsupported;
            return;
        }

        let mut capability = CommandCapability {
            query: byte,
            ..Default::default()
        };

        // DIRECT-format values are useless without coefficients, so fetch them
        // for whichever directions the device advertises.
        if response.format() == ValueFormat::Direct as u8
            && command::lookup(command::COEFFICIENTS).is_some()
        {
            if response.read() {
                if let Ok(triple) = self.coefficients_process_call(code, Direction::Read) {
                    capability.coefficients[Direction::Read as usize] = triple;
                }
            }
            if response.write() {
                if let Ok(triple) = self.coefficients_process_call(code, Direction::Write) {
                    capability.coefficients[Direction::Write as usize] = triple;
                }
            }
        }

        if code == command::VOUT_MODE {
            // VOUT_MODE's scale is device-wide (at least per page), not
            // per-command: it arrives as a plain byte, kept on the session.
            // A failed read leaves the mode unknown; exponent 0 is a valid
            // scale, so it must never stand in for a missing byte.
            match self.read_byte(code) {
                Ok(mode) => self.vout_mode = Some(mode),
                Err(err) => debug!("VOUT_MODE read failed ({err}); no VOUT scale"),
            }
        }

        self.states[code as usize] = CommandState::Supported(capability);
    }

    /// Whether the device supports a command, probing it lazily on the first
    /// ask and memoizing the answer for the session.
    pub fn check_support(&mut self, code: u16) -> Support {
        // Extended-page commands can be addressed but not individually
        // queried, even though their 8-bit prefixes can.
        if !command::is_standard(code) {
            return Support::Unknown;
        }
        if self.query_broken {
            return Support::Unknown;
        }
        if matches!(
            self.states[command::QUERY as usize],
            CommandState::Unsupported
        ) {
            return Support::Unknown;
        }

        if matches!(self.states[code as usize], CommandState::Unknown)
            && command::lookup(code).is_some()
        {
            self.probe(code);
        }

        match self.states[code as usize] {
            CommandState::Supported(_) => Support::Supported,
            CommandState::Unsupported => Support::Unsupported,
            CommandState::Unknown => Support::Unknown,
        }
    }

    /// Probe every command in the registry, in specification order.
    pub fn discover(&mut self) {
        for descriptor in command::all() {
            if self.query_broken {
                break;
            }
            self.check_support(descriptor.code);
        }
    }

    /// Initial device scan: presence check, QUERY self-probe, CAPABILITY byte
    /// (negotiating PEC when advertised and requested), PMBUS_REVISION byte.
    ///
    /// Everything past the presence check is best-effort; a PMBus 1.1 device
    /// only has to implement one non-manufacturer command, so most of this can
    /// legitimately be absent.
    pub fn scan(&mut self, enable_pec: bool) -> Result<(), B::Error> {
        if self.funcs.quick() {
            self.quick()?;
        }

        self.check_support(command::QUERY);

        if self.check_support(command::CAPABILITY) != Support::Unsupported {
            match self.read_byte(command::CAPABILITY) {
                Ok(byte) => {
                    self.capability = Some(byte);
                    let capability = Capability::from_bytes([byte]);
                    if capability.pec() && enable_pec && self.funcs.pec() {
                        if self.bus.set_pec(true).is_ok() {
                            self.pec = true;
                        } else {
                            warn!("device {:#04x}: couldn't enable PEC", self.address);
                        }
                    }
                }
                Err(_) => debug!("no CAPABILITY support; assuming no PEC"),
            }
        }

        if self.check_support(command::PMBUS_REVISION) != Support::Unsupported {
            if let Ok(revision) = self.read_byte(command::PMBUS_REVISION) {
                self.revision = Some(revision);
            }
        }

        Ok(())
    }

    /// Clear all fault and warning status. Skipped when the device is known
    /// not to implement it; attempted best-effort when support is unknown.
    pub fn clear_faults(&mut self) -> Result<(), B::Error> {
        match self.check_support(command::CLEAR_FAULTS) {
            Support::Unsupported => Ok(()),
            Support::Supported => self.send_byte(command::CLEAR_FAULTS),
            Support::Unknown => {
                let _ = self.send_byte(command::CLEAR_FAULTS);
                Ok(())
            }
        }
    }

    /// Read one of the variable-length inventory strings (MFR_ID and friends).
    ///
    /// Non-queryable devices are still worth asking: it's harmless and these
    /// strings are the first handle on what the part actually is. Failures
    /// come back as `None`, never as an error.
    pub fn read_text(&mut self, code: u16) -> Option<String> {
        if self.check_support(code) == Support::Unsupported {
            return None;
        }
        let mut buf = [0u8; 255];
        match self.read_block(code, &mut buf) {
            Ok(reply) => {
                let text = String::from_utf8_lossy(&buf[..reply.len])
                    .trim_end_matches('\0')
                    .to_string();
                (!text.is_empty()).then_some(text)
            }
            Err(_) => None,
        }
    }

    /// Decode a raw word from `code` into its physical value, picking the
    /// encoding family discovery recorded for it.
    ///
    /// Output-voltage commands use the shared VOUT_MODE exponent when the mode
    /// register says the linear family is active; everything else follows the
    /// QUERY format field. Returns `None` for bitmask registers and formats
    /// this crate cannot decode numerically.
    pub fn decode_word(&self, code: u16, raw: u16) -> Option<f64> {
        let descriptor = command::lookup(code)?;

        if descriptor.vout_scaled {
            if let Some(mode) = self.vout_mode() {
                if vout_mode_is_linear(mode) {
                    return Some(decode_vout(raw, mode));
                }
            }
        }

        let capability = self.command_capability(code)?;
        match capability.format()? {
            ValueFormat::Linear => {
                if descriptor.unit == Unit::Bits {
                    None
                } else {
                    Some(decode_linear11(raw))
                }
            }
            ValueFormat::Direct => decode_direct(raw, capability.coefficients_for(Direction::Read)),
            ValueFormat::UnsignedWord => Some(raw as f64),
            ValueFormat::UnsignedByte => Some((raw & 0xff) as f64),
            ValueFormat::Vid | ValueFormat::Manufacturer => None,
        }
    }
}
