//! The PMBus command registry.
//!
//! This is the command summary from Part II, Appendix I of the PMBus 1.1
//! specification, kept in specification order. The table is immutable; everything a
//! device tells us about itself during discovery lives in the per-session state in
//! [`crate::device`], never here.

use strum_macros::{Display, EnumIter};

use TransferKind::*;
use Unit::{Amperes, Bits, DegreesCelsius, Milliseconds, Text, Volts, Watts};

/// __W__ - Select which page (rail) subsequent commands address.
pub const PAGE: u16 = 0x00;
/// __W0__ - Clear all fault and warning status bits.
pub const CLEAR_FAULTS: u16 = 0x03;
/// __R__ - Device capability byte: bit 7 PEC, bits 5-6 bus speed, bit 4 SMBALERT#.
pub const CAPABILITY: u16 = 0x19;
/// Process call asking whether another command is supported, and in which format.
pub const QUERY: u16 = 0x1a;
/// __R/W__ - Selects the numeric format shared by the output-voltage commands.
pub const VOUT_MODE: u16 = 0x20;
/// Process call fetching the DIRECT-format coefficients for another command.
pub const COEFFICIENTS: u16 = 0x30;

pub const STATUS_BYTE: u16 = 0x78;
pub const STATUS_WORD: u16 = 0x79;
pub const STATUS_VOUT: u16 = 0x7a;
pub const STATUS_IOUT: u16 = 0x7b;
pub const STATUS_INPUT: u16 = 0x7c;
pub const STATUS_TEMPERATURE: u16 = 0x7d;
pub const STATUS_CML: u16 = 0x7e;
pub const STATUS_OTHER: u16 = 0x7f;
pub const STATUS_MFR_SPECIFIC: u16 = 0x80;
pub const STATUS_FANS_1_2: u16 = 0x81;
pub const STATUS_FANS_3_4: u16 = 0x82;

pub const PMBUS_REVISION: u16 = 0x98;
pub const MFR_ID: u16 = 0x99;
pub const MFR_MODEL: u16 = 0x9a;
pub const MFR_REVISION: u16 = 0x9b;
pub const MFR_LOCATION: u16 = 0x9c;
pub const MFR_DATE: u16 = 0x9d;
pub const MFR_SERIAL: u16 = 0x9e;
pub const APP_PROFILE_SUPPORT: u16 = 0x9f;
pub const IC_DEVICE_ID: u16 = 0xad;
pub const IC_DEVICE_REV: u16 = 0xae;

/// USER_DATA_xx command code, `index` in `0..=15`.
pub const fn user_data(index: u8) -> u16 {
    0xb0 + index as u16
}

/// MFR_SPECIFIC_xx command code, `index` in `0..=45`.
pub const fn mfr_specific(index: u8) -> u16 {
    0xd0 + index as u16
}

/// Extended manufacturer command on the 0xFE page.
pub const fn mfr_extended(index: u8) -> u16 {
    0xfe00 | index as u16
}

/// Extended standard command on the 0xFF page.
pub const fn pmbus_extended(index: u8) -> u16 {
    0xff00 | index as u16
}

/// A plain 8-bit command. 0xFE and 0xFF are excluded: they prefix the two
/// extended command pages.
pub const fn is_standard(code: u16) -> bool {
    code & 0xff00 == 0 && code & 0x00fe != 0x00fe
}

/// A two-byte command on one of the extended pages.
pub const fn is_extended(code: u16) -> bool {
    code & 0xfe00 == 0xfe00
}

/// How a command's data moves over the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Write-only, command byte alone (W0).
    SendByte,
    /// Write-only, one data byte (W1).
    WriteByte,
    /// Read-only, one data byte (R1).
    ReadByte,
    /// Read-only, one 16-bit word (R2).
    ReadWord,
    /// Read/write, one data byte (RW1).
    Byte,
    /// Read/write, one 16-bit word (RW2).
    Word,
    /// Read/write, variable-length block of up to 255 bytes (RWB).
    Block,
    /// Read/write, fixed 14-byte block (RWB14).
    Block14,
    /// Block write/read process call used only by QUERY.
    QueryProcessCall,
    /// Block write/read process call used only by COEFFICIENTS.
    CoefficientsProcessCall,
    /// Block read with an embedded byte count (APP_PROFILE_SUPPORT).
    AppProfileBlock,
    /// Manufacturer-defined syntax; issued opaquely, never decoded.
    Opaque,
}

/// The engineering unit a command's value carries, where one is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Unit {
    #[strum(serialize = "")]
    None,
    #[strum(serialize = "Volts")]
    Volts,
    #[strum(serialize = "Amperes")]
    Amperes,
    #[strum(serialize = "milliseconds")]
    Milliseconds,
    #[strum(serialize = "degrees Celsius")]
    DegreesCelsius,
    #[strum(serialize = "Watts")]
    Watts,
    #[strum(serialize = "bits")]
    Bits,
    #[strum(serialize = "ISO 8859/1 string")]
    Text,
}

/// One command as the specification defines it. Immutable.
#[derive(Debug)]
pub struct CommandDescriptor {
    /// Command code. 8-bit for standard commands, 0xFExx/0xFFxx for the
    /// extended pages.
    pub code: u16,
    /// Lowercase specification name.
    pub name: &'static str,
    pub transfer: TransferKind,
    pub unit: Unit,
    /// Belongs in a one-line device summary (inventory, capability, revision).
    pub summary: bool,
    /// This is a status register.
    pub status: bool,
    /// Value uses the device-wide VOUT_MODE scale instead of per-command coefficients.
    pub vout_scaled: bool,
}

impl CommandDescriptor {
    const fn new(code: u16, name: &'static str, transfer: TransferKind) -> Self {
        Self {
            code,
            name,
            transfer,
            unit: Unit::None,
            summary: false,
            status: false,
            vout_scaled: false,
        }
    }

    const fn unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    const fn summary(mut self) -> Self {
        self.summary = true;
        self
    }

    const fn status(mut self) -> Self {
        self.status = true;
        self
    }

    const fn vout(mut self) -> Self {
        self.vout_scaled = true;
        self
    }
}

const fn cmd(code: u16, name: &'static str, transfer: TransferKind) -> CommandDescriptor {
    CommandDescriptor::new(code, name, transfer)
}

/// The full command list, in specification order (numeric order modulo the
/// sequence gaps in the spec itself).
static TABLE: &[CommandDescriptor] = &[
    cmd(PAGE, "page", Byte),
    cmd(0x01, "operation", Byte),
    cmd(0x02, "on_off_config", Byte),
    cmd(CLEAR_FAULTS, "clear_faults", SendByte),
    cmd(0x04, "phase", Byte),
    cmd(0x05, "page_plus_write", Block),
    cmd(0x06, "page_plus_read", Block),
    cmd(0x10, "write_protect", Byte),
    cmd(0x11, "store_default_all", SendByte),
    cmd(0x12, "restore_default_all", SendByte),
    cmd(0x13, "store_default_code", WriteByte),
    cmd(0x14, "restore_default_code", WriteByte),
    cmd(0x15, "store_user_all", SendByte),
    cmd(0x16, "restore_user_all", SendByte),
    cmd(0x17, "store_user_code", WriteByte),
    cmd(0x18, "restore_user_code", WriteByte),
    cmd(CAPABILITY, "capability", ReadByte).summary(),
    cmd(QUERY, "query", QueryProcessCall),
    cmd(0x1b, "smbalert_mask", Block),
    cmd(VOUT_MODE, "vout_mode", Byte),
    cmd(0x21, "vout_command", Word),
    cmd(0x22, "vout_trim", Word).unit(Volts),
    cmd(0x23, "vout_cal_offset", Word).unit(Volts),
    cmd(0x24, "vout_max", Word).unit(Volts).vout(),
    cmd(0x25, "vout_margin_high", Word).unit(Volts).vout(),
    cmd(0x26, "vout_margin_low", Word).unit(Volts).vout(),
    cmd(0x27, "vout_transition_rate", Word),
    cmd(0x28, "vout_droop", Word),
    cmd(0x29, "vout_scale_loop", Word),
    cmd(0x2a, "vout_scale_monitor", Word),
    cmd(COEFFICIENTS, "coefficients", CoefficientsProcessCall),
    cmd(0x31, "pout_max", Word).unit(Watts),
    cmd(0x32, "max_duty", Word),
    cmd(0x33, "frequency_switch", Word),
    cmd(0x35, "vin_on", Word).unit(Volts),
    cmd(0x36, "vin_off", Word).unit(Volts),
    cmd(0x37, "interleave", Word),
    cmd(0x38, "iout_cal_gain", Word),
    cmd(0x39, "iout_cal_offset", Word).unit(Amperes),
    cmd(0x3a, "fan_config_1_2", Byte),
    cmd(0x3b, "fan_command_1", Word),
    cmd(0x3c, "fan_command_2", Word),
    cmd(0x3d, "fan_config_3_4", Byte),
    cmd(0x3e, "fan_command_3", Word),
    cmd(0x3f, "fan_command_4", Word),
    cmd(0x40, "vout_ov_fault_limit", Word).unit(Volts).vout(),
    cmd(0x41, "vout_ov_fault_response", Byte),
    cmd(0x42, "vout_ov_warn_limit", Word).unit(Volts).vout(),
    cmd(0x43, "vout_uv_warn_limit", Word).unit(Volts).vout(),
    cmd(0x44, "vout_uv_fault_limit", Word).unit(Volts).vout(),
    cmd(0x45, "vout_uv_fault_response", Byte),
    cmd(0x46, "iout_oc_fault_limit", Word).unit(Amperes),
    cmd(0x47, "iout_oc_fault_response", Byte),
    cmd(0x48, "iout_oc_lv_fault_limit", Word).unit(Volts).vout(),
    cmd(0x49, "iout_oc_lv_fault_response", Byte),
    cmd(0x4a, "iout_oc_warn_limit", Word).unit(Amperes),
    cmd(0x4b, "iout_uc_fault_limit", Word).unit(Amperes),
    cmd(0x4c, "iout_uc_fault_response", Byte),
    cmd(0x4f, "ot_fault_limit", Word).unit(DegreesCelsius),
    cmd(0x50, "ot_fault_response", Byte),
    cmd(0x51, "ot_warn_limit", Word).unit(DegreesCelsius),
    cmd(0x52, "ut_warn_limit", Word).unit(DegreesCelsius),
    cmd(0x53, "ut_fault_limit", Word).unit(DegreesCelsius),
    cmd(0x54, "ut_fault_response", Byte),
    cmd(0x55, "vin_ov_fault_limit", Word).unit(Volts),
    cmd(0x56, "vin_ov_fault_response", Byte),
    cmd(0x57, "vin_ov_warn_limit", Word).unit(Volts),
    cmd(0x58, "vin_uv_warn_limit", Word).unit(Volts),
    cmd(0x59, "vin_uv_fault_limit", Word).unit(Volts),
    cmd(0x5a, "vin_uv_fault_response", Byte),
    cmd(0x5b, "iin_oc_fault_limit", Word).unit(Amperes),
    cmd(0x5c, "iin_oc_fault_response", Byte),
    cmd(0x5d, "iin_oc_warn_limit", Word).unit(Amperes),
    cmd(0x5e, "power_good_on", Word).unit(Volts).vout(),
    cmd(0x5f, "power_good_off", Word).unit(Volts).vout(),
    cmd(0x60, "ton_delay", Word).unit(Milliseconds),
    cmd(0x61, "ton_rise", Word).unit(Milliseconds),
    cmd(0x62, "ton_max_fault_limit", Word).unit(Milliseconds),
    cmd(0x63, "ton_max_fault_response", Byte),
    cmd(0x64, "toff_delay", Word).unit(Milliseconds),
    cmd(0x65, "toff_fall", Word).unit(Milliseconds),
    cmd(0x66, "toff_max_warn_limit", Word).unit(Milliseconds),
    cmd(0x68, "pout_op_fault_limit", Word).unit(Watts),
    cmd(0x69, "pout_op_fault_response", Byte),
    cmd(0x6a, "pout_op_warn_limit", Word).unit(Watts),
    cmd(0x6b, "pin_op_warn_limit", Word).unit(Watts),
    cmd(STATUS_BYTE, "status_byte", ReadByte).status(),
    cmd(STATUS_WORD, "status_word", ReadWord).unit(Bits).status(),
    cmd(STATUS_VOUT, "status_vout", ReadByte).status(),
    cmd(STATUS_IOUT, "status_iout", ReadByte).status(),
    cmd(STATUS_INPUT, "status_input", ReadByte).status(),
    cmd(STATUS_TEMPERATURE, "status_temperature", ReadByte).status(),
    cmd(STATUS_CML, "status_cml", ReadByte).status(),
    cmd(STATUS_OTHER, "status_other", ReadByte).status(),
    cmd(STATUS_MFR_SPECIFIC, "status_mfr_specific", ReadByte).status(),
    cmd(STATUS_FANS_1_2, "status_fans_1_2", ReadByte).status(),
    cmd(STATUS_FANS_3_4, "status_fans_3_4", ReadByte).status(),
    cmd(0x88, "read_vin", ReadWord).unit(Volts),
    cmd(0x89, "read_iin", ReadWord).unit(Amperes),
    cmd(0x8a, "read_vcap", ReadWord).unit(Volts),
    cmd(0x8b, "read_vout", ReadWord).unit(Volts).vout(),
    cmd(0x8c, "read_iout", ReadWord).unit(Amperes),
    cmd(0x8d, "read_temperature_1", ReadWord).unit(DegreesCelsius),
    cmd(0x8e, "read_temperature_2", ReadWord).unit(DegreesCelsius),
    cmd(0x8f, "read_temperature_3", ReadWord).unit(DegreesCelsius),
    cmd(0x90, "read_fan_speed_1", ReadWord),
    cmd(0x91, "read_fan_speed_2", ReadWord),
    cmd(0x92, "read_fan_speed_3", ReadWord),
    cmd(0x93, "read_fan_speed_4", ReadWord),
    cmd(0x94, "read_duty_cycle", ReadWord),
    cmd(0x95, "read_frequency", ReadWord),
    cmd(0x96, "read_pout", ReadWord).unit(Watts),
    cmd(0x97, "read_pin", ReadWord).unit(Watts),
    cmd(PMBUS_REVISION, "pmbus_revision", ReadByte).summary(),
    cmd(MFR_ID, "mfr_id", Block).unit(Text).summary(),
    cmd(MFR_MODEL, "mfr_model", Block).unit(Text).summary(),
    cmd(MFR_REVISION, "mfr_revision", Block).unit(Text).summary(),
    cmd(MFR_LOCATION, "mfr_location", Block).unit(Text).summary(),
    cmd(MFR_DATE, "mfr_date", Block).unit(Text).summary(),
    cmd(MFR_SERIAL, "mfr_serial", Block).unit(Text).summary(),
    cmd(APP_PROFILE_SUPPORT, "app_profile_support", AppProfileBlock).summary(),
    cmd(0xa0, "mfr_vin_min", ReadWord).unit(Volts),
    cmd(0xa1, "mfr_vin_max", ReadWord).unit(Volts),
    cmd(0xa2, "mfr_iin_max", ReadWord).unit(Amperes),
    cmd(0xa3, "mfr_pin_max", ReadWord).unit(Watts),
    cmd(0xa4, "mfr_vout_min", ReadWord).unit(Volts),
    cmd(0xa5, "mfr_vout_max", ReadWord).unit(Volts),
    cmd(0xa6, "mfr_iout_max", ReadWord).unit(Amperes),
    cmd(0xa7, "mfr_pout_max", ReadWord).unit(Watts),
    cmd(0xa8, "mfr_tambient_max", ReadWord).unit(DegreesCelsius),
    cmd(0xa9, "mfr_tambient_min", ReadWord).unit(DegreesCelsius),
    cmd(0xaa, "mfr_efficiency_ll", Block14),
    cmd(0xab, "mfr_efficiency_hl", Block14),
    cmd(0xac, "mfr_pin_accuracy", ReadByte),
    cmd(IC_DEVICE_ID, "ic_device_id", Block).unit(Text).summary(),
    cmd(IC_DEVICE_REV, "ic_device_rev", Block).unit(Text).summary(),
    cmd(user_data(0), "user_data_00", Block),
    cmd(user_data(1), "user_data_01", Block),
    cmd(user_data(2), "user_data_02", Block),
    cmd(user_data(3), "user_data_03", Block),
    cmd(user_data(4), "user_data_04", Block),
    cmd(user_data(5), "user_data_05", Block),
    cmd(user_data(6), "user_data_06", Block),
    cmd(user_data(7), "user_data_07", Block),
    cmd(user_data(8), "user_data_08", Block),
    cmd(user_data(9), "user_data_09", Block),
    cmd(user_data(10), "user_data_10", Block),
    cmd(user_data(11), "user_data_11", Block),
    cmd(user_data(12), "user_data_12", Block),
    cmd(user_data(13), "user_data_13", Block),
    cmd(user_data(14), "user_data_14", Block),
    cmd(user_data(15), "user_data_15", Block),
    cmd(0xc0, "mfr_max_temp_1", Word).unit(DegreesCelsius),
    cmd(0xc1, "mfr_max_temp_2", Word).unit(DegreesCelsius),
    cmd(0xc2, "mfr_max_temp_3", Word).unit(DegreesCelsius),
    cmd(mfr_specific(0), "mfr_specific_00", Opaque),
    cmd(mfr_specific(1), "mfr_specific_01", Opaque),
    cmd(mfr_specific(2), "mfr_specific_02", Opaque),
    cmd(mfr_specific(3), "mfr_specific_03", Opaque),
    cmd(mfr_specific(4), "mfr_specific_04", Opaque),
    cmd(mfr_specific(5), "mfr_specific_05", Opaque),
    cmd(mfr_specific(6), "mfr_specific_06", Opaque),
    cmd(mfr_specific(7), "mfr_specific_07", Opaque),
    cmd(mfr_specific(8), "mfr_specific_08", Opaque),
    cmd(mfr_specific(9), "mfr_specific_09", Opaque),
    cmd(mfr_specific(10), "mfr_specific_10", Opaque),
    cmd(mfr_specific(11), "mfr_specific_11", Opaque),
    cmd(mfr_specific(12), "mfr_specific_12", Opaque),
    cmd(mfr_specific(13), "mfr_specific_13", Opaque),
    cmd(mfr_specific(14), "mfr_specific_14", Opaque),
    cmd(mfr_specific(15), "mfr_specific_15", Opaque),
    cmd(mfr_specific(16), "mfr_specific_16", Opaque),
    cmd(mfr_specific(17), "mfr_specific_17", Opaque),
    cmd(mfr_specific(18), "mfr_specific_18", Opaque),
    cmd(mfr_specific(19), "mfr_specific_19", Opaque),
    cmd(mfr_specific(20), "mfr_specific_20", Opaque),
    cmd(mfr_specific(21), "mfr_specific_21", Opaque),
    cmd(mfr_specific(22), "mfr_specific_22", Opaque),
    cmd(mfr_specific(23), "mfr_specific_23", Opaque),
    cmd(mfr_specific(24), "mfr_specific_24", Opaque),
    cmd(mfr_specific(25), "mfr_specific_25", Opaque),
    cmd(mfr_specific(26), "mfr_specific_26", Opaque),
    cmd(mfr_specific(27), "mfr_specific_27", Opaque),
    cmd(mfr_specific(28), "mfr_specific_28", Opaque),
    cmd(mfr_specific(29), "mfr_specific_29", Opaque),
    cmd(mfr_specific(30), "mfr_specific_30", Opaque),
    cmd(mfr_specific(31), "mfr_specific_31", Opaque),
    cmd(mfr_specific(32), "mfr_specific_32", Opaque),
    cmd(mfr_specific(33), "mfr_specific_33", Opaque),
    cmd(mfr_specific(34), "mfr_specific_34", Opaque),
    cmd(mfr_specific(35), "mfr_specific_35", Opaque),
    cmd(mfr_specific(36), "mfr_specific_36", Opaque),
    cmd(mfr_specific(37), "mfr_specific_37", Opaque),
    cmd(mfr_specific(38), "mfr_specific_38", Opaque),
    cmd(mfr_specific(39), "mfr_specific_39", Opaque),
    cmd(mfr_specific(40), "mfr_specific_40", Opaque),
    cmd(mfr_specific(41), "mfr_specific_41", Opaque),
    cmd(mfr_specific(42), "mfr_specific_42", Opaque),
    cmd(mfr_specific(43), "mfr_specific_43", Opaque),
    cmd(mfr_specific(44), "mfr_specific_44", Opaque),
    cmd(mfr_specific(45), "mfr_specific_45", Opaque),
    cmd(0xfe, "mfr_specific_command_ext", Opaque),
    cmd(0xff, "pmbus_command_ext", Opaque),
];

// One slot per 8-bit code. Built at compile time; a duplicate code in TABLE
// fails the build.
static INDEX: [Option<&'static CommandDescriptor>; 256] = build_index(TABLE);

const fn build_index(
    table: &'static [CommandDescriptor],
) -> [Option<&'static CommandDescriptor>; 256] {
    let mut index: [Option<&'static CommandDescriptor>; 256] = [None; 256];
    let mut i = 0;
    while i < table.len() {
        let code = table[i].code;
        if code < 0x100 {
            assert!(
                index[code as usize].is_none(),
                "duplicate command code in TABLE"
            );
            index[code as usize] = Some(&table[i]);
        }
        i += 1;
    }
    index
}

/// Find the descriptor for a command code, if the specification defines one.
///
/// Extended-page codes currently have no individual table entries, so they
/// resolve to `None`; only their 8-bit prefix commands (0xFE, 0xFF) are listed.
pub fn lookup(code: u16) -> Option<&'static CommandDescriptor> {
    if (code as usize) < INDEX.len() {
        INDEX[code as usize]
    } else {
        TABLE.iter().find(|desc| desc.code == code)
    }
}

/// All descriptors, in specification order. Drives discovery sweeps and keeps
/// downstream reporting deterministic.
pub fn all() -> impl Iterator<Item = &'static CommandDescriptor> {
    TABLE.iter()
}
