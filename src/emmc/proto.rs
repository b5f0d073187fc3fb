//! emmc-sdhc - SD card protocol constants and the command catalog
//!
//! The EMMC controller wants the command index and the response shape in a
//! single CMDTM word, so each catalog entry carries its ready-to-write code.

use bitflags::bitflags;

// CMDTM command flags
pub const CMD_TYPE_NORMAL: u32 = 0x0000_0000;
pub const CMD_TYPE_SUSPEND: u32 = 0x0040_0000;
pub const CMD_TYPE_RESUME: u32 = 0x0080_0000;
pub const CMD_TYPE_ABORT: u32 = 0x00c0_0000;
pub const CMD_IS_DATA: u32 = 0x0020_0000;
pub const CMD_IXCHK_EN: u32 = 0x0010_0000;
pub const CMD_CRCCHK_EN: u32 = 0x0008_0000;
pub const CMD_RSPNS_NO: u32 = 0x0000_0000;
pub const CMD_RSPNS_136: u32 = 0x0001_0000;
pub const CMD_RSPNS_48: u32 = 0x0002_0000;
pub const CMD_RSPNS_48B: u32 = 0x0003_0000;
pub const TM_MULTI_BLOCK: u32 = 0x0000_0020;
pub const TM_DAT_DIR_HC: u32 = 0x0000_0000;
pub const TM_DAT_DIR_CH: u32 = 0x0000_0010;
pub const TM_AUTO_CMD23: u32 = 0x0000_0008;
pub const TM_AUTO_CMD12: u32 = 0x0000_0004;
pub const TM_BLKCNT_EN: u32 = 0x0000_0002;
pub const TM_MULTI_DATA: u32 = CMD_IS_DATA | TM_MULTI_BLOCK | TM_BLKCNT_EN;

/// Command index field of CMDTM.
pub const fn cmd_index(index: u32) -> u32 {
    index << 24
}

/// Argument of SEND_IF_COND: 2.7-3.6V and check pattern 0xAA.
pub const IF_COND_ARG: u32 = 0x0000_01AA;

/// Data bus width argument of SET_BUS_WIDTH selecting four lines.
pub const BUS_WIDTH_4_ARG: u32 = 0x0000_0002;

/// Setup clock rate, used until the card format is confirmed.
pub const FREQ_SETUP: u32 = 400_000;
/// Normal operating clock rate.
pub const FREQ_NORMAL: u32 = 25_000_000;

bitflags! {
    /// OCR as returned in R3, and the ACMD41 argument built from it.
    pub struct Ocr: u32 {
        /// 2.7-3.6V window.
        const VOLTAGE = 0x00ff_8000;
        /// Switching to 1.8V requested (argument) / accepted (response).
        const S18 = 0x0100_0000;
        /// SDXC maximum performance, argument only.
        const XPC = 0x1000_0000;
        /// Host supports high capacity (argument) / card is high capacity
        /// (response).
        const CCS = 0x4000_0000;
        /// Card power up complete, response only.
        const COMPLETE = 0x8000_0000;

        /// ACMD41 argument offered to cards that answered SEND_IF_COND.
        const ARG_HC = Self::CCS.bits | Self::XPC.bits | Self::VOLTAGE.bits | Self::S18.bits;
        /// ACMD41 argument offered to legacy cards.
        const ARG_SC = Self::VOLTAGE.bits | Self::S18.bits;
    }
}

bitflags! {
    /// R1 card status.
    pub struct CardStatus: u32 {
        const OUT_OF_RANGE      = 0x8000_0000;
        const ADDRESS_ERROR     = 0x4000_0000;
        const BLOCK_LEN_ERROR   = 0x2000_0000;
        const ERASE_SEQ_ERROR   = 0x1000_0000;
        const ERASE_PARAM_ERROR = 0x0800_0000;
        const WP_VIOLATION      = 0x0400_0000;
        const CARD_IS_LOCKED    = 0x0200_0000;
        const LOCK_UNLOCK_FAIL  = 0x0100_0000;
        const COM_CRC_ERROR     = 0x0080_0000;
        const ILLEGAL_COMMAND   = 0x0040_0000;
        const CARD_ECC_FAILED   = 0x0020_0000;
        const CC_ERROR          = 0x0010_0000;
        const ERROR             = 0x0008_0000;
        const CSD_OVERWRITE     = 0x0001_0000;
        const WP_ERASE_SKIP     = 0x0000_8000;
        const CARD_ECC_DISABLED = 0x0000_4000;
        const ERASE_RESET       = 0x0000_2000;
        const CURRENT_STATE     = 0x0000_1e00;
        const READY_FOR_DATA    = 0x0000_0100;
        const APP_CMD           = 0x0000_0020;
        const AKE_SEQ_ERROR     = 0x0000_0008;

        /// Bits that make a command fail.
        const ERRORS = 0xfff9_c004;
    }
}

/// Shift of [`CardStatus::CURRENT_STATE`].
pub const CURRENT_STATE_SHIFT: u32 = 9;

impl CardStatus {
    /// Card status flags out of a raw status word. Unknown bits are dropped.
    pub fn from_word(status: u32) -> CardStatus {
        CardStatus::from_bits_truncate(status)
    }
}

/// Rebuild the card status word from the 16 status bits of an R6 response.
///
/// Bits 12:0 map directly, bits 13, 14 and 15 carry ERROR, ILLEGAL_COMMAND
/// and COM_CRC_ERROR.
pub fn r6_status(resp0: u32) -> u32 {
    (resp0 & 0x0000_1fff)
        | ((resp0 & 0x0000_2000) << 6)
        | ((resp0 & 0x0000_4000) << 8)
        | ((resp0 & 0x0000_8000) << 8)
}

/// Card state as reported in the CURRENT_STATE field of the card status.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CurrentState {
    Idle,
    Ready,
    Ident,
    Standby,
    Transfer,
    Data,
    Receive,
    Program,
    Disconnect,
    Reserved(u8),
}

impl CurrentState {
    /// The CURRENT_STATE field of a card status word.
    pub fn from_status(status: u32) -> CurrentState {
        match (status & CardStatus::CURRENT_STATE.bits()) >> CURRENT_STATE_SHIFT {
            0 => CurrentState::Idle,
            1 => CurrentState::Ready,
            2 => CurrentState::Ident,
            3 => CurrentState::Standby,
            4 => CurrentState::Transfer,
            5 => CurrentState::Data,
            6 => CurrentState::Receive,
            7 => CurrentState::Program,
            8 => CurrentState::Disconnect,
            x => CurrentState::Reserved(x as u8),
        }
    }
}

impl Default for CurrentState {
    fn default() -> Self {
        CurrentState::Idle
    }
}

/// How the controller delivers the response to a command, and where the
/// driver stores it.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Response {
    /// No response.
    None,
    /// 48 bits, RESP0 holds the card status.
    R1,
    /// As R1, the data line signals busy.
    R1b,
    /// 136 bits, RESP0..3 hold the CID without its CRC.
    R2Cid,
    /// 136 bits, RESP0..3 hold the CSD without its CRC.
    R2Csd,
    /// 48 bits, RESP0 holds the OCR.
    R3,
    /// 48 bits, RESP0 holds the RCA and status bits 23, 22, 19 and 12:0.
    R6,
    /// 48 bits, RESP0 holds the accepted voltage and the check pattern.
    R7,
}

/// A command descriptor.
#[derive(Debug)]
pub struct Command {
    pub name: &'static str,
    /// Value written to CMDTM.
    pub code: u32,
    pub response: Response,
    /// The implicit argument is the RCA.
    pub rca: bool,
    /// Microseconds to wait after issuing, before looking for completion.
    pub delay_us: u32,
}

impl Command {
    const fn new(
        name: &'static str,
        code: u32,
        response: Response,
        rca: bool,
        delay_us: u32,
    ) -> Command {
        Command {
            name,
            code,
            response,
            rca,
            delay_us,
        }
    }
}

/// Symbolic index into the command catalog.
///
/// Everything from [`Cmd::SetBusWidth`] on is an application command and is
/// sent after APP_CMD.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum Cmd {
    GoIdleState,
    AllSendCid,
    SendRelAddr,
    SetDsr,
    SwitchFunc,
    CardSelect,
    SendIfCond,
    SendCsd,
    SendCid,
    VoltageSwitch,
    StopTrans,
    SendStatus,
    GoInactive,
    SetBlockLen,
    ReadSingle,
    ReadMulti,
    SendTuning,
    SpeedClass,
    SetBlockCnt,
    WriteSingle,
    WriteMulti,
    ProgramCsd,
    SetWritePr,
    ClrWritePr,
    SndWritePr,
    EraseWrSt,
    EraseWrEnd,
    Erase,
    LockUnlock,
    AppCmd,
    /// APP_CMD once the card has an RCA.
    AppCmdRca,
    GenCmd,
    SetBusWidth,
    SdStatus,
    SendNumWrBl,
    SendNumErs,
    AppSendOpCond,
    SetClrDet,
    SendScr,
}

impl Cmd {
    /// The catalog entry for this command.
    pub fn command(self) -> &'static Command {
        &COMMANDS[self as usize]
    }

    /// Whether APP_CMD has to precede this command.
    pub fn is_app(self) -> bool {
        self as usize >= Cmd::SetBusWidth as usize
    }
}

use self::Response::{None as RNone, R1, R1b, R2Cid, R2Csd, R3, R6, R7};

/// The command catalog, in [`Cmd`] order.
pub static COMMANDS: [Command; 39] = [
    Command::new("GO_IDLE_STATE", cmd_index(0) | CMD_RSPNS_NO, RNone, false, 0),
    Command::new("ALL_SEND_CID", cmd_index(2) | CMD_RSPNS_136, R2Cid, false, 0),
    Command::new("SEND_REL_ADDR", cmd_index(3) | CMD_RSPNS_48, R6, false, 0),
    Command::new("SET_DSR", cmd_index(4) | CMD_RSPNS_NO, RNone, false, 0),
    Command::new("SWITCH_FUNC", cmd_index(6) | CMD_RSPNS_48, R1, false, 0),
    Command::new("CARD_SELECT", cmd_index(7) | CMD_RSPNS_48B, R1b, true, 0),
    Command::new("SEND_IF_COND", cmd_index(8) | CMD_RSPNS_48, R7, false, 100),
    Command::new("SEND_CSD", cmd_index(9) | CMD_RSPNS_136, R2Csd, true, 0),
    Command::new("SEND_CID", cmd_index(10) | CMD_RSPNS_136, R2Cid, true, 0),
    Command::new("VOLT_SWITCH", cmd_index(11) | CMD_RSPNS_48, R1, false, 0),
    Command::new("STOP_TRANS", cmd_index(12) | CMD_RSPNS_48B, R1b, false, 0),
    Command::new("SEND_STATUS", cmd_index(13) | CMD_RSPNS_48, R1, true, 0),
    Command::new("GO_INACTIVE", cmd_index(15) | CMD_RSPNS_NO, RNone, true, 0),
    Command::new("SET_BLOCKLEN", cmd_index(16) | CMD_RSPNS_48, R1, false, 0),
    Command::new(
        "READ_SINGLE",
        cmd_index(17) | CMD_RSPNS_48 | CMD_IS_DATA | TM_DAT_DIR_CH,
        R1,
        false,
        0,
    ),
    Command::new(
        "READ_MULTI",
        cmd_index(18) | CMD_RSPNS_48 | TM_MULTI_DATA | TM_DAT_DIR_CH,
        R1,
        false,
        0,
    ),
    Command::new("SEND_TUNING", cmd_index(19) | CMD_RSPNS_48, R1, false, 0),
    Command::new("SPEED_CLASS", cmd_index(20) | CMD_RSPNS_48B, R1b, false, 0),
    Command::new("SET_BLOCKCNT", cmd_index(23) | CMD_RSPNS_48, R1, false, 0),
    Command::new(
        "WRITE_SINGLE",
        cmd_index(24) | CMD_RSPNS_48 | CMD_IS_DATA | TM_DAT_DIR_HC,
        R1,
        false,
        0,
    ),
    Command::new(
        "WRITE_MULTI",
        cmd_index(25) | CMD_RSPNS_48 | TM_MULTI_DATA | TM_DAT_DIR_HC,
        R1,
        false,
        0,
    ),
    Command::new("PROGRAM_CSD", cmd_index(27) | CMD_RSPNS_48, R1, false, 0),
    Command::new("SET_WRITE_PR", cmd_index(28) | CMD_RSPNS_48B, R1b, false, 0),
    Command::new("CLR_WRITE_PR", cmd_index(29) | CMD_RSPNS_48B, R1b, false, 0),
    Command::new("SND_WRITE_PR", cmd_index(30) | CMD_RSPNS_48, R1, false, 0),
    Command::new("ERASE_WR_ST", cmd_index(32) | CMD_RSPNS_48, R1, false, 0),
    Command::new("ERASE_WR_END", cmd_index(33) | CMD_RSPNS_48, R1, false, 0),
    Command::new("ERASE", cmd_index(38) | CMD_RSPNS_48B, R1b, false, 0),
    Command::new("LOCK_UNLOCK", cmd_index(42) | CMD_RSPNS_48, R1, false, 0),
    Command::new("APP_CMD", cmd_index(55) | CMD_RSPNS_NO, RNone, false, 100),
    Command::new("APP_CMD", cmd_index(55) | CMD_RSPNS_48, R1, true, 0),
    Command::new("GEN_CMD", cmd_index(56) | CMD_RSPNS_48, R1, false, 0),
    // Application commands
    Command::new("SET_BUS_WIDTH", cmd_index(6) | CMD_RSPNS_48, R1, false, 0),
    Command::new("SD_STATUS", cmd_index(13) | CMD_RSPNS_48, R1, true, 0),
    Command::new("SEND_NUM_WRBL", cmd_index(22) | CMD_RSPNS_48, R1, false, 0),
    Command::new("SEND_NUM_ERS", cmd_index(23) | CMD_RSPNS_48, R1, false, 0),
    Command::new("SD_SENDOPCOND", cmd_index(41) | CMD_RSPNS_48, R3, false, 1000),
    Command::new("SET_CLR_DET", cmd_index(42) | CMD_RSPNS_48, R1, false, 0),
    Command::new(
        "SEND_SCR",
        cmd_index(51) | CMD_RSPNS_48 | CMD_IS_DATA | TM_DAT_DIR_CH,
        R1,
        false,
        0,
    ),
];

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
