//! emmc-sdhc - Card registers and the per-card state the driver keeps
//!
//! The controller strips the CRC off 136-bit responses, so CID and CSD
//! fields sit 8 bits lower than in the SD physical layer specification.

use core::convert::TryFrom;

use bitflags::bitflags;

use super::proto::{Cmd, CurrentState};

/// The different types of card we support.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CardType {
    Mmc,
    /// SD version 1.x, byte addressed.
    Sd1,
    /// SD version 2.0 or later, standard capacity, byte addressed.
    Sd2Sc,
    /// SD version 2.0 or later, high or extended capacity, block addressed.
    Sd2Hc,
}

impl CardType {
    /// Whether data commands take a 512-byte block number instead of a byte
    /// offset.
    pub fn is_block_addressed(self) -> bool {
        self == CardType::Sd2Hc
    }
}

bitflags! {
    /// Optional features negotiated with the card.
    #[derive(Default)]
    pub struct Support: u32 {
        const BUS_WIDTH_1     = 0x1000_0000;
        const BUS_WIDTH_4     = 0x2000_0000;
        const SPEED_CLASS     = 0x4000_0000;
        const SET_BLOCK_COUNT = 0x8000_0000;
    }
}

/// The FILE_FORMAT field of the CSD.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FileFormat {
    /// Hard disk like file system with partition table.
    Hdd,
    /// DOS FAT with boot sector only, no partition table.
    DosFat,
    /// Universal file format.
    Uff,
    Unknown,
}

impl FileFormat {
    fn from_bits(bits: u32) -> FileFormat {
        match bits & 0x3 {
            0 => FileFormat::Hdd,
            1 => FileFormat::DosFat,
            2 => FileFormat::Uff,
            _ => FileFormat::Unknown,
        }
    }

    /// Whether a card with this format can be used.
    pub fn is_supported(self) -> bool {
        matches!(self, FileFormat::Hdd | FileFormat::DosFat)
    }
}

impl Default for FileFormat {
    fn default() -> Self {
        FileFormat::Hdd
    }
}

/// Card Specific Data, captured from an R2 response.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Csd {
    pub data: [u32; 4],
}

impl Csd {
    /// Structure version 1.0, where capacity is given with a multiplier.
    pub const STRUCTURE_V1: u8 = 0;

    fn words(&self) -> &[u32] {
        &self.data
    }

    define_field!(csd_structure, u8, 0, 0x00c0_0000, 22);
    define_field!(transfer_speed, u8, 1, 0xff00_0000, 24);
    define_field!(command_classes, u16, 1, 0x00ff_f000, 12);
    define_field!(read_bl_len, u8, 1, 0x0000_0f00, 8);
    define_field!(read_bl_partial, bool, 1, 0x0000_0080);
    define_field!(write_blk_misalign, bool, 1, 0x0000_0040);
    define_field!(read_blk_misalign, bool, 1, 0x0000_0020);
    define_field!(dsr_imp, bool, 1, 0x0000_0010);
    define_field!(
        c_size_v1,
        u32,
        [(1, 0x0000_0003, 0, 2), (2, 0xffc0_0000, 22, 10)]
    );
    define_field!(c_size_mult_v1, u8, 2, 0x0000_0380, 7);
    define_field!(c_size_v2, u32, 2, 0x3fff_ff00, 8);
    define_field!(erase_single_block_enabled, bool, 2, 0x0000_0040);
    define_field!(
        erase_sector_size,
        u8,
        [(2, 0x0000_003f, 0, 6), (3, 0x8000_0000, 31, 1)]
    );
    define_field!(write_protect_group_size, u8, 3, 0x7f00_0000, 24);
    define_field!(write_protect_group_enable, bool, 3, 0x0080_0000);
    define_field!(write_bl_len, u8, 3, 0x0003_c000, 14);
    define_field!(copy, bool, 3, 0x0000_0040);
    define_field!(permanent_write_protect, bool, 3, 0x0000_0020);
    define_field!(temporary_write_protect, bool, 3, 0x0000_0010);

    /// The FILE_FORMAT field, together with FILE_FORMAT_GRP.
    pub fn file_format(&self) -> FileFormat {
        FileFormat::from_bits((self.data[3] & 0x0000_000c) >> 2)
    }

    /// Usable capacity of the card in bytes.
    pub fn card_capacity_bytes(&self) -> u64 {
        if self.csd_structure() == Self::STRUCTURE_V1 {
            let block_len = 1u64 << self.read_bl_len();
            let mult = 1u64 << (self.c_size_mult_v1() + 2);
            (u64::from(self.c_size_v1()) + 1) * mult * block_len
        } else {
            (u64::from(self.c_size_v2()) + 1) * 512 * 1024
        }
    }
}

/// SD Configuration Register, as two words read from the data FIFO.
///
/// The card sends the SCR most significant byte first and the FIFO hands it
/// over little endian, so fields appear byte-reversed from the SD layout. Only
/// the first word carries fields the driver needs; the second is reserved
/// for the manufacturer.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Scr {
    pub data: [u32; 2],
}

impl Scr {
    fn words(&self) -> &[u32] {
        &self.data
    }

    define_field!(scr_structure, u8, 0, 0x0000_00f0, 4);
    define_field!(sd_spec, u8, 0, 0x0000_000f, 0);
    define_field!(data_stat_after_erase, bool, 0, 0x0000_8000);
    define_field!(sd_security, u8, 0, 0x0000_7000, 12);
    define_field!(bus_width_1, bool, 0, 0x0000_0100);
    define_field!(bus_width_4, bool, 0, 0x0000_0400);
    define_field!(sd_spec3, bool, 0, 0x0080_0000);
    define_field!(set_block_count, bool, 0, 0x0200_0000);
    define_field!(speed_class_control, bool, 0, 0x0100_0000);

    /// The optional features this card advertises.
    pub fn support(&self) -> Support {
        let mut support = Support::empty();
        support.set(Support::BUS_WIDTH_4, self.bus_width_4());
        support.set(Support::BUS_WIDTH_1, self.bus_width_1());
        support.set(Support::SET_BLOCK_COUNT, self.set_block_count());
        support.set(Support::SPEED_CLASS, self.speed_class_control());
        support
    }
}

/// Card Identification register, captured from an R2 response.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Cid {
    pub data: [u32; 4],
}

impl Cid {
    fn words(&self) -> &[u32] {
        &self.data
    }

    define_field!(manufacturer_id, u8, 0, 0x00ff_0000, 16);
    define_field!(oem_id, u16, 0, 0x0000_ffff, 0);
    define_field!(product_revision, u8, 2, 0x00ff_0000, 16);
    define_field!(
        serial_number,
        u32,
        [(2, 0x0000_ffff, 0, 16), (3, 0xffff_0000, 16, 16)]
    );
    define_field!(manufacturing_year_offset, u8, 3, 0x0000_0ff0, 4);
    define_field!(manufacturing_month, u8, 3, 0x0000_000f, 0);

    /// The five ASCII characters of the product name.
    pub fn product_name(&self) -> [u8; 5] {
        let [a, b, c, d] = self.data[1].to_be_bytes();
        [a, b, c, d, self.data[2].to_be_bytes()[0]]
    }

    /// Manufacturing year.
    pub fn manufacturing_year(&self) -> u16 {
        2000 + u16::from(self.manufacturing_year_offset())
    }
}

/// Everything the driver knows about the card in the slot.
#[derive(Debug, Default, Clone)]
pub struct CardState {
    /// Capacity in bytes, computed from the CSD.
    pub capacity: u64,
    pub cid: Cid,
    pub csd: Csd,
    pub scr: Scr,
    /// Result of the operating conditions negotiation.
    pub ocr: u32,
    pub support: Support,
    pub file_format: FileFormat,
    /// `None` until the card has been classified.
    pub card_type: Option<CardType>,
    /// The card accepted the request to switch to 1.8V signalling.
    pub uhsi: bool,
    pub init: bool,
    pub absent: bool,
    /// Relative card address, 0 until enumerated.
    pub rca: u16,
    /// State reported by the last R1-class response.
    pub card_state: CurrentState,
    /// Last card status word.
    pub status: u32,
    pub last_cmd: Option<Cmd>,
    pub last_arg: u32,
}

impl CardState {
    /// The RCA as a command argument.
    pub fn rca_arg(&self) -> u32 {
        u32::from(self.rca) << 16
    }

    /// Decode the captured CSD into capacity and file format.
    pub fn parse_csd(&mut self) {
        self.capacity = self.csd.card_capacity_bytes();
        self.file_format = self.csd.file_format();
    }

    /// Translate a byte address into the argument of a data command.
    pub fn block_address(&self, address: u64) -> Option<u32> {
        match self.card_type {
            Some(t) if t.is_block_addressed() => u32::try_from(address >> 9).ok(),
            _ => u32::try_from(address).ok(),
        }
    }

    /// Distance between the addresses of two consecutive blocks.
    pub fn block_stride(&self) -> u32 {
        match self.card_type {
            Some(t) if t.is_block_addressed() => 1,
            _ => 512,
        }
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
