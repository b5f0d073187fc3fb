//! emmc-sdhc - EMMC host controller registers
//!
//! Every access to the controller goes through the [`Registers`] trait. The
//! [`Mmio`] implementation is the only code in the crate that touches raw
//! memory.

use bitflags::bitflags;

/// Base address of the EMMC controller on a BCM2835.
pub const BCM2835_EMMC_BASE: usize = 0x2030_0000;

/// The controller registers the driver uses, by byte offset from the base.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum Reg {
    /// Block size (bits 9:0) and block count (bits 31:16).
    BlkSizeCnt = 0x04,
    /// Command argument.
    Arg1 = 0x08,
    /// Command and transfer mode. Writing it issues the command.
    CmdTm = 0x0c,
    /// Response bits 31:0.
    Resp0 = 0x10,
    /// Response bits 63:32.
    Resp1 = 0x14,
    /// Response bits 95:64.
    Resp2 = 0x18,
    /// Response bits 127:96.
    Resp3 = 0x1c,
    /// Data FIFO.
    Data = 0x20,
    /// Present state.
    Status = 0x24,
    /// Host configuration.
    Control0 = 0x28,
    /// Clock and reset configuration.
    Control1 = 0x2c,
    /// Interrupt flags, write 1 to clear.
    Interrupt = 0x30,
    /// Interrupt flag enable.
    IrptMask = 0x34,
    /// Interrupt generation enable.
    IrptEn = 0x38,
    /// Slot interrupt status and host version.
    SlotIsrVer = 0xfc,
}

impl Reg {
    /// Byte offset of the register from the controller base.
    pub const fn offset(self) -> usize {
        self as usize
    }
}

/// Access to the 32-bit registers of one EMMC controller.
///
/// Accesses must reach the hardware in program order.
pub trait Registers {
    /// Read a register.
    fn read(&mut self, reg: Reg) -> u32;

    /// Write a register.
    fn write(&mut self, reg: Reg, value: u32);

    /// Read a register, change the value and write it back.
    fn modify<F>(&mut self, reg: Reg, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

impl<T> Registers for &mut T
where
    T: Registers,
{
    fn read(&mut self, reg: Reg) -> u32 {
        (*self).read(reg)
    }

    fn write(&mut self, reg: Reg, value: u32) {
        (*self).write(reg, value)
    }
}

/// Memory-mapped register block at a fixed physical address.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Create a register block for the controller at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be the address of an EMMC controller register block that
    /// is mapped for the lifetime of the returned value, and no other code
    /// may access that controller while it exists.
    pub const unsafe fn new(base: usize) -> Mmio {
        Mmio { base }
    }

    fn ptr(&self, reg: Reg) -> *mut u32 {
        (self.base + reg.offset()) as *mut u32
    }
}

impl Registers for Mmio {
    fn read(&mut self, reg: Reg) -> u32 {
        // Safety: the address is inside the register block handed to `new`.
        unsafe { core::ptr::read_volatile(self.ptr(reg)) }
    }

    fn write(&mut self, reg: Reg, value: u32) {
        // Safety: the address is inside the register block handed to `new`.
        unsafe { core::ptr::write_volatile(self.ptr(reg), value) }
    }
}

bitflags! {
    /// INTERRUPT, IRPT_MASK and IRPT_EN bits.
    pub struct Interrupt: u32 {
        const CMD_DONE     = 0x0000_0001;
        const DATA_DONE    = 0x0000_0002;
        const BLOCK_GAP    = 0x0000_0004;
        const WRITE_RDY    = 0x0000_0010;
        const READ_RDY     = 0x0000_0020;
        const CARD         = 0x0000_0100;
        const RETUNE       = 0x0000_1000;
        const BOOTACK      = 0x0000_2000;
        const ENDBOOT      = 0x0000_4000;
        const ERR          = 0x0000_8000;
        const CMD_TIMEOUT  = 0x0001_0000;
        const CRC_ERROR    = 0x0002_0000;
        const END_ERROR    = 0x0004_0000;
        const INDEX_ERROR  = 0x0008_0000;
        const DATA_TIMEOUT = 0x0010_0000;
        const DATA_CRC_ERR = 0x0020_0000;
        const DATA_END_ERR = 0x0040_0000;
        const AUTO_ERROR   = 0x0100_0000;

        /// Any of these ends a wait with a failure.
        const ERROR_MASK = Self::CRC_ERROR.bits
            | Self::END_ERROR.bits
            | Self::INDEX_ERROR.bits
            | Self::DATA_TIMEOUT.bits
            | Self::DATA_CRC_ERR.bits
            | Self::DATA_END_ERR.bits
            | Self::ERR.bits
            | Self::AUTO_ERROR.bits;
    }
}

bitflags! {
    /// STATUS (present state) bits.
    pub struct Status: u32 {
        const CMD_INHIBIT    = 0x0000_0001;
        const DAT_INHIBIT    = 0x0000_0002;
        const DAT_ACTIVE     = 0x0000_0004;
        const WRITE_TRANSFER = 0x0000_0100;
        const READ_TRANSFER  = 0x0000_0200;
        const WRITE_AVAILABLE = 0x0000_0400;
        const READ_AVAILABLE = 0x0000_0800;
        const WRITE_PROT     = 0x0008_0000;
        const DAT0           = 0x0010_0000;
        const DAT1           = 0x0020_0000;
        const DAT2           = 0x0040_0000;
        const DAT3           = 0x0080_0000;
        const CMD_LEVEL      = 0x0100_0000;
    }
}

bitflags! {
    /// CONTROL0 bits.
    pub struct Control0: u32 {
        const HCTL_DWIDTH = 0x0000_0002;
        const HCTL_HS_EN  = 0x0000_0004;
        const SPI_MODE_EN = 0x0010_0000;
    }
}

bitflags! {
    /// CONTROL1 bits.
    pub struct Control1: u32 {
        const CLK_INTLEN = 0x0000_0001;
        const CLK_STABLE = 0x0000_0002;
        const CLK_EN     = 0x0000_0004;
        const CLK_GENSEL = 0x0000_0020;
        /// Clock divider, bits 15:6.
        const CLK_FREQ   = 0x0000_ffc0;
        const TOUNIT_MAX = 0x000e_0000;
        const TOUNIT_DIS = 0x000f_0000;
        const SRST_HC    = 0x0100_0000;
        const SRST_CMD   = 0x0200_0000;
        const SRST_DATA  = 0x0400_0000;
    }
}

/// SLOTISR_VER: host controller specification version field.
pub const HOST_SPEC_NUM: u32 = 0x00ff_0000;
/// Shift of [`HOST_SPEC_NUM`].
pub const HOST_SPEC_NUM_SHIFT: u32 = 16;

/// Host controller specification version, as reported in SLOTISR_VER.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostVersion {
    /// SD host controller spec 1.00.
    V1,
    /// SD host controller spec 2.00.
    V2,
    /// SD host controller spec 3.00 or later.
    V3,
}

impl HostVersion {
    /// Decode the version from a raw SLOTISR_VER value.
    pub fn from_slotisr_ver(value: u32) -> HostVersion {
        match (value & HOST_SPEC_NUM) >> HOST_SPEC_NUM_SHIFT {
            0 => HostVersion::V1,
            1 => HostVersion::V2,
            _ => HostVersion::V3,
        }
    }
}
