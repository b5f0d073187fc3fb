//! emmc-sdhc - SD card driver for the EMMC host controller
//!
//! Implements the SD protocol on a memory-mapped EMMC controller, polling
//! the interrupt register instead of taking interrupts.
//!
//! This is currently optimised for readability and debugability, not
//! performance.

mod card;
mod clock;
mod command;
mod init;
pub mod proto;
pub mod regs;
mod transfer;
pub mod wait;


pub use card::{CardState, CardType, Cid, Csd, FileFormat, Scr, Support};
pub use clock::{clock_divisor, divider_bits};
pub use proto::CurrentState;
pub use regs::{HostVersion, Mmio, Registers, BCM2835_EMMC_BASE};
pub use transfer::DataBuffer;

use crate::platform::{Board, Clock};

/// The possible errors `Emmc` can generate.
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// The card reported an error, or rejected what we asked for
    Failed,
    /// We didn't get a response in time
    Timeout,
    /// The command or data line stayed busy
    Busy,
    /// The card has not been initialized
    NoResponse,
    /// The host controller didn't come out of reset
    Reset,
    /// The SD clock didn't stabilise
    Clock,
    /// The card accepts none of the voltages we offer
    Voltage,
    /// The card didn't accept an application command
    AppCmd,
}

/// An SD card behind an EMMC host controller.
///
/// Built from the controller's registers, a clock for busy-waiting and the
/// board support that knows about pins and clock rates. The driver keeps one
/// command in flight at most; `&mut self` everywhere keeps it that way.
pub struct Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    regs: R,
    clock: C,
    board: B,
    host_version: HostVersion,
    base_clock_hz: u32,
    card: CardState,
}

impl<R, C, B> Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    /// Create a driver. Nothing is touched until [`Emmc::initialize`].
    pub fn new(regs: R, clock: C, board: B) -> Self {
        Emmc {
            regs,
            clock,
            board,
            host_version: HostVersion::V1,
            base_clock_hz: 0,
            card: CardState::default(),
        }
    }

    /// What we know about the card.
    pub fn card(&self) -> &CardState {
        &self.card
    }

    /// Whether [`Emmc::initialize`] has completed.
    pub fn is_initialized(&self) -> bool {
        self.card.init
    }

    /// Host controller version read during initialization.
    pub fn host_version(&self) -> HostVersion {
        self.host_version
    }

    /// Forget the card. A later transfer fails until the card is
    /// initialized again.
    pub fn deinitialize(&mut self) {
        self.card = CardState::default();
    }

    /// Give back the parts the driver was built from.
    pub fn free(self) -> (R, C, B) {
        (self.regs, self.clock, self.board)
    }
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
