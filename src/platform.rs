//! emmc-sdhc - Services the driver borrows from the platform

use embedded_hal::blocking::delay::DelayUs;

/// A microsecond busy-wait plus a free-running 1 MHz tick counter.
///
/// The counter may wrap; the driver only ever looks at differences.
pub trait Clock: DelayUs<u32> {
    /// Current value of the 1 MHz tick counter.
    fn ticks(&mut self) -> u32;
}

/// Board support the EMMC controller depends on.
pub trait Board {
    /// Error returned by the platform when querying the base clock.
    type Error: core::fmt::Debug;

    /// Route `pin` to the EMMC controller (alternate function 3 on a
    /// BCM2835) and enable its pull-up.
    fn configure_emmc_pin(&mut self, pin: u8);

    /// The frequency of the clock feeding the EMMC controller, in Hz.
    fn base_clock_hz(&mut self) -> Result<u32, Self::Error>;
}

/// GPIO pins wired to the card slot: DAT3, DAT2, DAT1, DAT0, CMD, CLK.
pub const EMMC_PINS: [u8; 6] = [53, 52, 51, 50, 49, 48];
