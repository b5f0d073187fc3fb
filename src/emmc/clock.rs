//! emmc-sdhc - SD clock control

use super::regs::{Control1, HostVersion, Reg, Registers, Status};
use super::wait::Delay;
use super::{Emmc, Error};
use crate::platform::{Board, Clock};

#[cfg(feature = "log")]
use log::debug;

#[cfg(feature = "defmt-log")]
use defmt::debug;

/// Largest power-of-two shift a version 1 or 2 host can express.
const MAX_SHIFT: u32 = 7;

/// The divisor that brings `base_hz` down to no more than about `freq_hz`.
///
/// Hosts up to version 2 only divide by powers of two; version 3 hosts take
/// any divisor. Divisors below 2 are never used.
pub fn clock_divisor(version: HostVersion, base_hz: u32, freq_hz: u32) -> u32 {
    let closest = base_hz / freq_hz.max(1);
    let divisor = if version > HostVersion::V2 {
        closest
    } else {
        let shift = match closest.saturating_sub(1) {
            0 => 0,
            x => (31 - x.leading_zeros()).min(MAX_SHIFT),
        };
        1 << shift
    };
    divisor.max(2)
}

/// The divisor encoded for CONTROL1 bits 15:6.
pub fn divider_bits(version: HostVersion, divisor: u32) -> u32 {
    let hi = if version > HostVersion::V2 {
        (divisor & 0x300) >> 2
    } else {
        0
    };
    let lo = divisor & 0xff;
    (lo << 8) | hi
}

impl<R, C, B> Emmc<R, C, B>
where
    R: Registers,
    C: Clock,
    B: Board,
{
    /// Switch the SD clock to `freq_hz`, or the closest rate below it the
    /// host can produce.
    pub(crate) fn set_clock(&mut self, freq_hz: u32) -> Result<(), Error> {
        let inhibit = (Status::CMD_INHIBIT | Status::DAT_INHIBIT).bits();
        let mut delay = Delay::new(100_000, 1);
        while self.regs.read(Reg::Status) & inhibit != 0 {
            delay.delay(&mut self.clock, Error::Clock)?;
        }

        self.regs.modify(Reg::Control1, |v| v & !Control1::CLK_EN.bits());
        self.clock.delay_us(10);

        let divisor = clock_divisor(self.host_version, self.base_clock_hz, freq_hz);
        debug!(
            "Clock {} Hz from {} Hz, divisor {}",
            freq_hz, self.base_clock_hz, divisor
        );
        let bits = divider_bits(self.host_version, divisor);
        self.regs
            .modify(Reg::Control1, |v| (v & !Control1::CLK_FREQ.bits()) | bits);
        self.clock.delay_us(10);

        self.regs.modify(Reg::Control1, |v| v | Control1::CLK_EN.bits());
        self.clock.delay_us(10);

        let mut delay = Delay::new(100_000, 10);
        while self.regs.read(Reg::Control1) & Control1::CLK_STABLE.bits() == 0 {
            delay.delay(&mut self.clock, Error::Clock)?;
        }
        Ok(())
    }
}
