//! # emmc-sdhc
//!
//! > An SD/SDHC/SDXC card driver for the BCM2835 EMMC controller, written in
//! > Embedded Rust
//!
//! This crate drives an SD card through the EMMC host controller found on the
//! Raspberry Pi, polling the controller's registers rather than taking
//! interrupts. It is `#![no_std]` and does not use `alloc`. In the first
//! instance it is designed for readability and simplicity over performance.
//!
//! ## Using the crate
//!
//! You need three things: access to the controller registers (normally
//! [`Mmio`] at [`emmc::BCM2835_EMMC_BASE`]), something that implements
//! [`platform::Clock`] for busy-waiting, and something that implements
//! [`platform::Board`] for pin routing and the controller's base clock.
//!
//! ```rust,ignore
//! let regs = unsafe { emmc_sdhc::Mmio::new(emmc_sdhc::emmc::BCM2835_EMMC_BASE) };
//! let mut card = emmc_sdhc::Emmc::new(regs, timer, board);
//! match card.initialize() {
//!     Ok(()) => {
//!         let mut buffer = [0u8; 1024];
//!         card.read_blocks(0, 2, &mut buffer).unwrap();
//!         writeln!(uart, "{} bytes", card.card().capacity).unwrap();
//!     }
//!     Err(e) => writeln!(uart, "{:?}!", e).unwrap(),
//! }
//! ```
//!
//! The driver also implements [`BlockDevice`], so it can sit under anything
//! that reads and writes 512-byte blocks.
//!
//! ## Features
//!
//! * `defmt-log`: By turning off the default features and enabling the `defmt-log` feature you can
//! configure this crate to log messages over defmt instead.
//!
//! Make sure that either the `log` feature or the `defmt-log` feature is enabled.

#![cfg_attr(not(test), no_std)]
// #![deny(missing_docs)]

// ****************************************************************************
//
// Imports
//
// ****************************************************************************

#[cfg(test)]
mod test;

#[macro_use]
mod structure;

pub mod block_device;
pub mod emmc;
pub mod platform;

pub use crate::block_device::{Block, BlockCount, BlockDevice, BlockIdx};
pub use crate::emmc::DataBuffer;
pub use crate::emmc::Emmc;
pub use crate::emmc::Error as EmmcError;
pub use crate::emmc::Mmio;

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
