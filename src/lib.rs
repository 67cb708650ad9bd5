#![cfg_attr(not(test), no_std)]

//! Coordinates the MAX77818 fuel gauge and charger.
//!
//! The fuel gauge tracks the battery temperature band and publishes charge
//! mode codes on a [`bus::ModeBus`]. The charger subscribes to the bus and
//! writes the codes into its mode register. A sustained critical temperature
//! arms a [`shutdown::ShutdownTimer`].

#[macro_use]
extern crate logger;

pub mod bus;
pub mod charger;
pub mod config;
pub mod fuel_gauge;
pub mod shutdown;
pub mod system;
pub mod thermal;

pub use max77818;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqResult {
    Handled,
    NotHandled,
}
