#![cfg_attr(not(test), no_std)]
//! GPIO and external interrupt driver for the STM32F446
//!
//! - [`gpio`]: pin configuration and level access
//! - [`exti`]: edge triggered interrupts on GPIO pins
//! - [`clock`]: peripheral clock gating of the GPIO ports and SYSCFG
//! - [`led`] and [`board`]: NUCLEO-F446RE user LED and button
//! - [`sim`]: hosted simulation of the register files

pub use stm32f4::stm32f446 as pac;

pub mod board;
pub mod clock;
pub mod exti;
pub mod gpio;
pub mod led;
pub mod prelude;
pub mod sim;
