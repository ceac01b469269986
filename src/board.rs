//! # NUCLEO-F446RE board support
//!
//! The user LED LD2 is connected to PA5 and driven active-high. The user button B1 is
//! connected to PC13, has an external pull-up and pulls the pin low while pressed.
use crate::exti::{self, Edge, ExtiInterface, InterruptController, SyscfgInterface};
use crate::gpio::{self, PinConfig, PinError, Port, PortInterface, Pull};
use crate::led::Led;
use crate::pac::Interrupt;

pub const LED_PORT: Port = Port::A;
pub const LED_PIN: u8 = 5;

pub const BUTTON_PORT: Port = Port::C;
pub const BUTTON_PIN: u8 = 13;
/// Interrupt vector of EXTI line 13
pub const BUTTON_IRQ: Interrupt = Interrupt::EXTI15_10;
/// Pressing the button produces a falling edge
pub const BUTTON_EDGE: Edge = Edge::Falling;

/// Set up the user LED on the port register file of GPIOA
#[inline]
pub fn init_led<P: PortInterface>(port: P) -> Result<Led<P>, PinError> {
    Led::new(port, LED_PIN)
}

/// Set up the user button as interrupt source
///
/// The pin becomes a floating input, EXTI line 13 is routed to port C, triggers on the
/// falling edge and is unmasked together with [`BUTTON_IRQ`].
pub fn init_button(
    port: &mut impl PortInterface,
    exti: &mut impl ExtiInterface,
    syscfg: &mut impl SyscfgInterface,
    nvic: &mut impl InterruptController<Interrupt>,
) -> Result<(), PinError> {
    gpio::configure(port, &PinConfig::input(BUTTON_PIN, Pull::None))?;
    exti::select_source(syscfg, BUTTON_PORT, BUTTON_PIN)?;
    exti::configure_interrupt(exti, BUTTON_PIN, BUTTON_EDGE)?;
    exti::enable_interrupt(exti, nvic, BUTTON_PIN, BUTTON_IRQ)
}

/// Body of the button interrupt handler: acknowledge the line, then toggle the LED
pub fn on_button_irq(
    exti: &mut impl ExtiInterface,
    led_port: &mut impl PortInterface,
) -> Result<(), PinError> {
    exti::clear_interrupt(exti, BUTTON_PIN)?;
    gpio::toggle(led_port, LED_PIN)
}
