//! Simple blinky example
//!
//! Blinks the user LED LD2 of the NUCLEO-F446RE. The core runs from the 16 MHz HSI after
//! reset, so the busy wait below is roughly 250 ms.
#![no_main]
#![no_std]

use cortex_m_rt::entry;
use panic_halt as _;
use stm32f446_gpio::{board, gpio::PortBlock, pac};

#[entry]
fn main() -> ! {
    let mut dp = pac::Peripherals::take().unwrap();
    let porta = PortBlock::gpioa(&mut dp.RCC, dp.GPIOA);
    let mut led = board::init_led(porta).unwrap();
    for _ in 0..10 {
        led.on();
        cortex_m::asm::delay(4_000_000);
        led.off();
        cortex_m::asm::delay(4_000_000);
    }
    loop {
        led.toggle();
        cortex_m::asm::delay(4_000_000);
    }
}
