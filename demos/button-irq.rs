//! Button interrupt example
//!
//! Every press of the user button B1 (PC13) toggles the user LED LD2 (PA5). The button
//! pulls the pin low, so EXTI line 13 triggers on the falling edge.
#![no_main]
#![no_std]

use core::cell::RefCell;
use cortex_m_rt::entry;
use critical_section::Mutex;
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f446_gpio::{
    board,
    exti::{CoreNvic, ExtiBlock, SyscfgBlock},
    gpio::PortBlock,
    pac::{self, interrupt},
};

static BUTTON_CTX: Mutex<RefCell<Option<(ExtiBlock, PortBlock)>>> =
    Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("-- STM32F446 button interrupt example --");

    let mut dp = pac::Peripherals::take().unwrap();
    let mut porta = PortBlock::gpioa(&mut dp.RCC, dp.GPIOA);
    let mut portc = PortBlock::gpioc(&mut dp.RCC, dp.GPIOC);
    let mut syscfg = SyscfgBlock::new(&mut dp.RCC, dp.SYSCFG);
    let mut exti = ExtiBlock::new(dp.EXTI);

    board::init_led(&mut porta).unwrap();
    // Make the controller state accessible from the IRQ handler with the Mutex dance
    // before the line is unmasked
    critical_section::with(|cs| {
        board::init_button(&mut portc, &mut exti, &mut syscfg, &mut CoreNvic).unwrap();
        BUTTON_CTX.borrow(cs).replace(Some((exti, porta)));
    });

    let mut counter: u32 = 0;
    loop {
        rprintln!("{}: waiting for button presses", counter);
        counter = counter.wrapping_add(1);
        cortex_m::asm::delay(80_000_000);
    }
}

#[interrupt]
fn EXTI15_10() {
    static mut PRESSES: u32 = 0;
    let result = critical_section::with(|cs| {
        let mut ctx = BUTTON_CTX.borrow(cs).borrow_mut();
        match ctx.as_mut() {
            Some((exti, led_port)) => board::on_button_irq(exti, led_port),
            None => Ok(()),
        }
    });
    match result {
        Ok(()) => {
            *PRESSES += 1;
            rprintln!("{}: button pressed", PRESSES);
        }
        Err(e) => rprintln!("button IRQ failed: {}", e),
    }
}
