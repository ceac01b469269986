//! Test image
//!
//! Runs one of the hardware test cases below. Most cases need two pins tied together,
//! the required wiring is printed over RTT before the test starts.
#![no_main]
#![no_std]

use cortex_m_rt::entry;
use embedded_hal::digital::v2::{InputPin, OutputPin, ToggleableOutputPin};
use panic_rtt_target as _;
use rtt_target::{rprintln, rtt_init_print};
use stm32f446_gpio::{
    board,
    exti::{self, Edge, ExtiBlock, SyscfgBlock},
    gpio::{self, AltFunction, DynPin, Mode, PinConfig, PinError, Port, PortBlock, Pull},
    pac,
};

#[allow(dead_code)]
#[derive(Debug)]
enum TestCase {
    // Tie PA0 to PA1 for these tests!
    TestBasic,
    TestPullup,
    TestPulldown,
    // Tie PA0 to PA1 for this test, the edge is detected on EXTI line 1
    TestEdge,
    // No wiring required
    InvalidPin,
    AlternateReadback,
}

#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("-- STM32F446 GPIO Test Application --");
    let mut dp = pac::Peripherals::take().unwrap();
    let porta = PortBlock::gpioa(&mut dp.RCC, dp.GPIOA);
    let test_case = TestCase::TestBasic;

    match test_case {
        TestCase::TestBasic
        | TestCase::TestPulldown
        | TestCase::TestPullup
        | TestCase::TestEdge => {
            rprintln!("Test case {:?}. Make sure to tie PA0 to PA1", test_case);
        }
        _ => {
            rprintln!("Test case {:?}", test_case);
        }
    }
    match test_case {
        TestCase::TestBasic => {
            let mut out = DynPin::new(porta, PinConfig::output(0)).unwrap();
            let input = DynPin::new(porta, PinConfig::input(1, Pull::None)).unwrap();
            out.set_high().unwrap();
            assert!(input.is_high().unwrap());
            out.set_low().unwrap();
            assert!(input.is_low().unwrap());
            out.toggle().unwrap();
            assert!(input.is_high().unwrap());
        }
        TestCase::TestPullup => {
            let input = DynPin::new(porta, PinConfig::input(1, Pull::Up)).unwrap();
            assert!(input.is_high().unwrap());
            let mut out = DynPin::new(porta, PinConfig::output(0)).unwrap();
            out.set_low().unwrap();
            assert!(input.is_low().unwrap());
            out.set_high().unwrap();
            assert!(input.is_high().unwrap());
            out.into_floating_input();
            assert!(input.is_high().unwrap());
        }
        TestCase::TestPulldown => {
            let input = DynPin::new(porta, PinConfig::input(1, Pull::Down)).unwrap();
            assert!(input.is_low().unwrap());
            let mut out = DynPin::new(porta, PinConfig::output(0)).unwrap();
            out.set_high().unwrap();
            assert!(input.is_high().unwrap());
            out.set_low().unwrap();
            assert!(input.is_low().unwrap());
            out.into_floating_input();
            assert!(input.is_low().unwrap());
        }
        TestCase::TestEdge => {
            let mut syscfg = SyscfgBlock::new(&mut dp.RCC, dp.SYSCFG);
            let mut exti = ExtiBlock::new(dp.EXTI);
            let mut out = DynPin::new(porta, PinConfig::output(0)).unwrap();
            DynPin::new(porta, PinConfig::input(1, Pull::None)).unwrap();
            out.set_low().unwrap();
            exti::select_source(&mut syscfg, Port::A, 1).unwrap();
            exti::configure_interrupt(&mut exti, 1, Edge::Rising).unwrap();
            // Pending bits are latched for unmasked lines only. The NVIC vector stays masked,
            // the pending bit is polled.
            exti::enable_interrupt(&mut exti, &mut NoNvic, 1, pac::Interrupt::EXTI1).unwrap();
            assert_eq!(exti::is_pending(&exti, 1), Ok(false));
            out.set_high().unwrap();
            assert_eq!(exti::is_pending(&exti, 1), Ok(true));
            exti::clear_interrupt(&mut exti, 1).unwrap();
            assert_eq!(exti::is_pending(&exti, 1), Ok(false));
            out.set_low().unwrap();
            assert_eq!(exti::is_pending(&exti, 1), Ok(false));
            exti::disable_interrupt(&mut exti, 1).unwrap();
        }
        TestCase::InvalidPin => {
            let mut porta = porta;
            assert_eq!(
                gpio::configure(&mut porta, &PinConfig::output(16)),
                Err(PinError::InvalidPin(16))
            );
            assert_eq!(gpio::write(&mut porta, 255, true), Err(PinError::InvalidPin(255)));
            assert_eq!(exti::line_interrupt(16), Err(PinError::InvalidPin(16)));
        }
        TestCase::AlternateReadback => {
            let mut porta = porta;
            // PA2 as USART2_TX
            let cfg = PinConfig::new(2).alternate(AltFunction::new(7).unwrap());
            gpio::configure(&mut porta, &cfg).unwrap();
            let readback = gpio::read_config(&porta, 2).unwrap();
            assert_eq!(readback.mode, Mode::Alternate);
            assert_eq!(readback, cfg);
        }
    }

    rprintln!("Test success");
    let mut led = board::init_led(porta).unwrap();
    loop {
        led.toggle();
        cortex_m::asm::delay(4_000_000);
    }
}

/// Leaves every vector masked
struct NoNvic;

impl exti::InterruptController<pac::Interrupt> for NoNvic {
    fn unmask(&mut self, _irq: pac::Interrupt) {}

    fn mask(&mut self, _irq: pac::Interrupt) {}
}
