//! On-board LED driven by an output pin
use crate::gpio::{self, DynPin, PinConfig, PinError, PortInterface, Pull, Speed};

/// LED on a push-pull output. Driving the pin high switches the LED on.
pub struct Led<P: PortInterface> {
    pin: DynPin<P>,
}

impl<P: PortInterface> Led<P> {
    /// Configure `pin` of `port` as push-pull output without pull resistor at low speed.
    /// The LED starts off.
    pub fn new(mut port: P, pin: u8) -> Result<Self, PinError> {
        // Drive the output register low before the pin starts driving the pad
        gpio::write(&mut port, pin, false)?;
        let config = PinConfig::output(pin).pull(Pull::None).speed(Speed::Low);
        Ok(Led {
            pin: DynPin::new(port, config)?,
        })
    }

    #[inline]
    pub fn on(&mut self) {
        self.pin._write(true);
    }

    #[inline]
    pub fn off(&mut self) {
        self.pin._write(false);
    }

    #[inline]
    pub fn set(&mut self, on: bool) {
        self.pin._write(on);
    }

    /// Invert the LED state based on the pad level
    #[inline]
    pub fn toggle(&mut self) {
        self.pin._toggle();
    }

    /// Pad level of the LED pin
    #[inline]
    pub fn is_on(&self) -> bool {
        self.pin._is_high()
    }

    pub fn release(self) -> DynPin<P> {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::{Mode, OutputType, PortReg};
    use crate::sim::SimPort;

    #[test]
    fn init_configures_output() {
        let mut port = SimPort::default();
        port.preset(PortReg::Ospeedr, 0b11 << 10);
        port.preset(PortReg::Odr, (1 << 5) | (1 << 4));
        let led = Led::new(&mut port, 5).unwrap();
        let cfg = led.release().config();
        assert_eq!(cfg.mode, Mode::Output);
        assert_eq!(cfg.output_type, OutputType::PushPull);
        assert_eq!(port.peek(PortReg::Moder), 0b01 << 10);
        assert_eq!(port.peek(PortReg::Ospeedr), 0);
        assert_eq!(port.peek(PortReg::Odr), 1 << 4);
    }

    /// Port which remembers the output register at the first write to MODER
    #[derive(Default)]
    struct OdrAtModeChange {
        inner: SimPort,
        odr: Option<u32>,
    }

    unsafe impl PortInterface for OdrAtModeChange {
        fn read(&self, reg: PortReg) -> u32 {
            self.inner.read(reg)
        }

        fn write(&mut self, reg: PortReg, bits: u32) {
            if reg == PortReg::Moder && self.odr.is_none() {
                self.odr = Some(self.inner.read(PortReg::Odr));
            }
            self.inner.write(reg, bits);
        }
    }

    #[test]
    fn output_is_low_before_pin_drives() {
        let mut port = OdrAtModeChange::default();
        port.inner.preset(PortReg::Odr, 1 << 5);
        let led = Led::new(&mut port, 5).unwrap();
        assert!(!led.is_on());
        drop(led);
        assert_eq!(port.odr, Some(0));
        assert_eq!(port.inner.peek(PortReg::Moder), 0b01 << 10);
    }

    #[test]
    fn on_off_toggle() {
        let mut port = SimPort::default();
        let mut led = Led::new(&mut port, 5).unwrap();
        assert!(!led.is_on());
        led.on();
        assert!(led.is_on());
        led.toggle();
        assert!(!led.is_on());
        led.set(true);
        assert!(led.is_on());
        led.off();
        assert!(!led.is_on());
        led.toggle();
        drop(led);
        assert_eq!(port.peek(PortReg::Odr), 1 << 5);
    }

    #[test]
    fn invalid_pin() {
        let mut port = SimPort::default();
        assert!(matches!(
            Led::new(&mut port, 16),
            Err(PinError::InvalidPin(16))
        ));
        assert_eq!(port.total_writes(), 0);
    }
}
