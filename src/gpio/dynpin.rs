//! # Value-level GPIO pins
//!
//! A [`DynPin`] bundles a port register file with a validated [`PinNumber`] and tracks the
//! [`PinConfig`] last applied to it. Because the pin number is checked once at
//! construction, the level accessors cannot fail and the embedded HAL traits use
//! `Error = core::convert::Infallible`.
//!
//! ```ignore
//! use stm32f446_gpio::gpio::{DynPin, PinConfig, PortBlock};
//! use stm32f446_gpio::pac;
//! use embedded_hal::digital::v2::OutputPin;
//!
//! let mut dp = pac::Peripherals::take().unwrap();
//! let porta = PortBlock::gpioa(&mut dp.RCC, dp.GPIOA);
//! let mut pa5 = DynPin::new(porta, PinConfig::output(5)).unwrap();
//! pa5.set_high().ok();
//! ```
//!
//! # Embedded HAL traits
//!
//! [`DynPin`] implements [`InputPin`], [`OutputPin`], [`StatefulOutputPin`] and
//! [`ToggleableOutputPin`]. Mode checks are not performed: the hardware allows reading the
//! pad of an output pin, and writing the output register of an input pin only takes effect
//! once the pin is switched to output.
use super::config::{AltFunction, Mode, PinConfig, PinError, PinNumber, Pull};
use super::port;
use super::reg::PortInterface;
use core::convert::Infallible;
use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

//==================================================================================================
//  DynPin
//==================================================================================================

/// A value-level pin on the port register file `P`
pub struct DynPin<P: PortInterface> {
    port: P,
    pin: PinNumber,
    config: PinConfig,
}

impl<P: PortInterface> DynPin<P> {
    /// Configure a pin and take control over it
    ///
    /// Returns [`PinError::InvalidPin`] without touching the port if `config.pin_number`
    /// is larger than 15.
    pub fn new(mut port: P, config: PinConfig) -> Result<Self, PinError> {
        let pin = PinNumber::new(config.pin_number)?;
        port::configure(&mut port, &config)?;
        Ok(DynPin { port, pin, config })
    }

    /// Return the pin number
    #[inline]
    pub fn id(&self) -> PinNumber {
        self.pin
    }

    /// Return a copy of the configuration applied last
    #[inline]
    pub fn config(&self) -> PinConfig {
        self.config
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    /// Apply a new configuration to this pin. The pin number of `config` is ignored.
    pub fn reconfigure(&mut self, config: PinConfig) {
        let config = PinConfig {
            pin_number: self.pin.num(),
            ..config
        };
        // Only modify registers if we are actually changing the configuration
        if config != self.config {
            // Cannot fail, the pin number was validated in the constructor
            port::configure(&mut self.port, &config).ok();
            self.config = config;
        }
    }

    #[inline]
    pub fn into_push_pull_output(&mut self) {
        self.reconfigure(PinConfig::output(self.pin.num()));
    }

    #[inline]
    pub fn into_floating_input(&mut self) {
        self.reconfigure(PinConfig::input(self.pin.num(), Pull::None));
    }

    #[inline]
    pub fn into_pull_up_input(&mut self) {
        self.reconfigure(PinConfig::input(self.pin.num(), Pull::Up));
    }

    #[inline]
    pub fn into_pull_down_input(&mut self) {
        self.reconfigure(PinConfig::input(self.pin.num(), Pull::Down));
    }

    #[inline]
    pub fn into_analog(&mut self) {
        self.reconfigure(PinConfig::new(self.pin.num()).mode(Mode::Analog));
    }

    /// Route the pin to a peripheral. Output type, pull and speed are kept.
    #[inline]
    pub fn into_alternate(&mut self, function: AltFunction) {
        self.reconfigure(self.config.alternate(function));
    }

    /// Release the port register file
    pub fn release(self) -> P {
        self.port
    }

    #[inline]
    pub(crate) fn _is_high(&self) -> bool {
        self.port.read(super::PortReg::Idr) & self.pin.mask() != 0
    }

    #[inline]
    pub(crate) fn _is_set_high(&self) -> bool {
        self.port.read(super::PortReg::Odr) & self.pin.mask() != 0
    }

    #[inline]
    pub(crate) fn _write(&mut self, level: bool) {
        port::write(&mut self.port, self.pin.num(), level).ok();
    }

    #[inline]
    pub(crate) fn _toggle(&mut self) {
        port::toggle(&mut self.port, self.pin.num()).ok();
    }
}

//==================================================================================================
// Embedded HAL traits
//==================================================================================================

impl<P: PortInterface> OutputPin for DynPin<P> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self._write(true);
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self._write(false);
        Ok(())
    }
}

impl<P: PortInterface> StatefulOutputPin for DynPin<P> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(self._is_set_high())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Infallible> {
        Ok(!self._is_set_high())
    }
}

impl<P: PortInterface> ToggleableOutputPin for DynPin<P> {
    type Error = Infallible;

    #[inline]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self._toggle();
        Ok(())
    }
}

impl<P: PortInterface> InputPin for DynPin<P> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self._is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self._is_high())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::PortReg;
    use crate::sim::SimPort;

    #[test]
    fn new_rejects_invalid_pin() {
        let mut port = SimPort::default();
        let res = DynPin::new(&mut port, PinConfig::output(16));
        assert!(matches!(res, Err(PinError::InvalidPin(16))));
        assert_eq!(port.total_writes(), 0);
    }

    #[test]
    fn output_pin_traits() {
        let mut port = SimPort::loopback();
        let mut pin = DynPin::new(&mut port, PinConfig::output(6)).unwrap();
        assert_eq!(pin.mode(), Mode::Output);
        pin.set_high().unwrap();
        assert!(pin.is_set_high().unwrap());
        assert!(pin.is_high().unwrap());
        pin.toggle().unwrap();
        assert!(pin.is_set_low().unwrap());
        assert!(pin.is_low().unwrap());
        let port = pin.release();
        assert_eq!(port.peek(PortReg::Moder), 0b01 << 12);
    }

    #[test]
    fn reconfigure_skips_identical_config() {
        let mut port = SimPort::default();
        let mut pin = DynPin::new(&mut port, PinConfig::new(2)).unwrap();
        pin.into_floating_input();
        pin.into_pull_up_input();
        let port = pin.release();
        // Constructor: 4 fields, pull-up change: 4 fields, floating input: none
        assert_eq!(port.total_writes(), 8);
        assert_eq!(port.peek(PortReg::Pupdr), 0b01 << 4);
    }

    #[test]
    fn into_alternate_keeps_electrical_settings() {
        let mut port = SimPort::default();
        let cfg = PinConfig::output(3).output_type(crate::gpio::OutputType::OpenDrain);
        let mut pin = DynPin::new(&mut port, cfg).unwrap();
        pin.into_alternate(AltFunction::new(4).unwrap());
        assert_eq!(pin.mode(), Mode::Alternate);
        assert_eq!(
            pin.config().output_type,
            crate::gpio::OutputType::OpenDrain
        );
        let port = pin.release();
        assert_eq!(port.peek(PortReg::Afrl), 4 << 12);
        assert_eq!(port.peek(PortReg::Moder), 0b10 << 6);
    }
}
