//! # Pin configurator
//!
//! Free functions which apply pin configurations and access pin levels on any
//! [`PortInterface`]. Each function validates the pin number before the first register
//! access, so an invalid pin never causes a write.
//!
//! Field updates clear the field of the target pin before inserting the new value. A
//! configuration is therefore authoritative: re-applying [`Mode::Input`] to a former output
//! pin really clears its mode bits, and bits of other pins are never disturbed.
use super::config::{AltFunction, Mode, OutputType, PinConfig, PinError, PinNumber, Pull, Speed};
use super::reg::{BitField, FieldWidth, PortInterface, PortReg};

/// Apply `config` to the pin `config.pin_number` of `port`
///
/// The mode, output type, output speed and pull fields are always written. The alternate
/// function register is only written when the mode is [`Mode::Alternate`].
pub fn configure(port: &mut impl PortInterface, config: &PinConfig) -> Result<(), PinError> {
    let pin = PinNumber::new(config.pin_number)?;
    let two_bits = BitField::for_pin(pin, FieldWidth::Two);
    port.write_field(PortReg::Moder, two_bits, config.mode.bits());
    port.write_field(
        PortReg::Otyper,
        BitField::for_pin(pin, FieldWidth::One),
        config.output_type.bits(),
    );
    port.write_field(PortReg::Ospeedr, two_bits, config.output_speed.bits());
    port.write_field(PortReg::Pupdr, two_bits, config.pull.bits());
    if config.mode == Mode::Alternate {
        alternate_function(port, pin, config.alternate_function);
    }
    Ok(())
}

/// Select one of the sixteen alternate functions for a pin
///
/// Pins 0 to 7 use AFRL, pins 8 to 15 use AFRH. The function is written into the 4-bit
/// field at `4 * (pin % 8)`.
pub fn set_alternate_function(
    port: &mut impl PortInterface,
    pin: u8,
    function: AltFunction,
) -> Result<(), PinError> {
    let pin = PinNumber::new(pin)?;
    alternate_function(port, pin, function);
    Ok(())
}

#[inline]
fn alternate_function(port: &mut impl PortInterface, pin: PinNumber, function: AltFunction) {
    let reg = if pin.num() <= 7 {
        PortReg::Afrl
    } else {
        PortReg::Afrh
    };
    port.write_field(reg, BitField::for_pin(pin, FieldWidth::Four), function.bits());
}

/// Read the input level of a pin
#[inline]
pub fn read(port: &impl PortInterface, pin: u8) -> Result<bool, PinError> {
    let pin = PinNumber::new(pin)?;
    Ok(port.read(PortReg::Idr) & pin.mask() != 0)
}

/// Drive a pin high (`true`) or low (`false`) through the output data register
#[inline]
pub fn write(port: &mut impl PortInterface, pin: u8, level: bool) -> Result<(), PinError> {
    let pin = PinNumber::new(pin)?;
    if level {
        port.set_bits(PortReg::Odr, pin.mask());
    } else {
        port.clear_bits(PortReg::Odr, pin.mask());
    }
    Ok(())
}

/// Invert the pin level
///
/// The current level is taken from the input data register, which mirrors the pad of an
/// output pin. The inverse is written back to the output data register.
pub fn toggle(port: &mut impl PortInterface, pin: u8) -> Result<(), PinError> {
    let high = read(&*port, pin)?;
    write(port, pin, !high)
}

/// Level currently driven by the output data register for a pin
#[inline]
pub fn output_level(port: &impl PortInterface, pin: u8) -> Result<bool, PinError> {
    let pin = PinNumber::new(pin)?;
    Ok(port.read(PortReg::Odr) & pin.mask() != 0)
}

/// Decode the current configuration of a pin from the registers
///
/// Returns [`PinError::InvalidFieldValue`] if the pull register holds the reserved
/// encoding `0b11`.
pub fn read_config(port: &impl PortInterface, pin: u8) -> Result<PinConfig, PinError> {
    let num = PinNumber::new(pin)?;
    let two_bits = BitField::for_pin(num, FieldWidth::Two);
    let af_reg = if num.num() <= 7 {
        PortReg::Afrl
    } else {
        PortReg::Afrh
    };
    Ok(PinConfig {
        pin_number: pin,
        mode: Mode::try_from(port.read_field(PortReg::Moder, two_bits))?,
        output_type: OutputType::try_from(
            port.read_field(PortReg::Otyper, BitField::for_pin(num, FieldWidth::One)),
        )?,
        pull: Pull::try_from(port.read_field(PortReg::Pupdr, two_bits))?,
        output_speed: Speed::try_from(port.read_field(PortReg::Ospeedr, two_bits))?,
        alternate_function: AltFunction::try_from(
            port.read_field(af_reg, BitField::for_pin(num, FieldWidth::Four)),
        )?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpio::FieldKind;
    use crate::sim::SimPort;

    #[test]
    fn configure_touches_only_target_fields() {
        let mut port = SimPort::default();
        port.preset(PortReg::Moder, 0xaaaa_aaaa);
        port.preset(PortReg::Pupdr, 0x5555_5555);
        let cfg = PinConfig::output(4).pull(Pull::None).speed(Speed::Fast);
        configure(&mut port, &cfg).unwrap();
        assert_eq!(port.peek(PortReg::Moder), (0xaaaa_aaaa & !(0b11 << 8)) | (0b01 << 8));
        assert_eq!(port.peek(PortReg::Pupdr), 0x5555_5555 & !(0b11 << 8));
        assert_eq!(port.peek(PortReg::Ospeedr), 0b10 << 8);
        assert_eq!(port.peek(PortReg::Otyper), 0);
        // Not an alternate function pin
        assert_eq!(port.writes_to(PortReg::Afrl), 0);
    }

    #[test]
    fn configure_back_to_input_clears_mode() {
        let mut port = SimPort::default();
        configure(&mut port, &PinConfig::new(9).mode(Mode::Analog)).unwrap();
        assert_eq!(port.peek(PortReg::Moder), 0b11 << 18);
        configure(&mut port, &PinConfig::new(9)).unwrap();
        assert_eq!(port.peek(PortReg::Moder), 0);
    }

    #[test]
    fn configure_alternate_writes_af() {
        let mut port = SimPort::default();
        let af7 = AltFunction::new(7).unwrap();
        configure(
            &mut port,
            &PinConfig::new(10)
                .alternate(af7)
                .output_type(OutputType::OpenDrain),
        )
        .unwrap();
        assert_eq!(port.peek(PortReg::Moder), 0b10 << 20);
        assert_eq!(port.peek(PortReg::Otyper), 1 << 10);
        assert_eq!(port.peek(PortReg::Afrh), 7 << 8);
        assert_eq!(port.peek(PortReg::Afrl), 0);
    }

    #[test]
    fn alternate_function_register_split() {
        let mut port = SimPort::default();
        let af = AltFunction::new(0xf).unwrap();
        set_alternate_function(&mut port, 7, af).unwrap();
        assert_eq!(port.peek(PortReg::Afrl), 0xf << 28);
        assert_eq!(port.peek(PortReg::Afrh), 0);
        set_alternate_function(&mut port, 8, af).unwrap();
        assert_eq!(port.peek(PortReg::Afrh), 0xf);
        // Overwrite, not OR
        set_alternate_function(&mut port, 8, AltFunction::new(0b0101).unwrap()).unwrap();
        assert_eq!(port.peek(PortReg::Afrh), 0b0101);
    }

    #[test]
    fn write_sets_and_clears_single_bit() {
        let mut port = SimPort::default();
        port.preset(PortReg::Odr, 0x8001);
        write(&mut port, 3, true).unwrap();
        assert_eq!(port.peek(PortReg::Odr), 0x8009);
        write(&mut port, 3, true).unwrap();
        assert_eq!(port.peek(PortReg::Odr), 0x8009);
        write(&mut port, 15, false).unwrap();
        assert_eq!(port.peek(PortReg::Odr), 0x0009);
        assert_eq!(output_level(&port, 0), Ok(true));
        assert_eq!(output_level(&port, 15), Ok(false));
    }

    #[test]
    fn read_input_level() {
        let mut port = SimPort::default();
        port.set_input(2, true);
        assert_eq!(read(&port, 2), Ok(true));
        assert_eq!(read(&port, 3), Ok(false));
        assert_eq!(port.total_writes(), 0);
    }

    #[test]
    fn toggle_uses_pad_level() {
        let mut port = SimPort::loopback();
        toggle(&mut port, 5).unwrap();
        assert_eq!(read(&port, 5), Ok(true));
        toggle(&mut port, 5).unwrap();
        assert_eq!(read(&port, 5), Ok(false));
    }

    #[test]
    fn invalid_pin_never_writes() {
        let mut port = SimPort::default();
        for pin in [16, 100, 255] {
            let cfg = PinConfig::output(pin);
            assert_eq!(configure(&mut port, &cfg), Err(PinError::InvalidPin(pin)));
            assert_eq!(
                set_alternate_function(&mut port, pin, AltFunction::AF0),
                Err(PinError::InvalidPin(pin))
            );
            assert_eq!(write(&mut port, pin, true), Err(PinError::InvalidPin(pin)));
            assert_eq!(toggle(&mut port, pin), Err(PinError::InvalidPin(pin)));
            assert_eq!(read(&port, pin), Err(PinError::InvalidPin(pin)));
        }
        assert_eq!(port.total_writes(), 0);
    }

    #[test]
    fn read_config_round_trip() {
        let mut port = SimPort::default();
        let cfg = PinConfig::new(12)
            .alternate(AltFunction::new(5).unwrap())
            .output_type(OutputType::OpenDrain)
            .pull(Pull::Up)
            .speed(Speed::High);
        configure(&mut port, &cfg).unwrap();
        assert_eq!(read_config(&port, 12), Ok(cfg));
    }

    #[test]
    fn read_config_reserved_pull() {
        let mut port = SimPort::default();
        port.preset(PortReg::Pupdr, 0b11 << 2);
        assert_eq!(
            read_config(&port, 1),
            Err(PinError::InvalidFieldValue {
                field: FieldKind::Pull,
                value: 0b11
            })
        );
    }
}
