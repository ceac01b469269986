//! # Pin configuration records
//!
//! A [`PinConfig`] is a transient value describing the electrical configuration of one pin.
//! It is built by the caller and consumed by [`configure`](super::configure). Every field
//! is a closed enum whose discriminant is the bit pattern written into the corresponding
//! register field, so invalid encodings cannot be constructed in safe code. The raw
//! encodings read back from hardware are converted with [`TryFrom<u32>`], which is where
//! [`PinError::InvalidFieldValue`] comes from.
use core::fmt;

/// Highest valid pin number within a port
pub const MAX_PIN: u8 = 15;

//==================================================================================================
//  Errors and Definitions
//==================================================================================================

/// Register field a value was rejected for
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldKind {
    Mode,
    OutputType,
    OutputSpeed,
    Pull,
    AlternateFunction,
    ExtiSource,
}

/// GPIO error type
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// The pin number is outside of `0..=15`. No register was touched.
    InvalidPin(u8),
    /// A raw field encoding is outside of the range defined for that field.
    InvalidFieldValue { field: FieldKind, value: u32 },
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidPin(pin) => write!(f, "invalid pin number {pin}, expected 0..=15"),
            PinError::InvalidFieldValue { field, value } => {
                write!(f, "invalid value {value:#x} for field {field:?}")
            }
        }
    }
}

//==================================================================================================
//  Pin number
//==================================================================================================

/// Validated pin number in `0..=15`
///
/// All offsets are computed from a [`PinNumber`], so a shift can never spill into the
/// bit field of a neighbouring pin.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinNumber(u8);

impl PinNumber {
    #[inline]
    pub fn new(pin: u8) -> Result<Self, PinError> {
        if pin > MAX_PIN {
            return Err(PinError::InvalidPin(pin));
        }
        Ok(PinNumber(pin))
    }

    #[inline]
    pub fn num(self) -> u8 {
        self.0
    }

    /// Single-bit mask for the 1-bit-per-pin registers
    #[inline]
    pub fn mask(self) -> u32 {
        1 << self.0
    }
}

impl TryFrom<u8> for PinNumber {
    type Error = PinError;

    #[inline]
    fn try_from(pin: u8) -> Result<Self, Self::Error> {
        PinNumber::new(pin)
    }
}

impl From<PinNumber> for u8 {
    #[inline]
    fn from(pin: PinNumber) -> u8 {
        pin.0
    }
}

//==================================================================================================
//  Field encodings
//==================================================================================================

macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $Name:ident, $Kind:ident, { $($(#[$vmeta:meta])* $Variant:ident = $bits:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $Name {
            $($(#[$vmeta])* $Variant = $bits,)+
        }

        impl $Name {
            /// Raw encoding written into the register field
            #[inline]
            pub const fn bits(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u32> for $Name {
            type Error = PinError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($bits => Ok($Name::$Variant),)+
                    _ => Err(PinError::InvalidFieldValue {
                        field: FieldKind::$Kind,
                        value,
                    }),
                }
            }
        }
    };
}

field_enum!(
    /// Pin mode, 2 bits per pin in MODER
    Mode, Mode, {
        #[default]
        Input = 0b00,
        Output = 0b01,
        Alternate = 0b10,
        Analog = 0b11,
    }
);

field_enum!(
    /// Output driver type, 1 bit per pin in OTYPER
    OutputType, OutputType, {
        #[default]
        PushPull = 0,
        OpenDrain = 1,
    }
);

field_enum!(
    /// Output slew rate, 2 bits per pin in OSPEEDR
    Speed, OutputSpeed, {
        #[default]
        Low = 0b00,
        Medium = 0b01,
        Fast = 0b10,
        High = 0b11,
    }
);

field_enum!(
    /// Pull resistor selection, 2 bits per pin in PUPDR. `0b11` is reserved.
    Pull, Pull, {
        #[default]
        None = 0b00,
        Up = 0b01,
        Down = 0b10,
    }
);

/// Alternate function index in `0..=15`, 4 bits per pin in AFRL/AFRH
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AltFunction(u8);

impl AltFunction {
    pub const AF0: AltFunction = AltFunction(0);

    #[inline]
    pub fn new(function: u8) -> Result<Self, PinError> {
        if function > 15 {
            return Err(PinError::InvalidFieldValue {
                field: FieldKind::AlternateFunction,
                value: function as u32,
            });
        }
        Ok(AltFunction(function))
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0 as u32
    }
}

impl TryFrom<u32> for AltFunction {
    type Error = PinError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > 15 {
            return Err(PinError::InvalidFieldValue {
                field: FieldKind::AlternateFunction,
                value,
            });
        }
        Ok(AltFunction(value as u8))
    }
}

//==================================================================================================
//  PinConfig
//==================================================================================================

/// Desired electrical configuration of one pin
///
/// The [`Default`] value describes pin 0 in its reset state: floating input, push-pull,
/// low speed, AF0. `output_type` and `output_speed` only matter for output and alternate
/// modes, `alternate_function` only for [`Mode::Alternate`].
///
/// ```
/// use stm32f446_gpio::gpio::{Mode, PinConfig, Pull, Speed};
///
/// let cfg = PinConfig::new(5).mode(Mode::Output).speed(Speed::Low).pull(Pull::None);
/// assert_eq!(cfg.pin_number, 5);
/// ```
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub pin_number: u8,
    pub mode: Mode,
    pub output_type: OutputType,
    pub pull: Pull,
    pub output_speed: Speed,
    pub alternate_function: AltFunction,
}

impl PinConfig {
    /// Reset configuration for `pin_number`
    #[inline]
    pub fn new(pin_number: u8) -> Self {
        PinConfig {
            pin_number,
            ..Default::default()
        }
    }

    /// Push-pull output, no pull resistor, low speed
    pub fn output(pin_number: u8) -> Self {
        Self::new(pin_number).mode(Mode::Output)
    }

    pub fn input(pin_number: u8, pull: Pull) -> Self {
        Self::new(pin_number).mode(Mode::Input).pull(pull)
    }

    /// Alternate function pin. Also switches the mode to [`Mode::Alternate`].
    pub fn alternate(self, function: AltFunction) -> Self {
        PinConfig {
            mode: Mode::Alternate,
            alternate_function: function,
            ..self
        }
    }

    #[inline]
    pub fn mode(self, mode: Mode) -> Self {
        PinConfig { mode, ..self }
    }

    #[inline]
    pub fn output_type(self, output_type: OutputType) -> Self {
        PinConfig {
            output_type,
            ..self
        }
    }

    #[inline]
    pub fn pull(self, pull: Pull) -> Self {
        PinConfig { pull, ..self }
    }

    #[inline]
    pub fn speed(self, output_speed: Speed) -> Self {
        PinConfig {
            output_speed,
            ..self
        }
    }
}
