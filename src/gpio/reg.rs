use super::config::PinNumber;
use crate::pac::{self, gpioa};
use paste::paste;

/// Type definition to avoid confusion: The register blocks of all GPIO ports have the same
/// layout, the PAC only splits them because of differing reset values
type PortRegisterBlock = gpioa::RegisterBlock;

//==================================================================================================
//  Ports and registers
//==================================================================================================

/// GPIO port identifier
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

/// Number of GPIO ports on the STM32F446
pub const PORT_COUNT: usize = 8;

impl Port {
    pub const ALL: [Port; PORT_COUNT] = [
        Port::A,
        Port::B,
        Port::C,
        Port::D,
        Port::E,
        Port::F,
        Port::G,
        Port::H,
    ];

    /// Index of the port. This is also the RCC clock enable bit and the EXTICR source code
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(idx: usize) -> Option<Port> {
        Self::ALL.get(idx).copied()
    }
}

/// Registers of a GPIO port which are used by this driver
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortReg {
    Moder,
    Otyper,
    Ospeedr,
    Pupdr,
    Idr,
    Odr,
    Afrl,
    Afrh,
}

impl PortReg {
    pub const ALL: [PortReg; 8] = [
        PortReg::Moder,
        PortReg::Otyper,
        PortReg::Ospeedr,
        PortReg::Pupdr,
        PortReg::Idr,
        PortReg::Odr,
        PortReg::Afrl,
        PortReg::Afrh,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

//==================================================================================================
//  Bit fields
//==================================================================================================

/// Width of the per-pin fields of the GPIO registers
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldWidth {
    /// OTYPER, IDR, ODR
    One = 1,
    /// MODER, OSPEEDR, PUPDR
    Two = 2,
    /// AFRL, AFRH
    Four = 4,
}

/// Location of a per-pin bit field inside a 32-bit register
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct BitField {
    offset: u8,
    width: u8,
}

impl BitField {
    /// Field of `width` bits for `pin`. Pins past the capacity of one register wrap around,
    /// which is how pins 8..=15 land in AFRH.
    #[inline]
    pub fn for_pin(pin: PinNumber, width: FieldWidth) -> Self {
        let width = width as u8;
        let per_reg = 32 / width;
        BitField {
            offset: (pin.num() % per_reg) * width,
            width,
        }
    }

    #[inline]
    pub fn offset(self) -> u8 {
        self.offset
    }

    #[inline]
    pub fn width(self) -> u8 {
        self.width
    }

    #[inline]
    pub fn mask(self) -> u32 {
        (u32::MAX >> (32 - self.width)) << self.offset
    }

    /// Clear the field in `reg` and insert `value`
    #[inline]
    pub fn insert(self, reg: u32, value: u32) -> u32 {
        (reg & !self.mask()) | ((value << self.offset) & self.mask())
    }

    #[inline]
    pub fn extract(self, reg: u32) -> u32 {
        (reg & self.mask()) >> self.offset
    }
}

//==================================================================================================
// Register Interface
//==================================================================================================

/// Register file of one GPIO port
///
/// Implementers only supply raw [`read`](Self::read) and [`write`](Self::write) access to
/// the named registers. The remaining functions build the field-level read-modify-write
/// operations on top of them and should not be overridden, except for
/// [`modify`](Self::modify) when the backend needs to make the sequence atomic.
///
/// # Safety
///
/// The implementing type must have exclusive control over the register block it accesses.
/// Writes to [`PortReg::Idr`] must be ignored, the register is read-only in hardware.
pub unsafe trait PortInterface {
    fn read(&self, reg: PortReg) -> u32;

    fn write(&mut self, reg: PortReg, bits: u32);

    /// Read-modify-write of a whole register
    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: PortReg, f: F) {
        let bits = self.read(reg);
        self.write(reg, f(bits));
    }

    /// Clear a bit field and insert `value` into it
    #[inline]
    fn write_field(&mut self, reg: PortReg, field: BitField, value: u32) {
        self.modify(reg, |r| field.insert(r, value));
    }

    #[inline]
    fn read_field(&self, reg: PortReg, field: BitField) -> u32 {
        field.extract(self.read(reg))
    }

    #[inline]
    fn set_bits(&mut self, reg: PortReg, mask: u32) {
        self.modify(reg, |r| r | mask);
    }

    #[inline]
    fn clear_bits(&mut self, reg: PortReg, mask: u32) {
        self.modify(reg, |r| r & !mask);
    }
}

unsafe impl<T: PortInterface> PortInterface for &mut T {
    #[inline]
    fn read(&self, reg: PortReg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: PortReg, bits: u32) {
        (**self).write(reg, bits)
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: PortReg, f: F) {
        (**self).modify(reg, f)
    }
}

//==================================================================================================
//  Memory mapped port
//==================================================================================================

/// Handle to the memory mapped register block of a GPIO port
///
/// The handle is created by consuming the PAC singleton of the port, which guarantees that
/// only one [`PortBlock`] exists per port. It is `Copy` so that several pins of the same
/// port can be handed out. All pins of a port share the same registers, so every
/// read-modify-write is executed inside a critical section.
#[derive(Clone, Copy)]
pub struct PortBlock {
    port: Port,
    regs: *const PortRegisterBlock,
}

// NOTE(unsafe) all read-modify-write sequences run in a critical section
unsafe impl Send for PortBlock {}

impl PortBlock {
    #[inline]
    pub fn port(&self) -> Port {
        self.port
    }

    #[inline]
    fn regs(&self) -> &PortRegisterBlock {
        unsafe { &*self.regs }
    }
}

unsafe impl PortInterface for PortBlock {
    fn read(&self, reg: PortReg) -> u32 {
        let regs = self.regs();
        match reg {
            PortReg::Moder => regs.moder.read().bits(),
            PortReg::Otyper => regs.otyper.read().bits(),
            PortReg::Ospeedr => regs.ospeedr.read().bits(),
            PortReg::Pupdr => regs.pupdr.read().bits(),
            PortReg::Idr => regs.idr.read().bits(),
            PortReg::Odr => regs.odr.read().bits(),
            PortReg::Afrl => regs.afrl.read().bits(),
            PortReg::Afrh => regs.afrh.read().bits(),
        }
    }

    fn write(&mut self, reg: PortReg, bits: u32) {
        let regs = self.regs();
        // Safety: Only raw register values prepared by the field helpers are written
        unsafe {
            match reg {
                PortReg::Moder => regs.moder.write(|w| w.bits(bits)),
                PortReg::Otyper => regs.otyper.write(|w| w.bits(bits)),
                PortReg::Ospeedr => regs.ospeedr.write(|w| w.bits(bits)),
                PortReg::Pupdr => regs.pupdr.write(|w| w.bits(bits)),
                PortReg::Idr => (),
                PortReg::Odr => regs.odr.write(|w| w.bits(bits)),
                PortReg::Afrl => regs.afrl.write(|w| w.bits(bits)),
                PortReg::Afrh => regs.afrh.write(|w| w.bits(bits)),
            }
        }
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: PortReg, f: F) {
        critical_section::with(|_| {
            let bits = self.read(reg);
            self.write(reg, f(bits));
        })
    }
}

macro_rules! port_blocks {
    ($($GPIOX:ident: $Port:ident,)+) => {
        paste!(
            impl PortBlock {
                $(
                    #[doc = "Take ownership of " $GPIOX " and enable its peripheral clock"]
                    pub fn [<$GPIOX:lower>](rcc: &mut pac::RCC, _gpio: pac::$GPIOX) -> Self {
                        let mut rcc = crate::clock::RccBlock::new(rcc);
                        crate::clock::enable_gpio_clock(&mut rcc, Port::$Port);
                        PortBlock {
                            port: Port::$Port,
                            regs: pac::$GPIOX::ptr() as *const PortRegisterBlock,
                        }
                    }
                )+
            }
        );
    };
}

port_blocks!(
    GPIOA: A,
    GPIOB: B,
    GPIOC: C,
    GPIOD: D,
    GPIOE: E,
    GPIOF: F,
    GPIOG: G,
    GPIOH: H,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(n: u8) -> PinNumber {
        PinNumber::new(n).unwrap()
    }

    #[test]
    fn field_offsets() {
        assert_eq!(BitField::for_pin(pin(0), FieldWidth::Two).offset(), 0);
        assert_eq!(BitField::for_pin(pin(15), FieldWidth::Two).offset(), 30);
        assert_eq!(BitField::for_pin(pin(13), FieldWidth::One).offset(), 13);
        assert_eq!(BitField::for_pin(pin(7), FieldWidth::Four).offset(), 28);
        assert_eq!(BitField::for_pin(pin(8), FieldWidth::Four).offset(), 0);
        assert_eq!(BitField::for_pin(pin(15), FieldWidth::Four).offset(), 28);
    }

    #[test]
    fn field_insert_clears_old_value() {
        let field = BitField::for_pin(pin(3), FieldWidth::Two);
        assert_eq!(field.mask(), 0b11 << 6);
        let reg = 0xffff_ffff;
        let updated = field.insert(reg, 0b01);
        assert_eq!(updated, !(0b10 << 6));
        assert_eq!(field.extract(updated), 0b01);
        // Values wider than the field are truncated to the field
        assert_eq!(field.insert(0, 0b111), 0b11 << 6);
    }

    #[test]
    fn every_width_and_pin_stays_in_register() {
        for width in [FieldWidth::One, FieldWidth::Two, FieldWidth::Four] {
            for n in 0..16 {
                let field = BitField::for_pin(pin(n), width);
                assert_eq!(field.width(), width as u8);
                assert_eq!(field.mask().count_ones(), width as u32);
                assert!(field.offset() + field.width() <= 32);
                assert_eq!(field.extract(u32::MAX), (1 << (width as u32)) - 1);
            }
        }
        assert_eq!(BitField::for_pin(pin(15), FieldWidth::One).mask(), 1 << 15);
        assert_eq!(BitField::for_pin(pin(15), FieldWidth::Four).mask(), 0xf << 28);
    }

    #[test]
    fn port_index() {
        assert_eq!(Port::A.index(), 0);
        assert_eq!(Port::H.index(), 7);
        assert_eq!(Port::from_index(2), Some(Port::C));
        assert_eq!(Port::from_index(8), None);
    }
}
