//! Peripheral clock gating
//!
//! Every GPIO port has to be clocked before any register write on that port has an effect.
//! The EXTI source selection lives in SYSCFG, which has its own clock on APB2.
use crate::gpio::Port;
use crate::pac;

/// SYSCFG clock enable bit in APB2ENR
pub const APB2ENR_SYSCFGEN: u32 = 1 << 14;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RccReg {
    Ahb1enr,
    Apb2enr,
}

/// Access to the RCC clock enable registers
pub trait RccInterface {
    fn read(&self, reg: RccReg) -> u32;

    fn write(&mut self, reg: RccReg, bits: u32);

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: RccReg, f: F) {
        let bits = self.read(reg);
        self.write(reg, f(bits));
    }
}

impl<T: RccInterface> RccInterface for &mut T {
    #[inline]
    fn read(&self, reg: RccReg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: RccReg, bits: u32) {
        (**self).write(reg, bits)
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: RccReg, f: F) {
        (**self).modify(reg, f)
    }
}

/// RCC registers behind the PAC peripheral
pub struct RccBlock<'a> {
    rcc: &'a pac::RCC,
}

impl<'a> RccBlock<'a> {
    #[inline]
    pub fn new(rcc: &'a mut pac::RCC) -> Self {
        RccBlock { rcc }
    }
}

impl RccInterface for RccBlock<'_> {
    fn read(&self, reg: RccReg) -> u32 {
        match reg {
            RccReg::Ahb1enr => self.rcc.ahb1enr.read().bits(),
            RccReg::Apb2enr => self.rcc.apb2enr.read().bits(),
        }
    }

    fn write(&mut self, reg: RccReg, bits: u32) {
        unsafe {
            match reg {
                RccReg::Ahb1enr => self.rcc.ahb1enr.write(|w| w.bits(bits)),
                RccReg::Apb2enr => self.rcc.apb2enr.write(|w| w.bits(bits)),
            }
        }
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: RccReg, f: F) {
        critical_section::with(|_| {
            let bits = self.read(reg);
            self.write(reg, f(bits));
        })
    }
}

pub fn enable_gpio_clock(rcc: &mut impl RccInterface, port: Port) {
    rcc.modify(RccReg::Ahb1enr, |r| r | (1 << port.index()));
}

pub fn disable_gpio_clock(rcc: &mut impl RccInterface, port: Port) {
    rcc.modify(RccReg::Ahb1enr, |r| r & !(1 << port.index()));
}

/// Required before routing EXTI lines with [`select_source`](crate::exti::select_source)
pub fn enable_syscfg_clock(rcc: &mut impl RccInterface) {
    rcc.modify(RccReg::Apb2enr, |r| r | APB2ENR_SYSCFGEN);
}
