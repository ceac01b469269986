//! # API for the external interrupt controller (EXTI)
//!
//! EXTI line `n` can be driven by pin `n` of any GPIO port. The port is selected in the
//! SYSCFG `EXTICR` registers with [`select_source`], the triggering edges are selected with
//! [`configure_interrupt`] and the line is unmasked with [`enable_interrupt`], which also
//! unmasks the interrupt vector in the core interrupt controller.
//!
//! The pending register is sticky and write-1-to-clear. An interrupt handler has to call
//! [`clear_interrupt`], otherwise the interrupt fires again as soon as the handler returns.
//!
//! ## Examples
//!
//! - Button interrupt: `demos/button-irq.rs`
use crate::gpio::{FieldKind, PinError, PinNumber, Port};
use crate::pac::{self, Interrupt};
use cortex_m::interrupt::InterruptNumber;

//==================================================================================================
//  Definitions
//==================================================================================================

/// Signal transition(s) which set the pending bit of a line
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    RisingAndFalling,
}

impl Edge {
    #[inline]
    fn rising(self) -> bool {
        matches!(self, Edge::Rising | Edge::RisingAndFalling)
    }

    #[inline]
    fn falling(self) -> bool {
        matches!(self, Edge::Falling | Edge::RisingAndFalling)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtiReg {
    /// Interrupt mask register, 1 means the line is unmasked
    Imr,
    /// Rising trigger selection register
    Rtsr,
    /// Falling trigger selection register
    Ftsr,
    /// Pending register, write-1-to-clear
    Pr,
}

/// SYSCFG external interrupt configuration registers, four lines per register
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyscfgReg {
    Exticr1,
    Exticr2,
    Exticr3,
    Exticr4,
}

impl SyscfgReg {
    pub const ALL: [SyscfgReg; 4] = [
        SyscfgReg::Exticr1,
        SyscfgReg::Exticr2,
        SyscfgReg::Exticr3,
        SyscfgReg::Exticr4,
    ];

    /// Register holding the source selection of `line`
    #[inline]
    pub fn for_line(line: PinNumber) -> Self {
        Self::ALL[(line.num() / 4) as usize]
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

//==================================================================================================
// Register Interfaces
//==================================================================================================

/// Register file of the EXTI controller
///
/// Writes must reach the hardware verbatim. In particular a write to [`ExtiReg::Pr`]
/// clears exactly the bits which are set in the written value.
pub trait ExtiInterface {
    fn read(&self, reg: ExtiReg) -> u32;

    fn write(&mut self, reg: ExtiReg, bits: u32);

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: ExtiReg, f: F) {
        let bits = self.read(reg);
        self.write(reg, f(bits));
    }
}

impl<T: ExtiInterface> ExtiInterface for &mut T {
    #[inline]
    fn read(&self, reg: ExtiReg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: ExtiReg, bits: u32) {
        (**self).write(reg, bits)
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: ExtiReg, f: F) {
        (**self).modify(reg, f)
    }
}

/// Register file of the SYSCFG EXTI source multiplexer
pub trait SyscfgInterface {
    fn read(&self, reg: SyscfgReg) -> u32;

    fn write(&mut self, reg: SyscfgReg, bits: u32);

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: SyscfgReg, f: F) {
        let bits = self.read(reg);
        self.write(reg, f(bits));
    }
}

impl<T: SyscfgInterface> SyscfgInterface for &mut T {
    #[inline]
    fn read(&self, reg: SyscfgReg) -> u32 {
        (**self).read(reg)
    }

    #[inline]
    fn write(&mut self, reg: SyscfgReg, bits: u32) {
        (**self).write(reg, bits)
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: SyscfgReg, f: F) {
        (**self).modify(reg, f)
    }
}

/// Core interrupt controller. The interrupt identifier `I` is opaque to this module.
pub trait InterruptController<I> {
    fn unmask(&mut self, irq: I);

    fn mask(&mut self, irq: I);
}

//==================================================================================================
//  Interrupt registration
//==================================================================================================

/// Select the triggering edges of the line `pin`
///
/// The selection is authoritative: the trigger bit of an edge which is not selected is
/// cleared, so switching from [`Edge::RisingAndFalling`] to [`Edge::Rising`] disables the
/// falling trigger.
pub fn configure_interrupt(
    exti: &mut impl ExtiInterface,
    pin: u8,
    edge: Edge,
) -> Result<(), PinError> {
    let line = PinNumber::new(pin)?;
    let mask = line.mask();
    exti.modify(ExtiReg::Rtsr, |r| if edge.rising() { r | mask } else { r & !mask });
    exti.modify(ExtiReg::Ftsr, |r| if edge.falling() { r | mask } else { r & !mask });
    Ok(())
}

/// Unmask the line `pin` and the interrupt vector `irq` it is routed to
///
/// `irq` is handed to the interrupt controller unchanged. [`line_interrupt`] returns the
/// vector of a line on the STM32F446.
pub fn enable_interrupt<I>(
    exti: &mut impl ExtiInterface,
    nvic: &mut impl InterruptController<I>,
    pin: u8,
    irq: I,
) -> Result<(), PinError> {
    let line = PinNumber::new(pin)?;
    exti.modify(ExtiReg::Imr, |r| r | line.mask());
    nvic.unmask(irq);
    Ok(())
}

/// Mask the line `pin`. The interrupt vector is left untouched because it may be shared
/// with other lines.
pub fn disable_interrupt(exti: &mut impl ExtiInterface, pin: u8) -> Result<(), PinError> {
    let line = PinNumber::new(pin)?;
    exti.modify(ExtiReg::Imr, |r| r & !line.mask());
    Ok(())
}

#[inline]
pub fn is_pending(exti: &impl ExtiInterface, pin: u8) -> Result<bool, PinError> {
    let line = PinNumber::new(pin)?;
    Ok(exti.read(ExtiReg::Pr) & line.mask() != 0)
}

/// Clear the sticky pending bit of the line `pin` if it is set
///
/// Only the bit of this line is written, so pending bits of other lines survive. Nothing
/// is written if the line is not pending.
pub fn clear_interrupt(exti: &mut impl ExtiInterface, pin: u8) -> Result<(), PinError> {
    let line = PinNumber::new(pin)?;
    if exti.read(ExtiReg::Pr) & line.mask() != 0 {
        exti.write(ExtiReg::Pr, line.mask());
    }
    Ok(())
}

/// Route pin `pin` of `port` to EXTI line `pin`
///
/// The SYSCFG clock has to be enabled, see
/// [`enable_syscfg_clock`](crate::clock::enable_syscfg_clock).
pub fn select_source(
    syscfg: &mut impl SyscfgInterface,
    port: Port,
    pin: u8,
) -> Result<(), PinError> {
    let line = PinNumber::new(pin)?;
    let offset = 4 * (line.num() % 4);
    syscfg.modify(SyscfgReg::for_line(line), |r| {
        (r & !(0xf << offset)) | ((port.index() as u32) << offset)
    });
    Ok(())
}

/// Port currently routed to EXTI line `pin`
pub fn source(syscfg: &impl SyscfgInterface, pin: u8) -> Result<Port, PinError> {
    let line = PinNumber::new(pin)?;
    let offset = 4 * (line.num() % 4);
    let value = (syscfg.read(SyscfgReg::for_line(line)) >> offset) & 0xf;
    Port::from_index(value as usize).ok_or(PinError::InvalidFieldValue {
        field: FieldKind::ExtiSource,
        value,
    })
}

/// Interrupt vector which EXTI line `pin` is wired to
pub fn line_interrupt(pin: u8) -> Result<Interrupt, PinError> {
    let line = PinNumber::new(pin)?;
    Ok(match line.num() {
        0 => Interrupt::EXTI0,
        1 => Interrupt::EXTI1,
        2 => Interrupt::EXTI2,
        3 => Interrupt::EXTI3,
        4 => Interrupt::EXTI4,
        5..=9 => Interrupt::EXTI9_5,
        _ => Interrupt::EXTI15_10,
    })
}

//==================================================================================================
//  Memory mapped controllers
//==================================================================================================

/// EXTI registers behind the PAC peripheral
pub struct ExtiBlock {
    exti: pac::EXTI,
}

impl ExtiBlock {
    #[inline]
    pub fn new(exti: pac::EXTI) -> Self {
        ExtiBlock { exti }
    }

    pub fn release(self) -> pac::EXTI {
        self.exti
    }
}

impl ExtiInterface for ExtiBlock {
    fn read(&self, reg: ExtiReg) -> u32 {
        match reg {
            ExtiReg::Imr => self.exti.imr.read().bits(),
            ExtiReg::Rtsr => self.exti.rtsr.read().bits(),
            ExtiReg::Ftsr => self.exti.ftsr.read().bits(),
            ExtiReg::Pr => self.exti.pr.read().bits(),
        }
    }

    fn write(&mut self, reg: ExtiReg, bits: u32) {
        unsafe {
            match reg {
                ExtiReg::Imr => self.exti.imr.write(|w| w.bits(bits)),
                ExtiReg::Rtsr => self.exti.rtsr.write(|w| w.bits(bits)),
                ExtiReg::Ftsr => self.exti.ftsr.write(|w| w.bits(bits)),
                ExtiReg::Pr => self.exti.pr.write(|w| w.bits(bits)),
            }
        }
    }

    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: ExtiReg, f: F) {
        critical_section::with(|_| {
            let bits = self.read(reg);
            self.write(reg, f(bits));
        })
    }
}

/// SYSCFG registers behind the PAC peripheral
pub struct SyscfgBlock {
    syscfg: pac::SYSCFG,
}

impl SyscfgBlock {
    /// Take ownership of SYSCFG and enable its peripheral clock
    pub fn new(rcc: &mut pac::RCC, syscfg: pac::SYSCFG) -> Self {
        let mut rcc = crate::clock::RccBlock::new(rcc);
        crate::clock::enable_syscfg_clock(&mut rcc);
        SyscfgBlock { syscfg }
    }

    pub fn release(self) -> pac::SYSCFG {
        self.syscfg
    }
}

impl SyscfgInterface for SyscfgBlock {
    fn read(&self, reg: SyscfgReg) -> u32 {
        match reg {
            SyscfgReg::Exticr1 => self.syscfg.exticr1.read().bits(),
            SyscfgReg::Exticr2 => self.syscfg.exticr2.read().bits(),
            SyscfgReg::Exticr3 => self.syscfg.exticr3.read().bits(),
            SyscfgReg::Exticr4 => self.syscfg.exticr4.read().bits(),
        }
    }

    fn write(&mut self, reg: SyscfgReg, bits: u32) {
        unsafe {
            match reg {
                SyscfgReg::Exticr1 => self.syscfg.exticr1.write(|w| w.bits(bits)),
                SyscfgReg::Exticr2 => self.syscfg.exticr2.write(|w| w.bits(bits)),
                SyscfgReg::Exticr3 => self.syscfg.exticr3.write(|w| w.bits(bits)),
                SyscfgReg::Exticr4 => self.syscfg.exticr4.write(|w| w.bits(bits)),
            }
        }
    }

    /// Each EXTICR register is shared by four lines
    #[inline]
    fn modify<F: FnOnce(u32) -> u32>(&mut self, reg: SyscfgReg, f: F) {
        critical_section::with(|_| {
            let bits = self.read(reg);
            self.write(reg, f(bits));
        })
    }
}

/// The Cortex-M NVIC
pub struct CoreNvic;

impl<I: InterruptNumber> InterruptController<I> for CoreNvic {
    /// Unmask the interrupt vector. Note that unmasking can break mask-based critical
    /// sections, which is why [`NVIC::unmask`](cortex_m::peripheral::NVIC::unmask) is unsafe.
    #[inline]
    fn unmask(&mut self, irq: I) {
        unsafe { cortex_m::peripheral::NVIC::unmask(irq) };
    }

    #[inline]
    fn mask(&mut self, irq: I) {
        cortex_m::peripheral::NVIC::mask(irq);
    }
}
