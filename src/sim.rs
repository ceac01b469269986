//! # Hosted simulation of the GPIO and EXTI register files
//!
//! The simulated register files implement the same register interface traits as the memory
//! mapped blocks, so every driver function can run on the host. Each register file counts
//! the writes it receives, which allows checking that rejected calls did not touch the
//! hardware.
//!
//! [`SimMcu`] puts the register files of one microcontroller together with a simple
//! interrupt dispatcher:
//!
//! - Driving an external input with [`SimMcu::set_input`] detects the edge. If the EXTI line
//!   of that pin is routed to the port, the edge is selected in RTSR/FTSR and the line is
//!   unmasked, the pending bit is set.
//! - [`SimMcu::dispatch`] runs the handler bound to the interrupt vector of every pending
//!   line, provided the vector is unmasked in the NVIC. While a handler runs, its vector is
//!   marked active and is not dispatched again, so a handler is never re-entered. Pending
//!   lines of an active vector are serviced after the handler returned.
//! - A handler which returns without clearing its pending bit is invoked again, up to
//!   [`STORM_LIMIT`] times per dispatch.
//!
//! Edges caused by the output data register of a port are not detected, only the external
//! inputs driven with [`SimMcu::set_input`].
use crate::clock::{RccInterface, RccReg};
use crate::exti::{self, ExtiInterface, ExtiReg, InterruptController, SyscfgInterface, SyscfgReg};
use crate::gpio::{Mode, PinNumber, Port, PortInterface, PortReg, PORT_COUNT};
use cortex_m::interrupt::InterruptNumber;

/// Maximum number of handler invocations of one [`SimMcu::dispatch`] call
pub const STORM_LIMIT: usize = 16;

/// Number of interrupt vectors the simulated NVIC can hold
const NVIC_LINES: usize = 128;

//==================================================================================================
//  SimPort
//==================================================================================================

/// Simulated GPIO port
///
/// The input data register reflects the pad levels. For pins in output mode the pad is
/// driven by the output data register, all other pins follow the levels set with
/// [`set_input`](Self::set_input). A loopback port wires the whole output data register
/// straight to the input data register, regardless of the pin modes.
#[derive(Debug, Default, Clone)]
pub struct SimPort {
    regs: [u32; 8],
    input: u32,
    loopback: bool,
    writes: [usize; 8],
}

impl SimPort {
    pub fn loopback() -> Self {
        SimPort {
            loopback: true,
            ..Default::default()
        }
    }

    /// Set a register value without counting it as a write
    pub fn preset(&mut self, reg: PortReg, bits: u32) {
        if reg == PortReg::Idr {
            self.input = bits;
        } else {
            self.regs[reg.index()] = bits;
        }
    }

    #[inline]
    pub fn peek(&self, reg: PortReg) -> u32 {
        self.read(reg)
    }

    /// Drive the external level of a pin. Invalid pin numbers are ignored.
    pub fn set_input(&mut self, pin: u8, level: bool) {
        if let Ok(pin) = PinNumber::new(pin) {
            if level {
                self.input |= pin.mask();
            } else {
                self.input &= !pin.mask();
            }
        }
    }

    /// Mask of all pins in output mode
    fn output_pins(&self) -> u32 {
        let moder = self.regs[PortReg::Moder.index()];
        (0..16u32)
            .filter(|pin| (moder >> (2 * pin)) & 0b11 == Mode::Output.bits())
            .fold(0, |mask, pin| mask | (1 << pin))
    }

    /// Pad levels as seen by the input data register
    pub fn pads(&self) -> u32 {
        let odr = self.regs[PortReg::Odr.index()];
        if self.loopback {
            return odr;
        }
        let outputs = self.output_pins();
        (self.input & !outputs) | (odr & outputs)
    }

    #[inline]
    pub fn writes_to(&self, reg: PortReg) -> usize {
        self.writes[reg.index()]
    }

    #[inline]
    pub fn total_writes(&self) -> usize {
        self.writes.iter().sum()
    }
}

unsafe impl PortInterface for SimPort {
    fn read(&self, reg: PortReg) -> u32 {
        match reg {
            PortReg::Idr => self.pads(),
            _ => self.regs[reg.index()],
        }
    }

    fn write(&mut self, reg: PortReg, bits: u32) {
        self.writes[reg.index()] += 1;
        if reg != PortReg::Idr {
            self.regs[reg.index()] = bits;
        }
    }
}

//==================================================================================================
//  SimExti
//==================================================================================================

/// Simulated EXTI controller with a write-1-to-clear pending register
#[derive(Debug, Default, Clone)]
pub struct SimExti {
    imr: u32,
    rtsr: u32,
    ftsr: u32,
    pr: u32,
    writes: usize,
}

impl SimExti {
    /// Set the pending bit of `line` the way the edge detector does
    pub fn raise(&mut self, line: u8) {
        if let Ok(line) = PinNumber::new(line) {
            self.pr |= line.mask();
        }
    }

    /// Edge detector: set the pending bit if the edge is selected and the line unmasked
    fn edge(&mut self, line: PinNumber, rising: bool) {
        let trigger = if rising { self.rtsr } else { self.ftsr };
        if trigger & self.imr & line.mask() != 0 {
            self.pr |= line.mask();
        }
    }

    #[inline]
    pub fn total_writes(&self) -> usize {
        self.writes
    }
}

impl ExtiInterface for SimExti {
    fn read(&self, reg: ExtiReg) -> u32 {
        match reg {
            ExtiReg::Imr => self.imr,
            ExtiReg::Rtsr => self.rtsr,
            ExtiReg::Ftsr => self.ftsr,
            ExtiReg::Pr => self.pr,
        }
    }

    fn write(&mut self, reg: ExtiReg, bits: u32) {
        self.writes += 1;
        match reg {
            ExtiReg::Imr => self.imr = bits,
            ExtiReg::Rtsr => self.rtsr = bits,
            ExtiReg::Ftsr => self.ftsr = bits,
            ExtiReg::Pr => self.pr &= !bits,
        }
    }
}

//==================================================================================================
//  SimSyscfg, SimRcc and SimNvic
//==================================================================================================

#[derive(Debug, Default, Clone)]
pub struct SimSyscfg {
    exticr: [u32; 4],
}

impl SyscfgInterface for SimSyscfg {
    fn read(&self, reg: SyscfgReg) -> u32 {
        self.exticr[reg.index()]
    }

    fn write(&mut self, reg: SyscfgReg, bits: u32) {
        self.exticr[reg.index()] = bits;
    }
}

#[derive(Debug, Default, Clone)]
pub struct SimRcc {
    ahb1enr: u32,
    apb2enr: u32,
}

impl SimRcc {
    pub fn gpio_clock_enabled(&self, port: Port) -> bool {
        self.ahb1enr & (1 << port.index()) != 0
    }
}

impl RccInterface for SimRcc {
    fn read(&self, reg: RccReg) -> u32 {
        match reg {
            RccReg::Ahb1enr => self.ahb1enr,
            RccReg::Apb2enr => self.apb2enr,
        }
    }

    fn write(&mut self, reg: RccReg, bits: u32) {
        match reg {
            RccReg::Ahb1enr => self.ahb1enr = bits,
            RccReg::Apb2enr => self.apb2enr = bits,
        }
    }
}

/// Simulated NVIC, only tracks which vectors are unmasked
#[derive(Debug, Default, Clone)]
pub struct SimNvic {
    unmasked: u128,
}

impl SimNvic {
    pub fn is_unmasked<I: InterruptNumber>(&self, irq: I) -> bool {
        self.is_unmasked_nr(irq.number())
    }

    fn is_unmasked_nr(&self, nr: u16) -> bool {
        (nr as usize) < NVIC_LINES && self.unmasked & (1 << nr) != 0
    }
}

impl<I: InterruptNumber> InterruptController<I> for SimNvic {
    fn unmask(&mut self, irq: I) {
        let nr = irq.number() as usize;
        if nr < NVIC_LINES {
            self.unmasked |= 1 << nr;
        }
    }

    fn mask(&mut self, irq: I) {
        let nr = irq.number() as usize;
        if nr < NVIC_LINES {
            self.unmasked &= !(1 << nr);
        }
    }
}

//==================================================================================================
//  SimMcu
//==================================================================================================

/// Interrupt handler of the simulation. It gets exclusive access to the whole register file.
pub type Handler = fn(&mut SimMcu);

/// Register files of one microcontroller plus a non-reentrant interrupt dispatcher
pub struct SimMcu {
    /// GPIO ports, indexed with [`Port::index`]
    pub ports: [SimPort; PORT_COUNT],
    pub exti: SimExti,
    pub syscfg: SimSyscfg,
    pub rcc: SimRcc,
    pub nvic: SimNvic,
    handlers: [Option<Handler>; NVIC_LINES],
    active: u128,
    invocations: usize,
}

impl Default for SimMcu {
    fn default() -> Self {
        SimMcu {
            ports: Default::default(),
            exti: SimExti::default(),
            syscfg: SimSyscfg::default(),
            rcc: SimRcc::default(),
            nvic: SimNvic::default(),
            handlers: [None; NVIC_LINES],
            active: 0,
            invocations: 0,
        }
    }
}

impl SimMcu {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn port(&self, port: Port) -> &SimPort {
        &self.ports[port.index()]
    }

    #[inline]
    pub fn port_mut(&mut self, port: Port) -> &mut SimPort {
        &mut self.ports[port.index()]
    }

    /// Install `handler` as the target of the interrupt vector `irq`
    pub fn bind<I: InterruptNumber>(&mut self, irq: I, handler: Handler) {
        if let Some(slot) = self.handlers.get_mut(irq.number() as usize) {
            *slot = Some(handler);
        }
    }

    /// Total number of handler invocations so far
    #[inline]
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    /// Whether the handler of `irq` is currently running
    pub fn is_active<I: InterruptNumber>(&self, irq: I) -> bool {
        let nr = irq.number() as usize;
        nr < NVIC_LINES && self.active & (1 << nr) != 0
    }

    /// Drive an external input, run the edge detector and dispatch pending interrupts.
    ///
    /// Returns the number of handler invocations caused by this call.
    pub fn set_input(&mut self, port: Port, pin: u8, level: bool) -> usize {
        let Ok(line) = PinNumber::new(pin) else {
            return 0;
        };
        let before = self.ports[port.index()].pads() & line.mask() != 0;
        self.ports[port.index()].set_input(pin, level);
        let after = self.ports[port.index()].pads() & line.mask() != 0;
        if before != after && exti::source(&self.syscfg, pin) == Ok(port) {
            self.exti.edge(line, after);
        }
        self.dispatch()
    }

    /// Press-and-release helper for active-low buttons: falling edge followed by a rising edge
    pub fn pulse_low(&mut self, port: Port, pin: u8) -> usize {
        self.set_input(port, pin, false) + self.set_input(port, pin, true)
    }

    /// Vector number of a pending, unmasked line which is ready to be serviced
    fn next_ready(&self) -> Option<usize> {
        let requests = self.exti.pr & self.exti.imr;
        (0..16u8)
            .filter(|line| requests & (1 << line) != 0)
            .filter_map(|line| exti::line_interrupt(line).ok())
            .map(|irq| irq.number() as usize)
            .find(|&nr| {
                nr < NVIC_LINES
                    && self.nvic.is_unmasked_nr(nr as u16)
                    && self.active & (1 << nr) == 0
                    && self.handlers[nr].is_some()
            })
    }

    /// Run the handlers of all pending interrupts
    ///
    /// Returns the number of handler invocations.
    pub fn dispatch(&mut self) -> usize {
        let mut fired = 0;
        while fired < STORM_LIMIT {
            let Some(nr) = self.next_ready() else {
                break;
            };
            let Some(handler) = self.handlers[nr] else {
                break;
            };
            self.active |= 1 << nr;
            handler(self);
            self.active &= !(1 << nr);
            self.invocations += 1;
            fired += 1;
        }
        fired
    }
}
