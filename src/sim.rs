//! Simulated chip for unit tests: bus, pins and delay share one event log.

use core::cell::RefCell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::{
    delay::DelayNs,
    digital::{self, InputPin, OutputPin},
};

use crate::config::Config;
use crate::constants::*;
use crate::driver::Ads129x;
use crate::pins::ChipHandle;
use crate::transport::SerialTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Line {
    Pwdn,
    Reset,
    Start,
    Clksel,
    Cs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Set(Line, bool),
    Byte { out: u8, received: u8 },
    DelayNs(u64),
}

#[derive(Debug, PartialEq, Eq)]
pub struct BusFault;

pub struct Sim {
    pub events: Vec<Event>,
    pub registers: [u8; 32],
    /// Bytes the chip shifts out during a read-data-continuous frame
    pub conversion: Vec<u8>,
    pub drdy_low: bool,
    /// Number of bytes to exchange successfully before the bus fails
    pub fail_after: Option<usize>,
    rdatac: bool,
    frame: Vec<u8>,
    data_frame: bool,
}

impl Sim {
    fn new() -> Self {
        let mut registers = [0u8; 32];
        registers[REG_ID as usize] = 0x92;
        Sim {
            events: Vec::new(),
            registers,
            conversion: Vec::new(),
            drdy_low: false,
            fail_after: None,
            rdatac: true,
            frame: Vec::new(),
            data_frame: false,
        }
    }

    /// Bytes sent in each chip-select frame, in order
    pub fn transactions(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in &self.events {
            match event {
                Event::Set(Line::Cs, false) => current = Some(Vec::new()),
                Event::Set(Line::Cs, true) => {
                    if let Some(frame) = current.take() {
                        frames.push(frame);
                    }
                }
                Event::Byte { out, .. } => {
                    if let Some(frame) = current.as_mut() {
                        frame.push(*out);
                    }
                }
                _ => {}
            }
        }
        frames
    }

    pub fn byte_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Byte { .. }))
            .count()
    }

    /// Register writes in wire order
    pub fn register_writes(&self) -> Vec<(u8, u8)> {
        self.transactions()
            .iter()
            .filter(|frame| frame.len() == 3 && frame[0] & 0xE0 == CMD_WREG)
            .map(|frame| (frame[0] & 0x1F, frame[2]))
            .collect()
    }

    pub fn levels(&self, line: Line) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Set(l, level) if *l == line => Some(*level),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn exchange(&mut self, out: u8) -> u8 {
        let position = self.frame.len();
        self.frame.push(out);

        if position == 0 {
            self.data_frame = self.rdatac && out != CMD_SDATAC;
        }
        if self.data_frame {
            return self.conversion.get(position).copied().unwrap_or(0);
        }

        let opcode = self.frame[0];
        match (opcode, position) {
            (CMD_RDATAC, 0) => self.rdatac = true,
            (CMD_SDATAC, 0) => self.rdatac = false,
            (CMD_RESET, 0) => self.rdatac = true,
            (op, 2) if op & 0xE0 == CMD_WREG => {
                self.registers[(op & 0x1F) as usize] = out;
            }
            (op, 2) if op & 0xE0 == CMD_RREG => {
                return self.registers[(op & 0x1F) as usize];
            }
            _ => {}
        }
        0
    }
}

pub type Shared = Rc<RefCell<Sim>>;

pub struct SimBus(Shared);

impl SerialTransport for SimBus {
    type Error = BusFault;

    fn transfer_byte(&mut self, out: u8) -> Result<u8, BusFault> {
        let mut sim = self.0.borrow_mut();
        if let Some(remaining) = sim.fail_after {
            if remaining == 0 {
                return Err(BusFault);
            }
            sim.fail_after = Some(remaining - 1);
        }
        let received = sim.exchange(out);
        sim.events.push(Event::Byte { out, received });
        Ok(received)
    }
}

pub struct SimPin {
    line: Line,
    sim: Shared,
}

impl digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut sim = self.sim.borrow_mut();
        if self.line == Line::Cs {
            sim.frame.clear();
        }
        sim.events.push(Event::Set(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.sim.borrow_mut().events.push(Event::Set(self.line, true));
        Ok(())
    }
}

pub struct SimReady(Shared);

impl digital::ErrorType for SimReady {
    type Error = Infallible;
}

impl InputPin for SimReady {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.borrow().drdy_low)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.borrow().drdy_low)
    }
}

pub struct SimDelay(Shared);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().events.push(Event::DelayNs(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.0
            .borrow_mut()
            .events
            .push(Event::DelayNs(us as u64 * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0
            .borrow_mut()
            .events
            .push(Event::DelayNs(ms as u64 * 1_000_000));
    }
}

pub type SimChip = Ads129x<SimBus, SimPin, SimPin, SimPin, SimPin, SimPin, SimReady, SimDelay>;

pub fn chip() -> (Shared, SimChip) {
    chip_with(Config::default())
}

pub fn chip_with(config: Config) -> (Shared, SimChip) {
    let sim = Rc::new(RefCell::new(Sim::new()));
    let pin = |line| SimPin {
        line,
        sim: sim.clone(),
    };
    let handle = ChipHandle::new(
        pin(Line::Pwdn),
        pin(Line::Reset),
        pin(Line::Start),
        pin(Line::Clksel),
        pin(Line::Cs),
        SimReady(sim.clone()),
    );
    let driver = Ads129x::with_config(SimBus(sim.clone()), handle, SimDelay(sim.clone()), config);
    (sim, driver)
}
