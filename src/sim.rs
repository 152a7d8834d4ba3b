//! Simulated open-drain wire with a scripted responder on the far end.
//!
//! Time is virtual: delays advance it instantly and every line sample costs
//! one microsecond, so polling loops always make progress. The clock exposes
//! the low 16 bits of the virtual time, like a free-running hardware timer.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::clock::Clock;
use crate::interface::OneWireBus;
use crate::registers::{
    crc8, CMD_CONVERT_T, CMD_COPY_SCRATCHPAD, CMD_READ_POWER_SUPPLY, CMD_READ_ROM,
    CMD_READ_SCRATCHPAD, CMD_RECALL_EEPROM, CMD_SKIP_ROM, CMD_WRITE_SCRATCHPAD, ROM_LEN,
    SCRATCHPAD_LEN, SP_ALARM_HIGH, SP_CONFIG, SP_CRC, SP_TEMP_LSB, SP_TEMP_MSB,
};

// Low pulses at least this long are treated as a reset.
const RESET_THRESHOLD_US: u32 = 400;
// Write slots with a shorter low pulse carry a one.
const WRITE_ONE_THRESHOLD_US: u32 = 15;
// How long the responder holds the line low to send a zero.
const HOLD_ZERO_US: u32 = 15;
const LOG_CAPACITY: usize = 32;

/// Power-on scratchpad: 85 °C, T<sub>H</sub> 75, T<sub>L</sub> 70, 12-bit.
const POWER_ON_SCRATCHPAD: [u8; 8] = [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10];
const ROM_BODY: [u8; 7] = [0x28, 0xFF, 0x4C, 0x3A, 0x91, 0x16, 0x04];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Rom,
    Function,
    WriteScratchpad(usize),
    Transmit,
    Converting,
    PowerSupply,
    EchoReceive,
    EchoTransmit,
}

impl Phase {
    fn receives(self) -> bool {
        matches!(
            self,
            Self::Rom | Self::Function | Self::WriteScratchpad(_) | Self::EchoReceive
        )
    }
}

/// ROM and function command bytes received since construction.
pub struct CommandLog {
    bytes: [u8; LOG_CAPACITY],
    len: usize,
}

impl CommandLog {
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

struct Responder {
    present: bool,
    presence_delay_us: u32,
    presence_width_us: u32,
    presence_window: Option<(u32, u32)>,
    hold_until: u32,
    phase: Phase,
    rx_byte: u8,
    rx_bits: u8,
    tx: [u8; SCRATCHPAD_LEN],
    tx_len: usize,
    tx_bit: usize,
    scratchpad: [u8; SCRATCHPAD_LEN],
    eeprom: [u8; 3],
    rom: [u8; ROM_LEN],
    converted_raw: i16,
    busy_polls: Option<u32>,
    busy_remaining: Option<u32>,
    conversion_polls: u32,
    parasite: bool,
    resets: u32,
    log: CommandLog,
}

impl Responder {
    fn new(present: bool, phase: Phase) -> Self {
        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        scratchpad[..SP_CRC].copy_from_slice(&POWER_ON_SCRATCHPAD);
        scratchpad[SP_CRC] = crc8(&POWER_ON_SCRATCHPAD);

        let mut rom = [0u8; ROM_LEN];
        rom[..ROM_LEN - 1].copy_from_slice(&ROM_BODY);
        rom[ROM_LEN - 1] = crc8(&ROM_BODY);

        Self {
            present,
            presence_delay_us: 20,
            presence_width_us: 120,
            presence_window: None,
            hold_until: 0,
            phase,
            rx_byte: 0,
            rx_bits: 0,
            tx: [0; SCRATCHPAD_LEN],
            tx_len: 0,
            tx_bit: 0,
            eeprom: [
                scratchpad[SP_ALARM_HIGH],
                scratchpad[SP_ALARM_HIGH + 1],
                scratchpad[SP_CONFIG],
            ],
            scratchpad,
            rom,
            converted_raw: 0x0191,
            busy_polls: Some(0),
            busy_remaining: None,
            conversion_polls: 0,
            parasite: false,
            resets: 0,
            log: CommandLog {
                bytes: [0; LOG_CAPACITY],
                len: 0,
            },
        }
    }

    fn seal_scratchpad(&mut self) {
        self.scratchpad[SP_CRC] = crc8(&self.scratchpad[..SP_CRC]);
    }

    fn load_tx(&mut self, data: &[u8]) {
        self.tx[..data.len()].copy_from_slice(data);
        self.tx_len = data.len();
        self.tx_bit = 0;
    }

    fn next_tx_bit(&mut self) -> bool {
        if self.tx_bit >= self.tx_len * 8 {
            return true;
        }
        let bit = (self.tx[self.tx_bit / 8] >> (self.tx_bit % 8)) & 1 != 0;
        self.tx_bit += 1;
        bit
    }

    fn falling_edge(&mut self, now: u32) {
        let bit = match self.phase {
            Phase::Transmit | Phase::EchoTransmit => self.next_tx_bit(),
            Phase::Converting => self.busy_remaining == Some(0),
            Phase::PowerSupply => !self.parasite,
            _ => true,
        };

        if !bit {
            self.hold_until = now + HOLD_ZERO_US;
        }
    }

    fn rising_edge(&mut self, now: u32, width: u32) {
        if width >= RESET_THRESHOLD_US {
            self.reset(now);
            return;
        }

        let phase = self.phase;
        match phase {
            _ if phase.receives() => {
                if width < WRITE_ONE_THRESHOLD_US {
                    self.rx_byte |= 1 << self.rx_bits;
                }
                self.rx_bits += 1;
                if self.rx_bits == 8 {
                    let byte = self.rx_byte;
                    self.rx_byte = 0;
                    self.rx_bits = 0;
                    self.receive_byte(byte);
                }
            }
            Phase::Converting => {
                self.conversion_polls += 1;
                if let Some(n) = self.busy_remaining {
                    self.busy_remaining = Some(n.saturating_sub(1));
                }
            }
            Phase::EchoTransmit if self.tx_bit >= 8 => self.phase = Phase::EchoReceive,
            Phase::PowerSupply => self.phase = Phase::Idle,
            _ => {}
        }
    }

    fn reset(&mut self, now: u32) {
        self.rx_byte = 0;
        self.rx_bits = 0;
        if matches!(self.phase, Phase::EchoReceive | Phase::EchoTransmit) {
            return;
        }

        self.resets += 1;
        if self.present {
            let start = now + self.presence_delay_us;
            self.presence_window = Some((start, start + self.presence_width_us));
            self.phase = Phase::Rom;
        } else {
            self.phase = Phase::Idle;
        }
    }

    fn record(&mut self, byte: u8) {
        if self.log.len < LOG_CAPACITY {
            self.log.bytes[self.log.len] = byte;
            self.log.len += 1;
        }
    }

    fn receive_byte(&mut self, byte: u8) {
        match self.phase {
            Phase::Rom => {
                self.record(byte);
                self.phase = match byte {
                    CMD_SKIP_ROM => Phase::Function,
                    CMD_READ_ROM => {
                        let rom = self.rom;
                        self.load_tx(&rom);
                        Phase::Transmit
                    }
                    _ => Phase::Idle,
                };
            }
            Phase::Function => {
                self.record(byte);
                self.phase = match byte {
                    CMD_READ_SCRATCHPAD => {
                        let scratchpad = self.scratchpad;
                        self.load_tx(&scratchpad);
                        Phase::Transmit
                    }
                    CMD_WRITE_SCRATCHPAD => Phase::WriteScratchpad(SP_ALARM_HIGH),
                    CMD_CONVERT_T => {
                        let [lsb, msb] = self.converted_raw.to_le_bytes();
                        self.scratchpad[SP_TEMP_LSB] = lsb;
                        self.scratchpad[SP_TEMP_MSB] = msb;
                        self.seal_scratchpad();
                        self.busy_remaining = self.busy_polls;
                        Phase::Converting
                    }
                    CMD_COPY_SCRATCHPAD => {
                        self.eeprom
                            .copy_from_slice(&self.scratchpad[SP_ALARM_HIGH..=SP_CONFIG]);
                        Phase::Idle
                    }
                    CMD_RECALL_EEPROM => {
                        let eeprom = self.eeprom;
                        self.scratchpad[SP_ALARM_HIGH..=SP_CONFIG].copy_from_slice(&eeprom);
                        self.seal_scratchpad();
                        Phase::Idle
                    }
                    CMD_READ_POWER_SUPPLY => Phase::PowerSupply,
                    _ => Phase::Idle,
                };
            }
            Phase::WriteScratchpad(index) => {
                self.scratchpad[index] = byte;
                self.seal_scratchpad();
                self.phase = if index == SP_CONFIG {
                    Phase::Idle
                } else {
                    Phase::WriteScratchpad(index + 1)
                };
            }
            Phase::EchoReceive => {
                self.load_tx(&[byte]);
                self.phase = Phase::EchoTransmit;
            }
            _ => {}
        }
    }

    fn pulls_low(&self, now: u32) -> bool {
        let presence = self
            .presence_window
            .is_some_and(|(start, end)| now >= start && now < end);
        presence || now < self.hold_until
    }
}

/// Shared state of the simulated line, clock and responder.
pub struct Wire {
    now: Cell<u32>,
    host_low: Cell<bool>,
    low_since: Cell<u32>,
    last_low_us: Cell<u32>,
    falling_edges: Cell<u32>,
    responder: RefCell<Responder>,
}

impl Wire {
    fn with_responder(responder: Responder) -> Self {
        Self {
            now: Cell::new(0),
            host_low: Cell::new(false),
            low_since: Cell::new(0),
            last_low_us: Cell::new(0),
            falling_edges: Cell::new(0),
            responder: RefCell::new(responder),
        }
    }

    /// A single powered DS18B20 with power-on scratchpad contents.
    pub fn ds18b20() -> Self {
        Self::with_responder(Responder::new(true, Phase::Idle))
    }

    /// Nothing attached; the line only ever reads the pull-up.
    pub fn absent() -> Self {
        Self::with_responder(Responder::new(false, Phase::Idle))
    }

    /// Receives one byte, then sends it back on the following read slots.
    pub fn loopback() -> Self {
        Self::with_responder(Responder::new(false, Phase::EchoReceive))
    }

    pub fn starting_at(self, now: u32) -> Self {
        self.now.set(now);
        self
    }

    pub fn presence(mut self, delay_us: u32, width_us: u32) -> Self {
        let responder = self.responder.get_mut();
        responder.presence_delay_us = delay_us;
        responder.presence_width_us = width_us;
        self
    }

    /// Read slots answered with "busy" before the conversion completes.
    pub fn busy_polls(mut self, polls: Option<u32>) -> Self {
        self.responder.get_mut().busy_polls = polls;
        self
    }

    pub fn parasite(mut self, parasite: bool) -> Self {
        self.responder.get_mut().parasite = parasite;
        self
    }

    /// Temperature latched into the scratchpad by the next conversion.
    pub fn converts_to(mut self, raw: i16) -> Self {
        self.responder.get_mut().converted_raw = raw;
        self
    }

    pub fn alarms(mut self, high: u8, low: u8) -> Self {
        let responder = self.responder.get_mut();
        responder.scratchpad[SP_ALARM_HIGH] = high;
        responder.scratchpad[SP_ALARM_HIGH + 1] = low;
        responder.seal_scratchpad();
        self
    }

    pub fn corrupt_crc(mut self) -> Self {
        self.responder.get_mut().scratchpad[SP_CRC] ^= 0xA5;
        self
    }

    pub fn bus(&self) -> SimBus<'_> {
        SimBus { wire: self }
    }

    pub fn clock(&self) -> SimClock<'_> {
        SimClock { wire: self }
    }

    pub fn delay(&self) -> SimDelay<'_> {
        SimDelay { wire: self }
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }

    /// Width of the most recent low pulse driven by the host.
    pub fn last_low_us(&self) -> u32 {
        self.last_low_us.get()
    }

    pub fn falling_edges(&self) -> u32 {
        self.falling_edges.get()
    }

    pub fn resets(&self) -> u32 {
        self.responder.borrow().resets
    }

    pub fn conversion_polls(&self) -> u32 {
        self.responder.borrow().conversion_polls
    }

    pub fn scratchpad(&self) -> [u8; SCRATCHPAD_LEN] {
        self.responder.borrow().scratchpad
    }

    pub fn eeprom(&self) -> [u8; 3] {
        self.responder.borrow().eeprom
    }

    pub fn rom(&self) -> [u8; ROM_LEN] {
        self.responder.borrow().rom
    }

    pub fn set_config_byte(&self, value: u8) {
        let mut responder = self.responder.borrow_mut();
        responder.scratchpad[SP_CONFIG] = value;
        responder.seal_scratchpad();
    }

    pub fn commands(&self) -> CommandLog {
        let responder = self.responder.borrow();
        CommandLog {
            bytes: responder.log.bytes,
            len: responder.log.len,
        }
    }

    fn advance(&self, us: u32) {
        self.now.set(self.now.get() + us);
    }

    fn level(&self) -> bool {
        !self.host_low.get() && !self.responder.borrow().pulls_low(self.now.get())
    }
}

pub struct SimBus<'a> {
    wire: &'a Wire,
}

impl OneWireBus for SimBus<'_> {
    type Error = Infallible;

    fn drive_low(&mut self) -> Result<(), Infallible> {
        let wire = self.wire;
        if !wire.host_low.get() {
            wire.host_low.set(true);
            wire.low_since.set(wire.now.get());
            wire.falling_edges.set(wire.falling_edges.get() + 1);
            wire.responder.borrow_mut().falling_edge(wire.now.get());
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        let wire = self.wire;
        if wire.host_low.get() {
            wire.host_low.set(false);
            let width = wire.now.get() - wire.low_since.get();
            wire.last_low_us.set(width);
            wire.responder.borrow_mut().rising_edge(wire.now.get(), width);
        }
        Ok(())
    }

    fn sample(&mut self) -> Result<bool, Infallible> {
        self.wire.advance(1);
        Ok(self.wire.level())
    }
}

pub struct SimClock<'a> {
    wire: &'a Wire,
}

impl Clock for SimClock<'_> {
    type Instant = u16;

    fn now(&mut self) -> u16 {
        self.wire.now.get() as u16
    }
}

pub struct SimDelay<'a> {
    wire: &'a Wire,
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.wire.advance(ns.div_ceil(1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.wire.advance(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.wire.advance(ms * 1_000);
    }
}
