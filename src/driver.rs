use core::fmt;
use core::result::Result;
use core::result::Result::Ok;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};

use crate::config::{AcquisitionConfig, Config};
use crate::constants::*;
use crate::error::{Ads129xError, ErrorKind};
use crate::frame::{frame_bytes, raw_word, sign_extend, SampleFrame};
use crate::pins::ChipHandle;
use crate::transport::SerialTransport;

/// Power and conversion state of the chip as last commanded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    PoweredDown,
    Standby,
    ActiveIdle,
    Converting,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerState::PoweredDown => "powered down",
            PowerState::Standby => "in standby",
            PowerState::ActiveIdle => "idle",
            PowerState::Converting => "converting",
        };
        f.write_str(name)
    }
}

/// ADS129x driver
pub struct Ads129x<BUS, PWDN, RST, START, CLKSEL, CS, DRDY, DELAY> {
    bus: BUS,
    pins: ChipHandle<PWDN, RST, START, CLKSEL, CS, DRDY>,
    delay: DELAY,
    config: Config,
    state: PowerState,
    lines_ready: bool,
    reset_held: bool,
    acquisition: Option<AcquisitionConfig>,
    device_id: Option<DeviceId>,
}

impl<BUS, PWDN, RST, START, CLKSEL, CS, DRDY, DELAY, BusError, GpioError>
    Ads129x<BUS, PWDN, RST, START, CLKSEL, CS, DRDY, DELAY>
where
    BUS: SerialTransport<Error = BusError>,
    PWDN: OutputPin<Error = GpioError>,
    RST: OutputPin<Error = GpioError>,
    START: OutputPin<Error = GpioError>,
    CLKSEL: OutputPin<Error = GpioError>,
    CS: OutputPin<Error = GpioError>,
    DRDY: InputPin<Error = GpioError>,
    DELAY: DelayNs,
{
    /// Creates a driver with the default configuration. No pin or bus activity.
    pub fn new(bus: BUS, pins: ChipHandle<PWDN, RST, START, CLKSEL, CS, DRDY>, delay: DELAY) -> Self {
        Self::with_config(bus, pins, delay, Config::default())
    }

    pub fn with_config(
        bus: BUS,
        pins: ChipHandle<PWDN, RST, START, CLKSEL, CS, DRDY>,
        delay: DELAY,
        config: Config,
    ) -> Self {
        Ads129x {
            bus,
            pins,
            delay,
            config,
            state: PowerState::PoweredDown,
            lines_ready: false,
            reset_held: false,
            acquisition: None,
            device_id: None,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Settings of the current acquisition session, if `setup` has run
    pub fn config(&self) -> Option<&AcquisitionConfig> {
        self.acquisition.as_ref()
    }

    /// ID read by the last `get_id`
    pub fn device_id(&self) -> Option<DeviceId> {
        self.device_id
    }

    pub fn release(self) -> (BUS, ChipHandle<PWDN, RST, START, CLKSEL, CS, DRDY>, DELAY) {
        (self.bus, self.pins, self.delay)
    }

    /// Drives every control line to its safe idle level: powered down, held
    /// in reset, deselected. Touches no bus. Safe to call repeatedly.
    pub fn init(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        self.state = PowerState::PoweredDown;
        self.acquisition = None;
        self.device_id = None;

        self.pins.pwdn.set_low().map_err(Ads129xError::Gpio)?;
        self.pins.reset.set_low().map_err(Ads129xError::Gpio)?;
        self.reset_held = true;
        self.pins.start.set_low().map_err(Ads129xError::Gpio)?;
        self.pins.cs.set_high().map_err(Ads129xError::Gpio)?;
        let clksel = match self.config.clock {
            ClockSource::Internal => self.pins.clksel.set_high(),
            ClockSource::External => self.pins.clksel.set_low(),
        };
        clksel.map_err(Ads129xError::Gpio)?;

        self.lines_ready = true;
        log::debug!("Control lines initialised, clock {:?}", self.config.clock);
        Ok(())
    }

    /// Asserts PWDN. Valid from every state.
    pub fn pwr_down(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        let previous = self.state;
        self.state = PowerState::PoweredDown;
        self.acquisition = None;
        self.device_id = None;
        self.pins.pwdn.set_low().map_err(Ads129xError::Gpio)?;
        log::info!("Powered down (was {})", previous);
        Ok(())
    }

    /// Powers the chip up and waits out the power-on reset.
    ///
    /// With `do_init` the RESET line is pulsed as well. Without it RESET is
    /// left alone, which only works once an earlier power-up released it.
    pub fn pwr_up(&mut self, do_init: bool) -> Result<(), Ads129xError<BusError, GpioError>> {
        if !self.lines_ready || self.state != PowerState::PoweredDown {
            return Err(Ads129xError::ProtocolViolation {
                operation: "pwr_up",
                state: self.state,
            });
        }
        if !do_init && self.reset_held {
            return Err(Ads129xError::ProtocolViolation {
                operation: "pwr_up without reset while RESET is held",
                state: self.state,
            });
        }

        self.guarded(|this| {
            this.pins.pwdn.set_high().map_err(Ads129xError::Gpio)?;
            this.delay.delay_ms(POWER_UP_SETTLE_MS);

            if do_init {
                this.pins.reset.set_low().map_err(Ads129xError::Gpio)?;
                this.delay.delay_us(RESET_PULSE_US);
                this.pins.reset.set_high().map_err(Ads129xError::Gpio)?;
                this.reset_held = false;
                this.delay.delay_us(RESET_SETTLE_US);
            }

            // The chip comes up in read-data-continuous mode, which locks out register access
            this.command(CMD_SDATAC)?;
            this.state = PowerState::ActiveIdle;
            log::info!("Powered up (reset: {})", do_init);
            Ok(())
        })
    }

    /// Full bring-up: idle lines, power-up with reset, default acquisition setup
    pub fn begin(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        self.init()?;
        self.pwr_up(true)?;
        self.configure(&AcquisitionConfig::default())
    }

    pub fn standby(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        match self.state {
            PowerState::ActiveIdle | PowerState::Standby => {}
            state => {
                return Err(Ads129xError::ProtocolViolation {
                    operation: "standby",
                    state,
                })
            }
        }
        self.guarded(|this| this.command(CMD_STANDBY))?;
        self.state = PowerState::Standby;
        Ok(())
    }

    pub fn wakeup(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        match self.state {
            PowerState::ActiveIdle | PowerState::Standby => {}
            state => {
                return Err(Ads129xError::ProtocolViolation {
                    operation: "wakeup",
                    state,
                })
            }
        }
        self.guarded(|this| this.command(CMD_WAKEUP))?;
        self.state = PowerState::ActiveIdle;
        Ok(())
    }

    /// Software reset. Register contents return to their defaults, so the
    /// acquisition session is dropped.
    pub fn reset(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        match self.state {
            PowerState::ActiveIdle | PowerState::Standby => {}
            state => {
                return Err(Ads129xError::ProtocolViolation {
                    operation: "reset",
                    state,
                })
            }
        }
        self.guarded(|this| {
            this.command(CMD_RESET)?;
            this.delay.delay_us(RESET_SETTLE_US);
            this.command(CMD_SDATAC)
        })?;
        self.state = PowerState::ActiveIdle;
        self.acquisition = None;
        Ok(())
    }

    /// Sends a single-byte command that leaves the chip's mode alone.
    ///
    /// Mode-changing opcodes (START, STOP, RDATAC, SDATAC, STANDBY, WAKEUP,
    /// RESET) and the RREG/WREG prefixes are refused: use `start_c`, `stop_c`,
    /// `standby`, `wakeup`, `reset` and the register methods, which keep
    /// `state()` in step with the chip. Nothing is accepted while converting.
    pub fn send_cmd(&mut self, opcode: u8) -> Result<(), Ads129xError<BusError, GpioError>> {
        match self.state {
            PowerState::PoweredDown | PowerState::Converting => {
                return Err(Ads129xError::ProtocolViolation {
                    operation: "send_cmd",
                    state: self.state,
                })
            }
            PowerState::ActiveIdle | PowerState::Standby => {}
        }
        if changes_mode(opcode) {
            return Err(Ads129xError::ProtocolViolation {
                operation: "send_cmd with a mode-changing opcode",
                state: self.state,
            });
        }
        self.guarded(|this| this.command(opcode))
    }

    /// Writes a single register
    pub fn write_register(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), Ads129xError<BusError, GpioError>> {
        check_register_address(reg)?;
        self.check_register_access("write_register")?;
        self.guarded(|this| this.transfer_write_register(reg, value))
    }

    /// Reads a single register
    pub fn read_register(&mut self, reg: u8) -> Result<u8, Ads129xError<BusError, GpioError>> {
        check_register_address(reg)?;
        self.check_register_access("read_register")?;
        self.guarded(|this| this.transfer_read_register(reg))
    }

    /// Reads and decodes the ID register. Informational only.
    pub fn get_id(&mut self) -> Result<DeviceId, Ads129xError<BusError, GpioError>> {
        let id = DeviceId(self.read_register(REG_ID)?);
        match id.model() {
            Some(model) => log::info!("Found {:?} (ID 0x{:02X})", model, id.0),
            None => log::warn!("Unrecognised device ID 0x{:02X}", id.0),
        }
        self.device_id = Some(id);
        Ok(id)
    }

    pub fn dump_registers(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        for (reg, name) in REGISTER_NAMES.iter() {
            let value = self.read_register(*reg)?;
            log::debug!("Register {}: 0x{:02X}", name, value);
        }
        Ok(())
    }

    /// Configures acquisition with every channel treated as physiological
    pub fn setup(
        &mut self,
        num_chs: u8,
        max_chs: u8,
        res_speed: ResSpeed,
        rld: bool,
        int_test: bool,
        resp: bool,
    ) -> Result<(), Ads129xError<BusError, GpioError>> {
        let config = AcquisitionConfig::new(num_chs, max_chs, res_speed)
            .rld(rld)
            .int_test(int_test)
            .resp(resp);
        self.configure(&config)
    }

    /// Validates `config` and writes the full register block for it
    pub fn configure(
        &mut self,
        config: &AcquisitionConfig,
    ) -> Result<(), Ads129xError<BusError, GpioError>> {
        config.validate::<BusError, GpioError>()?;
        if self.state != PowerState::ActiveIdle {
            return Err(Ads129xError::WrongPowerState {
                operation: "setup",
                state: self.state,
            });
        }
        if config.resp && self.device_id.is_some_and(|id| !id.has_respiration()) {
            log::warn!("Respiration requested on a part without respiration circuitry");
        }

        let plan = config.register_plan();
        self.guarded(|this| {
            for &(reg, value) in plan.writes() {
                this.transfer_write_register(reg, value)?;
            }
            Ok(())
        })?;

        self.acquisition = Some(*config);
        log::info!(
            "Acquisition set up: {} of {} channels at {} SPS",
            config.num_channels,
            config.max_channels,
            config.res_speed.sps()
        );
        Ok(())
    }

    /// Starts continuous conversion. DRDY then falls once per sample period.
    pub fn start_c(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        if self.state != PowerState::ActiveIdle {
            return Err(Ads129xError::ProtocolViolation {
                operation: "start_c",
                state: self.state,
            });
        }
        if self.acquisition.is_none() {
            return Err(Ads129xError::NotConfigured);
        }
        self.guarded(|this| {
            this.command(CMD_START)?;
            this.command(CMD_RDATAC)
        })?;
        self.state = PowerState::Converting;
        log::info!("Continuous conversion started");
        Ok(())
    }

    /// Stops continuous conversion and returns to register-access mode
    pub fn stop_c(&mut self) -> Result<(), Ads129xError<BusError, GpioError>> {
        if self.state != PowerState::Converting {
            return Err(Ads129xError::ProtocolViolation {
                operation: "stop_c",
                state: self.state,
            });
        }
        self.guarded(|this| {
            this.command(CMD_SDATAC)?;
            this.command(CMD_STOP)
        })?;
        self.state = PowerState::ActiveIdle;
        log::info!("Continuous conversion stopped");
        Ok(())
    }

    /// Returns true while DRDY is asserted (low)
    pub fn data_ready(&mut self) -> Result<bool, Ads129xError<BusError, GpioError>> {
        self.guarded(|this| this.pins.drdy.is_low().map_err(Ads129xError::Gpio))
    }

    /// Clocks out one conversion frame.
    ///
    /// Call after DRDY has fallen. Writes `num_chs` channel words into
    /// `buffer`, then the status word if `gpio` is set, and returns the
    /// number of words written.
    pub fn fetch_data(
        &mut self,
        buffer: &mut [i32],
        num_chs: u8,
        gpio: bool,
    ) -> Result<usize, Ads129xError<BusError, GpioError>> {
        if self.state != PowerState::Converting {
            return Err(Ads129xError::ProtocolViolation {
                operation: "fetch_data",
                state: self.state,
            });
        }
        let configured = self
            .acquisition
            .map(|config| config.num_channels)
            .ok_or(Ads129xError::NotConfigured)?;
        if num_chs == 0 {
            return Err(Ads129xError::InvalidChannelCount(num_chs));
        }
        if num_chs > configured {
            return Err(Ads129xError::TooManyChannels {
                requested: num_chs,
                max: configured,
            });
        }
        let channels = num_chs as usize;
        let words = channels + gpio as usize;
        if buffer.len() < words {
            return Err(Ads129xError::BufferTooSmall {
                required: words,
                actual: buffer.len(),
            });
        }

        let mut frame = [0u8; MAX_FRAME_BYTES];
        let len = frame_bytes(channels);
        self.guarded(|this| {
            this.pins.cs.set_low().map_err(Ads129xError::Gpio)?;
            this.bus
                .transfer_in_place(&mut frame[..len])
                .map_err(Ads129xError::Bus)?;
            this.pins.cs.set_high().map_err(Ads129xError::Gpio)
        })?;
        let raw = &frame[..len];
        log::trace!("Frame: {:02X?}", raw);

        // The status word leads on the wire
        let (status, samples) = raw.split_at(WORD_BYTES);
        for (word, bytes) in buffer[..channels]
            .iter_mut()
            .zip(samples.chunks_exact(WORD_BYTES))
        {
            *word = sign_extend(bytes);
        }
        if gpio {
            buffer[channels] = raw_word(status) as i32;
        }
        Ok(words)
    }

    /// `fetch_data` into an owned frame
    pub fn read_frame(
        &mut self,
        num_chs: u8,
        gpio: bool,
    ) -> Result<SampleFrame, Ads129xError<BusError, GpioError>> {
        let mut words = [0i32; MAX_CHANNELS + 1];
        self.fetch_data(&mut words, num_chs, gpio)?;
        Ok(SampleFrame::from_words(&words, num_chs as usize, gpio))
    }

    fn check_register_access(
        &self,
        operation: &'static str,
    ) -> Result<(), Ads129xError<BusError, GpioError>> {
        match self.state {
            PowerState::PoweredDown => Err(Ads129xError::WrongPowerState {
                operation,
                state: self.state,
            }),
            // Register writes during RDATAC are silently dropped by the chip
            PowerState::Converting => Err(Ads129xError::ProtocolViolation {
                operation,
                state: self.state,
            }),
            PowerState::Standby | PowerState::ActiveIdle => Ok(()),
        }
    }

    /// Runs a bus sequence; a transport fault inside it powers the chip down
    fn guarded<T>(
        &mut self,
        sequence: impl FnOnce(&mut Self) -> Result<T, Ads129xError<BusError, GpioError>>,
    ) -> Result<T, Ads129xError<BusError, GpioError>> {
        let result = sequence(self);
        if let Err(err) = &result {
            if err.kind() == ErrorKind::Transport {
                self.force_power_down();
            }
        }
        result
    }

    fn force_power_down(&mut self) {
        let _ = self.pins.cs.set_high();
        let _ = self.pins.pwdn.set_low();
        self.state = PowerState::PoweredDown;
        self.acquisition = None;
        self.device_id = None;
        log::error!("Transport fault, chip forced into power-down");
    }

    fn command(&mut self, opcode: u8) -> Result<(), Ads129xError<BusError, GpioError>> {
        self.pins.cs.set_low().map_err(Ads129xError::Gpio)?;
        log::debug!("Sending command: 0x{:02X}", opcode);
        self.bus.write(&[opcode]).map_err(Ads129xError::Bus)?;
        self.pins.cs.set_high().map_err(Ads129xError::Gpio)?;
        self.delay.delay_us(DECODE_DELAY_US);
        Ok(())
    }

    /// Sends the opcode and count bytes of a single-register RREG/WREG
    fn register_request(
        &mut self,
        opcode: u8,
    ) -> Result<(), Ads129xError<BusError, GpioError>> {
        self.bus.transfer_byte(opcode).map_err(Ads129xError::Bus)?;
        self.delay.delay_us(DECODE_DELAY_US);
        self.bus.transfer_byte(0x00).map_err(Ads129xError::Bus)?;
        self.delay.delay_us(DECODE_DELAY_US);
        Ok(())
    }

    fn transfer_write_register(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), Ads129xError<BusError, GpioError>> {
        self.pins.cs.set_low().map_err(Ads129xError::Gpio)?;
        self.register_request(CMD_WREG | reg)?;
        self.bus.transfer_byte(value).map_err(Ads129xError::Bus)?;
        self.pins.cs.set_high().map_err(Ads129xError::Gpio)?;
        log::debug!("Wrote register 0x{:02X}: 0x{:02X}", reg, value);
        Ok(())
    }

    fn transfer_read_register(&mut self, reg: u8) -> Result<u8, Ads129xError<BusError, GpioError>> {
        self.pins.cs.set_low().map_err(Ads129xError::Gpio)?;
        self.register_request(CMD_RREG | reg)?;
        let value = self.bus.transfer_byte(0x00).map_err(Ads129xError::Bus)?;
        self.pins.cs.set_high().map_err(Ads129xError::Gpio)?;
        log::debug!("Read register 0x{:02X}: 0x{:02X}", reg, value);
        Ok(value)
    }
}

/// Opcodes that move the chip between power or data modes, plus the register
/// prefixes whose operands a lone byte would leave dangling
fn changes_mode(opcode: u8) -> bool {
    matches!(
        opcode,
        CMD_WAKEUP | CMD_STANDBY | CMD_RESET | CMD_START | CMD_STOP | CMD_RDATAC | CMD_SDATAC
    ) || matches!(opcode & 0xE0, CMD_RREG | CMD_WREG)
}

fn check_register_address<BusError, GpioError>(
    reg: u8,
) -> Result<(), Ads129xError<BusError, GpioError>> {
    if reg > REG_WCT2 {
        return Err(Ads129xError::InvalidRegister(reg));
    }
    Ok(())
}
