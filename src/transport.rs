//! Byte-level serial transports.
//!
//! The chip talks SPI mode 1 (CPOL = 0, CPHA = 1). Chip select is not part of
//! the transport: the driver frames every transaction with its own CS pin so
//! that it can hold CS low across the decode delays inside a command.

use core::fmt::Debug;

use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
    spi::{Mode, SpiBus, MODE_1},
};

/// Bus mode to configure a hardware SPI peripheral with
pub const MODE: Mode = MODE_1;

/// Full-duplex byte exchange with the chip
pub trait SerialTransport {
    type Error: Debug;

    /// Shifts `out` to the chip and returns the byte shifted in at the same time
    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            self.transfer_byte(byte)?;
        }
        Ok(())
    }

    /// Exchanges `buffer` in one continuous burst, replacing it with the received bytes
    fn transfer_in_place(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        for byte in buffer.iter_mut() {
            *byte = self.transfer_byte(*byte)?;
        }
        Ok(())
    }
}

/// A hardware SPI peripheral without its own chip select
pub struct HardwareSpi<SPI> {
    spi: SPI,
}

impl<SPI: SpiBus> HardwareSpi<SPI> {
    pub fn new(spi: SPI) -> Self {
        HardwareSpi { spi }
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI: SpiBus> SerialTransport for HardwareSpi<SPI> {
    type Error = SPI::Error;

    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        let mut buffer = [out];
        self.spi.transfer_in_place(&mut buffer)?;
        self.spi.flush()?;
        Ok(buffer[0])
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes)?;
        self.spi.flush()
    }

    fn transfer_in_place(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.transfer_in_place(buffer)?;
        self.spi.flush()
    }
}

#[derive(Debug)]
pub enum SoftSpiError<E> {
    Pin(E),
}

/// Bit-banged SPI, mode 1.
///
/// SCLK idles low. MOSI changes after the rising edge and MISO is sampled on
/// the falling edge.
pub struct SoftSpi<SCK, MOSI, MISO, DELAY> {
    sck: SCK,
    mosi: MOSI,
    miso: MISO,
    delay: DELAY,
    half_period_ns: u32,
}

impl<SCK, MOSI, MISO, DELAY, E> SoftSpi<SCK, MOSI, MISO, DELAY>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
    DELAY: DelayNs,
{
    /// `half_period_ns` sets the clock rate; the chip accepts SCLK periods down to 50 ns.
    pub fn new(
        mut sck: SCK,
        mosi: MOSI,
        miso: MISO,
        delay: DELAY,
        half_period_ns: u32,
    ) -> Result<Self, SoftSpiError<E>> {
        sck.set_low().map_err(SoftSpiError::Pin)?;
        Ok(SoftSpi {
            sck,
            mosi,
            miso,
            delay,
            half_period_ns,
        })
    }

    pub fn release(self) -> (SCK, MOSI, MISO, DELAY) {
        (self.sck, self.mosi, self.miso, self.delay)
    }
}

impl<SCK, MOSI, MISO, DELAY, E> SerialTransport for SoftSpi<SCK, MOSI, MISO, DELAY>
where
    SCK: OutputPin<Error = E>,
    MOSI: OutputPin<Error = E>,
    MISO: InputPin<Error = E>,
    DELAY: DelayNs,
    E: Debug,
{
    type Error = SoftSpiError<E>;

    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        let mut received = 0u8;
        for bit in (0..8).rev() {
            self.sck.set_high().map_err(SoftSpiError::Pin)?;
            if out & (1 << bit) != 0 {
                self.mosi.set_high().map_err(SoftSpiError::Pin)?;
            } else {
                self.mosi.set_low().map_err(SoftSpiError::Pin)?;
            }
            self.delay.delay_ns(self.half_period_ns);
            self.sck.set_low().map_err(SoftSpiError::Pin)?;
            if self.miso.is_high().map_err(SoftSpiError::Pin)? {
                received |= 1 << bit;
            }
            self.delay.delay_ns(self.half_period_ns);
        }
        Ok(received)
    }
}

#[derive(Debug)]
pub enum TransportError<H, S> {
    Hardware(H),
    Soft(S),
}

/// Either transport, picked at runtime from board configuration
pub enum Transport<H, S> {
    Hardware(H),
    Soft(S),
}

impl<H, S> SerialTransport for Transport<H, S>
where
    H: SerialTransport,
    S: SerialTransport,
{
    type Error = TransportError<H::Error, S::Error>;

    fn transfer_byte(&mut self, out: u8) -> Result<u8, Self::Error> {
        match self {
            Transport::Hardware(bus) => bus.transfer_byte(out).map_err(TransportError::Hardware),
            Transport::Soft(bus) => bus.transfer_byte(out).map_err(TransportError::Soft),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        match self {
            Transport::Hardware(bus) => bus.write(bytes).map_err(TransportError::Hardware),
            Transport::Soft(bus) => bus.write(bytes).map_err(TransportError::Soft),
        }
    }

    fn transfer_in_place(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error> {
        match self {
            Transport::Hardware(bus) => bus
                .transfer_in_place(buffer)
                .map_err(TransportError::Hardware),
            Transport::Soft(bus) => bus.transfer_in_place(buffer).map_err(TransportError::Soft),
        }
    }
}
