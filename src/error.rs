use core::fmt;

use crate::driver::PowerState;

#[derive(Debug)]
pub enum Ads129xError<BusError, GpioError> {
    Bus(BusError),
    Gpio(GpioError),
    /// Requested channel count exceeds the device maximum
    TooManyChannels { requested: u8, max: u8 },
    /// Zero channels, or a device maximum above what the family provides
    InvalidChannelCount(u8),
    /// Impedance pneumography requested on a channel other than channel 1
    InvalidChannelRole { channel: u8 },
    /// Role assigned to a zero-based channel index the family does not have
    ChannelOutOfRange(usize),
    /// Address beyond the last register (WCT2)
    InvalidRegister(u8),
    /// Register or setup operation issued in a power state that forbids it
    WrongPowerState {
        operation: &'static str,
        state: PowerState,
    },
    /// Acquisition started before `setup`
    NotConfigured,
    BufferTooSmall { required: usize, actual: usize },
    /// Operation issued out of the power state machine's order
    ProtocolViolation {
        operation: &'static str,
        state: PowerState,
    },
}

/// Coarse classification of [`Ads129xError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Protocol,
    Transport,
}

impl<BusError, GpioError> Ads129xError<BusError, GpioError> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Ads129xError::Bus(_) | Ads129xError::Gpio(_) => ErrorKind::Transport,
            Ads129xError::ProtocolViolation { .. } => ErrorKind::Protocol,
            Ads129xError::TooManyChannels { .. }
            | Ads129xError::InvalidChannelCount(_)
            | Ads129xError::InvalidChannelRole { .. }
            | Ads129xError::ChannelOutOfRange(_)
            | Ads129xError::InvalidRegister(_)
            | Ads129xError::WrongPowerState { .. }
            | Ads129xError::NotConfigured
            | Ads129xError::BufferTooSmall { .. } => ErrorKind::Configuration,
        }
    }
}

impl<BusError: fmt::Debug, GpioError: fmt::Debug> fmt::Display
    for Ads129xError<BusError, GpioError>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ads129xError::Bus(e) => write!(f, "serial bus error: {e:?}"),
            Ads129xError::Gpio(e) => write!(f, "gpio error: {e:?}"),
            Ads129xError::TooManyChannels { requested, max } => {
                write!(f, "{requested} channels requested, device provides {max}")
            }
            Ads129xError::InvalidChannelCount(n) => write!(f, "invalid channel count {n}"),
            Ads129xError::InvalidChannelRole { channel } => write!(
                f,
                "impedance pneumography is only available on channel 1, not {channel}"
            ),
            Ads129xError::ChannelOutOfRange(index) => {
                write!(f, "channel index {index} out of range")
            }
            Ads129xError::InvalidRegister(reg) => write!(f, "no register at address 0x{reg:02X}"),
            Ads129xError::WrongPowerState { operation, state } => {
                write!(f, "{operation} not allowed while {state}")
            }
            Ads129xError::NotConfigured => write!(f, "acquisition has not been set up"),
            Ads129xError::BufferTooSmall { required, actual } => {
                write!(f, "buffer holds {actual} words, {required} required")
            }
            Ads129xError::ProtocolViolation { operation, state } => {
                write!(f, "protocol violation: {operation} issued while {state}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<BusError: fmt::Debug, GpioError: fmt::Debug> std::error::Error
    for Ads129xError<BusError, GpioError>
{
}
