#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod config;
mod constants;
mod driver;
mod error;
mod frame;
mod pins;
#[cfg(test)]
mod sim;
mod transport;

pub use config::{AcquisitionConfig, ChannelRole, Config, RegisterPlan};
pub use constants::{ClockSource, DeviceId, Model, ResSpeed, MAX_CHANNELS};
pub use driver::{Ads129x, PowerState};
pub use error::{Ads129xError, ErrorKind};
pub use frame::{SampleFrame, StatusWord};
pub use pins::{ChipHandle, PinMap};
pub use transport::{
    HardwareSpi, SerialTransport, SoftSpi, SoftSpiError, Transport, TransportError, MODE,
};

/// Opcodes and register addresses, for `send_cmd`, `read_register` and `write_register`
pub mod registers {
    pub use crate::constants::{
        CMD_RDATA, CMD_RDATAC, CMD_RESET, CMD_RREG, CMD_SDATAC, CMD_STANDBY, CMD_START, CMD_STOP,
        CMD_WAKEUP, CMD_WREG, REG_CH1SET, REG_CONFIG1, REG_CONFIG2, REG_CONFIG3, REG_CONFIG4,
        REG_GPIO, REG_ID, REG_LOFF, REG_LOFF_FLIP, REG_LOFF_SENSN, REG_LOFF_SENSP,
        REG_LOFF_STATN, REG_LOFF_STATP, REG_PACE, REG_RESP, REG_RLD_SENSN, REG_RLD_SENSP,
        REG_WCT1, REG_WCT2,
    };
}
