/// ADS129x Commands
pub const CMD_WAKEUP: u8 = 0x02;
pub const CMD_STANDBY: u8 = 0x04;
pub const CMD_RESET: u8 = 0x06;
pub const CMD_START: u8 = 0x08;
pub const CMD_STOP: u8 = 0x0A;
pub const CMD_RDATAC: u8 = 0x10;
pub const CMD_SDATAC: u8 = 0x11;
pub const CMD_RDATA: u8 = 0x12;
pub const CMD_RREG: u8 = 0x20;
pub const CMD_WREG: u8 = 0x40;

/// ADS129x Registers
pub const REG_ID: u8 = 0x00;
pub const REG_CONFIG1: u8 = 0x01;
pub const REG_CONFIG2: u8 = 0x02;
pub const REG_CONFIG3: u8 = 0x03;
pub const REG_LOFF: u8 = 0x04;
pub const REG_CH1SET: u8 = 0x05;
pub const REG_RLD_SENSP: u8 = 0x0D;
pub const REG_RLD_SENSN: u8 = 0x0E;
pub const REG_LOFF_SENSP: u8 = 0x0F;
pub const REG_LOFF_SENSN: u8 = 0x10;
pub const REG_LOFF_FLIP: u8 = 0x11;
pub const REG_LOFF_STATP: u8 = 0x12;
pub const REG_LOFF_STATN: u8 = 0x13;
pub const REG_GPIO: u8 = 0x14;
pub const REG_PACE: u8 = 0x15;
pub const REG_RESP: u8 = 0x16;
pub const REG_CONFIG4: u8 = 0x17;
pub const REG_WCT1: u8 = 0x18;
pub const REG_WCT2: u8 = 0x19;

pub const REGISTER_NAMES: [(u8, &str); 26] = [
    (REG_ID, "ID"),
    (REG_CONFIG1, "CONFIG1"),
    (REG_CONFIG2, "CONFIG2"),
    (REG_CONFIG3, "CONFIG3"),
    (REG_LOFF, "LOFF"),
    (REG_CH1SET, "CH1SET"),
    (REG_CH1SET + 1, "CH2SET"),
    (REG_CH1SET + 2, "CH3SET"),
    (REG_CH1SET + 3, "CH4SET"),
    (REG_CH1SET + 4, "CH5SET"),
    (REG_CH1SET + 5, "CH6SET"),
    (REG_CH1SET + 6, "CH7SET"),
    (REG_CH1SET + 7, "CH8SET"),
    (REG_RLD_SENSP, "RLD_SENSP"),
    (REG_RLD_SENSN, "RLD_SENSN"),
    (REG_LOFF_SENSP, "LOFF_SENSP"),
    (REG_LOFF_SENSN, "LOFF_SENSN"),
    (REG_LOFF_FLIP, "LOFF_FLIP"),
    (REG_LOFF_STATP, "LOFF_STATP"),
    (REG_LOFF_STATN, "LOFF_STATN"),
    (REG_GPIO, "GPIO"),
    (REG_PACE, "PACE"),
    (REG_RESP, "RESP"),
    (REG_CONFIG4, "CONFIG4"),
    (REG_WCT1, "WCT1"),
    (REG_WCT2, "WCT2"),
];

/// CONFIG2 bits
pub const CONFIG2_INT_TEST: u8 = 0x10;
pub const CONFIG2_TEST_FREQ_PULSED: u8 = 0x01;

/// CONFIG3 bits (bit 6 is reserved and must be written as 1)
pub const CONFIG3_BASE: u8 = 0x40;
pub const CONFIG3_PD_REFBUF: u8 = 0x80;
pub const CONFIG3_RLDREF_INT: u8 = 0x08;
pub const CONFIG3_PD_RLD: u8 = 0x04;

/// CHnSET values
pub const CHSET_NORMAL: u8 = 0x00;
pub const CHSET_TEST_SIGNAL: u8 = 0x05;
pub const CHSET_POWER_DOWN: u8 = 0x81;

/// RESP values (bit 5 is reserved and must be written as 1)
pub const RESP_DISABLED: u8 = 0x20;
pub const RESP_ENABLED: u8 = 0xEA;

pub const CONFIG4_CONTINUOUS: u8 = 0x00;

/// Largest channel count in the family
pub const MAX_CHANNELS: usize = 8;
/// Bytes per channel word and per status word
pub const WORD_BYTES: usize = 3;
pub const MAX_FRAME_BYTES: usize = WORD_BYTES * (MAX_CHANNELS + 1);

// Timing minimums at fCLK = 2.048 MHz (tCLK ~ 488 ns).
/// Power-on reset: 2^18 tCLK, rounded up.
pub const POWER_UP_SETTLE_MS: u32 = 150;
/// RESET low pulse width: at least 2 tCLK.
pub const RESET_PULSE_US: u32 = 2;
/// Wait after RESET release before the first command: 18 tCLK.
pub const RESET_SETTLE_US: u32 = 10;
/// Command decode time between multi-byte command phases: 4 tCLK.
pub const DECODE_DELAY_US: u32 = 2;

/// Resolution / data rate selector, written to CONFIG1.
///
/// Bit 7 selects high-resolution mode; bits 2:0 are the data rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResSpeed {
    HighRes32k = 0x80,
    HighRes16k = 0x81,
    HighRes8k = 0x82,
    HighRes4k = 0x83,
    HighRes2k = 0x84,
    HighRes1k = 0x85,
    HighRes500 = 0x86,
    LowPower16k = 0x00,
    LowPower8k = 0x01,
    LowPower4k = 0x02,
    LowPower2k = 0x03,
    LowPower1k = 0x04,
    LowPower500 = 0x05,
    LowPower250 = 0x06,
}

impl ResSpeed {
    /// Output data rate in samples per second
    pub fn sps(&self) -> u32 {
        let dr = (*self as u8) & 0x07;
        let base = if self.is_high_res() { 32_000 } else { 16_000 };
        base >> dr
    }

    pub fn is_high_res(&self) -> bool {
        (*self as u8) & 0x80 != 0
    }
}

/// Conversion clock source, selected by the CLKSEL line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockSource {
    #[default]
    Internal,
    External,
}

/// Members of the family, as reported by the ID register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    Ads1294,
    Ads1296,
    Ads1298,
    Ads1294R,
    Ads1296R,
    Ads1298R,
}

/// Decoded ID register
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceId(pub u8);

impl DeviceId {
    pub fn model(&self) -> Option<Model> {
        // DEV_ID[7:5]: 100 = ADS129x, 110 = ADS129xR; bits 4:3 read back as 10.
        if self.0 & 0x18 != 0x10 {
            return None;
        }
        let respiration = match self.0 >> 5 {
            0b100 => false,
            0b110 => true,
            _ => return None,
        };
        match (self.0 & 0x07, respiration) {
            (0b000, false) => Some(Model::Ads1294),
            (0b001, false) => Some(Model::Ads1296),
            (0b010, false) => Some(Model::Ads1298),
            (0b000, true) => Some(Model::Ads1294R),
            (0b001, true) => Some(Model::Ads1296R),
            (0b010, true) => Some(Model::Ads1298R),
            _ => None,
        }
    }

    /// Number of channels the part provides
    pub fn channels(&self) -> Option<u8> {
        self.model().map(|model| match model {
            Model::Ads1294 | Model::Ads1294R => 4,
            Model::Ads1296 | Model::Ads1296R => 6,
            Model::Ads1298 | Model::Ads1298R => 8,
        })
    }

    pub fn has_respiration(&self) -> bool {
        matches!(
            self.model(),
            Some(Model::Ads1294R | Model::Ads1296R | Model::Ads1298R)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn res_speed_rates() {
        assert_eq!(ResSpeed::HighRes32k.sps(), 32_000);
        assert_eq!(ResSpeed::HighRes1k.sps(), 1_000);
        assert_eq!(ResSpeed::HighRes500.sps(), 500);
        assert_eq!(ResSpeed::LowPower16k.sps(), 16_000);
        assert_eq!(ResSpeed::LowPower250.sps(), 250);
        assert!(!ResSpeed::LowPower1k.is_high_res());
    }

    #[test]
    fn decodes_family_ids() {
        assert_eq!(DeviceId(0x92).model(), Some(Model::Ads1298));
        assert_eq!(DeviceId(0x90).channels(), Some(4));
        assert_eq!(DeviceId(0xD1).model(), Some(Model::Ads1296R));
        assert!(DeviceId(0xD2).has_respiration());
        assert!(!DeviceId(0x92).has_respiration());
    }

    #[test]
    fn rejects_foreign_ids() {
        // ADS1299 and a floating MISO line
        assert_eq!(DeviceId(0x3E).model(), None);
        assert_eq!(DeviceId(0xFF).model(), None);
        assert_eq!(DeviceId(0x00).channels(), None);
    }
}
