use crate::constants::*;
use crate::error::Ads129xError;

/// Driver-level settings fixed at construction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub clock: ClockSource,
}

impl Config {
    pub fn clock(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }
}

/// What is wired to a channel's inputs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelRole {
    /// Nothing connected; the channel is powered down
    Unconnected,
    /// EEG, ECG, EMG etc. Summed into the reference-lead-drive
    #[default]
    Physiological,
    /// Breathing belt or similar, kept out of the reference-lead-drive
    ExternalSensor,
    /// Impedance pneumography on an R device, channel 1 only
    ImpedancePneumography,
}

/// Acquisition session settings, validated by [`AcquisitionConfig::validate`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquisitionConfig {
    pub num_channels: u8,
    pub max_channels: u8,
    pub res_speed: ResSpeed,
    pub rld: bool,
    pub int_test: bool,
    pub resp: bool,
    pub roles: [ChannelRole; MAX_CHANNELS],
    misplaced_role: Option<usize>,
}

impl Default for AcquisitionConfig {
    /// All eight channels at high resolution and 1 kSPS with the RLD on.
    fn default() -> Self {
        AcquisitionConfig {
            num_channels: MAX_CHANNELS as u8,
            max_channels: MAX_CHANNELS as u8,
            res_speed: ResSpeed::HighRes1k,
            rld: true,
            int_test: false,
            resp: false,
            roles: [ChannelRole::Physiological; MAX_CHANNELS],
            misplaced_role: None,
        }
    }
}

/// Register writes for one configuration, in the order they go on the wire.
///
/// Mode registers come first; the chip ignores channel settings written
/// before the mode is selected.
pub struct RegisterPlan {
    writes: [(u8, u8); 5 + MAX_CHANNELS + 2],
    len: usize,
}

impl RegisterPlan {
    fn push(&mut self, reg: u8, value: u8) {
        self.writes[self.len] = (reg, value);
        self.len += 1;
    }

    pub fn writes(&self) -> &[(u8, u8)] {
        &self.writes[..self.len]
    }
}

impl AcquisitionConfig {
    pub fn new(num_channels: u8, max_channels: u8, res_speed: ResSpeed) -> Self {
        AcquisitionConfig {
            num_channels,
            max_channels,
            res_speed,
            ..Default::default()
        }
    }

    pub fn rld(mut self, enabled: bool) -> Self {
        self.rld = enabled;
        self
    }

    pub fn int_test(mut self, enabled: bool) -> Self {
        self.int_test = enabled;
        self
    }

    pub fn resp(mut self, enabled: bool) -> Self {
        self.resp = enabled;
        self
    }

    /// Assigns a role to a zero-based channel index. An index past the last
    /// channel is remembered and reported by `validate`.
    pub fn role(mut self, channel: usize, role: ChannelRole) -> Self {
        match self.roles.get_mut(channel) {
            Some(slot) => *slot = role,
            None => self.misplaced_role = Some(channel),
        }
        self
    }

    pub fn validate<BusError, GpioError>(&self) -> Result<(), Ads129xError<BusError, GpioError>> {
        if self.max_channels == 0 || self.max_channels as usize > MAX_CHANNELS {
            return Err(Ads129xError::InvalidChannelCount(self.max_channels));
        }
        if self.num_channels == 0 {
            return Err(Ads129xError::InvalidChannelCount(self.num_channels));
        }
        if self.num_channels > self.max_channels {
            return Err(Ads129xError::TooManyChannels {
                requested: self.num_channels,
                max: self.max_channels,
            });
        }
        if let Some(channel) = self.misplaced_role {
            return Err(Ads129xError::ChannelOutOfRange(channel));
        }
        if let Some(index) = self
            .roles
            .iter()
            .skip(1)
            .position(|role| *role == ChannelRole::ImpedancePneumography)
        {
            return Err(Ads129xError::InvalidChannelRole {
                channel: index as u8 + 2,
            });
        }
        Ok(())
    }

    fn active_roles(&self) -> impl Iterator<Item = (usize, ChannelRole)> + '_ {
        self.roles
            .iter()
            .copied()
            .enumerate()
            .take(self.num_channels as usize)
    }

    /// Bitmask of active physiological channels, for RLD_SENSP/N
    pub fn rld_mask(&self) -> u8 {
        if !self.rld {
            return 0x00;
        }
        self.active_roles()
            .filter(|(_, role)| *role == ChannelRole::Physiological)
            .fold(0u8, |mask, (ch, _)| mask | (1 << ch))
    }

    fn channel_setting(&self, ch: usize) -> u8 {
        let active = ch < self.num_channels as usize && self.roles[ch] != ChannelRole::Unconnected;
        match (active, self.int_test) {
            (false, _) => CHSET_POWER_DOWN,
            (true, true) => CHSET_TEST_SIGNAL,
            (true, false) => CHSET_NORMAL,
        }
    }

    /// Computes the register block for this configuration. Call `validate` first.
    pub fn register_plan(&self) -> RegisterPlan {
        let mut plan = RegisterPlan {
            writes: [(0, 0); 5 + MAX_CHANNELS + 2],
            len: 0,
        };

        plan.push(REG_CONFIG1, self.res_speed as u8);

        let config2 = if self.int_test {
            CONFIG2_INT_TEST | CONFIG2_TEST_FREQ_PULSED
        } else {
            0x00
        };
        plan.push(REG_CONFIG2, config2);

        let mut config3 = CONFIG3_BASE | CONFIG3_PD_REFBUF;
        if self.rld {
            config3 |= CONFIG3_RLDREF_INT | CONFIG3_PD_RLD;
        }
        plan.push(REG_CONFIG3, config3);

        plan.push(REG_RESP, if self.resp { RESP_ENABLED } else { RESP_DISABLED });
        plan.push(REG_CONFIG4, CONFIG4_CONTINUOUS);

        for ch in 0..self.max_channels as usize {
            plan.push(REG_CH1SET + ch as u8, self.channel_setting(ch));
        }

        let mask = self.rld_mask();
        plan.push(REG_RLD_SENSP, mask);
        plan.push(REG_RLD_SENSN, mask);

        plan
    }
}
