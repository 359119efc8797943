use crate::constants::{MAX_CHANNELS, WORD_BYTES};

/// Converts a 24-bit two's complement word to a signed 32-bit integer
pub(crate) fn sign_extend(bytes: &[u8]) -> i32 {
    let raw = ((bytes[0] as i32) << 16) | ((bytes[1] as i32) << 8) | (bytes[2] as i32);
    if raw & 0x800000 != 0 {
        raw | !0xFFFFFF
    } else {
        raw
    }
}

pub(crate) fn raw_word(bytes: &[u8]) -> u32 {
    ((bytes[0] as u32) << 16) | ((bytes[1] as u32) << 8) | (bytes[2] as u32)
}

/// The status word clocked out ahead of the channel data.
///
/// Layout: `1100` preamble, LOFF_STATP, LOFF_STATN, GPIO[4:1].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusWord(pub u32);

impl StatusWord {
    pub fn preamble_ok(&self) -> bool {
        (self.0 >> 20) & 0x0F == 0b1100
    }

    /// Lead-off flags of the positive inputs, bit n = channel n + 1
    pub fn lead_off_p(&self) -> u8 {
        (self.0 >> 12) as u8
    }

    pub fn lead_off_n(&self) -> u8 {
        (self.0 >> 4) as u8
    }

    /// GPIO input levels, bit 0 = GPIO1
    pub fn gpio(&self) -> u8 {
        (self.0 & 0x0F) as u8
    }
}

/// One conversion cycle's worth of data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleFrame {
    samples: [i32; MAX_CHANNELS],
    len: usize,
    pub status: Option<StatusWord>,
}

impl SampleFrame {
    pub(crate) fn from_words(words: &[i32], num_chs: usize, gpio: bool) -> Self {
        let mut samples = [0; MAX_CHANNELS];
        samples[..num_chs].copy_from_slice(&words[..num_chs]);
        SampleFrame {
            samples,
            len: num_chs,
            status: gpio.then(|| StatusWord(words[num_chs] as u32)),
        }
    }

    /// Channel samples, channel 1 first
    pub fn samples(&self) -> &[i32] {
        &self.samples[..self.len]
    }
}

/// Bytes on the wire for a frame of `num_chs` channels
pub(crate) fn frame_bytes(num_chs: usize) -> usize {
    WORD_BYTES * (num_chs + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extends_24_bit_words() {
        assert_eq!(sign_extend(&[0x00, 0x00, 0x01]), 1);
        assert_eq!(sign_extend(&[0x7F, 0xFF, 0xFF]), 8_388_607);
        assert_eq!(sign_extend(&[0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(sign_extend(&[0xFF, 0xFF, 0xFF]), -1);
    }

    #[test]
    fn status_word_fields() {
        let status = StatusWord(raw_word(&[0xC1, 0x28, 0x0A]));
        assert!(status.preamble_ok());
        assert_eq!(status.lead_off_p(), 0x12);
        assert_eq!(status.lead_off_n(), 0x80);
        assert_eq!(status.gpio(), 0x0A);
        assert!(!StatusWord(0).preamble_ok());
    }

    #[test]
    fn frame_keeps_requested_channels_only() {
        let frame = SampleFrame::from_words(&[5, -6, 7, 0xC0_0000], 3, true);
        assert_eq!(frame.samples(), &[5, -6, 7]);
        assert_eq!(frame.status, Some(StatusWord(0xC0_0000)));
        assert_eq!(SampleFrame::from_words(&[1, 2], 2, false).status, None);
        assert_eq!(frame_bytes(8), 27);
    }
}
