/// Pin numbers of the reference board wiring
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinMap {
    pub pwdn: u8,
    pub reset: u8,
    pub start: u8,
    pub clksel: u8,
    pub drdy: u8,
    pub cs: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        PinMap {
            pwdn: 2,
            reset: 3,
            start: 4,
            clksel: 6,
            drdy: 7,
            cs: 10,
        }
    }
}

/// The control and ready lines of one physical chip.
///
/// PWDN, RESET and CS are active low. DRDY is driven by the chip and goes low
/// when a conversion result is available.
pub struct ChipHandle<PWDN, RST, START, CLKSEL, CS, DRDY> {
    pub(crate) pwdn: PWDN,
    pub(crate) reset: RST,
    pub(crate) start: START,
    pub(crate) clksel: CLKSEL,
    pub(crate) cs: CS,
    pub(crate) drdy: DRDY,
}

impl<PWDN, RST, START, CLKSEL, CS, DRDY> ChipHandle<PWDN, RST, START, CLKSEL, CS, DRDY> {
    pub fn new(pwdn: PWDN, reset: RST, start: START, clksel: CLKSEL, cs: CS, drdy: DRDY) -> Self {
        ChipHandle {
            pwdn,
            reset,
            start,
            clksel,
            cs,
            drdy,
        }
    }

    /// Gives the pins back
    pub fn release(self) -> (PWDN, RST, START, CLKSEL, CS, DRDY) {
        (
            self.pwdn,
            self.reset,
            self.start,
            self.clksel,
            self.cs,
            self.drdy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_board_wiring() {
        let map = PinMap::default();
        assert_eq!(
            (map.pwdn, map.reset, map.start, map.clksel, map.drdy, map.cs),
            (2, 3, 4, 6, 7, 10)
        );
    }

    #[test]
    fn release_returns_pins_in_order() {
        let handle = ChipHandle::new(1u8, 2u8, 3u8, 4u8, 5u8, 6u8);
        assert_eq!(handle.release(), (1, 2, 3, 4, 5, 6));
    }
}
