use crate::consts;
use crate::error::{Error, Result};
use std::fmt;

/// Represents a valid GPIO pin number (0-39).
/// Use `GpioPin::new(num)` to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpioPin(pub(crate) u8);

impl GpioPin {
    /// Creates a new GpioPin, returning an error if the number is out of range (0-39).
    pub fn new(pin_num: u8) -> Result<Self> {
        if pin_num <= consts::GPIO_MAX {
            Ok(GpioPin(pin_num))
        } else {
            Err(Error::PinArgumentOutOfRange {
                pin: pin_num,
                message: format!("Pin number must be 0-{}", consts::GPIO_MAX),
            })
        }
    }

    /// Returns the underlying pin number.
    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// The four pin roles of an I2S unit.
///
/// Bit-clock and word-select are always routed. Data-out and data-in are
/// optional: a receive-only unit leaves `data_out` unset, a transmit-only
/// unit leaves `data_in` unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct I2sPins {
    /// Bit clock (BCK / SCK).
    pub bck: GpioPin,
    /// Word select (WS / LRCK).
    pub ws: GpioPin,
    /// Serial data out, if transmitting.
    pub data_out: Option<GpioPin>,
    /// Serial data in, if receiving.
    pub data_in: Option<GpioPin>,
}

impl I2sPins {
    /// Pins for a unit that only transmits.
    pub fn tx(bck: GpioPin, ws: GpioPin, data_out: GpioPin) -> Self {
        Self {
            bck,
            ws,
            data_out: Some(data_out),
            data_in: None,
        }
    }

    /// Pins for a unit that only receives.
    pub fn rx(bck: GpioPin, ws: GpioPin, data_in: GpioPin) -> Self {
        Self {
            bck,
            ws,
            data_out: None,
            data_in: Some(data_in),
        }
    }

    /// Pins that must be locked, in locking order:
    /// bit-clock, word-select, then data-out and data-in when used.
    pub fn required(&self) -> impl Iterator<Item = GpioPin> + '_ {
        [Some(self.bck), Some(self.ws), self.data_out, self.data_in]
            .into_iter()
            .flatten()
    }
}

impl fmt::Display for I2sPins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn optional(pin: Option<GpioPin>) -> String {
            pin.map_or_else(|| "-".to_string(), |p| p.to_string())
        }
        write!(
            f,
            "bck={} ws={} dout={} din={}",
            self.bck,
            self.ws,
            optional(self.data_out),
            optional(self.data_in)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(n: u8) -> GpioPin {
        GpioPin::new(n).unwrap()
    }

    #[test]
    fn test_gpio_pin_creation() {
        assert_eq!(GpioPin::new(0).unwrap().number(), 0);
        assert_eq!(GpioPin::new(39).unwrap().number(), 39);
        match GpioPin::new(40) {
            Err(Error::PinArgumentOutOfRange { pin, .. }) => assert_eq!(pin, 40),
            other => panic!("Expected PinArgumentOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_required_pin_order() {
        let pins = I2sPins {
            bck: pin(26),
            ws: pin(25),
            data_out: Some(pin(22)),
            data_in: Some(pin(23)),
        };
        let order: Vec<u8> = pins.required().map(|p| p.number()).collect();
        assert_eq!(order, vec![26, 25, 22, 23]);
    }

    #[test]
    fn test_unused_data_pins_are_skipped() {
        let pins = I2sPins::rx(pin(14), pin(15), pin(32));
        let order: Vec<u8> = pins.required().map(|p| p.number()).collect();
        assert_eq!(order, vec![14, 15, 32]);
        assert_eq!(pins.to_string(), "bck=GPIO14 ws=GPIO15 dout=- din=GPIO32");
    }
}
