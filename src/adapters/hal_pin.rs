//! Digital safety pins over `embedded-hal`.
//!
//! [`HalInput`] turns any [`InputPin`] into the tri-state [`PinLevel`]
//! the safety checks expect: a read error becomes [`PinLevel::Error`]
//! instead of a guess.  [`HalOutput`] drives an enable line.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use log::warn;

use crate::app::ports::PinLevel;

pub struct HalInput<P> {
    name: &'static str,
    pin: P,
}

impl<P: InputPin> HalInput<P> {
    pub fn new(name: &'static str, pin: P) -> Self {
        Self { name, pin }
    }

    pub fn level(&mut self) -> PinLevel {
        match self.pin.is_high() {
            Ok(true) => PinLevel::High,
            Ok(false) => PinLevel::Low,
            Err(e) => {
                warn!("{} pin read failed: {e:?}", self.name);
                PinLevel::Error
            }
        }
    }
}

pub struct HalOutput<P> {
    name: &'static str,
    pin: P,
}

impl<P: OutputPin> HalOutput<P> {
    pub fn new(name: &'static str, pin: P) -> Self {
        Self { name, pin }
    }

    /// Drive the line high.  Returns false on a pin error.
    pub fn set(&mut self) -> bool {
        self.pin
            .set_high()
            .inspect_err(|e| warn!("{} pin set failed: {e:?}", self.name))
            .is_ok()
    }

    /// Drive the line low.  Returns false on a pin error.
    pub fn clear(&mut self) -> bool {
        self.pin
            .set_low()
            .inspect_err(|e| warn!("{} pin clear failed: {e:?}", self.name))
            .is_ok()
    }
}

// ---------------------------------------------------------------------------
// Simulated pin
// ---------------------------------------------------------------------------

/// An in-memory pin for simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimPin {
    pub level: bool,
}

impl SimPin {
    pub fn new(high: bool) -> Self {
        Self { level: high }
    }
}

impl ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level = true;
        Ok(())
    }
}
