use crate::error::{PortError, Result};

/// Capability to drive the counterpart's hardware reset line.
///
/// The session layer pulses this high-then-low to reboot the
/// microcontroller before a handshake. Anything that can drive a single
/// digital output can implement it, which keeps the protocol logic
/// testable without hardware attached.
pub trait ResetLine: Send {
    /// Drive the line high.
    fn set_high(&mut self) -> Result<()>;

    /// Drive the line low.
    fn set_low(&mut self) -> Result<()>;
}

/// Reset line for hosts with no reset wiring; every drive attempt fails.
#[derive(Debug, Default)]
pub struct NoResetLine;

impl ResetLine for NoResetLine {
    fn set_high(&mut self) -> Result<()> {
        Err(PortError::Gpio("no reset line configured".to_string()))
    }

    fn set_low(&mut self) -> Result<()> {
        Err(PortError::Gpio("no reset line configured".to_string()))
    }
}

/// BCM GPIO reset line on a Raspberry Pi host.
#[cfg(feature = "rpi")]
pub struct GpioResetLine {
    pin: rppal::gpio::OutputPin,
}

#[cfg(feature = "rpi")]
impl GpioResetLine {
    /// Claim the given BCM pin as an output, initially low.
    pub fn open(bcm_pin: u8) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|err| PortError::Gpio(err.to_string()))?;
        let pin = gpio
            .get(bcm_pin)
            .map_err(|err| PortError::Gpio(err.to_string()))?
            .into_output_low();
        Ok(Self { pin })
    }
}

#[cfg(feature = "rpi")]
impl ResetLine for GpioResetLine {
    fn set_high(&mut self) -> Result<()> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<()> {
        self.pin.set_low();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_reset_line_fails_both_edges() {
        let mut line = NoResetLine;
        assert!(matches!(line.set_high(), Err(PortError::Gpio(_))));
        assert!(matches!(line.set_low(), Err(PortError::Gpio(_))));
    }
}
