// === EMBEDDED-HAL ADAPTERS ===
// The e-paper driver is written against embedded-hal 1.0. These wrappers put
// the ESP-IDF SPI and GPIO drivers behind those traits with one error type.

use embedded_hal::digital::{InputPin as InputPinTrait, OutputPin as OutputPinTrait};
use embedded_hal::spi::{Operation, SpiDevice};
use esp_idf_hal::{
    gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver},
    spi::{SpiDeviceDriver, SpiDriver},
};

// === CUSTOM ERROR TYPE ===
#[derive(Debug)]
pub struct CustomError;

impl embedded_hal::spi::Error for CustomError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

impl embedded_hal::digital::Error for CustomError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

// === SPI WRAPPER ===
pub struct SpiWrapper<'a> {
    pub spi: SpiDeviceDriver<'a, SpiDriver<'a>>,
}

impl embedded_hal::spi::ErrorType for SpiWrapper<'_> {
    type Error = CustomError;
}

impl SpiDevice for SpiWrapper<'_> {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(data) => {
                    if !data.is_empty() {
                        self.spi.write(data).map_err(|_| CustomError)?;
                    }
                }
                Operation::Transfer(read, write) => {
                    if !write.is_empty() {
                        self.spi.transfer(read, write).map_err(|_| CustomError)?;
                    }
                }
                Operation::TransferInPlace(data) => {
                    if !data.is_empty() {
                        let temp = data.to_vec();
                        self.spi.transfer(data, &temp).map_err(|_| CustomError)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// === OUTPUT PIN WRAPPER ===
// Used for the Data/Command and Reset lines of the panel.
pub struct OutputPinWrapper<'a> {
    pub pin: PinDriver<'a, AnyOutputPin, Output>,
}

impl embedded_hal::digital::ErrorType for OutputPinWrapper<'_> {
    type Error = CustomError;
}

impl OutputPinTrait for OutputPinWrapper<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low().map_err(|_| CustomError)
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high().map_err(|_| CustomError)
    }
}

// === INPUT PIN WRAPPER ===
// BUSY line of the panel.
pub struct InputPinWrapper<'a> {
    pub pin: PinDriver<'a, AnyInputPin, Input>,
}

impl embedded_hal::digital::ErrorType for InputPinWrapper<'_> {
    type Error = CustomError;
}

impl InputPinTrait for InputPinWrapper<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high())
    }
    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_low())
    }
}
