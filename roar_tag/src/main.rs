// ===============================================================================
// roar-tag: MagTag Home Assistant webhook badge
// ===============================================================================
// 1. Plays Roar by Katy Perry
// 2. Plays Think of What You've Done by Christina Vane
// 3. Turns on the lights
// 4. Turns off the lights
//
// Pressing 1 or 2 while any song is playing stops it (handled by the hub).
// ===============================================================================

use core::time::Duration;

use esp_idf_hal::{
    delay::FreeRtos,
    gpio::{AnyIOPin, IOPin, Input, InputPin, OutputPin, PinDriver, Pull},
    peripherals::Peripherals,
    prelude::*,
    spi::{config::Config, SpiDeviceDriver, SpiDriver, SpiDriverConfig},
};
use log::*;
use roar_core::{Badge, ButtonId, DisplayPresenter, InputPoller, NetworkClient};

mod epaper;
mod hal;
mod http;
mod secrets;
mod storage;
mod wifi;

use epaper::Ssd1680;
use hal::{InputPinWrapper, OutputPinWrapper, SpiWrapper};
use http::EspTransport;
use wifi::EspRadio;

/// Configures a button pin as input with the internal pull-up (pressed = low).
fn button(pin: AnyIOPin) -> anyhow::Result<PinDriver<'static, AnyIOPin, Input>> {
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(driver)
}

// === MAIN PROGRAM ===
fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== Starting roar-tag ===");

    // Load secrets (embedded at compile time)
    let secrets = secrets::load()?;
    info!("WiFi SSID: {}", secrets.wifi.ssid);

    let peripherals = Peripherals::take()?;

    // A missing image partition only breaks the display, the buttons keep working.
    if let Err(e) = storage::mount_spiffs() {
        error!("Failed to mount image storage: {:?}", e);
    }

    // ==================== DISPLAY SETUP ====================
    info!("Setting up display...");
    let sclk = peripherals.pins.gpio36;
    let mosi = peripherals.pins.gpio35;
    let cs = peripherals.pins.gpio8;
    let dc = peripherals.pins.gpio7;
    let rst = peripherals.pins.gpio6;
    let busy = peripherals.pins.gpio5;

    let spi_config = Config::new().baudrate(4.MHz().into());
    let spi_driver = SpiDriver::new(
        peripherals.spi2,
        sclk,
        mosi,
        None::<AnyIOPin>,
        &SpiDriverConfig::new(),
    )?;
    let spi_device = SpiDeviceDriver::new(spi_driver, Some(cs), &spi_config)?;

    let panel = Ssd1680::new(
        SpiWrapper { spi: spi_device },
        OutputPinWrapper {
            pin: PinDriver::output(dc.downgrade_output())?,
        },
        OutputPinWrapper {
            pin: PinDriver::output(rst.downgrade_output())?,
        },
        InputPinWrapper {
            pin: PinDriver::input(busy.downgrade_input())?,
        },
        FreeRtos,
    );
    let presenter = DisplayPresenter::new(panel, storage::MOUNT_POINT);

    // ==================== BUTTONS ====================
    let buttons = InputPoller::new()
        .with_button(ButtonId::A, button(peripherals.pins.gpio15.downgrade())?)
        .with_button(ButtonId::B, button(peripherals.pins.gpio14.downgrade())?)
        .with_button(ButtonId::C, button(peripherals.pins.gpio12.downgrade())?)
        .with_button(ButtonId::D, button(peripherals.pins.gpio11.downgrade())?);

    // ==================== NETWORK ====================
    let radio = EspRadio::new(peripherals.modem)?;
    let transport = EspTransport::new(Duration::from_millis(secrets.badge.http_timeout_ms))?;
    let network = NetworkClient::new(radio, transport);

    // ==================== MAIN LOOP ====================
    let mut badge = Badge::new(&secrets, network, presenter, buttons, FreeRtos);
    badge.run()
}
