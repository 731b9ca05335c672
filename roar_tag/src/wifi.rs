use esp_idf_hal::{modem::Modem, peripheral::Peripheral};
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_svc::{eventloop::EspSystemEventLoop, nvs::EspDefaultNvsPartition};
use log::*;
use roar_core::Radio;

/// Station mode WiFi on top of the ESP-IDF driver.
pub struct EspRadio {
    wifi: BlockingWifi<EspWifi<'static>>,
}

impl EspRadio {
    pub fn new(modem: impl Peripheral<P = Modem> + 'static) -> anyhow::Result<Self> {
        info!("Initializing WiFi...");

        let sys_loop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;

        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sys_loop.clone(), Some(nvs))?, sys_loop)?;
        Ok(Self { wifi })
    }
}

impl Radio for EspRadio {
    fn associate(&mut self, ssid: &str, password: &str) -> anyhow::Result<()> {
        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: ssid
                .try_into()
                .map_err(|_| anyhow::anyhow!("SSID {} is too long", ssid))?,
            password: password
                .try_into()
                .map_err(|_| anyhow::anyhow!("WiFi password is too long"))?,
            auth_method: if password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });

        self.wifi.set_configuration(&wifi_config)?;
        if !self.wifi.is_started()? {
            self.wifi.start()?;
            info!("WiFi started");
        }

        // Only kicks off the association; the caller polls `is_associated`.
        self.wifi.wifi_mut().connect()?;
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }
}
