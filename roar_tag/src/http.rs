use core::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::io::Read;
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};
use log::*;
use roar_core::HttpTransport;

/// One HTTP client, created at startup and reused for every webhook call.
///
/// A request that fails midway leaves the connection out of its initial
/// state; [`HttpTransport::reset`] drops it and opens a fresh one. If that
/// fails too, the next POST tries again.
pub struct EspTransport {
    client: Option<Client<EspHttpConnection>>,
    timeout: Duration,
}

fn connect(timeout: Duration) -> anyhow::Result<Client<EspHttpConnection>> {
    let connection = EspHttpConnection::new(&HttpConfiguration {
        use_global_ca_store: true,
        crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
        timeout: Some(timeout),
        ..Default::default()
    })?;
    Ok(Client::wrap(connection))
}

impl EspTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Some(connect(timeout)?),
            timeout,
        })
    }
}

impl HttpTransport for EspTransport {
    fn post(&mut self, url: &str) -> anyhow::Result<u16> {
        if self.client.is_none() {
            self.client = Some(connect(self.timeout)?);
        }
        let Some(client) = self.client.as_mut() else {
            anyhow::bail!("HTTP session unavailable");
        };
        let request = client.post(url, &[("content-length", "0")])?;
        let mut response = request.submit()?;

        let status = response.status();
        debug!("Webhook response status: {}", status);

        // Drain the body so the connection can be reused.
        let mut body_buf = [0u8; 256];
        while response.read(&mut body_buf)? > 0 {}

        Ok(status)
    }

    fn reset(&mut self) -> anyhow::Result<()> {
        warn!("Rebuilding HTTP session");
        self.client = None;
        self.client = Some(connect(self.timeout)?);
        Ok(())
    }
}
