use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{with_timeout, Duration, Timer};

use esp_hal::{
    peripherals::{RADIO_CLK, WIFI},
    rng::Rng,
};
use esp_wifi::{
    wifi::{
        ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiState,
    },
    EspWifiController,
};

use core::str::FromStr;
use heapless::String;
use log::info;
use static_cell::StaticCell;

use crate::config::CONFIG;
use crate::constants::{WIFI_CONNECT_TIMEOUT_SECS, WIFI_RECONNECT_DELAY_MS};

static INIT: StaticCell<EspWifiController<'static>> = StaticCell::new();
static RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();

pub struct Wifi {
    pub stack: Stack<'static>,
}

#[derive(Debug)]
pub enum Error {
    WifiInitFailed,
    HostnameTooLong,
    SpawnFailed,
}

impl Wifi {
    pub async fn new(
        wifi: WIFI<'static>,
        timer: impl esp_wifi::EspWifiTimerSource + 'static,
        radio_clk: RADIO_CLK<'static>,
        mut rng: Rng,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let init = INIT.init(
            esp_wifi::init(timer, rng.clone(), radio_clk).map_err(|_| Error::WifiInitFailed)?,
        );
        let (controller, interfaces) =
            esp_wifi::wifi::new(init, wifi).map_err(|_| Error::WifiInitFailed)?;

        let mut dhcp_config = embassy_net::DhcpConfig::default();
        dhcp_config.hostname =
            Some(String::<32>::from_str(CONFIG.node).map_err(|_| Error::HostnameTooLong)?);

        let seed = (rng.random() as u64) << 32 | rng.random() as u64;
        let config = embassy_net::Config::dhcpv4(dhcp_config);

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(interfaces.sta, config, resources, seed);

        spawner
            .spawn(connection(controller))
            .map_err(|_| Error::SpawnFailed)?;
        spawner
            .spawn(net_task(runner))
            .map_err(|_| Error::SpawnFailed)?;

        Ok(Self { stack })
    }

    pub async fn connect(&self) -> Result<(), Error> {
        info!("Waiting for network stack to be ready...");
        loop {
            if self.stack.is_link_up() && self.stack.is_config_up() {
                break;
            }
            Timer::after(Duration::from_millis(500)).await;
        }

        info!("Waiting to get IP address...");
        loop {
            if let Some(config) = self.stack.config_v4() {
                info!("Got IP: {}", config.address);
                break;
            }
            Timer::after(Duration::from_millis(500)).await;
        }

        Ok(())
    }
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    info!(
        "Start connection task, device capabilities: {:?}",
        controller.capabilities()
    );
    loop {
        if esp_wifi::wifi::wifi_state() == WifiState::StaConnected {
            // wait until we're no longer connected
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
        }

        if !matches!(controller.is_started(), Ok(true)) {
            info!("Connecting to wifi with SSID: {:?}", CONFIG.wifi_ssid);
            let client_config = Configuration::Client(ClientConfiguration {
                ssid: CONFIG.wifi_ssid.into(),
                password: CONFIG.wifi_psk.into(),
                ..Default::default()
            });
            if let Err(e) = controller.set_configuration(&client_config) {
                log::error!("Failed to set WiFi config: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Starting wifi");
            if let Err(e) = controller.start_async().await {
                log::error!("Failed to start WiFi: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Wifi started!");
        }

        info!("About to connect to {:?}...", CONFIG.wifi_ssid);
        match with_timeout(
            Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
            controller.connect_async(),
        )
        .await
        {
            Ok(Ok(_)) => info!("Wifi connected!"),
            Ok(Err(e)) => {
                info!("Failed to connect to wifi: {e:?}");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
            Err(_) => {
                info!("Wifi connection timed out");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
