#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_net::Stack;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use embassy_time::{Delay, Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;

use hal::{
    i2c::master::{BusTimeout, I2c},
    rng::Rng,
    time::Rate,
    timer::timg::TimerGroup,
    Async,
};

use barkasse_node::clock::{self, WallClock};
use barkasse_node::config::CONFIG;
use barkasse_node::constants::*;
use barkasse_node::measurement::Measurement;
use barkasse_node::sensors::Sensors;
use barkasse_node::sntp;
use barkasse_node::wifi::Wifi;

type SharedI2c = I2cDevice<'static, NoopRawMutex, I2c<'static, Async>>;
type NodeMeasurement = Measurement<SharedI2c, Delay>;

static I2C_BUS: StaticCell<Mutex<NoopRawMutex, I2c<'static, Async>>> = StaticCell::new();
static STACK: StaticCell<Mutex<NoopRawMutex, Stack<'static>>> = StaticCell::new();
static CLOCK: StaticCell<Mutex<NoopRawMutex, WallClock>> = StaticCell::new();

static RX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; RX_BUFFER_SIZE]>> = StaticCell::new();
static TX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; TX_BUFFER_SIZE]>> = StaticCell::new();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    log::info!("Barkasse node {} v{}", CONFIG.node, VERSION);

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let mut sensors: Sensors<SharedI2c, Delay> = Sensors::new();

    if cfg!(feature = "aht20") || cfg!(feature = "bme280") {
        let (sda, scl) = (peripherals.GPIO21, peripherals.GPIO22);

        let i2c_config = hal::i2c::master::Config::default()
            .with_frequency(Rate::from_khz(100))
            .with_timeout(BusTimeout::BusCycles(24));

        let i2c = I2c::new(peripherals.I2C0, i2c_config)
            .unwrap()
            .with_sda(sda)
            .with_scl(scl)
            .into_async();

        let i2c_bus = Mutex::new(i2c);
        let i2c_bus = I2C_BUS.init(i2c_bus);

        if cfg!(feature = "aht20") {
            sensors
                .new_aht20(I2cDevice::new(i2c_bus), Delay)
                .await
                .unwrap();
        }

        if cfg!(feature = "bme280") {
            sensors.new_bme280(I2cDevice::new(i2c_bus)).await.unwrap();
        }
    }

    let wifi = Wifi::new(
        peripherals.WIFI,
        timg1.timer0,
        peripherals.RADIO_CLK,
        rng.clone(),
        spawner,
    )
    .await
    .unwrap();

    wifi.connect().await.unwrap();

    let stack_shared = STACK.init(Mutex::new(wifi.stack));
    let clock = CLOCK.init(Mutex::new(WallClock::new()));

    let rx_buf = RX_BUF.init(Mutex::new([0; RX_BUFFER_SIZE]));
    let tx_buf = TX_BUF.init(Mutex::new([0; TX_BUFFER_SIZE]));

    // Initial time sync so the first payload carries a real timestamp
    for attempt in 1..=SNTP_BOOT_RETRIES {
        let result = {
            let stack_guard = stack_shared.lock().await;
            sntp::query(*stack_guard, CONFIG.ntp_hostname).await
        };
        match result {
            Ok((unix, uptime)) => {
                clock.lock().await.set(unix, uptime);
                log::info!("Clock synced: {}", clock::rfc3339(unix));
                break;
            }
            Err(e) => {
                log::warn!("SNTP sync attempt {} failed: {:?}", attempt, e);
                Timer::after(Duration::from_secs(2)).await;
            }
        }
    }

    let measurement = Measurement::new(stack_shared, clock, rx_buf, tx_buf, sensors).unwrap();

    spawner.spawn(main_task(measurement, stack_shared, clock)).ok();
}

#[embassy_executor::task]
async fn main_task(
    mut measurement: NodeMeasurement,
    stack: &'static Mutex<NoopRawMutex, Stack<'static>>,
    clock: &'static Mutex<NoopRawMutex, WallClock>,
) {
    let mut resync_counter = 0u64;

    loop {
        // Only re-sync the clock periodically
        if resync_counter >= SNTP_RESYNC_INTERVAL / CONFIG.measurement_interval_seconds as u64 {
            resync_counter = 0;
            let result = {
                let stack_guard = stack.lock().await;
                sntp::query(*stack_guard, CONFIG.ntp_hostname).await
            };
            match result {
                Ok((unix, uptime)) => clock.lock().await.set(unix, uptime),
                Err(e) => log::warn!("SNTP re-sync failed: {:?}", e),
            }
        }

        // Take measurements each cycle
        if let Err(e) = measurement.take().await {
            log::error!("Measurement error: {:?}", e);
        }

        resync_counter += 1;

        Timer::after(Duration::from_secs(
            CONFIG.measurement_interval_seconds.into(),
        ))
        .await;
    }
}
