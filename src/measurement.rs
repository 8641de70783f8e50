//! Measurement cycle: read the sensors, stamp and format the payload,
//! publish it to the hub broker.
//!
//! The payload is the "sensors map" shape the hub's parse-and-expand
//! flow fans out into per-sensor entries keyed `node/cluster/sensor`:
//!
//! ```json
//! {"node":"...","cluster":"...","ts":"...","sensors":
//!   {"temperature":{"value":21.4,"unit":"°C"}, ...}}
//! ```

use core::fmt::Write;

use embassy_net::Stack;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, mutex::Mutex};
use embassy_time::Instant;
use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use heapless::String;
use static_cell::StaticCell;

use crate::clock::WallClock;
use crate::config::CONFIG;
use crate::constants::*;
use crate::mqtt::Mqtt;
use crate::sensors::{SensorData, Sensors};
use crate::transport;

static MQTT_RX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; MQTT_RX_BUFFER_SIZE]>> = StaticCell::new();
static MQTT_TX_BUF: StaticCell<Mutex<NoopRawMutex, [u8; MQTT_TX_BUFFER_SIZE]>> = StaticCell::new();

pub const PAYLOAD_MAX: usize = 512;
pub const TOPIC_MAX: usize = 96;

#[derive(Debug)]
pub enum Error {
    Sensor,
    Transport,
    Mqtt,
    Format,
}

pub struct Measurement<I2C, D> {
    stack: &'static Mutex<NoopRawMutex, Stack<'static>>,
    clock: &'static Mutex<NoopRawMutex, WallClock>,
    rx_buf: &'static Mutex<NoopRawMutex, [u8; RX_BUFFER_SIZE]>,
    tx_buf: &'static Mutex<NoopRawMutex, [u8; TX_BUFFER_SIZE]>,
    mqtt_rx_buf: &'static Mutex<NoopRawMutex, [u8; MQTT_RX_BUFFER_SIZE]>,
    mqtt_tx_buf: &'static Mutex<NoopRawMutex, [u8; MQTT_TX_BUFFER_SIZE]>,
    sensors: Sensors<I2C, D>,
}

impl<I2C: I2c, D: DelayNs> Measurement<I2C, D> {
    pub fn new(
        stack: &'static Mutex<NoopRawMutex, Stack<'static>>,
        clock: &'static Mutex<NoopRawMutex, WallClock>,
        rx_buf: &'static Mutex<NoopRawMutex, [u8; RX_BUFFER_SIZE]>,
        tx_buf: &'static Mutex<NoopRawMutex, [u8; TX_BUFFER_SIZE]>,
        sensors: Sensors<I2C, D>,
    ) -> Result<Self, Error> {
        let mqtt_rx_buf = MQTT_RX_BUF.init(Mutex::new([0; MQTT_RX_BUFFER_SIZE]));
        let mqtt_tx_buf = MQTT_TX_BUF.init(Mutex::new([0; MQTT_TX_BUFFER_SIZE]));

        Ok(Self {
            stack,
            clock,
            rx_buf,
            tx_buf,
            mqtt_rx_buf,
            mqtt_tx_buf,
            sensors,
        })
    }

    pub async fn take(&mut self) -> Result<(), Error> {
        // Measure sensor data first
        let sensor_data = self.sensors.measure().await.map_err(|_| Error::Sensor)?;
        log::debug!("Sensor data received: {:?}", sensor_data);

        let ts = {
            let clock = self.clock.lock().await;
            clock.rfc3339_now(Instant::now().as_secs())
        };

        let message = format_payload(CONFIG.node, CONFIG.cluster, &ts, &sensor_data)
            .map_err(|_| Error::Format)?;
        let topic = topic(CONFIG.topic_root, CONFIG.node, CONFIG.cluster)
            .map_err(|_| Error::Format)?;
        log::debug!("Formatted MQTT message: {}", message);

        // Acquire locks for shared resources only when needed
        let stack_guard = self.stack.lock().await;
        let mut rx_buf = self.rx_buf.lock().await;
        let mut tx_buf = self.tx_buf.lock().await;

        let socket = transport::connect(
            *stack_guard,
            &mut *rx_buf,
            &mut *tx_buf,
            CONFIG.mqtt_hostname,
            CONFIG.mqtt_port,
        )
        .await
        .map_err(|_| Error::Transport)?;

        let mut mqtt_rx_buf = self.mqtt_rx_buf.lock().await;
        let mut mqtt_tx_buf = self.mqtt_tx_buf.lock().await;
        let mut mqtt = Mqtt::new(socket, &mut *mqtt_tx_buf, &mut *mqtt_rx_buf)
            .await
            .map_err(|_| Error::Mqtt)?;

        mqtt.send_message(&topic, message.as_bytes())
            .await
            .map_err(|_| Error::Mqtt)?;

        // Explicitly disconnect
        mqtt.disconnect().await;

        log::info!("Published {} readings to {}", sensor_data.len(), topic);
        Ok(())
    }
}

/// Topic this node publishes under; the hub subscribes to
/// `<topic_root>/#`.
pub fn topic(
    root: &str,
    node: &str,
    cluster: &str,
) -> Result<String<TOPIC_MAX>, core::fmt::Error> {
    let mut out: String<TOPIC_MAX> = String::new();
    write!(out, "{}/{}/{}", root, node, cluster)?;
    Ok(out)
}

/// Format the sensors-map JSON payload. Values are rendered at the
/// 0.1 resolution the hub rounds to anyway.
pub fn format_payload(
    node: &str,
    cluster: &str,
    ts: &str,
    sensor_data: &SensorData,
) -> Result<String<PAYLOAD_MAX>, core::fmt::Error> {
    let mut payload: String<PAYLOAD_MAX> = String::new();

    write!(
        payload,
        "{{\"node\":\"{}\",\"cluster\":\"{}\",\"ts\":\"{}\",\"sensors\":{{",
        node, cluster, ts
    )?;
    let mut first = true;
    for (key, reading) in sensor_data.data.iter() {
        if !first {
            write!(payload, ",")?;
        }
        write!(
            payload,
            "\"{}\":{{\"value\":{:.1},\"unit\":\"{}\"}}",
            key, reading.value, reading.unit
        )?;
        first = false;
    }
    write!(payload, "}}}}")?;

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::Reading;

    #[test]
    fn payload_matches_hub_schema() {
        let mut data = SensorData::default();
        data.add_measurement(
            "temperature",
            Reading {
                value: 21.4,
                unit: "°C",
            },
        );
        data.add_measurement(
            "humidity",
            Reading {
                value: 48.1,
                unit: "%RH",
            },
        );

        let payload =
            format_payload("weatherstation", "outdoor", "2026-08-29T12:00:00Z", &data).unwrap();
        assert_eq!(
            payload.as_str(),
            "{\"node\":\"weatherstation\",\"cluster\":\"outdoor\",\
             \"ts\":\"2026-08-29T12:00:00Z\",\"sensors\":{\
             \"temperature\":{\"value\":21.4,\"unit\":\"°C\"},\
             \"humidity\":{\"value\":48.1,\"unit\":\"%RH\"}}}"
        );
    }

    #[test]
    fn empty_sensor_map_is_still_valid_json() {
        let data = SensorData::default();
        let payload = format_payload("hub", "enclosure", "1970-01-01T00:00:00Z", &data).unwrap();
        assert_eq!(
            payload.as_str(),
            "{\"node\":\"hub\",\"cluster\":\"enclosure\",\
             \"ts\":\"1970-01-01T00:00:00Z\",\"sensors\":{}}"
        );
    }

    #[test]
    fn values_render_at_tenth_resolution() {
        let mut data = SensorData::default();
        data.add_measurement(
            "temperature",
            Reading {
                value: 21.4567,
                unit: "°C",
            },
        );
        let payload = format_payload("n", "c", "1970-01-01T00:00:00Z", &data).unwrap();
        assert!(payload.contains("\"value\":21.5"));
    }

    #[test]
    fn topic_joins_root_node_cluster() {
        assert_eq!(
            topic("barkasse", "weatherstation", "outdoor").unwrap().as_str(),
            "barkasse/weatherstation/outdoor"
        );
    }
}
