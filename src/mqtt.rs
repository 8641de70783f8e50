//! MQTT client wrapper around `rust-mqtt`.
//!
//! One short-lived session per publish cycle: connect with the hub
//! credentials, publish at QoS 1, disconnect.

use embedded_io_async::{Read, Write};
use log::{debug, error, info};
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::publish_packet::QualityOfService,
    utils::rng_generator::CountingRng,
};

use crate::config::CONFIG;
use crate::constants::{MQTT_KEEP_ALIVE_SECS, MQTT_MAX_PACKET_SIZE};

#[derive(Debug)]
pub enum Error {
    ConnectionFailed,
    PublishMessageFailed,
}

pub struct Mqtt<'a, T>
where
    T: Read + Write,
{
    client: MqttClient<'a, T, 5, CountingRng>,
}

impl<'a, T> Mqtt<'a, T>
where
    T: Read + Write,
{
    pub async fn new(
        transport: T,
        tx_buffer: &'a mut [u8],
        rx_buffer: &'a mut [u8],
    ) -> Result<Self, Error> {
        let mut config: ClientConfig<'a, 5, CountingRng> =
            ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_client_id(CONFIG.node);
        config.add_username(CONFIG.mqtt_username);
        config.add_password(CONFIG.mqtt_password);
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = MQTT_MAX_PACKET_SIZE;

        let tx_len = tx_buffer.len();
        let rx_len = rx_buffer.len();
        let mut client = MqttClient::new(transport, tx_buffer, tx_len, rx_buffer, rx_len, config);

        match client.connect_to_broker().await {
            Ok(()) => {
                info!("MQTT connected to broker");
            }
            Err(e) => {
                error!("MQTT connect failed: {:?}", e);
                return Err(Error::ConnectionFailed);
            }
        }

        Ok(Self { client })
    }

    pub async fn send_message(&mut self, topic: &str, message: &[u8]) -> Result<(), Error> {
        match self
            .client
            .send_message(topic, message, QualityOfService::QoS1, false)
            .await
        {
            Ok(()) => {
                debug!("Message published to {}", topic);
                Ok(())
            }
            Err(e) => {
                error!("Failed to publish message: {:?}", e);
                Err(Error::PublishMessageFailed)
            }
        }
    }

    pub async fn disconnect(mut self) {
        let _ = self.client.disconnect().await;
    }
}
