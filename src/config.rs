pub struct Config {
    // Node identifier (used as DHCP hostname, MQTT client id and in payloads)
    pub node: &'static str,

    // Sensor cluster this node belongs to (used in MQTT payloads)
    pub cluster: &'static str,

    // Topic prefix the hub subscribes to ("barkasse" in the reference deployment)
    pub topic_root: &'static str,

    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // MQTT broker hostname or IP address
    pub mqtt_hostname: &'static str,

    // MQTT port (1883, the hub broker is plaintext on the LAN)
    pub mqtt_port: u16,

    // MQTT username for authentication
    pub mqtt_username: &'static str,

    // MQTT password for authentication
    pub mqtt_password: &'static str,

    // NTP server hostname or IP address (chrony on the hub)
    pub ntp_hostname: &'static str,

    // Measurement interval in seconds
    pub measurement_interval_seconds: u16,
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));

#[cfg(test)]
mod tests {
    use super::CONFIG;

    #[test]
    fn generated_config_is_complete() {
        assert!(!CONFIG.node.is_empty());
        assert!(!CONFIG.cluster.is_empty());
        assert!(!CONFIG.topic_root.is_empty());
        assert!(!CONFIG.wifi_ssid.is_empty());
        assert!(!CONFIG.mqtt_hostname.is_empty());
        assert!(!CONFIG.ntp_hostname.is_empty());
        assert!(CONFIG.mqtt_port != 0);
        assert!(CONFIG.measurement_interval_seconds > 0);
    }
}
