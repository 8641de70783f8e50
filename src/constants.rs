/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM (internal memory)
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 4096;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 4096;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 1024;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 1024;
/// MQTT keep-alive, seconds
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;
/// Maximum MQTT packet size advertised to the broker
pub const MQTT_MAX_PACKET_SIZE: u32 = 1024;

/// TCP connect/read/write timeout, seconds
pub const SOCKET_TIMEOUT_SECS: u64 = 30;

/// Size of the UDP socket buffers for SNTP exchanges
pub const SNTP_SOCKET_BUFFER_SIZE: usize = 128;
/// How long to wait for an SNTP server reply, seconds
pub const SNTP_TIMEOUT_SECS: u64 = 5;
/// Interval in seconds between SNTP re-syncs (3600 = 1 hour)
pub const SNTP_RESYNC_INTERVAL: u64 = 3600;
/// Attempts to get an initial time sync before publishing anyway
pub const SNTP_BOOT_RETRIES: usize = 5;

/// Timeout for a single WiFi association attempt, seconds
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Delay before retrying a failed WiFi connection, milliseconds
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;
