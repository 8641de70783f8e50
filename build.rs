use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_psk: String,
    node: String,
    cluster: String,
    topic_root: String,
    mqtt_hostname: String,
    mqtt_port: u16,
    mqtt_username: String,
    mqtt_password: String,
    ntp_hostname: String,
    measurement_interval_seconds: u16,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if the config changes
    println!("cargo:rerun-if-changed=cfg.toml");
    println!("cargo:rerun-if-changed=cfg.example.toml");

    // cfg.toml is the user's copy of cfg.example.toml with real
    // credentials and is kept out of version control.
    let toml_str = match fs::read_to_string("cfg.toml") {
        Ok(s) => s,
        Err(_) => {
            println!("cargo:warning=cfg.toml not found, using cfg.example.toml placeholders");
            fs::read_to_string("cfg.example.toml")?
        }
    };
    let raw: RawConfig = toml::from_str(&toml_str)?;

    // Generate Rust code
    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            node: {node:?},
            cluster: {cluster:?},
            topic_root: {root:?},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            ntp_hostname: {nh:?},
            measurement_interval_seconds: {intv},
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        node = raw.node,
        cluster = raw.cluster,
        root = raw.topic_root,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        nh = raw.ntp_hostname,
        intv = raw.measurement_interval_seconds
    );

    fs::write(dest_path, code)?;
    Ok(())
}
