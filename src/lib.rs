#![cfg_attr(not(test), no_std)]

#[cfg(feature = "esp32")]
extern crate alloc;

pub mod clock;
pub mod config;
pub mod constants;
pub mod measurement;
pub mod mqtt;
pub mod sensors;
pub mod sntp;
pub mod transport;
#[cfg(feature = "esp32")]
pub mod wifi;
