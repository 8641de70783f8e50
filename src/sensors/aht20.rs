//! AM2301B (AHT20-based) temperature/humidity sensor.
//!
//! Datasheet sequence: check the status word after power-on, trigger a
//! measurement with `0xAC 0x33 0x00`, wait at least 80 ms, then read a
//! 7-byte frame (status, 5 data bytes, CRC) and poll while the busy bit
//! is set. Humidity and temperature are 20-bit fields packed around a
//! shared middle byte.

use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use log::{info, warn};

use super::{Reading, Sensor, SensorData, SensorError};

pub const DEFAULT_ADDRESS: u8 = 0x38;
pub const FRAME_SIZE: usize = 7;

const CMD_STATUS: u8 = 0x71;
const CMD_TRIGGER: [u8; 3] = [0xAC, 0x33, 0x00];
const STATUS_CALIBRATED: u8 = 0x18;
const STATUS_BUSY: u8 = 0x80;
/// CRC-8 polynomial x^8 + x^5 + x^4 + 1, MSB first
const CRC_POLY: u8 = 0x31;

/// Datasheet: wait at least 80 ms after triggering
const MEASUREMENT_DELAY_MS: u32 = 80;
const POWER_ON_DELAY_MS: u32 = 10;
const POLL_DELAY_MS: u32 = 10;
const POLL_ATTEMPTS: usize = 20;

#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    Busy,
    CrcMismatch,
}

pub struct Aht20<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Aht20<I2C, D> {
    pub async fn new(mut i2c: I2C, mut delay: D) -> Result<Self, SensorError> {
        info!("Initialising AM2301B...");

        let mut status = [0u8; 1];
        i2c.write_read(DEFAULT_ADDRESS, &[CMD_STATUS], &mut status)
            .await
            .map_err(|_| SensorError::InitFailure)?;

        if status[0] & STATUS_CALIBRATED != STATUS_CALIBRATED {
            // The datasheet wants a register init here but the part
            // still measures, so keep going.
            warn!(
                "AM2301B status 0x{:02x}: calibration bits not set",
                status[0]
            );
        }
        delay.delay_ms(POWER_ON_DELAY_MS).await;

        info!("Initialised AM2301B");

        Ok(Self {
            i2c,
            delay,
            address: DEFAULT_ADDRESS,
        })
    }
}

impl<I2C: I2c, D: DelayNs> Sensor for Aht20<I2C, D> {
    async fn measure(&mut self, data: &mut SensorData) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &CMD_TRIGGER)
            .await
            .map_err(|_| SensorError::MeasurementFailure)?;
        self.delay.delay_ms(MEASUREMENT_DELAY_MS).await;

        let mut frame = [0u8; FRAME_SIZE];
        for _ in 0..POLL_ATTEMPTS {
            self.i2c
                .read(self.address, &mut frame)
                .await
                .map_err(|_| SensorError::MeasurementFailure)?;

            match decode(&frame) {
                Ok((temperature, humidity)) => {
                    data.add_measurement(
                        "temperature",
                        Reading {
                            value: temperature,
                            unit: "°C",
                        },
                    );
                    data.add_measurement(
                        "humidity",
                        Reading {
                            value: humidity,
                            unit: "%RH",
                        },
                    );
                    return Ok(());
                }
                Err(FrameError::Busy) => self.delay.delay_ms(POLL_DELAY_MS).await,
                Err(FrameError::CrcMismatch) => {
                    warn!("AM2301B frame failed CRC check");
                    return Err(SensorError::MeasurementFailure);
                }
            }
        }

        warn!("AM2301B still busy after {} polls", POLL_ATTEMPTS);
        Err(SensorError::MeasurementFailure)
    }
}

/// Decode a measurement frame into (°C, %RH).
pub fn decode(frame: &[u8; FRAME_SIZE]) -> Result<(f32, f32), FrameError> {
    if crc8(&frame[..6]) != frame[6] {
        return Err(FrameError::CrcMismatch);
    }
    if frame[0] & STATUS_BUSY != 0 {
        return Err(FrameError::Busy);
    }

    let hum_raw = (u32::from(frame[1]) << 16 | u32::from(frame[2]) << 8 | u32::from(frame[3])) >> 4;
    let temp_raw = (u32::from(frame[3]) & 0x0F) << 16 | u32::from(frame[4]) << 8 | u32::from(frame[5]);

    let humidity = hum_raw as f32 / 1_048_576.0 * 100.0;
    let temperature = temp_raw as f32 / 1_048_576.0 * 200.0 - 50.0;
    Ok((temperature, humidity))
}

/// CRC-8 over the status and data bytes, initial value 0xFF.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_crc(mut frame: [u8; FRAME_SIZE]) -> [u8; FRAME_SIZE] {
        frame[6] = crc8(&frame[..6]);
        frame
    }

    #[test]
    fn crc8_reference_vectors() {
        assert_eq!(crc8(&[]), 0xFF);
        assert_eq!(crc8(&[0x00]), 0xAC);
        assert_eq!(crc8(&[0xFF]), 0x00);
    }

    #[test]
    fn decodes_midscale_frame() {
        // hum_raw = temp_raw = 0x80000: 50 %RH, 50 °C
        let frame = frame_with_crc([0x1C, 0x80, 0x00, 0x08, 0x00, 0x00, 0x00]);
        let (temperature, humidity) = decode(&frame).unwrap();
        assert_eq!(temperature, 50.0);
        assert_eq!(humidity, 50.0);
    }

    #[test]
    fn decodes_zero_frame() {
        let frame = frame_with_crc([0x1C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let (temperature, humidity) = decode(&frame).unwrap();
        assert_eq!(temperature, -50.0);
        assert_eq!(humidity, 0.0);
    }

    #[test]
    fn busy_frame_is_not_decoded() {
        let frame = frame_with_crc([0x9C, 0x80, 0x00, 0x08, 0x00, 0x00, 0x00]);
        assert_eq!(decode(&frame), Err(FrameError::Busy));
    }

    #[test]
    fn corrupted_frame_fails_crc() {
        let mut frame = frame_with_crc([0x1C, 0x80, 0x00, 0x08, 0x00, 0x00, 0x00]);
        frame[6] ^= 0xFF;
        assert_eq!(decode(&frame), Err(FrameError::CrcMismatch));
    }
}
