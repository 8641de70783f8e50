#![allow(async_fn_in_trait)]

use core::marker::PhantomData;

use embedded_hal_async::{delay::DelayNs, i2c::I2c};
use heapless::FnvIndexMap;

pub mod aht20;
pub mod bme280;

use crate::sensors::{aht20::Aht20, bme280::Bme280};

#[derive(Debug)]
pub enum SensorError {
    InitFailure,
    MeasurementFailure,
}

/// A single reading together with the unit shown on the hub dashboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f32,
    pub unit: &'static str,
}

#[derive(Default, Debug)]
pub struct SensorData {
    pub data: FnvIndexMap<&'static str, Reading, 8>,
}

impl SensorData {
    pub fn add_measurement(&mut self, key: &'static str, reading: Reading) {
        self.data.insert(key, reading).ok();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

pub trait Sensor {
    async fn measure(&mut self, data: &mut SensorData) -> Result<(), SensorError>;
}

pub struct Sensors<I2C, D> {
    pub aht20: Option<Aht20<I2C, D>>,
    pub bme280: Option<Bme280<I2C>>,
    _marker: PhantomData<(I2C, D)>,
}

impl<I2C, D> Default for Sensors<I2C, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I2C, D> Sensors<I2C, D> {
    pub fn new() -> Self {
        Self {
            aht20: None,
            bme280: None,
            _marker: PhantomData,
        }
    }
}

impl<I2C: I2c, D: DelayNs> Sensors<I2C, D> {
    pub async fn new_aht20(&mut self, i2c: I2C, delay: D) -> Result<(), SensorError> {
        self.aht20 = Some(Aht20::new(i2c, delay).await?);
        Ok(())
    }

    pub async fn new_bme280(&mut self, i2c: I2C) -> Result<(), SensorError> {
        self.bme280 = Some(Bme280::new(i2c).await?);
        Ok(())
    }

    pub async fn measure(&mut self) -> Result<SensorData, SensorError> {
        let mut data = SensorData::default();

        if let Some(aht20) = self.aht20.as_mut() {
            aht20.measure(&mut data).await?;
        }

        if let Some(bme280) = self.bme280.as_mut() {
            bme280.measure(&mut data).await?;
        }

        Ok(data)
    }
}
