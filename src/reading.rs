use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of values carried by one measurement frame.
pub const FIELD_COUNT: usize = 10;

/// SPS30 measured values, rounded to two decimal places.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Mass Concentration PM1.0 [μg/m³]
    pub pm1_0: f32,
    /// Mass Concentration PM2.5 [μg/m³]
    pub pm2_5: f32,
    /// Mass Concentration PM4.0 [μg/m³]
    pub pm4_0: f32,
    /// Mass Concentration PM10 [μg/m³]
    pub pm10_0: f32,
    /// Number Concentration PM0.5 [#/cm³]
    pub nc0_5: f32,
    /// Number Concentration PM1.0 [#/cm³]
    pub nc1_0: f32,
    /// Number Concentration PM2.5 [#/cm³]
    pub nc2_5: f32,
    /// Number Concentration PM4.0 [#/cm³]
    pub nc4_0: f32,
    /// Number Concentration PM10 [#/cm³]
    pub nc10_0: f32,
    /// Typical Particle Size [μm]
    pub typical_particle_size: f32,
}

impl SensorReading {
    /// Builds a reading from values in wire order.
    pub fn from_array(values: [f32; FIELD_COUNT]) -> Self {
        let [pm1_0, pm2_5, pm4_0, pm10_0, nc0_5, nc1_0, nc2_5, nc4_0, nc10_0, typical_particle_size] =
            values;
        Self {
            pm1_0,
            pm2_5,
            pm4_0,
            pm10_0,
            nc0_5,
            nc1_0,
            nc2_5,
            nc4_0,
            nc10_0,
            typical_particle_size,
        }
    }

    /// Values in wire order.
    pub fn as_array(&self) -> [f32; FIELD_COUNT] {
        [
            self.pm1_0,
            self.pm2_5,
            self.pm4_0,
            self.pm10_0,
            self.nc0_5,
            self.nc1_0,
            self.nc2_5,
            self.nc4_0,
            self.nc10_0,
            self.typical_particle_size,
        ]
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PM1={:.2} PM2.5={:.2} PM4={:.2} PM10={:.2} PN0.5={:.2} PN1={:.2} PN2.5={:.2} PN4={:.2} PN10={:.2} size={:.2}",
            self.pm1_0,
            self.pm2_5,
            self.pm4_0,
            self.pm10_0,
            self.nc0_5,
            self.nc1_0,
            self.nc2_5,
            self.nc4_0,
            self.nc10_0,
            self.typical_particle_size,
        )
    }
}
