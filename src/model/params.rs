//! Canonical parameter names, storage types and units.
//!
//! Collaborators find their inputs by these names, so they must not change.

use std::collections::HashMap;

use lazy_static::lazy_static;

use super::StorageType::{self, Float32, Float64};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub long_name: &'static str,
    pub units: &'static str,
    pub storage: StorageType,
}

const fn p(
    name: &'static str,
    long_name: &'static str,
    units: &'static str,
    storage: StorageType,
) -> Parameter {
    Parameter {
        name,
        long_name,
        units,
        storage,
    }
}

pub const TIME: Parameter = p("TIME", "time", "days since 1950-01-01 00:00:00 UTC", Float64);
pub const HEIGHT_ABOVE_SENSOR: Parameter =
    p("HEIGHT_ABOVE_SENSOR", "height_above_sensor", "m", Float32);
pub const LATITUDE: Parameter = p("LATITUDE", "latitude", "degrees_north", Float64);
pub const LONGITUDE: Parameter = p("LONGITUDE", "longitude", "degrees_east", Float64);
pub const UCUR: Parameter = p("UCUR", "eastward_sea_water_velocity", "m s-1", Float32);
pub const VCUR: Parameter = p("VCUR", "northward_sea_water_velocity", "m s-1", Float32);
pub const WCUR: Parameter = p("WCUR", "upward_sea_water_velocity", "m s-1", Float32);
pub const ABSI1: Parameter = p(
    "ABSI1",
    "backscatter_intensity_from_acoustic_beam_1",
    "dB",
    Float32,
);
pub const ABSI2: Parameter = p(
    "ABSI2",
    "backscatter_intensity_from_acoustic_beam_2",
    "dB",
    Float32,
);
pub const ABSI3: Parameter = p(
    "ABSI3",
    "backscatter_intensity_from_acoustic_beam_3",
    "dB",
    Float32,
);
pub const TEMP: Parameter = p("TEMP", "sea_water_temperature", "degrees_Celsius", Float32);
pub const PRES_REL: Parameter = p(
    "PRES_REL",
    "sea_water_pressure_due_to_sea_water",
    "dbar",
    Float32,
);
pub const VOLT: Parameter = p("VOLT", "battery_voltage", "V", Float32);
pub const PITCH: Parameter = p("PITCH", "platform_pitch", "degrees", Float32);
pub const ROLL: Parameter = p("ROLL", "platform_roll", "degrees", Float32);
pub const HEADING: Parameter = p("HEADING", "platform_orientation", "degrees", Float32);

const TABLE: &[Parameter] = &[
    TIME,
    HEIGHT_ABOVE_SENSOR,
    LATITUDE,
    LONGITUDE,
    UCUR,
    VCUR,
    WCUR,
    ABSI1,
    ABSI2,
    ABSI3,
    TEMP,
    PRES_REL,
    VOLT,
    PITCH,
    ROLL,
    HEADING,
];

lazy_static! {
    pub static ref PARAMETERS: HashMap<&'static str, Parameter> =
        TABLE.iter().map(|p| (p.name, *p)).collect();
}

pub fn parameter(name: &str) -> Option<&'static Parameter> {
    PARAMETERS.get(name)
}
