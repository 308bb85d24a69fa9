//! Planet-specific STAPI models: opportunity properties, order parameters, constraints.

use crate::{Provider, ProviderRole, ValidationError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const OFF_NADIR_MIN: f64 = 0.0;
pub const OFF_NADIR_MAX: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SatelliteType {
    Skysat,
    Pelican,
    Tanager,
}

impl SatelliteType {
    pub fn as_str(self) -> &'static str {
        match self {
            SatelliteType::Skysat => "SKYSAT",
            SatelliteType::Pelican => "PELICAN",
            SatelliteType::Tanager => "TANAGER",
        }
    }
}

impl FromStr for SatelliteType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SKYSAT" => Ok(SatelliteType::Skysat),
            "PELICAN" => Ok(SatelliteType::Pelican),
            "TANAGER" => Ok(SatelliteType::Tanager),
            other => Err(ValidationError::new(format!(
                "unknown satellite type {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAngleRange {
    minimum: f64,
    maximum: f64,
}

/// Off-nadir angle range in degrees; always within [0, 90] with minimum <= maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAngleRange")]
pub struct OffNadirAngleRange {
    minimum: f64,
    maximum: f64,
}

impl OffNadirAngleRange {
    pub fn new(minimum: f64, maximum: f64) -> Result<Self, ValidationError> {
        for (name, v) in [("minimum", minimum), ("maximum", maximum)] {
            if !(OFF_NADIR_MIN..=OFF_NADIR_MAX).contains(&v) {
                return Err(ValidationError::new(format!(
                    "off-nadir {} {} outside [{}, {}]",
                    name, v, OFF_NADIR_MIN, OFF_NADIR_MAX
                )));
            }
        }
        if minimum > maximum {
            return Err(ValidationError::new(
                "range minimum cannot be greater than maximum",
            ));
        }
        Ok(Self { minimum, maximum })
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }
}

impl TryFrom<RawAngleRange> for OffNadirAngleRange {
    type Error = ValidationError;

    fn try_from(raw: RawAngleRange) -> Result<Self, Self::Error> {
        Self::new(raw.minimum, raw.maximum)
    }
}

/// Product-specific properties of a Planet opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetOpportunityProperties {
    pub off_nadir_angle: OffNadirAngleRange,
    pub satellite_type: SatelliteType,
    pub cloud_forecast: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanetOrderParameters {
    pub imaging_window_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetProductConstraints {
    pub off_nadir: f64,
}

pub fn provider_planet() -> Provider {
    Provider {
        name: "Planet".to_string(),
        description: Some("A provider for Test data".to_string()),
        roles: vec![ProviderRole::Producer],
        url: "https://www.planet.com".to_string(),
    }
}
