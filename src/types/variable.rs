//! The fixed set of TerraClimate variables, their dataset names and the
//! physically plausible value range used by validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A monthly TerraClimate variable.
///
/// The dataset name (as it appears in the NetCDF files and remote URLs) is
/// available via [`ClimateVariable::name`]; parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateVariable {
    /// Actual evapotranspiration (mm/month).
    Aet,
    /// Climatic water deficit (mm/month).
    Def,
    /// Potential evapotranspiration (mm/month).
    Pet,
    /// Precipitation (mm/month).
    Ppt,
    /// Runoff (mm/month).
    Q,
    /// Soil moisture (mm).
    Soil,
    /// Downward surface shortwave radiation (W/m2).
    Srad,
    /// Snow water equivalent (mm).
    Swe,
    /// Maximum temperature (deg C).
    Tmax,
    /// Minimum temperature (deg C).
    Tmin,
    /// Vapor pressure (kPa).
    Vap,
    /// Wind speed (m/s).
    Ws,
    /// Vapor pressure deficit (kPa).
    Vpd,
    /// Palmer drought severity index (unitless).
    #[serde(rename = "PDSI")]
    Pdsi,
}

impl ClimateVariable {
    /// Every TerraClimate variable, in dataset order.
    pub const ALL: [ClimateVariable; 14] = [
        ClimateVariable::Aet,
        ClimateVariable::Def,
        ClimateVariable::Pet,
        ClimateVariable::Ppt,
        ClimateVariable::Q,
        ClimateVariable::Soil,
        ClimateVariable::Srad,
        ClimateVariable::Swe,
        ClimateVariable::Tmax,
        ClimateVariable::Tmin,
        ClimateVariable::Vap,
        ClimateVariable::Ws,
        ClimateVariable::Vpd,
        ClimateVariable::Pdsi,
    ];

    /// The variable name as used in the TerraClimate dataset and URLs.
    pub fn name(&self) -> &'static str {
        match self {
            ClimateVariable::Aet => "aet",
            ClimateVariable::Def => "def",
            ClimateVariable::Pet => "pet",
            ClimateVariable::Ppt => "ppt",
            ClimateVariable::Q => "q",
            ClimateVariable::Soil => "soil",
            ClimateVariable::Srad => "srad",
            ClimateVariable::Swe => "swe",
            ClimateVariable::Tmax => "tmax",
            ClimateVariable::Tmin => "tmin",
            ClimateVariable::Vap => "vap",
            ClimateVariable::Ws => "ws",
            ClimateVariable::Vpd => "vpd",
            ClimateVariable::Pdsi => "PDSI",
        }
    }

    /// Physically plausible `[min, max]` for this variable, rough global
    /// extremes used by the value-range validation check.
    pub fn plausible_range(&self) -> (f64, f64) {
        match self {
            ClimateVariable::Aet => (0.0, 500.0),
            ClimateVariable::Def => (0.0, 500.0),
            ClimateVariable::Pet => (0.0, 500.0),
            ClimateVariable::Ppt => (0.0, 2000.0),
            ClimateVariable::Q => (0.0, 1000.0),
            ClimateVariable::Soil => (0.0, 1000.0),
            ClimateVariable::Srad => (0.0, 500.0),
            ClimateVariable::Swe => (0.0, 10000.0),
            ClimateVariable::Tmax => (-50.0, 60.0),
            ClimateVariable::Tmin => (-80.0, 50.0),
            ClimateVariable::Vap => (0.0, 100.0),
            ClimateVariable::Ws => (0.0, 50.0),
            ClimateVariable::Vpd => (0.0, 10.0),
            ClimateVariable::Pdsi => (-10.0, 10.0),
        }
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a variable name does not match any TerraClimate variable.
/// Unknown names are a configuration error and rejected before any
/// extraction work begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown climate variable '{0}'")]
pub struct UnknownVariableError(pub String);

impl FromStr for ClimateVariable {
    type Err = UnknownVariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownVariableError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_all_names() {
        for variable in ClimateVariable::ALL {
            assert_eq!(variable.name().parse::<ClimateVariable>(), Ok(variable));
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("pdsi".parse::<ClimateVariable>(), Ok(ClimateVariable::Pdsi));
        assert_eq!("TMAX".parse::<ClimateVariable>(), Ok(ClimateVariable::Tmax));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "humidity".parse::<ClimateVariable>().unwrap_err();
        assert_eq!(err, UnknownVariableError("humidity".to_string()));
    }

    #[test]
    fn plausible_ranges_are_ordered() {
        for variable in ClimateVariable::ALL {
            let (min, max) = variable.plausible_range();
            assert!(min < max, "{variable}: {min} >= {max}");
        }
    }
}
