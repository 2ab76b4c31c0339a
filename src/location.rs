use crate::consts::{CAMPUS_EAST, CAMPUS_NORTH, CAMPUS_SOUTH, CAMPUS_WEST};
use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Default, Debug, PartialEq, Deserialize, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

/// Rectangular latitude/longitude region every simulated bus must stay inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CampusBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Default for CampusBounds {
    fn default() -> Self {
        CampusBounds {
            north: CAMPUS_NORTH,
            south: CAMPUS_SOUTH,
            east: CAMPUS_EAST,
            west: CAMPUS_WEST,
        }
    }
}

impl CampusBounds {
    pub fn try_new(north: f64, south: f64, east: f64, west: f64) -> Result<CampusBounds> {
        ensure!(
            [north, south, east, west].iter().all(|edge| edge.is_finite()),
            "Campus bounds must be finite"
        );
        ensure!(
            south <= north,
            "South edge {south} lies above north edge {north}"
        );
        ensure!(west <= east, "West edge {west} lies east of east edge {east}");
        Ok(CampusBounds {
            north,
            south,
            east,
            west,
        })
    }

    /// Nearest point inside the bounds, each axis clamped independently.
    pub fn clamp(&self, coords: Coordinates) -> Coordinates {
        Coordinates {
            lat: self.south.max(coords.lat.min(self.north)),
            lng: self.west.max(coords.lng.min(self.east)),
        }
    }

    pub fn contains(&self, coords: &Coordinates) -> bool {
        coords.lat >= self.south
            && coords.lat <= self.north
            && coords.lng >= self.west
            && coords.lng <= self.east
    }
}

/// Last location a browser reported. Fields the client left out stay `None`
/// and serialize as `null`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Deserialize, Serialize)]
pub struct UserLocation {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Body of `POST /update-user-location`.
#[derive(Clone, Copy, Default, Debug, Deserialize)]
pub struct UserLocationReport {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl From<UserLocationReport> for UserLocation {
    fn from(report: UserLocationReport) -> UserLocation {
        UserLocation {
            lat: report.latitude,
            lng: report.longitude,
        }
    }
}
