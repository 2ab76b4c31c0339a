pub const CAMPUS_NORTH: f64 = 13.006854936862313;
pub const CAMPUS_SOUTH: f64 = 12.98194024408501;
pub const CAMPUS_EAST: f64 = 80.24419665683384;
pub const CAMPUS_WEST: f64 = 80.22102494207626;

// Roughly half a metre in either axis
pub const DEFAULT_MAX_STEP: f64 = 0.000005;
// One degree is far wider than any campus
pub const MAX_STEP_LIMIT: f64 = 1.0;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATA_FILE: &str = "bus_coordinates.csv";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_PAGE: &str = "templates/map.html";

pub const DEFAULT_BUSES: [(&str, f64, f64); 3] = [
    ("Bus 1", 12.995, 80.233),
    ("Bus 2", 13.000, 80.235),
    ("Bus 3", 12.998, 80.230),
];

pub const MAX_REQUEST_HEAD_BYTES: usize = 8 * 1024;
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;
pub const CLIENT_READ_TIMEOUT_SECS: u64 = 5;
