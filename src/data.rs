use crate::consts::DEFAULT_BUSES;
use crate::location::Coordinates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

pub type BusId = String;

/// Bus identifier to current position, ordered by identifier.
pub type BusTable = BTreeMap<BusId, Coordinates>;

const CSV_HEADER: [&str; 3] = ["Bus", "lat", "lng"];

#[derive(Debug, Deserialize, Serialize)]
struct PositionRow {
    #[serde(rename = "Bus")]
    bus: BusId,
    lat: f64,
    lng: f64,
}

pub fn default_buses() -> BusTable {
    DEFAULT_BUSES
        .iter()
        .map(|(bus, lat, lng)| (bus.to_string(), Coordinates::new(*lat, *lng)))
        .collect()
}

/// Reads a `Bus,lat,lng` file. Returns `Ok(None)` when the file does not exist.
pub fn read_positions_from_file(path: &Path) -> Result<Option<BusTable>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error).with_context(|| format!("Couldn't open {}", path.display()))
        }
    };

    let mut buses = BusTable::new();
    for rec in csv::Reader::from_reader(BufReader::new(file)).deserialize() {
        let rec: PositionRow =
            rec.with_context(|| format!("Malformed row in {}", path.display()))?;
        let coords = Coordinates::new(rec.lat, rec.lng);
        if let Some(earlier) = buses.insert(rec.bus.clone(), coords) {
            // Later rows win
            warn!(
                bus = %rec.bus,
                %earlier,
                later = %coords,
                "Duplicate bus in {}",
                path.display()
            );
        }
    }
    Ok(Some(buses))
}

/// Overwrites `path` with one row per bus. The rows go to a sibling temporary
/// file first, which is then renamed over the target.
pub fn write_positions_to_file(buses: &BusTable, path: &Path) -> Result<()> {
    let tmp_path = temporary_path_for(path);
    {
        let file = File::create(&tmp_path)
            .with_context(|| format!("Couldn't create {}", tmp_path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        writer.write_record(CSV_HEADER)?;
        for (bus, coords) in buses {
            writer.serialize(PositionRow {
                bus: bus.clone(),
                lat: coords.lat,
                lng: coords.lng,
            })?;
        }
        writer
            .flush()
            .with_context(|| format!("Couldn't write {}", tmp_path.display()))?;
    }
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Couldn't move {} into place at {}",
            tmp_path.display(),
            path.display()
        )
    })?;
    trace!(path = %path.display(), rows = buses.len(), "Positions written");
    Ok(())
}

fn temporary_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// In-memory bus positions mirrored to a flat file.
#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
    buses: BusTable,
}

impl PositionStore {
    /// Loads the file at `path`. A missing file is a first run: the default
    /// fleet is seeded and written out straight away.
    pub fn load(path: impl Into<PathBuf>) -> Result<PositionStore> {
        let path = path.into();
        let buses = match read_positions_from_file(&path)? {
            Some(buses) => {
                debug!(path = %path.display(), buses = buses.len(), "Loaded bus positions");
                buses
            }
            None => {
                info!(path = %path.display(), "No position file found, seeding default buses");
                let buses = default_buses();
                write_positions_to_file(&buses, &path)?;
                buses
            }
        };
        Ok(PositionStore { path, buses })
    }

    pub fn save(&self) -> Result<()> {
        write_positions_to_file(&self.buses, &self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buses(&self) -> &BusTable {
        &self.buses
    }

    pub fn buses_mut(&mut self) -> &mut BusTable {
        &mut self.buses
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }
}
