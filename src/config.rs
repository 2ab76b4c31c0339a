use crate::bus::validate_max_step;
use crate::consts::{
    CAMPUS_EAST, CAMPUS_NORTH, CAMPUS_SOUTH, CAMPUS_WEST, DEFAULT_DATA_FILE, DEFAULT_HOST,
    DEFAULT_MAX_STEP, DEFAULT_PAGE, DEFAULT_PORT, DEFAULT_STATIC_DIR,
};
use crate::location::CampusBounds;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "shuttle_tracker",
    about = "Serves simulated campus shuttle positions to a browser map"
)]
pub struct Args {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// CSV file mirroring the bus positions (`Bus,lat,lng`)
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    pub data_file: PathBuf,
    #[arg(long, default_value = DEFAULT_STATIC_DIR)]
    pub static_dir: PathBuf,
    /// HTML page served at `/`
    #[arg(long, default_value = DEFAULT_PAGE)]
    pub page: PathBuf,
    /// Largest per-step offset in degrees for either axis
    #[arg(long, default_value_t = DEFAULT_MAX_STEP)]
    pub max_step: f64,
    /// Seed for reproducible movement
    #[arg(long)]
    pub seed: Option<u64>,
    /// Northern edge of the campus, in degrees latitude
    #[arg(long, default_value_t = CAMPUS_NORTH, allow_negative_numbers = true)]
    pub north: f64,
    #[arg(long, default_value_t = CAMPUS_SOUTH, allow_negative_numbers = true)]
    pub south: f64,
    #[arg(long, default_value_t = CAMPUS_EAST, allow_negative_numbers = true)]
    pub east: f64,
    #[arg(long, default_value_t = CAMPUS_WEST, allow_negative_numbers = true)]
    pub west: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_file: PathBuf,
    pub static_dir: PathBuf,
    pub page: PathBuf,
    pub max_step: f64,
    pub seed: Option<u64>,
    pub bounds: CampusBounds,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            page: PathBuf::from(DEFAULT_PAGE),
            max_step: DEFAULT_MAX_STEP,
            seed: None,
            bounds: CampusBounds::default(),
        }
    }
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Config> {
        validate_max_step(args.max_step).context("Invalid --max-step")?;
        let bounds = CampusBounds::try_new(args.north, args.south, args.east, args.west)
            .context("Invalid campus bounds")?;
        Ok(Config {
            host: args.host,
            port: args.port,
            data_file: args.data_file,
            static_dir: args.static_dir,
            page: args.page,
            max_step: args.max_step,
            seed: args.seed,
            bounds,
        })
    }
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let args = Args::try_parse_from(["shuttle_tracker"]).unwrap();
        let config = Config::try_from(args).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.data_file, PathBuf::from("bus_coordinates.csv"));
        assert_eq!(config.max_step, 0.000005);
        assert_eq!(config.seed, None);
        assert_eq!(config.bounds, CampusBounds::default());
    }

    #[test]
    fn negative_step_is_rejected() {
        let args =
            Args::try_parse_from(["shuttle_tracker", "--max-step=-1", "--seed", "7"]).unwrap();
        assert!(Config::try_from(args).is_err());
    }

    #[test]
    fn step_wide_enough_to_overflow_sampling_is_rejected() {
        let args = Args::try_parse_from(["shuttle_tracker", "--max-step", "1e308"]).unwrap();
        assert!(Config::try_from(args).is_err());
    }

    #[test]
    fn bounds_come_from_flags() {
        let args = Args::try_parse_from([
            "shuttle_tracker",
            "--north",
            "1.5",
            "--south",
            "-1.5",
            "--east",
            "2",
            "--west",
            "-2",
        ])
        .unwrap();
        let config = Config::try_from(args).unwrap();
        assert_eq!(
            config.bounds,
            CampusBounds::try_new(1.5, -1.5, 2.0, -2.0).unwrap()
        );
    }

    #[test]
    fn inverted_bounds_are_rejected_at_startup() {
        let args =
            Args::try_parse_from(["shuttle_tracker", "--north", "12.0", "--south", "13.0"])
                .unwrap();
        assert!(Config::try_from(args).is_err());
    }
}
