pub mod bus;
pub mod config;
pub mod consts;
pub mod data;
pub mod http;
pub mod location;
pub mod server;

pub use bus::MovementSimulator;
pub use config::Config;
pub use data::{BusTable, PositionStore};
pub use location::{CampusBounds, Coordinates, UserLocation};
pub use server::{App, Server};
