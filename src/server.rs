use crate::bus::MovementSimulator;
use crate::config::Config;
use crate::consts::CLIENT_READ_TIMEOUT_SECS;
use crate::data::{BusTable, PositionStore};
use crate::http::{content_type_for, read_request, Method, Request, Response};
use crate::location::{UserLocation, UserLocationReport};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

pub type SharedApp = Arc<Mutex<App>>;

#[derive(Debug, Serialize)]
struct UserLocationUpdated {
    status: &'static str,
    user_location: UserLocation,
}

/// Everything a request handler may touch. Owned by the server and shared
/// between connection threads behind a single lock.
#[derive(Debug)]
pub struct App {
    store: PositionStore,
    simulator: MovementSimulator,
    rng: StdRng,
    user_location: Option<UserLocation>,
    static_dir: PathBuf,
    page: PathBuf,
}

impl App {
    pub fn new(
        store: PositionStore,
        simulator: MovementSimulator,
        rng: StdRng,
        static_dir: impl Into<PathBuf>,
        page: impl Into<PathBuf>,
    ) -> App {
        App {
            store,
            simulator,
            rng,
            user_location: None,
            static_dir: static_dir.into(),
            page: page.into(),
        }
    }

    /// Loads (or seeds) the position file and builds the simulator from flags.
    pub fn from_config(config: &Config) -> Result<App> {
        let store = PositionStore::load(&config.data_file)?;
        let simulator = MovementSimulator::try_new(config.bounds, config.max_step)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        if store.is_empty() {
            warn!(data_file = %store.path().display(), "Position file lists no buses");
        }
        info!(
            buses = store.len(),
            data_file = %store.path().display(),
            max_step = simulator.max_step(),
            bounds = ?simulator.bounds(),
            "Position store ready"
        );
        Ok(App::new(
            store,
            simulator,
            rng,
            &config.static_dir,
            &config.page,
        ))
    }

    pub fn buses(&self) -> &BusTable {
        self.store.buses()
    }

    pub fn user_location(&self) -> Option<UserLocation> {
        self.user_location
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        let path = request.path.as_str();
        match (path, &request.method) {
            ("/", Method::Get) => self.map_page(),
            ("/get_bus_data", Method::Get) => self.bus_data(),
            ("/update-user-location", Method::Post) => self.update_user_location(&request.body),
            (_, Method::Get) if path.starts_with("/static/") => {
                self.static_file(&path["/static/".len()..])
            }
            ("/" | "/get_bus_data" | "/update-user-location", _) => Response::error(405),
            _ if path.starts_with("/static/") => Response::error(405),
            _ => Response::error(404),
        }
    }

    fn bus_data(&mut self) -> Response {
        if let Err(err) = self.simulator.step(&mut self.store, &mut self.rng) {
            error!(
                "Couldn't persist bus positions to {}: {err:#}",
                self.store.path().display()
            );
            return Response::error(500);
        }
        Response::json(200, self.store.buses())
    }

    fn update_user_location(&mut self, body: &[u8]) -> Response {
        let report: UserLocationReport = match serde_json::from_slice(body) {
            Ok(report) => report,
            Err(err) => {
                error!("Malformed user location body: {err}");
                return Response::error(500);
            }
        };
        let location = UserLocation::from(report);
        debug!(lat = ?location.lat, lng = ?location.lng, "User location updated");
        self.user_location = Some(location);
        Response::json(
            200,
            &UserLocationUpdated {
                status: "success",
                user_location: location,
            },
        )
    }

    fn map_page(&self) -> Response {
        match fs::read(&self.page) {
            Ok(body) => Response::new(200, "text/html; charset=utf-8", body),
            Err(err) => {
                error!("Couldn't read map page {}: {err}", self.page.display());
                Response::error(500)
            }
        }
    }

    fn static_file(&self, relative: &str) -> Response {
        let relative = Path::new(relative);
        let is_plain = relative.components().next().is_some()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            warn!("Refusing static path {}", relative.display());
            return Response::error(404);
        }

        let path = self.static_dir.join(relative);
        if path.is_dir() {
            return Response::error(404);
        }
        match fs::read(&path) {
            Ok(body) => Response::new(200, content_type_for(&path), body),
            Err(err) if err.kind() == ErrorKind::NotFound => Response::error(404),
            Err(err) => {
                error!("Couldn't read {}: {err}", path.display());
                Response::error(500)
            }
        }
    }
}

fn lock_app(app: &SharedApp) -> MutexGuard<'_, App> {
    // Handlers never leave the state half-updated, so a poisoned lock is still usable
    app.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct Server {
    listener: TcpListener,
    app: SharedApp,
}

impl Server {
    pub fn bind(address: impl ToSocketAddrs, app: App) -> Result<Server> {
        let listener = TcpListener::bind(address).context("Couldn't bind listener")?;
        Ok(Server {
            listener,
            app: Arc::new(Mutex::new(app)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, one thread per client.
    pub fn run(self) -> Result<()> {
        info!("Server running on http://{}", self.local_addr()?);
        for stream in self.listener.incoming() {
            match stream {
                Ok(client_stream) => {
                    let app = Arc::clone(&self.app);
                    thread::spawn(move || {
                        if let Err(err) = handle_client(client_stream, app) {
                            warn!("Error handling client: {err:#}");
                        }
                    });
                }
                Err(err) => {
                    warn!("Error accepting connection: {err}");
                }
            }
        }
        Ok(())
    }
}

fn handle_client(mut stream: TcpStream, app: SharedApp) -> Result<()> {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let span = info_span!("request", id = %Uuid::new_v4(), %peer);
    let _entered = span.enter();

    stream.set_read_timeout(Some(Duration::from_secs(CLIENT_READ_TIMEOUT_SECS)))?;
    let mut reader = BufReader::new(stream.try_clone()?);

    let response = match read_request(&mut reader) {
        Ok(Some(request)) => {
            let response = lock_app(&app).handle(&request);
            info!(
                method = %request.method,
                path = %request.path,
                status = response.status,
                "Handled request"
            );
            response
        }
        Ok(None) => {
            debug!("Client closed connection without a request");
            return Ok(());
        }
        Err(err) => {
            warn!("Bad request: {err:#}");
            Response::error(400)
        }
    };

    response
        .write_to(&mut stream)
        .context("Couldn't write response")
}
