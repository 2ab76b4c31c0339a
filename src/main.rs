use anyhow::Result;
use clap::Parser;
use shuttle_tracker::config::{Args, Config};
use shuttle_tracker::server::{App, Server};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let config = Config::try_from(Args::parse())?;
    let app = App::from_config(&config)?;
    let server = Server::bind(config.bind_address(), app)?;
    server.run()
}
