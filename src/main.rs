mod collectors;
mod config;
mod http;
mod snapshot;

use axum::serve;
use clap::Parser;
use config::{Config, ConfigError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fleet-metrics")]
#[command(version)]
struct Cli {
    #[arg(long)]
    config: Option<String>,
    #[arg(long, env = "PORT")]
    port: Option<u16>,
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match load_config(&cli) {
        Ok(cfg) => Arc::new(cfg),
        Err(err) => {
            error!(error = %err, "не удалось загрузить конфигурацию");
            std::process::exit(1);
        }
    };
    let addr = match cfg.listen_addr() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, listen = %cfg.listen, "некорректный адрес listen");
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(err) => {
            error!(error = %err, %addr, "не удалось запустить HTTP-сервер");
            std::process::exit(1);
        }
    };
    info!(listen = %addr, "агент метрик запущен");

    let app = http::build_router(cfg);
    let server = serve(listener, app).with_graceful_shutdown(async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "не удалось дождаться Ctrl+C");
        }
        info!("получен Ctrl+C, выполняется остановка");
    });

    if let Err(err) = server.await {
        error!(error = %err, "ошибка HTTP-сервера");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let cfg = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let cfg = match cli.port {
        Some(port) => cfg.with_port(port)?,
        None => cfg,
    };
    cfg.validate()?;
    Ok(cfg)
}
