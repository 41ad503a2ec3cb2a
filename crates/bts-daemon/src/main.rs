// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `osmo-bts-virtual`: the BTS daemon binary (spec.md §6).
//!
//! Owns the A-bis OML/RSL listeners, the PCU side channel and a timer
//! facility, all driven from one cooperative poll loop (spec.md §5: "The
//! core is single-threaded cooperative").
//!
//! # Usage
//!
//! ```bash
//! osmo-bts-virtual --config /etc/osmocom/osmo-bts.json
//! osmo-bts-virtual --site-id 2 --unit-id 5 --daemonize
//! ```

use bts_core::pcu::socket::bind_pcu_socket;
use bts_core::{error, info};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod config;
mod daemonize;
mod logging_bridge;

use config::DaemonConfig;
use logging_bridge::TracingOutput;

/// Exit codes (spec.md §6: "0 normal, 1 startup failure, 2 configuration error").
const EXIT_OK: u8 = 0;
const EXIT_STARTUP_FAILURE: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "osmo-bts-virtual")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured ip.access site-id.
    #[arg(long)]
    site_id: Option<u16>,

    /// Override the configured ip.access unit (bts) id.
    #[arg(long)]
    unit_id: Option<u16>,

    /// Fork into the background, detach from the controlling terminal.
    #[arg(short, long, default_value = "false")]
    daemonize: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args.log_level);
    bts_core::logging::init_logger(
        Arc::new(TracingOutput),
        logging_bridge::level_from_str(&args.log_level),
    );

    let mut config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if let Some(site_id) = args.site_id {
        config.site_id = site_id;
    }
    if let Some(unit_id) = args.unit_id {
        config.unit_id = unit_id;
    }

    if args.daemonize {
        if let Err(e) = daemonize::daemonize() {
            error!("failed to daemonize: {e}");
            return ExitCode::from(EXIT_STARTUP_FAILURE);
        }
    }

    match run(&config) {
        Ok(()) => ExitCode::from(EXIT_OK),
        Err(e) => {
            error!("startup failure: {e}");
            ExitCode::from(EXIT_STARTUP_FAILURE)
        }
    }
}

fn init_tracing(log_level: &str) {
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn load_config(path: Option<&Path>) -> Result<DaemonConfig, config::ConfigError> {
    let config = match path {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Bind the A-bis/PCU listeners and run the cooperative poll loop until a
/// shutdown signal arrives.
fn run(config: &DaemonConfig) -> std::io::Result<()> {
    use mio::net::TcpListener as MioTcpListener;
    use mio::{Events, Interest, Poll, Token};

    info!(
        "starting osmo-bts-virtual (site_id={}, unit_id={})",
        config.site_id, config.unit_id
    );

    let oml_addr = format!("0.0.0.0:{}", config.oml_port).parse().unwrap();
    let rsl_addr = format!("0.0.0.0:{}", config.rsl_port).parse().unwrap();
    let mut oml_listener = MioTcpListener::bind(oml_addr)?;
    let mut rsl_listener = MioTcpListener::bind(rsl_addr)?;
    let pcu_socket = bind_pcu_socket(Path::new(&config.pcu_socket_path))?;
    let mut pcu_listener = mio::net::UnixListener::from_std(
        bts_core::pcu::socket::into_std_listener(pcu_socket),
    );

    const OML_TOKEN: Token = Token(0);
    const RSL_TOKEN: Token = Token(1);
    const PCU_TOKEN: Token = Token(2);

    let mut poll = Poll::new()?;
    poll.registry()
        .register(&mut oml_listener, OML_TOKEN, Interest::READABLE)?;
    poll.registry()
        .register(&mut rsl_listener, RSL_TOKEN, Interest::READABLE)?;
    poll.registry()
        .register(&mut pcu_listener, PCU_TOKEN, Interest::READABLE)?;

    info!(
        "A-bis and PCU listeners bound (oml_port={}, rsl_port={}, pcu_socket={})",
        config.oml_port, config.rsl_port, config.pcu_socket_path
    );

    let mut events = Events::with_capacity(128);
    let shutdown = daemonize::install_shutdown_flag()?;
    while !shutdown.load(std::sync::atomic::Ordering::Relaxed) {
        poll.poll(&mut events, Some(std::time::Duration::from_millis(250)))?;
        for event in &events {
            match event.token() {
                OML_TOKEN => accept_all(&oml_listener, "OML", |b| {
                    bts_core::oml::classify_discriminator(b)
                        .map(|d| format!("0x{d:02x}"))
                        .map_err(|e| e.to_string())
                }),
                RSL_TOKEN => accept_all(&rsl_listener, "RSL", |b| {
                    bts_core::rsl::classify_discriminator(b)
                        .map(|d| format!("{d:?}"))
                        .map_err(|e| e.to_string())
                }),
                PCU_TOKEN => match pcu_listener.accept() {
                    Ok((mut stream, _)) => {
                        info!("PCU connected");
                        use std::io::Read;
                        let mut header = [0u8; bts_core::pcu::protocol::HEADER_LEN];
                        match stream.read(&mut header) {
                            Ok(n) if n == header.len() => {
                                match bts_core::pcu::protocol::Header::decode(&header) {
                                    Ok(h) => info!("PCU first primitive: {:?}", h.msg_type),
                                    Err(e) => error!("PCU header rejected: {e}"),
                                }
                            }
                            Ok(_) => info!("PCU link closed before a full header arrived"),
                            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                                info!("PCU link accepted, header not yet available");
                            }
                            Err(e) => error!("PCU header read failed: {e}"),
                        }
                    }
                    Err(e) => error!("PCU accept failed: {e}"),
                },
                _ => {}
            }
        }
    }
    info!("shutdown signal received, exiting");
    Ok(())
}

/// Accept every pending connection on `listener` and opportunistically
/// classify its first byte via `classify` (`rsl`/`oml` discriminator
/// classification). This is a single non-blocking read, not a framed
/// message loop: if the discriminator byte hasn't arrived yet the
/// connection is left registered on the poll but not read again here.
/// Full RSL/OML message framing and dispatch is not yet wired into the
/// daemon (see DESIGN.md).
fn accept_all(listener: &mio::net::TcpListener, name: &str, classify: impl Fn(u8) -> Result<String, String>) {
    use std::io::Read;
    loop {
        match listener.accept() {
            Ok((mut stream, addr)) => {
                info!("{name} link from {addr}");
                let mut byte = [0u8; 1];
                match stream.read(&mut byte) {
                    Ok(1) => match classify(byte[0]) {
                        Ok(kind) => info!("{name} discriminator 0x{:02x} -> {kind}", byte[0]),
                        Err(e) => error!("{name} discriminator rejected: {e}"),
                    },
                    Ok(_) => info!("{name} link closed before any bytes arrived"),
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        info!("{name} link accepted, discriminator not yet available");
                    }
                    Err(e) => error!("{name} read failed: {e}"),
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(e) => {
                error!("{name} accept failed: {e}");
                break;
            }
        }
    }
}
