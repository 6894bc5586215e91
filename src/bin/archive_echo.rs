//! Archive Echo Server Binary
//!
//! Menerima `Frame` ter-encode dari client mana pun dan mengirimnya balik
//! apa adanya. Berguna untuk mengukur round-trip codec + TCP.
//!
//! Usage:
//!   cargo run --release --bin archive_echo -- [OPTIONS]
//!
//! Logging diatur lewat `RUST_LOG` (default: `info`).

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hermes_archive::network::{EchoServer, ServerConfig};

/// Echo server untuk frame hermes-archive
#[derive(Debug, Parser)]
#[command(name = "archive_echo", version, about)]
struct Args {
    /// Alamat listen
    #[arg(short, long, default_value = "0.0.0.0:9999")]
    bind: SocketAddr,

    /// Ukuran SO_SNDBUF / SO_RCVBUF per koneksi dalam KB
    #[arg(long, default_value_t = 256)]
    socket_buffer_kb: usize,

    /// Batas koneksi aktif
    #[arg(long, default_value_t = 1024)]
    max_connections: usize,

    /// Interval laporan statistik dalam detik (0 = mati)
    #[arg(long, default_value_t = 10)]
    stats_interval: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: args.bind,
        socket_buffer_size: args.socket_buffer_kb * 1024,
        max_connections: args.max_connections,
    };

    let mut server = EchoServer::bind(config.clone())
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!(
        addr = %server.local_addr()?,
        max_connections = config.max_connections,
        socket_buffer_size = config.socket_buffer_size,
        "archive echo server ready"
    );

    let stats_interval = Duration::from_secs(args.stats_interval);
    let started = Instant::now();
    let mut last_report = Instant::now();

    loop {
        server
            .run_once(Some(Duration::from_millis(1)))
            .context("event loop failed")?;

        if !stats_interval.is_zero() && last_report.elapsed() >= stats_interval {
            let uptime = started.elapsed().as_secs_f64();
            info!(
                uptime_secs = %format!("{:.1}", uptime),
                connections = server.connection_count(),
                frames_echoed = server.frames_echoed(),
                rate = %format!("{:.1}/sec", server.frames_echoed() as f64 / uptime),
                "server stats"
            );
            last_report = Instant::now();
        }
    }
}
