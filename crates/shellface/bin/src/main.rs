//! Shellface daemon.
//!
//! Publishes `org.gnome.Shell` and `org.gnome.Caribou.Keyboard` on the session
//! bus and forwards their effects to the running compositor:
//! - overview and on-screen keyboard through configured commands
//! - global accelerator grabs into the keybinding table
//! - OSD popups through a templated command

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use shellface::bus::{self, ServeOptions};
use shellface::config::Config;
use shellface::core::ShellFacade;
use shellface::service::ShellService;
use shellface::signals::SignalEmitter;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Daemon command line arguments.
#[derive(Parser, Debug)]
#[command(name = "shellface-daemon")]
#[command(about = "GNOME Shell D-Bus facade for non-GNOME compositors")]
struct Args {
	/// Configuration file
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Replace a running shell that owns the bus names
	#[arg(long)]
	replace: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	info!("starting shellface-daemon");

	let config = match &args.config {
		Some(path) => Config::load(path)?,
		None => Config::load_or_default(shellface_proto::paths::default_config_path().as_deref())?,
	};
	info!(
		shell_version = %config.service.shell_version,
		extensions = config.extensions.len(),
		"configuration loaded"
	);

	let (emitter, signals) = SignalEmitter::channel();
	let facade = Arc::new(ShellFacade::from_config(&config, emitter));

	let shutdown = CancellationToken::new();
	tokio::spawn(cancel_on_signal(shutdown.clone()));

	bus::serve(
		ShellService::new(facade),
		signals,
		ServeOptions {
			replace: args.replace,
		},
		shutdown,
	)
	.await?;

	Ok(())
}

/// Cancels `shutdown` on SIGINT or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
	use tokio::signal::unix::{SignalKind, signal};

	let mut terminate = match signal(SignalKind::terminate()) {
		Ok(stream) => stream,
		Err(e) => {
			tracing::error!(error = %e, "failed to install SIGTERM handler");
			return;
		}
	};

	tokio::select! {
		res = tokio::signal::ctrl_c() => {
			if let Err(e) = res {
				tracing::error!(error = %e, "failed to listen for SIGINT");
				return;
			}
			info!("SIGINT received");
		}
		_ = terminate.recv() => info!("SIGTERM received"),
	}
	shutdown.cancel();
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("shellface=trace,shellface_daemon=trace,info")
			} else {
				EnvFilter::new("shellface=info,shellface_daemon=info,warn")
			}
		})
	};

	// SHELLFACE_LOG_DIR writes one log file per process.
	if let Some(log_dir) = std::env::var("SHELLFACE_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("shellface-daemon.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry()
				.with(filter())
				.with(file_layer)
				.init();

			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
