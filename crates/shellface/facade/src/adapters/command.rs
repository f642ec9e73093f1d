//! Adapters that drive the running compositor through external commands.
//!
//! Commands are spawned without waiting for them; a background task reaps the
//! child and logs its exit status. With no command configured an adapter only
//! tracks state, which keeps the facade usable on a compositor without the
//! corresponding feature.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{AdapterError, KeyboardAdapter, OsdAdapter, OsdRequest, OverviewAdapter};

/// Spawns `argv` and returns once the process has started.
fn spawn_detached(subsystem: &'static str, argv: &[String]) -> Result<(), AdapterError> {
	let Some((program, args)) = argv.split_first() else {
		return Err(AdapterError::Other(format!("{subsystem}: empty command")));
	};

	let handle = tokio::runtime::Handle::try_current().map_err(|_| AdapterError::Unavailable {
		subsystem,
		reason: "no tokio runtime available".to_string(),
	})?;

	// Runtime context is required for the child's reaper registration.
	let _guard = handle.enter();
	let mut child = tokio::process::Command::new(program)
		.args(args)
		.stdin(Stdio::null())
		.stdout(Stdio::null())
		.stderr(Stdio::inherit())
		.spawn()
		.map_err(|e| {
			tracing::error!(subsystem, program = %program, error = %e, "failed to spawn command");
			AdapterError::Unavailable {
				subsystem,
				reason: e.to_string(),
			}
		})?;

	let program = program.clone();
	handle.spawn(async move {
		match child.wait().await {
			Ok(status) if status.success() => {
				tracing::debug!(subsystem, %program, "command finished");
			}
			Ok(status) => {
				tracing::warn!(subsystem, %program, ?status, "command exited with failure");
			}
			Err(e) => {
				tracing::warn!(subsystem, %program, error = %e, "failed to wait on command");
			}
		}
	});

	Ok(())
}

/// Overview adapter backed by optional show/hide commands.
#[derive(Debug, Default)]
pub struct CommandOverview {
	show: Option<Vec<String>>,
	hide: Option<Vec<String>>,
	visible: AtomicBool,
}

impl CommandOverview {
	/// Creates an adapter running `show`/`hide` when present.
	#[must_use]
	pub fn new(show: Option<Vec<String>>, hide: Option<Vec<String>>) -> Self {
		Self {
			show,
			hide,
			visible: AtomicBool::new(false),
		}
	}

	fn run(&self, argv: Option<&Vec<String>>, visible: bool) -> Result<(), AdapterError> {
		match argv {
			Some(argv) => spawn_detached("overview", argv)?,
			None => tracing::debug!(visible, "no overview command configured, tracking state only"),
		}
		self.visible.store(visible, Ordering::Release);
		Ok(())
	}
}

impl OverviewAdapter for CommandOverview {
	fn show(&self) -> Result<(), AdapterError> {
		self.run(self.show.as_ref(), true)
	}

	fn hide(&self) -> Result<(), AdapterError> {
		self.run(self.hide.as_ref(), false)
	}

	fn is_visible(&self) -> bool {
		self.visible.load(Ordering::Acquire)
	}
}

/// On-screen keyboard adapter backed by optional show/hide commands.
#[derive(Debug, Default)]
pub struct CommandKeyboard {
	show: Option<Vec<String>>,
	hide: Option<Vec<String>>,
}

impl CommandKeyboard {
	/// Creates an adapter running `show`/`hide` when present.
	#[must_use]
	pub fn new(show: Option<Vec<String>>, hide: Option<Vec<String>>) -> Self {
		Self { show, hide }
	}
}

impl KeyboardAdapter for CommandKeyboard {
	fn set_visible(&self, visible: bool) -> Result<(), AdapterError> {
		let argv = if visible { &self.show } else { &self.hide };
		match argv {
			Some(argv) => spawn_detached("keyboard", argv),
			None => {
				tracing::debug!(visible, "no keyboard command configured, tracking state only");
				Ok(())
			}
		}
	}
}

/// OSD adapter that runs a templated command per popup.
///
/// Arguments may contain `{icon}`, `{label}`, `{level}`, `{max_level}` and
/// `{connector}`; missing values substitute as empty strings.
#[derive(Debug, Default)]
pub struct CommandOsd {
	command: Option<Vec<String>>,
}

impl CommandOsd {
	/// Creates an adapter running `command` when present.
	#[must_use]
	pub fn new(command: Option<Vec<String>>) -> Self {
		Self { command }
	}

	fn expand(template: &str, request: &OsdRequest) -> String {
		let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
		template
			.replace("{icon}", request.icon.as_deref().unwrap_or_default())
			.replace("{label}", request.label.as_deref().unwrap_or_default())
			.replace("{level}", &number(request.level))
			.replace("{max_level}", &number(request.max_level))
			.replace("{connector}", request.connector.as_deref().unwrap_or_default())
	}
}

impl OsdAdapter for CommandOsd {
	fn show(&self, request: &OsdRequest) -> Result<(), AdapterError> {
		let Some(command) = &self.command else {
			tracing::info!(
				icon = ?request.icon,
				label = ?request.label,
				level = ?request.level,
				"OSD requested, no command configured"
			);
			return Ok(());
		};

		let argv: Vec<String> = command.iter().map(|arg| Self::expand(arg, request)).collect();
		spawn_detached("osd", &argv)
	}
}
