//! Capability adapters.
//!
//! Each adapter is the narrow imperative surface the dispatcher needs from one
//! shell subsystem. Implementations hide the real subsystem; the facade ships a
//! command-backed variant for overview, keyboard and OSD, and an in-memory
//! keybinding table for accelerators.

use shellface_proto::{Accelerator, CallError, ErrorKind, GrabToken};

mod command;
mod keybindings;

pub use command::{CommandKeyboard, CommandOsd, CommandOverview};
pub use keybindings::KeybindingTable;

/// Errors reported by capability adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
	/// The subsystem cannot be reached.
	#[error("{subsystem} is unavailable: {reason}")]
	Unavailable {
		/// Subsystem name for diagnostics.
		subsystem: &'static str,
		/// Why it is unavailable.
		reason: String,
	},
	/// The subsystem rejected the binding.
	#[error("invalid binding '{0}'")]
	InvalidBinding(String),
	/// Any other subsystem fault.
	#[error("{0}")]
	Other(String),
}

impl From<AdapterError> for CallError {
	fn from(err: AdapterError) -> Self {
		let kind = match &err {
			AdapterError::InvalidBinding(_) => ErrorKind::InvalidArgument,
			AdapterError::Unavailable { .. } | AdapterError::Other(_) => ErrorKind::SubsystemUnavailable,
		};
		CallError::new(kind, err.to_string())
	}
}

/// Shell overview control.
pub trait OverviewAdapter: Send + Sync + 'static {
	/// Shows the overview.
	fn show(&self) -> Result<(), AdapterError>;
	/// Hides the overview.
	fn hide(&self) -> Result<(), AdapterError>;
	/// Whether the overview is currently visible.
	fn is_visible(&self) -> bool;
}

/// On-screen keyboard control.
pub trait KeyboardAdapter: Send + Sync + 'static {
	/// Shows or hides the on-screen keyboard.
	fn set_visible(&self, visible: bool) -> Result<(), AdapterError>;
}

/// Global keybinding registration.
///
/// Exclusivity is enforced by the shell state store before `grab` is called;
/// adapters only register and release.
pub trait AcceleratorAdapter: Send + Sync + 'static {
	/// Registers `accelerator` under `token`.
	fn grab(&self, accelerator: &Accelerator, token: GrabToken) -> Result<(), AdapterError>;
	/// Releases `token`. Releasing an unknown token succeeds.
	fn ungrab(&self, token: GrabToken) -> Result<(), AdapterError>;
}

/// On-screen display popups (volume, brightness, ...).
pub trait OsdAdapter: Send + Sync + 'static {
	/// Shows one OSD popup.
	fn show(&self, request: &OsdRequest) -> Result<(), AdapterError>;
}

/// Decoded `ShowOSD` parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsdRequest {
	/// Themed icon name.
	pub icon: Option<String>,
	/// Text label.
	pub label: Option<String>,
	/// Level bar value.
	pub level: Option<f64>,
	/// Level bar maximum, defaults to 1.0 on the shell side.
	pub max_level: Option<f64>,
	/// Output connector the popup should appear on.
	pub connector: Option<String>,
}

/// The set of adapters a facade drives.
pub struct Adapters {
	/// Overview adapter.
	pub overview: Box<dyn OverviewAdapter>,
	/// On-screen keyboard adapter.
	pub keyboard: Box<dyn KeyboardAdapter>,
	/// Accelerator adapter.
	pub accelerators: Box<dyn AcceleratorAdapter>,
	/// OSD adapter.
	pub osd: Box<dyn OsdAdapter>,
}

impl std::fmt::Debug for Adapters {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Adapters")
			.field("overview", &"<dyn OverviewAdapter>")
			.field("keyboard", &"<dyn KeyboardAdapter>")
			.field("accelerators", &"<dyn AcceleratorAdapter>")
			.field("osd", &"<dyn OsdAdapter>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invalid_binding_maps_to_invalid_argument() {
		let err: CallError = AdapterError::InvalidBinding("<Super>".into()).into();
		assert_eq!(err.kind, ErrorKind::InvalidArgument);
	}

	#[test]
	fn unexpected_faults_map_to_subsystem_unavailable() {
		let err: CallError = AdapterError::Other("socket closed".into()).into();
		assert_eq!(err.kind, ErrorKind::SubsystemUnavailable);
		assert_eq!(err.message, "socket closed");

		let err: CallError = AdapterError::Unavailable {
			subsystem: "overview",
			reason: "no runtime".into(),
		}
		.into();
		assert_eq!(err.kind, ErrorKind::SubsystemUnavailable);
	}
}
