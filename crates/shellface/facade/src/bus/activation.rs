//! `org.shellface.Accelerators` at `/org/shellface/Accelerators`.
//!
//! Key-event input for compositors that bind keys to commands instead of
//! exposing a grab protocol. A compositor binding such as
//!
//! ```text
//! busctl --user call org.gnome.Shell /org/shellface/Accelerators \
//!     org.shellface.Accelerators Activate suu '<Super>space' 0 0
//! ```
//!
//! reports the press, and the client holding the grab receives
//! `AcceleratorActivated`.

use std::sync::Arc;

use shellface_proto::Accelerator;
use zbus::interface;

use super::error::ShellError;
use crate::core::{ActivationContext, ShellFacade};

/// Skeleton of the key-event input.
pub(crate) struct ActivationObject {
	facade: Arc<ShellFacade>,
}

impl ActivationObject {
	pub(crate) fn new(facade: Arc<ShellFacade>) -> Self {
		Self { facade }
	}
}

#[interface(name = "org.shellface.Accelerators")]
impl ActivationObject {
	/// Reports a press of `accelerator`. Returns whether a grabbing client was
	/// notified.
	fn activate(&self, accelerator: String, device_id: u32, timestamp: u32) -> Result<bool, ShellError> {
		let binding: Accelerator = accelerator
			.parse()
			.map_err(|e: shellface_proto::AcceleratorParseError| ShellError::InvalidArgument(e.to_string()))?;
		let delivered = self
			.facade
			.activate_accelerator(&binding, ActivationContext { device_id, timestamp });
		tracing::debug!(%binding, delivered, "key press reported");
		Ok(delivered)
	}
}
