//! In-memory keybinding registrar.

use std::collections::HashMap;

use parking_lot::Mutex;
use shellface_proto::{Accelerator, GrabToken};

use super::{AcceleratorAdapter, AdapterError};

/// Keybinding table for compositors whose key presses arrive through the
/// `org.shellface.Accelerators` input rather than a grab protocol.
///
/// Rejects bindings without a modifier whose key is a single printable
/// character, since grabbing them would swallow ordinary typing.
#[derive(Debug, Default)]
pub struct KeybindingTable {
	bindings: Mutex<HashMap<GrabToken, Accelerator>>,
}

impl KeybindingTable {
	/// Creates an empty table.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl AcceleratorAdapter for KeybindingTable {
	fn grab(&self, accelerator: &Accelerator, token: GrabToken) -> Result<(), AdapterError> {
		let mut chars = accelerator.key.chars();
		if accelerator.modifiers.is_empty()
			&& let (Some(ch), None) = (chars.next(), chars.next())
			&& !ch.is_control()
		{
			return Err(AdapterError::InvalidBinding(accelerator.to_string()));
		}

		self.bindings.lock().insert(token, accelerator.clone());
		tracing::debug!(%accelerator, token = token.0, "keybinding registered");
		Ok(())
	}

	fn ungrab(&self, token: GrabToken) -> Result<(), AdapterError> {
		if let Some(accelerator) = self.bindings.lock().remove(&token) {
			tracing::debug!(%accelerator, token = token.0, "keybinding released");
		}
		Ok(())
	}
}
