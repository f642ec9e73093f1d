//! The shell state store.
//!
//! Plain data guarded by the facade's single lock. Every mutator returns the
//! prior value (or the displaced entry) so callers can tell a real transition
//! from an idempotent repeat.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;

use lru::LruCache;
use shellface_proto::{Accelerator, ActionMode, CallerId, GrabToken};

/// Number of disconnected callers remembered for late-grab rejection.
const DEPARTED_CAPACITY: NonZeroUsize = NonZeroUsize::new(512).unwrap();

/// An active accelerator grab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorGrab {
	/// Normalized binding.
	pub binding: Accelerator,
	/// Caller that owns the grab.
	pub owner: CallerId,
	/// Action id handed to the owner.
	pub token: GrabToken,
	/// Modes the binding is active in.
	pub mode_flags: ActionMode,
	/// Keybinding flags as passed by the client.
	pub grab_flags: u32,
}

/// One extension known to the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
	/// Extension uuid.
	pub uuid: String,
	/// Display name.
	pub name: String,
	/// Description.
	pub description: String,
	/// Whether the extension is enabled.
	pub enabled: bool,
}

/// Process-wide shell state.
#[derive(Debug)]
pub struct ShellState {
	overview_visible: bool,
	osk_visible: bool,
	user_extensions_enabled: bool,
	grabs: HashMap<Accelerator, AcceleratorGrab>,
	bindings_by_token: HashMap<GrabToken, Accelerator>,
	extensions: BTreeMap<String, ExtensionRecord>,
	departed: LruCache<CallerId, ()>,
}

impl Default for ShellState {
	fn default() -> Self {
		Self {
			overview_visible: false,
			osk_visible: false,
			user_extensions_enabled: true,
			grabs: HashMap::new(),
			bindings_by_token: HashMap::new(),
			extensions: BTreeMap::new(),
			departed: LruCache::new(DEPARTED_CAPACITY),
		}
	}
}

impl ShellState {
	/// Creates a state seeded with `extensions`.
	#[must_use]
	pub fn new(extensions: impl IntoIterator<Item = ExtensionRecord>, user_extensions_enabled: bool) -> Self {
		Self {
			extensions: extensions.into_iter().map(|e| (e.uuid.clone(), e)).collect(),
			user_extensions_enabled,
			..Self::default()
		}
	}

	/// Whether the overview is visible.
	#[must_use]
	pub fn overview_visible(&self) -> bool {
		self.overview_visible
	}

	/// Whether the on-screen keyboard is visible.
	#[must_use]
	pub fn osk_visible(&self) -> bool {
		self.osk_visible
	}

	/// Whether user extensions are globally enabled.
	#[must_use]
	pub fn user_extensions_enabled(&self) -> bool {
		self.user_extensions_enabled
	}

	/// Current action mode derived from shell state.
	#[must_use]
	pub fn action_mode(&self) -> ActionMode {
		if self.overview_visible {
			ActionMode::OVERVIEW
		} else {
			ActionMode::NORMAL
		}
	}

	/// Sets overview visibility, returning the prior value.
	pub fn set_overview_visible(&mut self, visible: bool) -> bool {
		std::mem::replace(&mut self.overview_visible, visible)
	}

	/// Sets on-screen keyboard visibility, returning the prior value.
	pub fn set_osk_visible(&mut self, visible: bool) -> bool {
		std::mem::replace(&mut self.osk_visible, visible)
	}

	/// Sets the global extensions switch, returning the prior value.
	pub fn set_user_extensions_enabled(&mut self, enabled: bool) -> bool {
		std::mem::replace(&mut self.user_extensions_enabled, enabled)
	}

	/// Returns the grab holding `binding`.
	#[must_use]
	pub fn grab_for(&self, binding: &Accelerator) -> Option<&AcceleratorGrab> {
		self.grabs.get(binding)
	}

	/// Returns the grab registered under `token`.
	#[must_use]
	pub fn grab_by_token(&self, token: GrabToken) -> Option<&AcceleratorGrab> {
		self.bindings_by_token.get(&token).and_then(|b| self.grabs.get(b))
	}

	/// Number of active grabs.
	#[must_use]
	pub fn grab_count(&self) -> usize {
		self.grabs.len()
	}

	/// Inserts `grab` unless its binding is taken.
	///
	/// Returns the token of the existing holder when the binding is taken, in
	/// which case nothing is inserted.
	pub fn insert_grab(&mut self, grab: AcceleratorGrab) -> Option<GrabToken> {
		if let Some(existing) = self.grabs.get(&grab.binding) {
			return Some(existing.token);
		}
		self.bindings_by_token.insert(grab.token, grab.binding.clone());
		self.grabs.insert(grab.binding.clone(), grab);
		None
	}

	/// Removes the grab registered under `token`. Unknown tokens are a no-op.
	pub fn remove_grab(&mut self, token: GrabToken) -> Option<AcceleratorGrab> {
		let binding = self.bindings_by_token.remove(&token)?;
		self.grabs.remove(&binding)
	}

	/// Removes every grab owned by `caller`.
	pub fn remove_grabs_for(&mut self, caller: &CallerId) -> Vec<AcceleratorGrab> {
		let tokens: Vec<GrabToken> = self
			.grabs
			.values()
			.filter(|g| &g.owner == caller)
			.map(|g| g.token)
			.collect();
		tokens.into_iter().filter_map(|t| self.remove_grab(t)).collect()
	}

	/// Records that `caller` left the bus.
	pub fn mark_departed(&mut self, caller: CallerId) {
		self.departed.put(caller, ());
	}

	/// Whether `caller` is known to have left the bus.
	#[must_use]
	pub fn has_departed(&self, caller: &CallerId) -> bool {
		self.departed.contains(caller)
	}

	/// All extensions ordered by uuid.
	pub fn extensions(&self) -> impl Iterator<Item = &ExtensionRecord> {
		self.extensions.values()
	}

	/// Returns the extension with `uuid`.
	#[must_use]
	pub fn extension(&self, uuid: &str) -> Option<&ExtensionRecord> {
		self.extensions.get(uuid)
	}

	/// Sets an extension's enabled flag, returning the prior value, or `None`
	/// for an unknown uuid.
	pub fn set_extension_enabled(&mut self, uuid: &str, enabled: bool) -> Option<bool> {
		let ext = self.extensions.get_mut(uuid)?;
		Some(std::mem::replace(&mut ext.enabled, enabled))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn grab(binding: &str, owner: &str, token: u32) -> AcceleratorGrab {
		AcceleratorGrab {
			binding: binding.parse().unwrap(),
			owner: CallerId::new(owner),
			token: GrabToken(token),
			mode_flags: ActionMode::NORMAL,
			grab_flags: 0,
		}
	}

	#[test]
	fn setters_return_prior_value() {
		let mut state = ShellState::default();
		assert!(!state.set_overview_visible(true));
		assert!(state.set_overview_visible(true));
		assert!(!state.set_osk_visible(false));
		assert_eq!(state.action_mode(), ActionMode::OVERVIEW);
	}

	#[test]
	fn at_most_one_grab_per_binding() {
		let mut state = ShellState::default();
		assert_eq!(state.insert_grab(grab("<Super>space", ":1.1", 1)), None);
		assert_eq!(state.insert_grab(grab("<super>SPACE", ":1.2", 2)), Some(GrabToken(1)));
		assert_eq!(state.grab_count(), 1);
		assert!(state.grab_by_token(GrabToken(2)).is_none());
	}

	#[test]
	fn removing_unknown_token_is_noop() {
		let mut state = ShellState::default();
		state.insert_grab(grab("<Super>a", ":1.1", 1));
		assert!(state.remove_grab(GrabToken(9)).is_none());
		assert_eq!(state.grab_count(), 1);
		assert!(state.remove_grab(GrabToken(1)).is_some());
		assert!(state.remove_grab(GrabToken(1)).is_none());
	}

	#[test]
	fn remove_grabs_for_only_touches_owner() {
		let mut state = ShellState::default();
		state.insert_grab(grab("<Super>a", ":1.1", 1));
		state.insert_grab(grab("<Super>b", ":1.1", 2));
		state.insert_grab(grab("<Super>c", ":1.2", 3));

		let mut removed: Vec<u32> = state
			.remove_grabs_for(&CallerId::new(":1.1"))
			.into_iter()
			.map(|g| g.token.0)
			.collect();
		removed.sort_unstable();

		assert_eq!(removed, vec![1, 2]);
		assert_eq!(state.grab_count(), 1);
		assert!(state.grab_by_token(GrabToken(3)).is_some());
	}

	#[test]
	fn extension_toggle_reports_prior() {
		let mut state = ShellState::new(
			[ExtensionRecord {
				uuid: "dock@example.org".into(),
				name: "Dock".into(),
				description: String::new(),
				enabled: true,
			}],
			true,
		);
		assert_eq!(state.set_extension_enabled("dock@example.org", false), Some(true));
		assert_eq!(state.set_extension_enabled("dock@example.org", false), Some(false));
		assert_eq!(state.set_extension_enabled("missing@example.org", true), None);
	}
}
