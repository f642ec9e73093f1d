//! Call model for the facade.
//!
//! A remote call is decoded into a [`CallRequest`] carrying typed [`Value`]s and
//! answered with a [`CallResult`]: either a [`Reply`] with typed return values or
//! a [`CallError`] whose [`ErrorKind`] is one of a closed set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Transport-level identity of a remote caller.
///
/// On D-Bus this is the unique connection name (for example `:1.42`), which the
/// bus never reuses while it runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallerId(pub String);

impl CallerId {
	/// Wraps a caller name.
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	/// Returns the caller name.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for CallerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Opaque handle for an accelerator grab.
///
/// Serialized on the wire as the `u` "action" of `GrabAccelerator`. Token `0`
/// never identifies a grab; it is the "no action" reply for failed batch entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrabToken(pub u32);

impl GrabToken {
	/// The reserved "no action" token.
	pub const NONE: GrabToken = GrabToken(0);
}

bitflags::bitflags! {
	/// Shell action modes a keybinding may be active in.
	///
	/// Mirrors the bit values published for `Shell.ActionMode`.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
	pub struct ActionMode: u32 {
		/// Ordinary desktop use.
		const NORMAL = 1 << 0;
		/// The overview is showing.
		const OVERVIEW = 1 << 1;
		/// The lock screen is showing.
		const LOCK_SCREEN = 1 << 2;
		/// The unlock dialog is showing.
		const UNLOCK_SCREEN = 1 << 3;
		/// The login screen is showing.
		const LOGIN_SCREEN = 1 << 4;
		/// A system modal dialog is showing.
		const SYSTEM_MODAL = 1 << 5;
		/// The debugging console is showing.
		const LOOKING_GLASS = 1 << 6;
		/// A popup menu is open.
		const POPUP = 1 << 7;
		/// Any mode.
		const ALL = u32::MAX;
	}
}

/// A typed argument or return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// `b`
	Bool(bool),
	/// `u`
	U32(u32),
	/// `i`
	I32(i32),
	/// `d`
	Double(f64),
	/// `s`
	Str(String),
	/// `a*` with homogeneous elements.
	Array(Vec<Value>),
	/// `(...)`
	Struct(Vec<Value>),
	/// `a{sv}`
	Dict(BTreeMap<String, Value>),
}

impl Value {
	/// Short type name used in argument mismatch messages.
	#[must_use]
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Bool(_) => "bool",
			Value::U32(_) => "u32",
			Value::I32(_) => "i32",
			Value::Double(_) => "double",
			Value::Str(_) => "string",
			Value::Array(_) => "array",
			Value::Struct(_) => "struct",
			Value::Dict(_) => "dict",
		}
	}

	/// Returns the boolean payload, if any.
	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Returns the `u32` payload, if any.
	#[must_use]
	pub fn as_u32(&self) -> Option<u32> {
		match self {
			Value::U32(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns a numeric payload widened to `f64`.
	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Value::Double(v) => Some(*v),
			Value::U32(v) => Some(f64::from(*v)),
			Value::I32(v) => Some(f64::from(*v)),
			_ => None,
		}
	}

	/// Returns the string payload, if any.
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Returns the array elements, if any.
	#[must_use]
	pub fn as_array(&self) -> Option<&[Value]> {
		match self {
			Value::Array(items) => Some(items),
			_ => None,
		}
	}

	/// Returns the struct fields, if any.
	#[must_use]
	pub fn as_struct(&self) -> Option<&[Value]> {
		match self {
			Value::Struct(fields) => Some(fields),
			_ => None,
		}
	}

	/// Returns the dictionary entries, if any.
	#[must_use]
	pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
		match self {
			Value::Dict(entries) => Some(entries),
			_ => None,
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Bool(v)
	}
}

impl From<u32> for Value {
	fn from(v: u32) -> Self {
		Value::U32(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Value::Double(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Str(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Str(v)
	}
}

/// A decoded remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
	/// Interface the member belongs to, e.g. `org.gnome.Shell`.
	pub interface: String,
	/// Member name, e.g. `GrabAccelerator`.
	pub method: String,
	/// Arguments in signature order.
	pub args: Vec<Value>,
}

impl CallRequest {
	/// Builds a request.
	#[must_use]
	pub fn new(interface: impl Into<String>, method: impl Into<String>, args: Vec<Value>) -> Self {
		Self {
			interface: interface.into(),
			method: method.into(),
			args,
		}
	}
}

/// Return values of a successful call, in signature order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply(pub Vec<Value>);

impl Reply {
	/// A reply with no return values.
	#[must_use]
	pub fn empty() -> Self {
		Self(Vec::new())
	}

	/// A reply with a single return value.
	#[must_use]
	pub fn one(value: impl Into<Value>) -> Self {
		Self(vec![value.into()])
	}

	/// Returns the first return value, if any.
	#[must_use]
	pub fn first(&self) -> Option<&Value> {
		self.0.first()
	}
}

/// Closed set of failures a call can produce.
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	Serialize,
	Deserialize,
	strum::Display,
	strum::IntoStaticStr,
	strum::EnumIter,
)]
pub enum ErrorKind {
	/// The interface or member is unknown.
	UnsupportedMethod,
	/// Arguments have the wrong count, type, or content.
	InvalidArgument,
	/// The member exists but has no faithful equivalent on this shell.
	NotImplemented,
	/// A capability adapter could not perform the effect.
	SubsystemUnavailable,
	/// The accelerator is already held by another grab.
	AlreadyGrabbed,
}

/// A typed call failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct CallError {
	/// Failure category.
	pub kind: ErrorKind,
	/// Human-readable detail.
	pub message: String,
}

impl CallError {
	/// Builds an error of the given kind.
	#[must_use]
	pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	/// `UnsupportedMethod` for `interface.method`.
	#[must_use]
	pub fn unsupported(interface: &str, method: &str) -> Self {
		Self::new(
			ErrorKind::UnsupportedMethod,
			format!("{interface}.{method} is not a known member"),
		)
	}

	/// `InvalidArgument` with a message.
	#[must_use]
	pub fn invalid(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::InvalidArgument, message)
	}

	/// `NotImplemented` for a member.
	#[must_use]
	pub fn not_implemented(method: &str) -> Self {
		Self::new(
			ErrorKind::NotImplemented,
			format!("{method} is not supported by this shell"),
		)
	}
}

/// Outcome of dispatching a call.
pub type CallResult = Result<Reply, CallError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn action_mode_all_contains_every_mode() {
		assert!(ActionMode::ALL.contains(ActionMode::OVERVIEW | ActionMode::POPUP));
		assert_eq!(ActionMode::from_bits_retain(3), ActionMode::NORMAL | ActionMode::OVERVIEW);
		assert!(!ActionMode::empty().intersects(ActionMode::NORMAL));
	}

	#[test]
	fn numeric_values_widen_to_double() {
		assert_eq!(Value::U32(7).as_f64(), Some(7.0));
		assert_eq!(Value::I32(-2).as_f64(), Some(-2.0));
		assert_eq!(Value::Str("7".into()).as_f64(), None);
	}

	#[test]
	fn error_kind_names_match_bus_suffixes() {
		let name: &'static str = ErrorKind::AlreadyGrabbed.into();
		assert_eq!(name, "AlreadyGrabbed");
		assert_eq!(
			CallError::not_implemented("Eval").to_string(),
			"NotImplemented: Eval is not supported by this shell"
		);
	}
}
