//! Request routing.
//!
//! The [`Dispatcher`] validates a decoded [`CallRequest`], applies the member's
//! policy against the [`ShellFacade`], and only then queues the signals the
//! call produced. Members with no faithful equivalent on a non-GNOME compositor
//! get an explicit policy: either `NotImplemented` or a successful no-op.

use std::collections::BTreeMap;
use std::sync::Arc;

use shellface_proto::members::{
	CARIBOU_INTERFACE, CaribouMember, EXTENSIONS_INTERFACE, ExtensionsMember, PropertiesMember,
	SHELL_INTERFACE, ShellMember,
};
use shellface_proto::{
	Accelerator, ActionMode, CallError, CallRequest, CallResult, CallerId, ErrorKind, GrabToken,
	Member, Reply, Value,
};

use crate::adapters::OsdRequest;
use crate::core::{ExtensionToggle, ShellFacade, UngrabOutcome};
use crate::signals::SignalEmitter;

/// A state transition a call made, announced after its reply is built.
#[derive(Debug)]
enum Change {
	Overview(bool),
	Osk(bool),
	Extension { uuid: String, info: BTreeMap<String, Value> },
	UserExtensions(bool),
}

impl Change {
	fn announce(self, signals: &SignalEmitter) {
		match self {
			Self::Overview(visible) => signals.notify_overview_changed(visible),
			Self::Osk(visible) => signals.notify_osk_changed(visible),
			Self::Extension { uuid, info } => signals.notify_extension_state_changed(uuid, info),
			Self::UserExtensions(enabled) => signals.notify_user_extensions_enabled_changed(enabled),
		}
	}
}

/// Reply plus the changes to announce once the reply is built.
#[derive(Debug, Default)]
struct Outcome {
	reply: Reply,
	changes: Vec<Change>,
}

impl Outcome {
	fn reply(reply: Reply) -> Self {
		Self {
			reply,
			changes: Vec::new(),
		}
	}

	fn with_change(mut self, change: Option<Change>) -> Self {
		self.changes.extend(change);
		self
	}
}

/// Routes calls to facade operations.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	facade: Arc<ShellFacade>,
}

impl Dispatcher {
	/// Creates a dispatcher over `facade`.
	#[must_use]
	pub fn new(facade: Arc<ShellFacade>) -> Self {
		Self { facade }
	}

	/// The facade calls are routed to.
	#[must_use]
	pub fn facade(&self) -> &Arc<ShellFacade> {
		&self.facade
	}

	/// Handles one call from `caller`.
	///
	/// # Errors
	///
	/// Unknown members fail with `UnsupportedMethod` and malformed arguments
	/// with `InvalidArgument`; neither mutates state. Other kinds come from the
	/// member's policy or its adapter.
	pub fn handle(&self, caller: &CallerId, request: CallRequest) -> CallResult {
		let Some(member) = Member::resolve(&request.interface, &request.method) else {
			tracing::debug!(%caller, interface = %request.interface, method = %request.method, "unsupported member");
			return Err(CallError::unsupported(&request.interface, &request.method));
		};
		tracing::trace!(%caller, interface = %request.interface, method = member.name(), "dispatching call");

		let args = Args {
			method: member.name(),
			values: &request.args,
		};
		let outcome = match member {
			Member::Shell(m) => self.shell(caller, m, args),
			Member::Extensions(m) => self.extensions(m, args),
			Member::Caribou(m) => self.caribou(m, args),
			Member::Properties(m) => self.properties(m, args),
		};

		match outcome {
			Ok(Outcome { reply, changes }) => {
				for change in changes {
					change.announce(self.facade.signals());
				}
				Ok(reply)
			}
			Err(err) => {
				tracing::debug!(%caller, method = member.name(), error = %err, "call failed");
				Err(err)
			}
		}
	}

	fn shell(&self, caller: &CallerId, member: ShellMember, args: Args<'_>) -> Result<Outcome, CallError> {
		match member {
			ShellMember::Eval => {
				args.arity(1)?;
				args.str(0)?;
				Err(CallError::not_implemented(args.method))
			}
			ShellMember::FocusSearch | ShellMember::ShowApplications => {
				args.arity(0)?;
				self.show_overview(true)
			}
			ShellMember::FocusApp => {
				args.arity(1)?;
				let app_id = args.str(0)?;
				tracing::debug!(app_id, "FocusApp maps to the overview");
				self.show_overview(true)
			}
			ShellMember::ShowOsd => {
				args.arity(1)?;
				let request = osd_request(args.dict(0)?)?;
				self.facade.show_osd(&request)?;
				Ok(Outcome::default())
			}
			ShellMember::ShowMonitorLabels => {
				args.arity(1)?;
				args.dict(0)?;
				Ok(Outcome::default())
			}
			ShellMember::HideMonitorLabels | ShellMember::ScreenTransition => {
				args.arity(0)?;
				Ok(Outcome::default())
			}
			ShellMember::GrabAccelerator => {
				args.arity(3)?;
				let (binding, mode_flags, grab_flags) =
					grab_spec(args.str(0)?, args.u32(1)?, args.u32(2)?)?;
				let token = self.facade.grab(caller, binding, mode_flags, grab_flags)?;
				Ok(Outcome::reply(Reply::one(token.0)))
			}
			ShellMember::GrabAccelerators => {
				args.arity(1)?;
				let entries = args.array(0)?;
				let specs = entries
					.iter()
					.map(|entry| grab_entry(args.method, entry))
					.collect::<Result<Vec<_>, _>>()?;

				let tokens = specs
					.into_iter()
					.map(|(binding, mode, flags)| {
						let binding = match binding.parse::<Accelerator>() {
							Ok(binding) => binding,
							Err(e) => {
								tracing::debug!(binding, error = %e, "skipping unparsable accelerator");
								return Value::U32(GrabToken::NONE.0);
							}
						};
						match self.facade.grab(caller, binding, ActionMode::from_bits_retain(mode), flags) {
							Ok(token) => Value::U32(token.0),
							Err(e) => {
								tracing::debug!(error = %e, "batch grab entry failed");
								Value::U32(GrabToken::NONE.0)
							}
						}
					})
					.collect();
				Ok(Outcome::reply(Reply::one(Value::Array(tokens))))
			}
			ShellMember::UngrabAccelerator => {
				args.arity(1)?;
				let outcome = self.facade.ungrab(caller, GrabToken(args.u32(0)?));
				Ok(Outcome::reply(Reply::one(outcome != UngrabOutcome::NotOwner)))
			}
			ShellMember::UngrabAccelerators => {
				args.arity(1)?;
				let tokens = args
					.array(0)?
					.iter()
					.map(|v| v.as_u32().ok_or_else(|| mismatch(args.method, 0, "array of u32", v)))
					.collect::<Result<Vec<_>, _>>()?;
				let all_released = tokens.into_iter().fold(true, |ok, token| {
					self.facade.ungrab(caller, GrabToken(token)) != UngrabOutcome::NotOwner && ok
				});
				Ok(Outcome::reply(Reply::one(all_released)))
			}
		}
	}

	fn show_overview(&self, visible: bool) -> Result<Outcome, CallError> {
		let changed = self.facade.set_overview(visible)?;
		Ok(Outcome::default().with_change(changed.map(Change::Overview)))
	}

	fn extensions(&self, member: ExtensionsMember, args: Args<'_>) -> Result<Outcome, CallError> {
		match member {
			ExtensionsMember::ListExtensions => {
				args.arity(0)?;
				let list = self
					.facade
					.list_extensions()
					.into_iter()
					.map(|(uuid, info)| (uuid, Value::Dict(info)))
					.collect();
				Ok(Outcome::reply(Reply::one(Value::Dict(list))))
			}
			ExtensionsMember::GetExtensionInfo => {
				args.arity(1)?;
				let info = self.facade.extension_info(args.str(0)?);
				Ok(Outcome::reply(Reply::one(Value::Dict(info))))
			}
			ExtensionsMember::GetExtensionErrors => {
				args.arity(1)?;
				args.str(0)?;
				Ok(Outcome::reply(Reply::one(Value::Array(Vec::new()))))
			}
			ExtensionsMember::EnableExtension | ExtensionsMember::DisableExtension => {
				args.arity(1)?;
				let uuid = args.str(0)?;
				let enabled = member == ExtensionsMember::EnableExtension;
				match self.facade.set_extension_enabled(uuid, enabled) {
					ExtensionToggle::Unknown => Ok(Outcome::reply(Reply::one(false))),
					ExtensionToggle::Unchanged => Ok(Outcome::reply(Reply::one(true))),
					ExtensionToggle::Changed(info) => {
						let change = Change::Extension {
							uuid: uuid.to_string(),
							info,
						};
						Ok(Outcome::reply(Reply::one(true)).with_change(Some(change)))
					}
				}
			}
			ExtensionsMember::InstallRemoteExtension
			| ExtensionsMember::UninstallExtension
			| ExtensionsMember::LaunchExtensionPrefs => {
				args.arity(1)?;
				args.str(0)?;
				Err(CallError::not_implemented(args.method))
			}
			ExtensionsMember::OpenExtensionPrefs => {
				args.arity(3)?;
				args.str(0)?;
				args.str(1)?;
				args.dict(2)?;
				Err(CallError::not_implemented(args.method))
			}
			ExtensionsMember::CheckForUpdates => {
				args.arity(0)?;
				Ok(Outcome::default())
			}
		}
	}

	fn caribou(&self, member: CaribouMember, args: Args<'_>) -> Result<Outcome, CallError> {
		match member {
			CaribouMember::Show | CaribouMember::Hide => {
				args.arity(1)?;
				args.u32(0)?;
				let changed = self.facade.set_osk(member == CaribouMember::Show)?;
				Ok(Outcome::default().with_change(changed.map(Change::Osk)))
			}
			CaribouMember::SetCursorLocation | CaribouMember::SetEntryLocation => {
				args.arity(4)?;
				for i in 0..4 {
					args.i32(i)?;
				}
				Ok(Outcome::default())
			}
		}
	}

	fn properties(&self, member: PropertiesMember, args: Args<'_>) -> Result<Outcome, CallError> {
		match member {
			PropertiesMember::Get => {
				args.arity(2)?;
				let property = Property::resolve(args.str(0)?, args.str(1)?)?;
				Ok(Outcome::reply(Reply::one(self.read_property(property))))
			}
			PropertiesMember::Set => {
				args.arity(3)?;
				let property = Property::resolve(args.str(0)?, args.str(1)?)?;
				self.write_property(property, args.value(2)?)
			}
		}
	}

	fn read_property(&self, property: Property) -> Value {
		let identity = self.facade.identity();
		match property {
			Property::Mode => Value::from(identity.mode.as_str()),
			Property::OverviewActive => Value::Bool(self.facade.overview_visible()),
			Property::ShellVersion | Property::ExtensionsShellVersion => {
				Value::from(identity.shell_version.as_str())
			}
			Property::UserExtensionsEnabled => Value::Bool(self.facade.user_extensions_enabled()),
			Property::KeyboardName => Value::from(identity.keyboard_name.as_str()),
		}
	}

	fn write_property(&self, property: Property, value: &Value) -> Result<Outcome, CallError> {
		let expect_bool = || {
			value
				.as_bool()
				.ok_or_else(|| CallError::invalid(format!("{} expects bool, got {}", property.name(), value.kind())))
		};
		match property {
			Property::OverviewActive => self.show_overview(expect_bool()?),
			Property::UserExtensionsEnabled => {
				let enabled = expect_bool()?;
				let changed = self.facade.set_user_extensions_enabled(enabled);
				let change = changed.then_some(Change::UserExtensions(enabled));
				Ok(Outcome::default().with_change(change))
			}
			Property::Mode
			| Property::ShellVersion
			| Property::ExtensionsShellVersion
			| Property::KeyboardName => Err(CallError::invalid(format!("{} is read-only", property.name()))),
		}
	}
}

/// Properties reachable through `org.freedesktop.DBus.Properties`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Property {
	Mode,
	OverviewActive,
	ShellVersion,
	ExtensionsShellVersion,
	UserExtensionsEnabled,
	KeyboardName,
}

impl Property {
	fn resolve(interface: &str, name: &str) -> Result<Self, CallError> {
		let property = match (interface, name) {
			(SHELL_INTERFACE, "Mode") => Property::Mode,
			(SHELL_INTERFACE, "OverviewActive") => Property::OverviewActive,
			(SHELL_INTERFACE, "ShellVersion") => Property::ShellVersion,
			(EXTENSIONS_INTERFACE, "ShellVersion") => Property::ExtensionsShellVersion,
			(EXTENSIONS_INTERFACE, "UserExtensionsEnabled") => Property::UserExtensionsEnabled,
			(CARIBOU_INTERFACE, "Name") => Property::KeyboardName,
			_ => {
				return Err(CallError::new(
					ErrorKind::UnsupportedMethod,
					format!("{interface} has no property {name}"),
				));
			}
		};
		Ok(property)
	}

	fn name(self) -> &'static str {
		match self {
			Property::Mode => "Mode",
			Property::OverviewActive => "OverviewActive",
			Property::ShellVersion | Property::ExtensionsShellVersion => "ShellVersion",
			Property::UserExtensionsEnabled => "UserExtensionsEnabled",
			Property::KeyboardName => "Name",
		}
	}
}

/// Positional argument accessors that fail with `InvalidArgument`.
#[derive(Clone, Copy)]
struct Args<'a> {
	method: &'static str,
	values: &'a [Value],
}

impl<'a> Args<'a> {
	fn arity(&self, expected: usize) -> Result<(), CallError> {
		if self.values.len() == expected {
			Ok(())
		} else {
			Err(CallError::invalid(format!(
				"{} takes {expected} argument(s), got {}",
				self.method,
				self.values.len()
			)))
		}
	}

	fn value(&self, index: usize) -> Result<&'a Value, CallError> {
		self.values
			.get(index)
			.ok_or_else(|| CallError::invalid(format!("{}: missing argument {index}", self.method)))
	}

	fn typed<T>(
		&self,
		index: usize,
		expected: &'static str,
		extract: impl FnOnce(&'a Value) -> Option<T>,
	) -> Result<T, CallError> {
		let value = self.value(index)?;
		extract(value).ok_or_else(|| mismatch(self.method, index, expected, value))
	}

	fn str(&self, index: usize) -> Result<&'a str, CallError> {
		self.typed(index, "string", Value::as_str)
	}

	fn u32(&self, index: usize) -> Result<u32, CallError> {
		self.typed(index, "u32", Value::as_u32)
	}

	fn i32(&self, index: usize) -> Result<i32, CallError> {
		self.typed(index, "i32", |v| match v {
			Value::I32(n) => Some(*n),
			_ => None,
		})
	}

	fn array(&self, index: usize) -> Result<&'a [Value], CallError> {
		self.typed(index, "array", Value::as_array)
	}

	fn dict(&self, index: usize) -> Result<&'a BTreeMap<String, Value>, CallError> {
		self.typed(index, "dict", Value::as_dict)
	}
}

fn mismatch(method: &str, index: usize, expected: &str, got: &Value) -> CallError {
	CallError::invalid(format!(
		"{method}: argument {index} must be {expected}, got {}",
		got.kind()
	))
}

fn grab_spec(binding: &str, mode: u32, flags: u32) -> Result<(Accelerator, ActionMode, u32), CallError> {
	let accelerator = binding
		.parse::<Accelerator>()
		.map_err(|e| CallError::invalid(format!("invalid accelerator '{binding}': {e}")))?;
	Ok((accelerator, ActionMode::from_bits_retain(mode), flags))
}

fn grab_entry<'a>(method: &str, entry: &'a Value) -> Result<(&'a str, u32, u32), CallError> {
	match entry.as_struct() {
		Some([Value::Str(binding), Value::U32(mode), Value::U32(flags)]) => Ok((binding.as_str(), *mode, *flags)),
		_ => Err(mismatch(method, 0, "array of (suu)", entry)),
	}
}

fn osd_request(params: &BTreeMap<String, Value>) -> Result<OsdRequest, CallError> {
	let text = |key: &str| -> Result<Option<String>, CallError> {
		params
			.get(key)
			.map(|v| {
				v.as_str()
					.map(str::to_string)
					.ok_or_else(|| CallError::invalid(format!("ShowOSD: '{key}' must be a string, got {}", v.kind())))
			})
			.transpose()
	};
	let number = |key: &str| -> Result<Option<f64>, CallError> {
		params
			.get(key)
			.map(|v| {
				v.as_f64()
					.ok_or_else(|| CallError::invalid(format!("ShowOSD: '{key}' must be numeric, got {}", v.kind())))
			})
			.transpose()
	};

	Ok(OsdRequest {
		icon: text("icon")?,
		label: text("label")?,
		level: number("level")?,
		max_level: number("max_level")?,
		connector: text("connector")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn osd_request_decodes_known_keys() {
		let params = BTreeMap::from([
			("icon".to_string(), Value::from("display-brightness-symbolic")),
			("level".to_string(), Value::Double(0.25)),
			("max_level".to_string(), Value::I32(1)),
			("extra".to_string(), Value::Bool(true)),
		]);
		let request = osd_request(&params).unwrap();
		assert_eq!(request.icon.as_deref(), Some("display-brightness-symbolic"));
		assert_eq!(request.level, Some(0.25));
		assert_eq!(request.max_level, Some(1.0));
		assert_eq!(request.label, None);
	}

	#[test]
	fn osd_request_rejects_mistyped_values() {
		let params = BTreeMap::from([("label".to_string(), Value::U32(3))]);
		assert_eq!(osd_request(&params).unwrap_err().kind, ErrorKind::InvalidArgument);
	}

	#[test]
	fn grab_entries_must_be_suu_structs() {
		let good = Value::Struct(vec![Value::from("<Super>a"), Value::U32(1), Value::U32(0)]);
		assert_eq!(grab_entry("GrabAccelerators", &good).unwrap(), ("<Super>a", 1, 0));

		let short = Value::Struct(vec![Value::from("<Super>a"), Value::U32(1)]);
		assert_eq!(
			grab_entry("GrabAccelerators", &short).unwrap_err().kind,
			ErrorKind::InvalidArgument
		);
	}

	#[test]
	fn properties_are_scoped_to_their_interface() {
		assert_eq!(
			Property::resolve(EXTENSIONS_INTERFACE, "ShellVersion").unwrap(),
			Property::ExtensionsShellVersion
		);
		assert_eq!(
			Property::resolve(CARIBOU_INTERFACE, "OverviewActive").unwrap_err().kind,
			ErrorKind::UnsupportedMethod
		);
	}
}
