//! `org.gnome.Shell.Extensions` at `/org/gnome/Shell`.

use std::collections::HashMap;

use shellface_proto::members::{EXTENSIONS_INTERFACE, ExtensionsMember};
use shellface_proto::{Reply, Value};
use zbus::message::Header;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::{OwnedValue, Value as ZValue};
use zbus::{fdo, interface};

use super::convert::{self, reply_value};
use super::error::ShellError;
use super::{caller_of, get_property, set_property};
use crate::service::ShellService;

type InfoMap = HashMap<String, ZValue<'static>>;

/// Skeleton of the extension management interface.
pub(crate) struct ExtensionsObject {
	service: ShellService,
}

impl ExtensionsObject {
	pub(crate) fn new(service: ShellService) -> Self {
		Self { service }
	}

	fn call(&self, header: &Header<'_>, member: ExtensionsMember, args: Vec<Value>) -> Result<Reply, ShellError> {
		super::dispatch(&self.service, caller_of(header), EXTENSIONS_INTERFACE, member.into(), args)
	}

	fn toggle(&self, header: &Header<'_>, member: ExtensionsMember, uuid: String) -> Result<bool, ShellError> {
		let reply = self.call(header, member, vec![Value::Str(uuid)])?;
		reply_value(reply, "b", convert::bool_of)
	}
}

#[interface(name = "org.gnome.Shell.Extensions")]
impl ExtensionsObject {
	fn list_extensions(&self, #[zbus(header)] header: Header<'_>) -> Result<HashMap<String, InfoMap>, ShellError> {
		let reply = self.call(&header, ExtensionsMember::ListExtensions, Vec::new())?;
		let list = reply_value(reply, "a{sa{sv}}", convert::dict_of)?;
		list.into_iter()
			.map(|(uuid, info)| match info {
				Value::Dict(info) => Ok((uuid, convert::dict_to_bus(&info))),
				_ => Err(ShellError::ZBus(zbus::Error::Failure(format!("info of {uuid} is not a{{sv}}")))),
			})
			.collect()
	}

	fn get_extension_info(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<InfoMap, ShellError> {
		let reply = self.call(&header, ExtensionsMember::GetExtensionInfo, vec![Value::Str(uuid)])?;
		let info = reply_value(reply, "a{sv}", convert::dict_of)?;
		Ok(convert::dict_to_bus(&info))
	}

	fn get_extension_errors(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<Vec<String>, ShellError> {
		let reply = self.call(&header, ExtensionsMember::GetExtensionErrors, vec![Value::Str(uuid)])?;
		reply_value(reply, "as", convert::string_array_of)
	}

	fn enable_extension(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<bool, ShellError> {
		self.toggle(&header, ExtensionsMember::EnableExtension, uuid)
	}

	fn disable_extension(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<bool, ShellError> {
		self.toggle(&header, ExtensionsMember::DisableExtension, uuid)
	}

	fn install_remote_extension(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<String, ShellError> {
		let reply = self.call(&header, ExtensionsMember::InstallRemoteExtension, vec![Value::Str(uuid)])?;
		reply_value(reply, "s", convert::string_of)
	}

	fn uninstall_extension(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<bool, ShellError> {
		let reply = self.call(&header, ExtensionsMember::UninstallExtension, vec![Value::Str(uuid)])?;
		reply_value(reply, "b", convert::bool_of)
	}

	fn launch_extension_prefs(&self, #[zbus(header)] header: Header<'_>, uuid: String) -> Result<(), ShellError> {
		self.call(&header, ExtensionsMember::LaunchExtensionPrefs, vec![Value::Str(uuid)])
			.map(drop)
	}

	fn open_extension_prefs(
		&self,
		#[zbus(header)] header: Header<'_>,
		uuid: String,
		parent_window: String,
		options: HashMap<String, OwnedValue>,
	) -> Result<(), ShellError> {
		let options = convert::dict_from_bus(&options)?;
		let args = vec![Value::Str(uuid), Value::Str(parent_window), Value::Dict(options)];
		self.call(&header, ExtensionsMember::OpenExtensionPrefs, args)
			.map(drop)
	}

	fn check_for_updates(&self, #[zbus(header)] header: Header<'_>) -> Result<(), ShellError> {
		self.call(&header, ExtensionsMember::CheckForUpdates, Vec::new())
			.map(drop)
	}

	#[zbus(property)]
	fn shell_version(&self) -> fdo::Result<String> {
		get_property(&self.service, EXTENSIONS_INTERFACE, "ShellVersion", convert::string_of)
	}

	#[zbus(property(emits_changed_signal = "false"))]
	fn user_extensions_enabled(&self) -> fdo::Result<bool> {
		get_property(&self.service, EXTENSIONS_INTERFACE, "UserExtensionsEnabled", convert::bool_of)
	}

	#[zbus(property)]
	fn set_user_extensions_enabled(&mut self, enabled: bool) -> fdo::Result<()> {
		set_property(
			&self.service,
			EXTENSIONS_INTERFACE,
			"UserExtensionsEnabled",
			Value::Bool(enabled),
		)
	}

	/// Emitted after an extension is enabled or disabled.
	#[zbus(signal)]
	pub(crate) async fn extension_state_changed(
		emitter: &SignalEmitter<'_>,
		uuid: &str,
		state: HashMap<String, ZValue<'_>>,
	) -> zbus::Result<()>;
}
