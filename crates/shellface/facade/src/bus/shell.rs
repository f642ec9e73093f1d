//! `org.gnome.Shell` at `/org/gnome/Shell`.

use std::collections::HashMap;

use shellface_proto::members::{SHELL_INTERFACE, ShellMember};
use shellface_proto::{Reply, Value};
use zbus::message::Header;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::{OwnedValue, Value as ZValue};
use zbus::{fdo, interface};

use super::convert::{self, reply_value};
use super::error::ShellError;
use super::{caller_of, get_property, set_property};
use crate::service::ShellService;

/// Skeleton of the shell control interface.
pub(crate) struct ShellObject {
	service: ShellService,
}

impl ShellObject {
	pub(crate) fn new(service: ShellService) -> Self {
		Self { service }
	}

	fn call(&self, header: &Header<'_>, member: ShellMember, args: Vec<Value>) -> Result<Reply, ShellError> {
		super::dispatch(&self.service, caller_of(header), SHELL_INTERFACE, member.into(), args)
	}
}

#[interface(name = "org.gnome.Shell")]
impl ShellObject {
	fn eval(&self, #[zbus(header)] header: Header<'_>, script: String) -> Result<(bool, String), ShellError> {
		let reply = self.call(&header, ShellMember::Eval, vec![Value::Str(script)])?;
		match reply.0.as_slice() {
			[Value::Bool(ok), Value::Str(out)] => Ok((*ok, out.clone())),
			_ => Ok((false, String::new())),
		}
	}

	fn focus_search(&self, #[zbus(header)] header: Header<'_>) -> Result<(), ShellError> {
		self.call(&header, ShellMember::FocusSearch, Vec::new()).map(drop)
	}

	#[zbus(name = "ShowOSD")]
	fn show_osd(&self, #[zbus(header)] header: Header<'_>, params: HashMap<String, OwnedValue>) -> Result<(), ShellError> {
		let params = convert::dict_from_bus(&params)?;
		self.call(&header, ShellMember::ShowOsd, vec![Value::Dict(params)])
			.map(drop)
	}

	fn show_monitor_labels(
		&self,
		#[zbus(header)] header: Header<'_>,
		params: HashMap<String, OwnedValue>,
	) -> Result<(), ShellError> {
		let params = convert::dict_from_bus(&params)?;
		self.call(&header, ShellMember::ShowMonitorLabels, vec![Value::Dict(params)])
			.map(drop)
	}

	fn hide_monitor_labels(&self, #[zbus(header)] header: Header<'_>) -> Result<(), ShellError> {
		self.call(&header, ShellMember::HideMonitorLabels, Vec::new())
			.map(drop)
	}

	fn focus_app(&self, #[zbus(header)] header: Header<'_>, id: String) -> Result<(), ShellError> {
		self.call(&header, ShellMember::FocusApp, vec![Value::Str(id)])
			.map(drop)
	}

	fn show_applications(&self, #[zbus(header)] header: Header<'_>) -> Result<(), ShellError> {
		self.call(&header, ShellMember::ShowApplications, Vec::new())
			.map(drop)
	}

	fn grab_accelerator(
		&self,
		#[zbus(header)] header: Header<'_>,
		accelerator: String,
		mode_flags: u32,
		grab_flags: u32,
	) -> Result<u32, ShellError> {
		let args = vec![Value::Str(accelerator), Value::U32(mode_flags), Value::U32(grab_flags)];
		let reply = self.call(&header, ShellMember::GrabAccelerator, args)?;
		reply_value(reply, "u", convert::u32_of)
	}

	fn grab_accelerators(
		&self,
		#[zbus(header)] header: Header<'_>,
		accelerators: Vec<(String, u32, u32)>,
	) -> Result<Vec<u32>, ShellError> {
		let entries = accelerators
			.into_iter()
			.map(|(binding, mode, flags)| Value::Struct(vec![Value::Str(binding), Value::U32(mode), Value::U32(flags)]))
			.collect();
		let reply = self.call(&header, ShellMember::GrabAccelerators, vec![Value::Array(entries)])?;
		reply_value(reply, "au", convert::u32_array_of)
	}

	fn ungrab_accelerator(&self, #[zbus(header)] header: Header<'_>, action: u32) -> Result<bool, ShellError> {
		let reply = self.call(&header, ShellMember::UngrabAccelerator, vec![Value::U32(action)])?;
		reply_value(reply, "b", convert::bool_of)
	}

	fn ungrab_accelerators(&self, #[zbus(header)] header: Header<'_>, actions: Vec<u32>) -> Result<bool, ShellError> {
		let actions = actions.into_iter().map(Value::U32).collect();
		let reply = self.call(&header, ShellMember::UngrabAccelerators, vec![Value::Array(actions)])?;
		reply_value(reply, "b", convert::bool_of)
	}

	fn screen_transition(&self, #[zbus(header)] header: Header<'_>) -> Result<(), ShellError> {
		self.call(&header, ShellMember::ScreenTransition, Vec::new())
			.map(drop)
	}

	#[zbus(property)]
	fn mode(&self) -> fdo::Result<String> {
		get_property(&self.service, SHELL_INTERFACE, "Mode", convert::string_of)
	}

	#[zbus(property(emits_changed_signal = "false"))]
	fn overview_active(&self) -> fdo::Result<bool> {
		get_property(&self.service, SHELL_INTERFACE, "OverviewActive", convert::bool_of)
	}

	#[zbus(property)]
	fn set_overview_active(&mut self, active: bool) -> fdo::Result<()> {
		set_property(&self.service, SHELL_INTERFACE, "OverviewActive", Value::Bool(active))
	}

	#[zbus(property)]
	fn shell_version(&self) -> fdo::Result<String> {
		get_property(&self.service, SHELL_INTERFACE, "ShellVersion", convert::string_of)
	}

	/// Emitted when a grabbed accelerator fires.
	#[zbus(signal)]
	pub(crate) async fn accelerator_activated(
		emitter: &SignalEmitter<'_>,
		action: u32,
		parameters: HashMap<String, ZValue<'_>>,
	) -> zbus::Result<()>;
}
