//! `org.gnome.Caribou.Keyboard` at `/org/gnome/Caribou/Keyboard`.

use shellface_proto::members::{CARIBOU_INTERFACE, CaribouMember};
use shellface_proto::{Reply, Value};
use zbus::message::Header;
use zbus::{fdo, interface};

use super::convert;
use super::error::ShellError;
use super::{caller_of, get_property};
use crate::service::ShellService;

/// Skeleton of the on-screen keyboard interface.
pub(crate) struct KeyboardObject {
	service: ShellService,
}

impl KeyboardObject {
	pub(crate) fn new(service: ShellService) -> Self {
		Self { service }
	}

	fn call(&self, header: &Header<'_>, member: CaribouMember, args: Vec<Value>) -> Result<Reply, ShellError> {
		super::dispatch(&self.service, caller_of(header), CARIBOU_INTERFACE, member.into(), args)
	}

	fn locate(&self, header: &Header<'_>, member: CaribouMember, rect: [i32; 4]) -> Result<(), ShellError> {
		self.call(header, member, rect.into_iter().map(Value::I32).collect())
			.map(drop)
	}
}

#[interface(name = "org.gnome.Caribou.Keyboard")]
impl KeyboardObject {
	fn show(&self, #[zbus(header)] header: Header<'_>, timestamp: u32) -> Result<(), ShellError> {
		self.call(&header, CaribouMember::Show, vec![Value::U32(timestamp)])
			.map(drop)
	}

	fn hide(&self, #[zbus(header)] header: Header<'_>, timestamp: u32) -> Result<(), ShellError> {
		self.call(&header, CaribouMember::Hide, vec![Value::U32(timestamp)])
			.map(drop)
	}

	fn set_cursor_location(
		&self,
		#[zbus(header)] header: Header<'_>,
		x: i32,
		y: i32,
		w: i32,
		h: i32,
	) -> Result<(), ShellError> {
		self.locate(&header, CaribouMember::SetCursorLocation, [x, y, w, h])
	}

	fn set_entry_location(
		&self,
		#[zbus(header)] header: Header<'_>,
		x: i32,
		y: i32,
		w: i32,
		h: i32,
	) -> Result<(), ShellError> {
		self.locate(&header, CaribouMember::SetEntryLocation, [x, y, w, h])
	}

	#[zbus(property, name = "Name")]
	fn keyboard_name(&self) -> fdo::Result<String> {
		get_property(&self.service, CARIBOU_INTERFACE, "Name", convert::string_of)
	}
}
