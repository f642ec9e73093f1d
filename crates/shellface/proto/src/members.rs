//! Interface and member names of the published shell control interfaces.
//!
//! Member enums parse from the exact wire spelling, so an unknown or
//! misspelled member never reaches a handler.

use std::str::FromStr;

/// Well-known bus name of the shell service.
pub const SHELL_BUS_NAME: &str = "org.gnome.Shell";
/// Object path of the shell and extensions interfaces.
pub const SHELL_OBJECT_PATH: &str = "/org/gnome/Shell";
/// Shell control interface.
pub const SHELL_INTERFACE: &str = "org.gnome.Shell";
/// Extension management interface.
pub const EXTENSIONS_INTERFACE: &str = "org.gnome.Shell.Extensions";

/// Well-known bus name of the on-screen keyboard service.
pub const CARIBOU_BUS_NAME: &str = "org.gnome.Caribou.Keyboard";
/// Object path of the on-screen keyboard interface.
pub const CARIBOU_OBJECT_PATH: &str = "/org/gnome/Caribou/Keyboard";
/// On-screen keyboard interface.
pub const CARIBOU_INTERFACE: &str = "org.gnome.Caribou.Keyboard";

/// Object path of the key-event input fed by the compositor.
pub const ACCELERATORS_OBJECT_PATH: &str = "/org/shellface/Accelerators";
/// Key-event input interface, served alongside the shell interfaces.
pub const ACCELERATORS_INTERFACE: &str = "org.shellface.Accelerators";

/// Standard properties interface, used to route `Get`/`Set`.
pub const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// Prefix of the bus error names produced by the facade.
pub const ERROR_PREFIX: &str = "org.gnome.Shell.Error";

/// Members of `org.gnome.Shell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
pub enum ShellMember {
	/// `Eval(s) -> (bs)`
	Eval,
	/// `FocusSearch()`
	FocusSearch,
	/// `ShowOSD(a{sv})`
	#[strum(serialize = "ShowOSD")]
	ShowOsd,
	/// `ShowMonitorLabels(a{sv})`
	ShowMonitorLabels,
	/// `HideMonitorLabels()`
	HideMonitorLabels,
	/// `FocusApp(s)`
	FocusApp,
	/// `ShowApplications()`
	ShowApplications,
	/// `GrabAccelerator(suu) -> u`
	GrabAccelerator,
	/// `GrabAccelerators(a(suu)) -> au`
	GrabAccelerators,
	/// `UngrabAccelerator(u) -> b`
	UngrabAccelerator,
	/// `UngrabAccelerators(au) -> b`
	UngrabAccelerators,
	/// `ScreenTransition()`
	ScreenTransition,
}

/// Members of `org.gnome.Shell.Extensions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
pub enum ExtensionsMember {
	/// `ListExtensions() -> a{sa{sv}}`
	ListExtensions,
	/// `GetExtensionInfo(s) -> a{sv}`
	GetExtensionInfo,
	/// `GetExtensionErrors(s) -> as`
	GetExtensionErrors,
	/// `EnableExtension(s) -> b`
	EnableExtension,
	/// `DisableExtension(s) -> b`
	DisableExtension,
	/// `InstallRemoteExtension(s) -> s`
	InstallRemoteExtension,
	/// `UninstallExtension(s) -> b`
	UninstallExtension,
	/// `LaunchExtensionPrefs(s)`
	LaunchExtensionPrefs,
	/// `OpenExtensionPrefs(ssa{sv})`
	OpenExtensionPrefs,
	/// `CheckForUpdates()`
	CheckForUpdates,
}

/// Members of `org.gnome.Caribou.Keyboard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
pub enum CaribouMember {
	/// `Show(u)`
	Show,
	/// `Hide(u)`
	Hide,
	/// `SetCursorLocation(iiii)`
	SetCursorLocation,
	/// `SetEntryLocation(iiii)`
	SetEntryLocation,
}

/// Members of `org.freedesktop.DBus.Properties` the dispatcher answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
pub enum PropertiesMember {
	/// `Get(ss) -> v`
	Get,
	/// `Set(ssv)`
	Set,
}

/// A resolved interface member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
	/// `org.gnome.Shell`
	Shell(ShellMember),
	/// `org.gnome.Shell.Extensions`
	Extensions(ExtensionsMember),
	/// `org.gnome.Caribou.Keyboard`
	Caribou(CaribouMember),
	/// `org.freedesktop.DBus.Properties`
	Properties(PropertiesMember),
}

impl Member {
	/// Resolves `interface` + `method` to a member, or `None` if either is unknown.
	#[must_use]
	pub fn resolve(interface: &str, method: &str) -> Option<Self> {
		match interface {
			SHELL_INTERFACE => ShellMember::from_str(method).ok().map(Member::Shell),
			EXTENSIONS_INTERFACE => ExtensionsMember::from_str(method).ok().map(Member::Extensions),
			CARIBOU_INTERFACE => CaribouMember::from_str(method).ok().map(Member::Caribou),
			PROPERTIES_INTERFACE => PropertiesMember::from_str(method).ok().map(Member::Properties),
			_ => None,
		}
	}

	/// Wire name of the member.
	#[must_use]
	pub fn name(self) -> &'static str {
		match self {
			Member::Shell(m) => m.into(),
			Member::Extensions(m) => m.into(),
			Member::Caribou(m) => m.into(),
			Member::Properties(m) => m.into(),
		}
	}
}
