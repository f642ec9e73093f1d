//! GNOME Shell D-Bus facade for compositors that are not GNOME Shell.
//!
//! Clients written against `org.gnome.Shell` (overview, OSD popups, global
//! accelerators, extension management) and `org.gnome.Caribou.Keyboard` talk
//! to this crate as if it were the shell. Calls are routed by the
//! [`dispatch::Dispatcher`] onto a single [`core::ShellFacade`], which drives
//! the real compositor through [`adapters`] and queues change notifications
//! through [`signals`]. [`bus`] is the zbus transport.

#![warn(missing_docs)]

pub mod adapters;
pub mod bus;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod service;
pub mod signals;

pub use shellface_proto as proto;
