//! Shared types for the shellface GNOME Shell facade.
//!
//! This crate defines the transport-neutral call model exchanged between the
//! D-Bus glue and the dispatcher: typed argument values, requests, replies and
//! error kinds, together with the interface member tables and the accelerator
//! grammar used by `GrabAccelerator`.

#![warn(missing_docs)]

pub mod accelerator;
pub mod members;
pub mod paths;
pub mod types;

pub use accelerator::{Accelerator, AcceleratorParseError};
pub use members::{CaribouMember, ExtensionsMember, Member, PropertiesMember, ShellMember};
pub use types::*;
