//! Tests for accelerator grabs, ownership and disconnect cleanup.

use std::sync::atomic::Ordering;

use pretty_assertions::assert_eq;
use shellface_proto::members::SHELL_INTERFACE;
use shellface_proto::{ActionMode, CallerId, ErrorKind, GrabToken, Reply, Value};

use super::helpers::{Harness, grab_args, token_of};
use crate::core::ActivationContext;
use crate::signals::ShellSignal;

const NORMAL: u32 = 1;
const ALL: u32 = u32::MAX;

#[test]
fn second_grab_of_same_binding_is_rejected() {
	let mut h = Harness::new();

	let first = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>space", NORMAL)));
	assert_ne!(first, 0);

	let err = h
		.call(":1.11", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>space", NORMAL))
		.unwrap_err();
	assert_eq!(err.kind, ErrorKind::AlreadyGrabbed);
	assert_eq!(h.facade.grab_count(), 1);
	assert!(h.drain().is_empty());
}

#[test]
fn aliases_and_modifier_order_name_the_same_binding() {
	let h = Harness::new();
	token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Control><Alt>t", NORMAL)));

	let err = h
		.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Alt><Primary>T", NORMAL))
		.unwrap_err();
	assert_eq!(err.kind, ErrorKind::AlreadyGrabbed);
}

#[test]
fn keysym_case_does_not_make_a_second_binding() {
	let h = Harness::new();
	token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>space", NORMAL)));

	let err = h
		.call(":1.11", SHELL_INTERFACE, "GrabAccelerator", grab_args("<super>SPACE", NORMAL))
		.unwrap_err();
	assert_eq!(err.kind, ErrorKind::AlreadyGrabbed);
	assert_eq!(h.facade.grab_count(), 1);
}

#[test]
fn tokens_are_not_reused_after_ungrab() {
	let h = Harness::new();
	let first = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>a", NORMAL)));

	let released = h.call(":1.10", SHELL_INTERFACE, "UngrabAccelerator", vec![Value::U32(first)]);
	assert_eq!(released.unwrap(), Reply::one(true));

	let second = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>a", NORMAL)));
	assert_ne!(first, second);
	assert_eq!(h.probe.released.lock().as_slice(), &[GrabToken(first)]);
}

#[test]
fn ungrab_of_unknown_token_succeeds() {
	let h = Harness::new();
	let reply = h.call(":1.10", SHELL_INTERFACE, "UngrabAccelerator", vec![Value::U32(4242)]);
	assert_eq!(reply.unwrap(), Reply::one(true));
	assert!(h.probe.released.lock().is_empty());
}

#[test]
fn ungrab_by_non_owner_leaves_grab_in_place() {
	let h = Harness::new();
	let token = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>b", NORMAL)));

	let reply = h.call(":1.99", SHELL_INTERFACE, "UngrabAccelerator", vec![Value::U32(token)]);
	assert_eq!(reply.unwrap(), Reply::one(false));
	assert_eq!(h.facade.grab_count(), 1);
}

#[test]
fn invalid_accelerator_is_rejected_without_grab() {
	let h = Harness::new();
	let err = h
		.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super", NORMAL))
		.unwrap_err();
	assert_eq!(err.kind, ErrorKind::InvalidArgument);
	assert_eq!(h.facade.grab_count(), 0);
	assert!(h.probe.grabbed.lock().is_empty());
}

#[test]
fn adapter_rejection_records_nothing() {
	let h = Harness::new();
	h.probe.reject_grabs.store(true, Ordering::SeqCst);

	let err = h
		.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>c", NORMAL))
		.unwrap_err();
	assert_eq!(err.kind, ErrorKind::InvalidArgument);
	assert_eq!(h.facade.grab_count(), 0);
}

#[test]
fn batch_grab_reports_zero_for_failed_entries() {
	let h = Harness::new();
	token_of(h.call(":1.20", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>d", NORMAL)));

	let entry = |binding: &str| Value::Struct(vec![Value::from(binding), Value::U32(NORMAL), Value::U32(0)]);
	let reply = h
		.call(
			":1.10",
			SHELL_INTERFACE,
			"GrabAccelerators",
			vec![Value::Array(vec![entry("<Super>e"), entry("<Super>d"), entry("<<bad")])],
		)
		.unwrap();

	let tokens: Vec<u32> = reply
		.first()
		.and_then(Value::as_array)
		.unwrap()
		.iter()
		.map(|v| v.as_u32().unwrap())
		.collect();
	assert_eq!(tokens.len(), 3);
	assert_ne!(tokens[0], 0);
	assert_eq!(&tokens[1..], &[0, 0]);
	assert_eq!(h.facade.grab_count(), 2);
}

#[test]
fn malformed_batch_entry_fails_whole_call() {
	let h = Harness::new();
	let reply = h.call(
		":1.10",
		SHELL_INTERFACE,
		"GrabAccelerators",
		vec![Value::Array(vec![
			Value::Struct(vec![Value::from("<Super>f"), Value::U32(NORMAL), Value::U32(0)]),
			Value::from("<Super>g"),
		])],
	);
	assert_eq!(reply.unwrap_err().kind, ErrorKind::InvalidArgument);
	assert_eq!(h.facade.grab_count(), 0);
}

#[test]
fn batch_ungrab_is_true_only_when_every_token_is_released() {
	let h = Harness::new();
	let own = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>h", NORMAL)));
	let other = token_of(h.call(":1.11", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>i", NORMAL)));

	let reply = h.call(
		":1.10",
		SHELL_INTERFACE,
		"UngrabAccelerators",
		vec![Value::Array(vec![Value::U32(own), Value::U32(other), Value::U32(777)])],
	);
	assert_eq!(reply.unwrap(), Reply::one(false));
	// The caller's own grab is still released.
	assert_eq!(h.facade.grab_count(), 1);

	let reply = h.call(":1.11", SHELL_INTERFACE, "UngrabAccelerators", vec![Value::Array(vec![Value::U32(other)])]);
	assert_eq!(reply.unwrap(), Reply::one(true));
	assert_eq!(h.facade.grab_count(), 0);
}

#[test]
fn disconnect_releases_grabs() {
	let h = Harness::new();
	let a = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>space", NORMAL)));
	let b = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>j", NORMAL)));
	token_of(h.call(":1.11", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>k", NORMAL)));

	assert_eq!(h.facade.caller_disconnected(&CallerId::new(":1.10")), 2);
	assert_eq!(h.facade.grab_count(), 1);

	let mut released = h.probe.released.lock().clone();
	released.sort();
	assert_eq!(released, vec![GrabToken(a), GrabToken(b)]);

	// The binding is free for another client.
	token_of(h.call(":1.12", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>space", NORMAL)));
}

#[test]
fn grab_after_disconnect_is_refused() {
	let h = Harness::new();
	h.facade.caller_disconnected(&CallerId::new(":1.10"));

	let err = h
		.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>l", NORMAL))
		.unwrap_err();
	assert_eq!(err.kind, ErrorKind::SubsystemUnavailable);
	assert_eq!(h.facade.grab_count(), 0);
}

#[test]
fn activation_is_gated_by_action_mode() {
	let mut h = Harness::new();
	let normal_only = token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>m", NORMAL)));
	token_of(h.call(":1.10", SHELL_INTERFACE, "GrabAccelerator", grab_args("<Super>n", ALL)));

	let context = ActivationContext {
		device_id: 3,
		timestamp: 1234,
	};
	let m = "<Super>m".parse().unwrap();
	let n = "<Super>n".parse().unwrap();

	assert!(h.facade.activate_accelerator(&m, context));
	match h.drain().as_slice() {
		[ShellSignal::AcceleratorActivated { token, parameters, .. }] => {
			assert_eq!(*token, GrabToken(normal_only));
			assert_eq!(parameters.get("device-id"), Some(&Value::U32(3)));
			assert_eq!(parameters.get("timestamp"), Some(&Value::U32(1234)));
			assert_eq!(parameters.get("action-mode"), Some(&Value::U32(ActionMode::NORMAL.bits())));
		}
		other => panic!("unexpected signals: {other:?}"),
	}

	h.call(":1.10", SHELL_INTERFACE, "ShowApplications", Vec::new()).unwrap();
	h.drain();

	assert!(!h.facade.activate_accelerator(&m, context));
	assert!(h.facade.activate_accelerator(&n, context));
	assert!(matches!(
		h.drain().as_slice(),
		[ShellSignal::AcceleratorActivated { parameters, .. }]
			if parameters.get("action-mode") == Some(&Value::U32(ActionMode::OVERVIEW.bits()))
	));
}

#[test]
fn activation_of_ungrabbed_binding_is_ignored() {
	let mut h = Harness::new();
	let binding = "<Super>o".parse().unwrap();
	assert!(!h.facade.activate_accelerator(&binding, ActivationContext::default()));
	assert!(h.drain().is_empty());
}
