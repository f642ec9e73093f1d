//! Wire-level tests over a peer-to-peer connection.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use pretty_assertions::assert_eq;
use shellface_proto::Value;
use shellface_proto::members::{
	ACCELERATORS_INTERFACE, ACCELERATORS_OBJECT_PATH, PROPERTIES_INTERFACE, SHELL_INTERFACE, SHELL_OBJECT_PATH,
};
use tokio::net::UnixStream;
use tokio_util::sync::CancellationToken;
use zbus::connection::Builder;
use zbus::message::Type as MessageType;
use zbus::zvariant::OwnedValue;
use zbus::{Connection, Guid, Message, MessageStream};

use super::activation::ActivationObject;
use super::convert;
use super::extensions::ExtensionsObject;
use super::pump;
use super::shell::ShellObject;
use crate::config::Config;
use crate::core::ShellFacade;
use crate::service::ShellService;
use crate::signals::{SignalEmitter, SignalReceiver};

struct Peers {
	server: Connection,
	client: Connection,
	signals: SignalReceiver,
}

async fn connect() -> Peers {
	let (emitter, signals) = SignalEmitter::channel();
	let facade = Arc::new(ShellFacade::from_config(&Config::default(), emitter));
	let service = ShellService::new(facade.clone());

	let (server_end, client_end) = UnixStream::pair().unwrap();
	let server = Builder::unix_stream(server_end)
		.server(Guid::generate())
		.unwrap()
		.p2p()
		.serve_at(SHELL_OBJECT_PATH, ShellObject::new(service.clone()))
		.unwrap()
		.serve_at(SHELL_OBJECT_PATH, ExtensionsObject::new(service.clone()))
		.unwrap()
		.serve_at(ACCELERATORS_OBJECT_PATH, ActivationObject::new(facade))
		.unwrap()
		.build();
	let client = Builder::unix_stream(client_end).p2p().build();
	let (server, client) = futures::try_join!(server, client).unwrap();

	Peers {
		server,
		client,
		signals,
	}
}

fn error_name(result: zbus::Result<Message>) -> String {
	match result {
		Err(zbus::Error::MethodError(name, _, _)) => name.to_string(),
		other => panic!("expected a method error, got {other:?}"),
	}
}

#[tokio::test(flavor = "current_thread")]
async fn unknown_members_use_the_standard_error_names() {
	let peers = connect().await;

	let reply = peers
		.client
		.call_method(None::<&str>, SHELL_OBJECT_PATH, Some(SHELL_INTERFACE), "Frobnicate", &())
		.await;
	assert_eq!(error_name(reply), "org.freedesktop.DBus.Error.UnknownMethod");

	let reply = peers
		.client
		.call_method(
			None::<&str>,
			SHELL_OBJECT_PATH,
			Some(PROPERTIES_INTERFACE),
			"Get",
			&(SHELL_INTERFACE, "Bogus"),
		)
		.await;
	assert_eq!(error_name(reply), "org.freedesktop.DBus.Error.UnknownProperty");
}

#[tokio::test(flavor = "current_thread")]
async fn policy_failures_carry_shell_error_names() {
	let peers = connect().await;

	let reply = peers
		.client
		.call_method(None::<&str>, SHELL_OBJECT_PATH, Some(SHELL_INTERFACE), "Eval", &("1+1",))
		.await;
	assert_eq!(error_name(reply), "org.gnome.Shell.Error.NotImplemented");

	let reply = peers
		.client
		.call_method(
			None::<&str>,
			SHELL_OBJECT_PATH,
			Some(SHELL_INTERFACE),
			"GrabAccelerator",
			&("<Super", 1u32, 0u32),
		)
		.await;
	assert_eq!(error_name(reply), "org.gnome.Shell.Error.InvalidArgument");
}

#[tokio::test(flavor = "current_thread")]
async fn key_press_reaches_grabbing_client() {
	let Peers {
		server,
		client,
		signals,
	} = connect().await;
	let shutdown = CancellationToken::new();
	let pump = tokio::spawn(pump::run(server.clone(), signals, shutdown.clone()));
	let mut incoming = MessageStream::from(&client);

	let reply = client
		.call_method(
			None::<&str>,
			SHELL_OBJECT_PATH,
			Some(SHELL_INTERFACE),
			"GrabAccelerator",
			&("<Super>space", 1u32, 0u32),
		)
		.await
		.unwrap();
	let body = reply.body();
	let action: u32 = body.deserialize().unwrap();
	assert_ne!(action, 0);

	let reply = client
		.call_method(
			None::<&str>,
			ACCELERATORS_OBJECT_PATH,
			Some(ACCELERATORS_INTERFACE),
			"Activate",
			&("<super>SPACE", 7u32, 4242u32),
		)
		.await
		.unwrap();
	let body = reply.body();
	let delivered: bool = body.deserialize().unwrap();
	assert!(delivered);

	let signal = loop {
		let message = incoming.next().await.unwrap().unwrap();
		let header = message.header();
		if header.message_type() == MessageType::Signal
			&& header.member().is_some_and(|m| m.as_str() == "AcceleratorActivated")
		{
			break message;
		}
	};
	let body = signal.body();
	let (fired, parameters): (u32, HashMap<String, OwnedValue>) = body.deserialize().unwrap();
	let parameters = convert::dict_from_bus(&parameters).unwrap();
	assert_eq!(fired, action);
	assert_eq!(parameters["device-id"], Value::U32(7));
	assert_eq!(parameters["timestamp"], Value::U32(4242));

	shutdown.cancel();
	pump.await.unwrap();
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_key_press_is_invalid_argument() {
	let peers = connect().await;
	let reply = peers
		.client
		.call_method(
			None::<&str>,
			ACCELERATORS_OBJECT_PATH,
			Some(ACCELERATORS_INTERFACE),
			"Activate",
			&("<Super", 0u32, 0u32),
		)
		.await;
	assert_eq!(error_name(reply), "org.gnome.Shell.Error.InvalidArgument");
}
