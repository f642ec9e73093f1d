//! Releases grabs of callers that leave the bus.

use std::sync::Arc;

use futures::StreamExt;
use shellface_proto::CallerId;
use tokio_util::sync::CancellationToken;
use zbus::names::BusName;
use zbus::{Connection, fdo};

use crate::core::ShellFacade;

/// Watches `NameOwnerChanged` until `shutdown` fires.
///
/// A unique name losing its owner is a disconnected client.
pub(crate) async fn run(conn: Connection, facade: Arc<ShellFacade>, shutdown: CancellationToken) -> zbus::Result<()> {
	let dbus = fdo::DBusProxy::new(&conn).await?;
	let mut changes = dbus.receive_name_owner_changed().await?;

	loop {
		let change = tokio::select! {
			_ = shutdown.cancelled() => break,
			next = changes.next() => match next {
				Some(change) => change,
				None => break,
			},
		};
		let args = match change.args() {
			Ok(args) => args,
			Err(e) => {
				tracing::warn!(error = %e, "malformed NameOwnerChanged");
				continue;
			}
		};
		if let BusName::Unique(name) = args.name()
			&& args.new_owner().is_none()
		{
			let caller = CallerId::new(name.as_str());
			let released = facade.caller_disconnected(&caller);
			tracing::trace!(%caller, released, "caller left the bus");
		}
	}

	tracing::debug!("caller watch stopped");
	Ok(())
}
