use smallvec::SmallVec;

use super::RuleHost;
use crate::error::Result;

/// Closes the other visible members of `entry`'s exclusive group once `entry` is shown.
pub(super) fn cascade<H: RuleHost + ?Sized>(entry: &str, host: &H) -> Result<()> {
	let registry = host.registry();
	let Some(tag) = registry.lookup(entry).and_then(|app| app.exclusive_tag()) else {
		return Ok(());
	};
	if !host.is_visible(entry)? {
		return Ok(());
	}

	tracing::trace!(target: "appforge::rules", app = entry, group = tag, "Exclusive group activated");

	let peers: SmallVec<[&str; 8]> = registry.exclusive_peers(entry).map(|app| app.name()).collect();
	for peer in peers {
		if !host.is_visible(peer)? {
			continue;
		}
		tracing::debug!(target: "appforge::rules", app = entry, closed = peer, group = tag, "Closing app due to exclusive group");
		host.set_visible(peer, false)?;
	}
	Ok(())
}
