use smallvec::SmallVec;

use super::RuleHost;
use crate::error::Result;

/// Closes every visible child of `entry` once `entry` is hidden.
///
/// Parents never force children open.
pub(super) fn cascade<H: RuleHost + ?Sized>(entry: &str, host: &H) -> Result<()> {
	if host.is_visible(entry)? {
		return Ok(());
	}

	let children: SmallVec<[&str; 8]> = host.registry().children_of(entry).map(|app| app.name()).collect();
	for child in children {
		if !host.is_visible(child)? {
			continue;
		}
		tracing::debug!(target: "appforge::rules", parent = entry, child, "Closing child app (parent closed)");
		host.set_visible(child, false)?;
	}
	Ok(())
}
