use crate::config::BlockDevice;
use crate::entity::issue::{
    Issue,
    IssueKind,
};

/// Reports searches which ended without device
pub(super) fn check(device: &dyn BlockDevice) -> Option<Issue> {
    let search = device.search()?;

    if search.skip_device() {
        return Some(Issue::warning(
            IssueKind::Search,
            format!("No device found for an optional {}", device.kind()),
        ));
    }

    if search.missing_device() {
        return Some(Issue::error(
            IssueKind::Search,
            format!("No device found for a mandatory {}", device.kind()),
        ));
    }

    None
}
