use crate::config::Config;
use crate::entity::issue::{
    Issue,
    IssueKind,
};

/// Devices used as physical volumes target by more than one volume group,
/// reported once per device
pub(super) fn check(config: &Config) -> Vec<Issue> {
    let mut seen: Vec<&str> = Vec::new();
    let mut overused: Vec<&str> = Vec::new();

    for vg in &config.volume_groups {
        let mut targets: Vec<&str> = Vec::new();
        for target in &vg.physical_volumes_devices {
            if !targets.contains(&target.as_str()) {
                targets.push(target);
            }
        }

        for target in targets {
            if !seen.contains(&target) {
                seen.push(target);
            } else if !overused.contains(&target) {
                overused.push(target);
            }
        }
    }

    overused
        .into_iter()
        .map(|alias| {
            Issue::error(
                IssueKind::Overused,
                format!("The device '{alias}' is used several times as target device for physical volumes"),
            )
        })
        .collect()
}
