use crate::config::{
    LogicalVolume,
    VolumeGroup,
};
use crate::entity::issue::{
    Issue,
    IssueKind,
};

/// Thin volumes must use a pool of the same volume group
pub(super) fn check(vg: &VolumeGroup, lv: &LogicalVolume) -> Option<Issue> {
    let pool = lv.used_pool.as_deref()?;

    let found = vg
        .logical_volume(pool)
        .map(|lv| lv.pool)
        .unwrap_or(false);

    (!found).then(|| {
        Issue::error(
            IssueKind::NoSuchPool,
            format!("There is no LVM thin pool volume with alias '{pool}'"),
        )
    })
}
