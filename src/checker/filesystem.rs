use crate::config::Filesystem;
use crate::entity::issue::{
    Issue,
    IssueKind,
};
use crate::product::Product;

/// Checks the type of new filesystems against the product volume template
pub(super) fn check(filesystem: &Filesystem, product: &Product) -> Option<Issue> {
    if filesystem.reuse {
        return None;
    }

    let path = filesystem.path.as_deref().unwrap_or_default();

    let Some(fs_type) = &filesystem.fs_type else {
        return Some(Issue::error(
            IssueKind::Filesystem,
            format!("Missing file system type for '{path}'"),
        ));
    };

    if path.is_empty() || product.template_for(path).allows(fs_type.fs_type) {
        return None;
    }

    Some(Issue::error(
        IssueKind::Filesystem,
        format!(
            "The file system type '{}' is not suitable for '{path}'",
            fs_type.fs_type.label()
        ),
    ))
}
