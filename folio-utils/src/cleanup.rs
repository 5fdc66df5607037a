use bitflags::bitflags;
use futures::future::join_all;
use tracing::debug;

use crate::pagination::surface::{Surface, SurfaceError, SurfaceId};

bitflags! {
    /// What to remove from the chat when a navigator terminates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CleanupAction: u8 {
        /// Remove every control from the root surface.
        const REMOVE_CONTROLS = 1 << 0;
        /// Delete every surface the navigator posted other than the root.
        const REMOVE_NON_ROOT = 1 << 1;
        /// Delete the root surface.
        const REMOVE_ROOT = 1 << 2;
        /// Delete the message that invoked the navigator.
        const REMOVE_INVOCATION = 1 << 3;
        /// Delete everything the navigator posted.
        const REMOVE_ALL_SENT = Self::REMOVE_NON_ROOT.bits() | Self::REMOVE_ROOT.bits();
        /// Delete everything the navigator posted along with the invocation.
        const REMOVE_ALL_MESSAGES = Self::REMOVE_ALL_SENT.bits() | Self::REMOVE_INVOCATION.bits();
    }
}

impl CleanupAction {
    /// Cleanup applied when a navigator idles out.
    pub const ON_TIMEOUT: Self = Self::REMOVE_NON_ROOT.union(Self::REMOVE_CONTROLS);

    /// Leave everything in place.
    pub const NOTHING: Self = Self::empty();
}

impl Default for CleanupAction {
    fn default() -> Self {
        Self::ON_TIMEOUT
    }
}

/// Apply a cleanup action against the surfaces a navigator tracked.
///
/// `surfaces` lists the root first followed by every non-root surface.
/// Every step is best effort: failures are logged and skipped.
pub async fn apply_cleanup(
    surface: &dyn Surface,
    action: CleanupAction,
    surfaces: &[SurfaceId],
    invocation: Option<SurfaceId>,
) {
    let (root, others) = match surfaces.split_first() {
        Some((root, others)) => (Some(*root), others),
        None => (None, surfaces),
    };

    if let Some(root) = root {
        if action.contains(CleanupAction::REMOVE_ROOT) {
            log_failure("delete root", root, surface.delete(root).await);
        } else if action.contains(CleanupAction::REMOVE_CONTROLS) {
            log_failure("clear controls", root, surface.clear_controls(root).await);
        }
    }

    if action.contains(CleanupAction::REMOVE_NON_ROOT) && !others.is_empty() {
        let results = join_all(others.iter().map(|id| surface.delete(*id))).await;
        for (id, result) in others.iter().zip(results) {
            log_failure("delete surface", *id, result);
        }
    }

    if action.contains(CleanupAction::REMOVE_INVOCATION)
        && let Some(invocation) = invocation
    {
        log_failure("delete invocation", invocation, surface.delete(invocation).await);
    }
}

fn log_failure(step: &'static str, surface_id: SurfaceId, result: Result<(), SurfaceError>) {
    if let Err(source) = result {
        debug!(?source, surface_id, step, "cleanup step failed");
    }
}
