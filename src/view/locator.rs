//! Surface lookup — pure traversal, no side effects.

use super::ViewNode;
use crate::capture::RenderSurface;
use std::sync::Arc;

/// Finds the first surface-host leaf under `root`, pre-order.
///
/// Children are visited in their stored order, so the same tree shape
/// always yields the same surface.
pub fn locate(root: &ViewNode) -> Option<Arc<dyn RenderSurface>> {
    match root {
        ViewNode::Surface { surface, .. } => Some(Arc::clone(surface)),
        ViewNode::Container { children, .. } => children.iter().find_map(locate),
        ViewNode::Widget { .. } => None,
    }
}
