//! View hierarchy domain — the shell's widget tree as seen from native code.
//!
//! Only the shape of the tree matters here: which leaves host a live
//! rendering surface, which are plain widgets, and the child order of
//! containers. The locator reads this tree; nothing in it is mutated
//! during a search.

mod locator;

pub use locator::locate;

use crate::capture::RenderSurface;
use std::fmt;
use std::sync::{Arc, RwLock};

/// One node of a view tree.
#[derive(Clone)]
pub enum ViewNode {
    /// Leaf that owns a live, hardware-backed rendering target.
    Surface {
        tag: String,
        surface: Arc<dyn RenderSurface>,
    },
    /// Layout container. Children are kept in construction order.
    Container { tag: String, children: Vec<ViewNode> },
    /// Leaf with no surface of its own (text, overlays, buttons).
    Widget { tag: String },
}

impl ViewNode {
    pub fn surface(tag: impl Into<String>, surface: Arc<dyn RenderSurface>) -> Self {
        ViewNode::Surface {
            tag: tag.into(),
            surface,
        }
    }

    pub fn container(tag: impl Into<String>, children: Vec<ViewNode>) -> Self {
        ViewNode::Container {
            tag: tag.into(),
            children,
        }
    }

    pub fn widget(tag: impl Into<String>) -> Self {
        ViewNode::Widget { tag: tag.into() }
    }

    pub fn tag(&self) -> &str {
        match self {
            ViewNode::Surface { tag, .. }
            | ViewNode::Container { tag, .. }
            | ViewNode::Widget { tag } => tag,
        }
    }

    /// First node with the given tag, pre-order.
    pub fn find_by_tag(&self, wanted: &str) -> Option<&ViewNode> {
        if self.tag() == wanted {
            return Some(self);
        }
        match self {
            ViewNode::Container { children, .. } => {
                children.iter().find_map(|child| child.find_by_tag(wanted))
            }
            _ => None,
        }
    }

    /// Number of surface-host leaves in this subtree.
    pub fn surface_count(&self) -> usize {
        match self {
            ViewNode::Surface { .. } => 1,
            ViewNode::Container { children, .. } => {
                children.iter().map(ViewNode::surface_count).sum()
            }
            ViewNode::Widget { .. } => 0,
        }
    }
}

impl fmt::Debug for ViewNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewNode::Surface { tag, surface } => f
                .debug_struct("Surface")
                .field("tag", tag)
                .field("size", &surface.reported_size())
                .field("available", &surface.is_available())
                .finish(),
            ViewNode::Container { tag, children } => f
                .debug_struct("Container")
                .field("tag", tag)
                .field("children", children)
                .finish(),
            ViewNode::Widget { tag } => f.debug_struct("Widget").field("tag", tag).finish(),
        }
    }
}

/// The native window: holds the decor root the shell currently shows.
pub struct Window {
    decor: RwLock<ViewNode>,
}

impl Window {
    pub fn new(decor: ViewNode) -> Self {
        Self {
            decor: RwLock::new(decor),
        }
    }

    /// Replace the whole decor tree (the shell re-laid out its content).
    pub fn set_content(&self, decor: ViewNode) {
        match self.decor.write() {
            Ok(mut guard) => *guard = decor,
            Err(poisoned) => *poisoned.into_inner() = decor,
        }
    }

    /// Locate the camera surface in the current tree.
    ///
    /// The lock is held only for the search; the returned handle is
    /// independent of later `set_content` calls.
    pub fn find_surface(&self) -> Option<Arc<dyn RenderSurface>> {
        let guard = match self.decor.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locate(&guard)
    }
}
