//! Positions of nodes that have no native view of their own.

use crate::error::{UiError, UiResult};
use crate::state_builder::StateBuilder;
use crate::tree::ShadowTree;
use crate::Tag;

/// Frame of a non-mounting node expressed as fractions of the size of its
/// nearest mounting ancestor `tag`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualFrame {
    pub tag: Tag,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Walks up from `tag` accumulating offsets until the first ancestor that
/// mounts to a view, forces that ancestor's view into existence and returns
/// the node's frame relative to it.
pub fn resolve_virtual_frame(
    tree: &mut ShadowTree,
    builder: &mut StateBuilder,
    tag: Tag,
) -> UiResult<VirtualFrame> {
    let layout = tree.node(tag)?.layout();
    let (mut x, mut y) = (layout.x, layout.y);
    let mut current = tree.node(tag)?.parent();
    let ancestor = loop {
        let parent = current.ok_or(UiError::NoMountingAncestor { tag })?;
        let node = tree.node(parent)?;
        if node.mounts_to_view() {
            break parent;
        }
        let offset = node.layout();
        x += offset.x;
        y += offset.y;
        current = node.parent();
    };
    builder.ensure_backing_view_is_created(tree, ancestor)?;

    let bounds = tree.node(ancestor)?.layout();
    Ok(VirtualFrame {
        tag: ancestor,
        x: fraction(x, bounds.width),
        y: fraction(y, bounds.height),
        width: fraction(layout.width, bounds.width),
        height: fraction(layout.height, bounds.height),
    })
}

/// Native view that should become the touch responder for `tag`: virtual
/// nodes are skipped first, then the nearest node that mounts to a view is
/// picked and forced into existence.
pub fn resolve_responder_view(
    tree: &mut ShadowTree,
    builder: &mut StateBuilder,
    tag: Tag,
) -> UiResult<Tag> {
    let mut current = tag;
    while tree.node(current)?.is_virtual() {
        current = tree
            .node(current)?
            .parent()
            .ok_or(UiError::NoMountingAncestor { tag })?;
    }
    while !tree.node(current)?.mounts_to_view() {
        current = tree
            .node(current)?
            .parent()
            .ok_or(UiError::NoMountingAncestor { tag })?;
    }
    builder.ensure_backing_view_is_created(tree, current)?;
    Ok(current)
}

// Zero-sized ancestors report zero instead of dividing by zero.
fn fraction(value: f32, extent: f32) -> f32 {
    if extent == 0.0 {
        0.0
    } else {
        value / extent
    }
}
