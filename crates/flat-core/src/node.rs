use std::sync::Arc;

use crate::props::Props;
use crate::Tag;

/// How a shadow node relates to native views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountKind {
    /// Never backed by a native view (inline text runs and the like).
    Virtual,
    /// Drawn by its nearest mounting ancestor until something forces a view.
    LayoutOnly,
    /// Always backed by a native view.
    ViewMounting,
}

/// Geometry computed by the layout engine, relative to the parent shadow node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// Per view-class behavior the core needs to know about.
///
/// Concrete managers live outside the core; the tree only keeps the class
/// name and the answers given here at node creation.
pub trait ViewManager: Send + Sync {
    fn name(&self) -> &str;

    fn shadow_kind(&self) -> MountKind;

    /// Managers that position their own children need every child to have a
    /// native view.
    fn needs_custom_layout_for_children(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct ShadowNode {
    tag: Tag,
    root_tag: Tag,
    view_class: Arc<str>,
    kind: MountKind,
    forces_children_to_mount: bool,
    pub(crate) parent: Option<Tag>,
    pub(crate) children: Vec<Tag>,
    layout: LayoutRect,
    props: Props,
    mounts_to_view: bool,
    pub(crate) backing_view_created: bool,
}

impl ShadowNode {
    pub fn new(tag: Tag, root_tag: Tag, view_class: impl Into<Arc<str>>, kind: MountKind) -> Self {
        Self {
            tag,
            root_tag,
            view_class: view_class.into(),
            kind,
            forces_children_to_mount: false,
            parent: None,
            children: Vec::new(),
            layout: LayoutRect::default(),
            props: Props::new(),
            mounts_to_view: kind == MountKind::ViewMounting,
            backing_view_created: false,
        }
    }

    pub fn from_manager(tag: Tag, root_tag: Tag, manager: &dyn ViewManager) -> Self {
        let mut node = Self::new(tag, root_tag, manager.name(), manager.shadow_kind());
        node.forces_children_to_mount = manager.needs_custom_layout_for_children();
        node
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn root_tag(&self) -> Tag {
        self.root_tag
    }

    pub fn view_class(&self) -> &Arc<str> {
        &self.view_class
    }

    pub fn kind(&self) -> MountKind {
        self.kind
    }

    pub fn is_virtual(&self) -> bool {
        self.kind == MountKind::Virtual
    }

    pub fn forces_children_to_mount(&self) -> bool {
        self.forces_children_to_mount
    }

    pub fn parent(&self) -> Option<Tag> {
        self.parent
    }

    pub fn children(&self) -> &[Tag] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn layout(&self) -> LayoutRect {
        self.layout
    }

    pub fn set_layout(&mut self, layout: LayoutRect) {
        self.layout = layout;
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn merge_props(&mut self, delta: &Props) {
        self.props.merge(delta);
    }

    pub fn mounts_to_view(&self) -> bool {
        self.mounts_to_view
    }

    pub fn is_backing_view_created(&self) -> bool {
        self.backing_view_created
    }

    /// Promotes the node to "mounts to view". Virtual nodes stay unmounted;
    /// returns whether the flag changed.
    pub fn force_mount_to_view(&mut self) -> bool {
        if self.is_virtual() || self.mounts_to_view {
            return false;
        }
        self.mounts_to_view = true;
        true
    }

    /// Reverts a promotion made by [`force_mount_to_view`](Self::force_mount_to_view)
    /// whose backing view could not be created.
    pub(crate) fn undo_forced_mount(&mut self) {
        if !self.backing_view_created && self.kind() != MountKind::ViewMounting {
            self.mounts_to_view = false;
        }
    }
}
