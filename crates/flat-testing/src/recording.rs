//! A native view hierarchy that lives in memory and records everything it is
//! asked to do.
//!
//! Operations that would crash a real platform (updating a view that was
//! never created, dropping a parent before its children, ...) are recorded
//! as violations instead of panicking so tests can assert on them.

use std::sync::Arc;

use flat_core::collections::map::{HashMap, HashSet};
use flat_core::{LayoutRect, Props, Tag, ViewOperation, ViewOperationConsumer};

#[derive(Debug, Clone, PartialEq)]
pub struct NativeView {
    pub view_class: Arc<str>,
    pub props: Props,
    pub frame: Option<LayoutRect>,
    pub parent: Option<Tag>,
    pub children: Vec<Tag>,
}

impl NativeView {
    fn new(view_class: Arc<str>, props: Props) -> Self {
        Self {
            view_class,
            props,
            frame: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingViewHierarchy {
    views: HashMap<Tag, NativeView>,
    roots: HashSet<Tag>,
    log: Vec<ViewOperation>,
    violations: Vec<String>,
    /// Views dropped in the current batch while their parent still listed
    /// them, with that parent.
    dropped_while_attached: Vec<(Tag, Tag)>,
    batches: usize,
}

impl RecordingViewHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hierarchy with platform-owned root views already in place.
    pub fn with_roots(roots: &[Tag]) -> Self {
        let mut hierarchy = Self::new();
        for &root in roots {
            hierarchy
                .views
                .insert(root, NativeView::new(Arc::from("Root"), Props::new()));
            hierarchy.roots.insert(root);
        }
        hierarchy
    }

    pub fn operations(&self) -> &[ViewOperation] {
        &self.log
    }

    pub fn take_operations(&mut self) -> Vec<ViewOperation> {
        std::mem::take(&mut self.log)
    }

    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn assert_consistent(&self) {
        assert!(
            self.violations.is_empty(),
            "native hierarchy violations:\n{}",
            self.violations.join("\n")
        );
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn view(&self, tag: Tag) -> Option<&NativeView> {
        self.views.get(&tag)
    }

    pub fn has_view(&self, tag: Tag) -> bool {
        self.views.contains_key(&tag)
    }

    pub fn children_of(&self, tag: Tag) -> Vec<Tag> {
        self.views
            .get(&tag)
            .map(|view| view.children.clone())
            .unwrap_or_default()
    }

    pub fn created_tags(&self) -> Vec<Tag> {
        self.log
            .iter()
            .filter_map(|operation| match operation {
                ViewOperation::CreateView { tag, .. } => Some(*tag),
                _ => None,
            })
            .collect()
    }

    pub fn dropped_tags(&self) -> Vec<Tag> {
        self.log
            .iter()
            .filter_map(|operation| match operation {
                ViewOperation::DropView { tag } | ViewOperation::RemoveRootView { tag } => {
                    Some(*tag)
                }
                _ => None,
            })
            .collect()
    }

    fn violation(&mut self, message: String) {
        self.violations.push(message);
    }

    fn require(&mut self, tag: Tag, action: &str) -> bool {
        if self.views.contains_key(&tag) {
            true
        } else {
            self.violation(format!("{action} on missing view {tag}"));
            false
        }
    }

    fn detach(&mut self, tag: Tag) {
        let parent = self.views.get_mut(&tag).and_then(|view| view.parent.take());
        if let Some(parent_view) = parent.and_then(|parent| self.views.get_mut(&parent)) {
            parent_view.children.retain(|&child| child != tag);
        }
    }

    fn set_children(&mut self, tag: Tag, children: Vec<Tag>) {
        for &child in &children {
            if !self.require(child, "attach") {
                return;
            }
        }
        let previous = self
            .views
            .get(&tag)
            .map(|view| view.children.clone())
            .unwrap_or_default();
        for child in previous {
            if let Some(view) = self.views.get_mut(&child) {
                view.parent = None;
            }
        }
        for &child in &children {
            if self.views.get(&child).and_then(|view| view.parent) != Some(tag) {
                self.detach(child);
            }
            if let Some(view) = self.views.get_mut(&child) {
                view.parent = Some(tag);
            }
        }
        if let Some(view) = self.views.get_mut(&tag) {
            view.children = children;
        }
    }

    fn drop_view(&mut self, tag: Tag) {
        let live_children: Vec<Tag> = self
            .children_of(tag)
            .into_iter()
            .filter(|child| self.views.contains_key(child))
            .collect();
        if !live_children.is_empty() {
            self.violation(format!(
                "view {tag} dropped before its children {live_children:?}"
            ));
        }
        let attached_to = self.views.get(&tag).and_then(|view| view.parent);
        if let Some(parent) = attached_to {
            if self.children_of(parent).contains(&tag) {
                self.dropped_while_attached.push((tag, parent));
            }
        }
        self.detach(tag);
        self.views.remove(&tag);
    }
}

impl ViewOperationConsumer for RecordingViewHierarchy {
    fn execute(&mut self, operation: ViewOperation) {
        self.log.push(operation.clone());
        match operation {
            ViewOperation::CreateView {
                tag,
                view_class,
                props,
                ..
            } => {
                if self.views.contains_key(&tag) {
                    self.violation(format!("view {tag} created twice"));
                }
                self.views.insert(tag, NativeView::new(view_class, props));
            }
            ViewOperation::UpdateProperties { tag, props, .. } => {
                if self.require(tag, "update properties") {
                    if let Some(view) = self.views.get_mut(&tag) {
                        view.props.merge(&props);
                    }
                }
            }
            ViewOperation::UpdateLayout { tag, parent, frame } => {
                if self.require(tag, "update layout") && self.require(parent, "layout parent") {
                    if let Some(view) = self.views.get_mut(&tag) {
                        view.frame = Some(frame);
                    }
                }
            }
            ViewOperation::UpdateMountedChildren { tag, children } => {
                if self.require(tag, "update children") {
                    self.set_children(tag, children);
                }
            }
            ViewOperation::DropView { tag } => {
                if self.roots.contains(&tag) {
                    self.violation(format!("root view {tag} dropped as a regular view"));
                }
                if self.require(tag, "drop") {
                    self.drop_view(tag);
                }
            }
            ViewOperation::RemoveRootView { tag } => {
                if !self.roots.remove(&tag) {
                    self.violation(format!("{tag} removed as a root but is not one"));
                }
                if self.require(tag, "remove root") {
                    self.drop_view(tag);
                }
            }
            ViewOperation::SetJsResponder { tag, .. } => {
                self.require(tag, "set responder");
            }
            ViewOperation::ClearJsResponder => {}
            ViewOperation::Measure { tag, .. }
            | ViewOperation::MeasureVirtualView { tag, .. }
            | ViewOperation::MeasureInWindow { tag, .. }
            | ViewOperation::FindSubviewIn { tag, .. } => {
                self.require(tag, "measure");
            }
            ViewOperation::DispatchCommand { tag, .. } => {
                self.require(tag, "dispatch command");
            }
            ViewOperation::ShowPopupMenu { tag, .. } => {
                self.require(tag, "show popup menu");
            }
            ViewOperation::SendAccessibilityEvent { tag, .. } => {
                self.require(tag, "send accessibility event");
            }
        }
    }

    /// A drop of a still-attached view is only legal when its parent was
    /// torn down in the same batch.
    fn batch_flushed(&mut self) {
        for (tag, parent) in std::mem::take(&mut self.dropped_while_attached) {
            if self.views.contains_key(&parent) {
                self.violation(format!(
                    "view {tag} dropped while still attached to live parent {parent}"
                ));
            }
        }
        self.batches += 1;
    }
}
