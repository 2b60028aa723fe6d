//! Arena of shadow nodes keyed by tag.
//!
//! Parents own the ordered list of child tags; children keep a plain tag back
//! to their parent. Removing a node removes it from the arena, there is no
//! reference counting involved.

use std::fmt::Write as _;

use indexmap::IndexSet;

use crate::collections::map::HashMap;
use crate::error::{ContractViolation, UiError, UiResult};
use crate::node::{LayoutRect, MountKind, ShadowNode};
use crate::Tag;

#[derive(Debug, Default)]
pub struct ShadowTree {
    nodes: HashMap<Tag, ShadowNode>,
    roots: IndexSet<Tag>,
    poisoned: bool,
}

impl ShadowTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.nodes.contains_key(&tag)
    }

    pub fn register(&mut self, node: ShadowNode) -> UiResult<()> {
        let tag = node.tag();
        if self.nodes.contains_key(&tag) {
            return Err(UiError::DuplicateTag { tag });
        }
        self.nodes.insert(tag, node);
        Ok(())
    }

    /// Registers a root whose native view is owned by the platform, so it
    /// counts as created from the start.
    pub fn register_root(
        &mut self,
        tag: Tag,
        view_class: &str,
        width: f32,
        height: f32,
    ) -> UiResult<()> {
        let mut node = ShadowNode::new(tag, tag, view_class, MountKind::ViewMounting);
        node.set_layout(LayoutRect::new(0.0, 0.0, width, height));
        node.backing_view_created = true;
        self.register(node)?;
        self.roots.insert(tag);
        Ok(())
    }

    pub fn is_root(&self, tag: Tag) -> bool {
        self.roots.contains(&tag)
    }

    pub fn roots(&self) -> impl Iterator<Item = Tag> + '_ {
        self.roots.iter().copied()
    }

    pub fn node(&self, tag: Tag) -> UiResult<&ShadowNode> {
        self.nodes.get(&tag).ok_or(UiError::Missing { tag })
    }

    pub fn node_mut(&mut self, tag: Tag) -> UiResult<&mut ShadowNode> {
        self.nodes.get_mut(&tag).ok_or(UiError::Missing { tag })
    }

    pub fn children(&self, tag: Tag) -> UiResult<&[Tag]> {
        Ok(self.node(tag)?.children())
    }

    pub fn set_layout(&mut self, tag: Tag, layout: LayoutRect) -> UiResult<()> {
        self.node_mut(tag)?.set_layout(layout);
        Ok(())
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    pub(crate) fn ensure_consistent(&self) -> UiResult<()> {
        if self.poisoned {
            Err(UiError::TreePoisoned)
        } else {
            Ok(())
        }
    }

    pub fn insert_child(&mut self, parent: Tag, child: Tag, index: usize) -> UiResult<()> {
        let len = self.node(parent)?.child_count();
        if index > len {
            return Err(ContractViolation::IndexOutOfRange { index, len }.into());
        }
        if let Some(existing) = self.node(child)?.parent() {
            return Err(ContractViolation::ChildAlreadyAttached {
                child,
                parent: existing,
            }
            .into());
        }
        if self.is_root(child) || self.ancestors_and_self(parent)?.contains(&child) {
            return Err(ContractViolation::CyclicInsertion { tag: child, parent }.into());
        }
        let forces_mount = {
            let parent_node = self.node_mut(parent)?;
            parent_node.children.insert(index, child);
            parent_node.forces_children_to_mount()
        };
        let child_node = self.node_mut(child)?;
        child_node.parent = Some(parent);
        if forces_mount {
            child_node.force_mount_to_view();
        }
        Ok(())
    }

    pub fn remove_child_at(&mut self, parent: Tag, index: usize) -> UiResult<Tag> {
        let parent_node = self.node_mut(parent)?;
        let len = parent_node.child_count();
        if index >= len {
            return Err(ContractViolation::IndexOutOfRange { index, len }.into());
        }
        let child = parent_node.children.remove(index);
        self.node_mut(child)?.parent = None;
        Ok(child)
    }

    /// `tag` followed by every ancestor up to its root.
    pub fn ancestors_and_self(&self, tag: Tag) -> UiResult<Vec<Tag>> {
        let mut chain = vec![tag];
        let mut current = self.node(tag)?.parent();
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent)?.parent();
        }
        Ok(chain)
    }

    pub fn nearest_mounting_ancestor(&self, tag: Tag) -> UiResult<Option<Tag>> {
        let mut current = self.node(tag)?.parent();
        while let Some(parent) = current {
            let node = self.node(parent)?;
            if node.mounts_to_view() {
                return Ok(Some(parent));
            }
            current = node.parent();
        }
        Ok(None)
    }

    /// Nearest mounting descendants that already have a backing view, in
    /// document order. This is the child list of the node's native view.
    pub fn mounted_children(&self, tag: Tag) -> UiResult<Vec<Tag>> {
        let mut mounted = Vec::new();
        let mut stack: Vec<Tag> = self.children(tag)?.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            if node.mounts_to_view() {
                if node.is_backing_view_created() {
                    mounted.push(current);
                }
                continue;
            }
            stack.extend(node.children().iter().rev().copied());
        }
        Ok(mounted)
    }

    /// Children before parents, siblings in order.
    pub fn post_order(&self, tag: Tag) -> UiResult<Vec<Tag>> {
        let mut order = Vec::new();
        let mut stack = vec![(tag, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            stack.push((current, true));
            for &child in self.children(current)?.iter().rev() {
                stack.push((child, false));
            }
        }
        Ok(order)
    }

    /// Detaches `tag` from its parent and removes it with all descendants.
    /// Returns the removed tags in post-order.
    pub fn unregister_subtree(&mut self, tag: Tag) -> UiResult<Vec<Tag>> {
        let removed = self.post_order(tag)?;
        if let Some(parent) = self.node(tag)?.parent() {
            self.node_mut(parent)?.children.retain(|&child| child != tag);
        }
        for &node in &removed {
            self.nodes.remove(&node);
        }
        self.roots.shift_remove(&tag);
        Ok(removed)
    }

    pub fn dump_tree(&self, root: Option<Tag>) -> String {
        let mut output = String::new();
        match root {
            Some(root_tag) => self.dump_node(&mut output, root_tag, 0),
            None => output.push_str("(no root)\n"),
        }
        output
    }

    fn dump_node(&self, output: &mut String, tag: Tag, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.nodes.get(&tag) {
            Some(node) => {
                let mount = match (node.mounts_to_view(), node.is_backing_view_created()) {
                    (true, true) => " mounted",
                    (true, false) => " pending",
                    _ => "",
                };
                let _ = writeln!(
                    output,
                    "{indent}[{tag}] {} {:?}{mount}",
                    node.view_class(),
                    node.kind()
                );
                for &child in node.children() {
                    self.dump_node(output, child, depth + 1);
                }
            }
            None => {
                let _ = writeln!(output, "{indent}[{tag}] (missing)");
            }
        }
    }
}
