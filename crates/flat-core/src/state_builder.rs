//! Mount state tracking.
//!
//! The builder decides, lazily, which shadow nodes get a native view and
//! records what was last sent for each of them so that the hierarchy pass only
//! enqueues operations for things that actually changed.

use crate::collections::map::HashMap;
use crate::config::FlatConfig;
use crate::error::{ContractViolation, UiError, UiResult};
use crate::node::LayoutRect;
use crate::operations::{ViewOperation, ViewOperationConsumer, ViewOperationQueue};
use crate::props::Props;
use crate::tree::ShadowTree;
use crate::Tag;

/// Notified once the queue of a hierarchy pass has been handed to the
/// consumer, so callbacks fire only after the native views exist.
pub trait HierarchyListener {
    fn on_layout(&mut self, tag: Tag, frame: LayoutRect);

    fn on_hierarchy_updated(&mut self, _flushed: usize) {}
}

/// Last state sent to the native side for one backing view.
#[derive(Debug, Clone, Default)]
struct MountSnapshot {
    props: Props,
    frame: Option<LayoutRect>,
    children: Vec<Tag>,
}

#[derive(Debug, Default)]
pub struct StateBuilder {
    config: FlatConfig,
    queue: ViewOperationQueue,
    snapshots: HashMap<Tag, MountSnapshot>,
    layout_events: Vec<(Tag, LayoutRect)>,
    /// Views dropped since the last flush, children before parents. Emitted
    /// after the pass has detached them from their native parents.
    pending_drops: Vec<(Tag, bool)>,
    updating: bool,
}

impl StateBuilder {
    pub fn new(config: FlatConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> FlatConfig {
        self.config
    }

    pub fn operations_queue(&mut self) -> &mut ViewOperationQueue {
        &mut self.queue
    }

    pub fn pending_operations(&self) -> &ViewOperationQueue {
        &self.queue
    }

    pub fn is_updating_view_hierarchy(&self) -> bool {
        self.updating
    }

    /// Tags whose drop will be emitted by the next flush.
    pub fn pending_drops(&self) -> impl Iterator<Item = Tag> + '_ {
        self.pending_drops.iter().map(|&(tag, _)| tag)
    }

    /// Starts tracking a root registered with the tree. Its native view is
    /// owned by the platform, so nothing is enqueued.
    pub fn register_root(&mut self, tree: &ShadowTree, root: Tag) -> UiResult<()> {
        if !tree.is_root(root) {
            return Err(ContractViolation::NotARoot { tag: root }.into());
        }
        let frame = tree.node(root)?.layout();
        self.snapshots.insert(
            root,
            MountSnapshot {
                frame: Some(frame),
                ..MountSnapshot::default()
            },
        );
        Ok(())
    }

    /// Makes sure `tag` has a backing view. Returns true only when this call
    /// created it.
    pub fn ensure_backing_view_is_created(
        &mut self,
        tree: &mut ShadowTree,
        tag: Tag,
    ) -> UiResult<bool> {
        let node = tree.node(tag)?;
        if node.is_virtual() {
            return Err(UiError::VirtualNode { tag });
        }
        if node.is_backing_view_created() {
            self.update_view_if_needed(tree, tag)?;
            return Ok(false);
        }
        let ancestor = tree
            .nearest_mounting_ancestor(tag)?
            .ok_or(UiError::NoMountingAncestor { tag })?;
        let promoted = tree.node_mut(tag)?.force_mount_to_view();
        if let Err(err) = self.ensure_backing_view_is_created(tree, ancestor) {
            if promoted {
                tree.node_mut(tag)?.undo_forced_mount();
            }
            return Err(err);
        }
        if promoted {
            log::debug!("node {tag} forced to mount to a view");
        }
        // Materializing the ancestor may already have visited this node.
        let (dx, dy) = offset_to_mounting_ancestor(tree, tag)?;
        self.visit(tree, tag, dx, dy, Some(ancestor))?;
        self.sync_mounted_children(tree, ancestor)?;
        Ok(true)
    }

    /// Sends changed properties of a mounting node. A node whose backing view
    /// does not exist yet records nothing: its create carries the full
    /// properties once it happens. Returns whether an update was enqueued.
    pub fn enqueue_create_or_update_view(
        &mut self,
        tree: &ShadowTree,
        tag: Tag,
        props_delta: &Props,
    ) -> UiResult<bool> {
        let node = tree.node(tag)?;
        if !node.mounts_to_view() {
            return Err(ContractViolation::NotMountingToView { tag }.into());
        }
        if !node.is_backing_view_created() {
            return Ok(false);
        }
        let snapshot = self.snapshots.entry(tag).or_default();
        let changed = snapshot.props.changed_entries(props_delta);
        if changed.is_empty() {
            return Ok(false);
        }
        snapshot.props.merge(&changed);
        self.queue.enqueue(ViewOperation::UpdateProperties {
            tag,
            view_class: node.view_class().clone(),
            props: changed,
        });
        Ok(true)
    }

    /// Schedules the drop of every backing view in the subtree of `tag`,
    /// children before parents, then unregisters the whole subtree from the
    /// tree. The drops reach the consumer at the end of the next hierarchy
    /// pass, after the parent's mounted children were updated. Returns the
    /// unregistered tags.
    pub fn drop_view(&mut self, tree: &mut ShadowTree, tag: Tag) -> UiResult<Vec<Tag>> {
        for node_tag in tree.post_order(tag)? {
            if tree.node(node_tag)?.is_backing_view_created() {
                self.drop_backing_view(node_tag, tree.is_root(node_tag));
            }
        }
        tree.unregister_subtree(tag)
    }

    /// Removes a root view: drops its descendants' views, emits the root
    /// removal and forgets the subtree.
    pub fn remove_root_view(&mut self, tree: &mut ShadowTree, root: Tag) -> UiResult<Vec<Tag>> {
        if !tree.is_root(root) {
            return Err(ContractViolation::NotARoot { tag: root }.into());
        }
        self.drop_view(tree, root)
    }

    /// Opens a hierarchy pass. Passes do not nest.
    pub fn before_update_view_hierarchy(&mut self) -> UiResult<()> {
        if self.updating {
            return Err(UiError::HierarchyPassInProgress);
        }
        self.updating = true;
        Ok(())
    }

    /// Enqueues the pending drops, flushes the queue to `consumer` in
    /// submission order, then reports frame changes to `listener`. Returns
    /// the number of flushed operations.
    pub fn after_update_view_hierarchy(
        &mut self,
        consumer: &mut dyn ViewOperationConsumer,
        listener: &mut dyn HierarchyListener,
    ) -> usize {
        for (tag, is_root) in std::mem::take(&mut self.pending_drops) {
            self.queue.enqueue(if is_root {
                ViewOperation::RemoveRootView { tag }
            } else {
                ViewOperation::DropView { tag }
            });
        }
        let flushed = self.queue.flush_to(consumer);
        self.updating = false;
        for (tag, frame) in std::mem::take(&mut self.layout_events) {
            listener.on_layout(tag, frame);
        }
        listener.on_hierarchy_updated(flushed);
        flushed
    }

    /// Enqueues, right now, every pending create and frame/children update in
    /// the subtree of `tag`.
    pub fn apply_updates(&mut self, tree: &mut ShadowTree, tag: Tag) -> UiResult<()> {
        if tree.is_root(tag) {
            return self.visit(tree, tag, 0.0, 0.0, None);
        }
        let ancestor = tree
            .nearest_mounting_ancestor(tag)?
            .ok_or(UiError::NoMountingAncestor { tag })?;
        if !tree.node(ancestor)?.is_backing_view_created() {
            self.ensure_backing_view_is_created(tree, ancestor)?;
        }
        let (dx, dy) = offset_to_mounting_ancestor(tree, tag)?;
        self.visit(tree, tag, dx, dy, Some(ancestor))?;
        self.sync_mounted_children(tree, ancestor)
    }

    fn update_view_if_needed(&mut self, tree: &ShadowTree, tag: Tag) -> UiResult<()> {
        if !tree.is_root(tag) {
            if let Some(ancestor) = tree.nearest_mounting_ancestor(tag)? {
                let (dx, dy) = offset_to_mounting_ancestor(tree, tag)?;
                let frame = tree.node(tag)?.layout().offset(dx, dy);
                self.sync_frame(tag, ancestor, frame);
            }
        }
        self.sync_mounted_children(tree, tag)
    }

    /// Pre-order creates, post-order children attachment. `dx`/`dy` is the
    /// offset of the parent shadow node inside the native parent.
    fn visit(
        &mut self,
        tree: &mut ShadowTree,
        tag: Tag,
        dx: f32,
        dy: f32,
        mounting_parent: Option<Tag>,
    ) -> UiResult<()> {
        let (mounts, layout, children) = {
            let node = tree.node(tag)?;
            (node.mounts_to_view(), node.layout(), node.children().to_vec())
        };
        let (child_dx, child_dy, child_parent) = if mounts {
            self.create_view_if_needed(tree, tag)?;
            if let Some(parent) = mounting_parent {
                self.sync_frame(tag, parent, layout.offset(dx, dy));
            }
            (0.0, 0.0, Some(tag))
        } else {
            (dx + layout.x, dy + layout.y, mounting_parent)
        };
        for child in children {
            self.visit(tree, child, child_dx, child_dy, child_parent)?;
        }
        if mounts {
            self.sync_mounted_children(tree, tag)?;
        }
        Ok(())
    }

    fn create_view_if_needed(&mut self, tree: &mut ShadowTree, tag: Tag) -> UiResult<()> {
        let node = tree.node_mut(tag)?;
        if node.is_backing_view_created() {
            return Ok(());
        }
        node.backing_view_created = true;
        let props = node.props().clone();
        self.queue.enqueue(ViewOperation::CreateView {
            tag,
            root_tag: node.root_tag(),
            view_class: node.view_class().clone(),
            props: props.clone(),
        });
        self.snapshots.insert(
            tag,
            MountSnapshot {
                props,
                ..MountSnapshot::default()
            },
        );
        Ok(())
    }

    fn sync_frame(&mut self, tag: Tag, parent: Tag, frame: LayoutRect) {
        let snapshot = self.snapshots.entry(tag).or_default();
        if snapshot.frame == Some(frame) {
            return;
        }
        snapshot.frame = Some(frame);
        self.queue
            .enqueue(ViewOperation::UpdateLayout { tag, parent, frame });
        self.layout_events.push((tag, frame));
    }

    fn sync_mounted_children(&mut self, tree: &ShadowTree, tag: Tag) -> UiResult<()> {
        let mounted = tree.mounted_children(tag)?;
        let snapshot = self.snapshots.entry(tag).or_default();
        if snapshot.children == mounted {
            return Ok(());
        }
        snapshot.children = mounted.clone();
        self.queue.enqueue(ViewOperation::UpdateMountedChildren {
            tag,
            children: mounted,
        });
        Ok(())
    }

    fn drop_backing_view(&mut self, tag: Tag, is_root: bool) {
        if self.config.prune_dropped_operations {
            let pruned = self.queue.prune_for(tag);
            if pruned > 0 {
                log::debug!("pruned {pruned} pending operations for dropped view {tag}");
            }
        }
        if self.config.log_dropped_views {
            log::info!("dropping view {tag}");
        }
        self.snapshots.remove(&tag);
        self.layout_events.retain(|&(event_tag, _)| event_tag != tag);
        self.pending_drops.push((tag, is_root));
    }
}

/// Sum of the positions of the non-mounting ancestors between `tag` and its
/// nearest mounting ancestor.
fn offset_to_mounting_ancestor(tree: &ShadowTree, tag: Tag) -> UiResult<(f32, f32)> {
    let (mut dx, mut dy) = (0.0, 0.0);
    let mut current = tree.node(tag)?.parent();
    while let Some(parent) = current {
        let node = tree.node(parent)?;
        if node.mounts_to_view() {
            break;
        }
        let layout = node.layout();
        dx += layout.x;
        dy += layout.y;
        current = node.parent();
    }
    Ok((dx, dy))
}
