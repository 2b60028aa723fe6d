//! The command surface the bridge drives.
//!
//! Structural commands go to the edit merger, everything that needs a real
//! native view escalates the target through the state builder first, and
//! every native effect ends up in the operation queue until the next
//! hierarchy pass flushes it.

use flat_core::{
    resolve_responder_view, resolve_virtual_frame, CallbackId, ContractViolation, EditBatch,
    EditMerger, FlatConfig, HierarchyListener, LayoutRect, PropValue, Props, ShadowNode,
    ShadowTree, StateBuilder, Tag, UiError, UiResult, ViewOperation, ViewOperationConsumer,
    ViewOperationQueue,
};

use crate::layout::LayoutEngine;
use crate::managers::ViewManagerRegistry;

const ROOT_VIEW_CLASS: &str = "Root";

#[derive(Debug)]
pub struct UiImplementation {
    managers: ViewManagerRegistry,
    tree: ShadowTree,
    builder: StateBuilder,
    merger: EditMerger,
}

impl UiImplementation {
    pub fn new(managers: ViewManagerRegistry, config: FlatConfig) -> Self {
        Self {
            managers,
            tree: ShadowTree::new(),
            builder: StateBuilder::new(config),
            merger: EditMerger::new(),
        }
    }

    pub fn managers(&self) -> &ViewManagerRegistry {
        &self.managers
    }

    pub fn tree(&self) -> &ShadowTree {
        &self.tree
    }

    pub fn pending_operations(&self) -> &ViewOperationQueue {
        self.builder.pending_operations()
    }

    pub fn dump_tree(&self, root: Option<Tag>) -> String {
        self.tree.dump_tree(root)
    }

    /// Adds a root whose native view the platform already owns.
    pub fn register_root_view(&mut self, tag: Tag, width: f32, height: f32) -> UiResult<()> {
        self.tree.register_root(tag, ROOT_VIEW_CLASS, width, height)?;
        self.builder.register_root(&self.tree, tag)?;
        log::debug!("registered root view {tag} ({width}x{height})");
        Ok(())
    }

    pub fn remove_root_view(&mut self, tag: Tag) -> UiResult<()> {
        let removed = self.builder.remove_root_view(&mut self.tree, tag)?;
        log::debug!("removed root view {tag} with {} nodes", removed.len());
        Ok(())
    }

    pub fn create_view(
        &mut self,
        tag: Tag,
        class_name: &str,
        root_tag: Tag,
        props: &Props,
    ) -> UiResult<()> {
        if !self.tree.is_root(root_tag) {
            return Err(ContractViolation::NotARoot { tag: root_tag }.into());
        }
        let manager = self.managers.resolve(class_name)?;
        let mut node = ShadowNode::from_manager(tag, root_tag, manager.as_ref());
        node.merge_props(props);
        let mounts = node.mounts_to_view();
        self.tree.register(node)?;
        if mounts {
            self.builder
                .enqueue_create_or_update_view(&self.tree, tag, props)?;
        }
        Ok(())
    }

    pub fn update_view(&mut self, tag: Tag, class_name: &str, props: &Props) -> UiResult<()> {
        let node = self.tree.node_mut(tag)?;
        if node.view_class().as_ref() != class_name {
            log::warn!(
                "update for {tag} names class {class_name} but the node is a {}",
                node.view_class()
            );
        }
        node.merge_props(props);
        if node.mounts_to_view() {
            self.builder
                .enqueue_create_or_update_view(&self.tree, tag, props)?;
        }
        Ok(())
    }

    pub fn manage_children(&mut self, parent: Tag, batch: &EditBatch) -> UiResult<()> {
        self.merger
            .apply_child_edits(&mut self.tree, &mut self.builder, parent, batch)
    }

    pub fn set_children(&mut self, parent: Tag, children: &[Tag]) -> UiResult<()> {
        self.merger.set_children(&mut self.tree, parent, children)
    }

    pub fn set_layout(&mut self, tag: Tag, layout: LayoutRect) -> UiResult<()> {
        self.tree.set_layout(tag, layout)
    }

    /// Measures a node. Mounting nodes are measured natively; anything else
    /// is reported as a fraction of its nearest mounting ancestor.
    pub fn measure(&mut self, tag: Tag, callback: CallbackId) -> UiResult<()> {
        if self.tree.node(tag)?.mounts_to_view() {
            self.builder
                .ensure_backing_view_is_created(&mut self.tree, tag)?;
            self.enqueue(ViewOperation::Measure { tag, callback });
            return Ok(());
        }
        let frame = resolve_virtual_frame(&mut self.tree, &mut self.builder, tag)?;
        self.enqueue(ViewOperation::MeasureVirtualView {
            tag: frame.tag,
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            callback,
        });
        Ok(())
    }

    pub fn measure_in_window(&mut self, tag: Tag, callback: CallbackId) -> UiResult<()> {
        self.ensure_mounts_to_view_and_backing_view_is_created(tag)?;
        self.enqueue(ViewOperation::MeasureInWindow { tag, callback });
        Ok(())
    }

    pub fn find_subview_in(
        &mut self,
        tag: Tag,
        x: f32,
        y: f32,
        callback: CallbackId,
    ) -> UiResult<()> {
        self.ensure_mounts_to_view_and_backing_view_is_created(tag)?;
        self.enqueue(ViewOperation::FindSubviewIn {
            tag,
            x,
            y,
            callback,
        });
        Ok(())
    }

    /// When the target had no view yet, its pending subtree is materialized
    /// before the command so it never reaches an empty parent.
    pub fn dispatch_view_manager_command(
        &mut self,
        tag: Tag,
        command_id: u32,
        args: Vec<PropValue>,
    ) -> UiResult<()> {
        if self.ensure_mounts_to_view_and_backing_view_is_created(tag)? {
            self.builder.apply_updates(&mut self.tree, tag)?;
        }
        self.enqueue(ViewOperation::DispatchCommand {
            tag,
            command_id,
            args,
        });
        Ok(())
    }

    pub fn show_popup_menu(
        &mut self,
        tag: Tag,
        items: Vec<String>,
        callback: CallbackId,
    ) -> UiResult<()> {
        self.ensure_mounts_to_view_and_backing_view_is_created(tag)?;
        self.enqueue(ViewOperation::ShowPopupMenu {
            tag,
            items,
            callback,
        });
        Ok(())
    }

    pub fn send_accessibility_event(&mut self, tag: Tag, event_type: u32) -> UiResult<()> {
        self.ensure_mounts_to_view_and_backing_view_is_created(tag)?;
        self.enqueue(ViewOperation::SendAccessibilityEvent { tag, event_type });
        Ok(())
    }

    /// Routes touch ownership for `tag`, which may be virtual, to the native
    /// view that actually receives its touches.
    pub fn set_js_responder(&mut self, tag: Tag, block_native_responder: bool) -> UiResult<()> {
        let target = resolve_responder_view(&mut self.tree, &mut self.builder, tag)?;
        self.enqueue(ViewOperation::SetJsResponder {
            tag: target,
            initial_tag: tag,
            block_native_responder,
        });
        Ok(())
    }

    pub fn clear_js_responder(&mut self) {
        self.enqueue(ViewOperation::ClearJsResponder);
    }

    /// Lays out every root with `engine`, then runs the hierarchy pass.
    pub fn dispatch_view_updates(
        &mut self,
        engine: &mut dyn LayoutEngine,
        consumer: &mut dyn ViewOperationConsumer,
        listener: &mut dyn HierarchyListener,
    ) -> UiResult<usize> {
        if self.tree.is_poisoned() {
            return Err(UiError::TreePoisoned);
        }
        let roots: Vec<Tag> = self.tree.roots().collect();
        for root in roots {
            engine.calculate_layout(&mut self.tree, root)?;
        }
        self.update_view_hierarchy(consumer, listener)
    }

    /// Applies pending updates from every root down and flushes the queue.
    /// Whatever was enqueued before a failure is still flushed.
    pub fn update_view_hierarchy(
        &mut self,
        consumer: &mut dyn ViewOperationConsumer,
        listener: &mut dyn HierarchyListener,
    ) -> UiResult<usize> {
        if self.tree.is_poisoned() {
            return Err(UiError::TreePoisoned);
        }
        self.builder.before_update_view_hierarchy()?;
        let roots: Vec<Tag> = self.tree.roots().collect();
        let applied = roots
            .into_iter()
            .try_for_each(|root| self.builder.apply_updates(&mut self.tree, root));
        let flushed = self.builder.after_update_view_hierarchy(consumer, listener);
        log::debug!("hierarchy pass flushed {flushed} operations");
        applied.map(|()| flushed)
    }

    /// Returns whether anything changed: the node was promoted to mount to a
    /// view or its backing view was just created.
    fn ensure_mounts_to_view_and_backing_view_is_created(&mut self, tag: Tag) -> UiResult<bool> {
        let promoted = !self.tree.node(tag)?.mounts_to_view();
        let created = self
            .builder
            .ensure_backing_view_is_created(&mut self.tree, tag)?;
        Ok(promoted || created)
    }

    fn enqueue(&mut self, operation: ViewOperation) {
        self.builder.operations_queue().enqueue(operation);
    }
}
