//! Native view operations and the ordered queue that carries them from the
//! layout context to the UI context.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::node::LayoutRect;
use crate::props::{PropValue, Props};
use crate::Tag;

/// Opaque token the bridge uses to route a result back to script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum ViewOperation {
    CreateView {
        tag: Tag,
        root_tag: Tag,
        view_class: Arc<str>,
        props: Props,
    },
    UpdateProperties {
        tag: Tag,
        view_class: Arc<str>,
        props: Props,
    },
    /// Frame relative to the native parent `parent`.
    UpdateLayout {
        tag: Tag,
        parent: Tag,
        frame: LayoutRect,
    },
    /// Full replacement of the native child list.
    UpdateMountedChildren {
        tag: Tag,
        children: Vec<Tag>,
    },
    DropView {
        tag: Tag,
    },
    RemoveRootView {
        tag: Tag,
    },
    SetJsResponder {
        tag: Tag,
        initial_tag: Tag,
        block_native_responder: bool,
    },
    ClearJsResponder,
    Measure {
        tag: Tag,
        callback: CallbackId,
    },
    /// Fractions of the width/height of the mounted view `tag`.
    MeasureVirtualView {
        tag: Tag,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        callback: CallbackId,
    },
    MeasureInWindow {
        tag: Tag,
        callback: CallbackId,
    },
    FindSubviewIn {
        tag: Tag,
        x: f32,
        y: f32,
        callback: CallbackId,
    },
    DispatchCommand {
        tag: Tag,
        command_id: u32,
        args: Vec<PropValue>,
    },
    ShowPopupMenu {
        tag: Tag,
        items: Vec<String>,
        callback: CallbackId,
    },
    SendAccessibilityEvent {
        tag: Tag,
        event_type: u32,
    },
}

impl ViewOperation {
    pub fn tag(&self) -> Option<Tag> {
        match self {
            ViewOperation::CreateView { tag, .. }
            | ViewOperation::UpdateProperties { tag, .. }
            | ViewOperation::UpdateLayout { tag, .. }
            | ViewOperation::UpdateMountedChildren { tag, .. }
            | ViewOperation::DropView { tag }
            | ViewOperation::RemoveRootView { tag }
            | ViewOperation::SetJsResponder { tag, .. }
            | ViewOperation::Measure { tag, .. }
            | ViewOperation::MeasureVirtualView { tag, .. }
            | ViewOperation::MeasureInWindow { tag, .. }
            | ViewOperation::FindSubviewIn { tag, .. }
            | ViewOperation::DispatchCommand { tag, .. }
            | ViewOperation::ShowPopupMenu { tag, .. }
            | ViewOperation::SendAccessibilityEvent { tag, .. } => Some(*tag),
            ViewOperation::ClearJsResponder => None,
        }
    }

    fn is_create(&self) -> bool {
        matches!(self, ViewOperation::CreateView { .. })
    }
}

/// Executes operations on the UI context. Operations arrive in submission
/// order; `batch_flushed` closes one hierarchy-update pass.
pub trait ViewOperationConsumer {
    fn execute(&mut self, operation: ViewOperation);

    fn batch_flushed(&mut self) {}
}

#[derive(Debug, Default)]
pub struct ViewOperationQueue {
    operations: VecDeque<ViewOperation>,
}

impl ViewOperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, operation: ViewOperation) {
        log::trace!("enqueue {operation:?}");
        self.operations.push_back(operation);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ViewOperation> {
        self.operations.iter()
    }

    /// Removes pending operations addressed to `tag`, except its create.
    /// Surviving operations keep their order.
    pub fn prune_for(&mut self, tag: Tag) -> usize {
        let before = self.operations.len();
        self.operations
            .retain(|operation| operation.is_create() || operation.tag() != Some(tag));
        before - self.operations.len()
    }

    pub fn drain(&mut self) -> Vec<ViewOperation> {
        self.operations.drain(..).collect()
    }

    /// Hands every pending operation to `consumer` in submission order.
    pub fn flush_to(&mut self, consumer: &mut dyn ViewOperationConsumer) -> usize {
        let count = self.operations.len();
        while let Some(operation) = self.operations.pop_front() {
            consumer.execute(operation);
        }
        consumer.batch_flushed();
        count
    }
}
