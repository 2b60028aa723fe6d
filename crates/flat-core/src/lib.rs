#![doc = r"Shadow tree reconciliation and lazy native view mounting for Flat-RS."]

pub mod collections;
pub mod config;
pub mod coordinates;
pub mod edit_merger;
pub mod error;
mod move_proxy;
pub mod node;
pub mod operations;
pub mod props;
pub mod state_builder;
pub mod tree;

pub use config::FlatConfig;
pub use coordinates::{resolve_responder_view, resolve_virtual_frame, VirtualFrame};
pub use edit_merger::{EditBatch, EditMerger};
pub use error::{ContractViolation, UiError, UiResult};
pub use node::{LayoutRect, MountKind, ShadowNode, ViewManager};
pub use operations::{CallbackId, ViewOperation, ViewOperationConsumer, ViewOperationQueue};
pub use props::{PropValue, Props};
pub use state_builder::{HierarchyListener, StateBuilder};
pub use tree::ShadowTree;

/// Identity of a shadow node, assigned by the scripting side.
pub type Tag = u32;
