use crate::Tag;

/// Malformed input from the bridge. Always fatal for the batch that carried it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("moveFrom has {move_from} entries but moveTo has {move_to}")]
    MismatchedMoveArrays { move_from: usize, move_to: usize },
    #[error("addChildTags has {tags} entries but addAtIndices has {indices}")]
    MismatchedAddArrays { tags: usize, indices: usize },
    #[error("invariant failure, needs sorting: removing {index} after {previous}")]
    UnsortedRemoval { index: usize, previous: usize },
    #[error("invariant failure, needs sorting: inserting {index} after {previous}")]
    UnsortedInsertion { index: usize, previous: usize },
    #[error("index {index} appears in more than one edit stream")]
    IndexCollision { index: usize },
    #[error("index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("child {child} is already attached to {parent}")]
    ChildAlreadyAttached { child: Tag, parent: Tag },
    #[error("node {tag} cannot become a child of itself or its descendant {parent}")]
    CyclicInsertion { tag: Tag, parent: Tag },
    #[error("no detached child is waiting for move target {index}")]
    MissingMovedChild { index: usize },
    #[error("no view manager registered for class {name:?}")]
    UnknownViewClass { name: String },
    #[error("node {tag} does not mount to a view")]
    NotMountingToView { tag: Tag },
    #[error("node {tag} is not a root view")]
    NotARoot { tag: Tag },
}

/// Errors surfaced by the shadow tree and the mount state builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UiError {
    #[error("node {tag} missing")]
    Missing { tag: Tag },
    #[error("node {tag} already registered")]
    DuplicateTag { tag: Tag },
    #[error("node {tag} is virtual and never mounts to a view")]
    VirtualNode { tag: Tag },
    #[error("node {tag} has no view-mounting ancestor")]
    NoMountingAncestor { tag: Tag },
    #[error("a hierarchy pass is already in progress")]
    HierarchyPassInProgress,
    #[error("shadow tree was left inconsistent by a failed batch; rebuild required")]
    TreePoisoned,
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

pub type UiResult<T> = Result<T, UiError>;
