//! Applies one batch of child edits to a parent shadow node.
//!
//! moveFrom and removeFrom name positions in the child list before any
//! mutation; moveTo and addAtIndices name positions after all of them. The
//! merger walks the first two streams together in descending order, detaching
//! children, then the last two together in ascending order, inserting them.
//! Each pass visits every affected index exactly once.

use crate::collections::map::HashSet;
use crate::error::{ContractViolation, UiResult};
use crate::move_proxy::MoveProxy;
use crate::state_builder::StateBuilder;
use crate::tree::ShadowTree;
use crate::Tag;

/// The five index arrays of one `manage_children` command. None of them has
/// to be sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBatch {
    pub move_from: Vec<usize>,
    pub move_to: Vec<usize>,
    pub add_child_tags: Vec<Tag>,
    pub add_at_indices: Vec<usize>,
    pub remove_from: Vec<usize>,
}

impl EditBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moves(mut self, from: impl Into<Vec<usize>>, to: impl Into<Vec<usize>>) -> Self {
        self.move_from = from.into();
        self.move_to = to.into();
        self
    }

    pub fn adds(mut self, tags: impl Into<Vec<Tag>>, at: impl Into<Vec<usize>>) -> Self {
        self.add_child_tags = tags.into();
        self.add_at_indices = at.into();
        self
    }

    pub fn removes(mut self, from: impl Into<Vec<usize>>) -> Self {
        self.remove_from = from.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.move_from.is_empty()
            && self.move_to.is_empty()
            && self.add_child_tags.is_empty()
            && self.add_at_indices.is_empty()
            && self.remove_from.is_empty()
    }
}

/// Keeps its scratch buffers between batches.
#[derive(Debug, Default)]
pub struct EditMerger {
    move_proxy: MoveProxy,
    removals: Vec<usize>,
    additions: Vec<(usize, Tag)>,
}

impl EditMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `batch` to the children of `parent`. Removed children are
    /// destroyed through `builder` (views dropped first, children before
    /// parents).
    ///
    /// A malformed batch is rejected before the tree is touched. Should a
    /// pass still fail midway, the tree is poisoned and refuses further
    /// edits until it is rebuilt.
    pub fn apply_child_edits(
        &mut self,
        tree: &mut ShadowTree,
        builder: &mut StateBuilder,
        parent: Tag,
        batch: &EditBatch,
    ) -> UiResult<()> {
        tree.ensure_consistent()?;
        log::debug!(
            "manage_children parent={parent} moves={} adds={} removes={}",
            batch.move_from.len(),
            batch.add_child_tags.len(),
            batch.remove_from.len()
        );
        let result = self.prepare(tree, parent, batch).and_then(|()| {
            let applied = self
                .remove_children(tree, builder, parent)
                .and_then(|()| self.add_children(tree, parent));
            if applied.is_err() {
                tree.poison();
            }
            applied
        });
        self.move_proxy.clear();
        self.removals.clear();
        self.additions.clear();
        if let Err(err) = &result {
            log::error!("rejected child edits for {parent}: {err}");
        }
        result
    }

    /// Inserts `children[i]` at index `i` for every `i`, in order.
    pub fn set_children(
        &mut self,
        tree: &mut ShadowTree,
        parent: Tag,
        children: &[Tag],
    ) -> UiResult<()> {
        tree.ensure_consistent()?;
        tree.node(parent)?;
        let mut seen: HashSet<Tag> = HashSet::default();
        for &child in children {
            check_insertable(tree, parent, child)?;
            if !seen.insert(child) {
                return Err(ContractViolation::ChildAlreadyAttached { child, parent }.into());
            }
        }
        let mut previous = None;
        for (index, &child) in children.iter().enumerate() {
            add_child_at(tree, parent, child, index, previous).map_err(|err| {
                tree.poison();
                err
            })?;
            previous = Some(index);
        }
        Ok(())
    }

    /// Validates the whole batch against the current child list and fills
    /// the sorted scratch buffers. Does not mutate the tree.
    fn prepare(&mut self, tree: &ShadowTree, parent: Tag, batch: &EditBatch) -> UiResult<()> {
        let child_count = tree.node(parent)?.child_count();

        self.move_proxy.setup(&batch.move_from, &batch.move_to)?;

        self.removals.clear();
        self.removals.extend_from_slice(&batch.remove_from);
        self.removals.sort_unstable();

        let mut detached: HashSet<usize> = HashSet::default();
        for &index in batch.move_from.iter().chain(&self.removals) {
            if index >= child_count {
                return Err(ContractViolation::IndexOutOfRange {
                    index,
                    len: child_count,
                }
                .into());
            }
            if !detached.insert(index) {
                return Err(ContractViolation::IndexCollision { index }.into());
            }
        }

        if batch.add_child_tags.len() != batch.add_at_indices.len() {
            return Err(ContractViolation::MismatchedAddArrays {
                tags: batch.add_child_tags.len(),
                indices: batch.add_at_indices.len(),
            }
            .into());
        }
        self.additions.clear();
        self.additions.extend(
            batch
                .add_at_indices
                .iter()
                .copied()
                .zip(batch.add_child_tags.iter().copied()),
        );
        self.additions.sort_unstable_by_key(|&(index, _)| index);

        let final_len = child_count - self.removals.len() + self.additions.len();
        let mut inserted: HashSet<usize> = HashSet::default();
        for &index in batch.move_to.iter().chain(&batch.add_at_indices) {
            if index >= final_len {
                return Err(ContractViolation::IndexOutOfRange {
                    index,
                    len: final_len,
                }
                .into());
            }
            if !inserted.insert(index) {
                return Err(ContractViolation::IndexCollision { index }.into());
            }
        }

        let mut added: HashSet<Tag> = HashSet::default();
        for &(_, child) in &self.additions {
            check_insertable(tree, parent, child)?;
            if !added.insert(child) {
                return Err(ContractViolation::ChildAlreadyAttached { child, parent }.into());
            }
        }
        Ok(())
    }

    /// Descending merge of moveFrom and removeFrom. An exhausted stream reads
    /// as `None`, which orders below every index.
    fn remove_children(
        &mut self,
        tree: &mut ShadowTree,
        builder: &mut StateBuilder,
        parent: Tag,
    ) -> UiResult<()> {
        let mut previous: Option<usize> = None;
        let mut moves_left = self.move_proxy.len();
        let mut removals_left = self.removals.len();
        loop {
            let move_index = moves_left
                .checked_sub(1)
                .map(|entry| self.move_proxy.move_from(entry));
            let remove_index = removals_left
                .checked_sub(1)
                .map(|entry| self.removals[entry]);

            match (move_index, remove_index) {
                (None, None) => break,
                (Some(index), _) if move_index > remove_index => {
                    let child = remove_child_at(tree, parent, index, previous)?;
                    moves_left -= 1;
                    self.move_proxy.park(moves_left, child);
                    previous = Some(index);
                }
                (_, Some(index)) if remove_index > move_index => {
                    let child = remove_child_at(tree, parent, index, previous)?;
                    builder.drop_view(tree, child)?;
                    removals_left -= 1;
                    previous = Some(index);
                }
                (Some(index), _) | (None, Some(index)) => {
                    return Err(ContractViolation::IndexCollision { index }.into());
                }
            }
        }
        Ok(())
    }

    /// Ascending merge of addAtIndices and moveTo. An exhausted stream reads
    /// as `usize::MAX`.
    fn add_children(&mut self, tree: &mut ShadowTree, parent: Tag) -> UiResult<()> {
        let mut previous: Option<usize> = None;
        let mut next_add = 0;
        let mut next_move = 0;
        loop {
            let add_index = self
                .additions
                .get(next_add)
                .map_or(usize::MAX, |&(index, _)| index);
            let move_index = if next_move < self.move_proxy.len() {
                self.move_proxy.move_to(next_move)
            } else {
                usize::MAX
            };

            if add_index < move_index {
                let child = self.additions[next_add].1;
                add_child_at(tree, parent, child, add_index, previous)?;
                previous = Some(add_index);
                next_add += 1;
            } else if move_index < add_index {
                let child = self
                    .move_proxy
                    .take_parked(next_move)
                    .ok_or(ContractViolation::MissingMovedChild { index: move_index })?;
                add_child_at(tree, parent, child, move_index, previous)?;
                previous = Some(move_index);
                next_move += 1;
            } else if add_index == usize::MAX {
                break;
            } else {
                return Err(ContractViolation::IndexCollision { index: add_index }.into());
            }
        }
        Ok(())
    }
}

fn check_insertable(tree: &ShadowTree, parent: Tag, child: Tag) -> UiResult<()> {
    if let Some(existing) = tree.node(child)?.parent() {
        return Err(ContractViolation::ChildAlreadyAttached {
            child,
            parent: existing,
        }
        .into());
    }
    if tree.is_root(child) || tree.ancestors_and_self(parent)?.contains(&child) {
        return Err(ContractViolation::CyclicInsertion { tag: child, parent }.into());
    }
    Ok(())
}

/// Detaches a child, checking that indices arrive strictly descending.
fn remove_child_at(
    tree: &mut ShadowTree,
    parent: Tag,
    index: usize,
    previous: Option<usize>,
) -> UiResult<Tag> {
    if let Some(previous) = previous.filter(|&previous| index >= previous) {
        return Err(ContractViolation::UnsortedRemoval { index, previous }.into());
    }
    tree.remove_child_at(parent, index)
}

/// Inserts a child, checking that indices arrive strictly ascending.
fn add_child_at(
    tree: &mut ShadowTree,
    parent: Tag,
    child: Tag,
    index: usize,
    previous: Option<usize>,
) -> UiResult<()> {
    if let Some(previous) = previous.filter(|&previous| index <= previous) {
        return Err(ContractViolation::UnsortedInsertion { index, previous }.into());
    }
    tree.insert_child(parent, child, index)
}
