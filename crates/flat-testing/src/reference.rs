use flat_core::{EditBatch, Tag};

/// Straightforward rendition of `manage_children`: detach every moved or
/// removed index from the highest down, then insert moved and added children
/// from the lowest target index up. Assumes the batch is valid.
pub fn reference_manage_children(children: &[Tag], batch: &EditBatch) -> Vec<Tag> {
    let mut list = children.to_vec();

    let mut detached: Vec<usize> = batch
        .move_from
        .iter()
        .chain(&batch.remove_from)
        .copied()
        .collect();
    detached.sort_unstable_by(|a, b| b.cmp(a));
    for index in detached {
        list.remove(index);
    }

    let mut inserted: Vec<(usize, Tag)> = batch
        .move_to
        .iter()
        .zip(&batch.move_from)
        .map(|(&to, &from)| (to, children[from]))
        .chain(
            batch
                .add_at_indices
                .iter()
                .copied()
                .zip(batch.add_child_tags.iter().copied()),
        )
        .collect();
    inserted.sort_unstable_by_key(|&(index, _)| index);
    for (index, tag) in inserted {
        list.insert(index, tag);
    }
    list
}
