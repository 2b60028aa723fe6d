use crate::error::{ContractViolation, UiResult};
use crate::Tag;

/// Pairs moveFrom with moveTo so the removal pass can walk moveFrom in
/// descending order while the add pass walks moveTo in ascending order.
///
/// Entries are sorted by moveFrom. A detached child is parked in the slot of
/// its moveTo rank, so the add pass reads children back in moveTo order.
#[derive(Debug, Default)]
pub(crate) struct MoveProxy {
    move_from: Vec<usize>,
    move_to_rank: Vec<usize>,
    move_to: Vec<usize>,
    parked: Vec<Option<Tag>>,
}

impl MoveProxy {
    pub(crate) fn setup(&mut self, move_from: &[usize], move_to: &[usize]) -> UiResult<()> {
        if move_from.len() != move_to.len() {
            return Err(ContractViolation::MismatchedMoveArrays {
                move_from: move_from.len(),
                move_to: move_to.len(),
            }
            .into());
        }
        let mut pairs: Vec<(usize, usize)> = move_from
            .iter()
            .copied()
            .zip(move_to.iter().copied())
            .collect();
        pairs.sort_unstable_by_key(|&(from, _)| from);

        let mut by_target: Vec<usize> = (0..pairs.len()).collect();
        by_target.sort_unstable_by_key(|&entry| pairs[entry].1);
        for window in by_target.windows(2) {
            let index = pairs[window[1]].1;
            if pairs[window[0]].1 == index {
                return Err(ContractViolation::IndexCollision { index }.into());
            }
        }

        self.move_from.clear();
        self.move_from.extend(pairs.iter().map(|&(from, _)| from));
        self.move_to.clear();
        self.move_to.extend(by_target.iter().map(|&entry| pairs[entry].1));
        self.move_to_rank.clear();
        self.move_to_rank.resize(pairs.len(), 0);
        for (rank, &entry) in by_target.iter().enumerate() {
            self.move_to_rank[entry] = rank;
        }
        self.parked.clear();
        self.parked.resize(pairs.len(), None);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.move_from.len()
    }

    /// moveFrom value of the `entry`-th smallest moveFrom.
    pub(crate) fn move_from(&self, entry: usize) -> usize {
        self.move_from[entry]
    }

    /// `rank`-th smallest moveTo value.
    pub(crate) fn move_to(&self, rank: usize) -> usize {
        self.move_to[rank]
    }

    pub(crate) fn park(&mut self, entry: usize, child: Tag) {
        self.parked[self.move_to_rank[entry]] = Some(child);
    }

    pub(crate) fn take_parked(&mut self, rank: usize) -> Option<Tag> {
        self.parked[rank].take()
    }

    pub(crate) fn clear(&mut self) {
        self.move_from.clear();
        self.move_to.clear();
        self.move_to_rank.clear();
        self.parked.clear();
    }
}
