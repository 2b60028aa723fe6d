use flat_core::{ShadowTree, Tag, UiResult};

/// Computes frames for one root's subtree before the hierarchy pass reads
/// them. Frames are written with [`ShadowTree::set_layout`] and are relative
/// to the parent shadow node.
pub trait LayoutEngine {
    fn calculate_layout(&mut self, tree: &mut ShadowTree, root: Tag) -> UiResult<()>;
}

impl<F> LayoutEngine for F
where
    F: FnMut(&mut ShadowTree, Tag) -> UiResult<()>,
{
    fn calculate_layout(&mut self, tree: &mut ShadowTree, root: Tag) -> UiResult<()> {
        self(tree, root)
    }
}
