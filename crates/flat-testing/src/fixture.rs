use flat_core::{
    EditBatch, EditMerger, FlatConfig, HierarchyListener, LayoutRect, MountKind, ShadowNode,
    ShadowTree, StateBuilder, Tag, UiResult,
};

use crate::recording::RecordingViewHierarchy;

/// Records layout notifications delivered after a flush.
#[derive(Debug, Default)]
pub struct LayoutLog {
    pub events: Vec<(Tag, LayoutRect)>,
    pub passes: Vec<usize>,
}

impl HierarchyListener for LayoutLog {
    fn on_layout(&mut self, tag: Tag, frame: LayoutRect) {
        self.events.push((tag, frame));
    }

    fn on_hierarchy_updated(&mut self, flushed: usize) {
        self.passes.push(flushed);
    }
}

/// A shadow tree with one root, its state builder and an edit merger.
pub struct TreeFixture {
    pub tree: ShadowTree,
    pub builder: StateBuilder,
    pub merger: EditMerger,
    pub root: Tag,
}

impl TreeFixture {
    pub const ROOT_SIZE: (f32, f32) = (400.0, 800.0);

    pub fn new(root: Tag) -> Self {
        Self::with_config(root, FlatConfig::default())
    }

    pub fn with_config(root: Tag, config: FlatConfig) -> Self {
        let mut tree = ShadowTree::new();
        let (width, height) = Self::ROOT_SIZE;
        tree.register_root(root, "Root", width, height)
            .expect("register fixture root");
        let mut builder = StateBuilder::new(config);
        builder
            .register_root(&tree, root)
            .expect("track fixture root");
        Self {
            tree,
            builder,
            merger: EditMerger::new(),
            root,
        }
    }

    /// Registers a detached node.
    pub fn node(&mut self, tag: Tag, kind: MountKind) -> &mut Self {
        self.tree
            .register(ShadowNode::new(tag, self.root, "View", kind))
            .expect("register fixture node");
        self
    }

    /// Registers a node and appends it to `parent`.
    pub fn child(&mut self, parent: Tag, tag: Tag, kind: MountKind) -> &mut Self {
        self.node(tag, kind);
        let index = self.children(parent).len();
        self.tree
            .insert_child(parent, tag, index)
            .expect("append fixture node");
        self
    }

    pub fn layout(&mut self, tag: Tag, layout: LayoutRect) -> &mut Self {
        self.tree
            .set_layout(tag, layout)
            .expect("set fixture layout");
        self
    }

    pub fn children(&self, parent: Tag) -> Vec<Tag> {
        self.tree
            .children(parent)
            .map(<[Tag]>::to_vec)
            .unwrap_or_default()
    }

    pub fn manage(&mut self, parent: Tag, batch: &EditBatch) -> UiResult<()> {
        self.merger
            .apply_child_edits(&mut self.tree, &mut self.builder, parent, batch)
    }

    /// Runs one full hierarchy pass: updates from every root down, then a
    /// flush into `hierarchy`.
    pub fn update_hierarchy(
        &mut self,
        hierarchy: &mut RecordingViewHierarchy,
        listener: &mut LayoutLog,
    ) -> UiResult<usize> {
        self.builder.before_update_view_hierarchy()?;
        let roots: Vec<Tag> = self.tree.roots().collect();
        let applied = roots
            .into_iter()
            .try_for_each(|root| self.builder.apply_updates(&mut self.tree, root));
        let flushed = self.builder.after_update_view_hierarchy(hierarchy, listener);
        applied.map(|()| flushed)
    }
}
