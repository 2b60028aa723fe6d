use flat_core::{
    resolve_responder_view, resolve_virtual_frame, CallbackId, ContractViolation, EditBatch,
    FlatConfig, LayoutRect, MountKind, ShadowNode, Tag, UiError, ViewOperation,
};
use flat_testing::{LayoutLog, RecordingViewHierarchy, TreeFixture};
use proptest::prelude::*;

const ROOT: Tag = 1;

fn pass(fixture: &mut TreeFixture, hierarchy: &mut RecordingViewHierarchy) -> LayoutLog {
    let mut listener = LayoutLog::default();
    fixture
        .update_hierarchy(hierarchy, &mut listener)
        .expect("hierarchy pass");
    hierarchy.assert_consistent();
    listener
}

#[test]
fn removed_subtree_drops_children_before_parents() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::ViewMounting)
        .child(10, 11, MountKind::LayoutOnly)
        .child(11, 12, MountKind::ViewMounting)
        .child(12, 13, MountKind::ViewMounting);
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    pass(&mut fixture, &mut hierarchy);
    assert_eq!(hierarchy.created_tags(), vec![10, 12, 13]);
    assert_eq!(hierarchy.children_of(10), vec![12]);
    hierarchy.take_operations();

    fixture
        .manage(ROOT, &EditBatch::new().removes([0]))
        .expect("remove subtree");
    pass(&mut fixture, &mut hierarchy);

    assert_eq!(hierarchy.dropped_tags(), vec![13, 12, 10]);
    assert!(hierarchy.children_of(ROOT).is_empty());
    for tag in [10, 11, 12, 13] {
        assert!(!fixture.tree.contains(tag));
        assert!(!hierarchy.has_view(tag));
    }
}

#[test]
fn drops_follow_the_parent_detaching_the_view() {
    let mut fixture = TreeFixture::new(ROOT);
    for tag in [10, 11, 12] {
        fixture.child(ROOT, tag, MountKind::ViewMounting);
    }
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    pass(&mut fixture, &mut hierarchy);
    hierarchy.take_operations();

    fixture
        .manage(ROOT, &EditBatch::new().removes([1]))
        .expect("remove middle child");
    pass(&mut fixture, &mut hierarchy);

    assert_eq!(
        hierarchy.operations(),
        &[
            ViewOperation::UpdateMountedChildren {
                tag: ROOT,
                children: vec![10, 12],
            },
            ViewOperation::DropView { tag: 11 },
        ]
    );
}

#[test]
fn hierarchy_passes_do_not_nest() {
    let mut fixture = TreeFixture::new(ROOT);
    let builder = &mut fixture.builder;
    builder.before_update_view_hierarchy().expect("open pass");
    assert!(builder.is_updating_view_hierarchy());
    assert_eq!(
        builder.before_update_view_hierarchy(),
        Err(UiError::HierarchyPassInProgress)
    );

    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    let mut listener = LayoutLog::default();
    builder.after_update_view_hierarchy(&mut hierarchy, &mut listener);
    assert!(!builder.is_updating_view_hierarchy());
    pass(&mut fixture, &mut hierarchy);
}

#[test]
fn ensuring_a_backing_view_twice_creates_it_once() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::LayoutOnly)
        .child(10, 11, MountKind::LayoutOnly)
        .layout(10, LayoutRect::new(10.0, 10.0, 100.0, 100.0))
        .layout(11, LayoutRect::new(5.0, 5.0, 20.0, 20.0));

    let TreeFixture { tree, builder, .. } = &mut fixture;
    assert!(builder
        .ensure_backing_view_is_created(tree, 11)
        .expect("first ensure"));
    assert!(!builder
        .ensure_backing_view_is_created(tree, 11)
        .expect("second ensure"));
    assert!(tree.node(11).expect("node").mounts_to_view());
    assert!(!tree.node(10).expect("node").mounts_to_view());

    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    pass(&mut fixture, &mut hierarchy);
    assert_eq!(hierarchy.created_tags(), vec![11]);
    assert_eq!(hierarchy.children_of(ROOT), vec![11]);
    let frame = hierarchy.view(11).and_then(|view| view.frame);
    assert_eq!(frame, Some(LayoutRect::new(15.0, 15.0, 20.0, 20.0)));
}

#[test]
fn virtual_nodes_never_reach_the_native_side() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::LayoutOnly)
        .child(10, 11, MountKind::Virtual)
        .child(11, 12, MountKind::Virtual)
        .child(10, 13, MountKind::ViewMounting);
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    pass(&mut fixture, &mut hierarchy);

    fixture
        .manage(10, &EditBatch::new().removes([0]))
        .expect("remove virtual subtree");
    pass(&mut fixture, &mut hierarchy);

    for operation in hierarchy.operations() {
        assert!(
            !matches!(operation.tag(), Some(11 | 12)),
            "virtual node reached native side: {operation:?}"
        );
    }
    assert_eq!(hierarchy.created_tags(), vec![13]);

    let TreeFixture { tree, builder, .. } = &mut fixture;
    tree.register(ShadowNode::new(20, ROOT, "RawText", MountKind::Virtual))
        .expect("register");
    tree.insert_child(13, 20, 0).expect("attach");
    assert_eq!(
        builder.ensure_backing_view_is_created(tree, 20),
        Err(UiError::VirtualNode { tag: 20 })
    );
}

#[test]
fn pruning_discards_operations_for_dropped_views() {
    for prune in [false, true] {
        let config = FlatConfig::default().with_prune_dropped_operations(prune);
        let mut fixture = TreeFixture::with_config(ROOT, config);
        fixture.child(ROOT, 10, MountKind::ViewMounting);
        let TreeFixture { tree, builder, .. } = &mut fixture;
        builder
            .ensure_backing_view_is_created(tree, 10)
            .expect("create");
        builder.operations_queue().enqueue(ViewOperation::Measure {
            tag: 10,
            callback: CallbackId(7),
        });

        fixture
            .manage(ROOT, &EditBatch::new().removes([0]))
            .expect("remove");
        let pending: Vec<ViewOperation> =
            fixture.builder.pending_operations().iter().cloned().collect();
        let measured = pending
            .iter()
            .any(|operation| matches!(operation, ViewOperation::Measure { .. }));
        assert_eq!(measured, !prune);
        assert!(matches!(pending.first(), Some(ViewOperation::CreateView { tag: 10, .. })));
        assert!(!pending
            .iter()
            .any(|operation| matches!(operation, ViewOperation::DropView { .. })));
        assert_eq!(fixture.builder.pending_drops().collect::<Vec<_>>(), vec![10]);

        let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
        pass(&mut fixture, &mut hierarchy);
        assert_eq!(
            hierarchy.operations().last(),
            Some(&ViewOperation::DropView { tag: 10 })
        );
        assert_eq!(fixture.builder.pending_drops().count(), 0);
    }
}

#[test]
fn layout_events_follow_the_flush() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::ViewMounting)
        .child(10, 11, MountKind::ViewMounting)
        .layout(10, LayoutRect::new(0.0, 0.0, 300.0, 300.0))
        .layout(11, LayoutRect::new(10.0, 20.0, 30.0, 40.0));
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);

    let listener = pass(&mut fixture, &mut hierarchy);
    assert_eq!(
        listener.events,
        vec![
            (10, LayoutRect::new(0.0, 0.0, 300.0, 300.0)),
            (11, LayoutRect::new(10.0, 20.0, 30.0, 40.0)),
        ]
    );
    assert_eq!(listener.passes, vec![hierarchy.operations().len()]);
    assert_eq!(hierarchy.batches(), 1);

    let listener = pass(&mut fixture, &mut hierarchy);
    assert!(listener.events.is_empty());
    assert_eq!(listener.passes, vec![0]);
}

#[test]
fn removing_a_root_drops_descendants_first() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::ViewMounting)
        .child(10, 11, MountKind::ViewMounting);
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    pass(&mut fixture, &mut hierarchy);
    hierarchy.take_operations();

    let TreeFixture { tree, builder, .. } = &mut fixture;
    let removed = builder.remove_root_view(tree, ROOT).expect("remove root");
    assert_eq!(removed, vec![11, 10, ROOT]);
    assert!(tree.is_empty());
    assert_eq!(
        builder.remove_root_view(tree, 10),
        Err(UiError::Contract(ContractViolation::NotARoot { tag: 10 }))
    );

    pass(&mut fixture, &mut hierarchy);
    assert_eq!(
        hierarchy.operations(),
        &[
            ViewOperation::DropView { tag: 11 },
            ViewOperation::DropView { tag: 10 },
            ViewOperation::RemoveRootView { tag: ROOT },
        ]
    );
}

#[test]
fn virtual_frame_is_a_fraction_of_the_mounting_ancestor() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::ViewMounting)
        .child(10, 11, MountKind::LayoutOnly)
        .child(11, 12, MountKind::Virtual)
        .layout(10, LayoutRect::new(0.0, 0.0, 200.0, 100.0))
        .layout(11, LayoutRect::new(20.0, 10.0, 100.0, 50.0))
        .layout(12, LayoutRect::new(30.0, 15.0, 100.0, 50.0));

    let TreeFixture { tree, builder, .. } = &mut fixture;
    let frame = resolve_virtual_frame(tree, builder, 12).expect("resolve");
    assert_eq!(frame.tag, 10);
    assert_eq!((frame.x, frame.y), (0.25, 0.25));
    assert_eq!((frame.width, frame.height), (0.5, 0.5));
    assert!(tree.node(10).expect("node").is_backing_view_created());
    assert!(builder
        .pending_operations()
        .iter()
        .any(|operation| matches!(operation, ViewOperation::CreateView { tag: 10, .. })));

    tree.set_layout(10, LayoutRect::default()).expect("layout");
    let collapsed = resolve_virtual_frame(tree, builder, 11).expect("resolve");
    assert_eq!(
        (collapsed.x, collapsed.y, collapsed.width, collapsed.height),
        (0.0, 0.0, 0.0, 0.0)
    );
}

#[test]
fn responder_resolves_to_nearest_mounting_view() {
    let mut fixture = TreeFixture::new(ROOT);
    fixture
        .child(ROOT, 10, MountKind::ViewMounting)
        .child(10, 11, MountKind::LayoutOnly)
        .child(11, 12, MountKind::Virtual)
        .child(12, 13, MountKind::Virtual);

    let TreeFixture { tree, builder, .. } = &mut fixture;
    assert_eq!(resolve_responder_view(tree, builder, 13), Ok(10));
    assert_eq!(resolve_responder_view(tree, builder, 10), Ok(10));
    assert!(tree.node(10).expect("node").is_backing_view_created());
}

fn arb_shape() -> impl Strategy<Value = Vec<(usize, u8)>> {
    prop::collection::vec((any::<usize>(), 0u8..3), 1..24)
}

fn build_shape(fixture: &mut TreeFixture, shape: &[(usize, u8)]) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::new();
    let mut kinds: Vec<MountKind> = Vec::new();
    for (position, &(choice, kind)) in shape.iter().enumerate() {
        let slot = choice % (position + 1);
        let (parent, parent_kind) = if slot == 0 {
            (ROOT, MountKind::ViewMounting)
        } else {
            (tags[slot - 1], kinds[slot - 1])
        };
        let kind = match (parent_kind, kind) {
            (MountKind::Virtual, _) | (_, 0) => MountKind::Virtual,
            (_, 1) => MountKind::LayoutOnly,
            _ => MountKind::ViewMounting,
        };
        let tag = 10 + position as Tag;
        fixture.child(parent, tag, kind);
        fixture.layout(tag, LayoutRect::new(position as f32, 1.0, 10.0, 10.0));
        tags.push(tag);
        kinds.push(kind);
    }
    tags
}

proptest! {
    #[test]
    fn every_mounting_node_is_created_once_after_its_parent(shape in arb_shape()) {
        let mut fixture = TreeFixture::new(ROOT);
        let tags = build_shape(&mut fixture, &shape);
        let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
        pass(&mut fixture, &mut hierarchy);

        let created = hierarchy.created_tags();
        let mut expected: Vec<Tag> = tags
            .iter()
            .copied()
            .filter(|&tag| fixture.tree.node(tag).map(|node| node.mounts_to_view()).unwrap_or(false))
            .collect();
        let mut sorted = created.clone();
        sorted.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(sorted, expected);

        for (position, &tag) in created.iter().enumerate() {
            let ancestor = fixture.tree.nearest_mounting_ancestor(tag).expect("walk");
            if let Some(ancestor) = ancestor.filter(|&ancestor| ancestor != ROOT) {
                let parent_position = created.iter().position(|&created| created == ancestor);
                prop_assert!(matches!(parent_position, Some(p) if p < position));
            }
        }
        for &tag in created.iter().chain(std::iter::once(&ROOT)) {
            prop_assert_eq!(
                hierarchy.children_of(tag),
                fixture.tree.mounted_children(tag).expect("mounted children")
            );
        }

        let first = fixture.children(ROOT);
        if !first.is_empty() {
            fixture.manage(ROOT, &EditBatch::new().removes([0])).expect("remove");
            pass(&mut fixture, &mut hierarchy);
            for &tag in &tags {
                prop_assert_eq!(hierarchy.has_view(tag), fixture.tree.contains(tag) && created.contains(&tag));
            }
        }
    }
}
