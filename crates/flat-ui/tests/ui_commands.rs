use flat_core::{
    CallbackId, EditBatch, FlatConfig, LayoutRect, PropValue, Props, ShadowTree, Tag, UiResult,
    ViewOperation,
};
use flat_testing::{LayoutLog, RecordingViewHierarchy};
use flat_ui::{UiImplementation, ViewManagerRegistry};

const ROOT: Tag = 1;

fn ui_with_root(width: f32, height: f32) -> UiImplementation {
    let mut ui =
        UiImplementation::new(ViewManagerRegistry::with_builtins(), FlatConfig::default());
    ui.register_root_view(ROOT, width, height)
        .expect("register root");
    ui
}

fn create(ui: &mut UiImplementation, tag: Tag, class_name: &str) {
    ui.create_view(tag, class_name, ROOT, &Props::new())
        .expect("create view");
}

fn flush(ui: &mut UiImplementation, hierarchy: &mut RecordingViewHierarchy) -> LayoutLog {
    let mut listener = LayoutLog::default();
    ui.update_view_hierarchy(hierarchy, &mut listener)
        .expect("hierarchy pass");
    hierarchy.assert_consistent();
    listener
}

fn position(operations: &[ViewOperation], matches: impl Fn(&ViewOperation) -> bool) -> usize {
    operations
        .iter()
        .position(matches)
        .expect("operation present")
}

#[test]
fn command_on_unmounted_node_materializes_its_subtree_first() {
    let mut ui = ui_with_root(400.0, 800.0);
    create(&mut ui, 2, "View");
    create(&mut ui, 3, "TextInput");
    create(&mut ui, 4, "View");
    create(&mut ui, 5, "TextInput");
    ui.set_children(ROOT, &[2]).expect("attach");
    ui.set_children(2, &[3, 4]).expect("attach");
    ui.set_children(4, &[5]).expect("attach");

    ui.dispatch_view_manager_command(2, 7, vec![PropValue::from(true)])
        .expect("dispatch");
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    flush(&mut ui, &mut hierarchy);

    let operations = hierarchy.operations();
    let command = position(operations, |operation| {
        matches!(operation, ViewOperation::DispatchCommand { tag: 2, .. })
    });
    let created = position(operations, |operation| {
        matches!(operation, ViewOperation::CreateView { tag: 2, .. })
    });
    let attached = position(operations, |operation| {
        matches!(operation, ViewOperation::UpdateMountedChildren { tag: 2, .. })
    });
    assert!(created < command);
    assert!(attached < command);
    assert_eq!(hierarchy.children_of(2), vec![3, 5]);
    assert_eq!(hierarchy.children_of(ROOT), vec![2]);
    assert!(ui.tree().node(2).expect("node").mounts_to_view());
}

#[test]
fn pager_children_are_forced_to_mount() {
    let mut ui = ui_with_root(400.0, 800.0);
    create(&mut ui, 10, "ViewPager");
    create(&mut ui, 11, "View");
    create(&mut ui, 12, "View");
    ui.set_children(ROOT, &[10]).expect("attach");
    ui.manage_children(10, &EditBatch::new().adds([12, 11], [1, 0]))
        .expect("add pages");
    assert!(ui.tree().node(11).expect("node").mounts_to_view());
    assert!(ui.tree().node(12).expect("node").mounts_to_view());

    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    flush(&mut ui, &mut hierarchy);
    assert_eq!(hierarchy.created_tags(), vec![10, 11, 12]);
    assert_eq!(hierarchy.children_of(10), vec![11, 12]);
}

#[test]
fn measuring_layout_only_node_reports_fractions_of_mounting_ancestor() {
    let mut ui = ui_with_root(200.0, 100.0);
    create(&mut ui, 2, "Text");
    ui.set_children(ROOT, &[2]).expect("attach");
    ui.set_layout(2, LayoutRect::new(50.0, 25.0, 100.0, 50.0))
        .expect("layout");
    create(&mut ui, 3, "TextInput");
    ui.set_children(2, &[3]).expect("attach");

    ui.measure(2, CallbackId(1)).expect("measure virtual");
    ui.measure(3, CallbackId(2)).expect("measure mounted");

    let operations: Vec<ViewOperation> = ui.pending_operations().iter().cloned().collect();
    assert!(operations.contains(&ViewOperation::MeasureVirtualView {
        tag: ROOT,
        x: 0.25,
        y: 0.25,
        width: 0.5,
        height: 0.5,
        callback: CallbackId(1),
    }));
    let created = position(&operations, |operation| {
        matches!(operation, ViewOperation::CreateView { tag: 3, .. })
    });
    let measured = position(&operations, |operation| {
        *operation
            == ViewOperation::Measure {
                tag: 3,
                callback: CallbackId(2),
            }
    });
    assert!(created < measured);
    assert!(!ui.tree().node(2).expect("node").mounts_to_view());
}

#[test]
fn responder_skips_virtual_and_layout_only_ancestors() {
    let mut ui = ui_with_root(400.0, 800.0);
    create(&mut ui, 2, "ScrollView");
    create(&mut ui, 3, "Text");
    create(&mut ui, 4, "RawText");
    ui.set_children(ROOT, &[2]).expect("attach");
    ui.set_children(2, &[3]).expect("attach");
    ui.set_children(3, &[4]).expect("attach");

    ui.set_js_responder(4, true).expect("responder");
    ui.clear_js_responder();
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    flush(&mut ui, &mut hierarchy);

    let operations = hierarchy.operations();
    assert!(operations.contains(&ViewOperation::SetJsResponder {
        tag: 2,
        initial_tag: 4,
        block_native_responder: true,
    }));
    assert_eq!(operations.last(), Some(&ViewOperation::ClearJsResponder));
}

#[test]
fn escalating_commands_promote_their_target() {
    let mut ui = ui_with_root(400.0, 800.0);
    for tag in [2, 3, 4, 5] {
        create(&mut ui, tag, "View");
    }
    ui.set_children(ROOT, &[2, 3, 4, 5]).expect("attach");

    ui.measure_in_window(2, CallbackId(1)).expect("measure in window");
    ui.find_subview_in(3, 1.0, 2.0, CallbackId(2))
        .expect("find subview");
    ui.show_popup_menu(4, vec!["Copy".to_owned()], CallbackId(3))
        .expect("popup");
    ui.send_accessibility_event(5, 8).expect("accessibility");

    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    flush(&mut ui, &mut hierarchy);
    assert_eq!(hierarchy.created_tags(), vec![2, 3, 4, 5]);
    assert_eq!(hierarchy.children_of(ROOT), vec![2, 3, 4, 5]);
}

#[test]
fn property_updates_only_send_changes() {
    let mut ui = ui_with_root(400.0, 800.0);
    ui.create_view(2, "TextInput", ROOT, &Props::new().with("value", "a"))
        .expect("create");
    ui.set_children(ROOT, &[2]).expect("attach");
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    flush(&mut ui, &mut hierarchy);
    hierarchy.take_operations();

    let props = Props::new().with("value", "a").with("editable", false);
    ui.update_view(2, "TextInput", &props).expect("update");
    ui.update_view(2, "TextInput", &props).expect("repeat update");
    flush(&mut ui, &mut hierarchy);

    assert_eq!(
        hierarchy.operations(),
        &[ViewOperation::UpdateProperties {
            tag: 2,
            view_class: "TextInput".into(),
            props: Props::new().with("editable", false),
        }]
    );
    let view = hierarchy.view(2).expect("native view");
    assert_eq!(view.props.get("value"), Some(&PropValue::from("a")));
    assert_eq!(view.props.get("editable"), Some(&PropValue::from(false)));
}

#[test]
fn layout_engine_runs_before_the_pass() {
    let mut ui = ui_with_root(400.0, 800.0);
    for tag in [2, 3] {
        create(&mut ui, tag, "TextInput");
    }
    ui.set_children(ROOT, &[2, 3]).expect("attach");

    let mut stack = |tree: &mut ShadowTree, root: Tag| -> UiResult<()> {
        let children = tree.children(root)?.to_vec();
        for (row, child) in children.into_iter().enumerate() {
            tree.set_layout(child, LayoutRect::new(0.0, row as f32 * 40.0, 400.0, 40.0))?;
        }
        Ok(())
    };
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    let mut listener = LayoutLog::default();
    ui.dispatch_view_updates(&mut stack, &mut hierarchy, &mut listener)
        .expect("dispatch updates");

    assert_eq!(
        listener.events,
        vec![
            (2, LayoutRect::new(0.0, 0.0, 400.0, 40.0)),
            (3, LayoutRect::new(0.0, 40.0, 400.0, 40.0)),
        ]
    );
    assert_eq!(
        hierarchy.view(3).and_then(|view| view.frame),
        Some(LayoutRect::new(0.0, 40.0, 400.0, 40.0))
    );
}

#[test]
fn removing_the_root_view_tears_down_everything() {
    let mut ui = ui_with_root(400.0, 800.0);
    create(&mut ui, 2, "ScrollView");
    create(&mut ui, 3, "TextInput");
    ui.set_children(ROOT, &[2]).expect("attach");
    ui.set_children(2, &[3]).expect("attach");
    let mut hierarchy = RecordingViewHierarchy::with_roots(&[ROOT]);
    flush(&mut ui, &mut hierarchy);

    ui.remove_root_view(ROOT).expect("remove root");
    flush(&mut ui, &mut hierarchy);
    assert!(ui.tree().is_empty());
    assert_eq!(hierarchy.dropped_tags(), vec![3, 2, ROOT]);
    assert_eq!(ui.dump_tree(Some(ROOT)), "[1] (missing)\n");
}
