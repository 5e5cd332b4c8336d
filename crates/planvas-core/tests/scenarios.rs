//! End-to-end behavior of the scene engine through its public API.

use kurbo::{Point, Rect, Size, Vec2};
use planvas_core::document::{self, ImportOptions};
use planvas_core::{
    CollaborationOverlay, Element, ElementId, ElementKind, EngineConfig, GestureKind, Interaction,
    RemoteEvent, RemoteEventKind, ResizeHandle, Scene, SceneDocument, Viewport,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rect(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> ElementId {
    let layer = scene.active_layer();
    scene
        .add_element(Element::rectangle(Point::new(x, y), Size::new(w, h), layer))
        .unwrap()
}

#[test]
fn frame_assignment_requires_full_containment() {
    init();
    let mut scene = Scene::new();
    let layer = scene.active_layer();
    let frame = scene
        .add_element(Element::frame(Point::ZERO, Size::new(300.0, 300.0), layer))
        .unwrap();
    let e1 = rect(&mut scene, 10.0, 10.0, 50.0, 50.0);
    let _e2 = rect(&mut scene, 290.0, 290.0, 50.0, 50.0);

    assert!(scene.assign_elements_to_frame(frame));
    assert_eq!(scene.get_element(frame).unwrap().children(), &[e1]);
}

#[test]
fn west_handle_drag_moves_left_edge() {
    init();
    let mut scene = Scene::new();
    let id = rect(&mut scene, 100.0, 100.0, 200.0, 100.0);
    scene.select(id);

    let mut interaction = Interaction::new();
    // West handle sits at (100, 150).
    assert!(interaction.begin(&mut scene, Point::new(100.0, 150.0)));
    assert_eq!(
        interaction.gesture().unwrap().kind(),
        GestureKind::Resize(ResizeHandle::Left)
    );
    interaction.update(&mut scene, Point::new(70.0, 150.0));
    assert!(interaction.commit(&mut scene));

    let element = scene.get_element(id).unwrap();
    assert_eq!(element.position, Point::new(70.0, 100.0));
    assert_eq!(element.size, Size::new(230.0, 100.0));
    assert_eq!(element.bounds().x1, 300.0);
}

#[test]
fn screen_to_canvas_applies_pan_then_zoom() {
    let viewport = Viewport::new(2.0, Vec2::new(100.0, 50.0));
    assert_eq!(viewport.screen_to_canvas(Point::new(300.0, 250.0)), Point::new(100.0, 100.0));
}

#[test]
fn deleting_layer_removes_members_and_selection() {
    init();
    let mut scene = Scene::new();
    let doomed = scene.add_layer("Doomed");
    scene.set_active_layer(doomed);
    let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
    let b = rect(&mut scene, 20.0, 0.0, 10.0, 10.0);
    let c = rect(&mut scene, 40.0, 0.0, 10.0, 10.0);
    scene.select_elements(&[a, b], false);

    assert!(scene.delete_layer(doomed));
    for id in [a, b, c] {
        assert!(scene.get_element(id).is_none());
        assert!(!scene.index().contains(id));
    }
    assert!(scene.get_layer(doomed).is_none());
    assert_eq!(scene.layers().len(), 1);
    assert!(scene.selection().is_empty());
    assert_ne!(scene.active_layer(), doomed);
}

#[test]
fn serialize_round_trip_preserves_scene() {
    init();
    let mut scene = Scene::new();
    let layer = scene.active_layer();
    let frame = scene
        .add_element(Element::frame(Point::ZERO, Size::new(300.0, 300.0), layer))
        .unwrap();
    rect(&mut scene, 10.0, 10.0, 50.0, 50.0);
    scene.assign_elements_to_frame(frame);
    scene.set_zoom(1.5);

    let json = scene.to_json().unwrap();
    let restored = Scene::from_document(
        document::deserialize(&json, &ImportOptions::default()).unwrap(),
        EngineConfig::default(),
    )
    .unwrap();

    assert_eq!(restored.serialize(), scene.serialize());
}

#[test]
fn viewport_transforms_are_inverse() {
    let viewport = Viewport::new(0.75, Vec2::new(-40.0, 12.5));
    for &(x, y) in &[(0.0, 0.0), (123.0, -45.0), (-1000.0, 2000.0)] {
        let p = Point::new(x, y);
        let back = viewport.screen_to_canvas(viewport.canvas_to_screen(p));
        assert!((back - p).hypot() < 1e-9);
    }
}

#[test]
fn moving_frame_keeps_children_inside() {
    init();
    let mut scene = Scene::new();
    let layer = scene.active_layer();
    let frame = scene
        .add_element(Element::frame(Point::ZERO, Size::new(300.0, 300.0), layer))
        .unwrap();
    let child = rect(&mut scene, 10.0, 10.0, 50.0, 50.0);

    assert!(scene.move_frame(frame, Vec2::new(500.0, 250.0)));
    let frame_bounds = scene.get_element(frame).unwrap().bounds();
    let child_bounds = scene.get_element(child).unwrap().bounds();
    assert_eq!(frame_bounds.union(child_bounds), frame_bounds);
    assert_eq!(scene.find_element_at_point(Point::new(520.0, 270.0)), Some(child));
}

#[test]
fn history_is_capped() {
    init();
    let config = EngineConfig {
        history_cap: 3,
        ..EngineConfig::default()
    };
    let mut scene = Scene::with_config(config);
    let id = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
    for _ in 0..10 {
        scene.push_history();
        scene.move_elements(&[id], Vec2::new(1.0, 0.0));
    }
    assert_eq!(scene.history().past_len(), 3);

    let mut undone = 0;
    while scene.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(scene.get_element(id).unwrap().position, Point::new(7.0, 0.0));
}

#[test]
fn layer_toggles_are_idempotent() {
    init();
    let mut scene = Scene::new();
    let layer = scene.active_layer();
    let id = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);

    scene.set_layer_visible(layer, false);
    let once = scene.serialize();
    scene.set_layer_visible(layer, false);
    assert_eq!(scene.serialize(), once);
    assert_eq!(scene.find_element_at_point(Point::new(5.0, 5.0)), None);

    scene.set_layer_visible(layer, true);
    scene.set_layer_visible(layer, true);
    assert_eq!(scene.find_element_at_point(Point::new(5.0, 5.0)), Some(id));
}

#[test]
fn cancelled_gesture_restores_geometry() {
    init();
    let mut scene = Scene::new();
    let id = rect(&mut scene, 0.0, 0.0, 100.0, 100.0);
    let before = scene.serialize();
    let history_before = scene.history().past_len();

    let mut interaction = Interaction::new();
    assert!(interaction.begin(&mut scene, Point::new(50.0, 50.0)));
    interaction.update(&mut scene, Point::new(400.0, 300.0));
    assert_eq!(scene.get_element(id).unwrap().position, Point::new(350.0, 250.0));
    assert!(interaction.cancel(&mut scene));

    assert_eq!(scene.serialize().elements, before.elements);
    assert_eq!(scene.history().past_len(), history_before);
    assert_eq!(scene.find_element_at_point(Point::new(50.0, 50.0)), Some(id));
    assert!(!interaction.is_active());
}

#[test]
fn committed_gesture_is_one_undo_step() {
    init();
    let mut scene = Scene::new();
    let id = rect(&mut scene, 0.0, 0.0, 100.0, 100.0);
    let history_before = scene.history().past_len();

    let mut interaction = Interaction::new();
    interaction.begin(&mut scene, Point::new(50.0, 50.0));
    for step in 1..=5 {
        interaction.update(&mut scene, Point::new(50.0 + step as f64 * 10.0, 50.0));
    }
    interaction.commit(&mut scene);

    assert_eq!(scene.history().past_len(), history_before + 1);
    assert_eq!(scene.get_element(id).unwrap().position, Point::new(50.0, 0.0));
    assert!(scene.undo());
    assert_eq!(scene.get_element(id).unwrap().position, Point::ZERO);
}

#[test]
fn import_moves_unknown_layer_to_first_layer() {
    init();
    let mut scene = Scene::new();
    let id = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
    let first_layer = scene.active_layer();

    let mut value = serde_json::to_value(scene.serialize()).unwrap();
    value["elements"][0]["layer_id"] = serde_json::json!(uuid::Uuid::new_v4());
    let json = serde_json::to_string(&value).unwrap();

    let doc = document::deserialize(&json, &ImportOptions::default()).unwrap();
    let element = doc.element(id).unwrap();
    assert_eq!(element.layer_id, first_layer);
    assert_eq!(doc.layer(first_layer).unwrap().elements(), &[id]);
}

#[test]
fn paste_with_new_ids_rewrites_references() {
    init();
    let mut scene = Scene::new();
    let layer = scene.active_layer();
    let frame = scene
        .add_element(Element::frame(Point::ZERO, Size::new(300.0, 300.0), layer))
        .unwrap();
    let child = rect(&mut scene, 10.0, 10.0, 50.0, 50.0);
    scene.assign_elements_to_frame(frame);
    scene.select_all();

    let options = ImportOptions::paste(Vec2::new(20.0, 20.0));
    let copy = document::normalize(scene.export_selection(), &options).unwrap();
    let pasted = scene.paste_document(copy);

    assert_eq!(pasted.len(), 2);
    assert!(!pasted.contains(&frame) && !pasted.contains(&child));
    assert_eq!(scene.len(), 4);

    let new_frame = pasted
        .iter()
        .filter_map(|&id| scene.get_element(id))
        .find(|el| el.is_frame())
        .unwrap();
    assert_eq!(new_frame.position, Point::new(20.0, 20.0));
    let new_child = new_frame.children()[0];
    assert!(pasted.contains(&new_child));
    assert_eq!(scene.get_element(new_child).unwrap().position, Point::new(30.0, 30.0));
    assert_eq!(scene.selected_ids(), pasted);

    assert!(scene.undo());
    assert_eq!(scene.len(), 2);
}

#[test]
fn marquee_selection_returns_back_to_front() {
    init();
    let mut scene = Scene::new();
    let a = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
    let b = rect(&mut scene, 5.0, 5.0, 10.0, 10.0);
    let _far = rect(&mut scene, 1000.0, 1000.0, 10.0, 10.0);

    let hits = scene.get_elements_in_selection(Rect::new(20.0, 20.0, 0.0, 0.0));
    assert_eq!(hits, vec![a, b]);
    scene.bring_to_front(a);
    assert_eq!(scene.get_elements_in_selection(Rect::new(0.0, 0.0, 20.0, 20.0)), vec![b, a]);
}

#[test]
fn remote_lock_lifecycle() {
    init();
    let mut scene = Scene::new();
    let id = scene
        .create_element(ElementKind::StickyNote, Point::new(10.0, 10.0))
        .unwrap();
    let mut overlay = CollaborationOverlay::new(scene.config());

    let start = RemoteEvent {
        element_id: id,
        user_id: "alice".to_string(),
        user_color: "#3366ff".to_string(),
        kind: RemoteEventKind::EditStart,
        timestamp: 1_000,
    };
    overlay.handle_event(&RemoteEvent::from_json(&start.to_json().unwrap()).unwrap());
    assert!(overlay.is_locked_by_other(id, "me"));
    assert_eq!(overlay.visible_notifications(1_500)[0].message, "alice is editing");

    // Local edits are never blocked by a remote lock.
    assert_eq!(scene.move_elements(&[id], Vec2::new(5.0, 0.0)), 1);

    scene.delete_element(id);
    overlay.retain_elements(|el| scene.contains(el));
    assert!(overlay.lock_for(id).is_none());
}

#[test]
fn replace_document_keeps_history_and_prunes_selection() {
    init();
    let mut scene = Scene::new();
    let id = rect(&mut scene, 0.0, 0.0, 10.0, 10.0);
    scene.select(id);
    scene.push_history();

    scene.replace_document(SceneDocument::default()).unwrap();
    assert!(scene.is_empty());
    assert!(scene.selection().is_empty());
    assert_eq!(scene.layers().len(), 1);
    assert!(scene.can_undo());
}
