//! End-to-end lifecycle scenarios for the presentation adapter.
//!
//! These drive a `DomElement` the way a host scene graph would: mutate,
//! let the scheduler grant a drain, inspect the burst the renderer sees.

use std::rc::Rc;

use serde_json::json;
use velum_core::command::{Opcode, Operand};
use velum_core::geometry::SizeMode;
use velum_dom::{
    BASE_CLASS, DISPLAY_HIDDEN, DISPLAY_PROPERTY, DomElement, ElementOptions, NodeGeometry,
    PATH_ATTRIBUTE, RENDER_SIZE_EVENT, RecordingNode, SceneNode,
};

fn op(opcode: Opcode) -> Operand {
    Operand::Op(opcode)
}

fn s(value: &str) -> Operand {
    Operand::Str(value.to_string())
}

fn n(value: f64) -> Operand {
    Operand::Num(value)
}

fn contains_run(burst: &[Operand], run: &[Operand]) -> bool {
    burst.windows(run.len()).any(|window| window == run)
}

#[test]
fn full_lifecycle_round_trip() {
    let node = Rc::new(RecordingNode::new());
    let scene: Rc<dyn SceneNode> = node.clone();

    let mut element = DomElement::new(ElementOptions {
        tag_name: Some("span".into()),
        content: Some("hi".into()),
        ..ElementOptions::default()
    });
    element.on_add_ui_event("click");

    // Frame 1: mount replays the retained description in one burst.
    element.mount(&scene, "body/0");
    element.drain();
    let initial = node.last_burst().expect("mount burst");
    assert_eq!(initial[..2], [op(Opcode::With), s("body/0")]);
    assert_eq!(initial[2..4], [op(Opcode::InitDom), s("SPAN")]);
    assert!(contains_run(&initial, &[op(Opcode::AddClass), s(BASE_CLASS)]));
    assert!(contains_run(&initial, &[op(Opcode::ChangeContent), s("hi")]));
    assert!(contains_run(
        &initial,
        &[op(Opcode::Subscribe), s("click")]
    ));
    assert!(contains_run(
        &initial,
        &[op(Opcode::ChangeAttribute), s(PATH_ATTRIBUTE), s("body/0")]
    ));
    node.clear_bursts();

    // Frame 2: mutations coalesce into one ordered burst.
    let requests = node.update_requests();
    element
        .set_property("color", "red")
        .set_content("hello")
        .add_class("hot");
    assert_eq!(node.update_requests(), requests + 1);
    element.drain();
    assert_eq!(
        node.last_burst().unwrap()[2..],
        [
            op(Opcode::ChangeProperty),
            s("color"),
            s("red"),
            op(Opcode::ChangeContent),
            s("hello"),
            op(Opcode::AddClass),
            s("hot"),
        ]
    );
    node.clear_bursts();

    // Inbound UI event reaches a local listener.
    let clicks = Rc::new(std::cell::Cell::new(0u32));
    let sink = clicks.clone();
    element.on("click", move |_| sink.set(sink.get() + 1));
    element.on_receive("click", &json!({"x": 1.0, "y": 2.0}));
    assert_eq!(clicks.get(), 1);

    // Dismount tears the remote surface down before forgetting it.
    element.dismount();
    let teardown = node.last_burst().expect("teardown burst");
    assert!(contains_run(&teardown, &[op(Opcode::RemoveClass), s("hot")]));
    assert!(contains_run(&teardown, &[op(Opcode::ChangeContent), s("")]));
    assert!(contains_run(
        &teardown,
        &[
            op(Opcode::ChangeProperty),
            s(DISPLAY_PROPERTY),
            s(DISPLAY_HIDDEN)
        ]
    ));
    assert!(!element.is_initialized());

    // Remount at a new address reproduces the pre-dismount description.
    let next = Rc::new(RecordingNode::new());
    let scene: Rc<dyn SceneNode> = next.clone();
    element.mount(&scene, "body/3/1");
    element.drain();
    let replay = next.last_burst().expect("remount burst");
    assert_eq!(replay[..2], [op(Opcode::With), s("body/3/1")]);
    assert!(contains_run(&replay, &[op(Opcode::AddClass), s("hot")]));
    assert!(contains_run(
        &replay,
        &[op(Opcode::ChangeProperty), s("color"), s("red")]
    ));
    assert!(contains_run(
        &replay,
        &[op(Opcode::ChangeContent), s("hello")]
    ));
    assert!(contains_run(&replay, &[op(Opcode::Subscribe), s("click")]));
}

#[test]
fn bursts_stay_ordered_across_frames() {
    let node = Rc::new(RecordingNode::new());
    let scene: Rc<dyn SceneNode> = node.clone();
    let mut element = DomElement::default();
    element.mount(&scene, "list/4");
    element.drain();
    node.clear_bursts();

    for frame in 0..3 {
        element.set_content(&format!("frame {frame}"));
        element.drain();
    }

    let bursts = node.bursts();
    assert_eq!(bursts.len(), 3);
    for (frame, burst) in bursts.iter().enumerate() {
        assert_eq!(
            burst[..],
            [
                op(Opcode::With),
                s("list/4"),
                op(Opcode::ChangeContent),
                s(&format!("frame {frame}")),
            ]
        );
    }
}

#[test]
fn renderer_measured_surface_round_trips_its_size() {
    let node = Rc::new(RecordingNode::with_geometry(NodeGeometry {
        size_mode: [SizeMode::Render, SizeMode::Render, SizeMode::Absolute],
        ..NodeGeometry::default()
    }));
    let scene: Rc<dyn SceneNode> = node.clone();
    let mut element = DomElement::with_tag("p");
    element.mount(&scene, "text/0");
    element.drain();

    // Both axes are renderer-measured, so the size command carries the
    // sentinel twice and the burst ends with a measurement request.
    let burst = node.last_burst().unwrap();
    assert!(contains_run(
        &burst,
        &[
            op(Opcode::ChangeSize),
            Operand::Bool(false),
            Operand::Bool(false)
        ]
    ));
    assert_eq!(
        burst[burst.len() - 2..],
        [op(Opcode::DomRenderSize), s("text/0")]
    );

    // The renderer answers with a measurement notification.
    element.on_receive(RENDER_SIZE_EVENT, &json!([312.0, 54.5]));
    assert_eq!(element.get_render_size(), [312.0, 54.5]);
    assert_eq!(element.serialize().render_size, [312.0, 54.5]);

    // The notification is local-only: no command echoes back.
    node.clear_bursts();
    element.drain();
    assert!(node.bursts().is_empty());
}

#[test]
fn geometry_hooks_flow_through_to_the_burst() {
    let node = Rc::new(RecordingNode::new());
    let scene: Rc<dyn SceneNode> = node.clone();
    let mut element = DomElement::default();
    element.mount(&scene, "card/2");
    element.drain();
    node.clear_bursts();

    let mut transform = velum_core::geometry::IDENTITY;
    transform[12] = 10.0;
    element.on_transform_change(&transform);
    element.on_opacity_change(0.25);
    element.on_size_change(320.0, 200.0);
    element.drain();

    let burst = node.last_burst().unwrap();
    assert_eq!(burst[2], op(Opcode::ChangeTransform));
    assert_eq!(burst[2 + 13], n(10.0));
    assert!(contains_run(
        &burst,
        &[op(Opcode::ChangeProperty), s("opacity"), n(0.25)]
    ));
    assert_eq!(
        burst[burst.len() - 3..],
        [op(Opcode::ChangeSize), n(320.0), n(200.0)]
    );
}
