//! Geometry scenarios across resolution, annotation and scene framing.

use geomorph_geometry::{
    resolve, synthesize, CompositeKind, MeshRole, PrimitiveKind, RenderSurface, ShapeReport,
    VisualFlags,
};

fn labels(topic: &str, id: Option<u32>) -> Vec<String> {
    synthesize(&resolve(topic, id))
        .into_iter()
        .map(|a| a.label)
        .collect()
}

fn hinted() -> VisualFlags {
    VisualFlags {
        highlight: true,
        show_measurements: true,
        ..VisualFlags::default()
    }
}

#[test]
fn test_double_sphere_problem() {
    let spec = resolve("sphere", Some(31));
    assert_eq!(spec.composite, Some(CompositeKind::DoubleSphere));
    assert_eq!(labels("sphere", Some(31)), vec!["r_B = r", "r_A = 2r"]);

    // Only problem 31 of the sphere family is a pair of spheres
    assert_eq!(resolve("sphere", Some(30)).composite, None);
    assert_eq!(resolve("bola", Some(31)).composite, Some(CompositeKind::DoubleSphere));
}

#[test]
fn test_cone_in_cylinder_overrides_any_topic() {
    for topic in ["cone", "cylinder", "cube", "whatever"] {
        assert_eq!(
            resolve(topic, Some(13)).composite,
            Some(CompositeKind::ConeInCylinder),
            "topic {topic}"
        );
    }
    assert_eq!(labels("cone", Some(13)), vec!["r = 6cm", "h = 10cm"]);
}

#[test]
fn test_unknown_topic_is_default_cube() {
    let spec = resolve("blah", None);
    assert_eq!(spec.primitive, PrimitiveKind::Cube);
    assert_eq!(spec.composite, None);
    assert_eq!(labels("blah", None), vec!["s = 2u"; 3]);
}

#[test]
fn test_topic_matching_ignores_case() {
    assert_eq!(resolve("TABUNG", None).primitive, PrimitiveKind::Cylinder);
    assert_eq!(resolve("  Donat ", None).primitive, PrimitiveKind::Torus);
    assert_eq!(
        resolve("Archimedes", Some(45)).composite,
        Some(CompositeKind::SphereInCube)
    );
}

#[test]
fn test_composite_table_and_default() {
    assert_eq!(resolve("composite", Some(11)).composite, Some(CompositeKind::Capsule));
    assert_eq!(resolve("composite", Some(40)).composite, Some(CompositeKind::IceCream));
    assert_eq!(
        resolve("composite", Some(999)).composite,
        Some(CompositeKind::SphereInCube)
    );
    assert_eq!(
        resolve("composite", None).composite,
        Some(CompositeKind::SphereInCube)
    );
}

#[test]
fn test_scene_annotations_match_synthesizer() {
    for (topic, id) in [
        ("composite", Some(11)),
        ("composite", Some(40)),
        ("sphere", Some(31)),
        ("cone", Some(13)),
        ("cuboid", Some(2)),
        ("torus", None),
    ] {
        let spec = resolve(topic, id);
        let annotations = synthesize(&spec);
        let frame = RenderSurface::new().frame(&spec, &annotations, None, &hinted());

        assert_eq!(frame.annotations.len(), annotations.len(), "{topic} {id:?}");
        for (line, annotation) in frame.annotations.iter().zip(&annotations) {
            assert_eq!(line.start, annotation.start);
            assert_eq!(line.end, annotation.end);
            assert_eq!(line.label, annotation.label);
            assert_eq!(line.anchor, annotation.midpoint());
        }
    }
}

#[test]
fn test_containers_stay_translucent() {
    let report = ShapeReport::build("archimedes", None, None, &hinted());
    let containers: Vec<_> = report
        .frame
        .parts
        .iter()
        .filter(|p| p.role == MeshRole::Container)
        .collect();
    assert_eq!(containers.len(), 1);
    assert!(containers[0].opacity < 0.5);
    assert!(report
        .frame
        .parts
        .iter()
        .any(|p| p.role == MeshRole::Solid && p.color == "#f43f5e"));
}

#[test]
fn test_overlays_follow_measurement_flag() {
    let spec = resolve("cylinder", Some(7));
    let annotations = synthesize(&spec);
    let surface = RenderSurface::new();

    let hidden = surface.frame(&spec, &annotations, Some("V = πr²h"), &VisualFlags::default());
    assert!(hidden.annotations.is_empty());
    assert!(hidden.motion.auto_spin);
    assert!(!hidden.motion.scale_locked);

    let shown = surface.frame(&spec, &annotations, Some("V = πr²h"), &hinted());
    assert_eq!(shown.annotations.len(), annotations.len());
    assert!(!shown.motion.auto_spin);
    assert!(shown.motion.scale_locked);
    assert_eq!(
        shown.hint.map(|h| (h.text, h.anchor)),
        Some(("V = πr²h".to_string(), [0.0, 2.2, 0.0]))
    );
}

#[test]
fn test_drag_is_local_to_surface() {
    let spec = resolve("cube", Some(1));
    let annotations = synthesize(&spec);

    let mut dragged = RenderSurface::new();
    dragged.drag_by(0.4, -0.2);
    let frame = dragged.frame(&spec, &annotations, None, &VisualFlags::default());
    assert_eq!(frame.drag, [0.4, -0.2]);

    let untouched = RenderSurface::new().frame(&spec, &annotations, None, &VisualFlags::default());
    assert_eq!(untouched.drag, [0.0, 0.0]);
}

#[test]
fn test_report_json_shape() {
    let report = ShapeReport::build("sphere", Some(31), None, &VisualFlags::default());
    let json = report.to_json_pretty().unwrap_or_default();
    assert!(json.contains("\"double-sphere\""));
    assert!(json.contains("r_A = 2r"));
}
