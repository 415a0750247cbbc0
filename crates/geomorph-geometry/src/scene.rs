//! Renderer-neutral scene description.
//!
//! [`RenderSurface::frame`] turns a [`GeometrySpec`], its annotations and the
//! current visual flags into a [`SceneFrame`]: a list of mesh parts with
//! transforms and materials, annotation lines, an optional hint label and the
//! motion the view should apply. A renderer only has to draw what it is told.

use std::f64::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::layout;
use crate::{CompositeKind, GeometrySpec, MeasurementAnnotation, Point3, PrimitiveKind};

const HIGHLIGHT_COLOR: &str = "#f43f5e";
const PARTY_COLOR: &str = "#d946ef";
const CONTAINER_COLOR: &str = "#6366f1";
const CONE_SHELL_COLOR: &str = "#d4a574";

const CONTAINER_OPACITY: f64 = 0.2;
const INNER_CONTAINER_OPACITY: f64 = 0.15;

/// Where the hint text floats above the model.
const HINT_ANCHOR: Point3 = [0.0, 2.2, 0.0];

/// Level from which solids render as wireframes.
const WIREFRAME_LEVEL: u32 = 5;

const ROUND_SEGMENTS: u32 = 32;

// ============================================================================
// Visual Flags
// ============================================================================

/// Transient view state supplied by the session each frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualFlags {
    /// Hint overlays are active.
    pub highlight: bool,
    /// Alternate visual mode requested by the evaluator.
    pub party: bool,
    /// Measurement lines are drawn.
    pub show_measurements: bool,
    /// Learner's current level.
    pub level: u32,
    /// Latest affect label, if any.
    pub emotion: Option<String>,
}

impl Default for VisualFlags {
    fn default() -> Self {
        Self {
            highlight: false,
            party: false,
            show_measurements: false,
            level: 1,
            emotion: None,
        }
    }
}

impl VisualFlags {
    /// Colour applied to solid parts.
    #[must_use]
    pub fn solid_color(&self) -> &'static str {
        if self.highlight {
            HIGHLIGHT_COLOR
        } else if self.party {
            PARTY_COLOR
        } else {
            emotion_color(self.emotion.as_deref())
        }
    }

    /// Rotation speed in radians per second.
    #[must_use]
    pub fn spin_speed(&self) -> f64 {
        let base = if self.highlight {
            0.5
        } else {
            0.1_f64.mul_add(f64::from(self.level), 0.2)
        };
        if self.party {
            base * 3.0
        } else {
            base
        }
    }

    const fn wireframe(&self) -> bool {
        self.level >= WIREFRAME_LEVEL && !self.party && !self.highlight
    }
}

fn emotion_color(emotion: Option<&str>) -> &'static str {
    match emotion.map(str::to_lowercase).as_deref() {
        Some("confused") => "#fbbf24",
        Some("fear") => "#ef4444",
        Some("happy") => "#10b981",
        Some("bored") => "#94a3b8",
        _ => CONTAINER_COLOR,
    }
}

// ============================================================================
// Scene Types
// ============================================================================

/// Platonic solids available as meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolyhedronKind {
    /// Four faces.
    Tetrahedron,
    /// Eight faces.
    Octahedron,
    /// Twenty faces; also stands in for the dodecahedron.
    Icosahedron,
}

/// Mesh geometry with its construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeshShape {
    /// Axis-aligned box.
    Box {
        /// Extent along x.
        width: f64,
        /// Extent along y.
        height: f64,
        /// Extent along z.
        depth: f64,
    },
    /// Full sphere.
    Sphere {
        /// Radius.
        radius: f64,
    },
    /// Upper half sphere, flat face down.
    Hemisphere {
        /// Radius.
        radius: f64,
    },
    /// Cylinder, frustum or prism depending on radii and segments.
    Cylinder {
        /// Radius of the top face.
        radius_top: f64,
        /// Radius of the bottom face.
        radius_bottom: f64,
        /// Height along y.
        height: f64,
        /// Segments around the axis (3 draws a triangular prism).
        radial_segments: u32,
        /// Swept angle; a full turn for closed cylinders.
        arc: f64,
    },
    /// Cone with the apex up; 4 segments draws a square pyramid.
    Cone {
        /// Base radius.
        radius: f64,
        /// Height along y.
        height: f64,
        /// Segments around the axis.
        radial_segments: u32,
    },
    /// Torus lying in the xy plane.
    Torus {
        /// Distance from the centre to the tube centre.
        radius: f64,
        /// Tube radius.
        tube: f64,
    },
    /// Regular polyhedron.
    Polyhedron {
        /// Which solid.
        kind: PolyhedronKind,
        /// Circumradius.
        radius: f64,
    },
}

impl MeshShape {
    const fn cylinder(radius: f64, height: f64) -> Self {
        Self::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height,
            radial_segments: ROUND_SEGMENTS,
            arc: TAU,
        }
    }

    const fn cone(radius: f64, height: f64) -> Self {
        Self::Cone {
            radius,
            height,
            radial_segments: ROUND_SEGMENTS,
        }
    }
}

/// Whether a part is the measured solid or a translucent enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshRole {
    /// Opaque solid tinted by the visual flags.
    Solid,
    /// Translucent enclosure drawn around a solid.
    Container,
}

/// One mesh with transform and material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPart {
    /// Geometry.
    pub shape: MeshShape,
    /// Translation.
    pub position: Point3,
    /// Euler rotation in radians.
    pub rotation: Point3,
    /// Per-axis scale.
    pub scale: Point3,
    /// Hex colour.
    pub color: String,
    /// Opacity in `0..=1`.
    pub opacity: f64,
    /// Solid or container.
    pub role: MeshRole,
    /// Drawn as wireframe.
    pub wireframe: bool,
}

impl MeshPart {
    fn solid(shape: MeshShape) -> Self {
        Self {
            shape,
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            color: String::new(),
            opacity: 1.0,
            role: MeshRole::Solid,
            wireframe: false,
        }
    }

    fn container(shape: MeshShape, opacity: f64) -> Self {
        Self {
            color: CONTAINER_COLOR.to_string(),
            opacity,
            role: MeshRole::Container,
            ..Self::solid(shape)
        }
    }

    fn at(mut self, position: Point3) -> Self {
        self.position = position;
        self
    }

    fn rotated(mut self, rotation: Point3) -> Self {
        self.rotation = rotation;
        self
    }

    fn scaled(mut self, scale: Point3) -> Self {
        self.scale = scale;
        self
    }

    fn tinted(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }
}

/// Annotation line with the anchor its label is drawn at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationLine {
    /// Segment start.
    pub start: Point3,
    /// Segment end.
    pub end: Point3,
    /// Label text.
    pub label: String,
    /// Label position (segment midpoint).
    pub anchor: Point3,
}

impl From<&MeasurementAnnotation> for AnnotationLine {
    fn from(annotation: &MeasurementAnnotation) -> Self {
        Self {
            start: annotation.start,
            end: annotation.end,
            label: annotation.label.clone(),
            anchor: annotation.midpoint(),
        }
    }
}

/// Hint text floating above the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintLabel {
    /// Hint text.
    pub text: String,
    /// Label position.
    pub anchor: Point3,
}

/// Motion the view applies to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Model rotates on its own.
    pub auto_spin: bool,
    /// Rotation speed in radians per second.
    pub spin_speed: f64,
    /// Zoom is locked so measurements stay readable.
    pub scale_locked: bool,
    /// Model bobs up and down.
    pub bob: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFrame {
    /// Name of the drawn shape.
    pub shape: String,
    /// Meshes in draw order.
    pub parts: Vec<MeshPart>,
    /// Measurement lines; empty while measurements are hidden.
    pub annotations: Vec<AnnotationLine>,
    /// Hint label, when a hint is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<HintLabel>,
    /// Motion flags.
    pub motion: Motion,
    /// Local drag rotation (yaw, pitch) applied by the learner.
    pub drag: [f64; 2],
}

// ============================================================================
// Render Surface
// ============================================================================

/// Owns the view-local state of the 3D model.
///
/// Only user drag lives here; it never feeds back into the session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderSurface {
    drag: [f64; 2],
}

impl RenderSurface {
    /// Creates a surface with no drag applied.
    #[must_use]
    pub const fn new() -> Self {
        Self { drag: [0.0; 2] }
    }

    /// Accumulates a drag gesture.
    pub fn drag_by(&mut self, yaw: f64, pitch: f64) {
        self.drag[0] += yaw;
        self.drag[1] += pitch;
    }

    /// Clears accumulated drag.
    pub fn reset_drag(&mut self) {
        self.drag = [0.0; 2];
    }

    /// Current drag rotation (yaw, pitch).
    #[must_use]
    pub const fn drag(&self) -> [f64; 2] {
        self.drag
    }

    /// Describes one frame of the model.
    #[must_use]
    pub fn frame(
        &self,
        spec: &GeometrySpec,
        annotations: &[MeasurementAnnotation],
        hint: Option<&str>,
        flags: &VisualFlags,
    ) -> SceneFrame {
        let color = flags.solid_color();
        let wireframe = flags.wireframe();

        let parts = build_parts(spec)
            .into_iter()
            .map(|part| match part.role {
                MeshRole::Solid if part.color.is_empty() => MeshPart {
                    wireframe,
                    ..part.tinted(color)
                },
                MeshRole::Solid => MeshPart { wireframe, ..part },
                MeshRole::Container => part,
            })
            .collect();

        let annotations = if flags.show_measurements {
            annotations.iter().map(AnnotationLine::from).collect()
        } else {
            Vec::new()
        };

        SceneFrame {
            shape: spec.shape_name().to_string(),
            parts,
            annotations,
            hint: hint.map(|text| HintLabel {
                text: text.to_string(),
                anchor: HINT_ANCHOR,
            }),
            motion: Motion {
                auto_spin: !flags.show_measurements,
                spin_speed: flags.spin_speed(),
                scale_locked: flags.show_measurements,
                bob: flags.party && !flags.show_measurements,
            },
            drag: self.drag,
        }
    }
}

fn build_parts(spec: &GeometrySpec) -> Vec<MeshPart> {
    match spec.composite {
        Some(kind) => composite_parts(kind, spec),
        None => vec![primitive_part(spec)],
    }
}

fn primitive_part(spec: &GeometrySpec) -> MeshPart {
    let polyhedron = |kind| MeshPart::solid(MeshShape::Polyhedron { kind, radius: 1.5 });

    match spec.primitive {
        PrimitiveKind::Cube => MeshPart::solid(MeshShape::Box {
            width: 2.0,
            height: 2.0,
            depth: 2.0,
        }),
        PrimitiveKind::Cuboid => {
            let b = layout::cuboid(&spec.dims);
            MeshPart::solid(MeshShape::Box {
                width: b.width,
                height: b.height,
                depth: b.depth,
            })
        }
        PrimitiveKind::Sphere => MeshPart::solid(MeshShape::Sphere { radius: 1.5 }),
        PrimitiveKind::Hemisphere => MeshPart::solid(MeshShape::Hemisphere { radius: 1.5 }),
        PrimitiveKind::Cone => MeshPart::solid(MeshShape::cone(1.5, 3.0)),
        PrimitiveKind::Frustum => MeshPart::solid(MeshShape::Cylinder {
            radius_top: 0.6,
            radius_bottom: 1.2,
            height: 3.0,
            radial_segments: ROUND_SEGMENTS,
            arc: TAU,
        }),
        PrimitiveKind::Cylinder => MeshPart::solid(MeshShape::cylinder(1.5, 3.0)),
        PrimitiveKind::Pyramid => MeshPart::solid(MeshShape::Cone {
            radius: 1.5,
            height: 3.0,
            radial_segments: 4,
        }),
        PrimitiveKind::Torus => MeshPart::solid(MeshShape::Torus {
            radius: 1.5,
            tube: 0.5,
        }),
        PrimitiveKind::Prism => MeshPart::solid(MeshShape::Cylinder {
            radius_top: 1.5,
            radius_bottom: 1.5,
            height: 3.0,
            radial_segments: 3,
            arc: TAU,
        }),
        PrimitiveKind::Tetrahedron => polyhedron(PolyhedronKind::Tetrahedron),
        PrimitiveKind::Octahedron => polyhedron(PolyhedronKind::Octahedron),
        PrimitiveKind::Icosahedron | PrimitiveKind::Dodecahedron => {
            polyhedron(PolyhedronKind::Icosahedron)
        }
        PrimitiveKind::Ellipsoid => {
            MeshPart::solid(MeshShape::Sphere { radius: 1.5 }).scaled([1.5, 1.0, 1.2])
        }
    }
}

fn composite_parts(kind: CompositeKind, spec: &GeometrySpec) -> Vec<MeshPart> {
    match kind {
        CompositeKind::SphereInCube => vec![
            MeshPart::container(
                MeshShape::Box {
                    width: 3.0,
                    height: 3.0,
                    depth: 3.0,
                },
                INNER_CONTAINER_OPACITY,
            ),
            MeshPart::solid(MeshShape::Sphere { radius: 1.5 }),
        ],
        CompositeKind::ConeInCylinder => vec![
            MeshPart::container(MeshShape::cylinder(1.5, 3.0), CONTAINER_OPACITY),
            MeshPart::solid(MeshShape::cone(1.5, 3.0)),
        ],
        CompositeKind::SpheresInCylinder => {
            let mut parts = vec![MeshPart::container(
                MeshShape::cylinder(0.9, 5.4),
                CONTAINER_OPACITY,
            )];
            parts.extend(
                [-1.8, 0.0, 1.8]
                    .into_iter()
                    .map(|y| MeshPart::solid(MeshShape::Sphere { radius: 0.9 }).at([0.0, y, 0.0])),
            );
            parts
        }
        CompositeKind::DoubleCone => vec![
            MeshPart::solid(MeshShape::cone(1.0, 2.4)).at([0.0, 1.2, 0.0]),
            MeshPart::solid(MeshShape::cone(1.0, 2.4))
                .at([0.0, -1.2, 0.0])
                .rotated([0.0, 0.0, PI]),
        ],
        CompositeKind::DoubleSphere => {
            let pair = layout::sphere_pair();
            vec![
                MeshPart::solid(MeshShape::Sphere {
                    radius: pair.radius_b,
                })
                .at([pair.centre_b, 0.0, 0.0]),
                MeshPart::solid(MeshShape::Sphere {
                    radius: pair.radius_a,
                })
                .at([pair.centre_a, 0.0, 0.0]),
            ]
        }
        CompositeKind::Capsule => {
            let c = layout::capsule(&spec.dims);
            let half = c.body_height / 2.0;
            vec![
                MeshPart::solid(MeshShape::cylinder(c.radius, c.body_height)),
                MeshPart::solid(MeshShape::Hemisphere { radius: c.radius }).at([0.0, half, 0.0]),
                MeshPart::solid(MeshShape::Hemisphere { radius: c.radius })
                    .at([0.0, -half, 0.0])
                    .rotated([PI, 0.0, 0.0]),
            ]
        }
        CompositeKind::IceCream => {
            let cone = layout::ice_cream();
            vec![
                MeshPart::solid(MeshShape::cone(cone.radius, cone.cone_height))
                    .at([0.0, cone.cone_y, 0.0])
                    .rotated([PI, 0.0, 0.0])
                    .tinted(CONE_SHELL_COLOR),
                MeshPart::solid(MeshShape::Hemisphere {
                    radius: cone.radius,
                })
                .at([0.0, cone.rim_y(), 0.0]),
            ]
        }
        CompositeKind::HalfCylinder => vec![MeshPart::solid(MeshShape::Cylinder {
            radius_top: 1.5,
            radius_bottom: 1.5,
            height: 3.0,
            radial_segments: ROUND_SEGMENTS,
            arc: PI,
        })],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve, synthesize};

    fn frame_for(topic: &str, id: Option<u32>, flags: &VisualFlags) -> SceneFrame {
        let spec = resolve(topic, id);
        let annotations = synthesize(&spec);
        RenderSurface::new().frame(&spec, &annotations, None, flags)
    }

    #[test]
    fn test_default_flags_spin_without_annotations() {
        let frame = frame_for("cube", None, &VisualFlags::default());
        assert!(frame.motion.auto_spin);
        assert!(!frame.motion.scale_locked);
        assert!(frame.annotations.is_empty());
        assert!((frame.motion.spin_speed - 0.3).abs() < 1e-9);
        assert_eq!(frame.parts[0].color, "#6366f1");
    }

    #[test]
    fn test_measurements_lock_motion() {
        let flags = VisualFlags {
            show_measurements: true,
            party: true,
            ..VisualFlags::default()
        };
        let frame = frame_for("cone", None, &flags);
        assert!(!frame.motion.auto_spin);
        assert!(frame.motion.scale_locked);
        assert!(!frame.motion.bob);
        assert_eq!(frame.annotations.len(), 2);
        assert_eq!(frame.annotations[1].anchor, [0.0, 0.0, 1.1]);
    }

    #[test]
    fn test_highlight_beats_party_colour_but_party_triples_speed() {
        let flags = VisualFlags {
            highlight: true,
            party: true,
            ..VisualFlags::default()
        };
        assert_eq!(flags.solid_color(), "#f43f5e");
        assert!((flags.spin_speed() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_emotion_colours() {
        let flags = |emotion: &str| VisualFlags {
            emotion: Some(emotion.to_string()),
            ..VisualFlags::default()
        };
        assert_eq!(flags("happy").solid_color(), "#10b981");
        assert_eq!(flags("Confused").solid_color(), "#fbbf24");
        assert_eq!(flags("fear").solid_color(), "#ef4444");
        assert_eq!(flags("bored").solid_color(), "#94a3b8");
        assert_eq!(flags("neutral").solid_color(), "#6366f1");
    }

    #[test]
    fn test_wireframe_from_level_five() {
        let high = VisualFlags {
            level: 5,
            ..VisualFlags::default()
        };
        let frame = frame_for("archimedes", None, &high);
        let container = &frame.parts[0];
        let solid = &frame.parts[1];
        assert_eq!(container.role, MeshRole::Container);
        assert!(!container.wireframe);
        assert!((container.opacity - 0.15).abs() < f64::EPSILON);
        assert!(solid.wireframe);

        let party = VisualFlags { party: true, ..high };
        assert!(!frame_for("cube", None, &party).parts[0].wireframe);
    }

    #[test]
    fn test_composite_part_counts() {
        let flags = VisualFlags::default();
        assert_eq!(frame_for("composite", Some(18), &flags).parts.len(), 4);
        assert_eq!(frame_for("composite", Some(11), &flags).parts.len(), 3);
        assert_eq!(frame_for("sphere", Some(31), &flags).parts.len(), 2);
        assert_eq!(frame_for("composite", Some(34), &flags).parts.len(), 1);
    }

    #[test]
    fn test_ice_cream_cone_keeps_its_colour() {
        let flags = VisualFlags {
            party: true,
            ..VisualFlags::default()
        };
        let frame = frame_for("composite", Some(40), &flags);
        assert_eq!(frame.parts[0].color, "#d4a574");
        assert_eq!(frame.parts[1].color, "#d946ef");
    }

    #[test]
    fn test_dodecahedron_uses_icosahedron_mesh() {
        let frame = frame_for("dodecahedron", None, &VisualFlags::default());
        assert_eq!(frame.shape, "dodecahedron");
        assert_eq!(
            frame.parts[0].shape,
            MeshShape::Polyhedron {
                kind: PolyhedronKind::Icosahedron,
                radius: 1.5
            }
        );
    }

    #[test]
    fn test_hint_label_anchor() {
        let spec = resolve("torus", None);
        let frame = RenderSurface::new().frame(&spec, &[], Some("R + r"), &VisualFlags::default());
        let hint = frame.hint.as_ref().map(|h| (h.text.as_str(), h.anchor));
        assert_eq!(hint, Some(("R + r", [0.0, 2.2, 0.0])));
    }

    #[test]
    fn test_drag_is_local() {
        let mut surface = RenderSurface::new();
        surface.drag_by(0.5, -0.25);
        surface.drag_by(0.5, 0.0);
        assert_eq!(surface.drag(), [1.0, -0.25]);

        let spec = resolve("cube", None);
        let frame = surface.frame(&spec, &[], None, &VisualFlags::default());
        assert_eq!(frame.drag, [1.0, -0.25]);

        surface.reset_drag();
        assert_eq!(surface.drag(), [0.0, 0.0]);
    }
}
