//! Dimension annotations drawn over a shape.
//!
//! Every annotation is a line segment in the shape's local space plus the label
//! printed at its midpoint. Positions follow the same layout the render surface
//! builds meshes from, so a label never drifts away from the edge it measures.

use serde::{Deserialize, Serialize};

use crate::layout::{self, BOX_LABEL_OFFSET, FRONT_Z};
use crate::{CompositeKind, Dimensions, GeometrySpec, Point3, PrimitiveKind};

/// Unit printed when the problem does not name one.
const DEFAULT_UNIT: &str = "u";

/// A labelled dimension line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementAnnotation {
    /// Segment start in local coordinates.
    pub start: Point3,
    /// Segment end in local coordinates.
    pub end: Point3,
    /// Text drawn at the segment midpoint, e.g. `d = 14cm`.
    pub label: String,
}

impl MeasurementAnnotation {
    fn new(start: Point3, end: Point3, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }

    /// Returns the midpoint where the label is anchored.
    #[must_use]
    pub fn midpoint(&self) -> Point3 {
        [
            (self.start[0] + self.end[0]) / 2.0,
            (self.start[1] + self.end[1]) / 2.0,
            (self.start[2] + self.end[2]) / 2.0,
        ]
    }
}

/// Formats a measured value with its unit suffix.
///
/// Whole numbers print without a fractional part.
///
/// ```
/// use geomorph_geometry::format_measure;
///
/// assert_eq!(format_measure(14.0, "cm"), "14cm");
/// assert_eq!(format_measure(3.5, ""), "3.5");
/// ```
#[must_use]
pub fn format_measure(value: f64, unit: &str) -> String {
    format!("{value}{unit}")
}

/// Builds annotations for a resolved spec.
#[must_use]
pub fn synthesize(spec: &GeometrySpec) -> Vec<MeasurementAnnotation> {
    synthesize_for(spec.primitive, spec.composite, &spec.dims)
}

/// Builds annotations for a primitive (or composite, when given) and its
/// dimensions.
///
/// The composite kind wins whenever present. Missing values fall back to the
/// size the shape is drawn at, so every label is well formed.
#[must_use]
pub fn synthesize_for(
    primitive: PrimitiveKind,
    composite: Option<CompositeKind>,
    dims: &Dimensions,
) -> Vec<MeasurementAnnotation> {
    let labels = Labeler::new(dims);
    match composite {
        Some(kind) => composite_annotations(kind, dims, &labels),
        None => primitive_annotations(primitive, dims, &labels),
    }
}

/// Label formatting bound to one set of dimensions.
struct Labeler<'a> {
    unit: &'a str,
}

impl<'a> Labeler<'a> {
    fn new(dims: &'a Dimensions) -> Self {
        Self {
            unit: dims.unit_label.as_deref().unwrap_or(DEFAULT_UNIT),
        }
    }

    fn label(&self, prefix: &str, value: f64) -> String {
        format!("{prefix} = {}", format_measure(value, self.unit))
    }
}

fn diameter_or(dims: &Dimensions, radius_fallback: f64) -> f64 {
    dims.diameter
        .unwrap_or_else(|| 2.0 * dims.radius.unwrap_or(radius_fallback))
}

// ============================================================================
// Primitives
// ============================================================================

fn primitive_annotations(
    primitive: PrimitiveKind,
    dims: &Dimensions,
    labels: &Labeler<'_>,
) -> Vec<MeasurementAnnotation> {
    type A = MeasurementAnnotation;
    let z = FRONT_Z;

    match primitive {
        PrimitiveKind::Cube => {
            let side = labels.label("s", dims.side.unwrap_or(2.0));
            vec![
                A::new([-1.0, -1.6, 1.2], [1.0, -1.6, 1.2], side.clone()),
                A::new([1.2, -1.0, 1.2], [1.2, 1.0, 1.2], side.clone()),
                A::new([1.2, -1.2, -1.0], [1.2, -1.2, 1.0], side),
            ]
        }
        PrimitiveKind::Cuboid => {
            let b = layout::cuboid(dims);
            let (hw, hh, hd, o) = (b.width / 2.0, b.height / 2.0, b.depth / 2.0, BOX_LABEL_OFFSET);
            vec![
                A::new(
                    [-hw, -(hh + o), hd + o],
                    [hw, -(hh + o), hd + o],
                    labels.label("p", dims.length.unwrap_or(2.0)),
                ),
                A::new(
                    [hw + o, -hh, hd + o],
                    [hw + o, hh, hd + o],
                    labels.label("t", dims.height.unwrap_or(2.0)),
                ),
                A::new(
                    [hw + o, -(hh + o), -hd],
                    [hw + o, -(hh + o), hd],
                    labels.label("l", dims.width.unwrap_or(2.0)),
                ),
            ]
        }
        PrimitiveKind::Sphere => vec![A::new(
            [-1.5, 1.8, 0.0],
            [1.5, 1.8, 0.0],
            labels.label("d", diameter_or(dims, 1.5)),
        )],
        PrimitiveKind::Hemisphere => vec![
            A::new(
                [-1.5, -0.3, 0.0],
                [1.5, -0.3, 0.0],
                labels.label("d", diameter_or(dims, 1.5)),
            ),
            A::new(
                [0.0, 0.0, 0.0],
                [0.0, 1.5, 0.0],
                labels.label("r", dims.radius.unwrap_or(1.5)),
            ),
        ],
        PrimitiveKind::Cone => vec![
            A::new(
                [-1.5, -1.9, z],
                [1.5, -1.9, z],
                labels.label("d", diameter_or(dims, 1.5)),
            ),
            A::new(
                [0.0, -1.5, z],
                [0.0, 1.5, z],
                labels.label("h", dims.height.unwrap_or(3.0)),
            ),
        ],
        PrimitiveKind::Frustum => vec![
            A::new(
                [-1.2, -1.7, z],
                [1.2, -1.7, z],
                labels.label("R", dims.radius_a.unwrap_or(1.2)),
            ),
            A::new(
                [-0.6, 1.7, z],
                [0.6, 1.7, z],
                labels.label("r", dims.radius_b.unwrap_or(0.6)),
            ),
            A::new(
                [0.0, -1.5, z],
                [0.0, 1.5, z],
                labels.label("h", dims.height.unwrap_or(3.0)),
            ),
        ],
        PrimitiveKind::Cylinder => cylinder_annotations(dims, labels),
        PrimitiveKind::Pyramid => vec![
            A::new(
                [-1.5, -1.9, z],
                [1.5, -1.9, z],
                labels.label("s", dims.side.unwrap_or(3.0)),
            ),
            A::new(
                [0.0, -1.5, z],
                [0.0, 1.5, z],
                labels.label("h", dims.height.unwrap_or(3.0)),
            ),
        ],
        PrimitiveKind::Torus => vec![
            A::new(
                [0.0, 0.0, 0.0],
                [1.5, 0.0, 0.0],
                labels.label("R", dims.radius_outer.unwrap_or(1.5)),
            ),
            A::new(
                [0.0, 1.5, 0.0],
                [0.0, 2.0, 0.0],
                labels.label("r", dims.radius_inner.unwrap_or(0.5)),
            ),
        ],
        PrimitiveKind::Prism => vec![
            A::new(
                [-1.3, -1.9, z],
                [1.3, -1.9, z],
                labels.label("s", dims.side.unwrap_or(2.6)),
            ),
            A::new(
                [0.0, -1.5, z],
                [0.0, 1.5, z],
                labels.label("h", dims.height.unwrap_or(3.0)),
            ),
        ],
        PrimitiveKind::Tetrahedron
        | PrimitiveKind::Octahedron
        | PrimitiveKind::Icosahedron
        | PrimitiveKind::Dodecahedron => vec![A::new(
            [0.0, 0.0, 0.0],
            [1.5, 0.0, 0.0],
            labels.label("r", dims.radius.unwrap_or(1.5)),
        )],
        PrimitiveKind::Ellipsoid => vec![
            A::new(
                [-2.25, -1.6, 1.2],
                [2.25, -1.6, 1.2],
                labels.label("a", dims.width.unwrap_or(2.25)),
            ),
            A::new(
                [0.0, -1.5, 1.2],
                [0.0, 1.5, 1.2],
                labels.label("b", dims.height.unwrap_or(1.5)),
            ),
            A::new(
                [1.2, -1.2, -1.8],
                [1.2, -1.2, 1.8],
                labels.label("c", dims.length.unwrap_or(1.8)),
            ),
        ],
    }
}

fn cylinder_annotations(dims: &Dimensions, labels: &Labeler<'_>) -> Vec<MeasurementAnnotation> {
    vec![
        MeasurementAnnotation::new(
            [-1.5, -2.1, FRONT_Z],
            [1.5, -2.1, FRONT_Z],
            labels.label("d", diameter_or(dims, 1.5)),
        ),
        MeasurementAnnotation::new(
            [0.0, -1.5, FRONT_Z],
            [0.0, 1.5, FRONT_Z],
            labels.label("h", dims.height.unwrap_or(3.0)),
        ),
    ]
}

// ============================================================================
// Composites
// ============================================================================

fn composite_annotations(
    kind: CompositeKind,
    dims: &Dimensions,
    labels: &Labeler<'_>,
) -> Vec<MeasurementAnnotation> {
    type A = MeasurementAnnotation;
    let z = FRONT_Z;

    match kind {
        CompositeKind::SphereInCube => {
            let side = dims.side.or(dims.diameter).unwrap_or(3.0);
            let diameter = dims.diameter.or(dims.side).unwrap_or(3.0);
            vec![
                A::new([-1.5, -1.9, 1.6], [1.5, -1.9, 1.6], labels.label("s", side)),
                A::new([0.0, -1.5, 1.6], [0.0, 1.5, 1.6], labels.label("d", diameter)),
            ]
        }
        CompositeKind::ConeInCylinder => vec![
            A::new(
                [0.0, -1.7, z],
                [1.5, -1.7, z],
                labels.label("r", dims.radius.unwrap_or(1.5)),
            ),
            A::new(
                [0.0, -1.5, z],
                [0.0, 1.5, z],
                labels.label("h", dims.height.unwrap_or(3.0)),
            ),
        ],
        CompositeKind::SpheresInCylinder => vec![
            A::new(
                [-0.9, -3.0, 1.2],
                [0.9, -3.0, 1.2],
                labels.label("d", diameter_or(dims, 0.9)),
            ),
            A::new(
                [0.0, -2.7, 1.2],
                [0.0, 2.7, 1.2],
                labels.label("h", dims.height.unwrap_or(5.4)),
            ),
        ],
        CompositeKind::DoubleCone => {
            let height = labels.label("t", dims.height.unwrap_or(2.4));
            vec![
                A::new(
                    [-1.0, -2.6, z],
                    [1.0, -2.6, z],
                    labels.label("d", diameter_or(dims, 1.0)),
                ),
                A::new([0.0, -2.4, z], [0.0, 0.0, z], height.clone()),
                A::new([0.0, 0.0, z], [0.0, 2.4, z], height),
            ]
        }
        CompositeKind::DoubleSphere => {
            let pair = layout::sphere_pair();
            let label_b = dims.label_radius_b.clone().unwrap_or_else(|| {
                labels.label("r_B", dims.radius_b.unwrap_or(pair.radius_b))
            });
            let label_a = dims.label_radius_a.clone().unwrap_or_else(|| {
                labels.label("r_A", dims.radius_a.unwrap_or(pair.radius_a))
            });
            let below_b = -(pair.radius_b + 0.4);
            let below_a = -(pair.radius_a + 0.4);
            vec![
                A::new(
                    [pair.centre_b, below_b, 1.2],
                    [pair.centre_b + pair.radius_b, below_b, 1.2],
                    label_b,
                ),
                A::new(
                    [pair.centre_a, below_a, 1.2],
                    [pair.centre_a + pair.radius_a, below_a, 1.2],
                    label_a,
                ),
            ]
        }
        CompositeKind::Capsule => {
            let c = layout::capsule(dims);
            let half = c.body_height / 2.0;
            let below = -(half + c.radius + 0.4);
            vec![
                A::new(
                    [-c.radius, below, z],
                    [c.radius, below, z],
                    labels.label("d", diameter_or(dims, c.radius)),
                ),
                A::new(
                    [0.0, -half, z],
                    [0.0, half, z],
                    labels.label("h(body)", dims.body_height.unwrap_or(c.body_height)),
                ),
                A::new(
                    [0.0, half, 0.0],
                    [0.0, half + c.radius, 0.0],
                    labels.label("r", dims.radius.unwrap_or(c.radius)),
                ),
            ]
        }
        CompositeKind::IceCream => {
            let cone = layout::ice_cream();
            let rim = cone.rim_y();
            vec![
                A::new(
                    [-cone.radius, rim, z],
                    [cone.radius, rim, z],
                    labels.label("d", diameter_or(dims, cone.radius)),
                ),
                A::new(
                    [0.0, cone.apex_y(), z],
                    [0.0, rim, z],
                    labels.label("h", dims.height.unwrap_or(cone.cone_height)),
                ),
                A::new(
                    [0.0, rim, 0.0],
                    [0.0, rim + cone.radius, 0.0],
                    labels.label("r", dims.radius.unwrap_or(cone.radius)),
                ),
            ]
        }
        CompositeKind::HalfCylinder => cylinder_annotations(dims, labels),
    }
}
