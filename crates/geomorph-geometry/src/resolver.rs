//! Topic and problem-id resolution to a [`GeometrySpec`].
//!
//! Resolution is a closed lookup: topics map to exactly one [`TopicClass`], and
//! composite problems map to exactly one [`CompositeKind`] through an explicit
//! identifier table. Nothing here can fail; unknown topics become a cube and
//! unknown composite problems become a sphere inscribed in a cube.

use crate::dimensions::{problem_dimensions, with_composite_overrides};
use crate::{CompositeKind, GeometrySpec, PrimitiveKind};

/// Problem id whose cone-inside-cylinder model overrides any topic.
const CONE_IN_CYLINDER_PROBLEM: u32 = 13;

/// Problem id comparing sphere A against sphere B.
const DOUBLE_SPHERE_PROBLEM: u32 = 31;

/// Problem id with two cones joined at the base.
const DOUBLE_CONE_PROBLEM: u32 = 45;

/// Composite problems and the model each one shows.
const COMPOSITE_TABLE: &[(u32, CompositeKind)] = &[
    (11, CompositeKind::Capsule),
    (13, CompositeKind::ConeInCylinder),
    (18, CompositeKind::SpheresInCylinder),
    (34, CompositeKind::HalfCylinder),
    (40, CompositeKind::IceCream),
    (45, CompositeKind::DoubleCone),
];

/// Composite shown when a composite problem has no table entry.
const DEFAULT_COMPOSITE: CompositeKind = CompositeKind::SphereInCube;

/// How a topic string is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicClass {
    /// Explicit composite marker (`composite`).
    Composite,
    /// Archimedes' sphere-in-cylinder/cube family, always a sphere in a cube.
    Archimedes,
    /// Any other topic, mapped onto the primitive table.
    Primitive(PrimitiveKind),
}

impl TopicClass {
    /// Classifies a topic case-insensitively.
    #[must_use]
    pub fn of(topic: &str) -> Self {
        match topic.trim().to_lowercase().as_str() {
            "composite" => Self::Composite,
            "archimedes" => Self::Archimedes,
            other => Self::Primitive(primitive_for_topic(other)),
        }
    }
}

/// Maps a topic onto the primitive table, falling back to [`PrimitiveKind::Cube`].
///
/// Composite markers map to [`PrimitiveKind::Sphere`], the solid they are built
/// around.
#[must_use]
pub fn primitive_for_topic(topic: &str) -> PrimitiveKind {
    match topic.trim().to_lowercase().as_str() {
        "cuboid" => PrimitiveKind::Cuboid,
        "sphere" | "bola" | "rotation" | "composite" | "archimedes" => PrimitiveKind::Sphere,
        "hemisphere" => PrimitiveKind::Hemisphere,
        "cone" | "kerucut" | "sector" => PrimitiveKind::Cone,
        "frustum" => PrimitiveKind::Frustum,
        "cylinder" | "tabung" | "cylindrical_shell" => PrimitiveKind::Cylinder,
        "pyramid" | "limas" => PrimitiveKind::Pyramid,
        "torus" | "donat" => PrimitiveKind::Torus,
        "prism" => PrimitiveKind::Prism,
        "tetrahedron" => PrimitiveKind::Tetrahedron,
        "octahedron" => PrimitiveKind::Octahedron,
        "icosahedron" => PrimitiveKind::Icosahedron,
        "dodecahedron" => PrimitiveKind::Dodecahedron,
        "ellipsoid" => PrimitiveKind::Ellipsoid,
        // "cube", "optimization" and anything unrecognised
        _ => PrimitiveKind::Cube,
    }
}

/// Looks up the composite model for a problem of the composite family.
#[must_use]
pub fn composite_for_problem(problem_id: Option<u32>) -> CompositeKind {
    problem_id
        .and_then(|id| {
            COMPOSITE_TABLE
                .iter()
                .find(|(table_id, _)| *table_id == id)
                .map(|(_, kind)| *kind)
        })
        .unwrap_or(DEFAULT_COMPOSITE)
}

/// Returns the composite a specific problem forces regardless of its family.
fn special_case(primitive: PrimitiveKind, problem_id: Option<u32>) -> Option<CompositeKind> {
    match (primitive, problem_id?) {
        (_, CONE_IN_CYLINDER_PROBLEM) => Some(CompositeKind::ConeInCylinder),
        (PrimitiveKind::Sphere, DOUBLE_SPHERE_PROBLEM) => Some(CompositeKind::DoubleSphere),
        (PrimitiveKind::Cone, DOUBLE_CONE_PROBLEM) => Some(CompositeKind::DoubleCone),
        _ => None,
    }
}

/// Resolves a topic and optional problem id to a [`GeometrySpec`].
///
/// Resolution order:
/// 1. `archimedes` is always a sphere in a cube; `composite` looks the problem up
///    in the composite table (default sphere in a cube).
/// 2. A handful of problems force a composite regardless of topic (id 13 is a
///    cone inside a cylinder; sphere 31 is a pair of spheres; cone 45 is a double
///    cone).
/// 3. Otherwise the topic maps to one primitive, unknown topics to a cube.
///
/// Dimensions come from the per-problem table with composite overrides applied.
///
/// # Examples
///
/// ```
/// use geomorph_geometry::{resolve, CompositeKind, PrimitiveKind};
///
/// assert_eq!(resolve("blah", None).primitive, PrimitiveKind::Cube);
/// assert_eq!(resolve("Kerucut", None).primitive, PrimitiveKind::Cone);
/// assert_eq!(resolve("cylinder", Some(13)).composite, Some(CompositeKind::ConeInCylinder));
/// ```
#[must_use]
pub fn resolve(topic: &str, problem_id: Option<u32>) -> GeometrySpec {
    let class = TopicClass::of(topic);
    let primitive = match class {
        TopicClass::Primitive(kind) => kind,
        TopicClass::Composite | TopicClass::Archimedes => PrimitiveKind::Sphere,
    };

    let composite = match class {
        TopicClass::Archimedes => Some(CompositeKind::SphereInCube),
        TopicClass::Composite => Some(composite_for_problem(problem_id)),
        TopicClass::Primitive(kind) => special_case(kind, problem_id),
    };

    let dims = problem_dimensions(problem_id);
    let dims = match composite {
        Some(kind) => with_composite_overrides(kind, dims),
        None => dims,
    };

    GeometrySpec {
        primitive,
        composite,
        dims,
    }
}
