//! GeoMorph Geometry
//!
//! This crate turns a problem's topic and identifier into everything the 3D view
//! needs: a structural description of the solid, the dimension labels drawn over
//! it, and a renderer-neutral scene frame.
//!
//! # Types
//!
//! - [`GeometrySpec`] - Primitive or composite solid plus its numeric dimensions
//! - [`Dimensions`] - Sparse record of the measurements a problem talks about
//! - [`MeasurementAnnotation`] - A labelled line segment in the shape's local space
//! - [`SceneFrame`] - Mesh parts, annotations and motion flags for one frame
//!
//! # Functions
//!
//! - [`resolve`] - Topic + problem id to [`GeometrySpec`], total over all inputs
//! - [`synthesize`] - [`GeometrySpec`] to ordered [`MeasurementAnnotation`]s
//! - [`RenderSurface::frame`] - Spec + annotations + visual flags to [`SceneFrame`]
//!
//! # Example
//!
//! ```rust
//! use geomorph_geometry::{resolve, synthesize, CompositeKind};
//!
//! let spec = resolve("sphere", Some(31));
//! assert_eq!(spec.composite, Some(CompositeKind::DoubleSphere));
//!
//! let labels: Vec<_> = synthesize(&spec).into_iter().map(|a| a.label).collect();
//! assert_eq!(labels, vec!["r_B = r", "r_A = 2r"]);
//! ```

mod dimensions;
mod layout;
mod measurement;
mod resolver;
mod scene;

pub use dimensions::{problem_dimensions, Dimensions};
pub use layout::CM_TO_SCENE;
pub use measurement::{format_measure, synthesize, synthesize_for, MeasurementAnnotation};
pub use resolver::{composite_for_problem, primitive_for_topic, resolve, TopicClass};
pub use scene::{
    AnnotationLine, HintLabel, MeshPart, MeshRole, MeshShape, Motion, PolyhedronKind,
    RenderSurface, SceneFrame, VisualFlags,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in the shape's local coordinate space.
pub type Point3 = [f64; 3];

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while exporting geometry descriptions.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Failed to serialize a description to JSON.
    #[error("failed to serialize geometry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for geometry export operations.
pub type Result<T> = std::result::Result<T, GeometryError>;

// ============================================================================
// PrimitiveKind
// ============================================================================

/// A single solid from the fixed primitive table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    /// Cube; also the fallback for unknown topics.
    #[default]
    Cube,
    /// Rectangular box (cuboid).
    Cuboid,
    /// Sphere.
    Sphere,
    /// Upper half of a sphere.
    Hemisphere,
    /// Right circular cone.
    Cone,
    /// Truncated cone (frustum).
    Frustum,
    /// Right circular cylinder.
    Cylinder,
    /// Square pyramid.
    Pyramid,
    /// Torus.
    Torus,
    /// Triangular prism.
    Prism,
    /// Regular tetrahedron.
    Tetrahedron,
    /// Regular octahedron.
    Octahedron,
    /// Regular icosahedron.
    Icosahedron,
    /// Dodecahedron, drawn with an icosahedron mesh.
    Dodecahedron,
    /// Ellipsoid, drawn as a non-uniformly scaled sphere.
    Ellipsoid,
}

impl PrimitiveKind {
    /// Returns the canonical lowercase name of this primitive.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Cuboid => "cuboid",
            Self::Sphere => "sphere",
            Self::Hemisphere => "hemisphere",
            Self::Cone => "cone",
            Self::Frustum => "frustum",
            Self::Cylinder => "cylinder",
            Self::Pyramid => "pyramid",
            Self::Torus => "torus",
            Self::Prism => "prism",
            Self::Tetrahedron => "tetrahedron",
            Self::Octahedron => "octahedron",
            Self::Icosahedron => "icosahedron",
            Self::Dodecahedron => "dodecahedron",
            Self::Ellipsoid => "ellipsoid",
        }
    }
}

impl std::fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CompositeKind
// ============================================================================

/// A model assembled from several primitives in a named pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeKind {
    /// Sphere inscribed in a translucent cube (the default composite).
    SphereInCube,
    /// Cone standing inside a translucent cylinder of equal radius and height.
    ConeInCylinder,
    /// Three spheres stacked inside a translucent cylinder.
    SpheresInCylinder,
    /// Two cones joined at their bases.
    DoubleCone,
    /// Two spheres side by side, radius ratio 1:2.
    DoubleSphere,
    /// Cylinder capped with two hemispheres.
    Capsule,
    /// Cone topped with a hemispherical scoop.
    IceCream,
    /// Cylinder cut in half along its axis.
    HalfCylinder,
}

impl CompositeKind {
    /// Returns the canonical kebab-case name of this composite.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SphereInCube => "sphere-in-cube",
            Self::ConeInCylinder => "cone-in-cylinder",
            Self::SpheresInCylinder => "spheres-in-cylinder",
            Self::DoubleCone => "double-cone",
            Self::DoubleSphere => "double-sphere",
            Self::Capsule => "capsule",
            Self::IceCream => "ice-cream",
            Self::HalfCylinder => "half-cylinder",
        }
    }
}

impl std::fmt::Display for CompositeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// GeometrySpec
// ============================================================================

/// Structural description of the solid shown for one problem.
///
/// Derived from the live question's topic and id and never persisted; it is
/// recomputed whenever either input changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometrySpec {
    /// Primitive the topic maps to (also used when `composite` is `None`).
    pub primitive: PrimitiveKind,

    /// Composite pattern, when the topic/problem calls for one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeKind>,

    /// Resolved measurements for the problem.
    pub dims: Dimensions,
}

impl GeometrySpec {
    /// Creates a spec for a plain primitive with the given dimensions.
    #[must_use]
    pub const fn primitive(primitive: PrimitiveKind, dims: Dimensions) -> Self {
        Self {
            primitive,
            composite: None,
            dims,
        }
    }

    /// Returns `true` if this spec describes a composite model.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        self.composite.is_some()
    }

    /// Returns the name of the shape that is actually drawn.
    #[must_use]
    pub fn shape_name(&self) -> &'static str {
        self.composite
            .map_or_else(|| self.primitive.as_str(), |c| c.as_str())
    }
}

// ============================================================================
// ShapeReport
// ============================================================================

/// Everything derived for one problem, bundled for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeReport {
    /// The resolved geometry.
    pub spec: GeometrySpec,
    /// Dimension annotations in local space.
    pub annotations: Vec<MeasurementAnnotation>,
    /// Scene frame for the given visual flags.
    pub frame: SceneFrame,
}

impl ShapeReport {
    /// Resolves, annotates and frames a problem in one step.
    #[must_use]
    pub fn build(topic: &str, problem_id: Option<u32>, hint: Option<&str>, flags: &VisualFlags) -> Self {
        let spec = resolve(topic, problem_id);
        let annotations = synthesize(&spec);
        let frame = RenderSurface::default().frame(&spec, &annotations, hint, flags);
        Self {
            spec,
            annotations,
            frame,
        }
    }

    /// Serializes the report to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::Serialization` if JSON serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(GeometryError::from)
    }
}
