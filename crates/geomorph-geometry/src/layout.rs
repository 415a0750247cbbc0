//! Scene-space extents shared by the render surface and the measurement overlay.
//!
//! Shapes whose mesh size follows the problem's dimensions (boxes, capsules) must
//! place their annotation lines from the same numbers the mesh is built from.

use crate::Dimensions;

/// Scene units per centimetre.
pub const CM_TO_SCENE: f64 = 0.2;

/// Distance between a box face and the annotation line drawn beside it.
pub(crate) const BOX_LABEL_OFFSET: f64 = 0.2;

/// Depth at which front-facing annotation lines sit.
pub(crate) const FRONT_Z: f64 = 1.1;

/// Axis-aligned box size in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BoxExtents {
    /// Extent along x (the problem's length).
    pub width: f64,
    /// Extent along y (the problem's height).
    pub height: f64,
    /// Extent along z (the problem's width).
    pub depth: f64,
}

/// Capsule size in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CapsuleExtents {
    /// Radius of the body and both caps.
    pub radius: f64,
    /// Height of the cylindrical body between the caps.
    pub body_height: f64,
}

fn scaled(value: Option<f64>, fallback: f64) -> f64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(fallback, |v| v * CM_TO_SCENE)
}

/// Box extents for a cuboid problem; 2 units along any axis left unspecified.
pub(crate) fn cuboid(dims: &Dimensions) -> BoxExtents {
    BoxExtents {
        width: scaled(dims.length, 2.0),
        height: scaled(dims.height, 2.0),
        depth: scaled(dims.width, 2.0),
    }
}

/// Capsule extents; radius 1.5 and body 3 when unspecified.
pub(crate) fn capsule(dims: &Dimensions) -> CapsuleExtents {
    CapsuleExtents {
        radius: scaled(dims.radius, 1.5),
        body_height: scaled(dims.body_height, 3.0),
    }
}

/// Two spheres side by side with radius ratio 1:2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpherePair {
    /// Radius of the larger sphere (A).
    pub radius_a: f64,
    /// Radius of the smaller sphere (B).
    pub radius_b: f64,
    /// Centre x of sphere A.
    pub centre_a: f64,
    /// Centre x of sphere B.
    pub centre_b: f64,
}

pub(crate) const fn sphere_pair() -> SpherePair {
    let radius_b = 1.0;
    let radius_a = 2.0;
    let gap = 0.7;
    SpherePair {
        radius_a,
        radius_b,
        centre_a: radius_a + gap,
        centre_b: -(radius_a + radius_b + gap),
    }
}

/// Cone (apex down) carrying a hemispherical scoop on its rim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IceCreamLayout {
    /// Radius shared by the cone rim and the scoop.
    pub radius: f64,
    /// Height of the cone.
    pub cone_height: f64,
    /// Centre y of the cone.
    pub cone_y: f64,
}

impl IceCreamLayout {
    /// Height of the rim where the scoop sits.
    pub fn rim_y(&self) -> f64 {
        self.cone_y + self.cone_height / 2.0
    }

    /// Height of the cone's apex.
    pub fn apex_y(&self) -> f64 {
        self.cone_y - self.cone_height / 2.0
    }
}

pub(crate) const fn ice_cream() -> IceCreamLayout {
    IceCreamLayout {
        radius: 0.8,
        cone_height: 2.5,
        cone_y: -1.0,
    }
}
