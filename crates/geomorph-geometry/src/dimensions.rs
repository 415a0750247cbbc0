//! Per-problem dimension table.
//!
//! Problems in the question bank quote concrete measurements ("a capsule of
//! radius 7 cm ..."). This table carries those numbers so the overlay can label
//! the model with the same values the learner reads in the question text.

use serde::{Deserialize, Serialize};

use crate::CompositeKind;

/// Sparse record of the measurements a problem mentions.
///
/// Every field is optional; the measurement synthesizer substitutes
/// shape-family defaults for anything left `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    /// Radius of a round solid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,

    /// Diameter of a round solid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,

    /// Height (or slant-free altitude).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    /// Edge length of a cube, pyramid base or prism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<f64>,

    /// Length of a box, or the third semi-axis of an ellipsoid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,

    /// Width of a box, or the first semi-axis of an ellipsoid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Height of a capsule's cylindrical body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_height: Option<f64>,

    /// Larger radius of a pair (frustum base, sphere A).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_a: Option<f64>,

    /// Smaller radius of a pair (frustum top, sphere B).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_b: Option<f64>,

    /// Major radius of a torus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_outer: Option<f64>,

    /// Tube radius of a torus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_inner: Option<f64>,

    /// Unit suffix appended to every label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_label: Option<String>,

    /// Literal label replacing the generated one for radius A.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_radius_a: Option<String>,

    /// Literal label replacing the generated one for radius B.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_radius_b: Option<String>,
}

impl Dimensions {
    /// Creates dimensions measured in centimetres.
    fn cm() -> Self {
        Self {
            unit_label: Some("cm".to_string()),
            ..Self::default()
        }
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Returns the measurements quoted by a problem, or empty dimensions when the
/// problem has no entry (or no id).
#[must_use]
pub fn problem_dimensions(problem_id: Option<u32>) -> Dimensions {
    let Some(id) = problem_id else {
        return Dimensions::default();
    };

    match id {
        1 => Dimensions {
            side: Some(4.0),
            ..Dimensions::cm()
        },
        2 => Dimensions {
            length: Some(10.0),
            width: Some(5.0),
            height: Some(4.0),
            ..Dimensions::cm()
        },
        5 => Dimensions {
            radius: Some(7.0),
            diameter: Some(14.0),
            ..Dimensions::cm()
        },
        7 => Dimensions {
            radius: Some(7.0),
            diameter: Some(14.0),
            height: Some(10.0),
            ..Dimensions::cm()
        },
        9 => Dimensions {
            radius: Some(3.0),
            diameter: Some(6.0),
            height: Some(4.0),
            ..Dimensions::cm()
        },
        11 => Dimensions {
            radius: Some(7.0),
            height: Some(24.0),
            ..Dimensions::cm()
        },
        13 => Dimensions {
            radius: Some(6.0),
            height: Some(10.0),
            ..Dimensions::cm()
        },
        15 => Dimensions {
            radius: Some(6.0),
            diameter: Some(12.0),
            ..Dimensions::cm()
        },
        18 => Dimensions {
            radius: Some(3.5),
            diameter: Some(7.0),
            height: Some(21.0),
            ..Dimensions::cm()
        },
        20 => Dimensions {
            side: Some(10.0),
            diameter: Some(10.0),
            ..Dimensions::cm()
        },
        22 => Dimensions {
            radius_a: Some(6.0),
            radius_b: Some(3.0),
            height: Some(8.0),
            ..Dimensions::cm()
        },
        24 => Dimensions {
            side: Some(6.0),
            height: Some(9.0),
            ..Dimensions::cm()
        },
        27 => Dimensions {
            radius_outer: Some(10.0),
            radius_inner: Some(3.0),
            ..Dimensions::cm()
        },
        29 => Dimensions {
            width: Some(5.0),
            height: Some(3.0),
            length: Some(4.0),
            ..Dimensions::cm()
        },
        31 => Dimensions {
            radius_b: Some(1.0),
            radius_a: Some(2.0),
            ..Dimensions::default()
        },
        34 => Dimensions {
            radius: Some(7.0),
            diameter: Some(14.0),
            height: Some(20.0),
            ..Dimensions::cm()
        },
        40 => Dimensions {
            radius: Some(3.0),
            diameter: Some(6.0),
            height: Some(12.0),
            ..Dimensions::cm()
        },
        45 => Dimensions {
            radius: Some(5.0),
            diameter: Some(10.0),
            height: Some(12.0),
            ..Dimensions::cm()
        },
        _ => Dimensions::default(),
    }
}

/// Applies composite-specific overrides on top of the table entry.
///
/// Capsules always carry a 7 cm radius over a 10 cm body; the double-sphere
/// problem labels its radii symbolically rather than numerically.
pub(crate) fn with_composite_overrides(kind: CompositeKind, dims: Dimensions) -> Dimensions {
    match kind {
        CompositeKind::Capsule => Dimensions {
            radius: Some(7.0),
            diameter: Some(14.0),
            body_height: Some(10.0),
            unit_label: Some("cm".to_string()),
            ..dims
        },
        CompositeKind::DoubleSphere => Dimensions {
            unit_label: Some("cm".to_string()),
            label_radius_b: Some("r_B = r".to_string()),
            label_radius_a: Some("r_A = 2r".to_string()),
            ..dims
        },
        _ => dims,
    }
}
