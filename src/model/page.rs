//! Page-level types.

use lopdf::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Page rotation, always a whole quarter turn clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum Rotation {
    /// Upright
    #[default]
    Deg0,
    /// A quarter turn clockwise
    Deg90,
    /// Upside down
    Deg180,
    /// Three quarter turns clockwise
    Deg270,
}

impl Rotation {
    /// All rotations in ascending order.
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Normalize an arbitrary angle to the nearest quarter turn.
    ///
    /// Negative and oversized angles wrap around: `-45` and `315` both
    /// become [`Rotation::Deg270`], `400` becomes [`Rotation::Deg90`].
    pub fn from_degrees(degrees: i64) -> Self {
        Self::from_degrees_f64(degrees as f64)
    }

    /// Like [`Rotation::from_degrees`] for fractional angles.
    pub fn from_degrees_f64(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return Rotation::Deg0;
        }
        let quarters = (degrees / 90.0).round() as i64;
        match quarters.rem_euclid(4) {
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            3 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Angle in degrees (0, 90, 180 or 270).
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Compose two rotations.
    pub fn add(self, other: Rotation) -> Rotation {
        Rotation::from_degrees(i64::from(self.degrees()) + i64::from(other.degrees()))
    }

    /// Whether this rotation swaps the page's width and height.
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(format!("{} is not a quarter turn", other)),
        }
    }
}

/// A single page in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points (1 point = 1/72 inch), before rotation
    pub width: f32,

    /// Page height in points, before rotation
    pub height: f32,

    /// Rotation applied by viewers
    pub rotation: Rotation,

    /// Lower-left corner of the visible box in user space
    #[serde(skip)]
    pub(crate) origin: (f32, f32),

    #[serde(skip)]
    pub(crate) id: ObjectId,
}

impl Page {
    /// Create a new upright page with the given dimensions.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            rotation: Rotation::Deg0,
            origin: (0.0, 0.0),
            id: (0, 0),
        }
    }

    /// Size as a viewer shows it, i.e. with width and height swapped for 90° and 270°.
    pub fn display_size(&self) -> (f32, f32) {
        if self.rotation.is_sideways() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Whether the displayed page is wider than it is tall.
    pub fn is_landscape(&self) -> bool {
        let (w, h) = self.display_size();
        w > h
    }

    /// The visible box as `[x0, y0, x1, y1]` in user space.
    pub fn bounds(&self) -> [f32; 4] {
        [
            self.origin.0,
            self.origin.1,
            self.origin.0 + self.width,
            self.origin.1 + self.height,
        ]
    }

    /// The lopdf object id of this page.
    pub fn object_id(&self) -> ObjectId {
        self.id
    }
}
