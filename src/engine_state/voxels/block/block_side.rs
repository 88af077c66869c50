//! # Block Side Module
//!
//! The six axis-aligned faces of a voxel and the tag each one carries into the
//! vertex stream.

use cgmath::Vector3;
use num_derive::FromPrimitive;

/// One of the six faces of a voxel.
///
/// The discriminant is the face-direction tag written into every vertex and is
/// read by the shader for directional lighting, so the numbering is fixed:
/// North=0, South=1, West=2, East=3, Bottom=4, Top=5.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, FromPrimitive)]
pub enum FaceDirection {
    /// Facing negative Z
    North = 0,
    /// Facing positive Z
    South = 1,
    /// Facing negative X
    West = 2,
    /// Facing positive X
    East = 3,
    /// Facing negative Y
    Bottom = 4,
    /// Facing positive Y
    Top = 5,
}

impl FaceDirection {
    /// Returns all six faces in tag order.
    pub fn all() -> [FaceDirection; 6] {
        [
            FaceDirection::North,
            FaceDirection::South,
            FaceDirection::West,
            FaceDirection::East,
            FaceDirection::Bottom,
            FaceDirection::Top,
        ]
    }

    /// Returns the four faces that can border another chunk column.
    ///
    /// The position of each face in the returned array equals its tag, which is
    /// also how per-neighbor arrays are indexed throughout the crate.
    pub fn horizontal() -> [FaceDirection; 4] {
        [
            FaceDirection::North,
            FaceDirection::South,
            FaceDirection::West,
            FaceDirection::East,
        ]
    }

    /// Decodes a face-direction tag.
    ///
    /// # Returns
    /// `None` for values outside `0..=5`.
    pub fn from_tag(tag: u8) -> Option<FaceDirection> {
        num::FromPrimitive::from_u8(tag)
    }

    /// The tag written into vertex data for this face.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Index into a four-element per-neighbor array.
    ///
    /// # Panics
    /// Panics for `Top` and `Bottom`, which never border another column.
    pub fn horizontal_index(self) -> usize {
        assert!(
            self.is_horizontal(),
            "{self:?} does not border a neighboring column"
        );
        self as usize
    }

    /// Whether this face points along the X or Z axis.
    pub fn is_horizontal(self) -> bool {
        !matches!(self, FaceDirection::Bottom | FaceDirection::Top)
    }

    /// The face pointing the opposite way.
    pub fn opposite(self) -> FaceDirection {
        match self {
            FaceDirection::North => FaceDirection::South,
            FaceDirection::South => FaceDirection::North,
            FaceDirection::West => FaceDirection::East,
            FaceDirection::East => FaceDirection::West,
            FaceDirection::Bottom => FaceDirection::Top,
            FaceDirection::Top => FaceDirection::Bottom,
        }
    }

    /// Unit offset to the cell this face looks at.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            FaceDirection::North => Vector3::new(0, 0, -1),
            FaceDirection::South => Vector3::new(0, 0, 1),
            FaceDirection::West => Vector3::new(-1, 0, 0),
            FaceDirection::East => Vector3::new(1, 0, 0),
            FaceDirection::Bottom => Vector3::new(0, -1, 0),
            FaceDirection::Top => Vector3::new(0, 1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for face in FaceDirection::all() {
            assert_eq!(FaceDirection::from_tag(face.tag()), Some(face));
        }
        assert_eq!(FaceDirection::from_tag(6), None);
    }

    #[test]
    fn opposite_offsets_cancel() {
        for face in FaceDirection::all() {
            assert_eq!(face.offset() + face.opposite().offset(), Vector3::new(0, 0, 0));
        }
    }

    #[test]
    fn horizontal_faces_are_indexed_by_tag() {
        for (index, face) in FaceDirection::horizontal().into_iter().enumerate() {
            assert_eq!(face.horizontal_index(), index);
        }
    }
}
