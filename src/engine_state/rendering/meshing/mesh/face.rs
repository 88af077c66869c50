use cgmath::Point3;

use crate::engine_state::{
    rendering::vertex::{BillboardVertex, Vertex},
    voxels::block::{block_side::FaceDirection, AtlasRect},
};

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-left,
/// upper-right) as seen from outside the block. Corners are in chunk-local
/// coordinates, so they range over `0..=width` and `0..=height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner
    pub ll: Point3<u16>,
    /// Lower-right corner
    pub lr: Point3<u16>,
    /// Upper-left corner
    pub ul: Point3<u16>,
    /// Upper-right corner
    pub ur: Point3<u16>,
    /// Which side of the block this face represents
    pub direction: FaceDirection,
}

impl Face {
    /// Creates the face of the voxel at `(x, y, z)` that points towards `direction`.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - The coordinates of the voxel in chunk space
    /// * `direction` - Which side of the block this face represents
    pub fn new(x: u16, y: u16, z: u16, direction: FaceDirection) -> Self {
        let p = |dx: u16, dy: u16, dz: u16| Point3::new(x + dx, y + dy, z + dz);
        let (ll, lr, ul, ur) = match direction {
            FaceDirection::North => (p(1, 0, 0), p(0, 0, 0), p(1, 1, 0), p(0, 1, 0)),
            FaceDirection::South => (p(0, 0, 1), p(1, 0, 1), p(0, 1, 1), p(1, 1, 1)),
            FaceDirection::West => (p(0, 0, 0), p(0, 0, 1), p(0, 1, 0), p(0, 1, 1)),
            FaceDirection::East => (p(1, 0, 1), p(1, 0, 0), p(1, 1, 1), p(1, 1, 0)),
            FaceDirection::Bottom => (p(1, 0, 1), p(0, 0, 1), p(1, 0, 0), p(0, 0, 0)),
            FaceDirection::Top => (p(0, 1, 1), p(1, 1, 1), p(0, 1, 0), p(1, 1, 0)),
        };
        Face {
            ll,
            lr,
            ul,
            ur,
            direction,
        }
    }

    /// The same quad seen from the other side.
    ///
    /// Used for liquid surfaces, which must be visible from below as well.
    pub fn flipped(&self) -> Face {
        Face {
            ll: self.lr,
            lr: self.ll,
            ul: self.ur,
            ur: self.ul,
            direction: self.direction,
        }
    }

    /// Generates vertex data for this face.
    ///
    /// # Returns
    /// The four corners in `ll, lr, ul, ur` order, matching the indices from
    /// `generate_face_indices`.
    pub fn vertices(&self, atlas: AtlasRect) -> [Vertex; 4] {
        let corner = |p: Point3<u16>, u: u8, v: u8| Vertex::new([p.x, p.y, p.z], [u, v], self.direction);
        [
            corner(self.ll, atlas.min[0], atlas.min[1]),
            corner(self.lr, atlas.max[0], atlas.min[1]),
            corner(self.ul, atlas.min[0], atlas.max[1]),
            corner(self.ur, atlas.max[0], atlas.max[1]),
        ]
    }
}

/// Inset of the crossed billboard planes from the cell corners (`0.5 - 0.5/√2`).
const NEAR: f32 = 0.14645;
/// `1 - NEAR`
const FAR: f32 = 0.85355;

/// Generates the two crossed quads of a billboard at voxel `(x, y, z)`.
pub fn billboard_quads(x: u16, y: u16, z: u16, atlas: AtlasRect) -> [[BillboardVertex; 4]; 2] {
    let origin = [x as f32, y as f32, z as f32];
    let corner = |dx: f32, dy: f32, dz: f32, u: u8, v: u8| {
        BillboardVertex::new([origin[0] + dx, origin[1] + dy, origin[2] + dz], [u, v])
    };
    let ([min_u, min_v], [max_u, max_v]) = (atlas.min, atlas.max);
    [
        [
            corner(FAR, 0.0, FAR, min_u, min_v),
            corner(NEAR, 0.0, NEAR, max_u, min_v),
            corner(FAR, 1.0, FAR, min_u, max_v),
            corner(NEAR, 1.0, NEAR, max_u, max_v),
        ],
        [
            corner(NEAR, 0.0, FAR, min_u, min_v),
            corner(FAR, 0.0, NEAR, max_u, min_v),
            corner(NEAR, 1.0, FAR, min_u, max_v),
            corner(FAR, 1.0, NEAR, max_u, max_v),
        ],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faces_lie_on_their_plane() {
        for direction in FaceDirection::all() {
            let face = Face::new(3, 4, 5, direction);
            let corners = [face.ll, face.lr, face.ul, face.ur];
            let plane = |p: &Point3<u16>| match direction {
                FaceDirection::North => p.z == 5,
                FaceDirection::South => p.z == 6,
                FaceDirection::West => p.x == 3,
                FaceDirection::East => p.x == 4,
                FaceDirection::Bottom => p.y == 4,
                FaceDirection::Top => p.y == 5,
            };
            assert!(corners.iter().all(plane), "{direction:?}");
        }
    }

    #[test]
    fn flipped_swaps_sides() {
        let top = Face::new(0, 0, 0, FaceDirection::Top);
        let flipped = top.flipped();
        assert_eq!(flipped.ll, top.lr);
        assert_eq!(flipped.flipped(), top);
    }

    #[test]
    fn atlas_corners_follow_rect() {
        let vertices = Face::new(0, 0, 0, FaceDirection::West).vertices(AtlasRect::cell(2, 3));
        assert_eq!(vertices[0].atlas, [2, 3]);
        assert_eq!(vertices[3].atlas, [3, 4]);
        assert!(vertices.iter().all(|v| v.direction == FaceDirection::West.tag() as u16));
    }
}
