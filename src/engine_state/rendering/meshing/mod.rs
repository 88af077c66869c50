//! Surface extraction for chunk columns.
//!
//! The `SurfaceMesher` turns a chunk's voxels plus the boundary layers of up to
//! four horizontal neighbors into a [`ChunkMesh`]:
//! 1. **Opaque**: faces of solid, transparent and leaves blocks
//! 2. **Liquid**: faces of liquid blocks; the surface is a double-sided quad and
//!    faces between two liquids are never emitted
//! 3. **Billboard**: two crossed quads per billboard block, regardless of its
//!    surroundings
//!
//! A face is emitted when the cell it looks at is see-through, or is a liquid
//! and the face's own block is not. Absent neighbors and the space above and
//! below the column count as air. Faces are culled but not merged, since every
//! face carries its own atlas cell.
//!
//! # Performance Considerations
//! - One pass over the voxels, O(width² · height)
//! - Meshing works on copied neighbor boundaries, so no neighbor lock is held

use crate::engine_state::voxels::{
    block::{block_side::FaceDirection, block_type::BlockClass, BlockRegistry, AIR},
    chunk::{BoundarySlice, VoxelStore},
};

mod mesh;

pub use mesh::*;

/// Boundary layers of the four horizontal neighbors of a chunk.
///
/// The slice stored for `face` is the neighbor's boundary on the opposite side,
/// i.e. the cells directly across the seam.
#[derive(Clone, Debug, Default)]
pub struct ChunkNeighbors {
    slices: [Option<BoundarySlice>; 4],
}

impl ChunkNeighbors {
    /// No neighbors at all; every seam is open to the air.
    pub fn none() -> Self {
        Self::default()
    }

    /// Records the neighbor across `face`.
    ///
    /// # Panics
    /// Panics if `slice` is not the neighbor's side facing back at this chunk.
    pub fn set(&mut self, face: FaceDirection, slice: BoundarySlice) {
        assert_eq!(slice.face, face.opposite(), "boundary taken from the wrong side");
        self.slices[face.horizontal_index()] = Some(slice);
    }

    /// Builder form of `set`.
    pub fn with(mut self, face: FaceDirection, slice: BoundarySlice) -> Self {
        self.set(face, slice);
        self
    }

    /// The neighbor layer across `face`, if that neighbor is available.
    pub fn get(&self, face: FaceDirection) -> Option<&BoundarySlice> {
        self.slices[face.horizontal_index()].as_ref()
    }

    /// Which of the four neighbors are available, indexed by horizontal face.
    pub fn presence(&self) -> [bool; 4] {
        std::array::from_fn(|i| self.slices[i].is_some())
    }
}

/// Converts voxels into triangle streams.
#[derive(Copy, Clone)]
pub struct SurfaceMesher {
    registry: BlockRegistry,
}

impl SurfaceMesher {
    /// Creates a mesher that reads block metadata from `registry`.
    pub fn new(registry: BlockRegistry) -> Self {
        SurfaceMesher { registry }
    }

    /// Meshes one chunk.
    ///
    /// # Arguments
    /// * `store` - The chunk's voxels
    /// * `neighbors` - Boundary layers of whichever neighbors are generated
    ///
    /// # Panics
    /// Panics if a neighbor slice has different dimensions than `store`.
    pub fn mesh(&self, store: &VoxelStore, neighbors: &ChunkNeighbors) -> ChunkMesh {
        for face in FaceDirection::horizontal() {
            if let Some(slice) = neighbors.get(face) {
                assert_eq!(slice.dimensions(), store.dimensions(), "mismatched neighbor column");
            }
        }

        let volume = ExposureVolume::build(store, neighbors, &self.registry);
        let mut mesh = ChunkMesh::default();

        for (index, id) in store.iter().enumerate() {
            if id == AIR {
                continue;
            }
            let (x, y, z) = store.coordinate_of(index);
            let (lx, ly, lz) = (x as u16, y as u16, z as u16);
            let block = self.registry.lookup(id);

            match block.class {
                BlockClass::Billboard => {
                    for quad in billboard_quads(lx, ly, lz, block.side) {
                        mesh.billboard.push_quad(quad);
                    }
                }
                BlockClass::Liquid => {
                    for face in FaceDirection::all() {
                        let atlas = block.atlas_for(face);
                        if face == FaceDirection::Top {
                            if !volume.neighbor_is_liquid(x, y, z, face) {
                                let surface = Face::new(lx, ly, lz, face);
                                mesh.liquid.push_quad(surface.vertices(atlas));
                                mesh.liquid.push_quad(surface.flipped().vertices(atlas));
                            }
                        } else if volume.exposes(block.class, x, y, z, face) {
                            mesh.liquid.push_quad(Face::new(lx, ly, lz, face).vertices(atlas));
                        }
                    }
                }
                class => {
                    for face in FaceDirection::all() {
                        if volume.exposes(class, x, y, z, face) {
                            let atlas = block.atlas_for(face);
                            mesh.opaque.push_quad(Face::new(lx, ly, lz, face).vertices(atlas));
                        }
                    }
                }
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::vertex::Vertex;
    use crate::engine_state::voxels::{
        block::{GLASS, GRASS_BLOCK, LAVA, POPPY, STONE_BLOCK, WATER},
        chunk::{ChunkCoordinate, ChunkDimensions},
        generation::{noise_settings::TerrainSettings, TerrainGenerator},
    };

    fn mesher() -> SurfaceMesher {
        SurfaceMesher::new(BlockRegistry::standard())
    }

    fn filled(dimensions: ChunkDimensions, id: u16) -> VoxelStore {
        VoxelStore::from_dense(dimensions, vec![id; dimensions.volume()])
    }

    fn count(stream: &MeshStream<Vertex>, face: FaceDirection) -> usize {
        stream
            .vertices
            .iter()
            .filter(|v| v.direction() == Some(face))
            .count()
            / 4
    }

    #[test]
    fn solid_column_only_shows_its_hull() {
        let dimensions = ChunkDimensions::new(4, 6);
        let mesh = mesher().mesh(&filled(dimensions, STONE_BLOCK), &ChunkNeighbors::none());
        assert_eq!(mesh.opaque.quad_count(), 2 * 4 * 4 + 4 * 4 * 6);
        assert!(mesh.liquid.is_empty() && mesh.billboard.is_empty());
        assert_eq!(mesh.opaque.indices.len(), mesh.opaque.quad_count() * 6);
    }

    #[test]
    fn liquids_hide_shared_faces() {
        let dimensions = ChunkDimensions::new(4, 4);
        let mut side_by_side = VoxelStore::new(dimensions);
        side_by_side.set(1, 1, 1, WATER);
        side_by_side.set(2, 1, 1, LAVA);
        let mesh = mesher().mesh(&side_by_side, &ChunkNeighbors::none());
        // 3 sides + bottom + double-sided top, for each cell
        assert_eq!(mesh.liquid.quad_count(), 12);

        let mut stacked = VoxelStore::new(dimensions);
        stacked.set(1, 1, 1, WATER);
        stacked.set(1, 2, 1, WATER);
        let mesh = mesher().mesh(&stacked, &ChunkNeighbors::none());
        assert_eq!(mesh.liquid.quad_count(), 11);
        assert!(mesh.opaque.is_empty());
    }

    #[test]
    fn solids_show_faces_towards_liquids() {
        let dimensions = ChunkDimensions::new(4, 4);
        let mut store = VoxelStore::new(dimensions);
        store.set(1, 1, 1, STONE_BLOCK);
        store.set(2, 1, 1, WATER);
        store.set(1, 2, 1, GLASS);
        let mesh = mesher().mesh(&store, &ChunkNeighbors::none());
        // stone: all six faces; glass: all but the one resting on the stone
        assert_eq!(mesh.opaque.quad_count(), 11);
        // water: no face towards the stone
        assert_eq!(count(&mesh.liquid, FaceDirection::West), 0);
        assert_eq!(mesh.liquid.quad_count(), 3 + 1 + 2);
    }

    #[test]
    fn billboards_are_two_crossed_quads() {
        let mut store = VoxelStore::new(ChunkDimensions::new(2, 2));
        store.set(0, 0, 0, POPPY);
        store.set(1, 0, 0, STONE_BLOCK);
        let mesh = mesher().mesh(&store, &ChunkNeighbors::none());
        assert_eq!(mesh.billboard.quad_count(), 2);
        assert_eq!(mesh.billboard.vertices[0].position, [0.85355, 0.0, 0.85355]);
        // the billboard does not hide the stone's west face
        assert_eq!(count(&mesh.opaque, FaceDirection::West), 1);
    }

    #[test]
    fn present_neighbors_close_seams() {
        let dimensions = ChunkDimensions::new(4, 6);
        let stone = filled(dimensions, STONE_BLOCK);
        let neighbors = ChunkNeighbors::none()
            .with(FaceDirection::East, stone.boundary(FaceDirection::West))
            .with(FaceDirection::North, filled(dimensions, WATER).boundary(FaceDirection::South));

        let mesh = mesher().mesh(&stone, &neighbors);
        assert_eq!(count(&mesh.opaque, FaceDirection::East), 0);
        assert_eq!(count(&mesh.opaque, FaceDirection::North), 4 * 6);
        assert_eq!(mesh.opaque.quad_count(), 2 * 4 * 4 + 3 * 4 * 6);
    }

    #[test]
    #[should_panic(expected = "boundary taken from the wrong side")]
    fn neighbor_slices_must_face_back() {
        let stone = filled(ChunkDimensions::new(2, 2), STONE_BLOCK);
        ChunkNeighbors::none().set(FaceDirection::East, stone.boundary(FaceDirection::East));
    }

    #[test]
    fn flat_chunk_mesh_is_surface_walls_and_floor() {
        let dimensions = ChunkDimensions::default();
        let generator =
            TerrainGenerator::new(0, TerrainSettings::flat(), dimensions, &BlockRegistry::standard()).unwrap();
        let store = generator.generate(ChunkCoordinate::new(0, 0));
        let mesh = mesher().mesh(&store, &ChunkNeighbors::none());

        assert_eq!(count(&mesh.opaque, FaceDirection::Top), 32 * 32);
        assert_eq!(count(&mesh.opaque, FaceDirection::Bottom), 32 * 32);
        for face in FaceDirection::horizontal() {
            assert_eq!(count(&mesh.opaque, face), 32 * 65, "{face:?}");
        }
        for vertex in &mesh.opaque.vertices {
            match vertex.direction() {
                Some(FaceDirection::Top) => {
                    assert_eq!(vertex.position[1], 65);
                    assert!(vertex.atlas[0] <= 1 && vertex.atlas[1] <= 1);
                }
                Some(FaceDirection::Bottom) => assert_eq!(vertex.position[1], 0),
                _ => assert!(vertex.position[1] <= 65),
            }
        }
        assert!(mesh.liquid.is_empty() && mesh.billboard.is_empty());
        assert_eq!(store.get(5, 64, 5), GRASS_BLOCK);
    }
}
