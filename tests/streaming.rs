use std::{
    collections::HashSet,
    thread,
    time::{Duration, Instant},
};

use cgmath::Point3;
use voxel_streamer::engine_state::{
    buffer_state::{
        chunk_arenas::{ChunkArenas, StreamKind},
        ArenaError, HostBuffer,
    },
    config::{CompactionConfig, WorldConfig},
    rendering::vertex::Vertex,
    voxels::{
        block::{block_side::FaceDirection, BlockRegistry, AIR, DIRT_BLOCK, GRASS_BLOCK},
        chunk::{ChunkCoordinate, ChunkDimensions},
        generation::noise_settings::TerrainSettings,
        streamer::{coordinates_within, ChunkStreamer},
    },
    EngineError, EngineState,
};

const WIDTH: usize = 8;
const SURFACE: i32 = 20;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn small_world() -> WorldConfig {
    WorldConfig {
        seed: 3,
        render_distance: 2,
        worker_count: 2,
        dimensions: ChunkDimensions::new(WIDTH, 32),
        terrain: TerrainSettings {
            base_height: SURFACE,
            water_level: SURFACE,
            ..TerrainSettings::flat()
        },
        compaction: CompactionConfig {
            enabled: true,
            hot_chunks: 4,
        },
        ..Default::default()
    }
}

fn viewer_in(coordinate: ChunkCoordinate) -> Point3<f32> {
    let half = WIDTH as f32 / 2.0;
    Point3::new(
        coordinate.x as f32 * WIDTH as f32 + half,
        40.0,
        coordinate.z as f32 * WIDTH as f32 + half,
    )
}

fn settle(engine: &mut EngineState<HostBuffer>, viewer: Point3<f32>) {
    let deadline = Instant::now() + Duration::from_secs(20);
    loop {
        engine.tick(viewer).unwrap();
        if engine.streamer.is_settled() {
            return;
        }
        assert!(Instant::now() < deadline, "streamer never settled");
        thread::sleep(Duration::from_millis(2));
    }
}

fn is_drawn(engine: &EngineState<HostBuffer>, coordinate: ChunkCoordinate) -> bool {
    engine
        .render_list()
        .iter()
        .any(|draw| draw.coordinate == coordinate)
}

fn loaded(engine: &EngineState<HostBuffer>) -> HashSet<ChunkCoordinate> {
    engine.streamer.loaded_coordinates().into_iter().collect()
}

fn west_facing_vertices(engine: &EngineState<HostBuffer>, coordinate: ChunkCoordinate) -> Vec<Vertex> {
    let chunk = engine.streamer.chunk(coordinate).unwrap();
    let Some(handle) = chunk.geometry().opaque else {
        return Vec::new();
    };
    let bytes = engine
        .arenas
        .stream(StreamKind::Opaque)
        .vertices
        .buffer()
        .read(&handle.vertices);
    let vertices: Vec<Vertex> = bytemuck::pod_collect_to_vec(bytes);
    vertices
        .into_iter()
        .filter(|vertex| vertex.direction() == Some(FaceDirection::West))
        .collect()
}

#[test]
fn table_matches_render_distance_after_moves() {
    init();
    let config = small_world();
    let mut engine = EngineState::headless(&config).unwrap();

    for center in [
        ChunkCoordinate::new(0, 0),
        ChunkCoordinate::new(1, 0),
        ChunkCoordinate::new(4, -3),
        ChunkCoordinate::new(-2, 5),
    ] {
        settle(&mut engine, viewer_in(center));
        let expected: HashSet<_> = coordinates_within(center, config.render_distance)
            .into_iter()
            .collect();
        assert_eq!(loaded(&engine), expected);
        assert_eq!(engine.render_list().len(), expected.len());
    }

    let (streamer, arenas) = engine.stats();
    assert_eq!(streamer.awaiting_eviction, 0);
    assert!(arenas.live_nodes > 0);
    assert!(arenas.leaked_bytes > 0);
}

#[test]
fn render_distance_change_takes_effect() {
    init();
    let mut engine = EngineState::headless(&small_world()).unwrap();
    let origin = ChunkCoordinate::new(0, 0);
    settle(&mut engine, viewer_in(origin));
    assert_eq!(loaded(&engine).len(), 13);

    engine.streamer.set_render_distance(1);
    settle(&mut engine, viewer_in(origin));
    assert_eq!(loaded(&engine).len(), 5);
}

#[test]
fn boundary_edit_remeshes_both_sides() {
    init();
    let mut engine = EngineState::headless(&small_world()).unwrap();
    let viewer = viewer_in(ChunkCoordinate::new(0, 0));
    settle(&mut engine, viewer);

    let origin = ChunkCoordinate::new(0, 0);
    let east = ChunkCoordinate::new(1, 0);
    assert_eq!(engine.streamer.block_at(WIDTH as i32 - 1, SURFACE, 0), Some(GRASS_BLOCK));
    assert!(west_facing_vertices(&engine, east).is_empty());

    let before = (
        engine.streamer.chunk(origin).unwrap().mesh_revision(),
        engine.streamer.chunk(east).unwrap().mesh_revision(),
    );
    assert!(engine.place_or_remove_block(WIDTH as i32 - 1, SURFACE, 0, AIR));
    settle(&mut engine, viewer);

    assert_eq!(engine.streamer.block_at(WIDTH as i32 - 1, SURFACE, 0), Some(AIR));
    assert!(engine.streamer.chunk(origin).unwrap().mesh_revision() > before.0);
    assert!(engine.streamer.chunk(east).unwrap().mesh_revision() > before.1);

    // The grass cell across the seam now shows its west side.
    let exposed = west_facing_vertices(&engine, east);
    assert_eq!(exposed.len(), 4);
    assert!(exposed.iter().all(|vertex| vertex.position[0] == 0));
    assert!(exposed.iter().any(|vertex| vertex.position[1] == SURFACE as u16 + 1));
}

#[test]
fn edits_outside_the_column_are_rejected() {
    init();
    let mut engine = EngineState::headless(&small_world()).unwrap();
    settle(&mut engine, viewer_in(ChunkCoordinate::new(0, 0)));

    assert!(!engine.place_or_remove_block(0, -1, 0, AIR));
    assert!(!engine.place_or_remove_block(0, 32, 0, AIR));
    assert!(!engine.place_or_remove_block(100 * WIDTH as i32, 10, 0, AIR));
    assert_eq!(engine.streamer.block_at(-1, SURFACE - 1, -1), Some(DIRT_BLOCK));
}

#[test]
fn idle_chunks_are_compacted() {
    init();
    let mut engine = EngineState::headless(&small_world()).unwrap();
    settle(&mut engine, viewer_in(ChunkCoordinate::new(0, 0)));

    let (streamer, _) = engine.stats();
    assert!(streamer.compact > 0);
    assert!(streamer.compact <= streamer.loaded);
    // Compacted chunks still answer reads.
    for coordinate in engine.streamer.loaded_coordinates() {
        let x = coordinate.x * WIDTH as i32;
        let z = coordinate.z * WIDTH as i32;
        assert_eq!(engine.streamer.block_at(x, SURFACE, z), Some(GRASS_BLOCK));
    }
}

#[test]
fn edited_chunks_stay_drawable_until_the_next_tick() {
    init();
    let mut engine = EngineState::headless(&small_world()).unwrap();
    let origin = ChunkCoordinate::new(0, 0);
    let viewer = viewer_in(origin);
    settle(&mut engine, viewer);

    let chunk = engine.streamer.chunk(origin).unwrap();
    let revision = chunk.mesh_revision();
    assert!(engine.place_or_remove_block(3, SURFACE, 3, AIR));

    // Poll without ticking: the old geometry stays listed while the new mesh waits.
    let deadline = Instant::now() + Duration::from_secs(20);
    while chunk.mesh_revision() == revision {
        assert!(is_drawn(&engine, origin));
        assert!(Instant::now() < deadline, "edit was never remeshed");
        thread::sleep(Duration::from_millis(1));
    }
    assert!(chunk.has_pending_mesh());
    assert!(is_drawn(&engine, origin));

    settle(&mut engine, viewer);
    assert!(!chunk.has_pending_mesh());
    assert!(is_drawn(&engine, origin));
}

#[test]
fn eviction_reopens_seams_of_remaining_chunks() {
    init();
    let mut engine = EngineState::headless(&small_world()).unwrap();
    settle(&mut engine, viewer_in(ChunkCoordinate::new(0, 0)));

    let edge = ChunkCoordinate::new(-1, 0);
    let evicted = ChunkCoordinate::new(-2, 0);
    assert!(engine.streamer.chunk(evicted).is_some());
    assert!(west_facing_vertices(&engine, edge).is_empty());

    settle(&mut engine, viewer_in(ChunkCoordinate::new(1, 0)));
    assert!(engine.streamer.chunk(evicted).is_none());
    assert!(engine.streamer.chunk(edge).is_some());

    // One west face per solid cell along the open side: y = 0..=SURFACE.
    let exposed = west_facing_vertices(&engine, edge);
    assert_eq!(exposed.len(), WIDTH * (SURFACE as usize + 1) * 4);
    assert!(exposed.iter().all(|vertex| vertex.position[0] == 0));
}

#[test]
fn arena_exhaustion_surfaces_from_tick() {
    init();
    let config = small_world();
    let mut engine = EngineState {
        streamer: ChunkStreamer::new(&config, BlockRegistry::standard()).unwrap(),
        arenas: ChunkArenas::new(|_, _, _| HostBuffer::new(0).with_limit(64)),
    };
    let viewer = viewer_in(ChunkCoordinate::new(0, 0));

    let deadline = Instant::now() + Duration::from_secs(20);
    let error = loop {
        match engine.tick(viewer) {
            Err(error) => break error,
            Ok(()) => {
                assert!(Instant::now() < deadline, "upload never failed");
                thread::sleep(Duration::from_millis(2));
            }
        }
    };
    assert!(matches!(
        error,
        EngineError::Arena(ArenaError::CapacityExceeded { limit: 64, .. })
    ));
}
