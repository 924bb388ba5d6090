use std::time::Duration;

use particle_backdrop::core::{Container, ManualClock, ManualFrames, Viewport};
use particle_backdrop::render::{HeadlessContainer, RenderSurface};
use particle_backdrop::{Backdrop, BackdropConfig, BackdropError, Lifecycle, Simulation};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const FRAME: Duration = Duration::from_millis(16);

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn small_config() -> BackdropConfig {
    BackdropConfig {
        particle_count: 200,
        shape_count: 6,
        ..Default::default()
    }
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[test]
fn test_mount_animate_and_tear_down() {
    let container = HeadlessContainer::new(800, 600);
    let mut sim = Simulation::start_in(BackdropConfig::default(), container.clone(), &mut rng(1))
        .unwrap();

    // One child surface of the container's size
    assert_eq!(container.child_count(), 1);
    assert_eq!(container.child_viewports(), vec![Viewport::new(800, 600)]);

    // One second later the field has turned 0.1 rad around y
    assert!(sim.step(Duration::from_millis(1000)));
    let rotation = sim.snapshot().unwrap().particle_rotation;
    assert!((rotation[1] - 0.1).abs() < 1e-4, "rotation.y = {}", rotation[1]);
    assert!((rotation[0] - 0.05).abs() < 1e-4);

    sim.stop();
    assert_eq!(container.child_count(), 0);
    assert_eq!(sim.frames().pending(), None);
    assert_eq!(sim.backdrop().pending_frame(), None);
    assert_eq!(container.leaked_resources(), 0);
    assert_eq!(sim.backdrop().lifecycle(), Lifecycle::Stopped);
}

// ============================================================================
// Surface sizing
// ============================================================================

#[test]
fn test_surface_matches_viewport() {
    for (width, height) in [(1, 1), (640, 480), (800, 600), (1920, 1080), (3840, 2160)] {
        let sim = Simulation::start(small_config(), width, height, &mut rng(2)).unwrap();
        let surface = sim.backdrop().surface().unwrap();
        assert_eq!(surface.viewport(), Viewport::new(width, height));
    }
}

#[test]
fn test_camera_aspect_follows_start_viewport() {
    let sim = Simulation::start(small_config(), 1280, 720, &mut rng(3)).unwrap();
    let aspect = sim.backdrop().scene().unwrap().camera.aspect;
    assert!((aspect - 1280.0 / 720.0).abs() < 1e-6);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_tracks_latest_dimensions() {
    let mut sim = Simulation::start(small_config(), 800, 600, &mut rng(4)).unwrap();

    for (width, height) in [(1024, 768), (300, 900), (1920, 1080)] {
        sim.resize(width, height);
        sim.step(FRAME);
    }

    let backdrop = sim.backdrop();
    let aspect = backdrop.scene().unwrap().camera.aspect;
    assert_eq!(aspect, 1920.0 / 1080.0);
    assert_eq!(backdrop.surface().unwrap().viewport(), Viewport::new(1920, 1080));
    assert_eq!(sim.container().child_viewports(), vec![Viewport::new(1920, 1080)]);
}

#[test]
fn test_resize_is_idempotent() {
    let mut sim = Simulation::start(small_config(), 800, 600, &mut rng(5)).unwrap();

    sim.resize(1024, 512);
    let once = sim.backdrop().scene().unwrap().camera.aspect;
    sim.resize(1024, 512);
    sim.resize(1024, 512);
    let thrice = sim.backdrop().scene().unwrap().camera.aspect;

    assert_eq!(once, 2.0);
    assert_eq!(once, thrice);
}

#[test]
fn test_zero_sized_resize_is_ignored() {
    let mut sim = Simulation::start(small_config(), 800, 600, &mut rng(6)).unwrap();
    sim.resize(0, 0);

    let backdrop = sim.backdrop();
    assert_eq!(backdrop.surface().unwrap().viewport(), Viewport::new(800, 600));
    assert!((backdrop.scene().unwrap().camera.aspect - 800.0 / 600.0).abs() < 1e-6);
}

// ============================================================================
// Frame chain
// ============================================================================

#[test]
fn test_each_frame_schedules_exactly_one_successor() {
    let mut sim = Simulation::start(small_config(), 320, 240, &mut rng(7)).unwrap();
    assert_eq!(sim.frames().requested(), 1);

    let rendered = sim.run(30, FRAME);
    assert_eq!(rendered, 30);
    assert_eq!(sim.frames().requested(), 31);
    assert_eq!(sim.backdrop().frame_count(), 31);
    assert_eq!(sim.container().frames_presented(), 31);
}

#[test]
fn test_no_frames_after_stop() {
    let mut sim = Simulation::start(small_config(), 320, 240, &mut rng(8)).unwrap();
    sim.run(5, FRAME);
    let request = sim.frames().pending().unwrap();

    sim.stop();
    let count = sim.backdrop().frame_count();
    let presented = sim.container().frames_presented();
    assert_eq!(sim.frames().cancelled(), 1);

    // A frame that raced with stop is dropped
    assert!(!sim.backdrop_mut().on_frame(request));
    assert_eq!(sim.run(10, FRAME), 0);

    assert_eq!(sim.backdrop().frame_count(), count);
    assert_eq!(sim.container().frames_presented(), presented);
}

#[test]
fn test_stop_twice_is_safe() {
    let mut sim = Simulation::start(small_config(), 320, 240, &mut rng(9)).unwrap();
    sim.stop();
    sim.stop();

    assert_eq!(sim.backdrop().lifecycle(), Lifecycle::Stopped);
    assert_eq!(sim.frames().cancelled(), 1);
    assert_eq!(sim.container().child_count(), 0);
}

#[test]
fn test_resize_after_stop_is_ignored() {
    let mut sim = Simulation::start(small_config(), 320, 240, &mut rng(10)).unwrap();
    sim.stop();
    sim.resize(640, 480);

    assert!(sim.backdrop().scene().is_none());
    assert_eq!(sim.container().child_count(), 0);
}

// ============================================================================
// Animation invariants
// ============================================================================

#[test]
fn test_shapes_bob_within_amplitude() {
    let config = small_config();
    let amplitude = config.float_amplitude;
    let mut sim = Simulation::start(config, 320, 240, &mut rng(11)).unwrap();

    for _ in 0..2000 {
        sim.step(FRAME);
        for shape in &sim.backdrop().scene().unwrap().shapes {
            assert!(
                (shape.position.y - shape.base_y).abs() <= amplitude + 1e-4,
                "shape drifted to {} from {}",
                shape.position.y,
                shape.base_y
            );
        }
    }
}

#[test]
fn test_rotation_depends_only_on_elapsed_time() {
    // Different seeds and frame cadence, same elapsed time
    let mut fast = Simulation::start(small_config(), 320, 240, &mut rng(12)).unwrap();
    let mut slow = Simulation::start(small_config(), 640, 480, &mut rng(13)).unwrap();

    fast.run(100, Duration::from_millis(25));
    slow.run(10, Duration::from_millis(250));

    let a = fast.snapshot().unwrap().particle_rotation;
    let b = slow.snapshot().unwrap().particle_rotation;
    for axis in 0..3 {
        assert!((a[axis] - b[axis]).abs() < 1e-4);
    }
}

#[test]
fn test_rotation_progresses_monotonically() {
    let mut sim = Simulation::start(small_config(), 320, 240, &mut rng(14)).unwrap();
    let mut previous = sim.snapshot().unwrap().particle_rotation[1];

    for _ in 0..50 {
        sim.step(FRAME);
        let current = sim.snapshot().unwrap().particle_rotation[1];
        assert!(current > previous);
        previous = current;
    }
}

#[test]
fn test_same_seed_same_scene() {
    let a = Simulation::start(small_config(), 320, 240, &mut rng(15)).unwrap();
    let b = Simulation::start(small_config(), 320, 240, &mut rng(15)).unwrap();

    let (a, b) = (a.snapshot().unwrap(), b.snapshot().unwrap());
    for (sa, sb) in a.shapes.iter().zip(&b.shapes) {
        assert_eq!(sa.kind, sb.kind);
        assert_eq!(sa.position, sb.position);
        assert_eq!(sa.scale, sb.scale);
    }
}

#[test]
fn test_counts_fixed_for_session() {
    let mut sim = Simulation::start(small_config(), 320, 240, &mut rng(16)).unwrap();
    sim.run(100, FRAME);

    let scene = sim.backdrop().scene().unwrap();
    assert_eq!(scene.particles.len(), 200);
    assert_eq!(scene.shapes.len(), 6);
    assert_eq!(sim.backdrop().surface().unwrap().live_resources(), 2 * 7);
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_missing_renderer_is_fatal_at_start() {
    let container = HeadlessContainer::without_renderer(800, 600);
    let result = Simulation::start_in(small_config(), container.clone(), &mut rng(17));

    assert!(matches!(result, Err(BackdropError::Adapter(_))));
    assert_eq!(container.child_count(), 0);
}

#[test]
fn test_partial_upload_rolls_back() {
    // Room for the particle field and two shapes, not all six
    let container = HeadlessContainer::new(800, 600).with_resource_limit(6);
    let frames = ManualFrames::new();
    let mut backdrop = Backdrop::new(small_config(), frames.clone(), ManualClock::new());

    let err = backdrop.start(container.clone(), &mut rng(18)).unwrap_err();

    assert!(matches!(err, BackdropError::Surface(_)));
    assert_eq!(backdrop.lifecycle(), Lifecycle::Uninitialized);
    assert_eq!(container.child_count(), 0);
    assert_eq!(container.leaked_resources(), 0);
    assert_eq!(frames.requested(), 0);
}

#[test]
fn test_bad_config_file_is_an_error_not_a_crash() {
    for json in [
        r#"{ "shape_scale": [1.0, 0.4] }"#,
        r#"{ "particle_extent": -5.0 }"#,
        r#"{ "max_rotation_speed": -0.02 }"#,
    ] {
        let err = BackdropConfig::from_json(json).unwrap_err();
        assert!(matches!(err, BackdropError::InvalidConfig { .. }), "{}", json);
    }
}

#[test]
fn test_bad_config_in_code_is_refused_at_start() {
    let config = BackdropConfig {
        particle_extent: -5.0,
        ..small_config()
    };
    let container = HeadlessContainer::new(800, 600);
    let result = Simulation::start_in(config, container.clone(), &mut rng(19));

    assert!(matches!(
        result,
        Err(BackdropError::InvalidConfig { field: "particle_extent", .. })
    ));
    assert_eq!(container.child_count(), 0);
}
