//! Session tests against the fake native library.

use navbridge_core::{
    AxisRotation, BuildSettings, CoordinateSystem, ErrorKind, GeometryBuffer, ModuleState,
    NativeModuleHandle, NavError, NavMeshData, SessionConfig, Vec3,
};
use navbridge_testkit::prelude::*;
use proptest::prelude::*;

fn mirrored() -> SessionConfig {
    SessionConfig::new()
        .coordinate_system(CoordinateSystem::LibraryHanded)
        .rotation(AxisRotation::Rotate90)
}

// ============================================================================
// Build
// ============================================================================

#[test]
fn quad_builds_with_default_settings() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    assert!(result.success());
    assert!(result.error().is_none());
    assert!(!result.data().unwrap().is_empty());

    let counters = fake::counters();
    assert_eq!(counters.build, 1);
    assert_eq!(counters.build_frees, 1);
    assert_eq!(counters.invalid_frees, 0);
    assert_eq!(counters.live_allocations, 0);

    let stats = session.stats().unwrap();
    assert_eq!(stats.poly_count, 2);
    assert_eq!(stats.vertex_count, 4);
}

#[test]
fn empty_vertices_rejected_without_native_call() {
    let mut session = fake_session(SessionConfig::default());
    let triangles = vec![[0, 1, 2]];

    let result = session.build(&GeometryBuffer::new(&[], &triangles), &BuildSettings::default());

    assert!(!result.success());
    assert!(result.data().is_none());
    assert!(!result.error_message().unwrap().is_empty());
    assert_eq!(result.error().unwrap().kind(), ErrorKind::InvalidInput);
    assert_eq!(fake::counters().work_calls(), 0);
}

#[test]
fn out_of_range_index_rejected_without_native_call() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, _) = quad();
    let triangles = vec![[0, 1, 4]];

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    assert!(matches!(result.error(), Some(NavError::InvalidInput { .. })));
    assert_eq!(fake::counters().build, 0);
}

#[test]
fn invalid_settings_rejected_without_native_call() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default().with_slope(120.0),
    );

    assert!(!result.success());
    assert!(result.error_message().unwrap().contains("walkableSlopeAngle"));
    assert_eq!(fake::counters().build, 0);
}

#[test]
fn build_before_init_fails_fast() {
    let mut session = navbridge_core::NavMeshSession::new(fake_handle(), SessionConfig::default());
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    assert!(matches!(result.error(), Some(NavError::ModuleNotLoaded)));
    assert_eq!(fake::counters().work_calls(), 0);
}

#[test]
fn native_failure_text_is_copied_and_released() {
    let mut session = fake_session(SessionConfig::default());
    fake::set_failures(FakeFailures {
        build: Some("could not rasterize triangles".into()),
        ..FakeFailures::default()
    });
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    assert!(result.data().is_none());
    let message = result.error_message().unwrap();
    assert!(message.contains("could not rasterize triangles"));
    assert_eq!(result.error().unwrap().kind(), ErrorKind::NativeCallFailure);

    let counters = fake::counters();
    assert_eq!(counters.build_frees, 1);
    assert_eq!(counters.live_allocations, 0);
    assert!(matches!(session.stats(), Err(NavError::NoMeshLoaded)));
}

#[test]
fn native_failure_without_text_gets_a_message() {
    let mut session = fake_session(SessionConfig::default());
    fake::set_failures(FakeFailures {
        build_silently: true,
        ..FakeFailures::default()
    });
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    assert!(!result.success());
    assert!(result.error_message().unwrap().contains("without a message"));
}

#[test]
fn success_without_data_is_a_failure() {
    let mut session = fake_session(SessionConfig::default());
    fake::set_failures(FakeFailures {
        build_without_data: true,
        ..FakeFailures::default()
    });
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    assert!(!result.success());
    assert!(result.data().is_none());
    assert_eq!(fake::counters().build_frees, 1);
}

#[test]
fn vertices_are_transformed_once_and_winding_flipped() {
    let config = mirrored();
    let transform = config.transform();
    let mut session = fake_session(config);
    let (vertices, triangles) = quad();

    let result = session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );
    assert!(result.success());

    let recorded = fake::last_build().unwrap();
    assert_eq!(recorded.vertices, transform.flatten_to_library(&vertices));
    assert_eq!(recorded.indices, vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(recorded.settings, BuildSettings::default().to_raw());
}

#[test]
fn host_handed_keeps_vertices_and_winding() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();

    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    let recorded = fake::last_build().unwrap();
    let expected: Vec<f32> = vertices.iter().flat_map(|v| v.to_array()).collect();
    assert_eq!(recorded.vertices, expected);
    assert_eq!(recorded.indices, vec![0, 2, 1, 0, 3, 2]);
}

// ============================================================================
// Path queries
// ============================================================================

#[test]
fn path_before_build_reports_no_mesh() {
    let mut session = fake_session(SessionConfig::default());

    let result = session.find_path(Vec3::new(1.0, 0.0, 1.0), Vec3::new(9.0, 0.0, 9.0));

    assert!(!result.success());
    assert!(result.points().is_none());
    assert!(result.error_message().unwrap().contains("no mesh loaded"));
    assert_eq!(fake::counters().find_path, 0);
}

#[test]
fn path_on_unloaded_handle_fails_fast() {
    let mut session = navbridge_core::NavMeshSession::new(fake_handle(), SessionConfig::default());
    let result = session.find_path(Vec3::ZERO, Vec3::ONE);
    assert!(matches!(result.error(), Some(NavError::ModuleNotLoaded)));
}

#[test]
fn path_points_return_in_host_space() {
    let mut session = fake_session(mirrored());
    let (vertices, triangles) = quad();
    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    let start = Vec3::new(1.0, 0.0, 2.0);
    let end = Vec3::new(8.0, 0.0, 9.0);
    let result = session.find_path(start, end);

    assert_eq!(result.points().unwrap(), &[start, end]);
    let counters = fake::counters();
    assert_eq!(counters.path_frees, 1);
    assert_eq!(counters.live_allocations, 0);
}

#[test]
fn native_path_is_converted_point_by_point() {
    let config = mirrored();
    let transform = config.transform();
    let mut session = fake_session(config);
    let (vertices, triangles) = quad();
    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    let library_path = vec![[0.0, 0.0, 0.0], [5.0, 0.0, -5.0], [10.0, 0.0, -10.0]];
    fake::set_path(Some(library_path.clone()));

    let result = session.find_path(Vec3::ZERO, Vec3::new(10.0, 0.0, 10.0));
    let expected: Vec<Vec3> = library_path
        .iter()
        .map(|p| transform.to_host(Vec3::from_array(*p)))
        .collect();
    assert_eq!(result.points().unwrap(), expected.as_slice());
}

#[test]
fn empty_native_path_is_empty_success() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();
    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );
    fake::set_path(Some(Vec::new()));

    let result = session.find_path(Vec3::ZERO, Vec3::ONE);
    assert!(result.success());
    assert!(result.points().unwrap().is_empty());
    assert_eq!(fake::counters().path_frees, 1);
}

#[test]
fn native_path_failure_is_released() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();
    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );
    fake::set_failures(FakeFailures {
        find_path: Some("start point is off the mesh".into()),
        ..FakeFailures::default()
    });

    let result = session.find_path(Vec3::new(-50.0, 0.0, -50.0), Vec3::ONE);

    assert!(result.points().is_none());
    assert!(result.error_message().unwrap().contains("off the mesh"));
    let counters = fake::counters();
    assert_eq!(counters.path_frees, 1);
    assert_eq!(counters.live_allocations, 0);
}

#[test]
fn non_finite_query_point_rejected() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();
    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );

    let result = session.find_path(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ONE);
    assert_eq!(result.error().unwrap().kind(), ErrorKind::InvalidInput);
    assert_eq!(fake::counters().find_path, 0);
}

// ============================================================================
// Persisted NavMesh data
// ============================================================================

#[test]
fn built_mesh_reloads_after_restart() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("level.navmesh");

    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();
    let data = session
        .build(
            &GeometryBuffer::new(&vertices, &triangles),
            &BuildSettings::default(),
        )
        .into_result()
        .unwrap();
    data.write_to(&path).unwrap();

    session.handle_mut().cleanup();
    session.handle_mut().init().unwrap();
    assert!(matches!(session.stats(), Err(NavError::NoMeshLoaded)));

    let restored = NavMeshData::read_from(&path).unwrap();
    let stats = session.load_nav_mesh(restored.as_bytes()).unwrap();
    assert_eq!(stats.poly_count, 2);
    assert_eq!(session.stats().unwrap(), stats);
    assert!(session.find_path(Vec3::ZERO, Vec3::ONE).success());
}

#[test]
fn garbage_navmesh_is_a_native_failure() {
    let mut session = fake_session(SessionConfig::default());
    let err = session.load_nav_mesh(b"definitely not a navmesh").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeCallFailure);
    assert!(!session.has_mesh());
    assert_eq!(fake::counters().live_allocations, 0);
}

#[test]
fn empty_navmesh_is_invalid_input() {
    let mut session = fake_session(SessionConfig::default());
    let err = session.load_nav_mesh(&[]).unwrap_err();
    assert!(matches!(err, NavError::InvalidInput { .. }));
    assert_eq!(fake::counters().load, 0);
}

// ============================================================================
// Handle lifecycle
// ============================================================================

#[test]
fn init_and_cleanup_are_idempotent() {
    let mut handle = fake_handle();
    handle.init().unwrap();
    handle.init().unwrap();
    assert_eq!(handle.state(), ModuleState::Loaded);
    assert_eq!(fake::counters().initialize, 1);

    handle.cleanup();
    handle.cleanup();
    assert_eq!(handle.state(), ModuleState::Unloaded);
    assert_eq!(fake::counters().cleanup, 1);
}

#[test]
fn failed_initialize_leaves_handle_unloaded() {
    let mut handle = fake_handle();
    fake::set_failures(FakeFailures {
        initialize: true,
        ..FakeFailures::default()
    });

    let err = handle.init().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeCallFailure);
    assert_eq!(handle.state(), ModuleState::Unloaded);
}

#[test]
fn missing_module_leaves_handle_unloaded() {
    let mut handle = NativeModuleHandle::with_loader("gone.so", Box::new(FakeLoader::missing()));
    assert!(matches!(handle.init(), Err(NavError::Ffi(_))));
    assert!(!handle.is_loaded());
}

#[test]
fn dropping_a_loaded_handle_cleans_up() {
    let mut handle = fake_handle();
    handle.init().unwrap();
    drop(handle);
    assert_eq!(fake::counters().cleanup, 1);
}

#[test]
fn unload_clears_mesh() {
    let mut session = fake_session(SessionConfig::default());
    let (vertices, triangles) = quad();
    session.build(
        &GeometryBuffer::new(&vertices, &triangles),
        &BuildSettings::default(),
    );
    assert!(session.has_mesh());

    session.handle_mut().cleanup();
    assert!(!session.has_mesh());
    assert!(matches!(session.stats(), Err(NavError::ModuleNotLoaded)));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn every_result_is_released_exactly_once(
        (vertices, triangles) in grid_strategy(),
        settings in build_settings_strategy(),
        transform in transform_strategy(),
    ) {
        let config = SessionConfig::new()
            .coordinate_system(transform.coordinate_system)
            .rotation(transform.rotation);
        let mut session = fake_session(config);

        let built = session.build(&GeometryBuffer::new(&vertices, &triangles), &settings);
        prop_assert!(built.success() != built.error().is_some());
        prop_assert!(built.success());

        let path = session.find_path(vertices[0], vertices[vertices.len() - 1]);
        prop_assert!(path.success() != path.error().is_some());

        let counters = fake::counters();
        prop_assert_eq!(counters.build_frees, 1);
        prop_assert_eq!(counters.path_frees, 1);
        prop_assert_eq!(counters.invalid_frees, 0);
        prop_assert_eq!(counters.live_allocations, 0);
    }

    #[test]
    fn query_endpoints_survive_the_boundary(
        start in point_strategy(),
        end in point_strategy(),
        transform in transform_strategy(),
    ) {
        let config = SessionConfig::new()
            .coordinate_system(transform.coordinate_system)
            .rotation(transform.rotation);
        let mut session = fake_session(config);
        let (vertices, triangles) = quad();
        session.build(&GeometryBuffer::new(&vertices, &triangles), &BuildSettings::default());

        let result = session.find_path(start, end);
        let points = result.points().unwrap();
        prop_assert_eq!(points.len(), 2);
        prop_assert!((points[0] - start).abs().max_element() <= 1e-5);
        prop_assert!((points[1] - end).abs().max_element() <= 1e-5);
    }
}
