//! Device and session lifecycle against the simulated camera service

use ndcam::status::CameraStatus;
use ndcam::testing::{SimulatedCamera, SimulatedPlatform, SimulatedWindow};
use ndcam::{
    CameraContext, CaptureMode, ErrorKind, FacingDirection, ImageFormat, NdcamConfig,
    SessionState, StreamConfig, StreamDirection, Surface,
};
use std::sync::Arc;

fn setup() -> (SimulatedPlatform, CameraContext) {
    let platform = SimulatedPlatform::with_standard_rig();
    let context = CameraContext::with_defaults(Arc::new(platform.clone()));
    context.initialize().expect("initialize");
    (platform, context)
}

fn surface() -> Surface {
    Surface::new(SimulatedWindow::valid())
}

#[test]
fn test_device_count_before_and_after_initialize() {
    let platform = SimulatedPlatform::with_standard_rig();
    let context = CameraContext::with_defaults(Arc::new(platform.clone()));
    assert_eq!(context.device_count(), 0);

    context.initialize().unwrap();
    assert_eq!(context.device_count(), 3);

    context.initialize().unwrap();
    assert_eq!(context.device_count(), 3);
    assert_eq!(platform.live_managers(), 1);
}

#[test]
fn test_sixteen_devices_fit_seventeen_do_not() {
    let cameras = |n: usize| {
        (0..n)
            .map(|i| SimulatedCamera::new(i.to_string(), FacingDirection::Back, &[]))
            .collect::<Vec<_>>()
    };

    let context = CameraContext::with_defaults(Arc::new(SimulatedPlatform::new(cameras(16))));
    context.initialize().unwrap();
    assert_eq!(context.device_count(), 16);

    let context = CameraContext::with_defaults(Arc::new(SimulatedPlatform::new(cameras(17))));
    let err = context.initialize().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert_eq!(context.device_count(), 0);
}

#[test]
fn test_initialize_failures() {
    let platform = SimulatedPlatform::with_standard_rig();
    platform.fail_create_manager(CameraStatus::CameraService);
    let context = CameraContext::with_defaults(Arc::new(platform.clone()));
    assert_eq!(
        context.initialize().unwrap_err().kind(),
        ErrorKind::ManagerUnavailable
    );

    platform.clear_faults();
    platform.fail_camera_ids(CameraStatus::Unknown);
    assert_eq!(
        context.initialize().unwrap_err().kind(),
        ErrorKind::ManagerUnavailable
    );
    assert_eq!(platform.live_managers(), 0);

    platform.clear_faults();
    platform.fail_characteristics("2", CameraStatus::MetadataNotFound);
    let err = context.initialize().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MetadataUnavailable);
    assert_eq!(err.status, Some(CameraStatus::MetadataNotFound));
    assert_eq!(context.device_count(), 0);
    assert_eq!(platform.live_managers(), 0);

    platform.clear_faults();
    context.initialize().unwrap();
    assert_eq!(context.device_count(), 3);
}

#[test]
fn test_facing_is_stable() {
    let (_platform, context) = setup();
    let expected = [
        FacingDirection::Back,
        FacingDirection::Front,
        FacingDirection::External,
    ];
    for _ in 0..3 {
        for (index, facing) in expected.iter().enumerate() {
            assert_eq!(context.facing(index as u16).unwrap(), *facing);
        }
    }
    assert_eq!(context.facing(3).unwrap_err().kind(), ErrorKind::InvalidIndex);
}

#[test]
fn test_missing_lens_facing_is_unknown() {
    let platform = SimulatedPlatform::new(vec![SimulatedCamera::new(
        "usb",
        FacingDirection::Unknown,
        &[],
    )]);
    let context = CameraContext::with_defaults(Arc::new(platform));
    context.initialize().unwrap();
    assert_eq!(context.facing(0).unwrap(), FacingDirection::Unknown);
}

#[test]
fn test_open_close_open_does_not_leak() {
    let (platform, context) = setup();

    context.open(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(platform.live_devices(), 1);

    context.close(0).unwrap();
    context.close(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Closed);
    assert_eq!(platform.live_devices(), 0);

    context.open(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(platform.live_devices(), 1);
    assert_eq!(platform.open_count(), 2);
}

#[test]
fn test_reopen_while_streaming_closes_previous_handles() {
    let (platform, context) = setup();
    context.open(1).unwrap();
    context.start_repeat(1, &surface()).unwrap();
    assert_eq!(platform.live_sessions(), 1);

    context.open(1).unwrap();
    assert_eq!(context.state(1).unwrap(), SessionState::Open);
    assert_eq!(platform.live_devices(), 1);
    assert_eq!(platform.live_sessions(), 0);
    assert_eq!(platform.open_count(), 2);
}

#[test]
fn test_open_failures_map_hardware_status() {
    let (platform, context) = setup();
    let cases = [
        (CameraStatus::CameraInUse, ErrorKind::AlreadyInUse),
        (CameraStatus::PermissionDenied, ErrorKind::PermissionDenied),
        (CameraStatus::CameraDisabled, ErrorKind::Disabled),
        (CameraStatus::CameraDisconnected, ErrorKind::Disconnected),
        (CameraStatus::MaxCameraInUse, ErrorKind::MaxCameraInUse),
    ];
    for (status, kind) in cases {
        platform.fail_open("0", status);
        let err = context.open(0).unwrap_err();
        assert_eq!(err.kind(), kind);
        assert_eq!(err.status, Some(status));
        assert_eq!(context.state(0).unwrap(), SessionState::Closed);
    }
    assert_eq!(platform.live_devices(), 0);
}

#[test]
fn test_open_invalid_index() {
    let (_platform, context) = setup();
    assert_eq!(context.open(7).unwrap_err().kind(), ErrorKind::InvalidIndex);
}

#[test]
fn test_start_repeat_twice_is_busy() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    let first = context.start_repeat(0, &surface()).unwrap();

    let err = context.start_repeat(0, &surface()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionBusy);
    let err = context.start_capture(0, &surface()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SessionBusy);

    let snapshot = context.snapshot(0).unwrap();
    assert_eq!(snapshot.state, SessionState::Repeating);
    assert_eq!(snapshot.session_id, Some(first));
    assert_eq!(snapshot.capture_mode, Some(CaptureMode::Repeating));
    assert_eq!(platform.live_sessions(), 1);
}

#[test]
fn test_start_capture_then_stop() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    context.start_capture(0, &surface()).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Capturing);

    context.stop_capture(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(platform.live_sessions(), 0);
    assert_eq!(platform.stop_repeating_calls(), 0);
}

#[test]
fn test_stop_repeat_stops_request_and_returns_to_open() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    context.start_repeat(0, &surface()).unwrap();

    context.stop_repeat(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(platform.stop_repeating_calls(), 1);
    assert_eq!(platform.live_sessions(), 0);

    context.start_repeat(0, &surface()).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Repeating);
}

#[test]
fn test_stop_without_session_is_noop_in_every_state() {
    let (platform, context) = setup();

    // Closed
    context.stop_repeat(0).unwrap();
    context.stop_capture(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Closed);

    // Open
    context.open(0).unwrap();
    context.stop_repeat(0).unwrap();
    context.stop_capture(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Open);

    // Error
    platform.disconnect("0");
    context.stop_repeat(0).unwrap();
    context.stop_capture(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Error);
}

#[test]
fn test_start_requires_open_device() {
    let (_platform, context) = setup();
    let err = context.start_repeat(2, &surface()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(context.state(2).unwrap(), SessionState::Closed);
}

#[test]
fn test_invalid_surface_is_rejected() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    let invalid = Surface::new(SimulatedWindow::invalid());

    let err = context.start_repeat(0, &invalid).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(platform.live_sessions(), 0);
    assert_eq!(invalid.references(), 1);
}

#[test]
fn test_session_holds_surface_reference_until_stopped() {
    let (_platform, context) = setup();
    context.open(0).unwrap();
    let target = surface();

    context.start_repeat(0, &target).unwrap();
    assert_eq!(target.references(), 2);

    context.stop_repeat(0).unwrap();
    assert_eq!(target.references(), 1);
}

#[test]
fn test_failed_request_leaves_device_open() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    let target = surface();

    platform.fail_request(CameraStatus::StreamConfigureFail);
    let err = context.start_repeat(0, &target).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StreamConfigureFailed);
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(platform.live_sessions(), 0);
    assert_eq!(target.references(), 1);

    platform.clear_faults();
    platform.fail_create_session(CameraStatus::NotEnoughMemory);
    let err = context.start_capture(0, &target).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfMemory);
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    assert_eq!(target.references(), 1);

    platform.clear_faults();
    context.start_capture(0, &target).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Capturing);
}

#[test]
fn test_close_tears_down_active_session() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    context.start_repeat(0, &surface()).unwrap();

    context.close(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Closed);
    assert_eq!(platform.live_sessions(), 0);
    assert_eq!(platform.live_devices(), 0);
    assert_eq!(platform.stop_repeating_calls(), 1);
}

#[test]
fn test_disconnect_then_recover() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    assert!(platform.disconnect("0"));
    assert_eq!(context.state(0).unwrap(), SessionState::Error);

    let err = context.start_repeat(0, &surface()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DeviceInError);
    assert!(err.message.contains("disconnected"));
    assert_eq!(context.open(0).unwrap_err().kind(), ErrorKind::DeviceInError);

    context.close(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Closed);
    assert!(context.snapshot(0).unwrap().fault.is_none());

    context.open(0).unwrap();
    assert_eq!(context.state(0).unwrap(), SessionState::Open);
    context.start_repeat(0, &surface()).unwrap();
}

#[test]
fn test_devices_are_independent() {
    let (platform, context) = setup();
    context.open(0).unwrap();
    context.open(1).unwrap();
    context.start_repeat(1, &surface()).unwrap();

    platform.device_error("0", 4);
    assert_eq!(context.state(0).unwrap(), SessionState::Error);
    assert_eq!(context.state(1).unwrap(), SessionState::Repeating);

    platform.fail_open("2", CameraStatus::CameraInUse);
    assert!(context.open(2).is_err());
    assert_eq!(context.state(1).unwrap(), SessionState::Repeating);
}

#[test]
fn test_scan_stream_configurations_for_device() {
    let (_platform, context) = setup();
    let configs = context.scan_stream_configurations(1).unwrap();
    assert_eq!(
        configs,
        vec![
            StreamConfig::new(ImageFormat::Jpeg, 1920, 1080, StreamDirection::Output),
            StreamConfig::new(ImageFormat::Yuv420_888, 640, 480, StreamDirection::Output),
        ]
    );
    assert_eq!(
        context.scan_stream_configurations(9).unwrap_err().kind(),
        ErrorKind::InvalidIndex
    );

    let devices = context.devices();
    assert_eq!(devices.len(), 3);
    assert_eq!(devices[0].stream_configs.len(), 4);
    assert_eq!(devices[2].facing, FacingDirection::External);
}

#[test]
fn test_snapshot_serializes() {
    let (_platform, context) = setup();
    context.open(0).unwrap();
    let json = serde_json::to_string(&context.snapshot(0).unwrap()).unwrap();
    assert!(json.contains("\"state\":\"Open\""));
    assert!(json.contains("\"device_id\":\"0\""));
    assert_eq!(context.snapshots().len(), 3);
}

#[test]
fn test_concurrent_operations_and_callbacks() {
    let platform = SimulatedPlatform::with_standard_rig();
    let context = Arc::new(CameraContext::new(
        Arc::new(platform.clone()),
        NdcamConfig::default(),
    ));
    context.initialize().unwrap();

    let workers: Vec<_> = (0..3u16)
        .map(|index| {
            let context = Arc::clone(&context);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let _ = context.open(index);
                    let _ = context.start_repeat(index, &Surface::new(SimulatedWindow::valid()));
                    let _ = context.stop_repeat(index);
                    let _ = context.close(index);
                }
            })
        })
        .collect();

    let noise = {
        let platform = platform.clone();
        std::thread::spawn(move || {
            for i in 0..200 {
                let id = (i % 3).to_string();
                platform.disconnect(&id);
                platform.deliver_frame(&id, i);
            }
        })
    };

    for worker in workers {
        worker.join().unwrap();
    }
    noise.join().unwrap();

    for index in 0..3 {
        context.close(index).unwrap();
        assert_eq!(context.state(index).unwrap(), SessionState::Closed);
    }
    assert_eq!(platform.live_devices(), 0);
    assert_eq!(platform.live_sessions(), 0);
}
