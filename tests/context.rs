use padmap::backends::virtual_input::{VirtualPadBackend, VirtualRawBackend};
use padmap::backends::{pad_buttons, PadFrame, RawPollError};
use padmap::guid::{Guid, ProductGuid};
use padmap::mapping::{Mapping, MappingElement, MappingTable};
use padmap::registry::MAX_DEVICES;
use padmap::{Axis, BackendKind, Button, Config, Context, DeviceHandle, Error};

const XBOX360_NAME: &str = "Controller (XBOX 360 For Windows)";

fn xbox360() -> ProductGuid {
    ProductGuid::from_vid_pid(0x045e, 0x028e)
}

fn ds4() -> ProductGuid {
    ProductGuid::from_vid_pid(0x054c, 0x05c4)
}

fn unknown() -> ProductGuid {
    ProductGuid::from_vid_pid(0x1234, 0x5678)
}

/// One-entry catalog: button A on raw button 0, left stick on axes 0/1.
fn tiny_catalog() -> MappingTable {
    let guid = Guid::synthesize(&unknown(), "");
    let mapping = Mapping::empty("Tiny Pad")
        .with_button(Button::A, MappingElement::button(0))
        .with_axis(Axis::LeftX, MappingElement::axis(0))
        .with_axis(Axis::LeftY, MappingElement::axis(1));
    MappingTable::from_entries(vec![(guid, mapping)]).unwrap()
}

fn raw_context(raw: &VirtualRawBackend) -> Context {
    let mut ctx = Context::new().with_raw_backend(raw.clone());
    ctx.initialize().unwrap();
    ctx
}

#[test]
fn pressing_mapped_button_sets_only_that_bit() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(unknown(), "Tiny");
    let mut ctx = Context::new()
        .with_raw_backend(raw.clone())
        .with_catalog(tiny_catalog());
    ctx.initialize().unwrap();

    let handle = ctx.devices()[0];
    raw.press_button(key, 0, true);
    let state = ctx.poll(handle).unwrap();
    assert_eq!(state.buttons, Button::A.mask());
    assert_eq!(ctx.device_name(handle), Some("Tiny Pad"));
}

#[test]
fn builtin_catalog_drives_a_known_pad() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(ds4(), "Wireless Controller");
    let mut ctx = raw_context(&raw);

    let handle = ctx.devices()[0];
    // DS4 on the joystick API: cross is raw button 1, dpad is hat 0.
    raw.press_button(key, 1, true);
    raw.set_hat(key, 0, 18000);
    raw.set_axis(key, 3, 65535); // left trigger fully pressed

    let state = ctx.poll(handle).unwrap();
    assert!(state.pressed(Button::CROSS));
    assert!(state.pressed(Button::DpadDown));
    assert!(!state.pressed(Button::DpadUp));
    assert_eq!(state.axis(Axis::LeftTrigger), 1.0);

    let meta = ctx.device_meta(handle).unwrap();
    assert_eq!(meta.backend, BackendKind::RawReport);
    assert_eq!(meta.mapping.as_deref(), Some("PS4 Controller"));
    assert_eq!((meta.vid, meta.pid), (Some(0x054c), Some(0x05c4)));
    assert_eq!(meta.guid.map(|g| g.to_string()).as_deref(), Some("030000004c050000c405000000000000"));
}

#[test]
fn raw_report_stick_y_is_flipped() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(xbox360(), XBOX360_NAME);
    let mut ctx = raw_context(&raw);
    let handle = ctx.devices()[0];

    raw.set_axis(key, 1, 0); // joystick API: up is the low end
    raw.set_axis(key, 4, 65535);
    let state = ctx.poll(handle).unwrap();
    assert_eq!(state.axis(Axis::LeftY), 1.0);
    assert_eq!(state.axis(Axis::RightY), -1.0);
}

#[test]
fn out_of_range_raw_axes_do_not_panic() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(xbox360(), XBOX360_NAME);
    let mut ctx = raw_context(&raw);
    let handle = ctx.devices()[0];

    raw.set_axis(key, 0, i32::MIN);
    raw.set_axis(key, 3, i32::MAX);
    raw.set_axis(key, 2, i32::MIN);
    let state = ctx.poll(handle).unwrap();
    assert_eq!(state.axis(Axis::LeftX), -1.0);
    assert_eq!(state.axis(Axis::RightX), 1.0);
    assert_eq!(state.axis(Axis::LeftTrigger), -1.0);
    assert_eq!(state.axis(Axis::RightTrigger), -1.0);
    assert!(state.axes.iter().all(|v| (-1.0..=1.0).contains(v)));
}

#[test]
fn pre_normalized_stick_y_is_not_flipped() {
    let pads = VirtualPadBackend::new();
    pads.set_frame(
        0,
        PadFrame {
            left_stick: [i16::MIN, i16::MIN],
            right_stick: [0, i16::MAX],
            ..PadFrame::default()
        },
    );
    let mut ctx = Context::new().with_pad_backend(pads.clone());
    ctx.initialize().unwrap();

    let state = ctx.poll(ctx.devices()[0]).unwrap();
    assert_eq!(state.axis(Axis::LeftX), -1.0);
    assert_eq!(state.axis(Axis::LeftY), -1.0);
    assert_eq!(state.axis(Axis::RightY), 1.0);
    assert!(state.axis(Axis::RightX).abs() < 1e-4);
    assert_eq!(state.axis(Axis::LeftTrigger), -1.0);
}

#[test]
fn pad_buttons_and_triggers() {
    let pads = VirtualPadBackend::new();
    pads.set_frame(
        1,
        PadFrame {
            buttons: pad_buttons::B | pad_buttons::DPAD_UP | pad_buttons::RIGHT_SHOULDER,
            right_trigger: 255,
            ..PadFrame::default()
        },
    );
    let mut ctx = Context::new().with_pad_backend(pads);
    ctx.initialize().unwrap();

    let handle = ctx.devices()[0];
    let state = ctx.poll(handle).unwrap();
    assert_eq!(
        state.pressed_buttons().collect::<Vec<_>>(),
        vec![Button::B, Button::RightShoulder, Button::DpadUp]
    );
    assert_eq!(state.axis(Axis::RightTrigger), 1.0);
    assert_eq!(ctx.device_name(handle), Some("Gamepad 1"));
    assert_eq!(ctx.device_meta(handle).unwrap().guid, None);
}

#[test]
fn unknown_devices_are_tracked_but_not_listed() {
    let raw = VirtualRawBackend::new();
    raw.plug(unknown(), "Mystery Stick");
    raw.plug(xbox360(), XBOX360_NAME);
    let mut ctx = Context::new().with_raw_backend(raw);
    let summary = ctx.initialize().unwrap();

    assert_eq!(summary.listed, 1);
    assert_eq!(summary.unmapped, 1);
    assert_eq!(ctx.devices(), vec![DeviceHandle(1)]);
    assert!(!ctx.device_valid(DeviceHandle(0)));
    assert!(matches!(ctx.poll(DeviceHandle(0)), Err(Error::Unmapped(_))));

    // Still described, so a mapping can be authored for it.
    let meta = ctx.device_meta(DeviceHandle(0)).unwrap();
    assert_eq!(meta.mapping, None);
    assert_eq!(meta.name, "Mystery Stick");
    assert_eq!(ctx.device_name(DeviceHandle(0)), Some("Mystery Stick"));
}

#[test]
fn registry_capacity_is_eight() {
    let raw = VirtualRawBackend::new();
    for i in 0..MAX_DEVICES + 2 {
        raw.plug(xbox360(), &format!("Pad {i}"));
    }
    let mut ctx = Context::new().with_raw_backend(raw);
    let summary = ctx.initialize().unwrap();

    assert_eq!(summary.listed, MAX_DEVICES);
    assert_eq!(summary.dropped, 2);
    assert_eq!(ctx.list_devices(100).len(), MAX_DEVICES);
    assert_eq!(ctx.list_devices(3).len(), 3);
    assert_eq!(ctx.registry().find_unused_slot(), None);
}

#[test]
fn disconnect_clears_the_slot_and_frees_the_handle() {
    let raw = VirtualRawBackend::new();
    let first = raw.plug(xbox360(), XBOX360_NAME);
    raw.plug(ds4(), "Wireless Controller");
    let mut ctx = raw_context(&raw);
    assert_eq!(ctx.devices(), vec![DeviceHandle(0), DeviceHandle(1)]);

    raw.unplug(first);
    assert!(matches!(ctx.poll(DeviceHandle(0)), Err(Error::Disconnected(DeviceHandle(0)))));
    assert!(!ctx.device_valid(DeviceHandle(0)));
    assert_eq!(ctx.devices(), vec![DeviceHandle(1)]);
    assert!(matches!(ctx.poll(DeviceHandle(0)), Err(Error::InvalidHandle(0))));

    // The freed handle goes to the next device found.
    raw.plug(xbox360(), XBOX360_NAME);
    ctx.refresh().unwrap();
    assert_eq!(ctx.devices(), vec![DeviceHandle(0), DeviceHandle(1)]);
    assert_eq!(ctx.device_name(DeviceHandle(0)), Some("PS4 Controller"));
}

#[test]
fn transient_failure_is_retried_once() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(xbox360(), XBOX360_NAME);
    let mut ctx = raw_context(&raw);
    let handle = ctx.devices()[0];

    raw.press_button(key, 0, true);
    raw.fail_next(key, RawPollError::NeedsReacquire);
    assert!(ctx.poll(handle).unwrap().pressed(Button::A));
    assert_eq!(raw.reacquire_count(), 1);
}

#[test]
fn repeated_transient_failure_keeps_the_device() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(xbox360(), XBOX360_NAME);
    let mut ctx = raw_context(&raw);
    let handle = ctx.devices()[0];

    raw.fail_next(key, RawPollError::NeedsReacquire);
    raw.fail_next(key, RawPollError::NeedsReacquire);
    assert!(matches!(ctx.poll(handle), Err(Error::Transient(h)) if h == handle));
    assert_eq!(raw.reacquire_count(), 1);
    assert!(ctx.device_valid(handle));
    assert!(ctx.poll(handle).is_ok());
}

#[test]
fn retry_can_be_disabled() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(xbox360(), XBOX360_NAME);
    let cfg = Config {
        retry_transient: false,
        ..Config::default()
    };
    let mut ctx = Context::new().with_raw_backend(raw.clone()).with_config(cfg);
    ctx.initialize().unwrap();

    raw.fail_next(key, RawPollError::NeedsReacquire);
    assert!(matches!(ctx.poll(ctx.devices()[0]), Err(Error::Transient(_))));
    assert_eq!(raw.reacquire_count(), 0);
}

#[test]
fn xinput_compatible_raw_devices_are_skipped() {
    let raw = VirtualRawBackend::new();
    raw.plug_with(xbox360(), XBOX360_NAME, true);
    let pads = VirtualPadBackend::new();
    pads.connect(0);

    let mut ctx = Context::new()
        .with_raw_backend(raw.clone())
        .with_pad_backend(pads.clone());
    ctx.initialize().unwrap();
    assert_eq!(ctx.devices().len(), 1);
    assert_eq!(ctx.device_meta(ctx.devices()[0]).unwrap().backend, BackendKind::PreNormalized);

    let cfg = Config {
        skip_xinput_compatible: false,
        ..Config::default()
    };
    let mut ctx = Context::new()
        .with_raw_backend(raw)
        .with_pad_backend(pads)
        .with_config(cfg);
    ctx.initialize().unwrap();
    assert_eq!(ctx.devices().len(), 2);
}

#[test]
fn raw_devices_take_slots_before_pads() {
    let raw = VirtualRawBackend::new();
    raw.plug(xbox360(), XBOX360_NAME);
    let pads = VirtualPadBackend::new();
    pads.connect(3);

    let mut ctx = Context::new().with_raw_backend(raw).with_pad_backend(pads);
    ctx.initialize().unwrap();
    let kinds: Vec<_> = ctx
        .devices()
        .into_iter()
        .map(|h| ctx.device_meta(h).unwrap().backend)
        .collect();
    assert_eq!(kinds, vec![BackendKind::RawReport, BackendKind::PreNormalized]);
}

#[test]
fn rumble_is_clamped_and_scaled() {
    let pads = VirtualPadBackend::new();
    pads.connect(0);
    let mut ctx = Context::new().with_pad_backend(pads.clone());
    ctx.initialize().unwrap();
    let handle = ctx.devices()[0];

    ctx.rumble(handle, 1.0, 0.0).unwrap();
    let at_one = pads.last_vibration(0);
    ctx.rumble(handle, 2.0, -1.0).unwrap();
    assert_eq!(pads.last_vibration(0), at_one);
    assert_eq!(at_one, Some((u16::MAX, 0)));
}

#[test]
fn rumble_on_raw_report_device_is_unsupported() {
    let raw = VirtualRawBackend::new();
    raw.plug(xbox360(), XBOX360_NAME);
    let mut ctx = raw_context(&raw);
    assert!(matches!(
        ctx.rumble(ctx.devices()[0], 0.5, 0.5),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(ctx.rumble(DeviceHandle(7), 0.5, 0.5), Err(Error::InvalidHandle(7))));
}

#[test]
fn pad_disconnect_during_rumble_clears_the_slot() {
    let pads = VirtualPadBackend::new();
    pads.connect(0);
    let mut ctx = Context::new().with_pad_backend(pads.clone());
    ctx.initialize().unwrap();
    let handle = ctx.devices()[0];

    pads.disconnect(0);
    assert!(matches!(ctx.rumble(handle, 1.0, 1.0), Err(Error::Disconnected(_))));
    assert!(ctx.devices().is_empty());
}

#[test]
fn lifecycle() {
    let pads = VirtualPadBackend::new();
    pads.connect(0);
    let mut ctx = Context::new().with_pad_backend(pads);

    assert!(ctx.list_devices(8).is_empty());
    ctx.initialize().unwrap();
    assert!(ctx.is_initialized());
    assert!(matches!(ctx.initialize(), Err(Error::AlreadyInitialized)));

    ctx.shutdown();
    assert!(!ctx.is_initialized());
    assert!(ctx.devices().is_empty());
    assert!(matches!(ctx.poll(DeviceHandle(0)), Err(Error::NotInitialized)));

    ctx.initialize().unwrap();
    assert_eq!(ctx.devices().len(), 1);
}

#[test]
fn invalid_handles_never_panic() {
    let mut ctx = Context::new();
    ctx.initialize().unwrap();
    for h in [0u8, 7, 8, 255] {
        assert!(!ctx.device_valid(DeviceHandle(h)));
        assert!(matches!(ctx.poll(DeviceHandle(h)), Err(Error::InvalidHandle(_))));
        assert!(ctx.device_name(DeviceHandle(h)).is_none());
    }
}

#[test]
fn snapshot_skips_failed_devices() {
    let raw = VirtualRawBackend::new();
    let key = raw.plug(xbox360(), XBOX360_NAME);
    let pads = VirtualPadBackend::new();
    pads.connect(0);
    let mut ctx = Context::new()
        .with_raw_backend(raw.clone())
        .with_pad_backend(pads);
    ctx.initialize().unwrap();

    let snap = ctx.snapshot();
    assert_eq!(snap.len(), 2);

    raw.fail_next(key, RawPollError::Other("bus reset".into()));
    let snap = ctx.snapshot();
    assert_eq!(snap.len(), 1);
    assert!(snap.get(DeviceHandle(0)).is_none());
    assert!(snap.get(DeviceHandle(1)).is_some());

    let json = serde_json::to_value(&snap).unwrap();
    assert!(json.get("1").is_some());
}

#[test]
fn disabled_backends_are_not_enumerated() {
    let raw = VirtualRawBackend::new();
    raw.plug(xbox360(), XBOX360_NAME);
    let pads = VirtualPadBackend::new();
    pads.connect(0);
    let cfg = Config::from_toml_str("raw_report = false").unwrap();

    let mut ctx = Context::new()
        .with_raw_backend(raw)
        .with_pad_backend(pads)
        .with_config(cfg);
    ctx.initialize().unwrap();
    assert_eq!(ctx.devices().len(), 1);
    assert_eq!(ctx.device_meta(DeviceHandle(0)).unwrap().backend, BackendKind::PreNormalized);
}
