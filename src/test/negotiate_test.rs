use crate::config::ContextCreationRequest;
use crate::error::Error;
use crate::negotiate::{ContextKind, Degradation};
use crate::platform::Surface;
use crate::types::{Profile, Version};

use super::mock::*;
use super::{count, events_after_open, loader};

const WINDOW: MockWindow = MockWindow(1);
const DEVICE_CONTEXT: MockDeviceContext = MockDeviceContext(101);

fn legacy(id: usize) -> MockContext {
    MockContext { id: id, modern: false }
}

fn modern(id: usize) -> MockContext {
    MockContext { id: id, modern: true }
}

#[test]
fn legacy_negotiation() {
    let (loader, events) = loader(MockConfig::default());

    let _context = loader.create_context(Surface::Window(WINDOW), &ContextCreationRequest::default()).unwrap();

    assert_eq!(
        vec![
            Event::AcquiredDeviceContext(WINDOW, DEVICE_CONTEXT),
            Event::ChosePixelFormat(DEVICE_CONTEXT),
            Event::CreatedContext(legacy(1)),
            Event::MadeCurrent(Some(legacy(1))),
            Event::ReleasedPixelFormat(DEVICE_CONTEXT),
        ],
        events_after_open(&events));
}

#[test]
fn modern_context_replaces_legacy() {
    let (loader, events) = loader(MockConfig::default());

    let request = ContextCreationRequest::modern(4, 5, Profile::Core).with_forward_compatible(true);
    let context = loader.create_context(Surface::Window(WINDOW), &request).unwrap();

    assert_eq!(Some(modern(2)), context.native_handle());
    assert_eq!(
        vec![
            Event::AcquiredDeviceContext(WINDOW, DEVICE_CONTEXT),
            Event::ChosePixelFormat(DEVICE_CONTEXT),
            Event::CreatedContext(legacy(1)),
            Event::MadeCurrent(Some(legacy(1))),
            Event::CreatedContextAttribs(modern(2), vec![0x2091, 4, 0x2092, 5, 0x9126, 0x1, 0x2094, 0x2, 0]),
            Event::MadeCurrent(Some(modern(2))),
            Event::DeletedContext(legacy(1)),
            Event::ReleasedPixelFormat(DEVICE_CONTEXT),
        ],
        events_after_open(&events));
}

#[test]
fn compatibility_debug_attributes() {
    let (loader, events) = loader(MockConfig::default());

    let request = ContextCreationRequest::modern(3, 2, Profile::Compatibility).with_debug(true);
    let _context = loader.create_context(Surface::Window(WINDOW), &request).unwrap();

    let expected = Event::CreatedContextAttribs(modern(2), vec![0x2091, 3, 0x2092, 2, 0x9126, 0x2, 0x2094, 0x1, 0]);
    assert_eq!(1, count(&events, |event| *event == expected));
}

#[test]
fn modern_creation_failure_keeps_legacy() {
    let config = MockConfig {
        modern_creation: false,
        .. MockConfig::default()
    };
    let (loader, _) = loader(config);

    let request = ContextCreationRequest::modern(4, 5, Profile::Core);
    let context = loader.create_context(Surface::Window(WINDOW), &request).unwrap();

    assert!(context.is_valid());
    assert_eq!(ContextKind::Legacy, context.kind());
    assert_eq!(Some(Degradation::CreationFailed), context.degradation());
    assert_eq!(Some(legacy(1)), context.native_handle());
}

#[test]
fn modern_activation_failure_restores_legacy() {
    let config = MockConfig {
        modern_activation: false,
        .. MockConfig::default()
    };
    let (loader, events) = loader(config);

    let request = ContextCreationRequest::modern(3, 3, Profile::Core);
    let context = loader.create_context(Surface::Window(WINDOW), &request).unwrap();

    assert_eq!(Some(Degradation::ActivationFailed), context.degradation());
    assert_eq!(Some(legacy(1)), context.native_handle());
    assert_eq!(
        vec![
            Event::AcquiredDeviceContext(WINDOW, DEVICE_CONTEXT),
            Event::ChosePixelFormat(DEVICE_CONTEXT),
            Event::CreatedContext(legacy(1)),
            Event::MadeCurrent(Some(legacy(1))),
            Event::CreatedContextAttribs(modern(2), vec![0x2091, 3, 0x2092, 3, 0x9126, 0x1, 0]),
            Event::DeletedContext(modern(2)),
            Event::MadeCurrent(Some(legacy(1))),
            Event::ReleasedPixelFormat(DEVICE_CONTEXT),
        ],
        events_after_open(&events));
}

#[test]
fn modern_request_without_pixel_format_attribs() {
    let config = MockConfig {
        pixel_format_attribs: false,
        .. MockConfig::default()
    };
    let (loader, _) = loader(config);

    let request = ContextCreationRequest::modern(3, 3, Profile::Core);
    let context = loader.create_context(Surface::Window(WINDOW), &request).unwrap();
    assert_eq!(ContextKind::Modern { version: Version::V3_3, profile: Profile::Core }, context.kind());
}

#[test]
fn legacy_activation_failure_releases_in_reverse_order() {
    let config = MockConfig {
        legacy_activation: false,
        .. MockConfig::default()
    };
    let (loader, events) = loader(config);

    match loader.create_context(Surface::Window(WINDOW), &ContextCreationRequest::default()) {
        Err(Error::LegacyContextCreationFailed(_)) => {}
        other => panic!("Expected legacy context creation to fail, got {:?}", other),
    }

    assert_eq!(
        vec![
            Event::AcquiredDeviceContext(WINDOW, DEVICE_CONTEXT),
            Event::ChosePixelFormat(DEVICE_CONTEXT),
            Event::CreatedContext(legacy(1)),
            Event::DeletedContext(legacy(1)),
            Event::ReleasedPixelFormat(DEVICE_CONTEXT),
            Event::ReleasedDeviceContext(WINDOW, DEVICE_CONTEXT),
        ],
        events_after_open(&events));
    assert!(loader.is_loaded());
}

#[test]
fn legacy_creation_failure_is_fatal_even_for_modern_requests() {
    let config = MockConfig {
        legacy_context: false,
        .. MockConfig::default()
    };
    let (loader, events) = loader(config);

    let request = ContextCreationRequest::modern(4, 5, Profile::Core);
    match loader.create_context(Surface::Window(WINDOW), &request) {
        Err(Error::LegacyContextCreationFailed(_)) => {}
        other => panic!("Expected legacy context creation to fail, got {:?}", other),
    }

    assert_eq!(
        vec![
            Event::AcquiredDeviceContext(WINDOW, DEVICE_CONTEXT),
            Event::ChosePixelFormat(DEVICE_CONTEXT),
            Event::ReleasedPixelFormat(DEVICE_CONTEXT),
            Event::ReleasedDeviceContext(WINDOW, DEVICE_CONTEXT),
        ],
        events_after_open(&events));
    assert!(loader.last_error().starts_with("failed creating legacy OpenGL rendering context"));
}

#[test]
fn pixel_format_failure_releases_device_context() {
    let config = MockConfig {
        pixel_format: false,
        .. MockConfig::default()
    };
    let (loader, events) = loader(config);

    let result = loader.create_context(Surface::Window(WINDOW), &ContextCreationRequest::default());
    assert_eq!(
        Error::PixelFormatNegotiationFailed("no matching pixel format".into()),
        result.unwrap_err());

    assert_eq!(
        vec![
            Event::AcquiredDeviceContext(WINDOW, DEVICE_CONTEXT),
            Event::ReleasedDeviceContext(WINDOW, DEVICE_CONTEXT),
        ],
        events_after_open(&events));
}

#[test]
fn failure_keeps_caller_device_context() {
    let config = MockConfig {
        pixel_format: false,
        .. MockConfig::default()
    };
    let (loader, events) = loader(config);

    let result = loader.create_context(Surface::DeviceContext(MockDeviceContext(5)), &ContextCreationRequest::default());
    assert!(result.is_err());
    assert_eq!(Vec::<Event>::new(), events_after_open(&events));
}

#[test]
fn profile_without_version_is_invalid() {
    let (loader, events) = loader(MockConfig::default());

    let request = ContextCreationRequest::modern(0, 0, Profile::Core);
    match loader.create_context(Surface::Window(WINDOW), &request) {
        Err(Error::InvalidRequest(_)) => {}
        other => panic!("Expected an invalid request, got {:?}", other),
    }

    assert_eq!(Vec::<Event>::new(), events_after_open(&events));
}

#[test]
fn legacy_request_ignores_version() {
    let (loader, events) = loader(MockConfig::default());

    let request = ContextCreationRequest { version: Version::new(0, 0), .. ContextCreationRequest::legacy() };
    let context = loader.create_context(Surface::Window(WINDOW), &request).unwrap();

    assert_eq!(ContextKind::Legacy, context.kind());
    assert_eq!(None, context.degradation());
    assert_eq!(0, count(&events, |event| match *event { Event::CreatedContextAttribs(..) => true, _ => false }));
}

#[test]
fn loader_recovers_after_failed_negotiation() {
    let (loader, _) = loader(MockConfig::default());

    assert!(loader.create_context(Surface::Window(NULL_WINDOW), &ContextCreationRequest::default()).is_err());

    let context = loader.create_context(Surface::Window(MockWindow(2)), &ContextCreationRequest::default()).unwrap();
    assert!(context.is_valid());
    assert_eq!(Some(MockDeviceContext(102)), context.device_context());
}
