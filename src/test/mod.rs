mod mock;
mod negotiate_test;

use crate::config::LoaderConfig;
use crate::loader::Loader;

use self::mock::{Event, EventLog, MockConfig, MockPlatform};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn loader(config: MockConfig) -> (Loader<MockPlatform>, EventLog) {
    loader_with_config(config, LoaderConfig::default())
}

fn loader_with_config(config: MockConfig, loader_config: LoaderConfig) -> (Loader<MockPlatform>, EventLog) {
    init_logging();

    let platform = MockPlatform::new(config);
    let events = platform.events();
    (Loader::with_platform(platform, loader_config), events)
}

fn count<F>(events: &EventLog, predicate: F) -> usize where F: Fn(&Event) -> bool {
    events.borrow().iter().filter(|event| predicate(event)).count()
}

/// Events recorded after the library was opened.
fn events_after_open(events: &EventLog) -> Vec<Event> {
    events.borrow().iter()
        .skip_while(|event| match **event { Event::Opened(_) => false, _ => true })
        .skip(1)
        .cloned()
        .collect()
}
