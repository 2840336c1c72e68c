//! Logger setup. `RUST_LOG` overrides the default `info` filter, e.g.
//! `RUST_LOG=hand_signal=debug` to watch the debouncer decide.

use env_logger::Env;

pub fn init() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
