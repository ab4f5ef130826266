use std::io::Write;
use std::sync::Once;

use env_logger::Builder;

static INIT: Once = Once::new();

/// Wires up `env_logger` against `RUST_LOG`. Safe to call more than once
/// (from multiple tests running in the same process) — only the first
/// call takes effect.
pub fn init_logging() {
    INIT.call_once(|| {
        let mut builder = Builder::from_default_env();
        builder
            .format_timestamp_micros()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} {}] {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}
