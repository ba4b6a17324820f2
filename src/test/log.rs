use std::env;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::FmtSubscriber;

/// Install a test logger if `RUST_LOG` holds a valid level
pub fn init_logger() {
    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|x| x.parse::<LevelFilter>().ok());

    if let Some(level) = level {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}
