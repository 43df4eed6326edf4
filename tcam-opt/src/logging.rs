//! Lazily-initialized diagnostic logging.
//!
//! Mirrors the original implementation's `spdlog::basic_logger_mt` singleton:
//! the first call into any public entry point ensures a process-wide file
//! logger is configured, after which algorithm code logs through the
//! ordinary `log` facade. Initialization is idempotent and a failure to open
//! the log file is non-fatal — it is reported once and logging is disabled
//! for the rest of the process.

use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use once_cell::sync::OnceCell;

const LOG_PATH: &str = "tcam_opt.log";

static INIT: OnceCell<()> = OnceCell::new();

/// Ensures the file logger is configured. Safe to call from every public
/// entry point; only the first call has any effect.
pub fn ensure_initialized() {
    INIT.get_or_init(|| {
        let appender = match FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%d %H:%M:%S)} {l} {m}{n}")))
            .build(LOG_PATH)
        {
            Ok(a) => a,
            Err(e) => {
                eprintln!("tcam-opt: could not open log file {LOG_PATH}: {e}; logging disabled");
                return;
            }
        };
        let config = match Config::builder()
            .appender(Appender::builder().build("file", Box::new(appender)))
            .build(Root::builder().appender("file").build(log::LevelFilter::Info))
        {
            Ok(c) => c,
            Err(e) => {
                eprintln!("tcam-opt: could not build logging config: {e}; logging disabled");
                return;
            }
        };
        if let Err(e) = log4rs::init_config(config) {
            eprintln!("tcam-opt: could not install logger: {e}; logging disabled");
        }
    });
}
