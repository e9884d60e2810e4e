use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    /// True when a record at `self` passes a filter set to `max`.
    pub fn passes(self, max: LogLevel) -> bool {
        self <= max
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{}", label)
    }
}

type Logger = Box<dyn Fn(LogLevel, &str, &str) + Send + Sync + 'static>;

fn default_logger(level: LogLevel, target: &str, message: &str) {
    eprintln!("[{}] {}: {}", level, target, message);
}

fn logger_cell() -> &'static Mutex<Logger> {
    static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();
    LOGGER.get_or_init(|| Mutex::new(Box::new(default_logger)))
}

static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

pub fn set_logger(logger: impl Fn(LogLevel, &str, &str) + Send + Sync + 'static) {
    let mut guard = match logger_cell().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = Box::new(logger);
}

pub fn set_max_level(level: LogLevel) {
    MAX_LEVEL.store(level as u8, Ordering::Relaxed);
}

pub fn max_level() -> LogLevel {
    LogLevel::from_u8(MAX_LEVEL.load(Ordering::Relaxed))
}

pub fn log(level: LogLevel, target: &str, message: impl AsRef<str>) {
    if !level.passes(max_level()) {
        return;
    }
    let guard = match logger_cell().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    (guard)(level, target, message.as_ref());
}

pub fn error(target: &str, message: impl AsRef<str>) {
    log(LogLevel::Error, target, message);
}

pub fn warn(target: &str, message: impl AsRef<str>) {
    log(LogLevel::Warn, target, message);
}

pub fn info(target: &str, message: impl AsRef<str>) {
    log(LogLevel::Info, target, message);
}

pub fn debug(target: &str, message: impl AsRef<str>) {
    log(LogLevel::Debug, target, message);
}
