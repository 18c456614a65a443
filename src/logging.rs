//! Minimal leveled logging facade.
//!
//! A global level filter plus a single swappable backend function pointer,
//! so this crate can log without depending on any particular console or
//! `log`-ecosystem sink. A host-agnostic allocator has no business
//! assuming a serial port exists, so the default backend here is a no-op
//! until the embedder installs one.

use core::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(Level::Warn as u8);

type Backend = fn(Level, &str);

fn noop_backend(_level: Level, _message: &str) {}

static BACKEND: AtomicPtr<()> = AtomicPtr::new(noop_backend as *mut ());

/// Install the function that receives formatted log lines.
pub fn set_backend(backend: Backend) {
    BACKEND.store(backend as *mut (), Ordering::SeqCst);
}

/// Set the minimum level that will reach the backend.
pub fn set_level(level: Level) {
    CURRENT_LEVEL.store(level as u8, Ordering::SeqCst);
}

#[doc(hidden)]
pub fn enabled(level: Level) -> bool {
    level as u8 <= CURRENT_LEVEL.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn dispatch(level: Level, message: &str) {
    if !enabled(level) {
        return;
    }
    let backend: Backend = unsafe { core::mem::transmute(BACKEND.load(Ordering::SeqCst)) };
    backend(level, message);
}

macro_rules! log_at {
    ($level:expr, $($arg:tt)*) => {{
        if $crate::logging::enabled($level) {
            let mut buf = $crate::logging::LineBuffer::new();
            let _ = ::core::fmt::Write::write_fmt(&mut buf, format_args!($($arg)*));
            $crate::logging::dispatch($level, buf.as_str());
        }
    }};
}

macro_rules! log_error {
    ($($arg:tt)*) => { $crate::logging::log_at!($crate::logging::Level::Error, $($arg)*) };
}
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::logging::log_at!($crate::logging::Level::Warn, $($arg)*) };
}
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::logging::log_at!($crate::logging::Level::Info, $($arg)*) };
}
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::logging::log_at!($crate::logging::Level::Debug, $($arg)*) };
}
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::logging::log_at!($crate::logging::Level::Trace, $($arg)*) };
}

pub(crate) use log_at;
pub(crate) use {log_debug, log_error, log_info, log_trace, log_warn};

/// Fixed-capacity line buffer so logging never needs an allocator of its own.
pub struct LineBuffer {
    bytes: [u8; 128],
    len: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self { bytes: [0; 128], len: 0 }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("<non-utf8 log line>")
    }
}

impl core::fmt::Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let remaining = self.bytes.len() - self.len;
        let take = remaining.min(s.len());
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        Ok(())
    }
}
