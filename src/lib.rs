pub mod config;
pub mod error;
pub mod identity;
pub mod media;
pub mod models;
pub mod server;
pub mod storage;

// Debug printing helper: eprintln! in tests and debug builds, absent otherwise.
// Usage: tprintln!("auth.resolve sub={}", sub);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In release builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Preserve formatting checks in release without producing code
        if false { let _ = format!($($arg)*); }
    });
}
