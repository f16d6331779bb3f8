/// Check a precondition that the caller of a chunk operation must uphold.
///
/// A violation is a bug in the calling protocol code and never a transient condition of the
/// simulated content. There is no way to recover from it inside this crate, so this always
/// panics regardless of the build profile.
macro_rules! check_usage {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            panic!($($arg)+);
        }
    };
}

/// Check an internal invariant of the chunk implementation.
///
/// These checks walk whole sequences and are too expensive to run on every operation in a
/// regular build. They are compiled in for tests and with the `check-implementation` feature.
macro_rules! check_implementation {
    ($cond:expr) => {
        #[cfg(any(test, feature = "check-implementation"))]
        {
            assert!($cond, "chunk implementation invariant violated: {}", stringify!($cond));
        }
    };
}

#[cfg(feature = "log")]
#[macro_use]
mod log {
    macro_rules! chunk_log {
        (trace, $($arg:tt)*) => { tracing::trace!($($arg)*); };
        (debug, $($arg:tt)*) => { tracing::debug!($($arg)*); };
    }
}

#[cfg(not(feature = "log"))]
#[macro_use]
mod log {
    macro_rules! chunk_log {
        ($level:ident, $($arg:expr),*) => { $( let _ = &$arg; )* }
    }
}

macro_rules! chunk_trace {
    ($($arg:tt)*) => (chunk_log!(trace, $($arg)*));
}

macro_rules! chunk_debug {
    ($($arg:tt)*) => (chunk_log!(debug, $($arg)*));
}
