//! Helpers for profiling scopes and flamegraphs.
//!
//! With the `puffin` feature enabled (and on native targets) the macros forward to
//! [`puffin`](https://github.com/EmbarkStudios/puffin).
//! Otherwise they expand to nothing, so library crates can sprinkle scopes freely
//! without paying for them.

#[cfg(all(feature = "puffin", not(target_arch = "wasm32")))]
pub mod reexports {
    pub use puffin;
}

/// Profiles the enclosing function.
#[cfg(all(feature = "puffin", not(target_arch = "wasm32")))]
#[macro_export]
macro_rules! profile_function {
    ($($arg: tt)*) => {
        $crate::reexports::puffin::profile_function!($($arg)*);
    };
}

/// Profiles the enclosing function.
#[cfg(not(all(feature = "puffin", not(target_arch = "wasm32"))))]
#[macro_export]
macro_rules! profile_function {
    ($($arg: tt)*) => {};
}

/// Profiles the rest of the enclosing scope.
#[cfg(all(feature = "puffin", not(target_arch = "wasm32")))]
#[macro_export]
macro_rules! profile_scope {
    ($($arg: tt)*) => {
        $crate::reexports::puffin::profile_scope!($($arg)*);
    };
}

/// Profiles the rest of the enclosing scope.
#[cfg(not(all(feature = "puffin", not(target_arch = "wasm32"))))]
#[macro_export]
macro_rules! profile_scope {
    ($($arg: tt)*) => {};
}
