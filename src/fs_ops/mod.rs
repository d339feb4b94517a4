//! Filesystem primitives used by the relocation engine.

mod atomic;
mod helpers;
mod util;

pub use atomic::move_replacing;
pub use helpers::io_error_with_help;
pub use util::count_regular_files;
