//! Config operations (file I/O)

pub mod io;

pub use io::{load_cfg, save_cfg};
