pub mod atomic;

pub use atomic::{ensure_dir, exists_no_follow, remove_if_present, rename_file};
