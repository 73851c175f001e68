//! Small utilities shared by the markup crates.

mod collections;
mod io;
pub mod logger;
mod utils;

pub use crate::collections::{contains_duplicates, wraparound_get, Counter};
pub use crate::io::{deserialize_btreemap, serialize_btreemap};
pub use crate::utils::{plain_list_names, prettyprint_usize};

// Thanks https://stackoverflow.com/a/49806368
#[macro_export]
macro_rules! skip_fail {
    ($res:expr) => {
        match $res {
            Some(val) => val,
            None => {
                continue;
            }
        }
    };
}
