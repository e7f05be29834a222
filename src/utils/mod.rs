//! Utility modules for sprite-fetch
//!
//! - `files`: output tree creation, no-clobber writes, and inventory
//! - `http`: the fetch capability and its HTTP implementation

pub mod files;
pub mod http;
