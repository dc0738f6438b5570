//! Resource loading and management.
//!
//! This crate handles loading of external assets:
//! - OBJ mesh loading with content-addressed vertex deduplication
//! - Image/texture pixel loading

pub mod error;
pub mod obj;
pub mod texture;

pub use error::{ResourceError, ResourceResult};
pub use obj::{load_obj, load_obj_from};
pub use texture::{PixelData, decode_pixels, load_pixels};
