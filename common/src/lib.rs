pub mod buffer2;
pub mod log_setup;
pub mod object_cache;

pub use buffer2::Buffer2;
pub use object_cache::ObjectCache;

pub const EPSILON: f64 = 1e-6;
