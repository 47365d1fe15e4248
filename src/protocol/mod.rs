pub mod framing;
pub mod render;

pub use framing::{segment_count, segments};
pub use render::render_payload;
