pub mod reader;
pub mod traits;

pub use reader::{Line, LineReader};
pub use traits::LineSource;
