//! Format implementations
//!
//! Two marker-stream dialects (`usfm` inline, `toolbox` stand-alone), a
//! lossless `json` dump of the model and a `tree` view for inspection.

pub mod json;
mod markers;
pub mod toolbox;
pub mod tree;
pub mod usfm;

pub use json::JsonFormat;
pub use toolbox::ToolboxFormat;
pub use tree::TreeFormat;
pub use usfm::UsfmFormat;
