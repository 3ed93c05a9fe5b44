pub mod detector;
pub mod error;
pub mod frame;
pub mod image;
pub mod messenger;
pub mod model;
pub mod overlay;
pub mod result;
pub mod session;
pub mod setting;
pub mod sync;
pub mod tracing;

pub use error::Error;
pub use result::Result;
