pub mod admin;
pub mod video;

pub use admin::*;
pub use video::*;
