mod code;
mod collection;
mod message;
mod path;
mod severity;

pub use code::*;
pub use collection::*;
pub use message::*;
pub use path::*;
pub use severity::*;
