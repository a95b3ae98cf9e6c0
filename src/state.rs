//! Private module for selective re-export.

mod buffer;
mod layout;
mod order;
mod view;

pub use buffer::*;
pub use layout::*;
pub use order::*;
pub use view::*;
