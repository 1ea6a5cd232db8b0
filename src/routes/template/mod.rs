mod block;
mod option;

pub use block::*;
pub use option::*;
