mod process_tree;
mod users;

pub use process_tree::*;
pub use users::*;
