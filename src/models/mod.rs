pub mod proposal;
pub mod user;
pub mod vote;

pub use proposal::*;
pub use user::*;
pub use vote::*;
