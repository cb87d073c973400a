pub mod users;
pub mod votes;
