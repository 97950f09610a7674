mod friend;
mod user;
mod username;

pub use friend::*;
pub use user::*;
pub use username::*;
