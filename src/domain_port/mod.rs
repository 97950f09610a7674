// repo

mod friend_request_repo;
mod user_repo;

mod repo_tx;

pub use friend_request_repo::*;
pub use user_repo::*;

pub use repo_tx::*;
