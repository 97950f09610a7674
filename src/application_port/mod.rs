mod identity_provider;
mod relationship_service;
mod user_service;

pub use identity_provider::*;
pub use relationship_service::*;
pub use user_service::*;
