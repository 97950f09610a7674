mod identity_provider_fake;
mod identity_provider_jwt;
mod relationship_service_impl;
mod user_service_impl;

pub use identity_provider_fake::*;
pub use identity_provider_jwt::*;
pub use relationship_service_impl::*;
pub use user_service_impl::*;
