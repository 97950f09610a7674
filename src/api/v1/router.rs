use super::error::*;
use super::handler;
use crate::application_port::*;
use crate::domain_model::FriendRequestId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 4 * 1024;

// Paths are matched before methods so unknown paths reject as 404, not 405.

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::health);

    let me = warp::path("me")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::current_user);

    let sync_me = warp::path("me")
        .and(warp::path::end())
        .and(warp::put())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::sync_me);

    let send_request = warp::path!("friends" / "requests")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::send_request);

    let incoming = warp::path!("friends" / "requests" / "incoming")
        .and(warp::get())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_incoming);

    let outgoing = warp::path!("friends" / "requests" / "outgoing")
        .and(warp::get())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_outgoing);

    let accept = warp::path!("friends" / "requests" / FriendRequestId / "accept")
        .and(warp::post())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::accept_request);

    let reject_request = warp::path!("friends" / "requests" / FriendRequestId / "reject")
        .and(warp::post())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::reject_request);

    let friends = warp::path("friends")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::list_friends);

    let remove = warp::path!("friends" / FriendRequestId)
        .and(warp::delete())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::remove_friend);

    let conversation = warp::path!("friends" / FriendRequestId / "conversation")
        .and(warp::post())
        .and(with_principal(server.identity_provider.clone()))
        .and(with(server.relationship_service.clone()))
        .and_then(handler::open_conversation);

    health
        .or(me)
        .or(sync_me)
        .or(send_request)
        .or(incoming)
        .or(outgoing)
        .or(accept)
        .or(reject_request)
        .or(friends)
        .or(remove)
        .or(conversation)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_principal(
    identity_provider: Arc<dyn IdentityProvider>,
) -> impl Filter<Extract = (Principal,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_ref()).and_then(
        move |header: Option<String>| {
            let identity_provider = identity_provider.clone();
            async move {
                let Some(token) = header.as_deref().and_then(|h| h.strip_prefix("Bearer ")) else {
                    return Err(reject::custom(ApiError::new(
                        ApiErrorCode::InvalidToken,
                        "missing bearer token",
                    )));
                };
                let principal = identity_provider
                    .verify(token)
                    .await
                    .map_err(ApiError::from)
                    .map_err(reject::custom)?;
                Ok(principal)
            }
        },
    )
}
