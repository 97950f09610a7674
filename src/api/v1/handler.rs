use super::error::*;
use crate::application_port::*;
use crate::domain_model::{ConversationId, FriendEntry, FriendRequest, FriendRequestId};
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::ok(HealthResponse {
        status: "ok",
    })))
}

pub async fn current_user(
    principal: Principal,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = user_service
        .current_user(principal.user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

pub async fn sync_me(
    principal: Principal,
    user_service: Arc<dyn UserService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = user_service
        .sync_principal(&principal)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}

#[derive(Debug, Deserialize)]
pub struct SendRequestBody {
    pub username: String,
}

pub async fn send_request(
    body: SendRequestBody,
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request: FriendRequest = relationship_service
        .send_request(principal.user_id, &body.username)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&ApiResponse::ok(request)),
        warp::http::StatusCode::CREATED,
    ))
}

pub async fn list_incoming(
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entries: Vec<FriendEntry> = relationship_service
        .list_pending(principal.user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(entries)))
}

pub async fn list_outgoing(
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entries = relationship_service
        .list_outgoing(principal.user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(entries)))
}

pub async fn list_friends(
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let entries = relationship_service
        .list_accepted(principal.user_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(entries)))
}

pub async fn accept_request(
    request_id: FriendRequestId,
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = relationship_service
        .accept_request(principal.user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(request)))
}

pub async fn reject_request(
    request_id: FriendRequestId,
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = relationship_service
        .reject_request(principal.user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(request)))
}

pub async fn remove_friend(
    request_id: FriendRequestId,
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let request = relationship_service
        .remove_friend(principal.user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(request)))
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation_id: ConversationId,
}

pub async fn open_conversation(
    request_id: FriendRequestId,
    principal: Principal,
    relationship_service: Arc<dyn RelationshipService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let conversation_id = relationship_service
        .open_direct_conversation(principal.user_id, request_id)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    debug!(user_id = %principal.user_id, %request_id, "direct conversation opened");
    Ok(warp::reply::json(&ApiResponse::ok(ConversationResponse {
        conversation_id,
    })))
}
