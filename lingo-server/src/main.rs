use std::env;
use std::net::SocketAddr;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Json};

use lingo_common::{NewUser, PresenceEvent, ProfileUpdate, ReconcileReport, RequestId, UserId};

use crate::error::Result;
use crate::presence::Presence;
use crate::store::State;

mod error;
mod notify;
mod presence;
mod profile;
mod recommend;
mod requests;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();
    let mut port = 8000;
    if let Some(p) = env::args().collect::<Vec<_>>().get(1) {
        port = p.parse()?;
    }
    let db_path = String::from("lingo-db") + &port.to_string();
    let _ = std::fs::remove_dir_all(&db_path);
    let state = State::open(db_path, Presence::from_env())?;
    let app = axum::Router::new()
        .route("/", get(root))
        .route("/users", post(create_user))
        .route("/:user_id/profile", put(update_profile))
        .route("/:user_id/recommended", get(list_recommended))
        .route("/:user_id/friends", get(list_friends))
        .route("/:user_id/friend-request/:id", post(send_friend_request))
        .route("/:user_id/friend-request/:id/accept", put(accept_friend_request))
        .route("/:user_id/friend-requests", get(list_friend_requests))
        .route("/:user_id/outgoing-friend-requests", get(outgoing_friend_requests))
        .route("/:user_id/notifications", get(list_notifications))
        .route("/admin/reconcile", post(reconcile))
        .route("/presence/event", post(presence_event))
        .layer(Extension(state));
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("listening on {addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

async fn root(Extension(_state): Extension<State>) -> &'static str {
    "lingo"
}

async fn create_user(
    Extension(state): Extension<State>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse> {
    let user = profile::create_user(&state, payload)?;
    state.presence.announce_user(&user.id, &user.full_name).await;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_profile(
    Extension(state): Extension<State>,
    Path(user_id): Path<String>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<impl IntoResponse> {
    Ok(Json(profile::update_profile(&state, &UserId(user_id), payload)?))
}

async fn list_recommended(
    Extension(state): Extension<State>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(recommend::recommend(&state, &UserId(user_id))?))
}

async fn list_friends(
    Extension(state): Extension<State>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(profile::friends_of(&state, &UserId(user_id))?))
}

async fn send_friend_request(
    Extension(state): Extension<State>,
    Path((user_id, target_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let request = requests::send(&state, &UserId(user_id), &UserId(target_id))?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn accept_friend_request(
    Extension(state): Extension<State>,
    Path((user_id, request_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let request = requests::accept(&state, &UserId(user_id), &RequestId(request_id))?;
    state
        .presence
        .friendship_established(&request.sender, &request.recipient)
        .await;
    Ok(Json(serde_json::json!({ "message": "friend request accepted" })))
}

async fn list_friend_requests(
    Extension(state): Extension<State>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(requests::summary(&state, &UserId(user_id))?))
}

async fn outgoing_friend_requests(
    Extension(state): Extension<State>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(requests::outgoing_pending(&state, &UserId(user_id))?))
}

async fn list_notifications(
    Extension(state): Extension<State>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    Ok(Json(notify::list_for_recipient(&state, &UserId(user_id))?))
}

async fn reconcile(Extension(state): Extension<State>) -> Result<impl IntoResponse> {
    let repaired = requests::reconcile(&state)?;
    Ok(Json(ReconcileReport { repaired }))
}

async fn presence_event(
    Extension(state): Extension<State>,
    Json(event): Json<PresenceEvent>,
) -> Result<impl IntoResponse> {
    state.presence.record_event(&event);
    Ok(StatusCode::ACCEPTED)
}
