use crate::controller::user_session_controller::start_session;
use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use domain::user::{self as UserApi, Registration, User};

use log::*;

/// CREATE a new User and log them in
#[utoipa::path(
    post,
    path = "/signup",
    request_body(content = domain::user::Registration, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Successfully created a new User", body = User),
        (status = 409, description = "A User with this email already exists"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 405, description = "Method not allowed")
    )
)]
pub async fn create(
    State(app_state): State<AppState>,
    Form(registration): Form<Registration>,
) -> Result<impl IntoResponse, Error> {
    debug!("CREATE new User with email: {:?}", registration.email);

    let user: User = UserApi::register(&app_state.users, registration)?;
    let set_cookie = start_session(&app_state, &user)?;

    debug!("Newly created User {:?}", &user);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, set_cookie)],
        Json(ApiResponse::new(StatusCode::CREATED.into(), user)),
    ))
}
