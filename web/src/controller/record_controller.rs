use crate::controller::ApiResponse;
use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::record::{self as RecordApi, Record, RecordKind, RecordLog, RecordParams};
use domain::Id;
use uuid::Uuid;

use log::*;

/// POST create a new expense or income record
#[utoipa::path(
    post,
    path = "/dashboard/{kind}",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`")
    ),
    request_body = RecordParams,
    responses(
        (status = 201, description = "Successfully Created a New Record", body = Record),
        (status = 422, description = "Unprocessable Entity"),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn create(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(kind): Path<RecordKind>,
    Json(params): Json<RecordParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New {kind} from: {params:?}");

    let record = RecordApi::create(
        &app_state.records,
        app_state.event_publisher.as_ref(),
        user.id,
        kind,
        params,
    )
    .await?;

    debug!("New {kind}: {record:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), record)),
    ))
}

/// GET all of the current user's records of one kind, newest first
#[utoipa::path(
    get,
    path = "/dashboard/{kind}",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`")
    ),
    responses(
        (status = 200, description = "Successfully retrieved all Records", body = [Record]),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn index(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path(kind): Path<RecordKind>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all {kind} records for user {}", user.id);

    let records = RecordApi::find_by_user(&app_state.records, user.id, kind);

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), records)))
}

/// GET a particular record specified by its id.
#[utoipa::path(
    get,
    path = "/dashboard/{kind}/{id}",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`"),
        ("id" = Uuid, Path, description = "Record id to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved a specific Record by its id", body = Record),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(RecordKind, Id)>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET {kind} by id: {id}");

    let record = RecordApi::find_by_id(&app_state.records, user.id, kind, id)?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), record)))
}

/// GET the edit history of a record, newest first.
#[utoipa::path(
    get,
    path = "/dashboard/{kind}/{id}/logs",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`"),
        ("id" = Uuid, Path, description = "Record id whose history to retrieve")
    ),
    responses(
        (status = 200, description = "Successfully retrieved the Record's history", body = [RecordLog]),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn logs(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(RecordKind, Id)>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET history of {kind} {id}");

    let logs = RecordApi::find_logs(&app_state.records, user.id, kind, id)?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), logs)))
}

#[utoipa::path(
    put,
    path = "/dashboard/{kind}/{id}",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`"),
        ("id" = Uuid, Path, description = "Id of the Record to update"),
    ),
    request_body = RecordParams,
    responses(
        (status = 200, description = "Successfully Updated Record", body = Record),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found"),
        (status = 422, description = "Unprocessable Entity"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn update(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(RecordKind, Id)>,
    Json(params): Json<RecordParams>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update {kind} {id} with: {params:?}");

    let record = RecordApi::update(
        &app_state.records,
        app_state.event_publisher.as_ref(),
        user.id,
        kind,
        id,
        params,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), record)))
}

#[utoipa::path(
    delete,
    path = "/dashboard/{kind}/{id}",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`"),
        ("id" = Uuid, Path, description = "Id of the Record to delete"),
    ),
    responses(
        (status = 200, description = "Successfully Deleted Record"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn delete(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(RecordKind, Id)>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE {kind} by id: {id}");

    RecordApi::delete(
        &app_state.records,
        app_state.event_publisher.as_ref(),
        user.id,
        kind,
        id,
    )
    .await?;

    Ok(Json(ApiResponse::<()>::no_content(StatusCode::OK.into())))
}

#[utoipa::path(
    delete,
    path = "/dashboard/{kind}/{id}/attachment",
    params(
        ("kind" = RecordKind, Path, description = "Either `expenses` or `income`"),
        ("id" = Uuid, Path, description = "Id of the Record whose attachment is removed"),
    ),
    responses(
        (status = 200, description = "Successfully removed the attachment", body = Record),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Record not found"),
        (status = 405, description = "Method not allowed")
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn remove_attachment(
    AuthenticatedUser(user): AuthenticatedUser,
    State(app_state): State<AppState>,
    Path((kind, id)): Path<(RecordKind, Id)>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE attachment of {kind} {id}");

    let record = RecordApi::remove_attachment(
        &app_state.records,
        app_state.event_publisher.as_ref(),
        user.id,
        kind,
        id,
    )
    .await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), record)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    fn params(title: &str, amount: i64) -> serde_json::Value {
        json!({"title": title, "amount": amount, "attachment": "receipt.pdf"})
    }

    #[tokio::test]
    async fn records_require_a_session() {
        let (_, router) = app();

        let index = send(&router, get("/dashboard/expenses", None)).await;
        let create = send(&router, json("POST", "/dashboard/income", None, params("Pay", 1))).await;

        assert_eq!(index.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(create.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn crud_round_trip_for_the_owner() {
        let (app_state, router) = app();
        let user = register(&app_state, "bee@example.com");
        let cookie = session_cookie(&app_state, &user);

        let created = send(&router, json("POST", "/dashboard/expenses", Some(&cookie), params("Rent", 900))).await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let record = body_json(created).await["data"].clone();
        let uri = format!("/dashboard/expenses/{}", record["id"].as_str().unwrap());
        assert_eq!(record["currency_code"], "USD");
        assert_eq!(record["kind"], "expenses");

        let updated = send(&router, json("PUT", &uri, Some(&cookie), params("Rent (June)", 950))).await;
        assert_eq!(body_json(updated).await["data"]["amount"], 950);

        let stripped = send(&router, delete(&format!("{uri}/attachment"), Some(&cookie))).await;
        assert!(body_json(stripped).await["data"]["attachment"].is_null());

        let history = body_json(send(&router, get(&format!("{uri}/logs"), Some(&cookie))).await).await;
        let titles: Vec<&str> = history["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|log| log["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Rent (June)", "Rent"]);

        let listed = body_json(send(&router, get("/dashboard/expenses", Some(&cookie))).await).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let deleted = send(&router, delete(&uri, Some(&cookie))).await;
        assert_eq!(deleted.status(), StatusCode::OK);
        let gone = send(&router, get(&uri, Some(&cookie))).await;
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn other_users_records_are_not_found() {
        let (app_state, router) = app();
        let owner = register(&app_state, "bee@example.com");
        let intruder = register(&app_state, "wasp@example.com");
        let owner_cookie = session_cookie(&app_state, &owner);
        let intruder_cookie = session_cookie(&app_state, &intruder);

        let created = send(&router, json("POST", "/dashboard/income", Some(&owner_cookie), params("Pay", 10))).await;
        let id = body_json(created).await["data"]["id"].as_str().unwrap().to_string();

        let read = send(&router, get(&format!("/dashboard/income/{id}"), Some(&intruder_cookie))).await;
        let wrong_kind = send(&router, get(&format!("/dashboard/expenses/{id}"), Some(&owner_cookie))).await;
        let history = send(&router, get(&format!("/dashboard/income/{id}/logs"), Some(&intruder_cookie))).await;
        let removed = send(&router, delete(&format!("/dashboard/income/{id}"), Some(&intruder_cookie))).await;

        assert_eq!(read.status(), StatusCode::NOT_FOUND);
        assert_eq!(wrong_kind.status(), StatusCode::NOT_FOUND);
        assert_eq!(history.status(), StatusCode::NOT_FOUND);
        assert_eq!(removed.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_records_are_unprocessable_and_publish_nothing() {
        let (app_state, router) = app();
        let user = register(&app_state, "bee@example.com");
        let cookie = session_cookie(&app_state, &user);
        let mut subscription = app_state.sse_manager.subscribe(user.id.to_string());

        let blank = send(&router, json("POST", "/dashboard/expenses", Some(&cookie), params("  ", 1))).await;
        let negative = send(&router, json("POST", "/dashboard/expenses", Some(&cookie), params("Tax", -5))).await;

        assert_eq!(blank.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(negative.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(subscription.try_recv().is_none());
    }
}
