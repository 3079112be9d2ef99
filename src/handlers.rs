use crate::availability::Availability;
use crate::calendar::{Month, MonthView, month_view};
use crate::date_key::{DateKey, InvalidDate};
use crate::errors::AppError;
use crate::models::{CalendarQuery, DayResponse, SessionResponse};
use crate::state::{AppState, Session};
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Utc;
use std::sync::Arc;

pub async fn index() -> Html<String> {
    Html(render_index(&DateKey::new(Utc::now().date_naive())))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionResponse>) {
    let (id, session) = state.open_session().await;
    (StatusCode::CREATED, Json(to_response(id, &session).await))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(to_response(id, &session).await))
}

pub async fn init_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = find_session(&state, id).await?;
    session.initialize().await?;
    Ok(Json(to_response(id, &session).await))
}

pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .reset_session(id)
        .await
        .ok_or_else(|| missing_session(id))?;
    Ok(Json(to_response(id, &session).await))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    if state.close_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(missing_session(id))
    }
}

pub async fn classify_day(
    State(state): State<AppState>,
    Path((id, date)): Path<(u64, String)>,
) -> Result<Json<DayResponse>, AppError> {
    let date: DateKey = date
        .parse()
        .map_err(|err: InvalidDate| AppError::bad_request(err.to_string()))?;
    let availability = ready_availability(&state, id).await?;

    Ok(Json(DayResponse::new(date, availability.classify(date))))
}

pub async fn month_calendar(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<MonthView>, AppError> {
    let month = match query.month.as_deref() {
        Some(raw) => raw
            .parse::<Month>()
            .map_err(|err| AppError::bad_request(err.to_string()))?,
        None => Month::containing(DateKey::new(Utc::now().date_naive())),
    };
    let availability = ready_availability(&state, id).await?;

    Ok(Json(month_view(month, |day| availability.classify(day))))
}

async fn find_session(state: &AppState, id: u64) -> Result<Arc<Session>, AppError> {
    state.session(id).await.ok_or_else(|| missing_session(id))
}

async fn ready_availability(state: &AppState, id: u64) -> Result<Arc<Availability>, AppError> {
    let session = find_session(state, id).await?;
    match session.availability().await {
        Some(availability) => Ok(availability),
        None => {
            let phase = session.phase().await;
            Err(AppError::conflict(format!(
                "calendar session {id} is {phase:?}, not ready"
            )))
        }
    }
}

async fn to_response(id: u64, session: &Session) -> SessionResponse {
    SessionResponse {
        id,
        snapshot: session.snapshot().await,
    }
}

fn missing_session(id: u64) -> AppError {
    AppError::not_found(format!("calendar session {id} not found"))
}
