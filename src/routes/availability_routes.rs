// src/routes/availability_routes.rs

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    availability::{DayAvailability, MonthAvailability},
    error::ApiError,
    models::{ApiOk, AppState},
};

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: String,
}

/// Either `year` + `month`, or any `date` inside the wanted month.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub date: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/availability/day", get(day_availability))
        .route("/availability/month", get(month_availability))
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(
            "VALIDATION_ERROR",
            format!("invalid date '{raw}', expected YYYY-MM-DD"),
        )
    })
}

enum MonthSelector {
    YearMonth(i32, u32),
    Containing(NaiveDate),
}

fn month_selector(q: &MonthQuery) -> Result<MonthSelector, ApiError> {
    match (q.year, q.month, q.date.as_deref()) {
        (Some(year), Some(month), _) => Ok(MonthSelector::YearMonth(year, month)),
        (None, None, Some(raw)) => parse_date(raw).map(MonthSelector::Containing),
        _ => Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "provide year and month, or date".into(),
        )),
    }
}

pub async fn day_availability(
    State(state): State<AppState>,
    Query(q): Query<DayQuery>,
) -> Result<Json<ApiOk<DayAvailability>>, ApiError> {
    let date = parse_date(&q.date)?;
    let data = state.availability.day(date).await?;
    Ok(Json(ApiOk { data }))
}

pub async fn month_availability(
    State(state): State<AppState>,
    Query(q): Query<MonthQuery>,
) -> Result<Json<ApiOk<MonthAvailability>>, ApiError> {
    let data = match month_selector(&q)? {
        MonthSelector::YearMonth(year, month) => state.availability.month(year, month).await?,
        MonthSelector::Containing(date) => state.availability.month_containing(date).await?,
    };
    Ok(Json(ApiOk { data }))
}
