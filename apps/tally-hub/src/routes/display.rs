//! Producer endpoints: turn till parameters into display events.

use std::collections::HashMap;

use axum::extract::rejection::FormRejection;
use axum::extract::{FromRequest, FromRequestParts, Query, Request, State};
use axum::http::header;
use axum::Form;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::{Charge, DisplayEvent, Label, LineItem, Record};
use crate::AppState;

/// Record number used when the till does not send one.
const DEFAULT_RECORD_NUMBER: &str = "1504";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clear", get(clear).post(clear))
        .route("/record", get(new_record).post(new_record))
        .route("/line/add", get(add_line).post(add_line))
        .route("/line/remove", get(remove_line).post(remove_line))
        .route("/charge", get(charge).post(charge))
        .route("/label", get(add_label).post(add_label))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/clear",
    tag = "Display",
    responses(
        (status = 200, description = "Clear broadcast; echoes the envelope"),
        (status = 503, description = "Hub not running", body = ApiErrorBody),
    ),
)]
pub async fn clear(State(state): State<AppState>) -> Result<Response, ApiError> {
    publish(&state, DisplayEvent::Clear).await
}

#[utoipa::path(
    post,
    path = "/record",
    tag = "Display",
    params(("number" = Option<String>, Query, description = "Bill number")),
    responses(
        (status = 200, description = "New record broadcast; echoes the envelope"),
        (status = 503, description = "Hub not running", body = ApiErrorBody),
    ),
)]
pub async fn new_record(
    State(state): State<AppState>,
    TillParams(params): TillParams,
) -> Result<Response, ApiError> {
    let number = params
        .get("number")
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_RECORD_NUMBER)
        .to_string();
    publish(&state, DisplayEvent::NewRecord(Record { number })).await
}

#[utoipa::path(
    post,
    path = "/line/add",
    tag = "Display",
    params(
        ("name" = String, Query, description = "Item name"),
        ("count" = f64, Query, description = "Quantity"),
        ("cost" = f64, Query, description = "Unit price"),
        ("sum" = f64, Query, description = "Line total"),
        ("total" = f64, Query, description = "Bill total"),
    ),
    responses(
        (status = 200, description = "Line broadcast; echoes the envelope"),
        (status = 400, description = "Missing or malformed parameters", body = ApiErrorBody),
        (status = 503, description = "Hub not running", body = ApiErrorBody),
    ),
)]
pub async fn add_line(
    State(state): State<AppState>,
    TillParams(params): TillParams,
) -> Result<Response, ApiError> {
    let item = line_item(Params::new(params)?)?;
    publish(&state, DisplayEvent::AddLine(item)).await
}

#[utoipa::path(
    post,
    path = "/line/remove",
    tag = "Display",
    params(
        ("name" = String, Query, description = "Item name"),
        ("count" = f64, Query, description = "Quantity"),
        ("cost" = f64, Query, description = "Unit price"),
        ("sum" = f64, Query, description = "Line total"),
        ("total" = f64, Query, description = "Bill total"),
    ),
    responses(
        (status = 200, description = "Removal broadcast; echoes the envelope"),
        (status = 400, description = "Missing or malformed parameters", body = ApiErrorBody),
        (status = 503, description = "Hub not running", body = ApiErrorBody),
    ),
)]
pub async fn remove_line(
    State(state): State<AppState>,
    TillParams(params): TillParams,
) -> Result<Response, ApiError> {
    let item = line_item(Params::new(params)?)?;
    publish(&state, DisplayEvent::RemoveLine(item)).await
}

#[utoipa::path(
    post,
    path = "/charge",
    tag = "Display",
    params(
        ("introduced" = f64, Query, description = "Amount tendered"),
        ("delivery" = f64, Query, description = "Change due"),
        ("sum" = f64, Query, description = "Bill total"),
    ),
    responses(
        (status = 200, description = "Charge broadcast; echoes the envelope"),
        (status = 400, description = "Missing or malformed parameters", body = ApiErrorBody),
        (status = 503, description = "Hub not running", body = ApiErrorBody),
    ),
)]
pub async fn charge(
    State(state): State<AppState>,
    TillParams(params): TillParams,
) -> Result<Response, ApiError> {
    let mut params = Params::new(params)?;
    let charge = Charge {
        introduced: params.amount("introduced"),
        delivery: params.amount("delivery"),
        sum: params.amount("sum"),
    };
    params.finish()?;
    publish(&state, DisplayEvent::Charge(charge)).await
}

#[utoipa::path(
    post,
    path = "/label",
    tag = "Display",
    params(("strings" = String, Query, description = "Text to show")),
    responses(
        (status = 200, description = "Label broadcast; echoes the envelope"),
        (status = 400, description = "No parameters", body = ApiErrorBody),
        (status = 503, description = "Hub not running", body = ApiErrorBody),
    ),
)]
pub async fn add_label(
    State(state): State<AppState>,
    TillParams(params): TillParams,
) -> Result<Response, ApiError> {
    let params = Params::new(params)?;
    // A missing `strings` shows an empty label; tills use that to blank it.
    let label = Label {
        text: params.text("strings"),
    };
    publish(&state, DisplayEvent::AddLabel(label)).await
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Query string merged with an optional urlencoded body; body values win.
///
/// Tills send either, and a bare `POST` with no body at all is just an empty
/// parameter set.
pub struct TillParams(pub HashMap<String, String>);

impl FromRequest<AppState> for TillParams {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Query(mut values) =
            Query::<HashMap<String, String>>::from_request_parts(&mut parts, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let req = Request::from_parts(parts, body);
        match Form::<HashMap<String, String>>::from_request(req, state).await {
            Ok(Form(form)) => values.extend(form),
            Err(FormRejection::InvalidFormContentType(_)) => {}
            Err(e) => return Err(ApiError::bad_request(e.body_text())),
        }

        Ok(Self(values))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serialize `event`, hand it to the hub and echo the frame back to the till.
async fn publish(state: &AppState, event: DisplayEvent) -> Result<Response, ApiError> {
    let envelope = event.to_envelope()?;
    let frame = envelope.frame().clone();
    tracing::debug!(kind = %envelope.kind(), "publishing display event");
    state.hub.broadcast(envelope).await?;
    Ok(([(header::CONTENT_TYPE, "application/json")], frame).into_response())
}

fn line_item(mut params: Params) -> Result<LineItem, ApiError> {
    let item = LineItem {
        name: params.text("name"),
        count: params.amount("count"),
        cost: params.amount("cost"),
        sum: params.amount("sum"),
        total: params.amount("total"),
    };
    params.finish()?;
    Ok(item)
}

/// Form parameters plus the field errors collected while reading them.
struct Params {
    values: HashMap<String, String>,
    errors: Vec<FieldError>,
}

impl Params {
    fn new(values: HashMap<String, String>) -> Result<Self, ApiError> {
        if values.is_empty() {
            return Err(ApiError::bad_request("No params"));
        }
        Ok(Self {
            values,
            errors: Vec::new(),
        })
    }

    fn text(&self, field: &str) -> String {
        self.values
            .get(field)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Parse a money/quantity field, rounded to cents.
    fn amount(&mut self, field: &str) -> f64 {
        let raw = self.values.get(field).map(|v| v.trim()).unwrap_or("");
        if raw.is_empty() {
            self.errors.push(FieldError::new(field, "is required"));
            return 0.0;
        }
        // Huge inputs overflow once scaled to cents, so check after rounding.
        match raw.parse::<f64>().map(round_cents) {
            Ok(value) if value.is_finite() => value,
            _ => {
                self.errors.push(FieldError::new(field, "must be a number"));
                0.0
            }
        }
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(self.errors))
        }
    }
}

/// Round to two decimals, halves going up.
fn round_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    let rounded = if scaled.fract() >= 0.5 {
        scaled.ceil()
    } else {
        scaled.floor()
    };
    rounded / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn round_cents_rounds_half_up() {
        assert_eq!(round_cents(3.456), 3.46);
        assert_eq!(round_cents(1.234), 1.23);
        assert_eq!(round_cents(2.5), 2.5);
        assert_eq!(round_cents(7.0), 7.0);
    }

    #[test]
    fn empty_form_is_rejected() {
        let err = Params::new(HashMap::new()).err().unwrap();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "BAD_REQUEST");
    }

    #[test]
    fn line_item_parses_and_rounds() {
        let params = Params::new(form(&[
            ("name", " Coffee "),
            ("count", "1"),
            ("cost", "3.499"),
            ("sum", "3.5"),
            ("total", "10.126"),
        ]))
        .unwrap();
        let item = line_item(params).unwrap();
        assert_eq!(item.name, "Coffee");
        assert_eq!(item.count, 1.0);
        assert_eq!(item.cost, 3.5);
        assert_eq!(item.total, 10.13);
    }

    #[test]
    fn line_item_reports_every_bad_field() {
        let params = Params::new(form(&[("name", "Tea"), ("count", "two"), ("cost", "1")])).unwrap();
        let err = line_item(params).unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
        let details = err.details.unwrap();
        let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["count", "sum", "total"]);
        assert_eq!(details[0].message, "must be a number");
        assert_eq!(details[1].message, "is required");
    }

    #[test]
    fn non_finite_amounts_are_rejected() {
        let mut params = Params::new(form(&[("sum", "NaN")])).unwrap();
        params.amount("sum");
        assert!(params.finish().is_err());
    }

    #[test]
    fn amounts_that_overflow_when_rounded_are_rejected() {
        let mut params = Params::new(form(&[("count", "1e307"), ("cost", "1.5")])).unwrap();
        assert_eq!(params.amount("cost"), 1.5);
        params.amount("count");
        let err = params.finish().unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].field, "count");
        assert_eq!(details[0].message, "must be a number");
    }
}
