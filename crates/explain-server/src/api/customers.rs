//! Customer records and image uploads.
//!
//! A successful upload is announced on the owning customer's channel as an
//! `upload` event, so an open subscriber sees it without polling.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use explain_core::{RelayEvent, SubscriberKey, ValidationError};
use explain_store::{CustomerId, NewCustomer};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::error::ApiError;
use super::scalar_to_string;
use crate::server::AppState;

/// Body of `POST /api/customer`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    /// Owning subscriber key; `key` is accepted as an alias.
    #[serde(default, alias = "key")]
    pub emp_no: Option<Value>,
    /// Customer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Phone number, as a string or number.
    #[serde(default)]
    pub phone: Option<Value>,
    /// RFC 3339 timestamp; defaults to now.
    #[serde(default)]
    pub datetime: Option<String>,
}

impl CreateCustomerRequest {
    /// Validate into a store insert.
    pub fn into_new_customer(self) -> Result<NewCustomer, ValidationError> {
        let key = SubscriberKey::parse_opt(scalar_to_string(self.emp_no.as_ref()).as_deref())?;
        let name = required("name", self.name)?;
        let phone = required("phone", scalar_to_string(self.phone.as_ref()))?;
        Ok(NewCustomer {
            emp_no: key.into_inner(),
            name,
            phone,
            datetime: self.datetime.filter(|d| !d.trim().is_empty()),
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_owned()),
        _ => Err(ValidationError::Missing { field }),
    }
}

/// Stored image name: `<name letters and digits>_<phone digits>.png`.
///
/// Falls back to `customer` for an empty name and the record ID for a phone
/// with no digits, so the result is always a safe blob key.
pub fn image_file_name(name: &str, phone: &str, id: CustomerId) -> String {
    let mut stem: String = name.chars().filter(|c| c.is_alphanumeric()).collect();
    if stem.is_empty() {
        stem.push_str("customer");
    }
    let mut digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        digits = id.to_string();
    }
    format!("{stem}_{digits}.png")
}

/// Handle `POST /api/customer`.
pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let customer = state.records.create(request.into_new_customer()?).await?;
    info!(customer_id = customer.id, key = %customer.emp_no, "customer created");
    Ok(Json(json!({ "ok": true, "customer": customer })))
}

/// Handle `GET /api/customer/{key}`.
pub async fn list_customers(
    State(state): State<AppState>,
    Path(raw_key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let key = SubscriberKey::parse(&raw_key)?;
    let list = state.records.list_by_key(key.as_str()).await?;
    Ok(Json(json!({ "ok": true, "list": list })))
}

/// Handle `POST /api/upload` (multipart `customerId` + `file`).
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart?;
    let mut customer_id: Option<String> = None;
    let mut file: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("customerId") => customer_id = Some(field.text().await?),
            Some("file") => file = Some(field.bytes().await?),
            _ => {}
        }
    }

    let raw_id = required("customerId", customer_id)?;
    let id: CustomerId = raw_id.parse().map_err(|_| ValidationError::Invalid {
        field: "customerId",
        message: format!("{raw_id:?} is not a number"),
    })?;
    let file = file
        .filter(|f| !f.is_empty())
        .ok_or(ValidationError::Missing { field: "file" })?;

    let customer = state
        .records
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("customer {id} not found")))?;

    // Record first: a failed attach must not leave a blob behind or
    // overwrite one another customer already points at.
    let filename = image_file_name(&customer.name, &customer.phone, id);
    let size = file.len();
    let customer = state.records.attach_image(id, filename.clone()).await?;
    let stored = state.blobs.save(&filename, file).await?;

    let event = RelayEvent::new(
        "upload",
        Some(json!({ "customerId": id, "filename": stored })),
    )?;
    let outcome = state.broadcaster.publish(&customer.emp_no, &event);
    info!(
        customer_id = id,
        key = %customer.emp_no,
        filename = %stored,
        bytes = size,
        recipients = outcome.recipients,
        "image uploaded"
    );

    Ok(Json(json!({ "ok": true, "filename": stored })))
}

/// Handle `GET /api/image/{filename}`.
pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.blobs.retrieve(&filename).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}
