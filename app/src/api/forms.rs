//! Event form bodies.
//!
//! Create and update accept `multipart/form-data` (text fields plus an
//! optional `image` file part) or a flat JSON object with the same keys.

use crate::uploads::{IMAGES_ONLY, Upload};
use axum::{
    Json, async_trait,
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::header::CONTENT_TYPE,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use evently_core::event::{EventDraft, EventPatch};
use evently_core::types::Capacity;
use evently_web::AppError;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Multipart part carrying the event image.
pub const IMAGE_FIELD: &str = "image";

const REQUIRED_FIELDS: &str = "Please provide all required fields";
const BAD_CAPACITY: &str = "maxAttendees must be a positive integer";
const BAD_DATE: &str = "date must be an ISO 8601 date or date-time";

/// Parse a client-supplied event date.
///
/// Accepts RFC 3339 (`2025-06-01T18:00:00Z`), a date-time without offset
/// (`2025-06-01T18:00`, taken as UTC) or a bare day (`2025-06-01`, midnight UTC).
///
/// ```
/// use evently::api::forms::parse_date;
///
/// assert!(parse_date("2025-06-01T18:00:00+02:00").is_some());
/// assert!(parse_date("2025-06-01").is_some());
/// assert!(parse_date("next tuesday").is_none());
/// ```
#[must_use]
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

fn parse_capacity(raw: &str) -> Result<u32, AppError> {
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|seats| (1..=Capacity::MAX).contains(seats))
        .ok_or_else(|| AppError::validation(BAD_CAPACITY))
}

fn parse_date_field(raw: &str) -> Result<DateTime<Utc>, AppError> {
    parse_date(raw).ok_or_else(|| AppError::validation(BAD_DATE))
}

fn multipart_error(err: &MultipartError) -> AppError {
    AppError::new(err.status(), err.body_text(), "INVALID_FORM")
}

/// Text fields and the optional image of a create or update request.
///
/// A non-image file in the `image` part is rejected while the body is read,
/// before any other validation.
#[derive(Debug, Default)]
pub struct EventForm {
    fields: HashMap<String, String>,
    image: Option<Upload>,
}

impl EventForm {
    /// Build a form from already-decoded parts.
    #[must_use]
    pub fn from_parts(fields: HashMap<String, String>, image: Option<Upload>) -> Self {
        Self { fields, image }
    }

    /// A text field, if the client sent it.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn required(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|value| !value.trim().is_empty())
    }

    /// Take the uploaded image out of the form.
    pub fn take_image(&mut self) -> Option<Upload> {
        self.image.take()
    }

    /// Fields for a new event. The image is not part of the draft; store it
    /// first and set `image_url`.
    ///
    /// # Errors
    ///
    /// 400 if a field is missing or blank, or `maxAttendees` or `date` do not parse.
    pub fn draft(&self) -> Result<EventDraft, AppError> {
        let (Some(title), Some(description), Some(date), Some(location), Some(seats)) = (
            self.required("title"),
            self.required("description"),
            self.required("date"),
            self.required("location"),
            self.required("maxAttendees"),
        ) else {
            return Err(AppError::validation(REQUIRED_FIELDS));
        };

        Ok(EventDraft {
            title: title.to_string(),
            description: description.to_string(),
            date: parse_date_field(date)?,
            location: location.to_string(),
            max_attendees: parse_capacity(seats)?,
            image_url: None,
        })
    }

    /// Fields to overwrite on an existing event. Absent fields stay `None`.
    ///
    /// # Errors
    ///
    /// 400 if a present `maxAttendees` or `date` does not parse.
    pub fn patch(&self) -> Result<EventPatch, AppError> {
        Ok(EventPatch {
            title: self.field("title").map(str::to_string),
            description: self.field("description").map(str::to_string),
            date: self.field("date").map(parse_date_field).transpose()?,
            location: self.field("location").map(str::to_string),
            max_attendees: self.field("maxAttendees").map(parse_capacity).transpose()?,
            image_url: None,
        })
    }

    async fn read_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(&e))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD && field.file_name().is_some() {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;

                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let upload = Upload {
                    file_name,
                    content_type,
                    bytes,
                };
                if !upload.is_image() {
                    return Err(AppError::validation(IMAGES_ONLY));
                }
                form.image = Some(upload);
            } else {
                let text = field.text().await.map_err(|e| multipart_error(&e))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    fn from_json(object: Map<String, Value>) -> Self {
        let fields = object
            .into_iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(text) => text,
                    other => other.to_string(),
                };
                Some((name, text))
            })
            .collect();
        Self::from_parts(fields, None)
    }
}

#[async_trait]
impl<S> FromRequest<S> for EventForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            None => Ok(Self::default()),
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|rejection| AppError::validation(rejection.body_text()))?;
                Self::read_multipart(multipart).await
            }
            Some(ct) if ct.starts_with("application/json") => {
                let Json(object) = Json::<Map<String, Value>>::from_request(req, state)
                    .await
                    .map_err(|rejection| AppError::validation(rejection.body_text()))?;
                Ok(Self::from_json(object))
            }
            Some(other) => Err(AppError::validation(format!(
                "Unsupported content type: {other}"
            ))),
        }
    }
}
