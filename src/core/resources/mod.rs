//! Typed CRUD access to the backend collections
//!
//! Each collection is a [`Resource`]; [`ResourceClient`] provides list/get/create/
//! update/delete over the authenticated pipeline:
//! - GET    /{resource}/      - list
//! - GET    /{resource}/:id/  - fetch one
//! - POST   /{resource}/      - create
//! - PUT    /{resource}/:id/  - update
//! - DELETE /{resource}/:id/  - delete

pub mod courses;
pub mod dashboard;
pub mod students;
pub mod teachers;

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::api::{ApiClient, ApiError, ApiRequest, HttpTransport, ensure_success};
use crate::core::auth::SessionStore;

pub use courses::{Course, CourseForm};
pub use dashboard::DashboardStats;
pub use students::{Student, StudentFilter, StudentForm};
pub use teachers::{Teacher, TeacherFilter, TeacherForm, departments};

/// A backend collection
pub trait Resource: DeserializeOwned {
    /// Collection path, with leading and trailing slash
    const PATH: &'static str;
    /// Plural name used in user-facing messages
    const LABEL: &'static str;
    /// Payload for create and update
    type Form: Serialize;
}

/// Items that can be matched against a free-text search box
pub trait Searchable {
    /// Fields the search term is matched against
    fn search_fields(&self) -> Vec<Option<&str>>;

    /// Case-insensitive substring match on any search field. An empty term
    /// matches everything.
    fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.search_fields()
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

/// Items matching `term`, in their original order
pub fn filter_by_search<'a, R: Searchable>(items: &'a [R], term: &str) -> Vec<&'a R> {
    items.iter().filter(|item| item.matches_search(term)).collect()
}

/// Items that export as one CSV row each
pub trait CsvRow {
    const HEADER: &'static [&'static str];

    fn csv_row(&self) -> Vec<String>;
}

/// Header plus one line per item. Cells containing a comma, quote or newline
/// are quoted.
pub fn to_csv<R: CsvRow>(items: &[&R]) -> String {
    let header = R::HEADER.iter().map(|cell| escape_csv(cell)).collect::<Vec<_>>();
    let mut lines = vec![header.join(",")];
    for item in items {
        let row = item.csv_row();
        lines.push(row.iter().map(|cell| escape_csv(cell)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn escape_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// CRUD client for one collection
pub struct ResourceClient<R, S, T> {
    api: ApiClient<S, T>,
    _resource: PhantomData<fn() -> R>,
}

impl<R, S, T> Clone for ResourceClient<R, S, T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R, S, T> ResourceClient<R, S, T>
where
    R: Resource,
    S: SessionStore,
    T: HttpTransport,
{
    pub fn new(api: ApiClient<S, T>) -> Self {
        Self {
            api,
            _resource: PhantomData,
        }
    }

    /// Fetch the whole collection
    pub async fn list(&self) -> Result<Vec<R>, ApiError> {
        let body: Value = self.api.send_json(&ApiRequest::get(R::PATH)).await?;
        let items = Self::decode_list(body)?;
        tracing::debug!("Fetched {} {}", items.len(), R::LABEL);
        Ok(items)
    }

    pub async fn get(&self, id: i64) -> Result<R, ApiError> {
        let body: Value = self.api.send_json(&ApiRequest::get(Self::item_path(id))).await?;
        Self::decode_single(body)
    }

    pub async fn create(&self, form: &R::Form) -> Result<R, ApiError> {
        let request = ApiRequest::post(R::PATH).json(form)?;
        let body: Value = self.api.send_json(&request).await?;
        tracing::info!("Created entry in {}", R::LABEL);
        Self::decode_single(body)
    }

    pub async fn update(&self, id: i64, form: &R::Form) -> Result<R, ApiError> {
        let request = ApiRequest::put(Self::item_path(id)).json(form)?;
        let body: Value = self.api.send_json(&request).await?;
        tracing::info!("Updated {} entry {}", R::LABEL, id);
        Self::decode_single(body)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        let response = self.api.send(&ApiRequest::delete(Self::item_path(id))).await?;
        ensure_success(response)?;
        tracing::info!("Deleted {} entry {}", R::LABEL, id);
        Ok(())
    }

    /// Fallback message shown when listing fails
    pub fn fetch_failed_message() -> String {
        format!("Failed to fetch {}", R::LABEL)
    }

    fn item_path(id: i64) -> String {
        format!("{}{}/", R::PATH, id)
    }

    /// Accepts `{data:[..]}`, `{results:[..]}` or a bare array; anything else is empty
    fn decode_list(body: Value) -> Result<Vec<R>, ApiError> {
        let items = match body {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut map) => match (map.remove("data"), map.remove("results")) {
                (Some(data @ Value::Array(_)), _) => data,
                (_, Some(results @ Value::Array(_))) => results,
                _ => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        };
        Ok(serde_json::from_value(items)?)
    }

    /// Accepts the object itself or `{data: object}`
    fn decode_single(body: Value) -> Result<R, ApiError> {
        let item = match body {
            Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(serde_json::from_value(item)?)
    }
}

/// Accept a string, a number or null. DRF sends decimals as strings and some
/// choice fields as numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
