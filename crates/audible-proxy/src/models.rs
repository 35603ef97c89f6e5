//! Request, response, and upstream data shapes.
//!
//! The `Raw*` types mirror the upstream library API loosely; everything is
//! optional because response groups control which fields appear. The
//! outward-facing types are the flattened shapes this service returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------
// Request bodies
// ------------------------------------------------------------------

/// Body for `POST /api/auth`.
#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Body for `POST /api/library` and `POST /api/progress/{asin}`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// Body for `POST /api/refresh-token`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

// ------------------------------------------------------------------
// Response bodies
// ------------------------------------------------------------------

/// Response for `POST /api/auth`.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub access_token: String,
    pub refresh_token: String,
    pub device_serial: String,
    pub expires_at: String,
}

/// One book in a library response.
#[derive(Debug, Serialize, PartialEq)]
pub struct Book {
    pub asin: Option<String>,
    pub title: String,
    pub authors: Vec<String>,
    pub narrators: Vec<String>,
    pub runtime_length_min: u64,
    pub cover_url: String,
    pub release_date: Option<String>,
    pub percent_complete: u64,
    pub position_seconds: u64,
    pub is_finished: bool,
    pub isbn: Option<String>,
}

/// Response for `POST /api/library`.
#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub success: bool,
    pub books: Vec<Book>,
    pub total_count: usize,
}

/// Response for `POST /api/progress/{asin}`.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub asin: String,
    pub position_seconds: u64,
    pub percent_complete: u64,
    pub is_finished: bool,
}

/// Response for `POST /api/refresh-token`.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub access_token: String,
    pub expires_at: String,
}

/// Response for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: String,
}

// ------------------------------------------------------------------
// Upstream shapes
// ------------------------------------------------------------------

/// One item from the upstream library endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLibraryItem {
    #[serde(default)]
    pub asin: Option<String>,
    #[serde(default)]
    pub product: RawProduct,
    #[serde(default)]
    pub last_position_heard: RawPosition,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProduct {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<RawPerson>,
    #[serde(default)]
    pub narrators: Vec<RawPerson>,
    #[serde(default)]
    pub runtime_length_min: Option<u64>,
    #[serde(default)]
    pub runtime_length_sec: Option<u64>,
    #[serde(default)]
    pub product_images: BTreeMap<String, String>,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPerson {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPosition {
    #[serde(default)]
    pub position_in_book_seconds: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl RawLibraryItem {
    /// Listening position in seconds, zero when never started.
    pub fn position_seconds(&self) -> u64 {
        self.last_position_heard
            .position_in_book_seconds
            .unwrap_or(0)
    }

    /// Runtime in minutes, falling back to the seconds field when the
    /// minutes field is absent or zero.
    pub fn runtime_min(&self) -> u64 {
        match self.product.runtime_length_min {
            Some(min) if min > 0 => min,
            _ => self.product.runtime_length_sec.unwrap_or(0) / 60,
        }
    }

    /// True when the upstream position status marks the book finished.
    pub fn is_finished(&self) -> bool {
        self.last_position_heard.status.as_deref() == Some("Finished")
    }
}

/// Percentage listened, truncated and capped at 100. A zero runtime always
/// yields zero.
pub fn percent_complete(position_seconds: u64, runtime_min: u64) -> u64 {
    if runtime_min == 0 {
        return 0;
    }
    let percent = (position_seconds as f64 / (runtime_min as f64 * 60.0) * 100.0) as u64;
    percent.min(100)
}

/// Flattens an upstream library item into the outward book shape.
pub fn shape_book(item: &RawLibraryItem) -> Book {
    let runtime_min = item.runtime_min();
    let position_seconds = item.position_seconds();

    Book {
        asin: item.asin.clone(),
        title: item
            .product
            .title
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        authors: item.product.authors.iter().map(|a| a.name.clone()).collect(),
        narrators: item
            .product
            .narrators
            .iter()
            .map(|n| n.name.clone())
            .collect(),
        runtime_length_min: runtime_min,
        cover_url: item
            .product
            .product_images
            .get("500")
            .cloned()
            .unwrap_or_default(),
        release_date: item.product.release_date.clone(),
        percent_complete: percent_complete(position_seconds, runtime_min),
        position_seconds,
        is_finished: item.is_finished(),
        isbn: item.product.isbn.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> RawLibraryItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_percent_complete_truncates() {
        // 3000 s into a 600 min book is 8.33%, reported as 8.
        assert_eq!(percent_complete(3000, 600), 8);
    }

    #[test]
    fn test_percent_complete_caps_at_100() {
        assert_eq!(percent_complete(999_999, 10), 100);
    }

    #[test]
    fn test_percent_complete_zero_runtime() {
        assert_eq!(percent_complete(3600, 0), 0);
    }

    #[test]
    fn test_runtime_falls_back_to_seconds() {
        let item = item(r#"{"product":{"runtime_length_sec":7521}}"#);
        assert_eq!(item.runtime_min(), 125);

        let item = serde_json::from_str::<RawLibraryItem>(
            r#"{"product":{"runtime_length_min":0,"runtime_length_sec":90}}"#,
        )
        .unwrap();
        assert_eq!(item.runtime_min(), 1);
    }

    #[test]
    fn test_shape_book_full() {
        let item = item(
            r#"{
                "asin": "B001234567",
                "product": {
                    "title": "Project Hail Mary",
                    "authors": [{"name": "Andy Weir"}],
                    "narrators": [{"name": "Ray Porter"}],
                    "runtime_length_min": 970,
                    "product_images": {"500": "https://img.example/500.jpg"},
                    "isbn": "9780593135204",
                    "release_date": "2021-05-04"
                },
                "last_position_heard": {
                    "position_in_book_seconds": 29100,
                    "status": "InProgress"
                }
            }"#,
        );

        let book = shape_book(&item);
        assert_eq!(book.asin.as_deref(), Some("B001234567"));
        assert_eq!(book.title, "Project Hail Mary");
        assert_eq!(book.authors, vec!["Andy Weir"]);
        assert_eq!(book.narrators, vec!["Ray Porter"]);
        assert_eq!(book.cover_url, "https://img.example/500.jpg");
        assert_eq!(book.position_seconds, 29100);
        assert_eq!(book.percent_complete, 50);
        assert!(!book.is_finished);
    }

    #[test]
    fn test_shape_book_sparse_item() {
        let book = shape_book(&item(r#"{"asin":"B0"}"#));
        assert_eq!(book.title, "Unknown");
        assert!(book.authors.is_empty());
        assert_eq!(book.runtime_length_min, 0);
        assert_eq!(book.cover_url, "");
        assert_eq!(book.percent_complete, 0);
        assert!(!book.is_finished);
        assert_eq!(book.isbn, None);
    }

    #[test]
    fn test_finished_status() {
        let item = item(r#"{"last_position_heard":{"status":"Finished"}}"#);
        assert!(shape_book(&item).is_finished);
    }
}
