//! Helpers shared by the catalog modules.

use catalog_http::error::AppError;
use uuid::Uuid;

/// Normalize a book id taken from a path segment.
///
/// Ids are UUIDs; anything else is rejected with a 400.
pub fn parse_book_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| AppError::bad_request(format!("'{raw}' is not a valid book id")))
}

/// Normalize a wishlist owner taken from a path segment.
///
/// Owners are email addresses: a non-empty local part and domain around a
/// single `@`. Anything else, including static segments such as `health`,
/// is rejected with a 400.
pub fn parse_user_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email.to_string())
        }
        _ => Err(AppError::bad_request(format!(
            "'{raw}' is not a valid email address"
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn accepts_uuids_in_any_case() {
        let id = parse_book_id("0190A1B2-C3D4-7E5F-8A9B-0C1D2E3F4A5B").unwrap();
        assert_eq!(id, "0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b");
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_book_id("not-an-id").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn emails_need_both_sides_of_the_at() {
        assert_eq!(parse_user_email(" a@x.com ").unwrap(), "a@x.com");
        for raw in ["health", "@x.com", "a@", "a@b@c", ""] {
            let err = parse_user_email(raw).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{raw}");
        }
    }
}
