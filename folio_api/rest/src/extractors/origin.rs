use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::ORIGIN, request::Parts},
};

/// Value of the `Origin` header, `None` if the header is missing.
pub struct Origin(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Origin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(ORIGIN) else {
            return Ok(Self(None));
        };

        let value = String::from_utf8_lossy(header.as_bytes()).into_owned();

        Ok(Self(Some(value)))
    }
}
