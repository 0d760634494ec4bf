//! Axum extractors for request parameters whose rejections are JSON [ElectionError]s
//!
//! Unlike axum's `Query`, parameters may be repeated (`?parties=A&parties=B`) and every value is
//! kept.

use crate::error::ElectionError;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Decoded query parameters in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Decode a raw `application/x-www-form-urlencoded` query string.
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        QueryParams(pairs)
    }

    /// Every value of a parameter, in request order.
    pub fn get_all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// The first value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Types that can be built from query parameters.
pub trait FromQueryParams: Sized {
    fn from_query_params(params: &QueryParams) -> Result<Self, ElectionError>;
}

/// An axum extractor that builds a [FromQueryParams] type from the request's query string and
/// validates it using the validator crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: FromQueryParams + Validate,
    S: Send + Sync,
{
    type Rejection = ElectionError;

    /// Extract a `ValidatedQuery` from request parts.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let params = QueryParams::parse(parts.uri.query());
        let value = T::from_query_params(&params)?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

/// An axum extractor for path parameters.
///
/// Behaves like [axum::extract::Path] but rejects malformed parameters, such as invalid UTF-8,
/// with [ElectionError::InvalidInput].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ElectionError;

    /// Extract a `ValidatedPath` from request parts.
    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ElectionError::InvalidInput(rejection.to_string()))?;
        Ok(ValidatedPath(value))
    }
}
