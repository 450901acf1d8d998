//! Request extractors that run `validator` rules and reject with 400 `{error}`.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::response::ApiError;

/// Joins every field message, sorted by field name, with `", "`.
pub fn join_messages(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON body that passed validation.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ApiError::bad_request(join_messages(&errors)))?;
        Ok(Self(value))
    }
}

/// Query string that passed validation.
#[derive(Debug)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ApiError::bad_request(join_messages(&errors)))?;
        Ok(Self(value))
    }
}

/// Path parameters, rejecting malformed ids with 400 `{error}`.
#[derive(Debug)]
pub struct IdPath<T>(pub T);

impl<T, S> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct Holder {
        #[validate(required(message = "Name is required"))]
        name: Option<String>,
        #[validate(required(message = "Account Number is required"))]
        account_number: Option<String>,
    }

    #[test]
    fn test_messages_joined_in_field_order() {
        let errors = Holder {
            name: None,
            account_number: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            join_messages(&errors),
            "Account Number is required, Name is required"
        );
    }
}
