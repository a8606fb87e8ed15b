use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// The id of the logged-in user, taken from the session claims.
///
/// `SessionMiddleware` decodes the `session` cookie and leaves the `Claims` in the
/// request extensions; this extractor fails with `AppError::Unauthorized` when they
/// are missing. Use `Option<AuthenticatedUserId>` on routes open to anonymous visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub i32);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().map(|claims| claims.sub) {
            Some(user_id) => ready(Ok(AuthenticatedUserId(user_id))),
            None => {
                let err = AppError::Unauthorized("Please log in to access this page.".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::TokenPurpose;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    fn session_claims(sub: i32) -> Claims {
        Claims {
            sub,
            exp: usize::MAX,
            purpose: TokenPurpose::Session,
        }
    }

    #[actix_rt::test]
    async fn test_authenticated_user_id_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(session_claims(123));

        let mut payload = Payload::None;
        let extracted_id = AuthenticatedUserId::from_request(&req, &mut payload).await;
        assert_eq!(extracted_id.unwrap(), AuthenticatedUserId(123));
    }

    #[actix_rt::test]
    async fn test_authenticated_user_id_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let extracted_id_result = AuthenticatedUserId::from_request(&req, &mut payload).await;
        assert!(extracted_id_result.is_err());

        let response = extracted_id_result.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_optional_extractor_is_none_for_visitors() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let maybe_user = Option::<AuthenticatedUserId>::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert!(maybe_user.is_none());
    }
}
