use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{verify_token, TokenPurpose};
use crate::config::Config;

/// Name of the cookie that carries the signed session token.
pub const SESSION_COOKIE: &str = "session";

/// Resolves the visitor's identity on every request.
///
/// The session token is read from the `session` cookie, falling back to an
/// `Authorization: Bearer` header. Valid claims are stored in the request
/// extensions for `AuthenticatedUserId`. Missing or invalid tokens leave the
/// request anonymous; rejecting is the extractor's job, not this middleware's.
pub struct SessionMiddleware;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddlewareService { service }))
    }
}

pub struct SessionMiddlewareService<S> {
    service: S,
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl<S, B> Service<ServiceRequest> for SessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = req
            .app_data::<web::Data<Config>>()
            .map(|config| config.secret_key.clone());

        if let (Some(token), Some(secret)) = (session_token(&req), secret) {
            match verify_token(&token, TokenPurpose::Session, &secret) {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                }
                Err(err) => {
                    log::debug!("ignoring session for {}: {}", req.path(), err);
                }
            }
        }

        Box::pin(self.service.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{generate_token, Claims};
    use actix_web::cookie::Cookie;
    use actix_web::{test, App, HttpRequest, HttpResponse};

    fn test_config() -> Config {
        Config::new("postgres://localhost/unused", "middleware-secret")
    }

    async fn whoami(req: HttpRequest) -> HttpResponse {
        match req.extensions().get::<Claims>() {
            Some(claims) => HttpResponse::Ok().body(claims.sub.to_string()),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn call_whoami(request: test::TestRequest) -> String {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_config()))
                .wrap(SessionMiddleware)
                .route("/whoami", web::get().to(whoami)),
        )
        .await;
        let resp = test::call_service(&app, request.uri("/whoami").to_request()).await;
        assert!(resp.status().is_success());
        String::from_utf8(test::read_body(resp).await.to_vec()).unwrap()
    }

    #[actix_rt::test]
    async fn test_session_cookie_sets_claims() {
        let token = generate_token(7, TokenPurpose::Session, 60, "middleware-secret").unwrap();
        let body = call_whoami(test::TestRequest::get().cookie(Cookie::new(SESSION_COOKIE, token))).await;
        assert_eq!(body, "7");
    }

    #[actix_rt::test]
    async fn test_bearer_header_sets_claims() {
        let token = generate_token(8, TokenPurpose::Session, 60, "middleware-secret").unwrap();
        let body = call_whoami(
            test::TestRequest::get()
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token))),
        )
        .await;
        assert_eq!(body, "8");
    }

    #[actix_rt::test]
    async fn test_forged_or_misused_tokens_stay_anonymous() {
        let forged = generate_token(9, TokenPurpose::Session, 60, "attacker-secret").unwrap();
        let body = call_whoami(test::TestRequest::get().cookie(Cookie::new(SESSION_COOKIE, forged))).await;
        assert_eq!(body, "anonymous");

        let reset = generate_token(9, TokenPurpose::PasswordReset, 60, "middleware-secret").unwrap();
        let body = call_whoami(test::TestRequest::get().cookie(Cookie::new(SESSION_COOKIE, reset))).await;
        assert_eq!(body, "anonymous");

        let body = call_whoami(test::TestRequest::get()).await;
        assert_eq!(body, "anonymous");
    }
}
