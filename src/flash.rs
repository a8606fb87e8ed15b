//! One-shot user-facing messages.
//!
//! A form submission that succeeds (or fails in a user-recoverable way) answers
//! `303 See Other` towards the next page, with the message in a small JSON body.

use actix_web::cookie::Cookie;
use actix_web::{http::header, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub message: String,
    pub category: FlashCategory,
    pub redirect: String,
}

impl Flash {
    pub fn new(category: FlashCategory, message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            category,
            redirect: redirect.into(),
        }
    }

    pub fn success(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::new(FlashCategory::Success, message, redirect)
    }

    pub fn info(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::new(FlashCategory::Info, message, redirect)
    }

    pub fn warning(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::new(FlashCategory::Warning, message, redirect)
    }

    pub fn danger(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self::new(FlashCategory::Danger, message, redirect)
    }

    /// Answers in place with `status`, for a form that has to be filled in again.
    pub fn respond_with_status(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }

    pub fn respond(self) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, self.redirect.clone()))
            .json(self)
    }

    pub fn respond_with_cookie(self, cookie: Cookie<'static>) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, self.redirect.clone()))
            .cookie(cookie)
            .json(self)
    }
}

/// A bare redirect, for visitors bounced away from a page without a message.
pub fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_string()))
        .finish()
}
