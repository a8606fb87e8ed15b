#![doc = "The `quillpress` library crate."]
#![doc = ""]
#![doc = "This crate contains the blog's domain models, session authentication, password-reset"]
#![doc = "mail delivery, profile picture storage, routing configuration and error handling."]
#![doc = "It is used by the main binary (`main.rs`) to construct and run the application."]

pub mod auth;
pub mod config;
pub mod error;
pub mod flash;
pub mod mail;
pub mod models;
pub mod pictures;
pub mod routes;

// The app factory lives in main.rs; integration tests assemble the same App inline.
