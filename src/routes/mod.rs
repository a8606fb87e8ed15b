pub mod about;
pub mod account;
pub mod comments;
pub mod health;
pub mod posts;
pub mod reset;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(about::about)
        .service(posts::home)
        .service(posts::create_post_form)
        .service(posts::create_post)
        .service(posts::show_post)
        .service(posts::update_post_form)
        .service(posts::update_post)
        .service(posts::delete_post)
        .service(posts::category_posts)
        .service(posts::search)
        .service(comments::create_comment)
        .service(comments::delete_comment)
        .service(users::register_form)
        .service(users::register)
        .service(users::login_form)
        .service(users::login)
        .service(users::logout)
        .service(account::account)
        .service(account::update_account_form)
        .service(account::update_account)
        .service(account::update_activity)
        .service(reset::reset_request_form)
        .service(reset::reset_request)
        .service(reset::reset_token_form)
        .service(reset::reset_token);
}
