use actix_web::{get, HttpResponse, Responder};
use serde_json::json;

#[get("/about")]
pub async fn about() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "title": "About",
        "description": "quillpress is a small multi-user blog: write posts, file them under categories and discuss them in the comments."
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_about_page() {
        let app = test::init_service(actix_web::App::new().service(about)).await;

        let req = test::TestRequest::get().uri("/about").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["title"], "About");
    }
}
