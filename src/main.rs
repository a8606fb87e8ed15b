use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use log::info;
use sqlx::postgres::PgPoolOptions;
use std::io;

use quillpress::auth::SessionMiddleware;
use quillpress::config::Config;
use quillpress::mail::Mailer;
use quillpress::models::user::IMAGE_URL_PREFIX;
use quillpress::pictures::ensure_upload_dir;
use quillpress::routes;

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(startup_error)?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(startup_error)?;

    ensure_upload_dir(&config.upload_dir)?;
    let mailer = Mailer::new(&config.mail, &config.public_url).map_err(startup_error)?;

    let bind_addr = (config.server_host.clone(), config.server_port);
    info!("Starting quillpress server at {}", config.server_url());

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);
    let mailer = web::Data::new(mailer);

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(pool.clone())
            .app_data(mailer.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .wrap(SessionMiddleware)
            .service(Files::new(IMAGE_URL_PREFIX, &config.upload_dir))
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
