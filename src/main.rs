mod chat;
mod completion;
mod config;
mod health;
mod meals;
mod middleware;
mod models;
mod prompts;
mod routes;
mod types;

pub use config::AppConfig;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use completion::CompletionClient;
use middleware::auth::Authentication;

pub struct AppState {
    pub pool: PgPool,
    pub completion: CompletionClient,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app_config = Arc::new(AppConfig::from_env()?);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&app_config.database_url)
        .await
        .context("failed to connect to Postgres")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let app_state = Arc::new(AppState {
        pool,
        completion: CompletionClient::new(&app_config),
    });

    let bind_addr = (app_config.host.clone(), app_config.port);
    info!("Starting server on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Authentication {
                app_config: app_config.clone(),
            })
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(app_config.clone()))
            .service(
                web::scope("/auth")
                    .service(routes::auth::register)
                    .service(routes::auth::get_user),
            )
            .service(web::scope("/chat").service(routes::chat::send_chat))
            .service(
                web::scope("/conversations")
                    .service(routes::conversations::list_conversations)
                    .service(routes::conversations::clear_conversations)
                    .service(routes::conversations::get_conversation)
                    .service(routes::conversations::rename_conversation)
                    .service(routes::conversations::pin_conversation)
                    .service(routes::conversations::delete_conversation),
            )
            .service(
                web::scope("/assessments")
                    .service(routes::assessment::create_assessment)
                    .service(routes::assessment::list_assessments)
                    .service(routes::assessment::get_assessment),
            )
            .service(
                web::scope("/profile")
                    .service(routes::profile::get_profile)
                    .service(routes::profile::update_profile),
            )
            .service(
                web::scope("/progress")
                    .service(routes::tracking::log_progress)
                    .service(routes::tracking::progress_history),
            )
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
