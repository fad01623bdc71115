// main.rs - entry point to run the API server

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing::subscriber::set_global_default;
use tracing_actix_web::TracingLogger;
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

mod auth;
mod config;
mod dto;
mod error;
mod routes;
mod services;
mod upload;

use config::{parse_duration, TokenConfig, TokenSettings, UploadConfig};
use database::{
    auth::RefreshTokenRepository, codes::CodeRepository, create_indexes, users::UsersRepository,
    HashService,
};
use services::{AuthService, UsersService};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Environment {
    Local,
    Staging,
    Production,
}

#[derive(Parser, Debug)]
struct Args {
    /// Database URI and Name
    #[arg(
        long,
        env = "DATABASE_URI",
        default_value = "mongodb://localhost:27017"
    )]
    database_uri: String,
    #[arg(long, env = "DATABASE_NAME", default_value = "accounts")]
    database_name: String,
    /// Environment
    #[arg(long, env = "ENVIRONMENT", value_enum, default_value = "local")]
    environment: Environment,
    /// Origin allowed by CORS outside of local
    #[arg(long, env = "ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,
    /// Token secrets and lifetimes (seconds, or with an s/m/h/d suffix)
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_token_secret: String,
    #[arg(long, env = "ACCESS_TOKEN_EXP", default_value = "15m", value_parser = parse_duration)]
    access_token_exp: i64,
    #[arg(long, env = "REFRESH_TOKEN_SECRET", hide_env_values = true)]
    refresh_token_secret: String,
    #[arg(long, env = "REFRESH_TOKEN_EXP", default_value = "7d", value_parser = parse_duration)]
    refresh_token_exp: i64,
    /// Image uploads
    #[arg(long, env = "UPLOAD_DIR", default_value = "./uploads")]
    upload_dir: PathBuf,
    #[arg(long, env = "MAX_IMAGE_BYTES", default_value_t = 5 * 1024 * 1024)]
    max_image_bytes: usize,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file if local
    dotenv().ok();

    // Parse CLI args, using ENV vars if not provided
    let args = Args::parse();

    // Setup tracing for our API
    // Adds log tracer as the default tracer for the log crate
    LogTracer::init().expect("Failed to set log tracer");
    // Set log level based on env variable
    let env_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    let fmt_layer = fmt::layer().with_target(false);
    let subscriber = Registry::default().with(env_layer).with(fmt_layer);
    set_global_default(subscriber).expect("Failed to set global default subscriber");

    if args.access_token_secret == args.refresh_token_secret {
        panic!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
    }
    // Local development accepts any origin
    let allowed_origin = match args.environment {
        Environment::Local => None,
        Environment::Staging | Environment::Production => Some(
            args.allowed_origin
                .clone()
                .expect("ALLOWED_ORIGIN is required outside of local"),
        ),
    };

    // Create database client
    let client = mongodb::Client::with_uri_str(&args.database_uri)
        .await
        .expect("Failed to connect to database.");

    // Unique and TTL indexes
    create_indexes(&client, &args.database_name)
        .await
        .expect("Failed to create database indexes.");

    let database = client.database(&args.database_name);
    let users = Arc::new(UsersRepository::new(&database));
    let codes = Arc::new(CodeRepository::new(&database));
    let refresh_tokens = Arc::new(RefreshTokenRepository::new(&database));
    let hash = HashService::default();

    let tokens = TokenConfig {
        access: TokenSettings {
            secret: args.access_token_secret.clone(),
            validity_in_seconds: args.access_token_exp,
        },
        refresh: TokenSettings {
            secret: args.refresh_token_secret.clone(),
            validity_in_seconds: args.refresh_token_exp,
        },
    };
    let uploads = UploadConfig {
        dir: args.upload_dir.clone(),
        max_bytes: args.max_image_bytes,
    };

    let auth_service = web::Data::new(AuthService::new(
        users.clone(),
        codes,
        refresh_tokens,
        hash.clone(),
        tokens.clone(),
    ));
    let users_service = web::Data::new(UsersService::new(users, hash));
    let tokens = web::Data::new(tokens);
    let uploads = web::Data::new(uploads);

    // Set default JSON config
    let json_cfg = web::JsonConfig::default();

    // Create and run http server
    let binding = match args.environment {
        Environment::Local => ("127.0.0.1", 8081),
        Environment::Staging | Environment::Production => ("0.0.0.0", 10000),
    };
    info!(
        "Starting {:?} server on {}:{}",
        args.environment, binding.0, binding.1
    );

    HttpServer::new(move || {
        let cors = match &allowed_origin {
            None => Cors::permissive(),
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST", "PUT"])
                .allow_any_header()
                .supports_credentials()
                .max_age(3600),
        };
        App::new()
            .app_data(auth_service.clone())
            .app_data(users_service.clone())
            .app_data(tokens.clone())
            .app_data(uploads.clone())
            .app_data(json_cfg.clone())
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(routes::configure)
    })
    .bind(binding)?
    .run()
    .await
}
