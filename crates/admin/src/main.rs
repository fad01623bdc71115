// admin/main.rs - scripts for initializing the database and managing accounts

use clap::{Parser, Subcommand};
use database::{
    codes::{CodeRepository, CodeStore, VerificationCodeModel},
    create_indexes,
    users::{UserFilter, UserModel, UserStore, UsersRepository},
    DatabaseError, HashService,
};
use dotenvy::dotenv;
use mongodb::Client;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "admin")]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommands,
    #[arg(short, long, env = "ENVIRONMENT", default_value = "local")]
    environment: String,
    #[arg(
        long,
        env = "DATABASE_URI",
        default_value = "mongodb://localhost:27017"
    )]
    database_uri: String,
    #[arg(long, env = "DATABASE_NAME", default_value = "accounts")]
    database_name: String,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    #[clap(name = "init-db")]
    InitDatabase,
    #[clap(name = "add-admin")]
    AddAdmin {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(long, default_value = "Admin")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Issues a verification code so an email can sign up or reset its password
    #[clap(name = "add-code")]
    AddCode {
        #[arg(short, long)]
        email: String,
        // Random six digits when omitted
        #[arg(long)]
        otp: Option<String>,
        #[arg(long, default_value_t = 600)]
        ttl: u64,
    },
    #[clap(name = "list-admins")]
    ListAdmins,
}

#[derive(Debug, Deserialize)]
struct AdminSeed {
    email: String,
    password: String,
    first_name: String,
    #[serde(default)]
    last_name: String,
}

// Admins are nested under an environment
// local -> [AdminSeed, ...]
#[derive(Debug, Deserialize)]
struct Config {
    admins: HashMap<String, Vec<AdminSeed>>,
}

fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

async fn insert_admin(
    users: &UsersRepository,
    hash: &HashService,
    email: &str,
    password: &str,
    first_name: &str,
    last_name: &str,
) -> Result<UserModel, DatabaseError> {
    let password = hash
        .hash_data(password)
        .await
        .expect("Failed to hash admin password.");
    let mut user = UserModel::new(email, password, first_name, last_name);
    user.is_admin = true;

    users.create(user).await
}

#[tokio::main]
async fn main() -> Result<(), String> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse CLI args, using ENV vars if not provided
    let args = Args::parse();

    // Set up tracing and parse args.
    let env_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::fmt()
        .with_env_filter(env_layer)
        .with_target(true)
        .init();

    // Create database client
    let db_client = Client::with_uri_str(args.database_uri)
        .await
        .expect("Failed to connect to database.");
    let database = db_client.database(&args.database_name);
    let users = UsersRepository::new(&database);
    let hash = HashService::default();

    // Perform subcommand logic
    match args.subcommand {
        Subcommands::InitDatabase => {
            // Load the config file
            let config: Config = match std::fs::read_to_string("./crates/admin/config.toml") {
                Ok(config) => toml::from_str(&config).expect("Failed to parse config.toml file."),
                Err(_) => panic!("Failed to read config.toml file."),
            };

            // 1. Drop the database on the provided client
            database.drop(None).await.unwrap();

            // 2. Create the database indexes defined in the database models
            info!("Creating database indexes.");
            create_indexes(&db_client, &args.database_name)
                .await
                .expect("Failed to create database indexes.");

            // Get the admins to seed from the environment config
            let admins = match config.admins.get(&args.environment) {
                Some(admins) => admins,
                None => panic!("No admins found for the environment."),
            };

            for admin in admins {
                info!("Inserting admin into database: {}", admin.email);
                insert_admin(
                    &users,
                    &hash,
                    &admin.email,
                    &admin.password,
                    &admin.first_name,
                    &admin.last_name,
                )
                .await
                .expect("Failed to insert admin into database.");
            }

            info!("Database initialized for {} environment.", args.environment);
        }
        Subcommands::AddAdmin {
            email,
            password,
            first_name,
            last_name,
        } => {
            match insert_admin(&users, &hash, &email, &password, &first_name, &last_name).await {
                Ok(user) => info!("Added admin {} ({}).", user.email, user.id),
                Err(DatabaseError::DuplicateKey) => {
                    warn!("A user with email {} already exists.", email)
                }
                Err(e) => return Err(format!("Failed to insert admin: {e}")),
            }
        }
        Subcommands::AddCode { email, otp, ttl } => {
            let otp = otp.unwrap_or_else(generate_otp);
            let codes = CodeRepository::new(&database);

            let code = VerificationCodeModel::new(&email, &otp, ttl)
                .map_err(|e| format!("Failed to build code: {e}"))?;
            let code = codes
                .insert_code(code)
                .await
                .map_err(|e| format!("Failed to insert code: {e}"))?;
            debug!("Code expires at {}", code.expires_at);

            // Operators hand the code to the user out of band
            println!("{}", code.otp);
            info!("Issued verification code for {} valid for {}s.", email, ttl);
        }
        Subcommands::ListAdmins => {
            let admins = users
                .find_many(&UserFilter::admins())
                .await
                .map_err(|e| format!("Failed to list admins: {e}"))?;

            for admin in &admins {
                println!("{}\t{}\t{} {}", admin.id, admin.email, admin.first_name, admin.last_name);
            }
            info!("Found {} admins.", admins.len());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn admins_are_read_per_environment() {
        let config: Config =
            toml::from_str(include_str!("../config.toml")).expect("config.toml should parse");

        let local = config.admins.get("local").unwrap();
        assert!(!local.is_empty());
        assert!(local.iter().all(|admin| !admin.email.is_empty()));
    }
}
