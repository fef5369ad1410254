//! Entry point of the greeter server.
use dotenvy::dotenv;

use profile_upload::{greeter, models::config::GreeterConfig};

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match GreeterConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Error loading greeter config: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = greeter::run(config).await {
        log::error!("Error running greeter: {}", err);
        std::process::exit(1);
    }
}
