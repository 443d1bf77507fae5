use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use exercia::{api, config::ServerConfig, database::MongoDB, middleware::RequestMetrics};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;

    log::info!("🚀 Starting Exercia Service...");

    let db = MongoDB::new(&config.database_url).await.map_err(|e| {
        log::error!("❌ Failed to connect to MongoDB: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    let db_data = web::Data::new(db);

    log::info!("✅ MongoDB connected successfully");
    log::info!("🌐 Server starting on {}", config.bind_addr());
    log::info!("📚 Swagger UI available at: http://{}/swagger-ui/", config.bind_addr());

    HttpServer::new(move || {
        // The mobile app calls from arbitrary LAN addresses
        let cors = Cors::permissive();

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .wrap(cors)
            .wrap(RequestMetrics)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::configure)
    })
    .bind(config.bind_addr())?
    .run()
    .await
}
