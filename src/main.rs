use diesel::r2d2::{ConnectionManager, Pool};
use touchline::{config::create_app, state::DbPool};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "touchline.sqlite".to_string());

    let pool: DbPool = Pool::builder()
        .max_size(if db_url == ":memory:" { 1 } else { 10 })
        .build(ConnectionManager::new(&db_url))
        .expect("failed to build connection pool");

    let app = create_app(pool);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind");

    tracing::info!("listening on port {port}");

    axum::serve(listener, app).await.unwrap();
}
