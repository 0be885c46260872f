#[macro_use]
extern crate diesel_migrations;

use actix::prelude::*;
use actix_web::*;
use diesel::{
  r2d2::{ConnectionManager, Pool},
  PgConnection,
};
use log::info;
use rantify_server::{
  blocking,
  rate_limit::{rate_limiter::RateLimiter, RateLimit},
  routes,
  settings::Settings,
  websocket::server::ChatServer,
  RantifyError,
};
use std::sync::Arc;
use tokio::sync::Mutex;

embed_migrations!();

#[actix_rt::main]
async fn main() -> Result<(), RantifyError> {
  env_logger::init();
  let settings = Settings::get();

  // Set up the r2d2 connection pool
  let db_url = settings.get_database_url();
  let manager = ConnectionManager::<PgConnection>::new(&db_url);
  let pool = Pool::builder()
    .max_size(settings.database.pool_size)
    .build(manager)
    .unwrap_or_else(|_| panic!("Error connecting to {}", db_url));

  // Run the migrations from code
  blocking(&pool, move |conn| {
    embedded_migrations::run(conn)?;
    Ok(()) as Result<(), RantifyError>
  })
  .await??;

  // Set up the rate limiter
  let rate_limiter = RateLimit(Arc::new(Mutex::new(RateLimiter::default())));

  // There is exactly one relay, every session talks to it
  let chat_server = ChatServer::startup().start();

  info!(
    "Starting http server at {}:{}",
    settings.bind, settings.port
  );

  // Create Http server with websocket support
  HttpServer::new(move || {
    let rate_limiter = rate_limiter.clone();
    App::new()
      .wrap(middleware::Logger::default())
      .data(pool.clone())
      .data(chat_server.to_owned())
      // The routes
      .configure(|cfg| routes::api::config(cfg, &rate_limiter))
  })
  .bind((settings.bind, settings.port))?
  .run()
  .await?;

  Ok(())
}
