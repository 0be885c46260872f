#![recursion_limit = "512"]
#[macro_use]
pub extern crate strum_macros;
#[macro_use]
pub extern crate lazy_static;
#[macro_use]
pub extern crate diesel;
pub extern crate actix;
pub extern crate actix_web;
pub extern crate bcrypt;
pub extern crate chrono;
pub extern crate jsonwebtoken;
extern crate log;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate strum;

pub mod api;
pub mod db;
pub mod rate_limit;
pub mod routes;
pub mod schema;
pub mod settings;
pub mod websocket;

use actix_web::dev::ConnectionInfo;
use chrono::NaiveDateTime;
use rand::Rng;
use regex::Regex;

pub type DbPool = diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<diesel::PgConnection>>;
pub type ConnectionId = usize;
pub type PostId = i32;
pub type GroupId = i32;
pub type UserId = i32;
pub type IPAddr = String;

#[derive(Debug)]
pub struct RantifyError {
  pub inner: anyhow::Error,
}

impl<T> From<T> for RantifyError
where
  T: Into<anyhow::Error>,
{
  fn from(t: T) -> Self {
    RantifyError { inner: t.into() }
  }
}

impl std::fmt::Display for RantifyError {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    self.inner.fmt(f)
  }
}

impl actix_web::error::ResponseError for RantifyError {}

pub fn naive_now() -> NaiveDateTime {
  chrono::prelude::Utc::now().naive_utc()
}

lazy_static! {
  static ref VALID_USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_]{2,20}$").expect("compile regex");
}

pub fn is_valid_username(name: &str) -> bool {
  VALID_USERNAME_REGEX.is_match(name)
}

/// Six digit one-time code, stored on the user until its owner verifies.
pub fn generate_verification_code() -> String {
  let mut rng = rand::thread_rng();
  format!("{:06}", rng.gen_range(0, 1_000_000))
}

pub fn get_ip(conn_info: &ConnectionInfo) -> String {
  conn_info
    .realip_remote_addr()
    .unwrap_or("127.0.0.1:12345")
    .split(':')
    .next()
    .unwrap_or("127.0.0.1")
    .to_string()
}

pub async fn blocking<F, T>(pool: &DbPool, f: F) -> Result<T, RantifyError>
where
  F: FnOnce(&diesel::PgConnection) -> T + Send + 'static,
  T: Send + 'static,
{
  let pool = pool.clone();
  let res = actix_web::web::block(move || {
    let conn = pool.get()?;
    let res = (f)(&conn);
    Ok(res) as Result<_, RantifyError>
  })
  .await?;

  Ok(res)
}

#[cfg(test)]
mod tests {
  use crate::{generate_verification_code, is_valid_username};

  #[test]
  fn test_valid_username() {
    assert!(is_valid_username("gary"));
    assert!(is_valid_username("gary_jones"));
    assert!(is_valid_username("Gary1234"));
    assert!(!is_valid_username("g"));
    assert!(!is_valid_username(""));
    assert!(!is_valid_username("gary jones"));
    assert!(!is_valid_username("gary@example.com"));
    assert!(!is_valid_username("a_name_way_over_twenty_chars"));
  }

  #[test]
  fn test_verification_code() {
    for _ in 0..100 {
      let code = generate_verification_code();
      assert_eq!(6, code.len());
      assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
  }
}
