use crate::settings::Settings;
use diesel::r2d2::*;
use diesel::result::Error;
use diesel::*;
use serde::{Deserialize, Serialize};

pub mod category;
pub mod comment;
pub mod comment_view;
pub mod group;
pub mod message;
pub mod post;
pub mod post_view;
pub mod user;

pub trait Crud<T> {
  fn create(conn: &PgConnection, form: &T) -> Result<Self, Error>
  where
    Self: Sized;
  fn read(conn: &PgConnection, id: i32) -> Result<Self, Error>
  where
    Self: Sized;
  fn update(conn: &PgConnection, id: i32, form: &T) -> Result<Self, Error>
  where
    Self: Sized;
  fn delete(conn: &PgConnection, id: i32) -> Result<usize, Error>
  where
    Self: Sized;
}

pub trait Voteable<T> {
  fn vote(conn: &PgConnection, form: &T) -> Result<Self, Error>
  where
    Self: Sized;
  fn remove(conn: &PgConnection, form: &T) -> Result<usize, Error>
  where
    Self: Sized;
}

// Membership is append-only, there is no leave.
pub trait Joinable<T> {
  fn join(conn: &PgConnection, form: &T) -> Result<Self, Error>
  where
    Self: Sized;
}

lazy_static! {
  static ref PG_POOL: Pool<ConnectionManager<PgConnection>> = {
    let db_url = Settings::get().get_database_url();
    let manager = ConnectionManager::<PgConnection>::new(&db_url);
    Pool::builder()
      .max_size(Settings::get().database.pool_size)
      .build(manager)
      .unwrap_or_else(|_| panic!("Error connecting to {}", db_url))
  };
}

pub fn establish_connection() -> PooledConnection<ConnectionManager<PgConnection>> {
  PG_POOL.get().unwrap()
}

#[derive(EnumString, ToString, Debug, Serialize, Deserialize, Clone, Copy)]
#[strum(serialize_all = "lowercase")]
pub enum SortType {
  Recent,
  Trending,
}

const DEFAULT_FETCH_LIMIT: i64 = 20;
const MAX_FETCH_LIMIT: i64 = 100;

pub fn limit_and_offset(page: Option<i64>, limit: Option<i64>) -> (i64, i64, i64) {
  let page = page.unwrap_or(1).max(1);
  let limit = limit
    .unwrap_or(DEFAULT_FETCH_LIMIT)
    .max(1)
    .min(MAX_FETCH_LIMIT);
  let offset = limit * (page - 1);
  (page, limit, offset)
}

#[cfg(test)]
mod tests {
  use super::{limit_and_offset, SortType};
  use std::str::FromStr;

  #[test]
  fn test_limit_and_offset() {
    assert_eq!((1, 20, 0), limit_and_offset(None, None));
    assert_eq!((3, 10, 20), limit_and_offset(Some(3), Some(10)));
    // out of range values are clamped, not rejected
    assert_eq!((1, 20, 0), limit_and_offset(Some(0), None));
    assert_eq!((1, 20, 0), limit_and_offset(Some(-5), None));
    assert_eq!((1, 1, 0), limit_and_offset(None, Some(0)));
    assert_eq!((1, 100, 0), limit_and_offset(None, Some(500)));
  }

  #[test]
  fn test_sort_type_from_str() {
    assert!(matches!(SortType::from_str("recent"), Ok(SortType::Recent)));
    assert!(matches!(
      SortType::from_str("trending"),
      Ok(SortType::Trending)
    ));
    assert!(SortType::from_str("hot").is_err());
  }
}
