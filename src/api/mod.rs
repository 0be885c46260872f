use crate::{DbPool, RantifyError};
use thiserror::Error;

pub mod claims;
pub mod comment;
pub mod group;
pub mod message;
pub mod post;
pub mod site;
pub mod user;

#[derive(Error, Debug)]
#[error("{{\"error\":\"{message}\"}}")]
pub struct APIError {
  pub message: String,
}

impl APIError {
  pub fn err(msg: &str) -> Self {
    APIError {
      message: msg.to_string(),
    }
  }
}

pub struct Oper<T> {
  data: T,
}

impl<Data> Oper<Data> {
  pub fn new(data: Data) -> Oper<Data> {
    Oper { data }
  }
}

#[async_trait::async_trait(?Send)]
pub trait Perform {
  type Response: serde::ser::Serialize + Send;

  async fn perform(&self, pool: &DbPool) -> Result<Self::Response, RantifyError>;
}

#[cfg(test)]
mod tests {
  use super::APIError;

  #[test]
  fn test_api_error_shape() {
    let err = APIError::err("not_logged_in");
    assert_eq!("{\"error\":\"not_logged_in\"}", err.to_string());
  }
}
