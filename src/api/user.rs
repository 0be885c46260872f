use crate::{
  api::{claims::Claims, APIError, Oper, Perform},
  blocking,
  db::user::*,
  generate_verification_code,
  is_valid_username,
  naive_now,
  settings::Settings,
  DbPool,
  RantifyError,
};
use bcrypt::verify;
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct Login {
  username: String,
  password: String,
}

#[derive(Serialize, Deserialize)]
pub struct Register {
  pub username: String,
  pub email: Option<String>,
  pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
  pub jwt: String,
}

#[derive(Serialize, Deserialize)]
pub struct VerifyCode {
  pub username: String,
  pub code: String,
}

#[derive(Serialize, Deserialize)]
pub struct VerifyCodeResponse {
  pub verified: bool,
}

#[derive(Serialize, Deserialize)]
pub struct CheckUsername {
  pub username: String,
}

#[derive(Serialize, Deserialize)]
pub struct CheckUsernameResponse {
  pub available: bool,
}

#[derive(Serialize, Deserialize)]
pub struct SaveUserSettings {
  accept_messages: bool,
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct SaveUserSettingsResponse {
  pub accept_messages: bool,
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<Login> {
  type Response = LoginResponse;

  async fn perform(&self, pool: &DbPool) -> Result<LoginResponse, RantifyError> {
    let data: &Login = &self.data;

    let username = data.username.clone();
    let user = match blocking(pool, move |conn| {
      User_::find_by_username(conn, &username)
    })
    .await?
    {
      Ok(user) => user,
      Err(_e) => return Err(APIError::err("couldnt_find_username").into()),
    };

    // Verify the password
    let valid: bool = verify(&data.password, &user.password_encrypted).unwrap_or(false);
    if !valid {
      return Err(APIError::err("password_incorrect").into());
    }

    // Return the jwt
    Ok(LoginResponse {
      jwt: Claims::jwt(&user, Settings::get().hostname)?,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<Register> {
  type Response = LoginResponse;

  async fn perform(&self, pool: &DbPool) -> Result<LoginResponse, RantifyError> {
    let data: &Register = &self.data;

    if !is_valid_username(&data.username) {
      return Err(APIError::err("invalid_username").into());
    }

    if data.password.len() < 6 {
      return Err(APIError::err("invalid_password").into());
    }

    let username = data.username.clone();
    let existing = blocking(pool, move |conn| {
      User_::find_by_username(conn, &username)
    })
    .await?;
    if existing.is_ok() {
      return Err(APIError::err("username_taken").into());
    }

    // The code is stored unverified until VerifyCode confirms it
    let user_form = UserForm {
      name: data.username.to_owned(),
      email: data.email.to_owned(),
      password_encrypted: data.password.to_owned(),
      verified: false,
      verify_code: Some(generate_verification_code()),
      verify_code_expiry: Some(naive_now() + Duration::hours(1)),
      accept_messages: true,
      updated: None,
    };

    let inserted_user = match blocking(pool, move |conn| User_::register(conn, &user_form)).await? {
      Ok(user) => user,
      // a racing insert can still trip the unique constraint
      Err(_e) => return Err(APIError::err("username_taken").into()),
    };

    Ok(LoginResponse {
      jwt: Claims::jwt(&inserted_user, Settings::get().hostname)?,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<VerifyCode> {
  type Response = VerifyCodeResponse;

  async fn perform(&self, pool: &DbPool) -> Result<VerifyCodeResponse, RantifyError> {
    let data: &VerifyCode = &self.data;

    let username = data.username.clone();
    let user = match blocking(pool, move |conn| {
      User_::find_by_username(conn, &username)
    })
    .await?
    {
      Ok(user) => user,
      Err(_e) => return Err(APIError::err("couldnt_find_user").into()),
    };

    if user.verified {
      return Ok(VerifyCodeResponse { verified: true });
    }

    // An expired code is reported as expired even when it also mismatches
    match user.verify_code_expiry {
      Some(expiry) if expiry < naive_now() => {
        return Err(APIError::err("verify_code_expired").into());
      }
      Some(_) => {}
      None => return Err(APIError::err("incorrect_verify_code").into()),
    }

    if user.verify_code.as_deref() != Some(data.code.as_str()) {
      return Err(APIError::err("incorrect_verify_code").into());
    }

    blocking(pool, move |conn| User_::set_verified(conn, user.id)).await??;

    Ok(VerifyCodeResponse { verified: true })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<CheckUsername> {
  type Response = CheckUsernameResponse;

  async fn perform(&self, pool: &DbPool) -> Result<CheckUsernameResponse, RantifyError> {
    let data: &CheckUsername = &self.data;

    if !is_valid_username(&data.username) {
      return Err(APIError::err("invalid_username").into());
    }

    let username = data.username.clone();
    let existing = blocking(pool, move |conn| {
      User_::find_by_username(conn, &username)
    })
    .await?;

    Ok(CheckUsernameResponse {
      available: existing.is_err(),
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<SaveUserSettings> {
  type Response = SaveUserSettingsResponse;

  async fn perform(&self, pool: &DbPool) -> Result<SaveUserSettingsResponse, RantifyError> {
    let data: &SaveUserSettings = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    let user_id = claims.id;
    let accept = data.accept_messages;
    let updated_user = blocking(pool, move |conn| {
      User_::update_accept_messages(conn, user_id, accept)
    })
    .await?;

    match updated_user {
      Ok(user) => Ok(SaveUserSettingsResponse {
        accept_messages: user.accept_messages,
      }),
      Err(_e) => Err(APIError::err("couldnt_find_user").into()),
    }
  }
}
