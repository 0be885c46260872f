use crate::{
  api::{claims::Claims, APIError, Oper, Perform},
  blocking,
  db::{message::*, user::User_},
  DbPool,
  RantifyError,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CreateMessage {
  pub username: String,
  content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
  pub message: Message,
}

#[derive(Serialize, Deserialize)]
pub struct GetMessages {
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct GetMessagesResponse {
  pub messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
pub struct DeleteMessage {
  pub message_id: i32,
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct DeleteMessageResponse {
  pub deleted: bool,
}

// Anyone can drop a note in an inbox, no login required. The sender
// is never recorded.
#[async_trait::async_trait(?Send)]
impl Perform for Oper<CreateMessage> {
  type Response = MessageResponse;

  async fn perform(&self, pool: &DbPool) -> Result<MessageResponse, RantifyError> {
    let data: &CreateMessage = &self.data;

    if data.content.trim().is_empty() {
      return Err(APIError::err("message_empty").into());
    }

    let username = data.username.clone();
    let recipient = match blocking(pool, move |conn| {
      User_::find_by_username(conn, &username)
    })
    .await?
    {
      Ok(user) => user,
      Err(_e) => return Err(APIError::err("couldnt_find_user").into()),
    };

    if !recipient.accept_messages {
      return Err(APIError::err("not_accepting_messages").into());
    }

    let form = MessageForm {
      recipient_id: recipient.id,
      content: data.content.to_owned(),
    };

    let inserted_message = blocking(pool, move |conn| Message::create(conn, &form)).await??;

    Ok(MessageResponse {
      message: inserted_message,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<GetMessages> {
  type Response = GetMessagesResponse;

  async fn perform(&self, pool: &DbPool) -> Result<GetMessagesResponse, RantifyError> {
    let data: &GetMessages = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    let user_id = claims.id;
    let messages = blocking(pool, move |conn| {
      Message::list_for_recipient(conn, user_id)
    })
    .await??;

    Ok(GetMessagesResponse { messages })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<DeleteMessage> {
  type Response = DeleteMessageResponse;

  async fn perform(&self, pool: &DbPool) -> Result<DeleteMessageResponse, RantifyError> {
    let data: &DeleteMessage = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    let message_id = data.message_id;
    let user_id = claims.id;
    let deleted = blocking(pool, move |conn| {
      Message::delete_for_recipient(conn, message_id, user_id)
    })
    .await??;

    // zero rows means the message is missing or belongs to someone else
    if deleted == 0 {
      return Err(APIError::err("couldnt_find_message").into());
    }

    Ok(DeleteMessageResponse { deleted: true })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    db::{establish_connection, Crud},
    settings::Settings,
  };
  use diesel::r2d2::{ConnectionManager, Pool};
  use diesel::PgConnection;

  fn test_pool() -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(Settings::get().get_database_url());
    Pool::builder().build(manager).unwrap()
  }

  #[actix_rt::test]
  #[ignore]
  async fn test_closed_inbox_rejects_messages() {
    let pool = test_pool();

    let conn = establish_connection();
    let form = crate::db::user::UserForm {
      name: "closed_inbox".into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: true,
      verify_code: None,
      verify_code_expiry: None,
      accept_messages: false,
      updated: None,
    };
    let recipient = User_::create(&conn, &form).unwrap();

    let create = CreateMessage {
      username: "closed_inbox".into(),
      content: "you ok?".into(),
    };
    let err = Oper::new(create).perform(&pool).await.unwrap_err();
    assert!(err.to_string().contains("not_accepting_messages"));

    // reopening the inbox lets the same message through
    User_::update_accept_messages(&conn, recipient.id, true).unwrap();
    let create = CreateMessage {
      username: "closed_inbox".into(),
      content: "you ok?".into(),
    };
    let res = Oper::new(create).perform(&pool).await.unwrap();
    assert_eq!("you ok?", res.message.content);

    let auth = Claims::jwt(&recipient, Settings::get().hostname).unwrap();
    let delete = DeleteMessage {
      message_id: res.message.id,
      auth,
    };
    let deleted = Oper::new(delete).perform(&pool).await.unwrap();
    assert!(deleted.deleted);

    User_::delete(&conn, recipient.id).unwrap();
  }
}
