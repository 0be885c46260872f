use super::*;
use crate::schema::message;

/// An anonymous note in a user's inbox. The sender is never stored.
#[derive(Queryable, Identifiable, PartialEq, Debug, Serialize, Deserialize)]
#[table_name = "message"]
pub struct Message {
  pub id: i32,
  #[serde(skip_serializing, default)]
  pub recipient_id: i32,
  pub content: String,
  pub published: chrono::NaiveDateTime,
}

#[derive(Insertable, Clone)]
#[table_name = "message"]
pub struct MessageForm {
  pub recipient_id: i32,
  pub content: String,
}

impl Message {
  pub fn create(conn: &PgConnection, form: &MessageForm) -> Result<Self, Error> {
    use crate::schema::message::dsl::*;
    insert_into(message).values(form).get_result::<Self>(conn)
  }

  pub fn list_for_recipient(conn: &PgConnection, for_recipient_id: i32) -> Result<Vec<Self>, Error> {
    use crate::schema::message::dsl::*;
    message
      .filter(recipient_id.eq(for_recipient_id))
      .order_by(published.desc())
      .load::<Self>(conn)
  }

  // Scoped to the recipient so nobody can delete another inbox's rows.
  pub fn delete_for_recipient(
    conn: &PgConnection,
    message_id: i32,
    for_recipient_id: i32,
  ) -> Result<usize, Error> {
    use crate::schema::message::dsl::*;
    diesel::delete(
      message
        .find(message_id)
        .filter(recipient_id.eq(for_recipient_id)),
    )
    .execute(conn)
  }
}

#[cfg(test)]
mod tests {
  use super::super::user::*;
  use super::*;

  #[test]
  #[ignore]
  fn test_crud() {
    let conn = establish_connection();

    let new_user = UserForm {
      name: "dana".into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: true,
      verify_code: None,
      verify_code_expiry: None,
      accept_messages: true,
      updated: None,
    };

    let inserted_user = User_::create(&conn, &new_user).unwrap();

    let form = MessageForm {
      recipient_id: inserted_user.id,
      content: "your secret admirer says hi".into(),
    };

    let inserted_message = Message::create(&conn, &form).unwrap();

    let inbox = Message::list_for_recipient(&conn, inserted_user.id).unwrap();
    assert_eq!(1, inbox.len());
    assert_eq!("your secret admirer says hi", inbox[0].content);

    // wrong recipient deletes nothing
    let deleted =
      Message::delete_for_recipient(&conn, inserted_message.id, inserted_user.id + 1).unwrap();
    assert_eq!(0, deleted);

    let deleted =
      Message::delete_for_recipient(&conn, inserted_message.id, inserted_user.id).unwrap();
    assert_eq!(1, deleted);

    User_::delete(&conn, inserted_user.id).unwrap();
  }
}
