use super::*;
use crate::naive_now;
use crate::schema::user_;
use crate::schema::user_::dsl::*;
use bcrypt::{hash, DEFAULT_COST};

#[derive(Queryable, Identifiable, PartialEq, Debug)]
#[table_name = "user_"]
pub struct User_ {
  pub id: i32,
  pub name: String,
  pub password_encrypted: String,
  pub email: Option<String>,
  pub verified: bool,
  pub verify_code: Option<String>,
  pub verify_code_expiry: Option<chrono::NaiveDateTime>,
  pub accept_messages: bool,
  pub published: chrono::NaiveDateTime,
  pub updated: Option<chrono::NaiveDateTime>,
}

#[derive(Insertable, AsChangeset, Clone)]
#[table_name = "user_"]
pub struct UserForm {
  pub name: String,
  pub password_encrypted: String,
  pub email: Option<String>,
  pub verified: bool,
  pub verify_code: Option<String>,
  pub verify_code_expiry: Option<chrono::NaiveDateTime>,
  pub accept_messages: bool,
  pub updated: Option<chrono::NaiveDateTime>,
}

impl Crud<UserForm> for User_ {
  fn read(conn: &PgConnection, user_id: i32) -> Result<Self, Error> {
    user_.find(user_id).first::<Self>(conn)
  }
  fn delete(conn: &PgConnection, user_id: i32) -> Result<usize, Error> {
    diesel::delete(user_.find(user_id)).execute(conn)
  }
  fn create(conn: &PgConnection, form: &UserForm) -> Result<Self, Error> {
    insert_into(user_).values(form).get_result::<Self>(conn)
  }
  fn update(conn: &PgConnection, user_id: i32, form: &UserForm) -> Result<Self, Error> {
    diesel::update(user_.find(user_id))
      .set(form)
      .get_result::<Self>(conn)
  }
}

impl User_ {
  pub fn register(conn: &PgConnection, form: &UserForm) -> Result<Self, Error> {
    let mut edited_user = form.clone();
    let password_hash =
      hash(&form.password_encrypted, DEFAULT_COST).expect("Couldn't hash password");
    edited_user.password_encrypted = password_hash;

    Self::create(&conn, &edited_user)
  }

  pub fn find_by_username(conn: &PgConnection, username: &str) -> Result<Self, Error> {
    user_.filter(name.eq(username)).first::<Self>(conn)
  }

  // AsChangeset skips None fields, so clearing the code needs explicit sets.
  pub fn set_verified(conn: &PgConnection, user_id: i32) -> Result<Self, Error> {
    diesel::update(user_.find(user_id))
      .set((
        verified.eq(true),
        verify_code.eq::<Option<String>>(None),
        verify_code_expiry.eq::<Option<chrono::NaiveDateTime>>(None),
        updated.eq(naive_now()),
      ))
      .get_result::<Self>(conn)
  }

  pub fn update_accept_messages(
    conn: &PgConnection,
    user_id: i32,
    accept: bool,
  ) -> Result<Self, Error> {
    diesel::update(user_.find(user_id))
      .set((accept_messages.eq(accept), updated.eq(naive_now())))
      .get_result::<Self>(conn)
  }
}

#[cfg(test)]
mod tests {
  use super::User_;
  use super::*;

  #[test]
  #[ignore]
  fn test_crud() {
    let conn = establish_connection();

    let new_user = UserForm {
      name: "thommy".into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: false,
      verify_code: Some("123456".into()),
      verify_code_expiry: Some(naive_now()),
      accept_messages: true,
      updated: None,
    };

    let inserted_user = User_::create(&conn, &new_user).unwrap();

    let expected_user = User_ {
      id: inserted_user.id,
      name: "thommy".into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: false,
      verify_code: Some("123456".into()),
      verify_code_expiry: inserted_user.verify_code_expiry,
      accept_messages: true,
      published: inserted_user.published,
      updated: None,
    };

    let read_user = User_::read(&conn, inserted_user.id).unwrap();
    let verified_user = User_::set_verified(&conn, inserted_user.id).unwrap();
    let num_deleted = User_::delete(&conn, inserted_user.id).unwrap();

    assert_eq!(expected_user, read_user);
    assert_eq!(expected_user, inserted_user);
    assert!(verified_user.verified);
    assert!(verified_user.verify_code.is_none());
    assert_eq!(1, num_deleted);
  }
}
