use super::*;
use crate::schema::{group_, group_member};

#[derive(Queryable, Identifiable, PartialEq, Debug, Serialize, Deserialize)]
#[table_name = "group_"]
pub struct Group {
  pub id: i32,
  pub name: String,
  pub description: Option<String>,
  #[serde(skip_serializing, default)]
  pub creator_id: i32,
  pub published: chrono::NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Clone)]
#[table_name = "group_"]
pub struct GroupForm {
  pub name: String,
  pub description: Option<String>,
  pub creator_id: i32,
}

impl Crud<GroupForm> for Group {
  fn read(conn: &PgConnection, group_id: i32) -> Result<Self, Error> {
    use crate::schema::group_::dsl::*;
    group_.find(group_id).first::<Self>(conn)
  }

  fn delete(conn: &PgConnection, group_id: i32) -> Result<usize, Error> {
    use crate::schema::group_::dsl::*;
    diesel::delete(group_.find(group_id)).execute(conn)
  }

  fn create(conn: &PgConnection, form: &GroupForm) -> Result<Self, Error> {
    use crate::schema::group_::dsl::*;
    insert_into(group_).values(form).get_result::<Self>(conn)
  }

  fn update(conn: &PgConnection, group_id: i32, form: &GroupForm) -> Result<Self, Error> {
    use crate::schema::group_::dsl::*;
    diesel::update(group_.find(group_id))
      .set(form)
      .get_result::<Self>(conn)
  }
}

impl Group {
  pub fn read_from_name(conn: &PgConnection, group_name: &str) -> Result<Self, Error> {
    use crate::schema::group_::dsl::*;
    group_.filter(name.eq(group_name)).first::<Self>(conn)
  }

  pub fn list(conn: &PgConnection) -> Result<Vec<Self>, Error> {
    use crate::schema::group_::dsl::*;
    group_.order_by(name.asc()).load::<Self>(conn)
  }
}

#[derive(Identifiable, Queryable, Associations, PartialEq, Debug)]
#[belongs_to(Group)]
#[table_name = "group_member"]
pub struct GroupMember {
  pub id: i32,
  pub group_id: i32,
  pub user_id: i32,
  pub published: chrono::NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Clone)]
#[table_name = "group_member"]
pub struct GroupMemberForm {
  pub group_id: i32,
  pub user_id: i32,
}

impl Joinable<GroupMemberForm> for GroupMember {
  fn join(conn: &PgConnection, form: &GroupMemberForm) -> Result<Self, Error> {
    use crate::schema::group_member::dsl::*;
    insert_into(group_member)
      .values(form)
      .get_result::<Self>(conn)
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
      name: "carol".into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: true,
      verify_code: None,
      verify_code_expiry: None,
      accept_messages: true,
      updated: None,
    };

    let inserted_user = User_::create(&conn, &new_user).unwrap();

    let new_group = GroupForm {
      name: "night shift".into(),
      description: None,
      creator_id: inserted_user.id,
    };

    let inserted_group = Group::create(&conn, &new_group).unwrap();
    assert_eq!("night shift", inserted_group.name);

    let member_form = GroupMemberForm {
      group_id: inserted_group.id,
      user_id: inserted_user.id,
    };

    let inserted_member = GroupMember::join(&conn, &member_form).unwrap();
    assert_eq!(inserted_group.id, inserted_member.group_id);

    // joining twice trips the unique constraint
    assert!(GroupMember::join(&conn, &member_form).is_err());

    let found = Group::read_from_name(&conn, "night shift").unwrap();
    assert_eq!(inserted_group.id, found.id);

    Group::delete(&conn, inserted_group.id).unwrap();
    User_::delete(&conn, inserted_user.id).unwrap();
  }
}
