use super::*;
use crate::schema::{comment, user_};

#[derive(Queryable, PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct CommentView {
  pub id: i32,
  pub post_id: i32,
  #[serde(skip_serializing, default)]
  pub creator_id: i32,
  pub creator_name: String,
  pub content: String,
  pub published: chrono::NaiveDateTime,
  pub updated: Option<chrono::NaiveDateTime>,
}

type CommentViewTuple = (
  i32,
  i32,
  i32,
  String,
  String,
  chrono::NaiveDateTime,
  Option<chrono::NaiveDateTime>,
);

fn selection() -> (
  comment::id,
  comment::post_id,
  comment::creator_id,
  user_::name,
  comment::content,
  comment::published,
  comment::updated,
) {
  (
    comment::id,
    comment::post_id,
    comment::creator_id,
    user_::name,
    comment::content,
    comment::published,
    comment::updated,
  )
}

impl CommentView {
  pub fn read(conn: &PgConnection, from_comment_id: i32) -> Result<Self, Error> {
    let res = comment::table
      .inner_join(user_::table)
      .select(selection())
      .filter(comment::id.eq(from_comment_id))
      .first::<CommentViewTuple>(conn)?;
    Ok(to_view(res))
  }

  pub fn list_for_post(conn: &PgConnection, from_post_id: i32) -> Result<Vec<Self>, Error> {
    let res = comment::table
      .inner_join(user_::table)
      .select(selection())
      .filter(comment::post_id.eq(from_post_id))
      .order_by(comment::published.desc())
      .load::<CommentViewTuple>(conn)?;
    Ok(res.into_iter().map(to_view).collect())
  }
}

fn to_view(t: CommentViewTuple) -> CommentView {
  CommentView {
    id: t.0,
    post_id: t.1,
    creator_id: t.2,
    creator_name: t.3,
    content: t.4,
    published: t.5,
    updated: t.6,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::naive_now;

  #[test]
  fn test_serialized_comment_shows_username_not_id() {
    let view = CommentView {
      id: 1,
      post_id: 2,
      creator_id: 7,
      creator_name: "bob".into(),
      content: "same here".into(),
      published: naive_now(),
      updated: None,
    };

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!("bob", json["creator_name"]);
    assert!(json.get("creator_id").is_none());
  }
}
