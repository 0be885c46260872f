use super::*;
use crate::schema::{post, user_};

/// A post joined with its author's public name. The username goes out
/// on the wire, the numeric id never does.
#[derive(Queryable, PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct PostView {
  pub id: i32,
  #[serde(skip_serializing, default)]
  pub creator_id: i32,
  pub creator_name: String,
  pub content: String,
  pub media_url: Option<String>,
  pub category: String,
  pub score: i32,
  pub published: chrono::NaiveDateTime,
  pub updated: Option<chrono::NaiveDateTime>,
}

type PostViewTuple = (
  i32,
  i32,
  String,
  String,
  Option<String>,
  String,
  i32,
  chrono::NaiveDateTime,
  Option<chrono::NaiveDateTime>,
);

fn selection() -> (
  post::id,
  post::creator_id,
  user_::name,
  post::content,
  post::media_url,
  post::category,
  post::score,
  post::published,
  post::updated,
) {
  (
    post::id,
    post::creator_id,
    user_::name,
    post::content,
    post::media_url,
    post::category,
    post::score,
    post::published,
    post::updated,
  )
}

impl PostView {
  pub fn read(conn: &PgConnection, from_post_id: i32) -> Result<Self, Error> {
    let res = post::table
      .inner_join(user_::table)
      .select(selection())
      .filter(post::id.eq(from_post_id))
      .first::<PostViewTuple>(conn)?;
    Ok(to_view(res))
  }

  pub fn list(
    conn: &PgConnection,
    sort: &SortType,
    for_category: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
  ) -> Result<Vec<Self>, Error> {
    let (_page, limit, offset) = limit_and_offset(page, limit);

    let mut query = post::table
      .inner_join(user_::table)
      .select(selection())
      .into_boxed();

    if let Some(for_category) = for_category {
      query = query.filter(post::category.eq(for_category));
    }

    query = match sort {
      SortType::Recent => query.order_by(post::published.desc()),
      SortType::Trending => query
        .order_by(post::score.desc())
        .then_order_by(post::published.desc()),
    };

    let res = query
      .limit(limit)
      .offset(offset)
      .load::<PostViewTuple>(conn)?;

    Ok(res.into_iter().map(to_view).collect())
  }

  pub fn count(conn: &PgConnection, for_category: Option<String>) -> Result<i64, Error> {
    match for_category {
      Some(for_category) => post::table
        .filter(post::category.eq(for_category))
        .count()
        .get_result(conn),
      None => post::table.count().get_result(conn),
    }
  }
}

fn to_view(t: PostViewTuple) -> PostView {
  PostView {
    id: t.0,
    creator_id: t.1,
    creator_name: t.2,
    content: t.3,
    media_url: t.4,
    category: t.5,
    score: t.6,
    published: t.7,
    updated: t.8,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::naive_now;

  #[test]
  fn test_serialized_post_shows_username_not_id() {
    let view = PostView {
      id: 1,
      creator_id: 7,
      creator_name: "alice".into(),
      content: "the coffee machine is broken again".into(),
      media_url: None,
      category: "work".into(),
      score: 0,
      published: naive_now(),
      updated: None,
    };

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!("alice", json["creator_name"]);
    assert!(json.get("creator_id").is_none());
  }
}
