use super::*;
use crate::schema::{post, post_vote};
use diesel::dsl::sum;

#[derive(Queryable, Identifiable, PartialEq, Debug, Serialize, Deserialize)]
#[table_name = "post"]
pub struct Post {
  pub id: i32,
  pub creator_id: i32,
  pub content: String,
  pub media_url: Option<String>,
  pub category: String,
  pub score: i32,
  pub published: chrono::NaiveDateTime,
  pub updated: Option<chrono::NaiveDateTime>,
}

#[derive(Insertable, AsChangeset, Clone)]
#[table_name = "post"]
pub struct PostForm {
  pub creator_id: i32,
  pub content: String,
  pub media_url: Option<String>,
  pub category: String,
  pub updated: Option<chrono::NaiveDateTime>,
}

impl Crud<PostForm> for Post {
  fn read(conn: &PgConnection, post_id: i32) -> Result<Self, Error> {
    use crate::schema::post::dsl::*;
    post.find(post_id).first::<Self>(conn)
  }

  fn delete(conn: &PgConnection, post_id: i32) -> Result<usize, Error> {
    use crate::schema::post::dsl::*;
    diesel::delete(post.find(post_id)).execute(conn)
  }

  fn create(conn: &PgConnection, new_post: &PostForm) -> Result<Self, Error> {
    use crate::schema::post::dsl::*;
    insert_into(post).values(new_post).get_result::<Self>(conn)
  }

  fn update(conn: &PgConnection, post_id: i32, new_post: &PostForm) -> Result<Self, Error> {
    use crate::schema::post::dsl::*;
    diesel::update(post.find(post_id))
      .set(new_post)
      .get_result::<Self>(conn)
  }
}

impl Post {
  /// Recomputes the cached score from the vote rows and persists it.
  pub fn update_score(conn: &PgConnection, from_post_id: i32) -> Result<i32, Error> {
    let total: Option<i64> = post_vote::table
      .filter(post_vote::post_id.eq(from_post_id))
      .select(sum(post_vote::score))
      .first(conn)?;
    let new_score = total.unwrap_or(0) as i32;

    use crate::schema::post::dsl::*;
    diesel::update(post.find(from_post_id))
      .set(score.eq(new_score))
      .execute(conn)?;

    Ok(new_score)
  }
}

#[derive(Identifiable, Queryable, Associations, PartialEq, Debug)]
#[belongs_to(Post)]
#[table_name = "post_vote"]
pub struct PostVote {
  pub id: i32,
  pub post_id: i32,
  pub user_id: i32,
  pub score: i16,
  pub published: chrono::NaiveDateTime,
}

#[derive(Insertable, AsChangeset, Clone)]
#[table_name = "post_vote"]
pub struct PostVoteForm {
  pub post_id: i32,
  pub user_id: i32,
  pub score: i16,
}

impl Voteable<PostVoteForm> for PostVote {
  // Voting again flips the vote in place, one row per (post, user).
  fn vote(conn: &PgConnection, post_vote_form: &PostVoteForm) -> Result<Self, Error> {
    use crate::schema::post_vote::dsl::*;
    insert_into(post_vote)
      .values(post_vote_form)
      .on_conflict((post_id, user_id))
      .do_update()
      .set(score.eq(post_vote_form.score))
      .get_result::<Self>(conn)
  }
  fn remove(conn: &PgConnection, post_vote_form: &PostVoteForm) -> Result<usize, Error> {
    use crate::schema::post_vote::dsl::*;
    diesel::delete(
      post_vote
        .filter(post_id.eq(post_vote_form.post_id))
        .filter(user_id.eq(post_vote_form.user_id)),
    )
    .execute(conn)
  }
}

impl PostVote {
  pub fn read_for_pair(
    conn: &PgConnection,
    from_post_id: i32,
    from_user_id: i32,
  ) -> Result<Option<Self>, Error> {
    use crate::schema::post_vote::dsl::*;
    post_vote
      .filter(post_id.eq(from_post_id))
      .filter(user_id.eq(from_user_id))
      .first::<Self>(conn)
      .optional()
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
      name: "jim".into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: true,
      verify_code: None,
      verify_code_expiry: None,
      accept_messages: true,
      updated: None,
    };

    let inserted_user = User_::create(&conn, &new_user).unwrap();

    let new_post = PostForm {
      creator_id: inserted_user.id,
      content: "the coffee machine is broken again".into(),
      media_url: None,
      category: "work".into(),
      updated: None,
    };

    let inserted_post = Post::create(&conn, &new_post).unwrap();

    let expected_post = Post {
      id: inserted_post.id,
      creator_id: inserted_user.id,
      content: "the coffee machine is broken again".into(),
      media_url: None,
      category: "work".into(),
      score: 0,
      published: inserted_post.published,
      updated: None,
    };

    let post_vote_form = PostVoteForm {
      post_id: inserted_post.id,
      user_id: inserted_user.id,
      score: 1,
    };

    let inserted_vote = PostVote::vote(&conn, &post_vote_form).unwrap();
    assert_eq!(1, inserted_vote.score);
    assert_eq!(1, Post::update_score(&conn, inserted_post.id).unwrap());

    // same pair flips in place instead of inserting a second row
    let flipped_form = PostVoteForm {
      score: -1,
      ..post_vote_form.clone()
    };
    let flipped_vote = PostVote::vote(&conn, &flipped_form).unwrap();
    assert_eq!(inserted_vote.id, flipped_vote.id);
    assert_eq!(-1, flipped_vote.score);
    assert_eq!(-1, Post::update_score(&conn, inserted_post.id).unwrap());

    let read_post = Post::read(&conn, inserted_post.id).unwrap();
    let vote_removed = PostVote::remove(&conn, &post_vote_form).unwrap();
    let num_deleted = Post::delete(&conn, inserted_post.id).unwrap();
    User_::delete(&conn, inserted_user.id).unwrap();

    assert_eq!(expected_post, inserted_post);
    assert_eq!(expected_post.content, read_post.content);
    assert_eq!(1, vote_removed);
    assert_eq!(1, num_deleted);
  }
}
