use crate::{
  api::{claims::Claims, APIError, Oper, Perform},
  blocking,
  db::{comment_view::CommentView, post::*, post_view::PostView, limit_and_offset, Crud, SortType, Voteable},
  DbPool,
  RantifyError,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Serialize, Deserialize)]
pub struct CreatePost {
  content: String,
  media_url: Option<String>,
  category: Option<String>,
  auth: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
  pub post: PostView,
}

#[derive(Serialize, Deserialize)]
pub struct GetPost {
  pub id: i32,
}

#[derive(Serialize, Deserialize)]
pub struct GetPostResponse {
  pub post: PostView,
  pub comments: Vec<CommentView>,
}

#[derive(Serialize, Deserialize)]
pub struct GetPosts {
  sort: Option<String>,
  category: Option<String>,
  page: Option<i64>,
  limit: Option<i64>,
}

#[derive(Serialize, Deserialize)]
pub struct GetPostsResponse {
  pub posts: Vec<PostView>,
  pub page: i64,
  pub limit: i64,
  pub total: i64,
}

#[derive(Serialize, Deserialize)]
pub struct DeletePost {
  pub post_id: i32,
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct DeletePostResponse {
  pub deleted: bool,
}

#[derive(Serialize, Deserialize)]
pub struct CreatePostVote {
  pub post_id: i32,
  score: i16,
  auth: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePostVoteResponse {
  pub score: i32,
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<CreatePost> {
  type Response = PostResponse;

  async fn perform(&self, pool: &DbPool) -> Result<PostResponse, RantifyError> {
    let data: &CreatePost = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    if data.content.trim().is_empty() {
      return Err(APIError::err("missing_fields").into());
    }

    let category = match data.category.as_deref().map(str::trim) {
      Some(c) if !c.is_empty() => c.to_string(),
      _ => return Err(APIError::err("missing_fields").into()),
    };

    let post_form = PostForm {
      creator_id: claims.id,
      content: data.content.to_owned(),
      media_url: data.media_url.to_owned(),
      category,
      updated: None,
    };

    let inserted_post = match blocking(pool, move |conn| Post::create(conn, &post_form)).await? {
      Ok(post) => post,
      Err(_e) => return Err(APIError::err("couldnt_create_post").into()),
    };

    let post_view = blocking(pool, move |conn| PostView::read(conn, inserted_post.id)).await??;

    Ok(PostResponse { post: post_view })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<GetPost> {
  type Response = GetPostResponse;

  async fn perform(&self, pool: &DbPool) -> Result<GetPostResponse, RantifyError> {
    let data: &GetPost = &self.data;

    let id = data.id;
    let post_view = match blocking(pool, move |conn| PostView::read(conn, id)).await? {
      Ok(post) => post,
      Err(_e) => return Err(APIError::err("couldnt_find_post").into()),
    };

    let id = data.id;
    let comments = blocking(pool, move |conn| CommentView::list_for_post(conn, id)).await??;

    Ok(GetPostResponse {
      post: post_view,
      comments,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<GetPosts> {
  type Response = GetPostsResponse;

  async fn perform(&self, pool: &DbPool) -> Result<GetPostsResponse, RantifyError> {
    let data: &GetPosts = &self.data;

    // unknown sort names fall back to recent
    let sort = data
      .sort
      .as_deref()
      .and_then(|s| SortType::from_str(s).ok())
      .unwrap_or(SortType::Recent);

    let (page, limit, _offset) = limit_and_offset(data.page, data.limit);

    let category = data.category.to_owned();
    let req_page = data.page;
    let req_limit = data.limit;
    let posts = match blocking(pool, move |conn| {
      PostView::list(conn, &sort, category, req_page, req_limit)
    })
    .await?
    {
      Ok(posts) => posts,
      Err(_e) => return Err(APIError::err("couldnt_get_posts").into()),
    };

    let category = data.category.to_owned();
    let total = blocking(pool, move |conn| PostView::count(conn, category)).await??;

    Ok(GetPostsResponse {
      posts,
      page,
      limit,
      total,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<DeletePost> {
  type Response = DeletePostResponse;

  async fn perform(&self, pool: &DbPool) -> Result<DeletePostResponse, RantifyError> {
    let data: &DeletePost = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    let post_id = data.post_id;
    let post = match blocking(pool, move |conn| Post::read(conn, post_id)).await? {
      Ok(post) => post,
      Err(_e) => return Err(APIError::err("couldnt_find_post").into()),
    };

    if post.creator_id != claims.id {
      return Err(APIError::err("not_post_creator").into());
    }

    let post_id = data.post_id;
    blocking(pool, move |conn| Post::delete(conn, post_id)).await??;

    Ok(DeletePostResponse { deleted: true })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<CreatePostVote> {
  type Response = CreatePostVoteResponse;

  async fn perform(&self, pool: &DbPool) -> Result<CreatePostVoteResponse, RantifyError> {
    let data: &CreatePostVote = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    if data.score != 1 && data.score != -1 {
      return Err(APIError::err("invalid_vote").into());
    }

    let post_id = data.post_id;
    if blocking(pool, move |conn| Post::read(conn, post_id))
      .await?
      .is_err()
    {
      return Err(APIError::err("couldnt_find_post").into());
    }

    // Repeating the same vote is a conflict, the opposite vote flips in place
    let user_id = claims.id;
    let existing = blocking(pool, move |conn| {
      PostVote::read_for_pair(conn, post_id, user_id)
    })
    .await??;
    if let Some(existing) = existing {
      if existing.score == data.score {
        return Err(APIError::err("already_voted").into());
      }
    }

    let vote_form = PostVoteForm {
      post_id: data.post_id,
      user_id: claims.id,
      score: data.score,
    };
    blocking(pool, move |conn| PostVote::vote(conn, &vote_form)).await??;

    let score = blocking(pool, move |conn| Post::update_score(conn, post_id)).await??;

    Ok(CreatePostVoteResponse { score })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    db::{establish_connection, user::*},
    settings::Settings,
  };
  use diesel::r2d2::{ConnectionManager, Pool};
  use diesel::PgConnection;

  fn test_pool() -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(Settings::get().get_database_url());
    Pool::builder().build(manager).unwrap()
  }

  fn insert_user(name: &str) -> (User_, String) {
    let conn = establish_connection();
    let form = UserForm {
      name: name.into(),
      password_encrypted: "nope".into(),
      email: None,
      verified: true,
      verify_code: None,
      verify_code_expiry: None,
      accept_messages: true,
      updated: None,
    };
    let user = User_::create(&conn, &form).unwrap();
    let jwt = Claims::jwt(&user, Settings::get().hostname).unwrap();
    (user, jwt)
  }

  #[actix_rt::test]
  #[ignore]
  async fn test_create_post_requires_category() {
    let pool = test_pool();
    let (user, auth) = insert_user("cat_checker");

    for category in vec![None, Some("".to_string()), Some("   ".to_string())] {
      let create = CreatePost {
        content: "today was rough".into(),
        media_url: None,
        category,
        auth: auth.clone(),
      };
      let err = Oper::new(create).perform(&pool).await.unwrap_err();
      assert!(err.to_string().contains("missing_fields"));
    }

    let conn = establish_connection();
    User_::delete(&conn, user.id).unwrap();
  }

  #[actix_rt::test]
  #[ignore]
  async fn test_repeat_vote_rejected_and_flip_allowed() {
    let pool = test_pool();
    let (author, author_auth) = insert_user("vote_author");
    let (voter, voter_auth) = insert_user("vote_caster");

    let create = CreatePost {
      content: "my boss took credit again".into(),
      media_url: None,
      category: Some("work".into()),
      auth: author_auth,
    };
    let post = Oper::new(create).perform(&pool).await.unwrap().post;

    let up = CreatePostVote {
      post_id: post.id,
      score: 1,
      auth: voter_auth.clone(),
    };
    let res = Oper::new(up).perform(&pool).await.unwrap();
    assert_eq!(1, res.score);

    // same vote again is a conflict
    let repeat = CreatePostVote {
      post_id: post.id,
      score: 1,
      auth: voter_auth.clone(),
    };
    let err = Oper::new(repeat).perform(&pool).await.unwrap_err();
    assert!(err.to_string().contains("already_voted"));

    // the opposite vote flips in place, moving the score by two
    let flip = CreatePostVote {
      post_id: post.id,
      score: -1,
      auth: voter_auth,
    };
    let res = Oper::new(flip).perform(&pool).await.unwrap();
    assert_eq!(-1, res.score);

    let conn = establish_connection();
    let vote_form = PostVoteForm {
      post_id: post.id,
      user_id: voter.id,
      score: -1,
    };
    PostVote::remove(&conn, &vote_form).unwrap();
    Post::delete(&conn, post.id).unwrap();
    User_::delete(&conn, author.id).unwrap();
    User_::delete(&conn, voter.id).unwrap();
  }
}
