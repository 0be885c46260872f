use crate::{
  api::{claims::Claims, APIError, Oper, Perform},
  blocking,
  db::{comment::*, comment_view::CommentView, post::Post, Crud},
  naive_now,
  DbPool,
  RantifyError,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CreateComment {
  pub post_id: i32,
  content: String,
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct EditComment {
  pub comment_id: i32,
  content: String,
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct CommentResponse {
  pub comment: CommentView,
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<CreateComment> {
  type Response = CommentResponse;

  async fn perform(&self, pool: &DbPool) -> Result<CommentResponse, RantifyError> {
    let data: &CreateComment = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    if data.content.trim().is_empty() {
      return Err(APIError::err("comment_empty").into());
    }

    let post_id = data.post_id;
    if blocking(pool, move |conn| Post::read(conn, post_id))
      .await?
      .is_err()
    {
      return Err(APIError::err("couldnt_find_post").into());
    }

    let comment_form = CommentForm {
      post_id: data.post_id,
      creator_id: claims.id,
      content: data.content.to_owned(),
      updated: None,
    };

    let inserted_comment =
      blocking(pool, move |conn| Comment::create(conn, &comment_form)).await??;

    let comment_view = blocking(pool, move |conn| {
      CommentView::read(conn, inserted_comment.id)
    })
    .await??;

    Ok(CommentResponse {
      comment: comment_view,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<EditComment> {
  type Response = CommentResponse;

  async fn perform(&self, pool: &DbPool) -> Result<CommentResponse, RantifyError> {
    let data: &EditComment = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    if data.content.trim().is_empty() {
      return Err(APIError::err("comment_empty").into());
    }

    let comment_id = data.comment_id;
    let orig_comment = match blocking(pool, move |conn| Comment::read(conn, comment_id)).await? {
      Ok(comment) => comment,
      Err(_e) => return Err(APIError::err("couldnt_find_comment").into()),
    };

    if orig_comment.creator_id != claims.id {
      return Err(APIError::err("not_comment_creator").into());
    }

    let comment_form = CommentForm {
      post_id: orig_comment.post_id,
      creator_id: orig_comment.creator_id,
      content: data.content.to_owned(),
      updated: Some(naive_now()),
    };

    let comment_id = data.comment_id;
    let updated_comment = blocking(pool, move |conn| {
      Comment::update(conn, comment_id, &comment_form)
    })
    .await??;

    let comment_view =
      blocking(pool, move |conn| CommentView::read(conn, updated_comment.id)).await??;

    Ok(CommentResponse {
      comment: comment_view,
    })
  }
}
