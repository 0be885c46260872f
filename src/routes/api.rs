use crate::api::{comment::*, group::*, message::*, post::*, site::*, user::*, Oper, Perform};
use crate::rate_limit::RateLimit;
use crate::DbPool;
use actix_web::{error::ErrorBadRequest, *};
use serde::Deserialize;

pub fn config(cfg: &mut web::ServiceConfig, rate_limit: &RateLimit) {
  cfg.service(
    web::scope("/api/v1")
      // Websockets
      .service(web::resource("/ws").to(super::websocket::chat_route))
      // Categories
      .service(
        web::scope("/categories")
          .wrap(rate_limit.message())
          .route("", web::get().to(route_get::<ListCategories>))
          .route("", web::post().to(route_post::<CreateCategory>)),
      )
      // Post
      .service(
        // Handle POST to /post separately to add the post() rate limitter
        web::resource("/post")
          .guard(guard::Post())
          .wrap(rate_limit.post())
          .route(web::post().to(route_post::<CreatePost>)),
      )
      .service(
        web::scope("/post")
          .wrap(rate_limit.message())
          .route("", web::get().to(route_get::<GetPost>))
          .route("/list", web::get().to(route_get::<GetPosts>))
          .route("/delete", web::post().to(route_post::<DeletePost>))
          .route("/vote", web::post().to(route_post::<CreatePostVote>)),
      )
      // Comment
      .service(
        web::scope("/comment")
          .wrap(rate_limit.message())
          .route("", web::post().to(route_post::<CreateComment>))
          .route("", web::put().to(route_post::<EditComment>)),
      )
      // Group
      .service(
        // Creating a group is as costly as registering
        web::resource("/group")
          .guard(guard::Post())
          .wrap(rate_limit.register())
          .route(web::post().to(route_post::<CreateGroup>)),
      )
      .service(
        web::scope("/group")
          .wrap(rate_limit.message())
          .route("/list", web::get().to(route_get::<ListGroups>))
          .route("/join", web::post().to(route_post::<JoinGroup>)),
      )
      // Message
      .service(
        web::scope("/message")
          .wrap(rate_limit.message())
          .route("", web::post().to(route_post::<CreateMessage>))
          .route("/list", web::get().to(route_get::<GetMessages>))
          .route("/delete", web::post().to(route_post::<DeleteMessage>)),
      )
      // User
      .service(
        // Handle /user/register separately to add the register() rate limitter
        web::resource("/user/register")
          .guard(guard::Post())
          .wrap(rate_limit.register())
          .route(web::post().to(route_post::<Register>)),
      )
      .service(
        web::scope("/user")
          .wrap(rate_limit.message())
          .route("/login", web::post().to(route_post::<Login>))
          .route("/verify_code", web::post().to(route_post::<VerifyCode>))
          .route(
            "/check_username",
            web::get().to(route_get::<CheckUsername>),
          )
          .route(
            "/save_user_settings",
            web::put().to(route_post::<SaveUserSettings>),
          ),
      ),
  );
}

async fn perform<Data>(data: Data, db: web::Data<DbPool>) -> Result<HttpResponse, Error>
where
  Data: Send + 'static,
  Oper<Data>: Perform,
{
  let res = Oper::new(data)
    .perform(&db)
    .await
    .map(|json| HttpResponse::Ok().json(json))
    .map_err(ErrorBadRequest)?;
  Ok(res)
}

async fn route_get<'a, Data>(
  data: web::Query<Data>,
  db: web::Data<DbPool>,
) -> Result<HttpResponse, Error>
where
  Data: Deserialize<'a> + Send + 'static,
  Oper<Data>: Perform,
{
  perform::<Data>(data.0, db).await
}

async fn route_post<'a, Data>(
  data: web::Json<Data>,
  db: web::Data<DbPool>,
) -> Result<HttpResponse, Error>
where
  Data: Deserialize<'a> + Send + 'static,
  Oper<Data>: Perform,
{
  perform::<Data>(data.0, db).await
}
