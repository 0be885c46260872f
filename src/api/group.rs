use crate::{
  api::{claims::Claims, APIError, Oper, Perform},
  blocking,
  db::{group::*, Crud, Joinable},
  DbPool,
  RantifyError,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct CreateGroup {
  name: String,
  description: Option<String>,
  auth: String,
}

#[derive(Serialize, Deserialize)]
pub struct GroupResponse {
  pub group: Group,
}

#[derive(Serialize, Deserialize)]
pub struct ListGroups {}

#[derive(Serialize, Deserialize)]
pub struct ListGroupsResponse {
  pub groups: Vec<Group>,
}

#[derive(Serialize, Deserialize)]
pub struct JoinGroup {
  pub group_id: i32,
  auth: String,
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<CreateGroup> {
  type Response = GroupResponse;

  async fn perform(&self, pool: &DbPool) -> Result<GroupResponse, RantifyError> {
    let data: &CreateGroup = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    if data.name.trim().len() < 3 {
      return Err(APIError::err("invalid_group_name").into());
    }

    let name = data.name.clone();
    let existing = blocking(pool, move |conn| Group::read_from_name(conn, &name)).await?;
    if existing.is_ok() {
      return Err(APIError::err("group_already_exists").into());
    }

    let group_form = GroupForm {
      name: data.name.to_owned(),
      description: data.description.to_owned(),
      creator_id: claims.id,
    };

    let inserted_group = match blocking(pool, move |conn| Group::create(conn, &group_form)).await? {
      Ok(group) => group,
      Err(_e) => return Err(APIError::err("group_already_exists").into()),
    };

    // The creator is the first member
    let member_form = GroupMemberForm {
      group_id: inserted_group.id,
      user_id: claims.id,
    };
    blocking(pool, move |conn| GroupMember::join(conn, &member_form)).await??;

    Ok(GroupResponse {
      group: inserted_group,
    })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<ListGroups> {
  type Response = ListGroupsResponse;

  async fn perform(&self, pool: &DbPool) -> Result<ListGroupsResponse, RantifyError> {
    let groups = blocking(pool, move |conn| Group::list(conn)).await??;

    Ok(ListGroupsResponse { groups })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<JoinGroup> {
  type Response = GroupResponse;

  async fn perform(&self, pool: &DbPool) -> Result<GroupResponse, RantifyError> {
    let data: &JoinGroup = &self.data;

    let claims = match Claims::decode(&data.auth) {
      Ok(claims) => claims.claims,
      Err(_e) => return Err(APIError::err("not_logged_in").into()),
    };

    let group_id = data.group_id;
    let group = match blocking(pool, move |conn| Group::read(conn, group_id)).await? {
      Ok(group) => group,
      Err(_e) => return Err(APIError::err("couldnt_find_group").into()),
    };

    let member_form = GroupMemberForm {
      group_id: data.group_id,
      user_id: claims.id,
    };
    let joined = blocking(pool, move |conn| GroupMember::join(conn, &member_form)).await?;
    if joined.is_err() {
      return Err(APIError::err("group_member_already_exists").into());
    }

    Ok(GroupResponse { group })
  }
}
