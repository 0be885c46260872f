use crate::{
  api::{APIError, Oper, Perform},
  blocking,
  db::{category::*, Crud},
  DbPool,
  RantifyError,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct ListCategories {}

#[derive(Serialize, Deserialize)]
pub struct ListCategoriesResponse {
  pub categories: Vec<Category>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateCategory {
  name: String,
  description: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CategoryResponse {
  pub category: Category,
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<ListCategories> {
  type Response = ListCategoriesResponse;

  async fn perform(&self, pool: &DbPool) -> Result<ListCategoriesResponse, RantifyError> {
    let categories = blocking(pool, move |conn| Category::list_all(conn)).await??;

    Ok(ListCategoriesResponse { categories })
  }
}

#[async_trait::async_trait(?Send)]
impl Perform for Oper<CreateCategory> {
  type Response = CategoryResponse;

  async fn perform(&self, pool: &DbPool) -> Result<CategoryResponse, RantifyError> {
    let data: &CreateCategory = &self.data;

    if data.name.trim().is_empty() {
      return Err(APIError::err("missing_fields").into());
    }

    let name = data.name.clone();
    let existing = blocking(pool, move |conn| Category::read_from_name(conn, &name)).await?;
    if existing.is_ok() {
      return Err(APIError::err("category_already_exists").into());
    }

    let category_form = CategoryForm {
      name: data.name.to_owned(),
      description: data.description.to_owned(),
    };

    let inserted_category = match blocking(pool, move |conn| {
      Category::create(conn, &category_form)
    })
    .await?
    {
      Ok(category) => category,
      Err(_e) => return Err(APIError::err("category_already_exists").into()),
    };

    Ok(CategoryResponse {
      category: inserted_category,
    })
  }
}
