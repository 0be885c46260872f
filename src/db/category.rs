use super::*;
use crate::schema::category;

#[derive(Queryable, Identifiable, PartialEq, Debug, Serialize, Deserialize)]
#[table_name = "category"]
pub struct Category {
  pub id: i32,
  pub name: String,
  pub description: Option<String>,
}

#[derive(Insertable, AsChangeset, Clone, Serialize, Deserialize)]
#[table_name = "category"]
pub struct CategoryForm {
  pub name: String,
  pub description: Option<String>,
}

impl Crud<CategoryForm> for Category {
  fn read(conn: &PgConnection, category_id: i32) -> Result<Self, Error> {
    use crate::schema::category::dsl::*;
    category.find(category_id).first::<Self>(conn)
  }

  fn delete(conn: &PgConnection, category_id: i32) -> Result<usize, Error> {
    use crate::schema::category::dsl::*;
    diesel::delete(category.find(category_id)).execute(conn)
  }

  fn create(conn: &PgConnection, new_category: &CategoryForm) -> Result<Self, Error> {
    use crate::schema::category::dsl::*;
    insert_into(category)
      .values(new_category)
      .get_result::<Self>(conn)
  }

  fn update(
    conn: &PgConnection,
    category_id: i32,
    new_category: &CategoryForm,
  ) -> Result<Self, Error> {
    use crate::schema::category::dsl::*;
    diesel::update(category.find(category_id))
      .set(new_category)
      .get_result::<Self>(conn)
  }
}

impl Category {
  pub fn list_all(conn: &PgConnection) -> Result<Vec<Self>, Error> {
    use crate::schema::category::dsl::*;
    category.order_by(id.asc()).load::<Self>(conn)
  }

  pub fn read_from_name(conn: &PgConnection, category_name: &str) -> Result<Self, Error> {
    use crate::schema::category::dsl::*;
    category
      .filter(name.eq(category_name))
      .first::<Self>(conn)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[ignore]
  fn test_seeded_categories() {
    let conn = establish_connection();

    let categories = Category::list_all(&conn).unwrap();
    let expected_first_category = Category {
      id: 1,
      name: "general".into(),
      description: None,
    };

    assert_eq!(expected_first_category, categories[0]);
  }
}
