use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Classification tag for transactions. Categories form a single-level tree:
/// a category either has no parent, or its parent has none.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Category {
    pub fn is_parent(&self) -> bool {
        self.parent_id.is_none()
    }

    /// ID of the top-level category this one rolls up into.
    pub fn root_id(&self) -> &str {
        self.parent_id.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub id: Option<String>,
    pub name: String,
    pub parent_id: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub id: String,
    pub name: String,
    /// New parent; `None` makes the category top-level.
    pub parent_id: Option<String>,
}

impl CategoryUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

/// Category with its children (for hierarchical display)
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithChildren {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<Category>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "Category name cannot be empty".to_string(),
        )));
    }
    Ok(())
}

/// Checks that `parent` may become the parent of category `category_id`
/// (`None` for a category being created) which currently has `child_count` children.
pub fn check_parent_assignment(
    category_id: Option<&str>,
    parent: Option<&Category>,
    child_count: i64,
) -> Result<()> {
    let Some(parent) = parent else {
        return Ok(());
    };
    if Some(parent.id.as_str()) == category_id {
        return Err(Error::ConstraintViolation(
            "A category cannot be its own parent".to_string(),
        ));
    }
    if parent.parent_id.is_some() {
        return Err(Error::ConstraintViolation(format!(
            "'{}' is a subcategory and cannot hold subcategories",
            parent.name
        )));
    }
    if child_count > 0 {
        return Err(Error::ConstraintViolation(
            "A category with subcategories cannot become a subcategory".to_string(),
        ));
    }
    Ok(())
}

/// Categories can only be deleted once nothing refers to them.
pub fn check_deletable(name: &str, child_count: i64, transaction_count: i64) -> Result<()> {
    if child_count > 0 {
        return Err(Error::ConstraintViolation(format!(
            "Cannot delete category '{}': it has {} subcategories",
            name, child_count
        )));
    }
    if transaction_count > 0 {
        return Err(Error::ConstraintViolation(format!(
            "Cannot delete category '{}': {} transactions are assigned to it",
            name, transaction_count
        )));
    }
    Ok(())
}

/// Groups a flat list into parents with their children, keeping input order.
pub fn organize_hierarchically(categories: Vec<Category>) -> Vec<CategoryWithChildren> {
    let (parents, children): (Vec<Category>, Vec<Category>) =
        categories.into_iter().partition(Category::is_parent);

    parents
        .into_iter()
        .map(|parent| {
            let children = children
                .iter()
                .filter(|c| c.parent_id.as_deref() == Some(parent.id.as_str()))
                .cloned()
                .collect();
            CategoryWithChildren {
                category: parent,
                children,
            }
        })
        .collect()
}
