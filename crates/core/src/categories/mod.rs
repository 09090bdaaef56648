mod categories_model;
mod categories_service;
mod categories_traits;

pub use categories_model::{
    check_deletable, check_parent_assignment, organize_hierarchically, Category, CategoryUpdate,
    CategoryWithChildren, NewCategory,
};
pub use categories_service::CategoryService;
pub use categories_traits::{CategoryRepositoryTrait, CategoryServiceTrait};
