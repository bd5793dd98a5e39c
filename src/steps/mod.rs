//! The import pipeline's steps, in their required execution order:
//! customer group, tax category, product types, product import, publish.

pub mod customer_group;
pub mod import_products;
pub mod product_types;
pub mod publish;
pub mod tax_category;

pub use customer_group::{CustomerGroupStep, CUSTOMER_GROUP_NAME};
pub use import_products::ImportProductsStep;
pub use product_types::ProductTypesStep;
pub use publish::PublishStep;
pub use tax_category::{TaxCategoryStep, TAX_CATEGORY_NAME};
