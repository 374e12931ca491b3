//! Sea-ORM entities for the catalog tables

pub mod category;
pub mod image;
pub mod product;
pub mod review;
pub mod user;
pub mod variant;
