pub mod domain;
pub mod model;
pub mod validate;
