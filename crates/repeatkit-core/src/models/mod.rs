pub mod ids;
pub mod payload;
pub mod project;
pub mod repeat;
