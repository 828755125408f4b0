pub mod movie;
pub mod status;
