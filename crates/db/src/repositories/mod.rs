//! Repository layer.
//!
//! Repositories borrow a [`UnitOfWork`](crate::UnitOfWork): reads run on its
//! connection, writes are staged until the unit of work commits.

pub mod movie_repo;

pub use movie_repo::{Expect, MovieFilter, MovieRepo};
