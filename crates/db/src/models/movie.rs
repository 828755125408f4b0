//! Movie entity model and DTOs.

use chrono::NaiveDate;
use marquee_core::error::{CoreError, FieldErrors};
use marquee_core::movie::{
    generate_sid, round_rating, validate_not_blank, validate_release_date, RATING_MAX,
    RATING_MIN, REVIEW_MAX_LEN,
};
use marquee_core::types::{DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::status::MovieStatus;

/// A row from the `movies` table.
///
/// Carries the internal `id` and is not `Serialize`;
/// convert to [`MovieView`] before handing it to a caller.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Movie {
    pub id: DbId,
    pub sid: String,
    pub title: String,
    pub genre: String,
    pub director: String,
    pub release_date: NaiveDate,
    pub rating: Option<f64>,
    pub review: Option<String>,
    pub status: MovieStatus,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

/// Public projection of a movie. Also the shape the search procedures emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieView {
    pub sid: String,
    pub title: String,
    pub genre: String,
    pub director: String,
    pub release_date: NaiveDate,
    pub rating: Option<f64>,
    pub review: Option<String>,
    pub status: MovieStatus,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl From<Movie> for MovieView {
    fn from(movie: Movie) -> Self {
        Self {
            sid: movie.sid,
            title: movie.title,
            genre: movie.genre,
            director: movie.director,
            release_date: movie.release_date,
            rating: movie.rating,
            review: movie.review,
            status: movie.status,
            created_at: movie.created_at,
            modified_at: movie.modified_at,
        }
    }
}

/// A movie staged for insertion. SID, status and timestamps are already set.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub sid: String,
    pub title: String,
    pub genre: String,
    pub director: String,
    pub release_date: NaiveDate,
    pub rating: Option<f64>,
    pub review: Option<String>,
    pub status: MovieStatus,
    pub created_at: Timestamp,
    pub modified_at: Timestamp,
}

impl NewMovie {
    /// Build an Active record with a fresh SID, stamped at `now`.
    pub fn from_input(input: CreateMovie, now: Timestamp) -> Self {
        Self {
            sid: generate_sid(),
            title: input.title.trim().to_string(),
            genre: input.genre.trim().to_string(),
            director: input.director.trim().to_string(),
            release_date: input.release_date,
            rating: input.rating.map(round_rating),
            review: input.review,
            status: MovieStatus::Active,
            created_at: now,
            modified_at: now,
        }
    }
}

/// DTO for one record of a batch create.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMovie {
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1-255 characters."),
        custom(function = "validate_not_blank")
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 100, message = "Genre must be 1-100 characters."),
        custom(function = "validate_not_blank")
    )]
    pub genre: String,
    #[validate(
        length(min = 1, max = 150, message = "Director must be 1-150 characters."),
        custom(function = "validate_not_blank")
    )]
    pub director: String,
    #[validate(custom(function = "validate_release_date"))]
    pub release_date: NaiveDate,
    #[validate(range(min = 0.0, max = 10.0, message = "Rating must be between 0.0 and 10.0."))]
    pub rating: Option<f64>,
    #[validate(length(max = 1000, message = "Review cannot exceed 1000 characters."))]
    pub review: Option<String>,
}

/// Deserialize a field that is present in the body, `null` included, as
/// `Some(..)`. Paired with `#[serde(default)]` so an absent field stays `None`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// DTO for updating a movie. Absent fields are left unchanged.
///
/// `rating` and `review` are clearable: `Some(None)` (an explicit JSON
/// `null`) sets the column to NULL.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMovie {
    #[validate(
        length(min = 1, max = 255, message = "Title must be 1-255 characters."),
        custom(function = "validate_not_blank")
    )]
    pub title: Option<String>,
    #[validate(
        length(min = 1, max = 100, message = "Genre must be 1-100 characters."),
        custom(function = "validate_not_blank")
    )]
    pub genre: Option<String>,
    #[validate(
        length(min = 1, max = 150, message = "Director must be 1-150 characters."),
        custom(function = "validate_not_blank")
    )]
    pub director: Option<String>,
    #[validate(custom(function = "validate_release_date"))]
    pub release_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present")]
    pub rating: Option<Option<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub review: Option<Option<String>>,
}

impl UpdateMovie {
    /// Run the derived field rules plus the range and length checks on the
    /// clearable fields.
    pub fn validate_patch(&self) -> Result<(), CoreError> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };
        if let Some(Some(rating)) = self.rating {
            if !(RATING_MIN..=RATING_MAX).contains(&rating) {
                errors.push("rating", "Rating must be between 0.0 and 10.0.");
            }
        }
        if let Some(Some(review)) = &self.review {
            if review.chars().count() as u64 > REVIEW_MAX_LEN {
                errors.push("review", "Review cannot exceed 1000 characters.");
            }
        }
        errors.into_result()
    }

    /// Merge the supplied fields into `movie`. SID, status and timestamps are
    /// never touched here.
    pub fn apply_to(&self, movie: &mut Movie) {
        if let Some(title) = &self.title {
            movie.title = title.trim().to_string();
        }
        if let Some(genre) = &self.genre {
            movie.genre = genre.trim().to_string();
        }
        if let Some(director) = &self.director {
            movie.director = director.trim().to_string();
        }
        if let Some(release_date) = self.release_date {
            movie.release_date = release_date;
        }
        if let Some(rating) = self.rating {
            movie.rating = rating.map(round_rating);
        }
        if let Some(review) = &self.review {
            movie.review = review.clone();
        }
    }
}
