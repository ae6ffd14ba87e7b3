//! Product review types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokoku_core::{Email, ProductId, ReviewId};

/// Lowest and highest star rating.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Longest accepted comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 2000;

/// A customer's rating and comment on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub author: Email,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Input for posting a review.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    /// Check the rating and comment.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if !RATING_RANGE.contains(&self.rating) {
            return Err(format!(
                "rating must be between {} and {}",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            ));
        }
        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err("comment is required".to_string());
        }
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(format!(
                "comment cannot be longer than {MAX_COMMENT_CHARS} characters"
            ));
        }
        Ok(())
    }
}

/// A product's reviews, newest first, with their average rating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Mean rating rounded to one decimal; `0.0` without reviews.
    pub average_rating: f64,
    pub review_count: u32,
    pub reviews: Vec<Review>,
}

impl ReviewSummary {
    #[must_use]
    pub fn new(reviews: Vec<Review>) -> Self {
        let review_count = u32::try_from(reviews.len()).unwrap_or(u32::MAX);
        let stars = reviews
            .iter()
            .fold(0_u32, |acc, r| acc.saturating_add(u32::from(r.rating)));
        let average_rating = if review_count == 0 {
            0.0
        } else {
            (f64::from(stars) / f64::from(review_count) * 10.0).round() / 10.0
        };

        Self {
            average_rating,
            review_count,
            reviews,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn review(rating: u8) -> Review {
        Review {
            id: ReviewId::new(1),
            product_id: ProductId::new(1),
            author: Email::parse("a@x.com").unwrap(),
            rating,
            comment: "enak".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_review_validation() {
        let mut input: NewReview =
            serde_json::from_str(r#"{"rating":5,"comment":"Mantap"}"#).unwrap();
        assert!(input.validate().is_ok());

        input.rating = 0;
        assert_eq!(
            input.validate(),
            Err("rating must be between 1 and 5".to_string())
        );
        input.rating = 6;
        assert!(input.validate().is_err());

        input.rating = 3;
        input.comment = "  ".to_string();
        assert_eq!(input.validate(), Err("comment is required".to_string()));

        input.comment = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_summary_average() {
        let summary = ReviewSummary::new(vec![review(5), review(4), review(4)]);
        assert_eq!(summary.review_count, 3);
        assert!((summary.average_rating - 4.3).abs() < f64::EPSILON);

        let empty = ReviewSummary::new(Vec::new());
        assert_eq!(empty.review_count, 0);
        assert!(empty.average_rating.abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_json_shape() {
        let json = serde_json::to_value(ReviewSummary::new(vec![review(5)])).unwrap();
        assert_eq!(json["averageRating"], 5.0);
        assert_eq!(json["reviewCount"], 1);
        assert_eq!(json["reviews"][0]["author"], "a@x.com");
        assert_eq!(json["reviews"][0]["productId"], 1);
    }
}
