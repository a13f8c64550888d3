//! Request field validation, applied before any store call.

use crate::errors::CatalogError;

/// Lowest accepted film rating.
pub const RATING_MIN: f64 = 0.0;

/// Highest accepted film rating.
pub const RATING_MAX: f64 = 10.0;

/// Film title length bounds in characters.
pub const TITLE_MIN_CHARS: usize = 1;
pub const TITLE_MAX_CHARS: usize = 150;

/// Longest accepted film description in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Actor name length bounds in characters.
pub const ACTOR_NAME_MIN_CHARS: usize = 1;
pub const ACTOR_NAME_MAX_CHARS: usize = 100;

/// Checks a string's character count against an inclusive range.
fn validate_chars(
    value: &str,
    min: usize,
    max: usize,
    field: &'static str,
) -> Result<(), CatalogError> {
    let chars = value.chars().count();
    if chars < min || chars > max {
        return Err(CatalogError::Validation(format!(
            "{field} must be {min}-{max} characters, got {chars}"
        )));
    }
    Ok(())
}

/// Validates a film rating.
pub fn validate_rating(rating: f64) -> Result<(), CatalogError> {
    if !(RATING_MIN..=RATING_MAX).contains(&rating) {
        return Err(CatalogError::Validation(format!(
            "rating must be between {RATING_MIN} and {RATING_MAX}"
        )));
    }
    Ok(())
}

/// Validates a film title.
pub fn validate_title(title: &str) -> Result<(), CatalogError> {
    validate_chars(title, TITLE_MIN_CHARS, TITLE_MAX_CHARS, "title")
}

/// Validates a film description.
pub fn validate_description(description: &str) -> Result<(), CatalogError> {
    validate_chars(description, 0, DESCRIPTION_MAX_CHARS, "description")
}

/// Validates the writable fields of a new film.
pub fn validate_film(title: &str, description: &str, rating: f64) -> Result<(), CatalogError> {
    validate_rating(rating)?;
    validate_title(title)?;
    validate_description(description)
}

/// Validates an actor's name.
pub fn validate_actor_name(name: &str) -> Result<(), CatalogError> {
    validate_chars(name, ACTOR_NAME_MIN_CHARS, ACTOR_NAME_MAX_CHARS, "name")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_film_passes() {
        assert!(validate_film("Heat", "Crime drama", 8.3).is_ok());
        assert!(validate_film("H", "", RATING_MIN).is_ok());
        assert!(validate_film(&"t".repeat(TITLE_MAX_CHARS), "d", RATING_MAX).is_ok());
    }

    #[test]
    fn test_rating_out_of_range() {
        for rating in [-0.1, 10.1, f64::NAN] {
            let result = validate_film("Heat", "d", rating);
            assert!(
                matches!(result, Err(CatalogError::Validation(_))),
                "rating {rating} should fail"
            );
        }
    }

    #[test]
    fn test_title_bounds() {
        assert!(matches!(
            validate_film("", "d", 5.0),
            Err(CatalogError::Validation(_))
        ));
        assert!(matches!(
            validate_film(&"t".repeat(TITLE_MAX_CHARS + 1), "d", 5.0),
            Err(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn test_description_too_long() {
        let result = validate_film("Heat", &"d".repeat(DESCRIPTION_MAX_CHARS + 1), 5.0);
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[test]
    fn test_multibyte_counts_characters_not_bytes() {
        // 100 two-byte characters is within the 100-char limit.
        let name = "ё".repeat(ACTOR_NAME_MAX_CHARS);
        assert!(validate_actor_name(&name).is_ok());
        assert!(validate_actor_name(&format!("{name}ё")).is_err());
    }

    #[test]
    fn test_actor_name_bounds() {
        assert!(validate_actor_name("Al Pacino").is_ok());
        assert!(matches!(
            validate_actor_name(""),
            Err(CatalogError::Validation(_))
        ));
    }
}
