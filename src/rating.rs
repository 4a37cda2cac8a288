use crate::error::AppError;

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Mean of the given ratings, one decimal. An empty set rates 0.0.
pub fn average_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));

    if count == 0 {
        0.0
    } else {
        round_to_tenth(sum / count as f64)
    }
}

/// Checks a submitted review rating and rounds it to one decimal.
pub fn normalize_rating(rating: f64) -> Result<f64, AppError> {
    if !rating.is_finite() || !(1.0..=5.0).contains(&rating) {
        return Err(AppError::validation("rating must be between 1 and 5"));
    }
    Ok(round_to_tenth(rating))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_is_zero() {
        assert_eq!(average_rating(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        assert_eq!(average_rating([4.0, 5.0, 4.0]), 4.3);
        assert_eq!(average_rating([3.5]), 3.5);
    }

    #[test]
    fn rating_bounds() {
        assert_eq!(normalize_rating(4.26).unwrap(), 4.3);
        assert!(normalize_rating(0.5).is_err());
        assert!(normalize_rating(5.1).is_err());
        assert!(normalize_rating(f64::NAN).is_err());
    }
}
