//! Unit conversions applied to upstream readings.

/// Convert degrees Fahrenheit to degrees Celsius.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Convert an API temperature in tenths of a degree Fahrenheit to Celsius.
pub fn tenths_fahrenheit_to_celsius(tenths: f64) -> f64 {
    fahrenheit_to_celsius(tenths / 10.0)
}

pub fn minutes_to_hours(minutes: f64) -> f64 {
    minutes / 60.0
}

pub fn seconds_to_hours(seconds: f64) -> f64 {
    seconds / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_fahrenheit_to_celsius_fixed_points() {
        assert!((fahrenheit_to_celsius(32.0) - 0.0).abs() < EPSILON);
        assert!((fahrenheit_to_celsius(212.0) - 100.0).abs() < EPSILON);
        assert!((fahrenheit_to_celsius(-40.0) - -40.0).abs() < EPSILON);
        assert!((fahrenheit_to_celsius(68.0) - 20.0).abs() < EPSILON);
    }

    #[test]
    fn test_tenths_match_standard_formula() {
        for tenths in -500..=1500 {
            let t = f64::from(tenths);
            let expected = (t / 10.0 - 32.0) * 5.0 / 9.0;
            assert!(
                (tenths_fahrenheit_to_celsius(t) - expected).abs() < EPSILON,
                "mismatch at {}",
                tenths
            );
        }
    }

    #[test]
    fn test_time_conversions() {
        assert_eq!(minutes_to_hours(120.0), 2.0);
        assert_eq!(minutes_to_hours(90.0), 1.5);
        assert_eq!(seconds_to_hours(3600.0), 1.0);
        assert_eq!(seconds_to_hours(5400.0), 1.5);
        assert_eq!(seconds_to_hours(0.0), 0.0);
    }
}
