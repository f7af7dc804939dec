//! Credit unit (CU) pricing of consultation time.

/// Quarter-hours per hour; CU is billed in quarters.
const QUARTERS_PER_HOUR: i64 = 4;

/// Calls longer than this always bill at least one full CU.
const FULL_CU_THRESHOLD_MINUTES: i64 = 52;

/// Compute credit units for a call of `duration_minutes`.
///
/// Rounds up to the next quarter hour. Anything over 52 minutes bills at
/// least 1.0 CU; non-positive durations bill nothing.
pub fn calculate_cu(duration_minutes: i64) -> f64 {
    if duration_minutes <= 0 {
        return 0.0;
    }
    // Integer ceil of minutes * 4 / 60 avoids float drift at quarter boundaries.
    let quarters = (duration_minutes * QUARTERS_PER_HOUR + 59) / 60;
    let cu = quarters as f64 / QUARTERS_PER_HOUR as f64;
    if duration_minutes > FULL_CU_THRESHOLD_MINUTES {
        cu.max(1.0)
    } else {
        cu
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_negative_bill_nothing() {
        assert_eq!(calculate_cu(0), 0.0);
        assert_eq!(calculate_cu(-15), 0.0);
    }

    #[test]
    fn half_hour_is_half_a_cu() {
        assert_eq!(calculate_cu(30), 0.5);
    }

    #[test]
    fn rounds_up_to_next_quarter() {
        assert_eq!(calculate_cu(1), 0.25);
        assert_eq!(calculate_cu(15), 0.25);
        assert_eq!(calculate_cu(16), 0.5);
        assert_eq!(calculate_cu(61), 1.25);
        assert_eq!(calculate_cu(90), 1.5);
    }

    #[test]
    fn around_the_hour_mark() {
        assert_eq!(calculate_cu(45), 0.75);
        assert_eq!(calculate_cu(52), 1.0);
        assert!(calculate_cu(53) >= 1.0);
        assert_eq!(calculate_cu(60), 1.0);
    }
}
