//! Property-based tests for the greedy shrink-to-fit loop
//!
//! Validates the sizing invariants:
//! - Text that fits at the base size is never shrunk
//! - Shrunk sizes are the largest step-multiple that fits
//! - The floor size is an accepted lower bound, even when overflowing

use bagview_compose::fit_font_size;
use proptest::prelude::*;

proptest! {
    /// Property: fitting text keeps the base size unchanged.
    #[test]
    fn no_unnecessary_shrink(
        base in 100.0f32..600.0,
        width_per_px in 0.1f32..3.0,
    ) {
        let max_width = base * width_per_px + 1.0;
        let size = fit_font_size(|px| px * width_per_px, base, 4.0, 80.0, max_width);
        prop_assert_eq!(size, base);
    }

    /// Property: the result is the largest `base - k*step` that fits,
    /// or the floor when none does (linear measure, so the first size
    /// at or under `max_width / width_per_px` fits).
    #[test]
    fn shrink_lands_on_largest_fitting_step(
        width_per_px in 0.5f32..5.0,
        max_width in 100.0f32..900.0,
    ) {
        let base = 500.0;
        let step = 4.0;
        let floor = 80.0;
        let measure = |px: f32| px * width_per_px;
        let size = fit_font_size(measure, base, step, floor, max_width);

        prop_assert!(size <= base);
        prop_assert!(size >= floor);
        if size < base {
            // One step larger must have overflowed.
            let previous = (size + step).min(base);
            prop_assert!(measure(previous) > max_width);
        }
        if measure(size) > max_width {
            // Still overflowing is only legal at the floor.
            prop_assert_eq!(size, floor);
        }
    }

    /// Property: the result is always reachable from the base by whole
    /// steps, or is exactly the floor.
    #[test]
    fn result_is_step_aligned_or_floor(
        width_per_px in 0.5f32..5.0,
        max_width in 50.0f32..900.0,
    ) {
        let base = 500.0;
        let step = 4.0;
        let floor = 80.0;
        let size = fit_font_size(|px| px * width_per_px, base, step, floor, max_width);

        let steps = (base - size) / step;
        let aligned = (steps - steps.round()).abs() < 1e-3;
        prop_assert!(aligned || size == floor);
    }
}
