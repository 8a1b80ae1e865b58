//! Property-based tests for color parsing
//!
//! The command protocol is permissive end to end, so the parser gets
//! fed arbitrary controller-supplied strings and must never panic.

use bagview_scene::Rgba;
use proptest::prelude::*;

proptest! {
    /// Property: parsing never panics, whatever the input.
    #[test]
    fn from_hex_is_total(input in ".*") {
        let _ = Rgba::from_hex(&input);
    }

    /// Property: every six-digit hex string round-trips through the
    /// parsed channels.
    #[test]
    fn six_digit_hex_round_trips(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
        let parsed = Rgba::from_hex(&format!("#{r:02x}{g:02x}{b:02x}")).expect("valid hex");
        prop_assert_eq!(parsed.to_rgba8(), [r, g, b, 255]);
    }

    /// Property: leading `#` and case never change the result.
    #[test]
    fn prefix_and_case_are_insignificant(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
        let plain = Rgba::from_hex(&format!("{r:02x}{g:02x}{b:02x}")).expect("valid");
        let upper = Rgba::from_hex(&format!("#{r:02X}{g:02X}{b:02X}")).expect("valid");
        prop_assert_eq!(plain.to_rgba8(), upper.to_rgba8());
    }
}
