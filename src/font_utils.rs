//! System font discovery by family name.

use bagview_compose::FontResolver;
use tracing::debug;

/// Candidate font files tried for any family when no specific match
/// exists. Ordered by how common they are on each platform.
const GENERIC_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Bold.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/google-noto/NotoSans-Regular.ttf",
    // macOS
    "/System/Library/Fonts/Helvetica.ttc",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/SFNSText.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Family-specific candidates, preferred over the generic list. Bold
/// cuts come first: labels are printed in a bold weight.
fn family_candidates(family: &str) -> &'static [&'static str] {
    match family.to_ascii_lowercase().as_str() {
        "arial" | "helvetica" => &[
            "/Library/Fonts/Arial Bold.ttf",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
            "C:\\Windows\\Fonts\\arialbd.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        ],
        "courier" | "courier new" => &[
            "C:\\Windows\\Fonts\\courbd.ttf",
            "C:\\Windows\\Fonts\\cour.ttf",
            "/System/Library/Fonts/Courier.ttc",
            "/usr/share/fonts/truetype/liberation/LiberationMono-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
        ],
        "times" | "times new roman" | "georgia" => &[
            "C:\\Windows\\Fonts\\timesbd.ttf",
            "C:\\Windows\\Fonts\\times.ttf",
            "/System/Library/Fonts/Times.ttc",
            "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
        ],
        "impact" | "verdana" => &[
            "C:\\Windows\\Fonts\\impact.ttf",
            "C:\\Windows\\Fonts\\verdanab.ttf",
            "C:\\Windows\\Fonts\\verdana.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        ],
        _ => &[],
    }
}

/// Resolves family names against installed system fonts.
///
/// Unknown families fall through to the generic candidate list, so any
/// machine with a usable sans font keeps rendering; resolution only
/// fails on a truly fontless system.
pub struct SystemFontResolver;

impl FontResolver for SystemFontResolver {
    fn resolve(&self, family: &str) -> Option<Vec<u8>> {
        let specific = family_candidates(family);
        for path in specific.iter().chain(GENERIC_CANDIDATES) {
            if let Ok(bytes) = std::fs::read(path) {
                debug!(family, path, "font family resolved");
                return Some(bytes);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_families_have_specific_candidates() {
        assert!(!family_candidates("Arial").is_empty());
        assert!(!family_candidates("courier new").is_empty());
        assert!(family_candidates("Wingdings 3").is_empty());
    }

    #[test]
    fn unknown_family_falls_back_to_generic_fonts() {
        let resolver = SystemFontResolver;
        // Equal outcomes: either this machine has fonts (both resolve)
        // or it has none (both fail). The unknown family never errors
        // differently from a known one.
        let known = resolver.resolve("Arial").is_some();
        let unknown = resolver.resolve("No Such Family").is_some();
        assert_eq!(known, unknown);
    }
}
