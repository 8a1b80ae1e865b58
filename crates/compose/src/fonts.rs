//! Font loading keyed by family name.

use std::collections::HashMap;
use std::sync::Arc;

use fontdue::{Font, FontSettings};
use tracing::debug;

use crate::ComposeError;

/// Maps a family name (e.g. `"Arial"`) to raw font bytes.
///
/// The view plugs in a system-font resolver; tests can supply fixed
/// bytes.
pub trait FontResolver: Send + Sync {
    /// Return the font file contents for `family`, or `None` when the
    /// family cannot be located.
    fn resolve(&self, family: &str) -> Option<Vec<u8>>;
}

/// Caches parsed [`fontdue::Font`] instances per family and tracks the
/// active selection.
///
/// Selection failures leave the previously active font in place, so a
/// bad SET_FONT never blanks existing labels.
pub struct FontStore {
    resolver: Box<dyn FontResolver>,
    cache: HashMap<String, Arc<Font>>,
    active: Option<Arc<Font>>,
    active_family: Option<String>,
}

impl FontStore {
    /// Create an empty store around a resolver.
    pub fn new(resolver: Box<dyn FontResolver>) -> Self {
        Self {
            resolver,
            cache: HashMap::new(),
            active: None,
            active_family: None,
        }
    }

    /// Resolve, parse and activate `family`.
    ///
    /// On error the previous selection stays active.
    pub fn select(&mut self, family: &str) -> Result<Arc<Font>, ComposeError> {
        if let Some(font) = self.cache.get(family) {
            let font = Arc::clone(font);
            self.activate(family, &font);
            return Ok(font);
        }

        let bytes = self
            .resolver
            .resolve(family)
            .ok_or_else(|| ComposeError::UnresolvedFamily(family.to_string()))?;
        let font = Font::from_bytes(bytes, FontSettings::default()).map_err(|reason| {
            ComposeError::FontParse {
                family: family.to_string(),
                reason: reason.to_string(),
            }
        })?;

        let font = Arc::new(font);
        self.cache.insert(family.to_string(), Arc::clone(&font));
        self.activate(family, &font);
        Ok(font)
    }

    fn activate(&mut self, family: &str, font: &Arc<Font>) {
        if self.active_family.as_deref() != Some(family) {
            debug!(family, "font activated");
        }
        self.active = Some(Arc::clone(font));
        self.active_family = Some(family.to_string());
    }

    /// Currently active font, if any selection ever succeeded.
    pub fn active(&self) -> Option<Arc<Font>> {
        self.active.as_ref().map(Arc::clone)
    }

    /// Family name of the active font.
    pub fn active_family(&self) -> Option<&str> {
        self.active_family.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyResolver;

    impl FontResolver for EmptyResolver {
        fn resolve(&self, _family: &str) -> Option<Vec<u8>> {
            None
        }
    }

    struct GarbageResolver;

    impl FontResolver for GarbageResolver {
        fn resolve(&self, _family: &str) -> Option<Vec<u8>> {
            Some(vec![0xde, 0xad, 0xbe, 0xef])
        }
    }

    #[test]
    fn unresolved_family_is_an_error_and_keeps_no_active() {
        let mut store = FontStore::new(Box::new(EmptyResolver));
        let err = store.select("Arial").unwrap_err();
        assert!(matches!(err, ComposeError::UnresolvedFamily(_)));
        assert!(store.active().is_none());
        assert!(store.active_family().is_none());
    }

    #[test]
    fn unparseable_font_data_is_an_error() {
        let mut store = FontStore::new(Box::new(GarbageResolver));
        let err = store.select("Arial").unwrap_err();
        assert!(matches!(err, ComposeError::FontParse { .. }));
        assert!(store.active().is_none());
    }
}
