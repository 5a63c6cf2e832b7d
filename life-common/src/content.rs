use crate::colour::Colour;
use crate::{DEFAULT_COLOUR, DEFAULT_PALETTE_SLOTS};
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

/// The subset of the page's content document the background cares about.
/// Every case may carry a `colour`; anything else in the document is ignored.
#[derive(Deserialize, Debug, Default)]
struct ContentDocument {
    #[serde(default)]
    cases: Option<Vec<serde_json::Value>>,
}

/// Ordered highlight colours for the youngest live cells, plus the colour
/// every other live cell is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightPalette {
    colours: Vec<Colour>,
    default_colour: Colour,
}

impl HighlightPalette {
    pub fn new(colours: Vec<Colour>, default_colour: Colour) -> Self {
        HighlightPalette { colours, default_colour }
    }

    /// `slots` copies of the default colour, used until (or instead of) a palette document.
    pub fn fallback(default_colour: Colour, slots: usize) -> Self {
        HighlightPalette { colours: vec![default_colour; slots], default_colour }
    }

    /// Builds the palette from the content document's `cases[*].colour`.
    ///
    /// A document that cannot be parsed, or that has no `cases` array, yields
    /// the fallback palette. A case whose colour is missing or unreadable gets
    /// the default colour in its slot.
    pub fn from_content_json(text: &str, default_colour: Colour, fallback_slots: usize) -> Self {
        let document: ContentDocument = match serde_json::from_str(text) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Palette document is malformed ({}); using default palette.", e);
                return Self::fallback(default_colour, fallback_slots);
            }
        };

        let Some(cases) = document.cases else {
            debug!("Palette document has no cases; using default palette.");
            return Self::fallback(default_colour, fallback_slots);
        };

        let colours = cases
            .iter()
            .enumerate()
            .map(|(i, case)| {
                match case.get("colour").and_then(serde_json::Value::as_str) {
                    Some(raw) => Colour::parse(raw).unwrap_or_else(|| {
                        warn!("Case {} has unreadable colour '{}'; using {}.", i, raw, default_colour);
                        default_colour
                    }),
                    None => default_colour,
                }
            })
            .collect::<Vec<_>>();

        debug!("Loaded {} highlight colours from palette document.", colours.len());
        HighlightPalette { colours, default_colour }
    }

    /// Reads the palette document from disk. A missing or unreadable file is
    /// not an error: the fallback palette is returned and a warning is logged.
    pub fn load<P: AsRef<Path>>(path: P, default_colour: Colour, fallback_slots: usize) -> Self {
        let path_ref = path.as_ref();
        match std::fs::read_to_string(path_ref) {
            Ok(text) => Self::from_content_json(&text, default_colour, fallback_slots),
            Err(e) => {
                warn!("Could not read palette document '{}': {}. Using default palette.", path_ref.display(), e);
                Self::fallback(default_colour, fallback_slots)
            }
        }
    }

    pub fn colours(&self) -> &[Colour] {
        &self.colours
    }

    pub fn len(&self) -> usize {
        self.colours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    pub fn default_colour(&self) -> Colour {
        self.default_colour
    }
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self::fallback(DEFAULT_COLOUR, DEFAULT_PALETTE_SLOTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_case_colours_in_order() {
        let doc = r##"{ "title": "x", "cases": [ { "colour": "#ff0000" }, { "colour": "#00ff00" }, { "colour": "blue" } ] }"##;
        let palette = HighlightPalette::from_content_json(doc, Colour::BLACK, 4);
        assert_eq!(
            palette.colours(),
            &[Colour::new(255, 0, 0), Colour::new(0, 255, 0), Colour::new(0, 0, 255)]
        );
    }

    #[test]
    fn missing_or_bad_case_colour_uses_default_slot() {
        let doc = r##"{ "cases": [ { "name": "no colour" }, { "colour": 12 }, { "colour": "#nothex" }, { "colour": "#fff" } ] }"##;
        let palette = HighlightPalette::from_content_json(doc, Colour::BLACK, 4);
        assert_eq!(palette.colours(), &[Colour::BLACK, Colour::BLACK, Colour::BLACK, Colour::WHITE]);
    }

    #[test]
    fn malformed_document_falls_back() {
        let palette = HighlightPalette::from_content_json("{ not json", Colour::BLACK, 4);
        assert_eq!(palette, HighlightPalette::fallback(Colour::BLACK, 4));
        assert_eq!(palette.len(), 4);
    }

    #[test]
    fn document_without_cases_falls_back() {
        let palette = HighlightPalette::from_content_json(r#"{ "about": "hi" }"#, Colour::WHITE, 2);
        assert_eq!(palette.colours(), &[Colour::WHITE, Colour::WHITE]);
        assert_eq!(palette.default_colour(), Colour::WHITE);
    }

    #[test]
    fn missing_file_falls_back() {
        let palette = HighlightPalette::load("definitely/not/here/content.json", Colour::BLACK, 4);
        assert_eq!(palette, HighlightPalette::default());
    }
}
