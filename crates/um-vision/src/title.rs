use image::{imageops, Rgba, RgbaImage};
use tracing::{debug, error, info, warn};
use um_catalog::{normalize_item_name, ItemCatalog};
use um_result::MatchError;

use crate::corrections::OcrCorrections;
use crate::image_ops::expand_border;
use crate::ocr::OcrEngine;

/// Base reported when an identified title can't be split into name and base
pub const UNDEFINED_BASE: &str = "undefined";

/// Words this short are OCR noise, except these
const SHORT_WORDS: &[&str] = &["OF"];

/// What could be read from an item title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    pub base: String,
    /// File key of the recognized item, empty if unknown
    pub name: String,
}

/// Reads item name and base from the title crop.
pub struct TitleParser {
    ocr: Box<dyn OcrEngine>,
    corrections: OcrCorrections,
    raise_on_unknown_name: bool,
}

impl TitleParser {
    pub fn new(
        ocr: Box<dyn OcrEngine>,
        corrections: OcrCorrections,
        raise_on_unknown_name: bool,
    ) -> Self {
        Self {
            ocr,
            corrections,
            raise_on_unknown_name,
        }
    }

    /// OCR the title image and parse the text.
    pub fn parse_title(
        &self,
        catalog: &ItemCatalog,
        image: &RgbaImage,
        identified: bool,
    ) -> Result<ParsedTitle, MatchError> {
        // Tesseract reads nothing without some margin
        let bordered = expand_border(image, 1, Rgba([255, 255, 255, 255]));
        let raw = self.ocr.image_to_string(&imageops::grayscale(&bordered))?;
        debug!("Raw title: {:?}", raw);

        self.parse_text(catalog, &raw, identified)
    }

    /// Parse raw OCR text into base and item name.
    pub fn parse_text(
        &self,
        catalog: &ItemCatalog,
        raw: &str,
        identified: bool,
    ) -> Result<ParsedTitle, MatchError> {
        let title = clean_title(raw);

        let (name, base) = if identified {
            self.parse_identified(catalog, &title)?
        } else {
            (String::new(), title_case(&title.replace('\n', "")))
        };

        let base = self.corrections.correct_base(&base.replace("Superior ", ""));

        if !catalog.has_base(&base) {
            error!("Cannot detect item base, got: '{}'", base);
            return Err(MatchError::BaseNotRecognized(base));
        }

        info!("Item base: {}", base);
        Ok(ParsedTitle { base, name })
    }

    /// Look the first title line up as an item name. Returns the item's file key,
    /// or an empty string when the name is unknown.
    pub fn find_item_name(&self, catalog: &ItemCatalog, line: &str) -> Result<String, MatchError> {
        let key = normalize_item_name(&title_case(line))
            .replace("_Of_", "_of_")
            .replace("_The_", "_the_")
            .replace("_And_", "_and_")
            .replace("_From_", "_from_");
        let key = self.corrections.correct_item(&lowercase_after_hyphen(&key));

        match catalog.get(&key) {
            Ok(item) => {
                info!("Item name (normalized): {}", key);
                Ok(item.file.clone())
            }
            Err(_) => {
                error!("Couldn't find item name: {}", key);
                if self.raise_on_unknown_name {
                    Err(MatchError::ItemNameNotRecognized(key))
                } else {
                    Ok(String::new())
                }
            }
        }
    }

    fn parse_identified(
        &self,
        catalog: &ItemCatalog,
        title: &str,
    ) -> Result<(String, String), MatchError> {
        let lines: Vec<&str> = title.trim_end_matches('\n').split('\n').collect();
        let name = self.find_item_name(catalog, lines[0])?;

        if let Some(base) = lines.get(1) {
            return Ok((name, title_case(base)));
        }

        // OCR merged name and base onto one line, try the trailing words as base
        warn!("Failed to properly parse identified item name and base");
        let words: Vec<&str> = lines[0].split(' ').collect();
        for n in [3, 2, 1] {
            let candidate = title_case(&words[words.len().saturating_sub(n)..].join(" "));
            if catalog.has_base(&candidate) {
                return Ok((name, candidate));
            }
        }

        Ok((name, UNDEFINED_BASE.to_string()))
    }
}

/// Strip OCR noise from a raw title: non-letters, short words and a possessive
/// "'s" that was read as a separate "S".
pub fn clean_title(raw: &str) -> String {
    let mut title: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || matches!(c, ' ' | '\n' | '-'))
        .collect();

    if title.split(' ').nth(1) == Some("S") {
        title = title.replacen(" S", "S", 1);
    }

    title
        .split('\n')
        .map(|line| {
            line.split_whitespace()
                .filter(|w| w.len() > 2 || SHORT_WORDS.contains(w))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Uppercase the first letter of every letter run, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// "Three-Step_Assault" -> "Three-step_Assault"
fn lowercase_after_hyphen(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut after_hyphen = false;
    for c in s.chars() {
        if after_hyphen {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        after_hyphen = c == '-';
    }
    out
}
