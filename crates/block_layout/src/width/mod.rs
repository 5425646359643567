//! Text Width Measurement
//!
//! Column widths are never taken from byte lengths. The caller injects a
//! [`TextWidth`] implementation once per top-level call; the solver asks it
//! for the width of every text and verbatim line exactly once per call.
//!
//! Any `Fn(&str) -> Result<usize, WidthError>` closure is a width function,
//! so East Asian width tables or grapheme-aware measurement can be plugged
//! in without a wrapper type.


use crate::error::WidthError;

/// Maps a text fragment to the number of columns it occupies.
pub trait TextWidth {
    /// Measure `text`. The result must depend on `text` alone.
    fn width(&self, text: &str) -> Result<usize, WidthError>;
}

impl<F> TextWidth for F
where
    F: Fn(&str) -> Result<usize, WidthError>,
{
    #[inline]
    fn width(&self, text: &str) -> Result<usize, WidthError> {
        self(text)
    }
}

/// One column per `char`.
///
/// Correct for ASCII and most alphabetic scripts; wide characters and
/// combining marks need a table-driven width function instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharCount;

impl TextWidth for CharCount {
    #[inline]
    fn width(&self, text: &str) -> Result<usize, WidthError> {
        Ok(text.chars().count())
    }
}

/// One column per `char`, rejecting control characters.
///
/// Tabs and other control characters have no fixed width, so measuring them
/// would silently skew every cost comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrictCharCount;

impl TextWidth for StrictCharCount {
    fn width(&self, text: &str) -> Result<usize, WidthError> {
        if let Some(c) = text.chars().find(|c| c.is_control()) {
            return Err(WidthError::unmeasurable(
                text,
                format!("control character {c:?} has no column width"),
            ));
        }
        Ok(text.chars().count())
    }
}
