use std::borrow::Cow;

/// Marker appended to text cut short by [`truncate_chars`].
pub const ELLIPSIS: &str = "…";

/// Truncates a string to at most `max_chars` characters (Unicode scalar values).
///
/// If truncation is necessary, the first `max_chars` characters are kept and
/// [`ELLIPSIS`] is appended, so the result is `max_chars + 1` characters long.
/// A string of exactly `max_chars` characters is returned unchanged.
///
/// # Returns
///
/// - `Cow::Borrowed(s)` if the string fits (no allocation)
/// - `Cow::Owned` with the truncated text and ellipsis otherwise
///
/// Cutting on `char` boundaries means multi-byte text never panics, though a
/// combining sequence may be split.
///
/// # Examples
///
/// ```
/// use podcast_cards::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 5), "Hello…");
/// assert_eq!(truncate_chars("12345", 5), "12345");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        // There is a character past the budget: cut right before it
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
        None => Cow::Borrowed(s),
    }
}
