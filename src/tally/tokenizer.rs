//! Whitespace tokenizer over raw document bytes
//!
//! Content is treated as UTF-8 where it decodes and as opaque bytes where it
//! doesn't. A character splits tokens only if it is Unicode whitespace; an
//! invalid byte never does, so malformed input still yields every token.

/// Split `content` into tokens separated by runs of whitespace
pub fn tokens(content: &[u8]) -> Tokens<'_> {
    Tokens { rest: content }
}

/// Lazy iterator over the tokens of a byte slice
///
/// Cloning forks the iterator at its current position. Calling [`tokens`]
/// again on the same content starts over.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let start = skip_while_space(self.rest, true);
        let rest = &self.rest[start..];
        if rest.is_empty() {
            self.rest = rest;
            return None;
        }

        let end = skip_while_space(rest, false);
        let (token, remaining) = rest.split_at(end);
        self.rest = remaining;
        Some(token)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rest.is_empty() {
            (0, Some(0))
        } else {
            (0, Some(self.rest.len().div_ceil(2)))
        }
    }
}

impl std::iter::FusedIterator for Tokens<'_> {}

/// Offset of the first position where whitespace-ness differs from `space`
fn skip_while_space(bytes: &[u8], space: bool) -> usize {
    let mut offset = 0;
    while offset < bytes.len() {
        let (is_space, width) = classify(&bytes[offset..]);
        if is_space != space {
            break;
        }
        offset += width;
    }
    offset
}

/// Whether the character at the start of `bytes` is whitespace, and its width
fn classify(bytes: &[u8]) -> (bool, usize) {
    let lead = bytes[0];
    if lead.is_ascii() {
        // \v is whitespace too, which u8::is_ascii_whitespace leaves out
        return (lead.is_ascii_whitespace() || lead == 0x0b, 1);
    }

    let width = match lead {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return (false, 1),
    };
    if bytes.len() < width {
        return (false, 1);
    }
    match std::str::from_utf8(&bytes[..width]) {
        Ok(s) => (s.chars().all(char::is_whitespace), width),
        Err(_) => (false, 1),
    }
}
