//! Width-aware text helpers for rendering server-supplied strings.
//!
//! Titles, feed names and article bodies come from arbitrary third-party
//! sources. Everything shown in the terminal passes through
//! [`strip_control_chars`] first, and anything placed in a fixed-width cell
//! through [`truncate_to_width`].
use std::borrow::Cow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Terminal column width of `s`. CJK and emoji count as two columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max_width` columns, appending `...` when cut.
///
/// Never splits a wide character. Widths of three or less get no ellipsis,
/// just as many characters as fit. Borrows when nothing is cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    if max_width <= ELLIPSIS_WIDTH {
        let end = prefix_end(s, max_width);
        return if end == s.len() {
            Cow::Borrowed(s)
        } else {
            Cow::Owned(s[..end].to_string())
        };
    }

    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let end = prefix_end(s, max_width - ELLIPSIS_WIDTH);
    Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
}

/// Pad `s` with spaces on the right to exactly `width` columns, truncating
/// first if it is wider.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let truncated = truncate_to_width(s, width);
    let used = display_width(&truncated);
    let mut out = truncated.into_owned();
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Byte index of the longest prefix of `s` that fits in `max_width` columns.
fn prefix_end(s: &str, max_width: usize) -> usize {
    let mut width = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width {
            break;
        }
        width += w;
        end = idx + c.len_utf8();
    }
    end
}

fn is_stripped_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Drops C0 controls other than tab, newline and carriage return, DEL,
/// CSI sequences (`ESC [` ... final byte), OSC sequences (`ESC ]` ... BEL or
/// `ESC \`), and any other bare ESC. Borrows when the input is clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| b == 0x1b || is_stripped_control(b)) {
        return Cow::Borrowed(s);
    }

    let len = bytes.len();
    let mut out = String::with_capacity(len);
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    i += 2;
                    while i < len {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    i += 2;
                    while i < len {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_stripped_control(b) {
            i += 1;
        } else {
            let start = i;
            i += 1;
            while i < len && bytes[i] != 0x1b && !is_stripped_control(bytes[i]) {
                i += 1;
            }
            // Only ASCII bytes end a run, so the slice stays on char boundaries.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

/// Strip control characters and collapse all whitespace runs to single
/// spaces. Used for one-line cells such as titles and feed names.
pub fn single_line(s: &str) -> String {
    strip_control_chars(s)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
