use std::fmt::{self, Debug, Formatter};

/// Writes a byte string in a human-readable form: printable ASCII as is,
/// everything else as hexadecimal escapes.
pub fn write_byte_string(f: &mut Formatter<'_>, byte_string: &[u8]) -> fmt::Result {
    write!(f, "\"")?;
    for b in byte_string {
        match *b {
            32..=33 | 35..=126 => write!(f, "{}", *b as char)?,
            34 => write!(f, "\\\"")?,
            _ => write!(f, "{:#02X}", b)?,
        }
    }
    write!(f, "\"")?;
    Ok(())
}

/// Wrapper around a byte slice which `Debug` output is a string (see
/// [`write_byte_string`]) instead of a list of numbers. Used in log messages
/// and in the `Debug` implementation of the sniffer.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bytes<'a>(pub &'a [u8]);

impl<'a> Debug for Bytes<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_byte_string(f, self.0)
    }
}

/// ASCII whitespace as understood by the HTML tokenizer: TAB, LF, FF, CR and SPACE.
#[inline]
pub(crate) const fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

#[inline]
pub(crate) const fn is_quote(b: u8) -> bool {
    matches!(b, b'"' | b'\'')
}

/// Bytes that terminate an unquoted attribute value and the tag it belongs to.
#[inline]
pub(crate) const fn is_end_of_unquoted_value(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'/' | b'>')
}

/// Bytes that terminate an unquoted `content` value of a `<meta>` tag. `/` is
/// a part of such a value, as in `text/html;charset=koi8-r`.
#[inline]
pub(crate) const fn is_end_of_unquoted_content(b: u8) -> bool {
    is_whitespace(b) || b == b'>'
}
