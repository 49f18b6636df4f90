//! Resolution of encoding labels to encodings and decoding of byte slices.
//!
//! Labels are resolved using the [WHATWG Encoding Standard] label table, as
//! implemented by the [`encoding_rs`] crate. The name of a resolved encoding
//! ([`Encoding::name()`]) is its canonical name, for example `"UTF-8"`,
//! `"Shift_JIS"` or `"windows-1252"`.
//!
//! [WHATWG Encoding Standard]: https://encoding.spec.whatwg.org/#names-and-labels

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, X_USER_DEFINED};

/// Unicode "byte order mark" encoded as UTF-8
pub(crate) const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
/// Unicode "byte order mark" encoded as UTF-16 with little-endian byte order
pub(crate) const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
/// Unicode "byte order mark" encoded as UTF-16 with big-endian byte order
pub(crate) const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Returns the encoding for the specified label, or `None` if the label is
/// not recognized.
///
/// Matching is ASCII case-insensitive and surrounding ASCII whitespace is
/// ignored. The `x-user-defined` label resolves to `windows-1252`, the
/// encoding which decodes every byte to a character.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use encoding_sniffer::encoding::resolve;
///
/// assert_eq!(resolve(b" Shift_JIS ").map(|e| e.name()), Some("Shift_JIS"));
/// assert_eq!(resolve(b"latin1").map(|e| e.name()), Some("windows-1252"));
/// assert_eq!(resolve(b"X-User-Defined").map(|e| e.name()), Some("windows-1252"));
/// assert_eq!(resolve(b"klingon"), None);
/// ```
pub fn resolve(label: &[u8]) -> Option<&'static Encoding> {
    match Encoding::for_label(label) {
        Some(encoding) if encoding == X_USER_DEFINED => Some(WINDOWS_1252),
        encoding => encoding,
    }
}

/// Returns `true` for the UTF-16 encodings, which a document can only
/// declare by its first bytes, but never in its markup.
#[inline]
pub(crate) fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16LE || encoding == UTF_16BE
}

/// Decodes the provided bytes using the specified encoding. A BOM, if present,
/// is decoded as a regular character.
///
/// Malformed sequences are replaced with the REPLACEMENT CHARACTER (U+FFFD),
/// as browsers do, so this function never fails.
pub fn decode<'b>(bytes: &'b [u8], encoding: &'static Encoding) -> Cow<'b, str> {
    encoding.decode_without_bom_handling(bytes).0
}

/// Decodes the provided bytes using the specified encoding, removing the BOM
/// if it is present and belongs to the `encoding`.
///
/// Malformed sequences are replaced with the REPLACEMENT CHARACTER (U+FFFD).
pub fn decode_with_bom_removal<'b>(bytes: &'b [u8], encoding: &'static Encoding) -> Cow<'b, str> {
    decode(remove_bom(bytes, encoding), encoding)
}

pub(crate) fn split_at_bom<'b>(
    bytes: &'b [u8],
    encoding: &'static Encoding,
) -> (&'b [u8], &'b [u8]) {
    if encoding == UTF_8 && bytes.starts_with(UTF8_BOM) {
        bytes.split_at(3)
    } else if encoding == UTF_16LE && bytes.starts_with(UTF16_LE_BOM) {
        bytes.split_at(2)
    } else if encoding == UTF_16BE && bytes.starts_with(UTF16_BE_BOM) {
        bytes.split_at(2)
    } else {
        (&[], bytes)
    }
}

pub(crate) fn remove_bom<'b>(bytes: &'b [u8], encoding: &'static Encoding) -> &'b [u8] {
    let (_, bytes) = split_at_bom(bytes, encoding);
    bytes
}
