//! Incremental implementation of the WHATWG [prescan] algorithm.
//!
//! A [`Sniffer`] is fed with the first bytes of a document, in one or several
//! chunks, and determines the encoding of the document from, in priority order:
//!
//! - a byte order mark (BOM);
//! - an encoding supplied by the user or by the transport layer (see [`Config`]);
//! - the first bytes of a UTF-16 encoded XML declaration (`<?x`);
//! - the `charset` attribute of a `<meta>` tag, or its `content` attribute
//!   when the same tag has `http-equiv="content-type"`;
//! - the `encoding` of an XML declaration;
//! - the default encoding, `windows-1252` unless configured otherwise.
//!
//! Only the first [`Config::max_bytes`] bytes of a document are inspected.
//! Sniffing never fails: malformed markup and unknown labels are skipped.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use encoding_sniffer::{ResultType, Sniffer};
//!
//! let mut sniffer = Sniffer::new();
//! sniffer.write(b"<!DOCTYPE html><html><head><meta ");
//! // Nothing was found yet
//! assert_eq!(sniffer.encoding().name(), "windows-1252");
//! assert_eq!(sniffer.result_type(), ResultType::Default);
//!
//! sniffer.write(b"charset='koi8-r'></head>");
//! assert_eq!(sniffer.encoding().name(), "KOI8-R");
//! assert_eq!(sniffer.result_type(), ResultType::MetaTag);
//! ```
//!
//! [prescan]: https://html.spec.whatwg.org/multipage/parsing.html#prescan-a-byte-stream-to-determine-its-encoding

use std::fmt;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::encoding::{is_utf16, resolve};
use crate::errors::{Error, Result};
use crate::utils::Bytes;

mod state;

use state::{AttribType, State};

/// The number of bytes inspected by a [`Sniffer`] when not configured otherwise.
pub const DEFAULT_MAX_BYTES: usize = 1024;

/// The kind of evidence that determined the sniffed encoding.
///
/// Variants are ordered by priority: a variant that compares less than another
/// one wins over it. Within one kind, the first found encoding wins.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
pub enum ResultType {
    /// A byte order mark at the very beginning of the document
    Bom = 0,
    /// The encoding specified by the user or by the transport layer, for
    /// example in the `Content-Type` header of an HTTP response
    Passed = 1,
    /// The first bytes of an UTF-16 encoded XML declaration
    XmlPrefix = 2,
    /// A `<meta charset>` or `<meta http-equiv="content-type" content>` tag
    MetaTag = 3,
    /// The `encoding` of an XML declaration, `<?xml encoding="...">`
    XmlEncoding = 4,
    /// Nothing was found, the default encoding is used
    Default = 5,
}

/// A struct that holds a sniffer configuration.
///
/// Labels are resolved using the WHATWG label table; unrecognized labels are
/// ignored. When both [`user_encoding`] and [`transport_layer_encoding_label`]
/// are recognized, [`user_encoding`] wins.
///
/// [`user_encoding`]: Self::user_encoding
/// [`transport_layer_encoding_label`]: Self::transport_layer_encoding_label
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde-types", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde-types", serde(default))]
pub struct Config {
    /// The maximum number of bytes to inspect. Must be positive.
    ///
    /// Default: [`DEFAULT_MAX_BYTES`] (1024)
    pub max_bytes: usize,

    /// The encoding explicitly chosen by the user. Only a byte order mark
    /// takes precedence over it.
    ///
    /// Default: `None`
    pub user_encoding: Option<String>,

    /// The encoding reported by the transport layer, for example the
    /// `charset` parameter of the HTTP `Content-Type` header. Only a byte
    /// order mark takes precedence over it.
    ///
    /// Default: `None`
    pub transport_layer_encoding_label: Option<String>,

    /// The encoding to use when no other evidence was found.
    ///
    /// Default: `None`, which means `windows-1252`
    pub default_encoding: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            user_encoding: None,
            transport_layer_encoding_label: None,
            default_encoding: None,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A byte-driven state machine that determines the encoding of a document
/// from the first bytes of it.
///
/// Feed the document with [`write`] in chunks of any size and read the result
/// with [`encoding`] and [`result_type`] at any time. Splitting the document
/// differently into chunks never changes the result. Bytes after the first
/// [`Config::max_bytes`] bytes are ignored.
///
/// One sniffer should be used for one document.
///
/// [`write`]: Self::write
/// [`encoding`]: Self::encoding
/// [`result_type`]: Self::result_type
#[derive(Clone)]
pub struct Sniffer {
    /// The maximum number of bytes to sniff
    max_bytes: usize,
    /// The number of bytes consumed by all previous calls to `write`
    offset: usize,

    state: State,
    /// Number of already matched bytes of a literal currently being matched
    section_index: usize,
    /// The kind of the attribute of a `<meta>` tag which is currently parsed
    attrib_type: AttribType,
    /// Whether the `http-equiv` attribute of the current `<meta>` tag is
    /// `content-type`. `None` until the attribute is seen.
    got_pragma: Option<bool>,
    /// The charset, found in the `content` attribute of the current `<meta>`
    /// tag before its `http-equiv` attribute was seen.
    needs_pragma: Option<Vec<u8>>,
    in_meta_tag: bool,

    /// Quote that opened the value currently being read, `None` for unquoted
    quote_character: Option<u8>,
    /// Lowercased bytes of the value currently being read
    attribute_value: Vec<u8>,

    encoding: &'static Encoding,
    result_type: ResultType,
}

impl Sniffer {
    /// Creates a sniffer with the default configuration.
    pub fn new() -> Self {
        Self::build(&Config::default())
    }

    /// Creates a sniffer with the specified configuration.
    ///
    /// Returns [`Error::InvalidMaxBytes`] if `config.max_bytes` is zero.
    pub fn with_config(config: Config) -> Result<Self> {
        if config.max_bytes == 0 {
            return Err(Error::InvalidMaxBytes);
        }
        Ok(Self::build(&config))
    }

    fn build(config: &Config) -> Self {
        let mut sniffer = Self {
            max_bytes: config.max_bytes,
            offset: 0,
            state: State::Begin,
            section_index: 0,
            attrib_type: AttribType::None,
            got_pragma: None,
            needs_pragma: None,
            in_meta_tag: false,
            quote_character: None,
            attribute_value: Vec::new(),
            encoding: WINDOWS_1252,
            result_type: ResultType::Default,
        };

        if let Some(label) = &config.user_encoding {
            sniffer.set_result(label.as_bytes(), ResultType::Passed);
        }
        if let Some(label) = &config.transport_layer_encoding_label {
            sniffer.set_result(label.as_bytes(), ResultType::Passed);
        }
        if let Some(label) = &config.default_encoding {
            sniffer.set_result(label.as_bytes(), ResultType::Default);
        }
        sniffer
    }

    /// Feeds the next chunk of the document into the sniffer.
    ///
    /// Only bytes within the first [`max_bytes`] bytes of the document are
    /// inspected, the rest of the chunk is ignored.
    ///
    /// [`max_bytes`]: Self::max_bytes
    pub fn write(&mut self, bytes: &[u8]) {
        let remaining = self.max_bytes.saturating_sub(self.offset);
        let bytes = &bytes[..bytes.len().min(remaining)];

        let mut index = 0;
        while index < bytes.len() {
            if self.state == State::BeforeTag {
                // Nothing matters until the next `<`
                match memchr::memchr(b'<', &bytes[index..]) {
                    Some(i) => index += i,
                    None => break,
                }
            }
            self.step(bytes[index]);
            index += 1;
        }
        self.offset += bytes.len();

        if !bytes.is_empty() && self.is_done() {
            debug!(
                "sniffed {} bytes, encoding is {} ({:?})",
                self.offset,
                self.encoding.name(),
                self.result_type
            );
        }
    }

    /// Returns the best guess of the document encoding made so far.
    ///
    /// Its [name](Encoding::name) is the canonical name of the encoding.
    #[inline]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Returns the kind of evidence which determined the [`encoding`](Self::encoding).
    #[inline]
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    /// Returns the number of bytes inspected so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the maximum number of bytes this sniffer inspects.
    #[inline]
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Returns `true` when the byte budget is exhausted and further calls to
    /// [`write`](Self::write) have no effect.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.offset >= self.max_bytes
    }

    /// Resolves `label` and makes it the new result if `kind` has a higher
    /// priority than the current result. The default result is always replaced.
    fn set_result(&mut self, label: &[u8], kind: ResultType) {
        if self.result_type != ResultType::Default && self.result_type <= kind {
            return;
        }
        let encoding = match resolve(label) {
            Some(encoding) => encoding,
            None => {
                trace!("unrecognized encoding label {:?} ({:?})", Bytes(label), kind);
                return;
            }
        };
        // ASCII bytes of a declaration could not be read if the document
        // were really UTF-16
        let encoding = match kind {
            ResultType::MetaTag | ResultType::XmlEncoding if is_utf16(encoding) => {
                debug!("{} declared by {:?} replaced by UTF-8", encoding.name(), kind);
                UTF_8
            }
            _ => encoding,
        };
        debug!(
            "encoding {} ({:?}) replaces {} ({:?})",
            encoding.name(),
            kind,
            self.encoding.name(),
            self.result_type
        );
        self.encoding = encoding;
        self.result_type = kind;
    }
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sniffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sniffer")
            .field("max_bytes", &self.max_bytes)
            .field("offset", &self.offset)
            .field("state", &self.state)
            .field("section_index", &self.section_index)
            .field("attrib_type", &self.attrib_type)
            .field("got_pragma", &self.got_pragma)
            .field("needs_pragma", &self.needs_pragma.as_deref().map(Bytes))
            .field("in_meta_tag", &self.in_meta_tag)
            .field("quote_character", &self.quote_character.map(char::from))
            .field("attribute_value", &Bytes(&self.attribute_value))
            .field("encoding", &self.encoding.name())
            .field("result_type", &self.result_type)
            .finish()
    }
}

/// Returns the encoding of a document, sniffed with the default configuration.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use encoding_sniffer::get_encoding;
///
/// assert_eq!(get_encoding(b"<meta charset=Shift_JIS>").name(), "Shift_JIS");
/// assert_eq!(get_encoding(b"\xEF\xBB\xBF<meta charset=Shift_JIS>").name(), "UTF-8");
/// assert_eq!(get_encoding(b"<p>plain text</p>").name(), "windows-1252");
/// ```
pub fn get_encoding(bytes: &[u8]) -> &'static Encoding {
    let mut sniffer = Sniffer::new();
    sniffer.write(bytes);
    sniffer.encoding()
}

/// Sniffs the encoding of a document using the specified configuration and
/// returns it together with the kind of evidence which determined it.
///
/// Returns [`Error::InvalidMaxBytes`] if `config.max_bytes` is zero.
pub fn sniff(bytes: &[u8], config: Config) -> Result<(&'static Encoding, ResultType)> {
    let mut sniffer = Sniffer::with_config(config)?;
    sniffer.write(bytes);
    Ok((sniffer.encoding(), sniffer.result_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{ISO_8859_2, KOI8_R, SHIFT_JIS, UTF_16LE, WINDOWS_1251};
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn default_result() {
        let sniffer = Sniffer::new();
        assert_eq!(sniffer.encoding(), WINDOWS_1252);
        assert_eq!(sniffer.result_type(), ResultType::Default);
        assert_eq!(sniffer.offset(), 0);
        assert_eq!(sniffer.max_bytes(), DEFAULT_MAX_BYTES);
        assert!(!sniffer.is_done());
    }

    #[test]
    fn zero_max_bytes() {
        let result = Sniffer::with_config(Config {
            max_bytes: 0,
            ..config()
        });
        match result {
            Err(Error::InvalidMaxBytes) => {}
            x => panic!("Expected `Err(InvalidMaxBytes)`, but got `{:?}`", x),
        }
    }

    #[test]
    fn priorities() {
        assert!(ResultType::Bom < ResultType::Passed);
        assert!(ResultType::Passed < ResultType::XmlPrefix);
        assert!(ResultType::XmlPrefix < ResultType::MetaTag);
        assert!(ResultType::MetaTag < ResultType::XmlEncoding);
        assert!(ResultType::XmlEncoding < ResultType::Default);
    }

    mod configuration {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn default_encoding() {
            let sniffer = Sniffer::with_config(Config {
                default_encoding: Some("ISO-8859-2".into()),
                ..config()
            })
            .unwrap();
            assert_eq!(sniffer.encoding(), ISO_8859_2);
            assert_eq!(sniffer.result_type(), ResultType::Default);
        }

        #[test]
        fn unknown_default_encoding() {
            let sniffer = Sniffer::with_config(Config {
                default_encoding: Some("unknown".into()),
                ..config()
            })
            .unwrap();
            assert_eq!(sniffer.encoding(), WINDOWS_1252);
            assert_eq!(sniffer.result_type(), ResultType::Default);
        }

        /// UTF-16 is trusted when passed, only declarations are not trusted
        #[test]
        fn default_utf16() {
            let sniffer = Sniffer::with_config(Config {
                default_encoding: Some("utf-16le".into()),
                ..config()
            })
            .unwrap();
            assert_eq!(sniffer.encoding(), UTF_16LE);
        }

        #[test]
        fn transport_layer() {
            let sniffer = Sniffer::with_config(Config {
                transport_layer_encoding_label: Some("windows-1251".into()),
                default_encoding: Some("ISO-8859-2".into()),
                ..config()
            })
            .unwrap();
            assert_eq!(sniffer.encoding(), WINDOWS_1251);
            assert_eq!(sniffer.result_type(), ResultType::Passed);
        }

        #[test]
        fn user_wins_over_transport_layer() {
            let sniffer = Sniffer::with_config(Config {
                user_encoding: Some("koi8-r".into()),
                transport_layer_encoding_label: Some("windows-1251".into()),
                ..config()
            })
            .unwrap();
            assert_eq!(sniffer.encoding(), KOI8_R);
            assert_eq!(sniffer.result_type(), ResultType::Passed);
        }

        #[test]
        fn unknown_user_encoding() {
            let sniffer = Sniffer::with_config(Config {
                user_encoding: Some("unknown".into()),
                transport_layer_encoding_label: Some("windows-1251".into()),
                ..config()
            })
            .unwrap();
            assert_eq!(sniffer.encoding(), WINDOWS_1251);
            assert_eq!(sniffer.result_type(), ResultType::Passed);
        }

        #[test]
        fn passed_wins_over_meta() {
            let mut sniffer = Sniffer::with_config(Config {
                transport_layer_encoding_label: Some("windows-1251".into()),
                ..config()
            })
            .unwrap();
            sniffer.write(b"<meta charset=shift_jis>");
            assert_eq!(sniffer.encoding(), WINDOWS_1251);
            assert_eq!(sniffer.result_type(), ResultType::Passed);
        }

        #[test]
        fn bom_wins_over_passed() {
            let mut sniffer = Sniffer::with_config(Config {
                user_encoding: Some("windows-1251".into()),
                ..config()
            })
            .unwrap();
            sniffer.write(b"\xEF\xBB\xBF");
            assert_eq!(sniffer.encoding(), UTF_8);
            assert_eq!(sniffer.result_type(), ResultType::Bom);
        }
    }

    mod set_result {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn first_wins_within_kind() {
            let mut sniffer = Sniffer::new();
            sniffer.set_result(b"shift_jis", ResultType::MetaTag);
            sniffer.set_result(b"koi8-r", ResultType::MetaTag);
            assert_eq!(sniffer.encoding(), SHIFT_JIS);
        }

        #[test]
        fn higher_priority_wins() {
            let mut sniffer = Sniffer::new();
            sniffer.set_result(b"shift_jis", ResultType::XmlEncoding);
            sniffer.set_result(b"koi8-r", ResultType::MetaTag);
            assert_eq!(sniffer.encoding(), KOI8_R);
            assert_eq!(sniffer.result_type(), ResultType::MetaTag);

            sniffer.set_result(b"iso-8859-2", ResultType::XmlEncoding);
            assert_eq!(sniffer.encoding(), KOI8_R);
            assert_eq!(sniffer.result_type(), ResultType::MetaTag);
        }

        #[test]
        fn unknown_label_is_ignored() {
            let mut sniffer = Sniffer::new();
            sniffer.set_result(b"not-an-encoding", ResultType::MetaTag);
            assert_eq!(sniffer.encoding(), WINDOWS_1252);
            assert_eq!(sniffer.result_type(), ResultType::Default);
        }

        #[test]
        fn utf16_declarations_become_utf8() {
            for kind in [ResultType::MetaTag, ResultType::XmlEncoding] {
                let mut sniffer = Sniffer::new();
                sniffer.set_result(b"utf-16be", kind);
                assert_eq!(sniffer.encoding(), UTF_8);
                assert_eq!(sniffer.result_type(), kind);
            }
            for kind in [ResultType::Bom, ResultType::XmlPrefix, ResultType::Passed] {
                let mut sniffer = Sniffer::new();
                sniffer.set_result(b"utf-16le", kind);
                assert_eq!(sniffer.encoding(), UTF_16LE);
                assert_eq!(sniffer.result_type(), kind);
            }
        }

        #[test]
        fn x_user_defined() {
            let mut sniffer = Sniffer::with_config(Config {
                default_encoding: Some("koi8-r".into()),
                ..config()
            })
            .unwrap();
            sniffer.set_result(b" X-User-Defined ", ResultType::MetaTag);
            assert_eq!(sniffer.encoding(), WINDOWS_1252);
            assert_eq!(sniffer.result_type(), ResultType::MetaTag);
        }
    }

    mod budget {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn bytes_after_budget_are_ignored() {
            let mut sniffer = Sniffer::with_config(Config {
                max_bytes: 10,
                ..config()
            })
            .unwrap();
            sniffer.write(b"<meta charset=koi8-r>");
            assert_eq!(sniffer.offset(), 10);
            assert!(sniffer.is_done());
            assert_eq!(sniffer.encoding(), WINDOWS_1252);
            assert_eq!(sniffer.result_type(), ResultType::Default);

            sniffer.write(b"<meta charset=koi8-r>");
            assert_eq!(sniffer.offset(), 10);
            assert_eq!(sniffer.encoding(), WINDOWS_1252);
        }

        /// The `>` that completes the value is the 21st byte
        #[test]
        fn deciding_byte_within_budget() {
            let (encoding, kind) = sniff(
                b"<meta charset=koi8-r>",
                Config {
                    max_bytes: 21,
                    ..config()
                },
            )
            .unwrap();
            assert_eq!(encoding, KOI8_R);
            assert_eq!(kind, ResultType::MetaTag);

            let (encoding, kind) = sniff(
                b"<meta charset=koi8-r>",
                Config {
                    max_bytes: 20,
                    ..config()
                },
            )
            .unwrap();
            assert_eq!(encoding, WINDOWS_1252);
            assert_eq!(kind, ResultType::Default);
        }

        /// The `<` search should not look past the budget
        #[test]
        fn tag_search_is_bounded() {
            let mut sniffer = Sniffer::with_config(Config {
                max_bytes: 4,
                ..config()
            })
            .unwrap();
            sniffer.write(b"abcd<meta charset=koi8-r>");
            assert_eq!(sniffer.offset(), 4);
            assert_eq!(sniffer.state, State::BeforeTag);
        }
    }

    #[test]
    fn debug() {
        let mut sniffer = Sniffer::new();
        sniffer.write(b"<meta charset='utf");
        let debug = format!("{:?}", sniffer);
        assert!(debug.contains("attribute_value: \"utf\""), "{}", debug);
        assert!(debug.contains("state: AttributeValueQuoted"), "{}", debug);
        assert!(debug.contains("quote_character: Some('\\'')"), "{}", debug);
    }
}
