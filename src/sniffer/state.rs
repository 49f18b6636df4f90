//! States of the [`Sniffer`] and handlers of a single byte in each of them.
//!
//! Every handler receives the current byte. When a handler decides that the
//! byte belongs to another state, it switches to that state and passes the
//! same byte to it ([`Sniffer::reconsume`]).

use crate::encoding::{UTF16_BE_BOM, UTF16_LE_BOM, UTF8_BOM};
use crate::utils::{
    is_end_of_unquoted_content, is_end_of_unquoted_value, is_quote, is_whitespace,
};

use super::{ResultType, Sniffer};

const UTF16LE_XML_PREFIX: &[u8] = &[0x3C, 0x00, 0x3F, 0x00, 0x78, 0x00];
const UTF16BE_XML_PREFIX: &[u8] = &[0x00, 0x3C, 0x00, 0x3F, 0x00, 0x78];
const XML_DECLARATION: &[u8] = b"<?xml";
const ENCODING: &[u8] = b"encoding";
const META: &[u8] = b"meta";
const HTTP_EQUIV: &[u8] = b"http-equiv";
const CONTENT: &[u8] = b"content";
const CONTENT_TYPE: &[u8] = b"content-type";
const CHARSET: &[u8] = b"charset";
const COMMENT_START: &[u8] = b"<!--";
const COMMENT_END: &[u8] = b"-->";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum State {
    /// Before the first byte; it can start a BOM, an UTF-16 XML declaration or a tag
    Begin,
    Bom16Be,
    Bom16Le,
    Bom8,
    Utf16LeXmlPrefix,
    /// `<` was the first byte
    BeginLt,
    Utf16BeXmlPrefix,

    /// Waiting for `<`
    BeforeTag,
    /// After `<`
    BeforeTagName,
    /// After `</`
    BeforeCloseTagName,
    CommentStart,
    CommentEnd,
    /// A tag name that could be `meta`
    TagNameMeta,
    TagNameOther,

    /// Inside of `<?xml` at the beginning of the document
    XmlDeclaration,
    XmlDeclarationBeforeEncoding,
    XmlDeclarationAfterEncoding,
    XmlDeclarationBeforeValue,
    XmlDeclarationValue,

    /// `<!`, `<?` or `</` markup that is not a comment or a tag; skipped up to `>`
    WeirdTag,

    BeforeAttribute,

    // Names of the `<meta>` attributes we are interested in
    MetaAttribHttpEquiv,
    /// The value of `http-equiv`, it has to be `content-type`
    MetaAttribHttpEquivValue,
    /// `c` of `charset` or `content`
    MetaAttribC,
    MetaAttribContent,
    MetaAttribCharset,
    /// After a full name of interest, the name must end here
    MetaAttribAfterName,

    // Value of the `content` attribute, looking for `charset=`
    MetaContentValueQuotedBeforeEncoding,
    MetaContentValueQuotedAfterEncoding,
    MetaContentValueQuotedBeforeValue,
    MetaContentValueQuotedValueQuoted,
    MetaContentValueQuotedValueUnquoted,
    MetaContentValueUnquotedBeforeEncoding,
    MetaContentValueUnquotedBeforeValue,
    MetaContentValueUnquotedValueQuoted,
    MetaContentValueUnquotedValueUnquoted,

    AnyAttribName,
    /// After the name of an attribute, before `=`
    AfterAttributeName,
    /// After `=`
    BeforeAttributeValue,
    AttributeValueQuoted,
    AttributeValueUnquoted,
}

/// Attributes of a `<meta>` tag that carry an encoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum AttribType {
    None,
    HttpEquiv,
    Content,
    Charset,
}

impl Sniffer {
    /// Processes one byte in the current state.
    pub(super) fn step(&mut self, c: u8) {
        match self.state {
            State::Begin => self.begin(c),
            State::Bom16Be => self.bom16(UTF16_BE_BOM, b"utf-16be", c),
            State::Bom16Le => self.bom16(UTF16_LE_BOM, b"utf-16le", c),
            State::Bom8 => self.bom8(c),
            State::Utf16LeXmlPrefix => self.utf16_xml_prefix(UTF16LE_XML_PREFIX, b"utf-16le", c),
            State::BeginLt => self.begin_lt(c),
            State::Utf16BeXmlPrefix => self.utf16_xml_prefix(UTF16BE_XML_PREFIX, b"utf-16be", c),

            State::BeforeTag => self.before_tag(c),
            State::BeforeTagName => self.before_tag_name(c),
            State::BeforeCloseTagName => self.before_close_tag_name(c),
            State::CommentStart => self.comment_start(c),
            State::CommentEnd => self.comment_end(c),
            State::TagNameMeta => self.tag_name_meta(c),
            State::TagNameOther => self.tag_name_other(c),

            State::XmlDeclaration => self.xml_declaration(c),
            State::XmlDeclarationBeforeEncoding => self.xml_declaration_before_encoding(c),
            State::XmlDeclarationAfterEncoding => self.xml_declaration_after_encoding(c),
            State::XmlDeclarationBeforeValue => self.xml_declaration_before_value(c),
            State::XmlDeclarationValue => self.xml_declaration_value(c),

            State::WeirdTag => self.weird_tag(c),

            State::BeforeAttribute => self.before_attribute(c),
            State::MetaAttribHttpEquiv => {
                self.meta_attrib_name(HTTP_EQUIV, AttribType::HttpEquiv, c)
            }
            State::MetaAttribHttpEquivValue => self.meta_attrib_http_equiv_value(c),
            State::MetaAttribC => self.meta_attrib_c(c),
            State::MetaAttribContent => self.meta_attrib_name(CONTENT, AttribType::Content, c),
            State::MetaAttribCharset => self.meta_attrib_name(CHARSET, AttribType::Charset, c),
            State::MetaAttribAfterName => self.meta_attrib_after_name(c),

            State::MetaContentValueQuotedBeforeEncoding => {
                self.meta_content_value_quoted_before_encoding(c)
            }
            State::MetaContentValueQuotedAfterEncoding => {
                self.meta_content_value_quoted_after_encoding(c)
            }
            State::MetaContentValueQuotedBeforeValue => {
                self.meta_content_value_quoted_before_value(c)
            }
            State::MetaContentValueQuotedValueQuoted => {
                self.meta_content_value_quoted_value_quoted(c)
            }
            State::MetaContentValueQuotedValueUnquoted => {
                self.meta_content_value_quoted_value_unquoted(c)
            }
            State::MetaContentValueUnquotedBeforeEncoding => {
                self.meta_content_value_unquoted_before_encoding(c)
            }
            State::MetaContentValueUnquotedBeforeValue => {
                self.meta_content_value_unquoted_before_value(c)
            }
            State::MetaContentValueUnquotedValueQuoted => {
                self.meta_content_value_unquoted_value_quoted(c)
            }
            State::MetaContentValueUnquotedValueUnquoted => {
                self.meta_content_value_unquoted_value_unquoted(c)
            }

            State::AnyAttribName => self.any_attrib_name(c),
            State::AfterAttributeName => self.after_attribute_name(c),
            State::BeforeAttributeValue => self.before_attribute_value(c),
            State::AttributeValueQuoted => self.attribute_value_quoted(c),
            State::AttributeValueUnquoted => self.attribute_value_unquoted(c),
        }
    }

    /// Switches to `state` and processes `c` again in it.
    #[inline]
    fn reconsume(&mut self, state: State, c: u8) {
        self.state = state;
        self.step(c);
    }

    /// Advances the position in `section` if `c` is the next byte of it,
    /// otherwise resets the position.
    ///
    /// Returns `false` if `c` does not match.
    #[inline]
    fn advance_section(&mut self, section: &[u8], c: u8) -> bool {
        if section.get(self.section_index) == Some(&c) {
            self.section_index += 1;
            true
        } else {
            self.section_index = 0;
            false
        }
    }

    /// Same as [`Self::advance_section`], but ASCII letters match in any case.
    /// `section` must be lowercase.
    #[inline]
    fn advance_section_ic(&mut self, section: &[u8], c: u8) -> bool {
        self.advance_section(section, c.to_ascii_lowercase())
    }

    //----------------------------------------------------------------------------------------------
    // Beginning of the document
    //----------------------------------------------------------------------------------------------

    fn begin(&mut self, c: u8) {
        self.state = match c {
            0xFE => State::Bom16Be,
            0xFF => State::Bom16Le,
            0xEF => {
                self.section_index = 1;
                State::Bom8
            }
            0x00 => {
                self.section_index = 1;
                State::Utf16BeXmlPrefix
            }
            b'<' => State::BeginLt,
            _ => State::BeforeTag,
        };
    }

    fn bom16(&mut self, bom: &[u8], label: &[u8], c: u8) {
        if c == bom[1] {
            self.set_result(label, ResultType::Bom);
            self.state = State::BeforeTag;
        } else {
            self.reconsume(State::BeforeTag, c);
        }
    }

    fn bom8(&mut self, c: u8) {
        if !self.advance_section(UTF8_BOM, c) {
            self.reconsume(State::BeforeTag, c);
        } else if self.section_index == UTF8_BOM.len() {
            self.set_result(b"utf-8", ResultType::Bom);
            self.state = State::BeforeTag;
        }
    }

    fn utf16_xml_prefix(&mut self, prefix: &[u8], label: &[u8], c: u8) {
        if !self.advance_section(prefix, c) {
            self.reconsume(State::BeforeTag, c);
        } else if self.section_index == prefix.len() {
            self.set_result(label, ResultType::XmlPrefix);
            self.state = State::BeforeTag;
        }
    }

    fn begin_lt(&mut self, c: u8) {
        match c {
            0x00 => {
                self.section_index = 2;
                self.state = State::Utf16LeXmlPrefix;
            }
            b'?' => {
                self.section_index = 2;
                self.state = State::XmlDeclaration;
            }
            _ => self.reconsume(State::BeforeTagName, c),
        }
    }

    //----------------------------------------------------------------------------------------------
    // Tags
    //----------------------------------------------------------------------------------------------

    fn before_tag(&mut self, c: u8) {
        if c == b'<' {
            self.state = State::BeforeTagName;
            self.in_meta_tag = false;
        }
    }

    /// We have seen a `<`. It can start `<meta`, any other tag, a closing tag or a comment.
    fn before_tag_name(&mut self, c: u8) {
        match c {
            b'm' | b'M' => {
                self.section_index = 1;
                self.state = State::TagNameMeta;
            }
            c if c.is_ascii_alphabetic() => self.state = State::TagNameOther,
            b'/' => self.state = State::BeforeCloseTagName,
            b'!' => {
                self.section_index = 2;
                self.state = State::CommentStart;
            }
            b'?' => self.state = State::WeirdTag,
            _ => self.reconsume(State::BeforeTag, c),
        }
    }

    fn before_close_tag_name(&mut self, c: u8) {
        if c.is_ascii_alphabetic() {
            // Closing tags can have attributes too
            self.state = State::TagNameOther;
        } else {
            self.reconsume(State::WeirdTag, c);
        }
    }

    fn comment_start(&mut self, c: u8) {
        if !self.advance_section(COMMENT_START, c) {
            self.reconsume(State::WeirdTag, c);
        } else if self.section_index == COMMENT_START.len() {
            // `--` of the start can be a part of the end: `<!-->`
            self.section_index = 2;
            self.state = State::CommentEnd;
        }
    }

    fn comment_end(&mut self, c: u8) {
        if self.advance_section(COMMENT_END, c) {
            if self.section_index == COMMENT_END.len() {
                self.state = State::BeforeTag;
            }
        } else if c == b'-' {
            // `>` was expected; any number of dashes can precede it
            self.section_index = 2;
        }
    }

    fn weird_tag(&mut self, c: u8) {
        if c == b'>' {
            self.state = State::BeforeTag;
        }
    }

    fn tag_name_meta(&mut self, c: u8) {
        if self.section_index < META.len() {
            if self.advance_section_ic(META, c) {
                return;
            }
        } else if is_whitespace(c) {
            self.in_meta_tag = true;
            self.got_pragma = None;
            self.needs_pragma = None;
            self.state = State::BeforeAttribute;
            return;
        }
        // Reconsume in case this is `>`
        self.reconsume(State::TagNameOther, c);
    }

    fn tag_name_other(&mut self, c: u8) {
        if is_whitespace(c) {
            self.state = State::BeforeAttribute;
        } else if c == b'>' {
            self.state = State::BeforeTag;
        }
    }

    //----------------------------------------------------------------------------------------------
    // XML declaration
    //----------------------------------------------------------------------------------------------

    fn xml_declaration(&mut self, c: u8) {
        if !self.advance_section(XML_DECLARATION, c) {
            self.reconsume(State::WeirdTag, c);
        } else if self.section_index == XML_DECLARATION.len() {
            self.section_index = 0;
            self.state = State::XmlDeclarationBeforeEncoding;
        }
    }

    fn xml_declaration_before_encoding(&mut self, c: u8) {
        if self.advance_section_ic(ENCODING, c) {
            if self.section_index == ENCODING.len() {
                self.state = State::XmlDeclarationAfterEncoding;
            }
        } else if c == b'>' {
            self.state = State::BeforeTag;
        } else if c.to_ascii_lowercase() == ENCODING[0] {
            // Start over from this `e`
            self.section_index = 1;
        }
    }

    fn xml_declaration_after_encoding(&mut self, c: u8) {
        if c == b'=' {
            self.state = State::XmlDeclarationBeforeValue;
        } else if c > b' ' {
            self.reconsume(State::WeirdTag, c);
        }
    }

    fn xml_declaration_before_value(&mut self, c: u8) {
        if is_quote(c) {
            self.quote_character = Some(c);
            self.attribute_value.clear();
            self.state = State::XmlDeclarationValue;
        } else if c > b' ' {
            self.reconsume(State::WeirdTag, c);
        }
    }

    fn xml_declaration_value(&mut self, c: u8) {
        if self.quote_character == Some(c) {
            let label = std::mem::take(&mut self.attribute_value);
            self.set_result(&label, ResultType::XmlEncoding);
            self.state = State::WeirdTag;
        } else if c <= b' ' || c == b'>' {
            self.reconsume(State::WeirdTag, c);
        } else {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }

    //----------------------------------------------------------------------------------------------
    // Attribute names
    //----------------------------------------------------------------------------------------------

    fn before_attribute(&mut self, c: u8) {
        if is_whitespace(c) {
            return;
        }
        self.attrib_type = AttribType::None;

        if self.in_meta_tag {
            match c.to_ascii_lowercase() {
                b'h' => {
                    self.section_index = 1;
                    self.state = State::MetaAttribHttpEquiv;
                    return;
                }
                b'c' => {
                    self.section_index = 1;
                    self.state = State::MetaAttribC;
                    return;
                }
                _ => {}
            }
        }

        self.state = match c {
            b'/' | b'>' => State::BeforeTag,
            _ => State::AnyAttribName,
        };
    }

    fn meta_attrib_name(&mut self, name: &[u8], kind: AttribType, c: u8) {
        if !self.advance_section_ic(name, c) {
            self.reconsume(State::AnyAttribName, c);
        } else if self.section_index == name.len() {
            self.attrib_type = kind;
            self.state = State::MetaAttribAfterName;
        }
    }

    fn meta_attrib_c(&mut self, c: u8) {
        match c.to_ascii_lowercase() {
            b'h' => {
                self.section_index = 2;
                self.state = State::MetaAttribCharset;
            }
            b'o' => {
                self.section_index = 2;
                self.state = State::MetaAttribContent;
            }
            _ => self.reconsume(State::AnyAttribName, c),
        }
    }

    fn meta_attrib_after_name(&mut self, c: u8) {
        if is_whitespace(c) || c == b'=' {
            self.reconsume(State::AfterAttributeName, c);
        } else {
            // The name only starts with a known one, like `charsets`
            self.attrib_type = AttribType::None;
            self.reconsume(State::AnyAttribName, c);
        }
    }

    fn any_attrib_name(&mut self, c: u8) {
        if is_whitespace(c) {
            self.attrib_type = AttribType::None;
            self.state = State::AfterAttributeName;
        } else if c == b'/' || c == b'>' {
            self.state = State::BeforeTag;
        } else if c == b'=' {
            self.state = State::BeforeAttributeValue;
        }
    }

    fn after_attribute_name(&mut self, c: u8) {
        if is_whitespace(c) {
            return;
        }
        if c == b'=' {
            self.state = State::BeforeAttributeValue;
        } else {
            // An attribute without value
            self.reconsume(State::BeforeAttribute, c);
        }
    }

    //----------------------------------------------------------------------------------------------
    // Attribute values
    //----------------------------------------------------------------------------------------------

    fn before_attribute_value(&mut self, c: u8) {
        if is_whitespace(c) {
            return;
        }
        self.attribute_value.clear();
        self.section_index = 0;

        if is_quote(c) {
            self.quote_character = Some(c);
            self.state = match self.attrib_type {
                AttribType::Content => State::MetaContentValueQuotedBeforeEncoding,
                AttribType::HttpEquiv => State::MetaAttribHttpEquivValue,
                _ => State::AttributeValueQuoted,
            };
        } else {
            self.quote_character = None;
            let state = match self.attrib_type {
                AttribType::Content => State::MetaContentValueUnquotedBeforeEncoding,
                AttribType::HttpEquiv => State::MetaAttribHttpEquivValue,
                _ => State::AttributeValueUnquoted,
            };
            self.reconsume(state, c);
        }
    }

    fn meta_attrib_http_equiv_value(&mut self, c: u8) {
        if self.section_index == CONTENT_TYPE.len() {
            let end = match self.quote_character {
                Some(quote) => c == quote,
                None => is_end_of_unquoted_value(c),
            };
            if end {
                self.confirm_pragma(true);
                match self.quote_character {
                    Some(_) => self.state = State::BeforeAttribute,
                    // `/` and `>` also close the tag
                    None => self.reconsume(State::BeforeAttribute, c),
                }
                return;
            }
        } else if self.advance_section_ic(CONTENT_TYPE, c) {
            return;
        }

        self.confirm_pragma(false);
        match self.quote_character {
            Some(_) => self.reconsume(State::AttributeValueQuoted, c),
            None => self.reconsume(State::AttributeValueUnquoted, c),
        }
    }

    /// Records the value of the first `http-equiv` attribute of a `<meta>` tag
    /// and commits the charset of a `content` attribute seen before it.
    fn confirm_pragma(&mut self, content_type: bool) {
        if self.got_pragma.is_some() {
            return;
        }
        self.got_pragma = Some(content_type);
        if let Some(label) = self.needs_pragma.take() {
            if content_type {
                self.set_result(&label, ResultType::MetaTag);
            }
        }
    }

    /// Handles the charset found in a `content` attribute.
    fn handle_meta_content_value(&mut self) {
        if self.attribute_value.is_empty() {
            return;
        }
        let label = std::mem::take(&mut self.attribute_value);
        match self.got_pragma {
            Some(true) => self.set_result(&label, ResultType::MetaTag),
            Some(false) => {}
            // Only the first `content` attribute counts
            None if self.needs_pragma.is_none() => self.needs_pragma = Some(label),
            None => {}
        }
    }

    fn handle_attribute_value(&mut self) {
        if self.attrib_type == AttribType::Charset {
            let label = std::mem::take(&mut self.attribute_value);
            self.set_result(&label, ResultType::MetaTag);
        }
    }

    fn attribute_value_quoted(&mut self, c: u8) {
        if self.quote_character == Some(c) {
            self.handle_attribute_value();
            self.state = State::BeforeAttribute;
        } else if self.attrib_type == AttribType::Charset {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }

    fn attribute_value_unquoted(&mut self, c: u8) {
        if is_whitespace(c) {
            self.handle_attribute_value();
            self.state = State::BeforeAttribute;
        } else if c == b'/' || c == b'>' {
            self.handle_attribute_value();
            self.state = State::BeforeTag;
        } else if self.attrib_type == AttribType::Charset {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }

    //----------------------------------------------------------------------------------------------
    // Value of the `content` attribute
    //----------------------------------------------------------------------------------------------

    /// Looks for `charset` in a `content` value. Returns `true` when its last
    /// byte is matched.
    fn find_charset(&mut self, c: u8) -> bool {
        if self.advance_section_ic(CHARSET, c) {
            return self.section_index == CHARSET.len();
        }
        if c.to_ascii_lowercase() == CHARSET[0] {
            // Start over from this `c`
            self.section_index = 1;
        }
        false
    }

    fn meta_content_value_quoted_before_encoding(&mut self, c: u8) {
        if self.quote_character == Some(c) {
            self.reconsume(State::AttributeValueQuoted, c);
        } else if self.find_charset(c) {
            self.state = State::MetaContentValueQuotedAfterEncoding;
        }
    }

    fn meta_content_value_quoted_after_encoding(&mut self, c: u8) {
        if c == b'=' {
            self.state = State::MetaContentValueQuotedBeforeValue;
        } else if !is_whitespace(c) {
            // Not a `charset=`, look for the next one
            self.reconsume(State::MetaContentValueQuotedBeforeEncoding, c);
        }
    }

    fn meta_content_value_quoted_before_value(&mut self, c: u8) {
        if self.quote_character == Some(c) {
            self.reconsume(State::AttributeValueQuoted, c);
        } else if is_quote(c) {
            self.state = State::MetaContentValueQuotedValueQuoted;
        } else if !is_whitespace(c) {
            self.reconsume(State::MetaContentValueQuotedValueUnquoted, c);
        }
    }

    fn meta_content_value_quoted_value_quoted(&mut self, c: u8) {
        if is_quote(c) {
            // Only a value with matched inner quotes counts
            if self.quote_character != Some(c) {
                self.handle_meta_content_value();
            }
            self.reconsume(State::AttributeValueQuoted, c);
        } else {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }

    fn meta_content_value_quoted_value_unquoted(&mut self, c: u8) {
        if is_quote(c) || is_whitespace(c) || c == b';' {
            self.handle_meta_content_value();
            // The attribute value may continue
            self.reconsume(State::AttributeValueQuoted, c);
        } else {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }

    fn meta_content_value_unquoted_before_encoding(&mut self, c: u8) {
        if is_end_of_unquoted_content(c) {
            self.reconsume(State::AttributeValueUnquoted, c);
        } else if self.section_index == CHARSET.len() && c == b'=' {
            self.state = State::MetaContentValueUnquotedBeforeValue;
        } else {
            self.find_charset(c);
        }
    }

    fn meta_content_value_unquoted_before_value(&mut self, c: u8) {
        if is_quote(c) {
            self.quote_character = Some(c);
            self.state = State::MetaContentValueUnquotedValueQuoted;
        } else if is_end_of_unquoted_content(c) {
            self.reconsume(State::AttributeValueUnquoted, c);
        } else {
            self.reconsume(State::MetaContentValueUnquotedValueUnquoted, c);
        }
    }

    fn meta_content_value_unquoted_value_quoted(&mut self, c: u8) {
        if is_end_of_unquoted_content(c) {
            // The quote is not closed, so there is no value
            self.reconsume(State::AttributeValueUnquoted, c);
        } else if self.quote_character == Some(c) {
            self.handle_meta_content_value();
            self.state = State::AttributeValueUnquoted;
        } else {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }

    fn meta_content_value_unquoted_value_unquoted(&mut self, c: u8) {
        if is_end_of_unquoted_content(c) || c == b';' {
            self.handle_meta_content_value();
            self.reconsume(State::AttributeValueUnquoted, c);
        } else {
            self.attribute_value.push(c.to_ascii_lowercase());
        }
    }
}
