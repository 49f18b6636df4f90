//! Incremental character encoding sniffer for HTML and XML documents.
//!
//! Before a document can be parsed, its bytes have to be decoded into text,
//! but the encoding is usually declared inside of the document itself. This
//! crate implements the [prescan] algorithm of the HTML standard, which
//! determines the encoding from the first bytes of a document: from a byte
//! order mark, a `<meta charset>` tag, a `<meta http-equiv="content-type">`
//! tag or an XML declaration. The encoding passed by the user or by the
//! transport layer (for example, in the `Content-Type` HTTP header) is taken
//! into account, too.
//!
//! ## Sniffer
//!
//! [`Sniffer`] is a push-based state machine: feed it with chunks of a
//! document as they arrive and ask for the best guess at any time. Only the
//! first [`DEFAULT_MAX_BYTES`] bytes (configurable with [`Config`]) are
//! inspected.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use encoding_sniffer::{Config, ResultType, Sniffer};
//!
//! let mut sniffer = Sniffer::with_config(Config {
//!     transport_layer_encoding_label: Some("iso-8859-2".into()),
//!     ..Config::default()
//! })
//! .unwrap();
//! sniffer.write(b"<html><head><meta charset=\"Shift_JIS\">");
//!
//! // The transport layer wins over the document
//! assert_eq!(sniffer.encoding().name(), "ISO-8859-2");
//! assert_eq!(sniffer.result_type(), ResultType::Passed);
//! ```
//!
//! ## Decoding
//!
//! The [`decoder`] module decodes documents into text with the sniffed
//! encoding, either at once or chunk by chunk.
//!
//! ```
//! # use pretty_assertions::assert_eq;
//! use encoding_sniffer::decoder::decode;
//!
//! let document = b"<?xml version='1.0' encoding='windows-1251'?>\xCF\xF0\xE8\xE2\xE5\xF2";
//! let (text, encoding) = decode(document, Default::default()).unwrap();
//! assert_eq!(encoding.name(), "windows-1251");
//! assert!(text.ends_with("Привет"));
//! ```
//!
//! ## Features
//!
//! `encoding-sniffer` supports the following features:
//!
//! [prescan]: https://html.spec.whatwg.org/multipage/parsing.html#prescan-a-byte-stream-to-determine-its-encoding
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!(
        feature_label = "<a id=\"{feature}\" href=\"#{feature}\"><strong><code>{feature}</code></strong></a>"
    ))
)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

#[macro_use]
extern crate log;

pub mod decoder;
pub mod encoding;
pub mod errors;
pub mod sniffer;
mod utils;

// reexports
pub use crate::errors::{Error, Result};
pub use crate::sniffer::{get_encoding, sniff, Config, ResultType, Sniffer, DEFAULT_MAX_BYTES};
