//! Decoding of whole documents into text using the sniffed encoding.
//!
//! The encoding is sniffed from the first [`Config::max_bytes`] bytes of a
//! document; then the whole document, including these bytes, is decoded with
//! it. A byte order mark of the sniffed encoding is not a part of the text.
//! Malformed sequences are replaced with the REPLACEMENT CHARACTER (U+FFFD).

use std::borrow::Cow;
use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding};

use crate::encoding::decode_with_bom_removal;
use crate::errors::{Error, Result};
use crate::sniffer::{sniff, Config, Sniffer};

/// Size of a buffer used to read from readers
const CHUNK_SIZE: usize = 8 * 1024;

/// Sniffs the encoding of `bytes` and decodes them with it.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use encoding_sniffer::decoder::decode;
///
/// let (text, encoding) = decode(b"<meta charset=koi8-r>\xF0\xD2\xC9\xD7\xC5\xD4", Default::default()).unwrap();
/// assert_eq!(encoding.name(), "KOI8-R");
/// assert_eq!(text, "<meta charset=koi8-r>Привет");
/// ```
pub fn decode(bytes: &[u8], config: Config) -> Result<(Cow<str>, &'static Encoding)> {
    let (encoding, _) = sniff(bytes, config)?;
    Ok((decode_with_bom_removal(bytes, encoding), encoding))
}

/// Decodes a document which arrives in chunks.
///
/// Chunks are held back until the sniffer has seen enough of the document to
/// decide on its encoding, or until [`finish`] is called. From then on every
/// chunk is decoded as soon as it is written. The text does not depend on how
/// the document is split into chunks.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use encoding_sniffer::decoder::StreamDecoder;
///
/// let mut decoder = StreamDecoder::new(Default::default()).unwrap();
/// let mut text = String::new();
/// decoder.write(b"<meta charset=", &mut text);
/// decoder.write(b"iso-8859-2>\xB1", &mut text);
/// // Still waiting for the rest of the first 1024 bytes
/// assert_eq!(text, "");
///
/// decoder.finish(&mut text);
/// assert_eq!(text, "<meta charset=iso-8859-2>ą");
/// ```
///
/// [`finish`]: Self::finish
pub struct StreamDecoder {
    sniffer: Sniffer,
    /// Bytes written before the encoding was decided
    buffer: Vec<u8>,
    /// Created when the encoding is decided
    decoder: Option<Decoder>,
}

impl StreamDecoder {
    /// Creates a decoder which sniffs the encoding with the specified configuration.
    ///
    /// Returns [`Error::InvalidMaxBytes`] if `config.max_bytes` is zero.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            sniffer: Sniffer::with_config(config)?,
            buffer: Vec::new(),
            decoder: None,
        })
    }

    /// Feeds the next chunk of the document and appends the text decoded so
    /// far to `output`.
    pub fn write(&mut self, chunk: &[u8], output: &mut String) {
        if let Some(decoder) = &mut self.decoder {
            decode_into(decoder, chunk, output, false);
            return;
        }

        self.sniffer.write(chunk);
        self.buffer.extend_from_slice(chunk);
        if self.sniffer.is_done() {
            let buffer = std::mem::take(&mut self.buffer);
            let decoder = self.decoder.insert(start_decoder(&self.sniffer));
            decode_into(decoder, &buffer, output, false);
        }
    }

    /// Returns the encoding of the document, or `None` if it is not decided yet.
    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.decoder.as_ref().map(Decoder::encoding)
    }

    /// Signals the end of the document and appends the rest of the text to
    /// `output`. An incomplete sequence at the end of the document is decoded
    /// as the REPLACEMENT CHARACTER (U+FFFD).
    pub fn finish(mut self, output: &mut String) {
        let buffer = std::mem::take(&mut self.buffer);
        let mut decoder = match self.decoder {
            Some(decoder) => decoder,
            None => start_decoder(&self.sniffer),
        };
        decode_into(&mut decoder, &buffer, output, true);
    }
}

fn start_decoder(sniffer: &Sniffer) -> Decoder {
    let encoding = sniffer.encoding();
    debug!(
        "decoding as {} ({:?}) after {} bytes",
        encoding.name(),
        sniffer.result_type(),
        sniffer.offset()
    );
    encoding.new_decoder_with_bom_removal()
}

/// Decodes `bytes` to the end of `output`, growing it as necessary.
fn decode_into(decoder: &mut Decoder, mut bytes: &[u8], output: &mut String, last: bool) {
    loop {
        // `None` only on overflow, the decoder reports `OutputFull` then
        let needed = decoder
            .max_utf8_buffer_length(bytes.len())
            .unwrap_or(CHUNK_SIZE);
        output.reserve(needed);

        let (result, read, _) = decoder.decode_to_string(bytes, output, last);
        bytes = &bytes[read..];
        match result {
            CoderResult::InputEmpty => return,
            CoderResult::OutputFull => continue,
        }
    }
}

macro_rules! impl_decode_reader {
    ($reader:ident, $config:ident $(, $await:ident)?) => {{
        let mut decoder = StreamDecoder::new($config)?;
        let mut output = String::new();
        let mut chunk = vec![0; CHUNK_SIZE];
        loop {
            match $reader.read(&mut chunk) $(.$await)? {
                Ok(0) => break,
                Ok(read) => decoder.write(&chunk[..read], &mut output),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        decoder.finish(&mut output);
        Ok(output)
    }};
}

/// Reads a document from `reader` up to the end and decodes it with the
/// sniffed encoding.
///
/// ```
/// # use pretty_assertions::assert_eq;
/// use encoding_sniffer::decoder::decode_reader;
///
/// let bytes: &[u8] = b"\xFF\xFE<\x00p\x00>\x00";
/// assert_eq!(decode_reader(bytes, Default::default()).unwrap(), "<p>");
/// ```
pub fn decode_reader<R: Read>(mut reader: R, config: Config) -> Result<String> {
    impl_decode_reader!(reader, config)
}

/// Reads a document from an asynchronous `reader` up to the end and decodes it
/// with the sniffed encoding.
#[cfg(feature = "async-tokio")]
pub async fn decode_async_reader<R>(mut reader: R, config: Config) -> Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    impl_decode_reader!(reader, config, await)
}
