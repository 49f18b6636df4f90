#![no_main]

use encoding_sniffer::decoder::{decode, StreamDecoder};
use encoding_sniffer::{Config, Sniffer};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, arbitrary::Arbitrary)]
struct Driver<'a> {
    config: Config,
    /// Lengths of the chunks the document is split into
    chunks: Vec<u8>,
    document: &'a [u8],
}

fuzz_target!(|driver: Driver| {
    let mut whole = match Sniffer::with_config(driver.config.clone()) {
        Ok(sniffer) => sniffer,
        Err(_) => return,
    };
    whole.write(driver.document);

    let mut chunked = Sniffer::with_config(driver.config.clone()).unwrap();
    let mut decoder = StreamDecoder::new(driver.config.clone()).unwrap();
    let mut text = String::new();
    let mut rest = driver.document;
    for len in driver.chunks.iter().map(|len| *len as usize) {
        let (chunk, tail) = rest.split_at(len.min(rest.len()));
        chunked.write(chunk);
        decoder.write(chunk, &mut text);
        rest = tail;
    }
    chunked.write(rest);
    decoder.write(rest, &mut text);
    decoder.finish(&mut text);

    assert_eq!(whole.encoding(), chunked.encoding());
    assert_eq!(whole.result_type(), chunked.result_type());
    assert_eq!(whole.offset(), chunked.offset());
    assert!(whole.offset() <= whole.max_bytes());

    let (expected, _) = decode(driver.document, driver.config).unwrap();
    assert_eq!(text, expected);
});
