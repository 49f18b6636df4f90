use criterion::{self, criterion_group, criterion_main, Criterion, Throughput};
use encoding_sniffer::decoder::{decode, StreamDecoder};
use encoding_sniffer::{Config, ResultType, Sniffer, DEFAULT_MAX_BYTES};
use pretty_assertions::assert_eq;

static KOI8: &[u8] = include_bytes!("../tests/documents/no-bom-charset-koi8.html");
static SECOND_CHARSET: &[u8] =
    include_bytes!("../tests/documents/no-bom-charset-http-equiv-second-charset.html");

/// A head full of markup which ends with a `<meta>` tag at the very end of
/// the sniffed bytes
fn late_meta() -> Vec<u8> {
    let meta = b"<meta http-equiv=content-type content='text/html; charset=koi8-r'>";
    let mut document = b"<!DOCTYPE html><html lang=en><head>".to_vec();
    while document.len() + meta.len() < DEFAULT_MAX_BYTES - 60 {
        document.extend_from_slice(b"<link rel=stylesheet href='/style.css'><!-- comment -->");
    }
    document.resize(DEFAULT_MAX_BYTES - meta.len(), b' ');
    document.extend_from_slice(meta);
    document
}

/// Plain text without any markup
fn text() -> Vec<u8> {
    b"Lorem ipsum dolor sit amet, consectetur adipiscing elit. "
        .iter()
        .copied()
        .cycle()
        .take(4 * DEFAULT_MAX_BYTES)
        .collect()
}

/// Benchmarks `Sniffer::write` fed with a whole document at once
fn sniff_whole(c: &mut Criterion) {
    let late_meta = late_meta();
    let text = text();

    let mut group = c.benchmark_group("sniff_whole");
    group.throughput(Throughput::Bytes(DEFAULT_MAX_BYTES as u64));
    group.bench_function("late_meta", |b| {
        b.iter(|| {
            let mut sniffer = Sniffer::new();
            sniffer.write(criterion::black_box(&late_meta));
            assert_eq!(sniffer.result_type(), ResultType::MetaTag);
        })
    });

    group.bench_function("text", |b| {
        b.iter(|| {
            let mut sniffer = Sniffer::new();
            sniffer.write(criterion::black_box(&text));
            assert_eq!(sniffer.result_type(), ResultType::Default);
        })
    });

    group.bench_function("early_meta", |b| {
        b.iter(|| {
            let mut sniffer = Sniffer::new();
            sniffer.write(criterion::black_box(SECOND_CHARSET));
            assert_eq!(sniffer.result_type(), ResultType::MetaTag);
        })
    });
    group.finish();
}

/// Benchmarks `Sniffer::write` fed with chunks of different sizes
fn sniff_chunked(c: &mut Criterion) {
    let late_meta = late_meta();

    let mut group = c.benchmark_group("sniff_chunked");
    group.throughput(Throughput::Bytes(DEFAULT_MAX_BYTES as u64));
    for size in [1, 16, 256] {
        group.bench_function(format!("chunk = {}", size), |b| {
            b.iter(|| {
                let mut sniffer = Sniffer::new();
                for chunk in late_meta.chunks(size) {
                    sniffer.write(criterion::black_box(chunk));
                }
                assert_eq!(sniffer.result_type(), ResultType::MetaTag);
            })
        });
    }
    group.finish();
}

/// Benchmarks sniffing together with decoding of the whole document
fn decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");
    group.throughput(Throughput::Bytes(KOI8.len() as u64));
    group.bench_function("decode", |b| {
        b.iter(|| {
            let (text, _) = decode(criterion::black_box(KOI8), Config::default()).unwrap();
            assert!(text.contains("Привет"));
        })
    });

    group.bench_function("StreamDecoder", |b| {
        b.iter(|| {
            let mut decoder = StreamDecoder::new(Config::default()).unwrap();
            let mut text = String::new();
            for chunk in KOI8.chunks(16) {
                decoder.write(criterion::black_box(chunk), &mut text);
            }
            decoder.finish(&mut text);
            assert!(text.contains("Привет"));
        })
    });
    group.finish();
}

criterion_group!(benches, sniff_whole, sniff_chunked, decoding);
criterion_main!(benches);
