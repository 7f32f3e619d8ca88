use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use spellcode::checker::tokenizer::tokenize;
use spellcode::{CheckOptions, Checker, Dictionary, IgnoreList, Languages, WordSource};

const SAMPLE: &str = r#"
/// Parse the HTTPServerError response and return its status code.
pub fn parse_response_code(input: &str) -> Result<u16, ParseError> {
    // The value is always the secnod field of the header line.
    let header_line = input.lines().next().ok_or(ParseError::Empty)?;
    let status = header_line.split_whitespace().nth(1);
    status.map(|s| s.parse::<u16>()).unwrap_or(Ok(500)).map_err(ParseError::from)
}
"#;

fn corpus() -> String {
    SAMPLE.repeat(200)
}

fn bench_tokenize(c: &mut Criterion) {
    let text = corpus();
    let languages = Languages::builtin().unwrap();
    let syntax = languages.for_extension("rs").unwrap();

    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("rust", |b| {
        b.iter(|| tokenize(black_box(&text), &syntax).count())
    });
    group.finish();
}

fn bench_check(c: &mut Criterion) {
    let text = corpus();
    let languages = Languages::builtin().unwrap();
    let syntax = languages.for_extension("rs").unwrap();
    let dictionary = Dictionary::build(&[WordSource::builtin()]).unwrap();
    let ignore = IgnoreList::with_default_patterns();

    let mut group = c.benchmark_group("check");
    group.throughput(Throughput::Bytes(text.len() as u64));

    let options = CheckOptions::default();
    group.bench_function("no_suggestions", |b| {
        let checker = Checker::new(&dictionary, &ignore, &options);
        b.iter(|| checker.check_str(black_box(&text), &syntax).count())
    });

    let options = CheckOptions {
        suggest: true,
        ..Default::default()
    };
    group.bench_function("with_suggestions", |b| {
        let checker = Checker::new(&dictionary, &ignore, &options);
        b.iter(|| checker.check_str(black_box(&text), &syntax).count())
    });
    group.finish();
}

fn bench_suggest(c: &mut Criterion) {
    let dictionary = Dictionary::build(&[WordSource::builtin()]).unwrap();

    c.bench_function("suggest_distance_2", |b| {
        b.iter(|| dictionary.suggest(black_box("fucntion"), 2))
    });
}

criterion_group!(benches, bench_tokenize, bench_check, bench_suggest);
criterion_main!(benches);
