use bencher::{TestCase, TestInput};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_modules::{CookieOptions, SecureCookie};
use std::hint::black_box;

const HASH: &str = "bench-hash-key-with-enough-material-for-hmac";
const BLOCK: &str = "bench-block-key-for-aes-gcm-encryption";

static SESSION: TestInput = TestInput::new("user=ada&role=admin");
static PREFERENCES: TestInput = TestInput::new(
    "theme=dark&lang=en-GB&tz=Europe/London&currency=GBP&font=large&motion=reduced&sidebar=collapsed&last=/docs/getting-started",
);

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::new("session", SESSION), TestCase::new("preferences", PREFERENCES)]
}

fn benchmark_cookie(criterion: &mut Criterion) {
    let modes = [
        ("signed", SecureCookie::new(CookieOptions::default().hash_key(HASH)).expect("hash key is long enough")),
        (
            "encrypted",
            SecureCookie::new(CookieOptions::default().hash_key(HASH).block_key(BLOCK)).expect("keys are long enough"),
        ),
    ];

    for (mode, secure) in modes {
        let mut group = criterion.benchmark_group(format!("cookie_{mode}"));

        for case in create_test_cases() {
            let values = case.input().values();
            group.throughput(Throughput::Bytes(case.input().len() as u64));

            group.bench_with_input(BenchmarkId::new("encode", case.name()), &values, |b, values| {
                b.iter(|| black_box(secure.encode("session", values).expect("values should encode")));
            });

            let token = secure.encode("session", &values).expect("values should encode");
            group.bench_with_input(BenchmarkId::new("decode", case.name()), &token, |b, token| {
                b.iter(|| black_box(secure.decode("session", token).expect("token should verify")));
            });
        }

        group.finish();
    }
}

criterion_group!(cookie, benchmark_cookie);
criterion_main!(cookie);
