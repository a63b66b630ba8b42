use chrono::{TimeZone, Utc};
use criterion::{Criterion, criterion_group, criterion_main};
use ripple_tally::codec::{
    BucketKey, DimensionTuple, bucket_time_token, decode_geo_key, encode_geo_key,
};
use ripple_tally::types::Scope;
use std::hint::black_box;

fn sample() -> DimensionTuple {
    DimensionTuple {
        client: "CID1".to_string(),
        scope: Scope::Entity("POST1".to_string()),
        ip: Some("2001:db8::ff00:42:8329".to_string()),
        country: Some("Spain".to_string()),
        country_code: Some("ES".to_string()),
        region: Some("Madrid".to_string()),
        region_code: Some("MD".to_string()),
        city: Some("Madrid".to_string()),
        latitude: Some(40.4168),
        longitude: Some(-3.7038),
    }
}

/// Geo key encoding runs once per recorded geo hit
fn bench_geo_key(c: &mut Criterion) {
    let dims = sample();
    let encoded = encode_geo_key(&dims);

    c.bench_function("encode_geo_key", |b| {
        b.iter(|| encode_geo_key(black_box(&dims)))
    });

    c.bench_function("decode_geo_key", |b| {
        b.iter(|| decode_geo_key(black_box(&encoded)))
    });
}

/// Bucket keys are built on the write path and parsed once per drained bucket
fn bench_bucket_keys(c: &mut Criterion) {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 30).unwrap();
    let raw = "activity:timestamp:likes:CID1:POST1:202401011015";

    c.bench_function("bucket_time_token", |b| {
        b.iter(|| bucket_time_token(black_box(at)))
    });

    c.bench_function("bucket_key_parse", |b| {
        b.iter(|| BucketKey::parse(black_box(raw)))
    });
}

criterion_group!(benches, bench_geo_key, bench_bucket_keys);
criterion_main!(benches);
