// cargo bench -p gptkit
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use diskio::prelude::MemDiskIO;
use gptkit::guids::GPT_ENT_TYPE_CHROMEOS_ROOTFS;
use gptkit::{
    DiskGeometry, GptEntry, GptLayout, Guid, SyncOptions, check_entries, crc, encode_entries,
    sync_gpt, validate, write_gpt,
};

criterion_group!(benches, bench_crc, bench_validate, bench_overlap, bench_sync);
criterion_main!(benches);

fn make_guid(i: usize) -> Guid {
    Guid::from_bytes((i as u128 + 1).to_le_bytes())
}

/// `n` back-to-back partitions of 64 sectors each.
fn make_entries(first_lba: u64, n: usize) -> Vec<GptEntry> {
    (0..n)
        .map(|i| {
            let start = first_lba + i as u64 * 64;
            GptEntry::new(
                GPT_ENT_TYPE_CHROMEOS_ROOTFS,
                make_guid(i),
                start,
                start + 63,
                0,
                &format!("p{i}"),
            )
        })
        .collect()
}

fn bench_crc(c: &mut Criterion) {
    let mut group = c.benchmark_group("gpt_crc");
    for &n in &[128usize, 1024, 4096] {
        let region = encode_entries(&make_entries(64, n), 128).unwrap();
        group.bench_with_input(BenchmarkId::new("entries_region", n), &n, |b, &_n| {
            b.iter(|| std::hint::black_box(crc::crc32(&region)));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("gpt_validate");
    for &n in &[128u32, 1024, 4096] {
        let total = 400_000u64;
        let layout = GptLayout::new(total, make_guid(0)).with_entries(n, 128);
        let raw = encode_entries(&make_entries(layout.first_usable_lba(), n as usize), 128).unwrap();
        let header = layout.primary_header(&raw);
        let geo = DiskGeometry::new(total);

        group.bench_with_input(BenchmarkId::new("header_and_entries", n), &n, |b, &_n| {
            b.iter(|| std::hint::black_box(validate(&header, &raw, &geo)));
        });
    }
    group.finish();
}

fn bench_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("gpt_overlap");
    for &n in &[128u32, 1024, 4096] {
        let layout = GptLayout::new(400_000, make_guid(0)).with_entries(n, 128);
        let mut entries = make_entries(layout.first_usable_lba(), n as usize);
        // worst case for sorting
        entries.reverse();
        let header = layout.primary_header(&[]);

        group.bench_with_input(BenchmarkId::new("check_entries", n), &n, |b, &_n| {
            b.iter(|| std::hint::black_box(check_entries(&header, &entries).len()));
        });
    }
    group.finish();
}

fn bench_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("gpt_sync");
    let sector = 512u64;
    let total = 400_000u64;
    for &n in &[128usize, 1024] {
        let mut buf = vec![0u8; (sector * total) as usize];
        let mut io = MemDiskIO::new(&mut buf);
        let layout = GptLayout::new(total, make_guid(0)).with_entries(n as u32, 128);
        write_gpt(&mut io, &layout, &make_entries(layout.first_usable_lba(), n)).unwrap();

        group.bench_with_input(BenchmarkId::new("healthy_disk", n), &n, |b, &_n| {
            b.iter(|| {
                let report = sync_gpt(&mut io, &SyncOptions::new().dry_run()).unwrap();
                std::hint::black_box(report.findings.len())
            });
        });
    }
    group.finish();
}
