use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use terrain50::{GridRef, TerrainService, DEFAULT_ARCHIVE_SUFFIX, GRID_SIZE};

/// Create a synthetic tile archive with a simple elevation gradient.
fn create_tile(dir: &std::path::Path, reference: &str) {
    let gridref: GridRef = reference.parse().unwrap();
    let id = gridref.tile_id();

    let mut payload = format!(
        "ncols 200\nnrows 200\nxllcorner {}\nyllcorner {}\ncellsize 50\n",
        (gridref.easting() / 10_000) * 10_000,
        (gridref.northing() / 10_000) * 10_000
    );
    for row in 0..GRID_SIZE {
        let samples: Vec<String> = (0..GRID_SIZE)
            .map(|col| format!("{}.{}", (row + col) % 900, col % 10))
            .collect();
        payload.push_str(&samples.join(" "));
        payload.push('\n');
    }

    let square_dir = dir.join(id.square());
    std::fs::create_dir_all(&square_dir).unwrap();
    let file =
        std::fs::File::create(square_dir.join(format!("{id}{DEFAULT_ARCHIVE_SUFFIX}"))).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    writer.start_file(format!("{id}.asc"), options).unwrap();
    writer.write_all(payload.as_bytes()).unwrap();
    writer.finish().unwrap();
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_gridref", |b| {
        b.iter(|| black_box("NY 21540 07216".parse::<GridRef>().unwrap()));
    });
}

fn bench_height_cached(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), "NY 21540 07216");
    let service = TerrainService::new(tmp.path());

    // Warm the cache
    let _ = service.height("NY 21540 07216");

    c.bench_function("height_cached", |b| {
        b.iter(|| black_box(service.height(black_box("NY 21540 07216")).unwrap()));
    });
}

fn bench_decode_cold(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), "NY 21540 07216");
    let service = TerrainService::new(tmp.path());

    c.bench_function("height_cold_decode", |b| {
        b.iter(|| {
            service.clear_cache();
            black_box(service.height(black_box("NY 21540 07216")).unwrap())
        });
    });
}

fn bench_to_lat_lon(c: &mut Criterion) {
    let gridref: GridRef = "NY 21540 07216".parse().unwrap();
    c.bench_function("to_lat_lon_wgs84", |b| {
        b.iter(|| black_box(black_box(&gridref).to_lat_lon()));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_height_cached,
    bench_decode_cold,
    bench_to_lat_lon,
);
criterion_main!(benches);
