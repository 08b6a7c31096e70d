use criterion::{Criterion, black_box, criterion_group, criterion_main};
use wgsync_core::conf::{parse_config, render_config};
use wgsync_core::diff::diff_peers;
use wgsync_core::model::{InterfaceRecord, PeerRecord, WireGuardConfig};
use std::path::Path;

fn peers(count: u32, shift: u32) -> Vec<PeerRecord> {
    (0..count)
        .map(|i| {
            let host = i + shift;
            PeerRecord::new(
                format!("key-{host:05}"),
                format!("10.{}.{}.{}/32", host / 65536, (host / 256) % 256, host % 256),
            )
        })
        .collect()
}

fn diff_benchmark(c: &mut Criterion) {
    let left = peers(250, 0);
    let right = peers(250, 10);

    c.bench_function("diff::diff_peers (250 peers, 10 changed)", |b| {
        b.iter(|| diff_peers(black_box(&left), black_box(&right)))
    });
}

fn conf_benchmark(c: &mut Criterion) {
    let mut interface = InterfaceRecord::new("wg0");
    interface.address = Some("10.0.0.1/16".into());
    let text = render_config(&WireGuardConfig::new(interface, peers(250, 0)));

    c.bench_function("conf::parse_config (250 peers)", |b| {
        b.iter(|| parse_config("wg0", black_box(&text), Path::new("wg0.conf")).unwrap())
    });
}

criterion_group!(benches, diff_benchmark, conf_benchmark);
criterion_main!(benches);
