// SPDX-FileCopyrightText: 2023 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{criterion_group, criterion_main, Bencher, Criterion};

use gpioline::{AbiVersion, CdevLine, Direction};
use gpiosim::Simpleton;

criterion_group!(benches, benchmarks);
criterion_main!(benches);

fn benchmarks(c: &mut Criterion) {
    for abiv in [AbiVersion::V1, AbiVersion::V2] {
        c.bench_function(&format!("{abiv} read"), |b| read(b, abiv));
        c.bench_function(&format!("{abiv} write"), |b| write(b, abiv));
    }
}

// determine time taken to read a line
fn read(b: &mut Bencher, abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let l = CdevLine::builder(s.dev_path(), 1, Direction::In)
        .using_abi_version(abiv)
        .open()
        .unwrap();

    b.iter(|| l.read().unwrap());
}

// determine time taken to write a line
fn write(b: &mut Bencher, abiv: AbiVersion) {
    let s = Simpleton::new(4);
    let l = CdevLine::builder(s.dev_path(), 1, Direction::Out)
        .using_abi_version(abiv)
        .open()
        .unwrap();
    let mut value = false;

    b.iter(|| {
        value = !value;
        l.write(value).unwrap();
    });
}
