// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for the button-to-task handoff.

use board_io::{Debouncer, TaskLatch};
use criterion::{criterion_group, criterion_main, Criterion};
use std::time::{Duration, Instant};

fn bench_park_and_signal(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let mut latch = TaskLatch::new();
    let token = latch.token();

    c.bench_function("park_and_signal", |b| {
        b.iter(|| {
            rt.block_on(async {
                let waker = {
                    let token = token.clone();
                    tokio::spawn(async move {
                        while !token.signal() {
                            tokio::task::yield_now().await;
                        }
                    })
                };
                latch.park().await;
                waker.await.expect("waker task");
            })
        })
    });
}

fn bench_signal_dropped(c: &mut Criterion) {
    let latch = TaskLatch::new();
    let token = latch.token();
    c.bench_function("signal_dropped", |b| b.iter(|| token.signal()));
}

fn bench_debounce_accept(c: &mut Criterion) {
    let mut debouncer = Debouncer::new(Duration::from_millis(50));
    let start = Instant::now();
    let mut tick = 0u64;
    c.bench_function("debounce_accept", |b| {
        b.iter(|| {
            tick += 1;
            debouncer.accept(start + Duration::from_millis(tick))
        })
    });
}

criterion_group!(
    benches,
    bench_park_and_signal,
    bench_signal_dropped,
    bench_debounce_accept
);
criterion_main!(benches);
