//! Benchmark suite for account engine operations
//!
//! Measures the OCC cycle against the in-memory store using the divan
//! benchmarking framework, both uncontended and with many tasks hitting
//! one account.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//! ```

use bank_rpc::{AccountEngine, EngineConfig, MemoryStore, RetryPolicy};
use futures::future::join_all;
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

fn main() {
    divan::main();
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .expect("Failed to build runtime")
}

fn engine(max_attempts: u32) -> AccountEngine<MemoryStore> {
    AccountEngine::new(
        MemoryStore::new(),
        EngineConfig {
            retry: RetryPolicy::new(max_attempts),
        },
    )
}

/// Sequential deposits into one account
#[divan::bench(args = [100, 1_000])]
fn sequential_deposits(bencher: divan::Bencher, count: usize) {
    let rt = runtime();
    bencher.bench_local(|| {
        rt.block_on(async {
            let engine = engine(3);
            engine.create_account("acct", "savings").await.expect("create failed");
            for _ in 0..count {
                engine.deposit("acct", Decimal::ONE).await.expect("deposit failed");
            }
        })
    });
}

/// Concurrent deposits into one account, retried until they commit
#[divan::bench(args = [100, 1_000])]
fn contended_deposits(bencher: divan::Bencher, count: usize) {
    let rt = runtime();
    bencher.bench_local(|| {
        rt.block_on(async {
            let engine = engine(u32::MAX);
            engine.create_account("acct", "savings").await.expect("create failed");
            let handles: Vec<_> = (0..count)
                .map(|_| {
                    let engine = engine.clone();
                    tokio::spawn(async move { engine.deposit("acct", Decimal::ONE).await })
                })
                .collect();
            for result in join_all(handles).await {
                result.expect("task panicked").expect("deposit failed");
            }
        })
    });
}

/// Concurrent deposits spread over distinct accounts
#[divan::bench(args = [100, 1_000])]
fn spread_deposits(bencher: divan::Bencher, count: usize) {
    let rt = runtime();
    bencher.bench_local(|| {
        rt.block_on(async {
            let engine = engine(3);
            let handles: Vec<_> = (0..count)
                .map(|i| {
                    let engine = engine.clone();
                    tokio::spawn(async move {
                        let id = format!("acct-{}", i);
                        engine.create_account(&id, "checking").await?;
                        engine.deposit(&id, Decimal::ONE).await
                    })
                })
                .collect();
            for result in join_all(handles).await {
                result.expect("task panicked").expect("deposit failed");
            }
        })
    });
}
