// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic follow-sync usage example.
//!
//! Demonstrates:
//! 1. Opening a session against a remote that already holds a follow list
//! 2. First mutation pulling the remote copy (initial sync)
//! 3. Following, re-following and unfollowing
//! 4. Paging newest-first
//! 5. A debounced push after a burst of mutations
//! 6. Displaying captured metrics
//! 7. Clean shutdown
//!
//! Runs fully in-process (in-memory store and remote).
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use std::sync::Arc;
use std::time::Duration;

use follow_sync::{
    FollowCodec, FollowRecord, FollowSource, FollowSync, FollowSyncConfig, InMemoryRemote,
    InMemoryStore, PostcardCodec, StaticToken,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().map_err(|e| e.to_string())?;

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║            follow-sync: Basic Usage Example                   ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. A remote written earlier by another device
    // ─────────────────────────────────────────────────────────────────────────
    let other_device = vec![FollowRecord {
        id: "rust-lang".into(),
        name: "Rust".into(),
        bio: "A language empowering everyone".into(),
        url: "https://img.example/rust.png".into(),
        time: 1_700_000_000_000,
    }];
    let remote = Arc::new(InMemoryRemote::with_payload(
        PostcardCodec.encode(1_700_000_000_000, &other_device)?,
    ));

    // Short debounce so the example finishes quickly
    let config = FollowSyncConfig {
        push_quiet_ms: 300,
        push_max_wait_ms: 1_500,
        ..Default::default()
    };
    let engine = Arc::new(FollowSync::new(
        config,
        Arc::new(InMemoryStore::new()),
        remote.clone(),
        Arc::new(StaticToken::new("demo-token")),
    )?);
    let push_loop = engine.spawn();
    let mut notices = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            println!("   💬 {}", notice);
        }
    });

    // ─────────────────────────────────────────────────────────────────────────
    // 2-3. Mutations (the first one pulls the remote list)
    // ─────────────────────────────────────────────────────────────────────────
    println!("📝 Following 3 accounts...");
    for (id, name) in [("ferris", "Ferris"), ("tokio-rs", "Tokio"), ("serde-rs", "Serde")] {
        let saved = engine
            .add_or_update(&FollowSource::new(id, name, "").with_image_url(format!("https://img.example/{}.png", id)))
            .await?;
        println!("   └─ {} @ {}", saved.id, saved.time);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    engine.add_or_update(&FollowSource::new("ferris", "Ferris the Crab", "🦀")).await?;
    engine.delete("serde-rs").await?;
    println!("   └─ count = {}", engine.count().await?);

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Page through newest-first
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📖 Page 0:");
    for record in engine.page(0).await? {
        println!("   └─ {:<10} {:<18} {}", record.id, record.name, record.time);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Let the debounced push fire
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n⏳ Waiting for debounced push...");
    tokio::time::sleep(Duration::from_millis(600)).await;
    if let Some(bytes) = remote.payload() {
        let snapshot = PostcardCodec.decode(&bytes)?;
        println!("   └─ remote holds {} follows @ {} ({} uploads)", snapshot.len(), snapshot.time, remote.stores());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📊 Metrics:");
    dump_metrics(&snapshotter);

    // ─────────────────────────────────────────────────────────────────────────
    // 7. Shutdown
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🛑 Shutting down...");
    engine.shutdown(true).await?;
    push_loop.await?;
    println!("   └─ state = {}\n", engine.state());

    Ok(())
}

fn dump_metrics(snapshotter: &Snapshotter) {
    let snapshot = snapshotter.snapshot();

    let mut counters: Vec<_> = vec![];
    let mut gauges: Vec<_> = vec![];
    let mut histograms: Vec<_> = vec![];

    for (composite_key, _, _, value) in snapshot.into_vec() {
        let (_, key) = composite_key.into_parts();
        let name = key.name().to_string();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() { String::new() } else { format!("{{{}}}", labels.join(",")) };

        match value {
            DebugValue::Counter(v) => counters.push((name, label_str, v)),
            DebugValue::Gauge(v) => gauges.push((name, label_str, v.into_inner())),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, label_str, count, sum));
            }
        }
    }

    counters.sort();
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, labels, value) in &counters {
        println!("   ├─ {}{} = {}", name, labels, value);
    }
    for (name, labels, value) in &gauges {
        println!("   ├─ {}{} = {:.0}", name, labels, value);
    }
    for (name, labels, count, sum) in &histograms {
        println!("   ├─ {}{} count={} sum={:.3}", name, labels, count, sum);
    }
    if counters.is_empty() && gauges.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
