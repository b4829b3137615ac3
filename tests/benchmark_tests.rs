//! Performance benchmarks for critical session paths

use bincode::{deserialize, serialize};
use server::grid::Grid;
use server::session::GridSession;
use shared::{normalize_char, Packet, MAX_GRID_DIM};
use std::time::Instant;

/// Benchmarks filling every cell of the largest allowed grid
#[test]
fn benchmark_full_grid_commits() {
    let cells = (MAX_GRID_DIM * MAX_GRID_DIM) as u32;
    let iterations = 10;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut session = GridSession::new(MAX_GRID_DIM, MAX_GRID_DIM);
        for id in 1..=cells {
            session.on_connect(id);
            let cell = (id - 1) as i32;
            let row = cell / MAX_GRID_DIM as i32;
            let col = cell % MAX_GRID_DIM as i32;
            session.on_update_request(id, row, col, "#");
        }
        assert_eq!(session.history().len(), cells as usize);
    }

    let duration = start.elapsed();
    println!(
        "Full grid commits: {} sessions of {} commits in {:?} ({:.2} μs/commit)",
        iterations,
        cells,
        duration,
        duration.as_micros() as f64 / (iterations * cells) as f64
    );

    // InitState carries the whole history, so connects grow with it
    assert!(duration.as_secs() < 10);
}

/// Benchmarks the rejection path, which must stay cheap under spam
#[test]
fn benchmark_rejections() {
    let mut session = GridSession::new(10, 10);
    session.on_connect(1);
    session.on_connect(2);
    session.on_update_request(1, 0, 0, "x");

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        if i % 2 == 0 {
            session.on_update_request(1, 1, 1, "y");
        } else {
            session.on_update_request(2, 0, 0, "z");
        }
    }

    let duration = start.elapsed();
    println!(
        "Rejections: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(session.history().len(), 1);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks snapshot + encode + decode of a full InitState
#[test]
fn benchmark_init_state_encoding() {
    let mut session = GridSession::new(MAX_GRID_DIM, MAX_GRID_DIM);
    for id in 1..=(MAX_GRID_DIM * MAX_GRID_DIM) as u32 {
        session.on_connect(id);
        let cell = (id - 1) as i32;
        session.on_update_request(
            id,
            cell / MAX_GRID_DIM as i32,
            cell % MAX_GRID_DIM as i32,
            "\u{1F600}",
        );
    }

    let iterations = 200;
    let start = Instant::now();

    for _ in 0..iterations {
        let packet = Packet::InitState {
            grid: session.grid().snapshot(),
            history: session.history().to_vec(),
            you_id: 1,
        };
        let data = serialize(&packet).unwrap();
        let _: Packet = deserialize(&data).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "InitState encoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 10);
}

/// Benchmarks character validation
#[test]
fn benchmark_normalize_char() {
    let inputs = ["x", "  y  ", "e\u{301}", "\u{1F600}", "", "ab"];
    let iterations = 100_000;
    let start = Instant::now();

    let mut accepted = 0;
    for i in 0..iterations {
        if normalize_char(inputs[i % inputs.len()]).is_some() {
            accepted += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "normalize_char: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(accepted > 0);
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks replaying a full history
#[test]
fn benchmark_history_replay() {
    let mut session = GridSession::new(MAX_GRID_DIM, MAX_GRID_DIM);
    for id in 1..=(MAX_GRID_DIM * MAX_GRID_DIM) as u32 {
        session.on_connect(id);
        let cell = (id - 1) as i32;
        session.on_update_request(
            id,
            cell / MAX_GRID_DIM as i32,
            cell % MAX_GRID_DIM as i32,
            "o",
        );
    }

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let replayed = Grid::replay(MAX_GRID_DIM, MAX_GRID_DIM, session.history());
        assert_eq!(&replayed, session.grid());
    }

    let duration = start.elapsed();
    println!(
        "History replay: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 10);
}
