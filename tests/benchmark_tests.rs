//! Performance benchmarks for critical game systems

use client::connection::ConnectionEvents;
use client::game::{ClientConfig, ClientGameState};
use server::collision;
use server::config::GameConfig;
use server::game::Game;
use server::store::EntityStore;
use shared::{
    check_collision, Enemy, EnemyKind, InputState, Owner, Player, Projectile, Rect, ServerMessage,
};
use std::time::Instant;

fn running_game(players: u32) -> Game {
    let mut game = Game::with_seed(GameConfig::default(), 99);
    for id in 1..=players {
        game.add_player(id, shared::PLAYER_COLORS[id as usize % 10]);
    }
    game.start(0).unwrap();
    game
}

/// Benchmarks raw AABB overlap tests
#[test]
fn benchmark_collision_check() {
    let a = Rect::centered(100.0, 100.0, 40.0, 40.0);
    let b = Rect::centered(110.0, 110.0, 8.0, 16.0);

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = check_collision(&a, &b);
    }

    let duration = start.elapsed();
    println!(
        "Collision check: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks a full collision pass over a crowded field
#[test]
fn benchmark_collision_detection_pass() {
    let mut store = EntityStore::new();
    for id in 1..=10 {
        store.insert_player(Player::new(id, "#FF0000"));
    }
    for id in 0..200 {
        store.insert_player_projectile(Projectile {
            id,
            owner_id: Owner::Player(1),
            x: (id * 5) as f32,
            y: 300.0,
            vx: 0.0,
            vy: -400.0,
            kind: None,
        });
        store.insert_enemy_projectile(Projectile {
            id: 1000 + id,
            owner_id: Owner::Enemy,
            x: (id * 5) as f32,
            y: 500.0,
            vx: 0.0,
            vy: 200.0,
            kind: None,
        });
    }
    let enemies: Vec<Enemy> = (0..21)
        .map(|i| Enemy::new(i, EnemyKind::Normal, 362.0 + (i % 7) as f32 * 50.0, 160.0))
        .collect();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = collision::detect(&store, &enemies);
    }

    let duration = start.elapsed();
    println!(
        "Collision pass: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks snapshot serialization with a full room
#[test]
fn benchmark_snapshot_encoding() {
    let game = running_game(10);
    let snapshot = game.snapshot();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = ServerMessage::AuthoritativeState(snapshot.clone())
            .encode()
            .unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Snapshot encoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks server ticks against the 60Hz budget
#[test]
fn benchmark_tick() {
    let mut game = running_game(10);
    let input = InputState {
        right: true,
        fire: true,
        ..Default::default()
    };

    let iterations = 1_000;
    let start = Instant::now();

    let mut now = 0;
    for _ in 0..iterations {
        now += 16;
        for id in 1..=10 {
            game.apply_input(id, input);
        }
        if game.tick(now).is_none() {
            game.request_restart(now).unwrap();
        }
    }

    let duration = start.elapsed();
    let per_tick = duration.as_micros() as f64 / iterations as f64;
    println!(
        "Server tick: {} iterations in {:?} ({:.2} μs/tick)",
        iterations, duration, per_tick
    );

    // A tick must fit comfortably inside 16.6ms
    assert!(per_tick < 16_666.0);
}

/// Benchmarks client reconciliation of full snapshots
#[test]
fn benchmark_client_reconciliation() {
    let mut game = running_game(10);
    let mut state = ClientGameState::new(ClientConfig::default());
    state.on_welcome(shared::Welcome {
        id: 1,
        color: "#FF0000".to_string(),
    });

    let iterations = 1_000;
    let start = Instant::now();

    let mut now = 0;
    for _ in 0..iterations {
        now += 16;
        let snapshot = match game.tick(now) {
            Some(snapshot) => snapshot,
            None => {
                game.request_restart(now).unwrap();
                game.snapshot()
            }
        };
        state.set_time(now);
        state.on_state(snapshot);
        state.frame(now, 0.016);
        let _ = state.drain_commands();
    }

    let duration = start.elapsed();
    println!(
        "Client reconciliation: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}
