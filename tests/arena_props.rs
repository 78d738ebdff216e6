//! Property-based tests for arena generation and explosion propagation.
//!
//! Run with: cargo test --release arena_props

#![allow(clippy::unwrap_used)]

use glam::IVec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use blast_arena::sim::{
    ArenaConfig, BlastField, BlastParams, Cell, Direction, EnemyCountSource, Grid, LayerMask,
    generate, propagate,
};

struct Fixed(u32);

impl EnemyCountSource for Fixed {
    fn enemy_count(&mut self, _tier: usize, _rng: &mut Pcg32) -> u32 {
        self.0
    }
}

/// Explosion field backed by a bare grid
struct GridField {
    grid: Grid,
    cleared: Vec<IVec2>,
}

impl BlastField for GridField {
    fn layers_at(&self, cell: IVec2) -> LayerMask {
        self.grid.layers_at(cell)
    }

    fn clear_destructible(&mut self, cell: IVec2) {
        if self.grid.contains(cell) && self.grid.clear_soft_block(cell).unwrap() {
            self.cleared.push(cell);
        }
    }

    fn damage_at(&mut self, _cell: IVec2) {}
}

fn arb_config() -> impl Strategy<Value = ArenaConfig> {
    (
        5u32..=50,
        5u32..=50,
        0u32..=100,
        2u32..=6,
        any::<bool>(),
        0u32..=100,
    )
        .prop_map(
            |(width, height, probability, spawn_width, protection, drop_rate)| ArenaConfig {
                width,
                height,
                soft_block_probability: probability,
                spawn_width,
                spawn_protection: protection,
                items_drop_rate: drop_rate,
                enemy_tier: 0,
                players: 4,
                enemy_spawn_max_checks: 100,
            },
        )
}

fn blast(radius: u32, bypass: bool) -> BlastParams {
    BlastParams {
        radius,
        blocking_mask: LayerMask::HARD_BLOCK | LayerMask::SOFT_BLOCK,
        pass_through_mask: LayerMask::SOFT_BLOCK,
        bypass_soft_blocks: bypass,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The outer ring is always wall.
    #[test]
    fn prop_border_ring_is_blocked(config in arb_config(), seed in any::<u64>()) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let arena = generate(&config, &mut rng, &mut Fixed(3)).unwrap();
        let grid = &arena.grid;

        prop_assert_eq!(grid.dimensions(), IVec2::new(config.width as i32 + 2, config.height as i32 + 2));
        for (cell, state) in grid.iter() {
            let on_ring = cell.x == 0 || cell.y == 0
                || cell.x == grid.width() - 1 || cell.y == grid.height() - 1;
            prop_assert_eq!(on_ring, state == Cell::Border, "{}", cell);
        }
    }

    /// The hard block lattice looks the same after a half turn.
    #[test]
    fn prop_lattice_symmetric_under_rotation(config in arb_config(), seed in any::<u64>()) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let arena = generate(&config, &mut rng, &mut Fixed(3)).unwrap();
        let grid = &arena.grid;
        let far = grid.dimensions() - IVec2::ONE;

        for (cell, state) in grid.iter() {
            let mirrored = grid.cell(far - cell).unwrap();
            prop_assert_eq!(state == Cell::HardBlock, mirrored == Cell::HardBlock, "{}", cell);
        }
    }

    /// Spawn zones are open ground and the spawn points sit inside them.
    #[test]
    fn prop_spawn_zones_are_free(config in arb_config(), seed in any::<u64>()) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let arena = generate(&config, &mut rng, &mut Fixed(3)).unwrap();

        for (cell, state) in arena.grid.iter() {
            if arena.grid.is_within_spawn(cell).unwrap() {
                prop_assert_eq!(state, Cell::Free, "{}", cell);
            }
        }
        for point in arena.spawn_points() {
            prop_assert!(arena.grid.is_within_spawn(point).unwrap());
        }
        for &cell in &arena.free_tiles {
            prop_assert_eq!(arena.grid.cell(cell).unwrap(), Cell::Free);
            prop_assert!(!arena.grid.is_within_spawn(cell).unwrap());
        }
    }

    /// Same seed, same arena.
    #[test]
    fn prop_generation_is_deterministic(config in arb_config(), seed in any::<u64>()) {
        let a = generate(&config, &mut Pcg32::seed_from_u64(seed), &mut Fixed(3)).unwrap();
        let b = generate(&config, &mut Pcg32::seed_from_u64(seed), &mut Fixed(3)).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Fire stays on the origin's row and column within the radius, stops at
    /// the first soft block without bypass and never crosses a hard block.
    #[test]
    fn prop_propagation_bounded(
        config in arb_config(),
        seed in any::<u64>(),
        radius in 0u32..12,
        bypass in any::<bool>(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let arena = generate(&config, &mut rng, &mut Fixed(3)).unwrap();
        let open: Vec<IVec2> = arena
            .grid
            .iter()
            .filter(|(_, c)| *c == Cell::Free)
            .map(|(cell, _)| cell)
            .collect();
        prop_assume!(!open.is_empty());
        let origin = open[pick.index(open.len())];

        let before = arena.grid.clone();
        let mut field = GridField { grid: arena.grid, cleared: Vec::new() };
        let markers = propagate(&mut field, origin, &blast(radius, bypass));

        prop_assert!(markers.len() <= 1 + 4 * radius as usize);
        prop_assert_eq!(markers[0].cell, origin);

        for dir in Direction::ALL {
            let ray: Vec<IVec2> = markers
                .iter()
                .filter(|m| m.direction == Some(dir))
                .map(|m| m.cell)
                .collect();
            for (step, cell) in ray.iter().enumerate() {
                prop_assert_eq!(*cell, origin + dir.offset() * (step as i32 + 1));
                prop_assert!(matches!(before.cell(*cell).unwrap(), Cell::Free | Cell::SoftBlock));
            }

            let cleared_on_ray = field
                .cleared
                .iter()
                .filter(|c| {
                    let d = **c - origin;
                    d.x.signum() == dir.offset().x && d.y.signum() == dir.offset().y
                })
                .count();
            if !bypass {
                prop_assert!(cleared_on_ray <= 1);
                prop_assert!(ray.iter().all(|c| before.cell(*c).unwrap() == Cell::Free));
            }
        }

        for cell in &field.cleared {
            prop_assert_eq!(before.cell(*cell).unwrap(), Cell::SoftBlock);
            prop_assert_eq!(field.grid.cell(*cell).unwrap(), Cell::Free);
        }
    }
}
