//! Blast Arena entry point
//!
//! Headless native runner: loads match settings, plays a scripted match with
//! simple autopilot inputs and logs the event stream.
//!
//! Usage: `blast-arena [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use blast_arena::consts::*;
    use blast_arena::sim::{Direction, GameEvent, GamePhase, GameState, TickInput, tick};
    use blast_arena::{Settings, Tuning};

    /// Simulated seconds before the runner gives up
    const MAX_MATCH_SECONDS: f32 = 180.0;
    /// Frame time fed to the accumulator (30 fps host)
    const FRAME_DT: f32 = 1.0 / 30.0;

    /// Match instance holding all state
    struct Match {
        state: GameState,
        accumulator: f32,
        input: TickInput,
        events: Vec<GameEvent>,
    }

    impl Match {
        fn new(state: GameState) -> Self {
            Self {
                state,
                accumulator: 0.0,
                input: TickInput::default(),
                events: Vec::new(),
            }
        }

        /// Scripted inputs: walk a slow square and drop a bomb every few seconds
        fn plan_inputs(&mut self) {
            let t = self.state.time_ticks;
            for (slot, command) in self.input.players.iter_mut().enumerate() {
                let phase = (t / 90 + slot as u64) % 4;
                command.direction = Some(Direction::ALL[phase as usize]);
                command.drop_bomb = (t + slot as u64 * 37) % 240 == 0;
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.plan_inputs();
                tick(&mut self.state, &self.input, SIM_DT, &mut self.events);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.pause = false;
                for command in &mut self.input.players {
                    command.drop_bomb = false;
                }
            }
        }

        fn drain_events(&mut self) {
            for event in self.events.drain(..) {
                match &event {
                    GameEvent::GameOver { .. } | GameEvent::PlayerDied { .. } => {
                        log::info!("{event:?}")
                    }
                    _ => log::debug!("{event:?}"),
                }
            }
        }
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let settings_path = args.next().unwrap_or_else(|| "settings.json".to_string());
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0xB0B);

        let tuning = Tuning::default();
        let settings = Settings::load_or_default(&settings_path).clamped(tuning.enemy_tiers());

        let mut events = Vec::new();
        let state = match GameState::new(settings, tuning, seed, &mut events) {
            Ok(state) => state,
            Err(err) => {
                log::error!("Could not start match: {err}");
                std::process::exit(1);
            }
        };

        println!("{}", state.arena.grid);
        let mut game = Match::new(state);
        game.events = events;
        game.drain_events();

        let mut elapsed = 0.0;
        while game.state.phase != GamePhase::GameOver && elapsed < MAX_MATCH_SECONDS {
            game.update(FRAME_DT);
            game.drain_events();
            elapsed += FRAME_DT;
        }

        if game.state.phase != GamePhase::GameOver {
            log::warn!("Match still running after {MAX_MATCH_SECONDS}s, stopping");
        }
        println!("{}", game.state.arena.grid);
        println!(
            "ticks: {}, enemies alive: {}, outcome: {:?}",
            game.state.time_ticks,
            game.state.round.enemies_alive(),
            game.state.round.outcome()
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Blast Arena (headless) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is a library on the web; there is no headless runner
}
