//! Training session: owns the population, the best known policy and the
//! session RNG, and drives ticks in training or evaluation mode.

use crate::agent::Arena;
use crate::config::{ConfigError, TrainerConfig};
use crate::evolution::evolve;
use crate::persistence::{self, PersistError};
use crate::policy::Policy;
use crate::population::{GenerationSummary, Population};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Whole population, evolved whenever every agent is dead.
    Train,
    /// One agent replaying a fixed policy, respawned on death.
    Evaluate,
}

/// Simulation steps per tick, as a float so it can be tuned below 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed(f64);

impl Speed {
    pub const MIN: f64 = 0.25;
    pub const MAX: f64 = 200.0;
    const FINE: f64 = 0.25;
    const COARSE: f64 = 10.0;

    pub fn new(value: f64) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn steps_per_tick(self) -> usize {
        (self.0 as usize).max(1)
    }

    pub fn faster(self, coarse: bool) -> Self {
        Self::new(self.0 + if coarse { Self::COARSE } else { Self::FINE })
    }

    pub fn slower(self, coarse: bool) -> Self {
        Self::new(self.0 - if coarse { Self::COARSE } else { Self::FINE })
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Policy recorded by a save or load, with the generation it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BestPolicy {
    pub policy: Policy,
    pub generation: u32,
}

pub struct Session {
    config: TrainerConfig,
    arena: Arena,
    mode: Mode,
    population: Population,
    best: Option<BestPolicy>,
    rng: SmallRng,
    speed: Speed,
    history: Vec<GenerationSummary>,
    best_score: u32,
}

impl Session {
    /// Validates `config` and builds a random generation-1 population.
    pub fn new(config: TrainerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let arena = Arena::new(config.grid, config.rules);
        let population = Population::random(config.population_size, arena, 1, &mut rng);
        info!(
            population = config.population_size,
            width = config.grid.width,
            height = config.grid.height,
            seed = ?config.rng_seed,
            "training session started"
        );
        Ok(Self {
            config,
            arena,
            mode: Mode::Train,
            population,
            best: None,
            rng,
            speed: Speed::default(),
            history: Vec::new(),
            best_score: 0,
        })
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn generation(&self) -> u32 {
        self.population.generation()
    }

    pub fn best_policy(&self) -> Option<&BestPolicy> {
        self.best.as_ref()
    }

    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Highest score of any agent seen this session.
    pub fn best_score(&self) -> u32 {
        let current = self.population.agents().iter().map(|a| a.score()).max().unwrap_or(0);
        self.best_score.max(current)
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    pub fn speed_up(&mut self, coarse: bool) {
        self.speed = self.speed.faster(coarse);
    }

    pub fn slow_down(&mut self, coarse: bool) {
        self.speed = self.speed.slower(coarse);
    }

    /// Runs `speed.steps_per_tick()` simulation steps.
    pub fn tick(&mut self) {
        self.advance(self.speed.steps_per_tick());
    }

    /// Runs up to `steps` simulation steps. In training mode a generation
    /// transition ends the batch early.
    pub fn advance(&mut self, steps: usize) {
        for _ in 0..steps {
            match self.mode {
                Mode::Train => {
                    if self.population.all_dead() {
                        self.evolve_now();
                        break;
                    }
                    self.population.step_all();
                }
                Mode::Evaluate => self.step_evaluation(),
            }
        }
    }

    fn step_evaluation(&mut self) {
        let arena = self.arena;
        let generation = self.population.generation();
        let agents = self.population.agents_mut();
        let Some(agent) = agents.first_mut() else {
            return;
        };
        if !agent.alive() {
            debug!(score = agent.score(), death = ?agent.death(), "evaluation agent respawned");
            self.best_score = self.best_score.max(agent.score());
            let policy = agent.policy().clone();
            self.population = Population::single(policy, arena, generation, &mut self.rng);
        }
        self.population.step_all();
    }

    /// Replaces the current population with the next generation, whether or
    /// not every agent has died. No-op in evaluation mode.
    pub fn evolve_now(&mut self) {
        if self.mode != Mode::Train {
            return;
        }
        let summary = self.population.summary();
        self.best_score = self.best_score.max(summary.best_score);
        self.history.push(summary);
        info!(
            generation = summary.generation,
            best_fitness = summary.best_fitness,
            best_score = summary.best_score,
            mean_score = summary.mean_score,
            "generation finished"
        );

        let placeholder = Population::from_agents(Vec::new(), summary.generation);
        let finished = std::mem::replace(&mut self.population, placeholder);
        self.population = evolve(finished, &self.config.evolution, self.arena, &mut self.rng);
    }

    /// The saved/loaded policy if any, else the fittest agent on the board.
    fn best_known(&self) -> Option<BestPolicy> {
        self.best.clone().or_else(|| {
            self.population.best().map(|agent| BestPolicy {
                policy: agent.policy().clone(),
                generation: self.population.generation(),
            })
        })
    }

    /// Switches between training and evaluation.
    pub fn toggle_mode(&mut self) {
        match self.mode {
            Mode::Train => {
                let Some(best) = self.best_known() else {
                    warn!("no policy to evaluate");
                    return;
                };
                self.population = Population::single(best.policy, self.arena, best.generation, &mut self.rng);
                self.mode = Mode::Evaluate;
            }
            Mode::Evaluate => {
                self.population = match &self.best {
                    Some(best) => Population::from_policy(
                        &best.policy,
                        self.config.population_size,
                        self.arena,
                        &self.config.evolution,
                        best.generation,
                        &mut self.rng,
                    ),
                    None => Population::random(self.config.population_size, self.arena, 1, &mut self.rng),
                };
                self.mode = Mode::Train;
            }
        }
        info!(mode = ?self.mode, generation = self.generation(), "mode switched");
    }

    /// Records the fittest agent as the best known policy and writes it to
    /// the configured save path.
    pub fn save_best(&mut self) -> Result<(), PersistError> {
        let Some(agent) = self.population.best() else {
            warn!("nothing to save, population is empty");
            return Ok(());
        };
        let best = BestPolicy { policy: agent.policy().clone(), generation: self.population.generation() };
        persistence::save(&self.config.save_path, &best.policy, best.generation)?;
        self.best = Some(best);
        Ok(())
    }

    /// Loads the saved policy and starts evaluating it at its generation.
    /// On error nothing in the session changes.
    pub fn load_best(&mut self) -> Result<(), PersistError> {
        let saved = persistence::load(&self.config.save_path).inspect_err(|e| {
            warn!(path = %self.config.save_path.display(), error = %e, "load failed, keeping current state");
        })?;
        self.population = Population::single(saved.policy.clone(), self.arena, saved.generation, &mut self.rng);
        self.best = Some(BestPolicy { policy: saved.policy, generation: saved.generation });
        self.mode = Mode::Evaluate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_clamped() {
        let mut speed = Speed::default();
        assert_eq!(speed.steps_per_tick(), 1);
        for _ in 0..10 {
            speed = speed.slower(false);
        }
        assert_eq!(speed.value(), Speed::MIN);
        assert_eq!(speed.steps_per_tick(), 1);
        for _ in 0..30 {
            speed = speed.faster(true);
        }
        assert_eq!(speed.value(), Speed::MAX);
        assert_eq!(speed.steps_per_tick(), 200);
        assert_eq!(Speed::new(3.75).steps_per_tick(), 3);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = TrainerConfig { population_size: 0, ..TrainerConfig::default() };
        assert!(Session::new(config).is_err());
    }
}
