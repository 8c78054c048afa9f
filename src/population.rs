use crate::agent::{Agent, Arena};
use crate::config::EvolutionParams;
use crate::policy::Policy;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Statistics of one finished generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u32,
    pub best_fitness: u64,
    pub best_score: u32,
    pub mean_score: f64,
}

/// Agents that share one generation number.
#[derive(Debug, Clone)]
pub struct Population {
    agents: Vec<Agent>,
    generation: u32,
}

impl Population {
    pub fn from_agents(agents: Vec<Agent>, generation: u32) -> Self {
        Self { agents, generation }
    }

    /// `size` agents with freshly randomized policies.
    pub fn random<R: Rng + ?Sized>(size: usize, arena: Arena, generation: u32, rng: &mut R) -> Self {
        let agents = (0..size)
            .map(|_| {
                let policy = Policy::random(rng);
                Agent::spawn(policy, arena, rng)
            })
            .collect();
        Self { agents, generation }
    }

    /// Seeds a population from one policy: the first agent carries an exact
    /// copy, every other agent a mutated copy.
    pub fn from_policy<R: Rng + ?Sized>(
        policy: &Policy,
        size: usize,
        arena: Arena,
        params: &EvolutionParams,
        generation: u32,
        rng: &mut R,
    ) -> Self {
        let mut agents = Vec::with_capacity(size);
        if size > 0 {
            agents.push(Agent::spawn(policy.clone(), arena, rng));
        }
        while agents.len() < size {
            let mut child = policy.clone();
            child.mutate(rng, params.mutation_rate, params.mutation_magnitude);
            agents.push(Agent::spawn(child, arena, rng));
        }
        Self { agents, generation }
    }

    /// One agent running `policy` unchanged.
    pub fn single<R: Rng + ?Sized>(policy: Policy, arena: Arena, generation: u32, rng: &mut R) -> Self {
        Self { agents: vec![Agent::spawn(policy, arena, rng)], generation }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub(crate) fn agents_mut(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn into_agents(self) -> Vec<Agent> {
        self.agents
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.alive()).count()
    }

    pub fn all_dead(&self) -> bool {
        self.agents.iter().all(|a| !a.alive())
    }

    /// Fittest agent; the earliest one wins ties.
    pub fn best(&self) -> Option<&Agent> {
        self.agents
            .iter()
            .reduce(|best, a| if a.fitness() > best.fitness() { a } else { best })
    }

    /// Advances every live agent by one step. Agents only read their own
    /// state, so they are stepped in parallel.
    pub fn step_all(&mut self) {
        self.agents.par_iter_mut().for_each(Agent::step);
    }

    pub fn summary(&self) -> GenerationSummary {
        let best = self.best();
        let mean_score = if self.agents.is_empty() {
            0.0
        } else {
            self.agents.iter().map(|a| a.score() as f64).sum::<f64>() / self.agents.len() as f64
        };
        GenerationSummary {
            generation: self.generation,
            best_fitness: best.map_or(0, Agent::fitness),
            best_score: self.agents.iter().map(Agent::score).max().unwrap_or(0),
            mean_score,
        }
    }
}
