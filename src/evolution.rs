//! Generational transition: rank, keep elites, breed the rest from the top of
//! the ranking.

use crate::agent::{Agent, Arena};
use crate::config::EvolutionParams;
use crate::population::Population;
use rand::Rng;
use tracing::debug;

/// Sorts by descending fitness. The sort is stable, so equal fitness keeps
/// the previous relative order.
pub fn rank(agents: &mut [Agent]) {
    agents.sort_by(|a, b| b.fitness().cmp(&a.fitness()));
}

/// Produces generation `g + 1` of the same size. Every new agent gets a fresh
/// body, heading and target; only policies are inherited.
pub fn evolve<R: Rng + ?Sized>(
    population: Population,
    params: &EvolutionParams,
    arena: Arena,
    rng: &mut R,
) -> Population {
    let generation = population.generation();
    let mut ranked = population.into_agents();
    rank(&mut ranked);

    let size = ranked.len();
    let elite_count = params.elite_count(size).min(size);
    let pool = params.parent_pool.clamp(1, size.max(1));
    debug!(generation, size, elite_count, pool, "evolving population");

    let mut next = Vec::with_capacity(size);
    for elite in &ranked[..elite_count] {
        next.push(Agent::spawn(elite.policy().clone(), arena, rng));
    }
    while next.len() < size {
        let parent = &ranked[rng.gen_range(0..pool)];
        let mut child = parent.policy().clone();
        child.mutate(rng, params.mutation_rate, params.mutation_magnitude);
        next.push(Agent::spawn(child, arena, rng));
    }

    Population::from_agents(next, generation + 1)
}
