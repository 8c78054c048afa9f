use crate::config::{AgentRules, GridConfig};
use crate::policy::{Observation, Policy, argmax};
use crate::pos::{Action, Heading, Pos};
use ahash::AHashSet;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Board dimensions plus the rules every agent on it follows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: i32,
    pub height: i32,
    pub rules: AgentRules,
}

impl Arena {
    pub fn new(grid: GridConfig, rules: AgentRules) -> Self {
        Self { width: grid.width as i32, height: grid.height as i32, rules }
    }

    pub fn contains(&self, p: Pos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Death {
    Wall,
    Body,
    Starved,
    /// Every cell is covered by the body; nothing left to eat.
    BoardFull,
}

/// One snake driven by its own policy.
#[derive(Debug, Clone)]
pub struct Agent {
    body: VecDeque<Pos>,
    occupied: AHashSet<Pos>,
    heading: Heading,
    target: Pos,
    alive: bool,
    death: Option<Death>,
    score: u32,
    age_since_target: u32,
    policy: Policy,
    arena: Arena,
    rng: SmallRng,
}

impl Agent {
    /// Random one-cell body, heading and target. The agent's private RNG is
    /// seeded from `rng` so later target draws do not depend on step order.
    pub fn spawn<R: Rng + ?Sized>(policy: Policy, arena: Arena, rng: &mut R) -> Self {
        let head = Pos::new(rng.gen_range(0..arena.width), rng.gen_range(0..arena.height));
        let heading = Heading::random(rng);
        let seed: u64 = rng.r#gen();
        Self::new(policy, arena, vec![head], heading, seed)
    }

    /// `body` is head-first and must hold unique in-bounds cells.
    pub fn new(policy: Policy, arena: Arena, body: Vec<Pos>, heading: Heading, seed: u64) -> Self {
        debug_assert!(!body.is_empty());
        let occupied: AHashSet<Pos> = body.iter().copied().collect();
        debug_assert_eq!(occupied.len(), body.len());
        debug_assert!(body.iter().all(|p| arena.contains(*p)));

        let mut agent = Self {
            body: body.into(),
            occupied,
            heading,
            target: Pos::new(0, 0),
            alive: true,
            death: None,
            score: 0,
            age_since_target: 0,
            policy,
            arena,
            rng: SmallRng::seed_from_u64(seed),
        };
        match agent.free_cell() {
            Some(target) => agent.target = target,
            None => agent.kill(Death::BoardFull),
        }
        agent
    }

    /// Replaces the target; `target` must not be on the body.
    pub fn with_target(mut self, target: Pos) -> Self {
        debug_assert!(!self.occupied.contains(&target));
        self.target = target;
        self
    }

    pub fn head(&self) -> Pos {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Pos> {
        &self.body
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn target(&self) -> Pos {
        self.target
    }

    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn death(&self) -> Option<Death> {
        self.death
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn age_since_target(&self) -> u32 {
        self.age_since_target
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// `score * K + length`: reaching targets dominates, length breaks ties.
    pub fn fitness(&self) -> u64 {
        self.score as u64 * self.arena.rules.score_weight + self.body.len() as u64
    }

    /// Cell in the given direction is a wall or part of the body.
    fn danger(&self, heading: Heading) -> bool {
        let p = self.head().offset(heading);
        !self.arena.contains(p) || self.occupied.contains(&p)
    }

    pub fn observe(&self) -> Observation {
        let head = self.head();
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let (ux, uy) = self.heading.unit();
        [
            (self.target.x - head.x) as f64 / self.arena.width as f64,
            (self.target.y - head.y) as f64 / self.arena.height as f64,
            flag(self.danger(self.heading)),
            flag(self.danger(self.heading.clockwise())),
            flag(self.danger(self.heading.counter_clockwise())),
            ux as f64,
            uy as f64,
            self.body.len() as f64 / self.arena.rules.length_norm,
        ]
    }

    pub fn decide(&self) -> Action {
        Action::from_index(argmax(&self.policy.forward(&self.observe())))
    }

    pub fn step(&mut self) {
        if !self.alive {
            return;
        }

        let heading = self.decide().apply(self.heading);
        let new_head = self.head().offset(heading);

        let death = if !self.arena.contains(new_head) {
            Some(Death::Wall)
        } else if self.occupied.contains(&new_head) {
            Some(Death::Body)
        } else if self.age_since_target >= self.arena.rules.max_steps_without_target {
            Some(Death::Starved)
        } else {
            None
        };
        if let Some(cause) = death {
            self.kill(cause);
            return;
        }

        self.heading = heading;
        self.body.push_front(new_head);
        self.occupied.insert(new_head);

        if new_head == self.target {
            self.score += 1;
            self.age_since_target = 0;
            match self.free_cell() {
                Some(target) => self.target = target,
                None => self.kill(Death::BoardFull),
            }
        } else {
            if let Some(tail) = self.body.pop_back() {
                self.occupied.remove(&tail);
            }
            self.age_since_target += 1;
        }
    }

    fn kill(&mut self, cause: Death) {
        self.alive = false;
        self.death = Some(cause);
    }

    /// Uniform over cells not covered by the body.
    fn free_cell(&mut self) -> Option<Pos> {
        let total = self.arena.cells();
        let free = total.checked_sub(self.body.len()).filter(|&n| n > 0)?;

        // Rejection sampling while the board is mostly empty.
        if self.body.len() * 2 < total {
            loop {
                let p = Pos::new(
                    self.rng.gen_range(0..self.arena.width),
                    self.rng.gen_range(0..self.arena.height),
                );
                if !self.occupied.contains(&p) {
                    return Some(p);
                }
            }
        }

        let nth = self.rng.gen_range(0..free);
        let (w, h) = (self.arena.width, self.arena.height);
        (0..h)
            .flat_map(|y| (0..w).map(move |x| Pos::new(x, y)))
            .filter(|p| !self.occupied.contains(p))
            .nth(nth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{HIDDEN, INPUTS, OUTPUTS};

    fn arena(width: u16, height: u16, max_steps: u32) -> Arena {
        let grid = GridConfig { width, height, ..GridConfig::default() };
        let rules = AgentRules { max_steps_without_target: max_steps, ..AgentRules::default() };
        Arena::new(grid, rules)
    }

    fn straight(arena: Arena, body: Vec<Pos>, heading: Heading, target: Pos) -> Agent {
        Agent::new(Policy::zeroed(), arena, body, heading, 1).with_target(target)
    }

    #[test]
    fn observation_layout() {
        let agent = straight(
            arena(20, 10, 300),
            vec![Pos::new(0, 5), Pos::new(0, 6)],
            Heading::Up,
            Pos::new(10, 0),
        );
        let obs = agent.observe();
        assert_eq!(obs[0], 0.5);
        assert_eq!(obs[1], -0.5);
        assert_eq!(obs[2], 0.0, "ahead is free");
        assert_eq!(obs[3], 0.0, "clockwise from up is right, free");
        assert_eq!(obs[4], 1.0, "counter-clockwise from up is the left wall");
        assert_eq!((obs[5], obs[6]), (0.0, -1.0));
        assert_eq!(obs[7], 2.0 / 100.0);
    }

    #[test]
    fn body_counts_as_danger() {
        let agent = straight(
            arena(10, 10, 300),
            vec![Pos::new(2, 2), Pos::new(3, 2), Pos::new(3, 3), Pos::new(2, 3)],
            Heading::Left,
            Pos::new(8, 8),
        );
        let obs = agent.observe();
        assert_eq!(obs[2], 0.0);
        assert_eq!(obs[3], 0.0, "clockwise from left is up");
        assert_eq!(obs[4], 1.0, "counter-clockwise from left is down, onto the body");
    }

    #[test]
    fn starves_after_exactly_the_ceiling() {
        let mut agent = straight(arena(20, 20, 10), vec![Pos::new(0, 0)], Heading::Right, Pos::new(0, 19));
        for i in 0..10 {
            agent.step();
            assert!(agent.alive(), "died early at step {i}");
        }
        assert_eq!(agent.head(), Pos::new(10, 0));
        agent.step();
        assert!(!agent.alive());
        assert_eq!(agent.death(), Some(Death::Starved));
        assert_eq!(agent.head(), Pos::new(10, 0));
        assert_eq!(agent.fitness(), 1);
    }

    #[test]
    fn eating_grows_and_retargets() {
        let mut agent = straight(arena(10, 10, 300), vec![Pos::new(2, 2)], Heading::Right, Pos::new(5, 2));
        agent.step();
        agent.step();
        assert_eq!(agent.age_since_target(), 2);
        agent.step();
        assert_eq!(agent.score(), 1);
        assert_eq!(agent.body().len(), 2);
        assert_eq!(agent.age_since_target(), 0);
        assert_eq!(agent.body().iter().copied().collect::<Vec<_>>(), vec![Pos::new(5, 2), Pos::new(4, 2)]);
        assert!(!agent.body().contains(&agent.target()));
        assert_eq!(agent.fitness(), 300 + 2);
    }

    #[test]
    fn wall_kills_without_moving() {
        let mut agent = straight(arena(20, 20, 300), vec![Pos::new(18, 0)], Heading::Right, Pos::new(0, 5));
        agent.step();
        assert!(agent.alive());
        agent.step();
        assert_eq!(agent.death(), Some(Death::Wall));
        assert_eq!(agent.head(), Pos::new(19, 0));
    }

    #[test]
    fn self_collision_kills() {
        let mut agent = straight(
            arena(10, 10, 300),
            vec![Pos::new(2, 2), Pos::new(3, 2), Pos::new(3, 3), Pos::new(2, 3)],
            Heading::Down,
            Pos::new(8, 8),
        );
        agent.step();
        assert_eq!(agent.death(), Some(Death::Body));
        assert_eq!(agent.body().len(), 4);
    }

    #[test]
    fn stepping_dead_agent_is_noop() {
        let mut agent = straight(arena(10, 10, 300), vec![Pos::new(9, 9)], Heading::Down, Pos::new(0, 0));
        agent.step();
        assert!(!agent.alive());
        let before = (agent.body().clone(), agent.heading(), agent.target(), agent.score(), agent.age_since_target());
        for _ in 0..5 {
            agent.step();
        }
        let after = (agent.body().clone(), agent.heading(), agent.target(), agent.score(), agent.age_since_target());
        assert_eq!(before, after);
    }

    #[test]
    fn filling_the_board_ends_the_run() {
        let mut agent = straight(
            arena(2, 2, 300),
            vec![Pos::new(0, 0), Pos::new(1, 0), Pos::new(1, 1)],
            Heading::Down,
            Pos::new(0, 1),
        );
        agent.step();
        assert_eq!(agent.score(), 1);
        assert_eq!(agent.death(), Some(Death::BoardFull));
        assert_eq!(agent.fitness(), 300 + 4);
    }

    #[test]
    fn random_runs_keep_body_valid() {
        let mut rng = SmallRng::seed_from_u64(2024);
        let arena = arena(8, 8, 60);
        for _ in 0..50 {
            let mut agent = Agent::spawn(Policy::random(&mut rng), arena, &mut rng);
            for _ in 0..200 {
                agent.step();
                if !agent.alive() {
                    break;
                }
                let unique: AHashSet<Pos> = agent.body().iter().copied().collect();
                assert_eq!(unique.len(), agent.body().len());
                assert!(agent.body().iter().all(|p| arena.contains(*p)));
                assert!(!unique.contains(&agent.target()));
            }
        }
    }

    #[test]
    fn spawn_is_reproducible() {
        let arena = arena(12, 12, 300);
        let mut a = SmallRng::seed_from_u64(5);
        let mut b = SmallRng::seed_from_u64(5);
        let x = Agent::spawn(Policy::random(&mut a), arena, &mut a);
        let y = Agent::spawn(Policy::random(&mut b), arena, &mut b);
        assert_eq!(x.body(), y.body());
        assert_eq!(x.heading(), y.heading());
        assert_eq!(x.target(), y.target());
        assert_eq!(x.policy(), y.policy());
    }

    /// Drives output `action` through the constant length input.
    fn always(action: usize) -> Policy {
        let mut w1 = vec![vec![0.0; HIDDEN]; INPUTS];
        let mut w2 = vec![vec![0.0; OUTPUTS]; HIDDEN];
        w1[7][0] = 100.0;
        w2[0][action] = 1.0;
        Policy::from_matrices(&w1, &w2).expect("shape")
    }

    #[test]
    fn turns_commit_the_rotated_heading() {
        let cases = [
            (1, Heading::Right, Pos::new(6, 5)),
            (2, Heading::Left, Pos::new(4, 5)),
            (3, Heading::Up, Pos::new(5, 4)),
        ];
        for (action, heading, head) in cases {
            let mut agent = Agent::new(always(action), arena(10, 10, 300), vec![Pos::new(5, 5)], Heading::Up, 1)
                .with_target(Pos::new(0, 9));
            assert_eq!(agent.decide(), Action::from_index(action));
            agent.step();
            assert!(agent.alive());
            assert_eq!(agent.heading(), heading, "action {action}");
            assert_eq!(agent.head(), head, "action {action}");
        }
    }

    #[test]
    fn large_boards_count_cells_without_overflow() {
        let arena = arena(50_000, 50_000, 300);
        assert_eq!(arena.cells(), 2_500_000_000);
        let mut rng = SmallRng::seed_from_u64(9);
        let agent = Agent::spawn(Policy::zeroed(), arena, &mut rng);
        assert!(agent.alive());
        assert!(arena.contains(agent.target()));
        assert_ne!(agent.target(), agent.head());
    }
}
