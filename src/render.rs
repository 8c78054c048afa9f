//! Pixel-buffer drawing of a session: boards, targets, HUD and the
//! best-score chart.

use snake_evo::{Agent, Mode, Session, TrainerConfig};

const BACKGROUND: [u8; 3] = [20, 20, 20];
const BEST_BODY: [u8; 3] = [0, 255, 0];
const BODY: [u8; 3] = [0, 80, 0];
const BEST_TARGET: [u8; 3] = [255, 0, 0];
const TARGET: [u8; 3] = [120, 0, 0];
const TEXT: [u8; 3] = [255, 255, 255];
const TEXT_SCALE: u32 = 2;
const CHART_H: u32 = 80;

pub fn frame_size(config: &TrainerConfig) -> (u32, u32) {
    let cell = config.grid.cell_px as u32;
    (config.grid.width as u32 * cell, config.grid.height as u32 * cell)
}

pub fn draw(frame: &mut [u8], session: &Session) {
    let (width, height) = frame_size(session.config());
    let mut canvas = Canvas { frame, width, height, cell: session.config().grid.cell_px as u32 };
    canvas.clear(BACKGROUND);

    let population = session.population();
    let best = population.best();
    let is_best = |a: &Agent| best.is_some_and(|b| std::ptr::eq(a, b));

    // Dimmed agents first so the leader stays on top.
    for agent in population.agents().iter().filter(|a| a.alive() && !is_best(*a)) {
        canvas.agent(agent, BODY, TARGET);
    }
    if let Some(agent) = best.filter(|a| a.alive()) {
        canvas.agent(agent, BEST_BODY, BEST_TARGET);
    }

    let mode = match session.mode() {
        Mode::Train => "TRAIN",
        Mode::Evaluate => "TEST",
    };
    let hud = format!(
        "GEN: {}  SPEED: {:.2}  MODE: {}  BEST: {}  ALIVE: {}/{}",
        session.generation(),
        session.speed().value(),
        mode,
        session.best_score(),
        population.alive_count(),
        population.len(),
    );
    canvas.text(&hud, 10, 10, TEXT);

    if session.mode() == Mode::Train {
        let scores: Vec<u32> = session.history().iter().map(|s| s.best_score).collect();
        let chart_w = (width / 3).max(60);
        canvas.chart(10, height.saturating_sub(CHART_H + 10), chart_w, CHART_H, &scores);
    }
}

struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    cell: u32,
}

impl Canvas<'_> {
    fn clear(&mut self, [r, g, b]: [u8; 3]) {
        for px in self.frame.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }

    fn blend(&mut self, x: u32, y: u32, [r, g, b]: [u8; 3], alpha: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let Some(px) = self.frame.get_mut(idx..idx + 4) else {
            return;
        };
        let a = alpha as u16;
        for (dst, src) in px.iter_mut().zip([r, g, b]) {
            *dst = ((src as u16 * a + *dst as u16 * (255 - a)) / 255) as u8;
        }
        px[3] = 255;
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3], alpha: u8) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.blend(px, py, color, alpha);
            }
        }
    }

    fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3], alpha: u8) {
        if w == 0 || h == 0 {
            return;
        }
        let (x2, y2) = (x + w - 1, y + h - 1);
        for px in x..=x2 {
            self.blend(px, y, color, alpha);
            self.blend(px, y2, color, alpha);
        }
        for py in y + 1..y2 {
            self.blend(x, py, color, alpha);
            self.blend(x2, py, color, alpha);
        }
    }

    fn agent(&mut self, agent: &Agent, body: [u8; 3], target: [u8; 3]) {
        let cell = self.cell;
        for p in agent.body() {
            self.fill_rect(p.x as u32 * cell, p.y as u32 * cell, cell, cell, body, 255);
        }
        let t = agent.target();
        self.fill_rect(t.x as u32 * cell, t.y as u32 * cell, cell, cell, target, 255);
    }

    fn text(&mut self, text: &str, x: u32, y: u32, color: [u8; 3]) {
        let advance = 6 * TEXT_SCALE;
        for (i, ch) in text.chars().enumerate() {
            let Some(rows) = glyph(ch) else { continue };
            let cx = x + i as u32 * advance;
            for (ry, &row) in rows.iter().enumerate() {
                for rx in 0..5u32 {
                    if (row >> (4 - rx)) & 1 == 1 {
                        let (px, py) = (cx + rx * TEXT_SCALE, y + ry as u32 * TEXT_SCALE);
                        self.fill_rect(px, py, TEXT_SCALE, TEXT_SCALE, color, 255);
                    }
                }
            }
        }
    }

    /// Bar chart of the most recent values that fit in `w`.
    fn chart(&mut self, x: u32, y: u32, w: u32, h: u32, data: &[u32]) {
        self.fill_rect(x, y, w, h, [0, 0, 0], 140);
        self.stroke_rect(x, y, w, h, [200, 200, 200], 120);
        let max = data.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return;
        }
        let bars = data.len().min((w / 4) as usize);
        let bar_w = ((w - 2) / bars as u32).max(2);
        for (i, v) in data[data.len() - bars..].iter().enumerate() {
            let bh = v * (h - 2) / max;
            let bx = x + 1 + i as u32 * bar_w;
            self.fill_rect(bx, y + h - 1 - bh, bar_w - 1, bh, [120, 180, 255], 160);
        }
    }
}

fn glyph(ch: char) -> Option<&'static [u8; 7]> {
    let ch = ch.to_ascii_uppercase();
    GLYPHS.iter().find(|(c, _)| *c == ch).map(|(_, rows)| rows)
}

/// 5x7 bitmap font; bit 4 is the leftmost column.
const GLYPHS: &[(char, [u8; 7])] = &[
    ('A', [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11]),
    ('B', [0x1E, 0x11, 0x1E, 0x11, 0x11, 0x11, 0x1E]),
    ('C', [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E]),
    ('D', [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C]),
    ('E', [0x1F, 0x10, 0x1E, 0x10, 0x10, 0x10, 0x1F]),
    ('F', [0x1F, 0x10, 0x1E, 0x10, 0x10, 0x10, 0x10]),
    ('G', [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0E]),
    ('H', [0x11, 0x11, 0x1F, 0x11, 0x11, 0x11, 0x11]),
    ('I', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x1F]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x12, 0x12, 0x0C]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F]),
    ('M', [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11]),
    ('O', [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('P', [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10]),
    ('Q', [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D]),
    ('R', [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11]),
    ('S', [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E]),
    ('T', [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x1B, 0x11]),
    ('X', [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04]),
    ('Z', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F]),
    ('0', [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E]),
    ('1', [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E]),
    ('2', [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F]),
    ('3', [0x1E, 0x01, 0x01, 0x0E, 0x01, 0x01, 0x1E]),
    ('4', [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02]),
    ('5', [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E]),
    ('6', [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E]),
    ('7', [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E]),
    ('9', [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C]),
    (':', [0x00, 0x04, 0x00, 0x00, 0x04, 0x00, 0x00]),
    ('+', [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00]),
    ('-', [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00]),
    (' ', [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C]),
    ('/', [0x01, 0x02, 0x02, 0x04, 0x08, 0x08, 0x10]),
];
