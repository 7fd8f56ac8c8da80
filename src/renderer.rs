use macroquad::prelude::*;

use crate::evaluation::{AgentView, RunState, Snapshot};

const SKY_COLOR: Color = Color::new(0.31, 0.75, 0.79, 1.0);
const LETTERBOX_COLOR: Color = Color::new(0.02, 0.03, 0.08, 1.0);
const GATE_COLOR: Color = Color::new(0.45, 0.75, 0.18, 1.0);
const GATE_EDGE: Color = Color::new(0.25, 0.45, 0.1, 1.0);
const GROUND_COLOR: Color = Color::new(0.87, 0.84, 0.58, 1.0);
const GROUND_STRIPE: Color = Color::new(0.55, 0.8, 0.3, 1.0);

/// Screen pixels per playfield unit so the whole playfield stays visible.
pub fn fit_scale(screen: Vec2, playfield: Vec2) -> f32 {
    if playfield.x <= 0.0 || playfield.y <= 0.0 {
        return 1.0;
    }
    (screen.x / playfield.x).min(screen.y / playfield.y).max(f32::EPSILON)
}

/// Camera centred on the playfield, letterboxed to the window.
fn playfield_camera(width: f32, height: f32) -> Camera2D {
    let scale = fit_scale(vec2(screen_width(), screen_height()), vec2(width, height));
    Camera2D {
        target: vec2(width * 0.5, height * 0.5),
        zoom: vec2(
            scale / screen_width() * 2.0,
            -scale / screen_height() * 2.0,
        ),
        ..Default::default()
    }
}

/// Draw one frame of the run. `width`/`height` are the playfield size.
pub fn draw(snapshot: &Snapshot, width: f32, height: f32, agent_size: Vec2) {
    clear_background(LETTERBOX_COLOR);

    set_camera(&playfield_camera(width, height));
    draw_rectangle(0.0, 0.0, width, height, SKY_COLOR);

    for gate in &snapshot.gates {
        // Top barrier hangs from the ceiling, bottom barrier rests on the ground.
        draw_barrier(gate.x, 0.0, gate.width, gate.gap_top);
        draw_barrier(gate.x, gate.gap_bottom, gate.width, snapshot.ground_y - gate.gap_bottom);
    }

    for &x in &snapshot.ground {
        draw_rectangle(x, snapshot.ground_y, snapshot.ground_width, height - snapshot.ground_y, GROUND_COLOR);
        draw_rectangle(x, snapshot.ground_y, snapshot.ground_width, 8.0, GROUND_STRIPE);
    }

    for agent in snapshot.agents.iter().filter(|a| a.alive) {
        draw_agent(agent, agent_size);
    }

    set_default_camera();
    draw_hud(snapshot);
}

fn draw_barrier(x: f32, y: f32, w: f32, h: f32) {
    if h <= 0.0 {
        return;
    }
    draw_rectangle(x, y, w, h, GATE_COLOR);
    draw_rectangle_lines(x, y, w, h, 3.0, GATE_EDGE);
}

fn draw_agent(agent: &AgentView, size: Vec2) {
    let center = agent.pos + size * 0.5;
    // Positive tilt is nose-up; screen rotation is clockwise.
    let rotation = -agent.tilt.to_radians();
    let color = agent_color(agent.id.0);

    draw_rectangle_ex(
        center.x,
        center.y,
        size.x,
        size.y,
        DrawRectangleParams {
            offset: vec2(0.5, 0.5),
            rotation,
            color,
        },
    );

    let dir = Vec2::from_angle(rotation);
    let eye = center + dir * size.x * 0.28 - dir.perp() * size.y * 0.15;
    draw_circle(eye.x, eye.y, size.y * 0.12, WHITE);
    draw_circle(eye.x + dir.x * 2.0, eye.y + dir.y * 2.0, size.y * 0.05, BLACK);
}

/// Stable, distinct-ish colour per agent id.
fn agent_color(id: u32) -> Color {
    let hue = (id as f32 * 0.618_034).fract();
    let mut c = macroquad::color::hsl_to_rgb(hue, 0.75, 0.55);
    c.a = 0.9;
    c
}

fn draw_hud(snapshot: &Snapshot) {
    let tc = Color::new(1.0, 1.0, 1.0, 1.0);
    let sh = Color::new(0.0, 0.0, 0.0, 0.5);

    let score_text = format!("Score: {}", snapshot.score);
    let tw = measure_text(&score_text, None, 36, 1.0).width;
    let x = screen_width() - tw - 16.0;
    draw_text(&score_text, x + 2.0, 42.0, 36.0, sh);
    draw_text(&score_text, x, 40.0, 36.0, tc);

    let alive_text = format!("Alive: {}  Tick: {}", snapshot.live, snapshot.tick);
    draw_text(&alive_text, x + 1.0, 67.0, 18.0, sh);
    draw_text(&alive_text, x, 66.0, 18.0, tc);

    if snapshot.state == RunState::Terminal {
        let over = "GAME OVER";
        let tw = measure_text(over, None, 48, 1.0).width;
        let x = screen_width() * 0.5 - tw * 0.5;
        let y = screen_height() * 0.45;
        draw_text(over, x + 2.0, y + 2.0, 48.0, sh);
        draw_text(over, x, y, 48.0, Color::new(1.0, 0.8, 0.2, 0.95));
    }
}
