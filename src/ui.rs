use crate::evaluation::Snapshot;
use crate::stats::{RingBuffer, TrainingStats};

/// What the HUD panel shows besides the run itself.
pub struct HudInfo<'a> {
    pub mode: &'a str,
    pub generation: Option<u32>,
    pub best_fitness: Option<f32>,
    pub stats: Option<&'a TrainingStats>,
}

/// Which panels are open and whether the run is paused.
pub struct UiState {
    pub show_graphs: bool,
    pub paused: bool,
    pub speed: u32,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_graphs: true,
            paused: false,
            speed: 1,
        }
    }
}

/// Draw the egui overlay. Returns true while egui wants the pointer.
pub fn draw_ui(snapshot: &Snapshot, info: &HudInfo, ui_state: &mut UiState) -> bool {
    let mut wants_pointer = false;

    egui_macroquad::ui(|ctx| {
        egui::Window::new("Run")
            .default_pos(egui::pos2(10.0, 10.0))
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Mode: {}", info.mode));
                if let Some(generation) = info.generation {
                    ui.label(format!("Generation: {generation}"));
                }
                ui.label(format!("Alive: {} / {}", snapshot.live, snapshot.agents.len()));
                ui.label(format!("Score: {}", snapshot.score));
                if let Some(best) = info.best_fitness {
                    ui.label(format!("Best fitness: {best:.1}"));
                }
                if let Some(leader) = leader_fitness(snapshot) {
                    ui.label(format!("Leader this run: {leader:.1}"));
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let label = if ui_state.paused { "Resume" } else { "Pause" };
                    if ui.button(label).clicked() {
                        ui_state.paused = !ui_state.paused;
                    }
                    ui.add(egui::Slider::new(&mut ui_state.speed, 1..=16).text("speed"));
                });
                if info.stats.is_some() {
                    ui.checkbox(&mut ui_state.show_graphs, "Graphs");
                }
            });

        if let Some(stats) = info.stats.filter(|_| ui_state.show_graphs) {
            draw_graphs(ctx, stats);
        }

        wants_pointer = ctx.wants_pointer_input();
    });

    egui_macroquad::draw();
    wants_pointer
}

fn leader_fitness(snapshot: &Snapshot) -> Option<f32> {
    snapshot
        .agents
        .iter()
        .filter(|a| a.alive)
        .map(|a| a.fitness)
        .reduce(f32::max)
}

fn draw_graphs(ctx: &egui::Context, stats: &TrainingStats) {
    egui::Window::new("Training")
        .default_pos(egui::pos2(10.0, 260.0))
        .default_size(egui::vec2(320.0, 260.0))
        .resizable(true)
        .show(ctx, |ui| {
            if stats.best_fitness.is_empty() {
                ui.label("Waiting for the first generation");
                return;
            }
            ui.label("Fitness per generation");
            if let Some(peak) = stats.best_fitness.max() {
                ui.label(format!("Peak best: {peak:.1}"));
            }
            let size = egui::vec2(ui.available_width(), 90.0);
            let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
            let rect = response.rect;
            painter.rect_filled(rect, 2.0, egui::Color32::from_gray(20));
            let (lo, hi) = shared_range(&[&stats.best_fitness, &stats.mean_fitness]);
            draw_line_in_rect(&painter, &stats.best_fitness, rect, (lo, hi), egui::Color32::from_rgb(255, 200, 80));
            draw_line_in_rect(&painter, &stats.mean_fitness, rect, (lo, hi), egui::Color32::from_rgb(100, 180, 255));
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(255, 200, 80), "Best");
                ui.colored_label(egui::Color32::from_rgb(100, 180, 255), "Mean");
            });

            ui.collapsing("Score", |ui| {
                draw_line_graph(ui, &stats.score, egui::Color32::from_rgb(100, 200, 100));
            });
            ui.collapsing("Ticks survived", |ui| {
                draw_line_graph(ui, &stats.ticks, egui::Color32::from_rgb(200, 150, 255));
            });
        });
}

fn draw_line_graph(ui: &mut egui::Ui, buffer: &RingBuffer, color: egui::Color32) {
    let size = egui::vec2(ui.available_width(), 70.0);
    let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, 2.0, egui::Color32::from_gray(20));

    draw_line_in_rect(&painter, buffer, rect, shared_range(&[buffer]), color);

    if let Some(val) = buffer.last() {
        painter.text(
            egui::pos2(rect.right() - 4.0, rect.top() + 2.0),
            egui::Align2::RIGHT_TOP,
            format!("{val:.0}"),
            egui::FontId::proportional(10.0),
            egui::Color32::from_gray(200),
        );
    }
}

/// Common vertical range for several series, never thinner than 1.
fn shared_range(buffers: &[&RingBuffer]) -> (f32, f32) {
    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for v in buffers.iter().flat_map(|b| b.iter()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    (lo, hi.max(lo + 1.0))
}

fn draw_line_in_rect(
    painter: &egui::Painter,
    buffer: &RingBuffer,
    rect: egui::Rect,
    (lo, hi): (f32, f32),
    color: egui::Color32,
) {
    let len = buffer.len();
    if len < 2 {
        return;
    }
    let range = hi - lo;

    let points: Vec<egui::Pos2> = buffer
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = rect.left() + (i as f32 / (len - 1) as f32) * rect.width();
            let y = rect.bottom() - ((v - lo) / range) * rect.height();
            egui::pos2(x, y)
        })
        .collect();

    for pair in points.windows(2) {
        painter.line_segment([pair[0], pair[1]], egui::Stroke::new(1.5, color));
    }
}
