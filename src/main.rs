use std::cell::RefCell;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use macroquad::prelude::*;

mod agent;
mod collision;
mod config;
mod controller;
mod error;
mod evaluation;
mod evolution;
mod gate;
mod genome;
mod ground;
mod kinematics;
mod logging;
mod mask;
mod network;
mod renderer;
mod reporting;
mod save_load;
mod stats;
mod trainer;
mod ui;

use collision::CollisionShapes;
use config::{ConfigFile, EvolutionConfig, SimConfig};
use controller::{Controller, Human, JumpLatch, Threshold};
use evaluation::{EvaluationLoop, RunState};
use mask::CollisionMask;
use trainer::Trainer;
use ui::{HudInfo, UiState};

/// Flappy-style flight, played by hand or by an evolving flock.
#[derive(Parser, Debug)]
#[command(name = "flock", author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// JSON file with `sim` and `evolution` sections
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Sprite whose alpha channel becomes the agent's collision mask
    #[arg(long, global = true)]
    agent_mask: Option<PathBuf>,
    /// Sprite for the bottom barrier; the top barrier uses it flipped
    #[arg(long, global = true)]
    barrier_mask: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fly a single agent with Space or the mouse
    Play {
        #[arg(long)]
        seed: Option<u64>,
        /// Let a gap-following autopilot fly instead
        #[arg(long, default_value_t = false)]
        autopilot: bool,
    },
    /// Evolve a population of neural controllers
    Train {
        /// Run without a window
        #[arg(long, default_value_t = false)]
        headless: bool,
        #[arg(long)]
        generations: Option<u32>,
        #[arg(long)]
        population: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Continue from a checkpoint file
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Write per-generation reports as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn window_conf(cfg: &SimConfig) -> Conf {
    Conf {
        window_title: "Flock".to_string(),
        window_width: cfg.width as i32,
        window_height: cfg.height as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let file = match &cli.config {
        Some(path) => {
            ConfigFile::load(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => ConfigFile::default(),
    };

    match cli.command {
        Commands::Play { seed, autopilot } => {
            let mut sim = file.sim;
            if let Some(seed) = seed {
                sim.seed = seed;
            }
            sim.validate()?;
            let shapes = load_shapes(&sim, cli.agent_mask.as_deref(), cli.barrier_mask.as_deref())?;
            run_window(window_conf(&sim), play(sim, shapes, autopilot))
        }
        Commands::Train {
            headless,
            generations,
            population,
            seed,
            resume,
            report,
        } => {
            let ConfigFile {
                mut sim,
                mut evolution,
            } = file;
            if let Some(seed) = seed {
                sim.seed = seed;
            }
            if let Some(generations) = generations {
                evolution.max_generations = generations;
            }
            if let Some(population) = population {
                evolution.population_size = population;
            }

            let shapes = load_shapes(&sim, cli.agent_mask.as_deref(), cli.barrier_mask.as_deref())?;
            let mut trainer = build_trainer(sim, evolution, resume.as_deref())?;
            if let Some(shapes) = shapes {
                trainer = trainer.with_shapes(shapes);
            }
            if headless {
                train_headless(trainer, report.as_deref())
            } else {
                let conf = window_conf(&trainer.sim_cfg);
                run_window(conf, train_windowed(trainer, report))
            }
        }
    }
}

/// Run `body` inside a macroquad window and hand its result back once the window closes.
fn run_window<F>(conf: Conf, body: F) -> Result<()>
where
    F: Future<Output = Result<()>> + 'static,
{
    let result: Rc<RefCell<Result<()>>> = Rc::new(RefCell::new(Ok(())));
    let slot = Rc::clone(&result);
    macroquad::Window::from_config(conf, async move {
        let outcome = body.await;
        *slot.borrow_mut() = outcome;
    });
    result.replace(Ok(()))
}

/// Masks built from sprite files, or `None` to keep the synthetic shapes.
fn load_shapes(
    sim: &SimConfig,
    agent: Option<&Path>,
    barrier: Option<&Path>,
) -> Result<Option<CollisionShapes>> {
    if agent.is_none() && barrier.is_none() {
        return Ok(None);
    }
    let defaults = CollisionShapes::from_config(sim);

    let agent_mask = match agent {
        Some(path) => CollisionMask::load(path)?,
        None => defaults.agent,
    };
    let barrier_mask = match barrier {
        Some(path) => CollisionMask::load(path)?,
        None => defaults.bottom_barrier,
    };
    if (barrier_mask.width, barrier_mask.height) != (sim.gate_width, sim.gate_barrier_height) {
        log::warn!(
            "barrier mask is {}x{}, gates are {}x{}",
            barrier_mask.width,
            barrier_mask.height,
            sim.gate_width,
            sim.gate_barrier_height
        );
    }
    Ok(Some(CollisionShapes::with_masks(sim, agent_mask, barrier_mask)))
}

fn build_trainer(sim: SimConfig, evo: EvolutionConfig, resume: Option<&Path>) -> Result<Trainer> {
    let Some(path) = resume else {
        return Ok(Trainer::new(sim, evo)?);
    };

    sim.validate()?;
    let population = save_load::load_from_file(path)
        .with_context(|| format!("resuming from {}", path.display()))?;
    if population.genomes.len() != evo.population_size {
        log::warn!(
            "checkpoint holds {} genomes; ignoring population size {}",
            population.genomes.len(),
            evo.population_size
        );
    }
    log::info!(
        "resumed at generation {} from {}",
        population.generation,
        path.display()
    );
    Ok(Trainer::resume(sim, evo, population))
}

fn train_headless(mut trainer: Trainer, report: Option<&Path>) -> Result<()> {
    trainer.run().context("training aborted")?;
    write_report(&trainer, report)
}

fn write_report(trainer: &Trainer, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    reporting::write_json(path, &trainer.reports)
        .with_context(|| format!("writing report {}", path.display()))?;
    log::info!(
        "wrote {} generation reports to {}",
        trainer.reports.len(),
        path.display()
    );
    Ok(())
}

async fn play(cfg: SimConfig, shapes: Option<CollisionShapes>, autopilot: bool) -> Result<()> {
    let latch = JumpLatch::default();
    let new_run = |seed: u64| -> Result<EvaluationLoop> {
        let controller: Box<dyn Controller> = if autopilot {
            Box::new(Threshold::new(config::AUTOPILOT_MARGIN, cfg.gate_gap))
        } else {
            Box::new(Human::new(latch.clone()))
        };
        let run_cfg = SimConfig {
            seed,
            ..cfg.clone()
        };
        let sim = match &shapes {
            Some(shapes) => EvaluationLoop::with_shapes(run_cfg, shapes.clone(), vec![controller])?,
            None => EvaluationLoop::new(run_cfg, vec![controller])?,
        };
        Ok(sim)
    };

    let mode = if autopilot { "autopilot" } else { "play" };
    let dt = cfg.tick_seconds();
    let agent_size = vec2(cfg.agent_width as f32, cfg.agent_height as f32);
    let mut seed = cfg.seed;
    let mut sim = new_run(seed)?;
    let mut ui_state = UiState::default();
    let mut accumulator = 0.0f64;
    let mut best_score = 0u32;
    let mut egui_wants_pointer = false;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        let jump = is_key_pressed(KeyCode::Space)
            || (!egui_wants_pointer && is_mouse_button_pressed(MouseButton::Left));
        if sim.state() == RunState::Terminal {
            if jump || is_key_pressed(KeyCode::R) {
                seed = seed.wrapping_add(1);
                sim = new_run(seed)?;
                accumulator = 0.0;
            }
        } else if jump {
            latch.press();
        }

        if !ui_state.paused && sim.state() == RunState::Running {
            accumulator += (get_frame_time() as f64).min(0.1) * ui_state.speed as f64;
            while accumulator >= dt {
                accumulator -= dt;
                if sim.tick()? == RunState::Terminal {
                    if let Some(outcome) = sim.outcome() {
                        best_score = best_score.max(outcome.score);
                        log::info!(
                            "run over: score {} after {} ticks (best {best_score})",
                            outcome.score,
                            outcome.ticks
                        );
                    }
                    break;
                }
            }
        } else {
            accumulator = 0.0;
        }

        let snapshot = sim.snapshot();
        renderer::draw(&snapshot, cfg.width, cfg.height, agent_size);
        let info = HudInfo {
            mode,
            generation: None,
            best_fitness: None,
            stats: None,
        };
        egui_wants_pointer = ui::draw_ui(&snapshot, &info, &mut ui_state);

        next_frame().await;
    }
    Ok(())
}

async fn train_windowed(mut trainer: Trainer, report: Option<PathBuf>) -> Result<()> {
    let cfg = trainer.sim_cfg.clone();
    let dt = cfg.tick_seconds();
    let agent_size = vec2(cfg.agent_width as f32, cfg.agent_height as f32);
    let mut ui_state = UiState::default();
    let mut accumulator = 0.0f64;
    let mut sim = trainer.start_generation()?;

    'generations: while !trainer.is_done() {
        if is_key_pressed(KeyCode::Escape) {
            log::info!("training stopped at generation {}", trainer.generation());
            break;
        }

        if !ui_state.paused {
            accumulator += (get_frame_time() as f64).min(0.1) * ui_state.speed as f64;
            while accumulator >= dt {
                accumulator -= dt;
                sim.tick()?;
                if sim.state() == RunState::Running && sim.tick_count() >= trainer.evo_cfg.tick_limit {
                    sim.retire_survivors();
                }
                if sim.state() == RunState::Terminal {
                    if let Some(outcome) = sim.outcome() {
                        trainer.finish_generation(&outcome);
                    }
                    if trainer.is_done() {
                        break 'generations;
                    }
                    sim = trainer.start_generation()?;
                    accumulator = 0.0;
                    break;
                }
            }
        } else {
            accumulator = 0.0;
        }

        let snapshot = sim.snapshot();
        renderer::draw(&snapshot, cfg.width, cfg.height, agent_size);
        let info = HudInfo {
            mode: "train",
            generation: Some(trainer.generation()),
            best_fitness: trainer.population.best_fitness(),
            stats: Some(&trainer.stats),
        };
        ui::draw_ui(&snapshot, &info, &mut ui_state);

        next_frame().await;
    }

    if let Some(best) = trainer.population.best_fitness() {
        log::info!(
            "training finished after {} generations, best fitness {best:.1}",
            trainer.generation()
        );
    }
    write_report(&trainer, report.as_deref())
}
