use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        KeyEventKind, KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    widgets::{Block, Borders, Paragraph},
};

use crate::{
    config::{self, FieldConfig},
    core::ParticleField,
    frame_loop::{CancelToken, FrameLoop, Pacer},
    render::{self, Scene, SceneView},
};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

pub fn run(config: FieldConfig) -> Result<()> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, config);
    // restore the terminal even when the loop failed
    let restored = shutdown_terminal(&mut terminal);
    result.and(restored)
}

fn event_loop(terminal: &mut Term, config: FieldConfig) -> Result<()> {
    let mut surface = UiSurface::new(ParticleField::new(config));
    let size = terminal.size()?;
    surface.resize(size);

    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    let mut last_render = Instant::now();
    let mut sim_counter = 0_u32;
    let mut render_counter = 0_u32;
    let mut last_fps_sample = Instant::now();
    let mut sim_fps = 0.0_f32;
    let mut render_fps = 0.0_f32;

    loop {
        sim_counter += surface.advance();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                    let ctrl_c = key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL);
                    if ctrl_c || matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                        surface.teardown();
                        return Ok(());
                    }
                    if key.code == KeyCode::Char('r') {
                        surface.resize(terminal.size()?);
                    }
                }
                CrosstermEvent::Mouse(mouse) => {
                    if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                        surface.pointer_moved(mouse.column, mouse.row);
                    }
                }
                CrosstermEvent::Resize(width, height) => {
                    surface.resize(Rect::new(0, 0, width, height));
                }
                _ => {}
            }
        }

        if last_render.elapsed() >= render_interval {
            if last_fps_sample.elapsed() >= Duration::from_secs(1) {
                let secs = last_fps_sample.elapsed().as_secs_f32();
                sim_fps = sim_counter as f32 / secs;
                render_fps = render_counter as f32 / secs;
                sim_counter = 0;
                render_counter = 0;
                last_fps_sample = Instant::now();
            }
            let stats = surface.field.stats();
            terminal.draw(|frame| {
                let [header_area, field_area, footer_area] = split(frame.size());

                let header = Paragraph::new(format!(
                    "particles: {} | edges: {} | sparkles: {} | tick: {} | sim fps: {:.1} | render fps: {:.1}",
                    stats.particles,
                    stats.edges,
                    stats.sparkles,
                    stats.time,
                    sim_fps,
                    render_fps
                ))
                .block(Block::default().borders(Borders::ALL).title("particle-field"));
                frame.render_widget(header, header_area);

                let block = Block::default().borders(Borders::ALL).title("Field");
                match surface.field.viewport() {
                    Some(viewport) => {
                        let scene = Scene {
                            particles: surface.field.particles(),
                            edges: surface.field.edges(),
                            sparkles: surface.field.sparkles(),
                            viewport,
                            time: surface.field.time(),
                        };
                        frame.render_widget(SceneView::new(scene).block(block), field_area);
                    }
                    None => {
                        let waiting = Paragraph::new("terminal too small").block(block);
                        frame.render_widget(waiting, field_area);
                    }
                }

                let cursor = match surface.field.cursor() {
                    Some(pos) => format!("({:.0}, {:.0})", pos.x, pos.y),
                    None => "-".to_string(),
                };
                let state = if surface.frames.is_running() { "running" } else { "paused" };
                let footer = Paragraph::new(format!(
                    "{} | cursor: {} | graph: {:?} | move the mouse to attract particles | r: reseed | q: quit",
                    state,
                    cursor,
                    surface.field.config().graph
                ))
                .block(Block::default().borders(Borders::ALL).title("Controls"));
                frame.render_widget(footer, footer_area);
            })?;

            last_render = Instant::now();
            render_counter += 1;
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn shutdown_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn split(size: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(size);
    [chunks[0], chunks[1], chunks[2]]
}

/// Inner area of the bordered field block, where the canvas draws.
fn canvas_area(size: Rect) -> Rect {
    let [_, field_area, _] = split(size);
    field_area.inner(&Margin {
        horizontal: 1,
        vertical: 1,
    })
}

/// Ties a field to the terminal region it is drawn in and to the single frame
/// loop animating it.
struct UiSurface {
    field: ParticleField,
    frames: FrameLoop,
    token: Option<CancelToken>,
    pacer: Pacer,
    area: Rect,
}

impl UiSurface {
    fn new(field: ParticleField) -> Self {
        Self {
            field,
            frames: FrameLoop::new(),
            token: None,
            pacer: Pacer::new(config::SIM_HZ, config::MAX_TICKS_PER_FRAME),
            area: Rect::default(),
        }
    }

    /// Stops the running loop, reseeds the field for the new size and only
    /// restarts the loop if the field became ready.
    fn resize(&mut self, terminal_size: Rect) {
        self.frames.stop();
        self.token = None;
        self.area = canvas_area(terminal_size);
        self.field.resize(render::surface_viewport(self.area));
        if self.field.is_ready() {
            self.token = Some(self.frames.start());
            self.pacer.reset();
        } else {
            warn!(
                "canvas area {}x{} too small, animation paused",
                self.area.width, self.area.height
            );
        }
    }

    fn advance(&mut self) -> u32 {
        let Some(token) = &self.token else {
            return 0;
        };
        let due = self.pacer.due();
        let mut ticks = 0;
        for _ in 0..due {
            if token.is_cancelled() || !self.field.tick() {
                break;
            }
            ticks += 1;
        }
        ticks
    }

    fn pointer_moved(&mut self, column: u16, row: u16) {
        let Some(pos) = render::cell_to_surface(self.area, column, row) else {
            return;
        };
        if self
            .field
            .viewport()
            .is_some_and(|viewport| viewport.contains(pos))
        {
            self.field.track_cursor(pos);
        }
    }

    fn teardown(&mut self) {
        self.frames.stop();
        self.token = None;
        info!(
            "stopped after {} ticks and {} loop restarts",
            self.field.time(),
            self.frames.generation().saturating_sub(1)
        );
    }
}
