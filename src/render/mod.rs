use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        Block, Widget,
        canvas::{Canvas, Circle, Line, Points},
    },
};

use crate::{
    config,
    types::{Edge, Particle, Rgba, Sparkle, Vec2, Viewport},
};

/// One frame of the field, borrowed from the simulation. Drawing never
/// mutates the lists it is given.
#[derive(Clone, Copy, Debug)]
pub struct Scene<'a> {
    pub particles: &'a [Particle],
    pub edges: &'a [Edge],
    pub sparkles: &'a [Sparkle],
    pub viewport: Viewport,
    pub time: u64,
}

/// Canvas widget for a [`Scene`].
pub struct SceneView<'a> {
    scene: Scene<'a>,
    block: Option<Block<'a>>,
}

impl<'a> SceneView<'a> {
    pub fn new(scene: Scene<'a>) -> Self {
        Self { scene, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for SceneView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scene = self.scene;
        let height = scene.viewport.height;
        // canvas y grows upward, surface y grows downward
        let flip = move |p: Vec2| (p.x as f64, (height - p.y) as f64);

        let mut canvas = Canvas::default()
            .marker(Marker::Braille)
            .background_color(Color::Black)
            .x_bounds([0.0, scene.viewport.width as f64])
            .y_bounds([0.0, height as f64])
            .paint(move |ctx| {
                for edge in scene.edges {
                    let (x1, y1) = flip(scene.particles[edge.a].pos);
                    let (x2, y2) = flip(scene.particles[edge.b].pos);
                    ctx.draw(&Line {
                        x1,
                        y1,
                        x2,
                        y2,
                        color: to_color(edge.color),
                    });
                }
                ctx.layer();

                let time = scene.time as f64;
                for particle in scene.particles {
                    let (x, y) = flip(particle.pos);
                    let color = to_color(particle.color);
                    ctx.draw(&Circle {
                        x,
                        y,
                        radius: particle.display_radius(time) as f64,
                        color,
                    });
                    ctx.draw(&Points {
                        coords: &[(x, y)],
                        color,
                    });
                }
                ctx.layer();

                for sparkle in scene.sparkles {
                    let (x, y) = flip(sparkle.pos);
                    let color = to_color(config::SPARKLE_COLOR.with_alpha(sparkle.opacity));
                    ctx.draw(&Circle {
                        x,
                        y,
                        radius: sparkle.size as f64,
                        color,
                    });
                    ctx.draw(&Points {
                        coords: &[(x, y)],
                        color,
                    });
                }
            });
        if let Some(block) = self.block {
            canvas = canvas.block(block);
        }
        canvas.render(area, buf);
    }
}

pub fn to_color(color: Rgba) -> Color {
    let (r, g, b) = color.over_black();
    Color::Rgb(r, g, b)
}

/// Maps a terminal cell inside `area` to the centre of that cell in surface
/// units. Cells outside `area` map to `None`.
pub fn cell_to_surface(area: Rect, column: u16, row: u16) -> Option<Vec2> {
    if column < area.x || row < area.y || column >= area.right() || row >= area.bottom() {
        return None;
    }
    Some(Vec2::new(
        (column - area.x) as f32 * config::CELL_WIDTH + config::CELL_WIDTH / 2.0,
        (row - area.y) as f32 * config::CELL_HEIGHT + config::CELL_HEIGHT / 2.0,
    ))
}

/// Surface size covered by `area`.
pub fn surface_viewport(area: Rect) -> Viewport {
    Viewport::new(
        area.width as f32 * config::CELL_WIDTH,
        area.height as f32 * config::CELL_HEIGHT,
    )
}
