//! Terminal Example - endless mosaic in the terminal
//!
//! This example drives the grid from a crossterm event loop:
//! - Templates and settings from TOML (built-in, or a path argument)
//! - Content from the tiered shuffle, one title per content cell
//! - Wheel, arrows, PageUp/PageDown scroll; `t` toggles touch mode
//! - `q` or Esc quits
//!
//! Logs go to `daybreak-grid.log`, filtered by `RUST_LOG`.
//!
//! Run with: cargo run --example terminal [config.toml]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, Write};
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use tracing::info;
use tracing_subscriber::EnvFilter;

use daybreak_grid::state::input::{
    apply_signal, disable_mouse, enable_mouse, poll_signal, terminal_capabilities, HostSignal,
};
use daybreak_grid::{
    cell_renderer, shuffle_grid_data, CellDisposer, CellKind, ElementId, FrameScheduler,
    GridConfig, InfiniteGrid, InfiniteGridConfig, LayoutSurface, ShuffleItem, Surface,
};

/// Content units per terminal row.
const LINE_HEIGHT: f64 = 20.0;

const BUILTIN_CONFIG: &str = r#"
[settings]
spacing = 20.0
leading_offset = 20.0
smooth_factor = 0.2

[[templates]]
rows = ["X_X_", "_X_X"]

[[templates]]
rows = ["XX__", "__XX", "X__X"]

[[templates]]
rows = ["_XX_", "X__X"]
"#;

const TITLES: [(u32, &str); 9] = [
    (0, "Daybreak"),
    (0, "Low Tide"),
    (1, "Field Notes"),
    (1, "Northbound"),
    (1, "Glass Harbor"),
    (2, "Quiet Hours"),
    (2, "Saltwater"),
    (2, "Relay"),
    (3, "Afterglow"),
];

type Labels = Rc<RefCell<HashMap<ElementId, String>>>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log = File::create("daybreak-grid.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => GridConfig::load(path)?,
        None => GridConfig::from_toml_str(BUILTIN_CONFIG)?,
    };
    let templates = config.templates()?;

    let (columns, rows) = terminal::size()?;
    let width = f64::from(columns) * LINE_HEIGHT / 2.0;
    let surface = Rc::new(RefCell::new(
        LayoutSurface::new(width).with_cell_height(LINE_HEIGHT * 3.0),
    ));

    let content = Rc::new(RefCell::new(shuffle_grid_data(
        TITLES.iter().map(|(tier, title)| ShuffleItem::new(*tier, title.to_string())),
    )?));
    let labels: Labels = Rc::new(RefCell::new(HashMap::new()));

    let renderer = {
        let labels = labels.clone();
        cell_renderer(move |cell| {
            if cell.kind != CellKind::Content {
                return None;
            }
            let title = content.borrow_mut().next().cloned().unwrap_or_default();
            labels.borrow_mut().insert(cell.element, title);

            let labels = labels.clone();
            let element = cell.element;
            Some(Box::new(move || {
                labels.borrow_mut().remove(&element);
            }) as CellDisposer)
        })
    };

    let scheduler = FrameScheduler::new();
    let grid = InfiniteGrid::new(InfiniteGridConfig {
        templates,
        surface: surface.clone(),
        renderer,
        scheduler: scheduler.clone(),
        capabilities: terminal_capabilities(),
        viewport_height: f64::from(rows) * LINE_HEIGHT,
        settings: config.settings,
    })?;
    info!(columns, rows, "terminal demo started");

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide)?;
    enable_mouse()?;

    let result = run(&grid, &scheduler, &surface, &labels);

    disable_mouse()?;
    execute!(stdout(), Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    grid.cleanup();
    info!(remaining = labels.borrow().len(), "terminal demo stopped");
    result
}

fn run(
    grid: &InfiniteGrid,
    scheduler: &FrameScheduler,
    surface: &Rc<RefCell<LayoutSurface>>,
    labels: &Labels,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if let Some(signal) = poll_signal(Duration::from_millis(16), LINE_HEIGHT)? {
            if let HostSignal::Resize { width, .. } = signal {
                surface.borrow_mut().set_width(width);
            }
            if !apply_signal(grid, signal) {
                return Ok(());
            }
        }
        scheduler.tick();
        draw(grid, surface, labels)?;
    }
}

fn draw(
    grid: &InfiniteGrid,
    surface: &Rc<RefCell<LayoutSurface>>,
    labels: &Labels,
) -> std::io::Result<()> {
    let mut out = stdout();
    let (columns, rows) = terminal::size()?;
    let offset = grid.visual_offset();
    queue!(out, Clear(ClearType::All))?;

    for page in grid.page_order() {
        let Some(template) = grid.page_template(page) else { continue };
        let cell_columns = usize::from(columns) / template.cols().max(1);

        for (index, element) in grid.page_cells(page).into_iter().enumerate() {
            if !grid.is_in_viewport(element) {
                continue;
            }
            let Some(label) = labels.borrow().get(&element).cloned() else { continue };
            let Some(bounds) = surface.borrow_mut().bounds(element) else { continue };

            let top = ((bounds.top - offset) / LINE_HEIGHT).round();
            if top < 0.0 || top >= f64::from(rows) {
                continue;
            }
            let x = (index % template.cols()) * cell_columns;
            let text: String = label.chars().take(cell_columns.saturating_sub(1)).collect();
            queue!(out, MoveTo(x as u16, top as u16), Print(text.bold()))?;
        }
    }

    let status = format!(
        " scroll {:>7.0}  pages {:>3}  {} ",
        grid.scroll_position(),
        grid.page_count(),
        if grid.use_touch_input() { "touch" } else { "wheel" }
    );
    queue!(out, MoveTo(0, rows.saturating_sub(1)), Print(status.reverse()))?;
    out.flush()
}
