use crate::app::{App, Focus};
use crate::grid::{Cell, CellKind, Coord, Grid};
use crate::listing;
use crate::playback::{interval_for_speed, Phase};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 26;
const ANALYSIS_WIDTH: u16 = 56;
/// Each cell is drawn two columns wide so it looks roughly square
const CELL_WIDTH: u16 = 2;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;
const ERROR_COLOR: Color = Color::LightRed;

// Cell colors
const EMPTY_CELL: Color = Color::Indexed(236);
const WALL_CELL: Color = Color::Gray;
const START_CELL: Color = Color::Green;
const END_CELL: Color = Color::Red;
const VISITED_CELL: Color = Color::Blue;
const OPEN_CELL: Color = Color::Cyan;
const PATH_CELL: Color = Color::Yellow;
const CURRENT_CELL: Color = Color::Magenta;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

struct Columns {
    sidebar: Rect,
    canvas: Rect,
    analysis: Rect,
}

fn split_columns(area: Rect) -> Columns {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(0),
            Constraint::Length(ANALYSIS_WIDTH),
        ])
        .split(area);
    Columns {
        sidebar: layout[0],
        canvas: layout[1],
        analysis: layout[2],
    }
}

/// Screen rectangle the grid cells occupy, centered inside the canvas block
pub fn grid_area(frame_area: Rect, grid: &Grid) -> Rect {
    let inner = styled_block("").inner(split_columns(frame_area).canvas);
    let width = (grid.cols() as u16).saturating_mul(CELL_WIDTH).min(inner.width);
    let height = (grid.rows() as u16).min(inner.height);
    Rect {
        x: inner.x + (inner.width - width) / 2,
        y: inner.y + (inner.height - height) / 2,
        width,
        height,
    }
}

/// Map a terminal position to the grid cell drawn there
pub fn cell_at(frame_area: Rect, grid: &Grid, column: u16, row: u16) -> Option<Coord> {
    let area = grid_area(frame_area, grid);
    if column < area.x || row < area.y || column >= area.x + area.width || row >= area.y + area.height {
        return None;
    }
    let coord = Coord::new(
        usize::from(row - area.y),
        usize::from((column - area.x) / CELL_WIDTH),
    );
    grid.contains(coord).then_some(coord)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let columns = split_columns(area);

    render_sidebar(frame, columns.sidebar, app);
    render_canvas(frame, area, columns.canvas, app);
    render_analysis(frame, columns.analysis, app);

    if app.show_help {
        render_help_overlay(frame, columns.canvas, app);
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Status
            Constraint::Length(8), // Parameters
            Constraint::Min(6),    // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2]);
}

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Idle => DIM_TEXT_COLOR,
        Phase::Fetching => Color::LightBlue,
        Phase::Playing => BORDER_COLOR,
        Phase::Paused => HIGHLIGHT_COLOR,
        Phase::Finished => Color::Green,
    }
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" A* Trace Viewer ");
    let controller = &app.controller;
    let state = controller.state();

    let progress_width = area.width.saturating_sub(4) as usize;
    let filled = if state.trace_len == 0 {
        0
    } else {
        progress_width * state.step_index / state.trace_len
    };
    let empty = progress_width.saturating_sub(filled);

    let mut content = vec![
        Line::from(Span::styled(
            controller.phase().name().to_string(),
            Style::default().fg(phase_color(controller.phase())),
        )),
        Line::from(Span::styled(
            format!("Step {} / {}", state.step_index, state.trace_len),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(vec![
            Span::styled("█".repeat(filled), Style::default().fg(Color::Green)),
            Span::styled("░".repeat(empty), Style::default().fg(Color::DarkGray)),
        ]),
    ];

    if state.is_finished {
        let (text, color) = match controller.path_found() {
            Some(true) => ("Path found", Color::Green),
            _ => ("No path", ERROR_COLOR),
        };
        content.push(Line::from(Span::styled(text, Style::default().fg(color))));
    }

    if let Some(notice) = controller.notification() {
        content.push(Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(ERROR_COLOR),
        )));
    } else if let Some(status) = &app.status {
        content.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(DIM_TEXT_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let config = app.controller.config();
    let speed = app.controller.speed();

    let content = vec![
        Line::from(Span::styled(
            format!("  Algo: {}", config.algorithm.name()),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        make_line(
            "Heuristic",
            config.heuristic.name().to_string(),
            app.focus == Focus::Heuristic,
        ),
        make_line("Speed", format!("{}", speed), app.focus == Focus::Speed),
        make_line(
            "Tie",
            config.tie_breaker.name().to_string(),
            app.focus == Focus::TieBreaker,
        ),
        make_line(
            "Weight",
            format!("{:.1}", config.weight),
            app.focus == Focus::Weight,
        ),
        Line::from(Span::styled(
            format!("  Tick: {} ms", interval_for_speed(speed).as_millis()),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| {
        Line::from(vec![
            Span::styled(format!("{:>6}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "run/pause"),
        make_control("N/→", "step"),
        make_control("R", "reset + clear"),
        make_control("C", "reset, keep walls"),
        make_control("Click", "toggle wall"),
        make_control("Drag", "paint walls"),
        make_control("RClick", "move start"),
        make_control("MClick", "move end"),
        make_control("X", "random walls"),
        make_control("+/-", "speed"),
        make_control("Tab", "select param"),
        make_control("O", "save config"),
        make_control("L", "load config"),
        make_control("H", "help"),
        make_control("Q", "quit"),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn cell_color(cell: &Cell, current: Option<Coord>) -> Color {
    match cell.kind {
        CellKind::Start => START_CELL,
        CellKind::End => END_CELL,
        CellKind::Wall => WALL_CELL,
        CellKind::Empty if current == Some(cell.coord()) => CURRENT_CELL,
        CellKind::Empty if cell.on_path => PATH_CELL,
        CellKind::Empty if cell.visited => VISITED_CELL,
        CellKind::Empty if cell.open => OPEN_CELL,
        CellKind::Empty => EMPTY_CELL,
    }
}

fn render_canvas(frame: &mut Frame, frame_area: Rect, area: Rect, app: &App) {
    let grid = app.controller.grid();
    let block = styled_block(" Grid ");
    frame.render_widget(block, area);

    let cells_area = grid_area(frame_area, grid);
    let visible_cols = usize::from(cells_area.width / CELL_WIDTH);
    let current = app
        .controller
        .current_step()
        .and_then(|step| step.variables.current.as_ref())
        .map(|node| node.coord());

    let lines: Vec<Line> = grid
        .row_slices()
        .take(usize::from(cells_area.height))
        .map(|row| {
            Line::from(
                row.iter()
                    .take(visible_cols)
                    .map(|cell| Span::styled("  ", Style::default().bg(cell_color(cell, current))))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), cells_area);
}

fn render_analysis(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(area);

    render_step_box(frame, sections[0], app);
    render_listing_box(frame, sections[1], app);
}

fn render_step_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Algorithm Analysis ");
    let label = Style::default().fg(DIM_TEXT_COLOR);
    let value = Style::default().fg(TEXT_COLOR);

    let Some(step) = app.controller.current_step() else {
        let paragraph = Paragraph::new(Line::from(Span::styled("Ready to start...", label)))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let vars = &step.variables;
    let mut content = vec![Line::from(Span::styled(
        format!("Line {}: {}", step.code_line, step.explanation),
        Style::default().fg(Color::LightBlue),
    ))];

    if let Some(node) = &vars.current {
        let f_cost = node.f_cost.map_or_else(|| "-".to_string(), |f| format!("{:.2}", f));
        content.push(Line::from(vec![
            Span::styled("Current: ", label),
            Span::styled(format!("{} (f: {})", node.coord(), f_cost), value),
        ]));
        if let Some(parent) = app.controller.grid().cell(node.coord()).and_then(|c| c.parent) {
            content.push(Line::from(vec![
                Span::styled("Parent: ", label),
                Span::styled(parent.to_string(), value),
            ]));
        }
    }
    if let Some(neighbors) = &vars.neighbors {
        content.push(Line::from(vec![
            Span::styled("Neighbors: ", label),
            Span::styled(neighbors.len().to_string(), value),
        ]));
    }
    if let Some(size) = vars.open_set_size {
        content.push(Line::from(vec![
            Span::styled("Open Set Size: ", label),
            Span::styled(size.to_string(), value),
        ]));
    }
    if let Some(size) = vars.closed_set_size {
        content.push(Line::from(vec![
            Span::styled("Closed Set Size: ", label),
            Span::styled(size.to_string(), value),
        ]));
    }
    if let Some(message) = &vars.message {
        let color = if step.reached_target() {
            Color::Green
        } else {
            HIGHLIGHT_COLOR
        };
        content.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    }

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_listing_box(frame: &mut Frame, area: Rect, app: &App) {
    let highlighted = app
        .controller
        .current_step()
        .and_then(|step| listing::line_for_code(step.code_line));

    let content: Vec<Line> = listing::lines()
        .enumerate()
        .map(|(idx, text)| {
            let number = Span::styled(format!("{:>3} ", idx + 1), Style::default().fg(Color::DarkGray));
            if Some(idx) == highlighted {
                Line::from(vec![
                    number,
                    Span::styled(
                        text,
                        Style::default()
                            .fg(TEXT_COLOR)
                            .bg(Color::Indexed(17))
                            .add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(vec![number, Span::styled(text, Style::default().fg(DIM_TEXT_COLOR))])
            }
        })
        .collect();

    // Keep the highlighted line in view
    let visible_height = area.height.saturating_sub(2) as usize;
    let scroll = match highlighted {
        Some(row) if listing::line_count() > visible_height && row >= visible_height / 2 => {
            (row - visible_height / 2).min(listing::line_count() - visible_height)
        }
        _ => 0,
    };

    let paragraph = Paragraph::new(content)
        .block(styled_block(" Reference "))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Center the help dialog within the canvas
    let help_width = 56.min(area.width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(32);
    let help_area = Rect {
        x: area.x + (area.width.saturating_sub(help_width)) / 2,
        y: area.y + (area.height.saturating_sub(help_height)) / 2,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let legend = |color: Color, name: &'static str| {
        Line::from(vec![
            Span::styled("  ", Style::default().bg(color)),
            Span::raw(format!(" {}", name)),
        ])
    };

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("A* TRACE PLAYBACK", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Paint walls, press Space to request a trace from the solver, then watch it replay step by step. The listing on the right highlights the line each step corresponds to."),
        Line::from(""),
        Line::from(Span::styled("LEGEND:", Style::default().fg(HIGHLIGHT_COLOR))),
        legend(START_CELL, "Start"),
        legend(END_CELL, "End"),
        legend(WALL_CELL, "Wall"),
        legend(CURRENT_CELL, "Current node"),
        legend(OPEN_CELL, "Open (discovered)"),
        legend(VISITED_CELL, "Closed (settled)"),
        legend(PATH_CELL, "Path"),
        Line::from(""),
        Line::from(Span::styled("PLAYBACK:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Run/Pause, N or Right=Step, R=Reset and clear walls, C=Reset keeping walls, +/-=Speed"),
        Line::from(""),
        Line::from(Span::styled("EDITING (not while playing):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Click=Toggle wall, Drag=Paint walls, Right click=Move start, Middle click=Move end, X=Random walls"),
        Line::from(""),
        Line::from(Span::styled("SOLVER:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Tab/Shift+Tab select a parameter, Up/Down change it. Changes apply to the next trace request."),
        Line::from(format!("Backend: {}", app.solver_label())),
        Line::from(""),
        Line::from("O=Save config, L=Load config, Esc=Dismiss message, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let is_scrollable = content_height > visible_height;

    // Update title to show scroll hint if scrollable
    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
