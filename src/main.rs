use anomaly_map::app::App;
use anomaly_map::cli::{Cli, Commands, ExportArgs, ViewArgs};
use anomaly_map::{export, logging, ui};
use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::rc::Rc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::View(_));
    logging::init(cli.verbose, cli.log_file.as_deref(), interactive)?;

    match &cli.command {
        Commands::View(args) => view(args),
        Commands::Export(args) => export_all(args),
    }
}

fn export_all(args: &ExportArgs) -> Result<()> {
    let (index, report) = anomaly_map::prepare(&args.data)?;
    if !report.dropped.is_empty() {
        log::warn!(
            "{} countries in the anomaly table have no boundary and were dropped",
            report.dropped.len()
        );
    }
    export::write_snapshots(&index, &args.out)?;
    Ok(())
}

fn view(args: &ViewArgs) -> Result<()> {
    // Everything slow happens before the terminal is taken over
    let (index, _) = anomaly_map::prepare(&args.data)?;
    let index = Rc::new(index);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, index, args.year);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for hover, panning, zooming and the slider
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for the tooltip
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click the slider track to jump, anywhere else to start a drag
        MouseEventKind::Down(MouseButton::Left) => app.press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, index: Rc<anomaly_map::index::YearIndex>, year: i32) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(size.width, size.height, index, year)?;

    // Main loop
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Everything is event driven; the timeout only bounds input latency
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                            // Year slider
                            KeyCode::Left => app.step_year(-1),
                            KeyCode::Right => app.step_year(1),
                            KeyCode::PageDown => app.step_year(-10),
                            KeyCode::PageUp => app.step_year(10),
                            KeyCode::Home => app.first_year(),
                            KeyCode::End => app.last_year(),

                            // Pan with hjkl or up/down
                            KeyCode::Char('h') => app.pan(-10, 0),
                            KeyCode::Char('l') => app.pan(10, 0),
                            KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                            KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                            // Zoom
                            KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                            KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                            // Layer toggles
                            KeyCode::Char('f') | KeyCode::Char('F') => app.renderer.toggle_fill(),
                            KeyCode::Char('o') | KeyCode::Char('O') => app.renderer.toggle_outlines(),

                            // Reset view
                            KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
