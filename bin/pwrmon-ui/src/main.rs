//! ---
//! pwrmon_section: "02-presentation"
//! pwrmon_subsection: "binary"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Terminal dashboard launcher."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
mod app;
mod render;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use pwrmon_common::config::{AppConfig, LoadedAppConfig};
use pwrmon_common::init_tracing;
use pwrmon_common::time::wall_clock_now;
use pwrmon_core::{
    DashboardFrame, DashboardState, SchedulerHandle, SharedDashboard, TickerSources,
    UpdateScheduler,
};
use pwrmon_sim::{DashboardView, SampleGenerator, SeededSource};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use tracing::info;

use crate::app::{layout_sections, App};

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/pwrmon.toml", "pwrmon.toml"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    Single,
    Three,
}

impl From<ViewArg> for DashboardView {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Single => DashboardView::SinglePhase,
            ViewArg::Three => DashboardView::ThreePhase,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    author,
    disable_version_flag = true,
    about = "Simulated electrical power monitoring dashboard",
    propagate_version = false
)]
struct Cli {
    /// Configuration file (defaults to configs/pwrmon.toml, then the built-in dashboard)
    #[arg(long, env = "PWRMON_CONFIG")]
    config: Option<PathBuf>,
    /// Dashboard page shown at start-up
    #[arg(long, value_enum, default_value_t = ViewArg::Single)]
    view: ViewArg,
    /// Seed for the synthetic readings; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Show every section immediately instead of revealing on scroll
    #[arg(long)]
    reduced_motion: bool,
    /// Print one frame of presentation data as JSON and exit
    #[arg(long)]
    once: bool,
    /// Redraw interval in milliseconds
    #[arg(long)]
    refresh: Option<u64>,

    /// Print version information and exit
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,
}

fn load_config(cli: &Cli) -> Result<LoadedAppConfig> {
    let mut loaded = match &cli.config {
        Some(path) => AppConfig::load_with_source(&[path])?,
        None => AppConfig::load_or_default(&DEFAULT_CONFIG_PATHS)?,
    };
    if let Some(seed) = cli.seed {
        loaded.config.simulation.seed = Some(seed);
    }
    if let Some(refresh) = cli.refresh {
        loaded.config.ui.refresh = Duration::from_millis(refresh);
    }
    if cli.reduced_motion {
        loaded.config.activation.reduced_motion = true;
    }
    loaded.config.validate()?;
    Ok(loaded)
}

fn seed_dashboard(config: &AppConfig) -> DashboardState {
    let mut generator = SampleGenerator::new(SeededSource::from_option(config.simulation.seed));
    DashboardState::seed(config, &mut generator, wall_clock_now())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("pwrmon-ui {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let loaded = load_config(&cli)?;
    let config = loaded.config;

    if cli.once {
        let state = seed_dashboard(&config);
        let frame = DashboardFrame::build(&state, cli.view.into(), &config.ui.clock_format)?;
        println!("{}", serde_json::to_string_pretty(&frame)?);
        return Ok(());
    }

    let mut logging = config.logging.clone();
    logging.stdout = false;
    init_tracing("pwrmon-ui", &logging)?;
    info!(
        config = %loaded
            .source
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in".to_owned()),
        "starting dashboard"
    );

    let runtime = Runtime::new().context("failed to start async runtime")?;
    let dashboard = seed_dashboard(&config).into_shared();
    let scheduler = {
        let _guard = runtime.enter();
        UpdateScheduler::new(dashboard.clone(), config.schedule.clone())
            .start(TickerSources::seeded(config.simulation.seed))?
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let result = run_app(&mut terminal, &config, &dashboard, cli.view.into());
    cleanup_terminal(&mut terminal)?;

    let teardown = shutdown(&runtime, scheduler);
    if let Err(err) = result.and(teardown) {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
    Ok(())
}

fn shutdown(runtime: &Runtime, scheduler: SchedulerHandle) -> Result<()> {
    runtime.block_on(scheduler.shutdown())?;
    info!("dashboard stopped");
    Ok(())
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: &AppConfig,
    dashboard: &SharedDashboard,
    view: DashboardView,
) -> Result<()> {
    let mut app = App::new(config, view, false);
    let tick_rate = config.ui.refresh.max(Duration::from_millis(50));
    let result = loop {
        let frame = {
            let state = dashboard.lock();
            DashboardFrame::build(&state, app.view, &config.ui.clock_format)?
        };
        let sections = layout_sections(&frame, app.has_banner());
        let body = render::body_area(terminal.size()?);
        app.set_viewport_height(body.height);
        app.update_visibility(&sections, Instant::now());
        terminal.draw(|f| render::draw(f, &app, &frame, &sections, &config.ui))?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_input(&mut app, key) {
                        break Ok(());
                    }
                }
                Event::Resize(_, _) => {
                    // redraw with new geometry
                }
                _ => {}
            }
        }
    };
    app.shutdown();
    result
}

/// Returns `true` when the user asked to quit.
fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('v') => app.toggle_view(),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_by(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_by(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_by(app.page_step()),
        KeyCode::PageUp => app.scroll_by(-app.page_step()),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_start(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_end(),
        _ => {}
    };
    false
}
