pub mod actions;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod manifest;
pub mod mirror;
pub mod pip;
pub mod requirement;
pub mod runner;
pub mod structs;
pub mod utils;
pub mod widgets;

use std::{
    fs::OpenOptions,
    path::Path,
    process::ExitCode,
    sync::Mutex,
    time::Duration,
};

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Tabs, Widget},
};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Cli, Command},
    config::Config,
    error::{AppError, Result},
    mirror::Mirrors,
    runner::{OutputLine, run_streaming},
    structs::{
        appstate::{AppState, Modal},
        dependency::Status,
        event::{EventCommand, EventResult},
        tab::Tab,
    },
    widgets::{Commands, centered, paths::PathsAction, paths::PathsForm, popup::Popup},
};

//ui tick, also how often worker output is picked up
const TICK: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    setup_logging(&cli, &config);

    let state = build_state(&cli, config)?;
    match cli.command {
        Some(Command::Status) => run_status(state),
        Some(Command::Install) => run_install(state),
        None => {
            run_tui(state)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Subcommands log to stderr. The terminal UI owns the screen, so it logs
/// to a file instead.
fn setup_logging(cli: &Cli, config: &Config) {
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if cli.command.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
        return;
    }

    let path = cli.log_file.clone().unwrap_or_else(|| config.log_file());
    match open_log(&path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        Err(e) => eprintln!("Logging disabled, cannot open {}: {e}", path.display()),
    }
}

fn open_log(path: &Path) -> std::io::Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Command line values win over the config file.
fn build_state(cli: &Cli, config: Config) -> Result<AppState> {
    let mut state = AppState {
        manifest_path: cli.requirements.clone().or(config.paths.requirements),
        python_path: cli.python.clone().or(config.paths.python),
        mirrors: Mirrors::new(config.pip.extra_mirrors),
        refresh_delay: Duration::from_millis(config.pip.refresh_delay_ms),
        ..Default::default()
    };
    if let Some(mirror) = cli.mirror.as_ref().or(config.pip.mirror.as_ref()) {
        state.mirrors.select(mirror)?;
    }
    tracing::debug!(
        manifest = ?state.manifest_path,
        python = ?state.python_path,
        mirror = %state.mirrors.current(),
        "starting"
    );
    Ok(state)
}

fn run_status(mut state: AppState) -> Result<ExitCode> {
    actions::refresh(&mut state)?;
    let rows = state
        .dependencies
        .iter()
        .map(|d| {
            (
                d.requirement.name.as_str(),
                d.requirement.required_display(),
                d.status(),
            )
        })
        .collect::<Vec<_>>();
    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max(4);
    let req_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max(8);

    println!("{:name_width$}  {:req_width$}  Status", "Name", "Required");
    for (name, required, status) in &rows {
        println!("{name:name_width$}  {required:req_width$}  {status}");
    }

    let unmet = rows
        .iter()
        .filter(|r| !matches!(r.2, Status::Installed(_)))
        .count();
    println!("\n{} requirements, {} not satisfied", rows.len(), unmet);
    Ok(if unmet == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_install(mut state: AppState) -> Result<ExitCode> {
    actions::refresh(&mut state)?;
    let cmd = actions::build_command(&state, EventCommand::InstallManifest)?;
    println!("Running command: {cmd}");
    let outcome = run_streaming(&cmd, |line| match line {
        OutputLine::Stdout(s) => println!("{s}"),
        OutputLine::Stderr(s) => eprintln!("{s}"),
    })?;
    if outcome.success {
        println!("{}", outcome.message(&cmd.label));
        Ok(ExitCode::SUCCESS)
    } else {
        Err(AppError::CommandFailed {
            command: cmd.label,
            code: outcome.code,
        })
    }
}

fn run_tui(mut state: AppState) -> Result<()> {
    if state.manifest_path.is_none() && state.python_path.is_none() {
        state.modal = Some(Modal::Paths(PathsForm::new(None, None)));
    } else {
        println!("Checking environment...");
        if let Err(e) = actions::refresh(&mut state) {
            state.warn(e.to_string());
        }
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;
    let result = event_loop(&mut terminal, state);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut DefaultTerminal, mut state: AppState) -> Result<()> {
    loop {
        actions::poll_worker(&mut state);
        if actions::refresh_due(&state) {
            if let Err(e) = actions::refresh(&mut state) {
                state.warn(e.to_string());
            }
        }

        terminal.draw(|f| draw(&state, f))?;

        if !event::poll(TICK)? {
            continue;
        }
        match handle_event(&mut state)? {
            EventResult::None => {}
            EventResult::Quit => return Ok(()),
            EventResult::Command(c) => {
                if let Err(e) = actions::start_command(&mut state, c) {
                    tracing::warn!("command not started: {e}");
                    state.warn(e.to_string());
                }
            }
            EventResult::Confirm(text, c) => state.modal = Some(Modal::Confirm(text, c)),
            EventResult::NeedsRefresh => {
                if state.is_busy() {
                    state.message.error(AppError::Busy.to_string());
                } else if let Err(e) = actions::refresh(&mut state) {
                    state.warn(e.to_string());
                }
            }
            EventResult::EditPaths => {
                let form = PathsForm::new(state.manifest_path.as_ref(), state.python_path.as_ref());
                state.modal = Some(Modal::Paths(form));
            }
            EventResult::CycleMirror => {
                state.mirrors.cycle_next();
                let current = state.mirrors.current().to_string();
                tracing::info!(mirror = %current, "mirror changed");
                state.message.info(format!("Mirror: {current}"));
            }
        }
    }
}

fn draw(state: &AppState, f: &mut Frame) {
    let info = if state.show_info { 5 } else { 0 };

    use Constraint::{Length, Min};
    let vertical = Layout::vertical([Length(3), Min(0), Length(info), Length(1)]);
    let [header_area, inner_area, info_area, footer_area] = vertical.areas(f.area());

    draw_tabs(state, f, header_area);
    match state.tab {
        Tab::Requirements => state
            .requirements_widget
            .clone()
            .render(inner_area, f.buffer_mut()),
        Tab::Environment => state
            .environment_widget
            .clone()
            .render(inner_area, f.buffer_mut()),
    }
    if state.show_info {
        draw_info(state, f, info_area);
    }
    draw_status(state, f, footer_area);
    draw_help(state, f);
    draw_modal(state, f);
}

fn draw_tabs(state: &AppState, f: &mut Frame, header_area: Rect) {
    let mirror = Line::from(format!(" Mirror: {} ", state.mirrors.current())).right_aligned();
    Tabs::new(Tab::values())
        .highlight_style((Color::Black, Color::Yellow))
        .select(&state.tab)
        .block(Block::bordered().title_top(mirror))
        .render(header_area, f.buffer_mut());
}

fn draw_info(state: &AppState, f: &mut Frame, rect: Rect) {
    let (python, environment) = match &state.env {
        Some(env) => (
            env.executable.display().to_string(),
            env.root.display().to_string(),
        ),
        None => ("not selected".to_string(), "not selected".to_string()),
    };
    let rows: Vec<(&str, String)> = match state.tab {
        Tab::Requirements => {
            let Some(dep) = state.requirements_widget.current_dependency() else {
                return;
            };
            let req = &dep.requirement;
            vec![
                ("Line", format!("{}: {}", req.line_no, req.line)),
                ("Install", req.install_spec()),
                ("Python", python),
            ]
        }
        Tab::Environment => {
            let Some(pkg) = state.environment_widget.current_package() else {
                return;
            };
            let manifest = state
                .manifest_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            vec![
                ("Package", format!("{} {}", pkg.name, pkg.version)),
                ("Environment", environment),
                ("Manifest", manifest),
            ]
        }
    };
    let rows = rows
        .into_iter()
        .map(|(k, v)| Row::from_iter([k.to_string(), v]))
        .collect::<Vec<_>>();
    let table = Table::new(rows, [Constraint::Length(15), Constraint::Min(0)])
        .block(Block::bordered().title("Info"));
    f.render_widget(table, rect);
}

fn mirror_names(state: &AppState) -> String {
    state
        .mirrors
        .all()
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn current_commands(state: &AppState) -> Vec<(&str, &str, &str)> {
    match state.tab {
        Tab::Requirements => state.requirements_widget.command_descriptions(),
        Tab::Environment => state.environment_widget.command_descriptions(),
    }
}

fn draw_help(state: &AppState, f: &mut Frame) {
    if !state.show_help {
        return;
    }

    let mut commands = vec![
        "?: Toggle Help".to_string(),
        "q: Quit".to_string(),
        "Tab: Change view".to_string(),
        "r/F5: Refresh".to_string(),
        format!("m: Next mirror ({})", mirror_names(state)),
        "p: Edit paths".to_string(),
        "/: Search".to_string(),
        "i: Toggle Info Panel".to_string(),
        "Space: Select row".to_string(),
        "Ctrl+a: Toggle select all".to_string(),
        "Esc: Clear Filter".to_string(),
        "1-9: Sort column".to_string(),
        "".to_string(),
    ];
    commands.extend(
        current_commands(state)
            .into_iter()
            .map(|(k, v, _)| format!("{k}: {v}")),
    );

    let height = commands.len() as u16 + 2;
    let rect = centered(f.area(), 40, height);
    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Blue).fg(Color::Black));
    let paragraph = Paragraph::new(commands.into_iter().map(Line::from).collect::<Vec<_>>())
        .block(block)
        .alignment(Alignment::Left);
    f.render_widget(Clear, rect);
    f.render_widget(paragraph, rect);
}

fn draw_status(state: &AppState, f: &mut Frame, rect: Rect) {
    let mut text = vec![" ?:Help", "Tab:Change view", "/:Search", "r:Refresh", "m:Mirror"];
    let extra = current_commands(state)
        .into_iter()
        .filter(|(_, _, v)| !v.is_empty())
        .map(|(k, _, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>();
    text.extend(extra.iter().map(|s| s.as_str()));

    let [keys_area, message_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(rect);
    f.render_widget(
        Paragraph::new(text.join("  ")).style(Style::default().fg(Color::Yellow)),
        keys_area,
    );
    //multi line messages only show their first line here
    let message = state.message.as_ref().lines().next().unwrap_or_default();
    Text::raw(message)
        .style(Style::default().fg(state.message.level().color()))
        .render(message_area, f.buffer_mut());
}

fn draw_modal(state: &AppState, f: &mut Frame) {
    let area = f.area();
    match &state.modal {
        None => {}
        Some(Modal::Warning(text)) => f.render_widget(Popup::warning(text), area),
        Some(Modal::Confirm(text, _)) => f.render_widget(Popup::confirm(text), area),
        Some(Modal::Output(output)) => {
            let rect = centered(area, 90, area.height.saturating_sub(4));
            f.render_widget(output, rect);
        }
        Some(Modal::Paths(form)) => f.render_widget(form, centered(area, 70, 9)),
    }
}

fn handle_event(state: &mut AppState) -> Result<EventResult> {
    let Event::Key(key) = event::read()? else {
        return Ok(EventResult::None);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(EventResult::None);
    }

    //priority is ctrl+c
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(EventResult::Quit);
    }

    //an open dialog takes every key
    if let Some(modal) = state.modal.take() {
        return Ok(handle_modal(state, modal, &key));
    }

    if state.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
            state.show_help = false;
        }
        //no other actions allowed
        return Ok(EventResult::None);
    }

    let res = match state.tab {
        Tab::Requirements => state.requirements_widget.handle_key_event(&key),
        Tab::Environment => state.environment_widget.handle_key_event(&key),
    };
    if let Some(res) = res {
        return Ok(res);
    }

    //final global key handling
    match key.code {
        KeyCode::Char('?') => state.show_help = true,
        KeyCode::Char('q') => return Ok(EventResult::Quit),
        KeyCode::Tab => state.tab.cycle_next(),
        KeyCode::Char('i') => state.show_info = !state.show_info,
        KeyCode::Char('r') | KeyCode::F(5) => return Ok(EventResult::NeedsRefresh),
        KeyCode::Char('m') => return Ok(EventResult::CycleMirror),
        KeyCode::Char('p') => return Ok(EventResult::EditPaths),
        _ => {}
    }
    Ok(EventResult::None)
}

/// Keys for the open dialog. The dialog is put back unless the key closed it.
fn handle_modal(state: &mut AppState, modal: Modal, key: &KeyEvent) -> EventResult {
    match modal {
        Modal::Warning(text) => {
            if !matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                state.modal = Some(Modal::Warning(text));
            }
        }
        Modal::Confirm(text, command) => match key.code {
            KeyCode::Char('y') | KeyCode::Enter => return EventResult::Command(command),
            KeyCode::Char('n') | KeyCode::Esc => {}
            _ => state.modal = Some(Modal::Confirm(text, command)),
        },
        Modal::Output(mut output) => {
            if !output.handle_key_event(key) {
                state.modal = Some(Modal::Output(output));
            }
        }
        Modal::Paths(mut form) => match form.handle_key_event(key) {
            PathsAction::None => state.modal = Some(Modal::Paths(form)),
            PathsAction::Cancel => {}
            PathsAction::Apply { manifest, python } => {
                tracing::info!(?manifest, ?python, "paths changed");
                state.manifest_path = manifest;
                state.python_path = python;
                return EventResult::NeedsRefresh;
            }
        },
    }
    EventResult::None
}
