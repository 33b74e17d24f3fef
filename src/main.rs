mod config;
mod keybindings;
mod nav;
mod services;
mod ui;
mod utils;

use std::env;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::config::Settings;
use crate::nav::help::HelpOverlay;
use crate::nav::host::TreeHost;
use crate::nav::KeyNav;
use crate::ui::app::{handle_input, resolve_root, App};
use crate::utils::log::debug_log;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest wait for input when no deferred task is due sooner
const IDLE_POLL: Duration = Duration::from_millis(250);

fn print_help() {
    println!("treenav {} - Keyboard-driven file tree for a notes folder", VERSION);
    println!();
    println!("USAGE:");
    println!("    treenav [OPTIONS] [PATH]");
    println!();
    println!("ARGS:");
    println!("    [PATH]                  Folder to browse (default: current directory)");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help              Print help information");
    println!("    -v, --version           Print version information");
    println!("    --keys                  Print the key bindings with current settings");
    println!();
    println!("Set TREENAV_DEBUG=1 to write a debug log under ~/.treenav/debug/");
}

fn print_version() {
    println!("treenav {}", VERSION);
}

fn load_settings() -> Settings {
    match Settings::load_with_error() {
        Ok(settings) => settings,
        Err(e) => {
            debug_log(&format!("using default settings: {}", e));
            Settings::default()
        }
    }
}

fn print_keys() {
    let settings = load_settings();
    match keybindings::parse_excluded_keys(&settings.excluded_keys) {
        Ok(excluded) => {
            for line in HelpOverlay::build(&excluded).to_lines() {
                println!("{}", line);
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut root_arg: Option<PathBuf> = None;
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-v" | "--version" => {
                print_version();
                return Ok(());
            }
            "--keys" => {
                print_keys();
                return Ok(());
            }
            opt if opt.starts_with('-') => {
                eprintln!("Unknown option: {}", opt);
                eprintln!("Use --help for usage information");
                return Ok(());
            }
            path => root_arg = Some(PathBuf::from(path)),
        }
    }

    let root_arg = match root_arg {
        Some(path) => path,
        None => env::current_dir()?,
    };
    let root = match resolve_root(&root_arg) {
        Ok(root) => root,
        Err(e) => {
            eprintln!("Error: {}: {}", root_arg.display(), e);
            return Ok(());
        }
    };

    let settings = load_settings();
    let mut nav = match KeyNav::new(settings) {
        Ok(nav) => nav,
        Err(e) => {
            // Settings are validated on load; fall back if that was bypassed
            debug_log(&format!("settings rejected: {}", e));
            KeyNav::new(Settings::default()).map_err(|e| io::Error::other(e.to_string()))?
        }
    };
    let mut app = App::new(root);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
        crossterm::cursor::MoveTo(0, 0),
        EnterAlternateScreen
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &mut nav);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
        crossterm::cursor::MoveTo(0, 0),
        crossterm::cursor::Show
    )?;

    if let Err(err) = result {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    nav: &mut KeyNav,
) -> io::Result<()> {
    loop {
        nav.on_active_view_changed(app.active_view_type());
        terminal.draw(|f| ui::draw::draw(f, app, nav))?;

        // Wake up in time for the next deferred refocus or highlight clear
        let poll_timeout = match nav.next_deadline() {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()).min(IDLE_POLL),
            None => IDLE_POLL,
        };

        if event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if handle_input(app, nav, key.code, key.modifiers) {
                        return Ok(());
                    }
                    nav.run_pending(app, Instant::now());
                }
            }
        }

        nav.tick(Instant::now(), app);
        if let Some(err) = nav.take_last_error() {
            app.show_error(&err);
        }
    }
}
