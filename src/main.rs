use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

use splitstreak::{
    component::{Component, ComponentFactory},
    layout::{FileLayoutStore, Layout, LayoutStore},
    run::Run,
    streak::{streak_counts, StreakFactory, StreakSettings},
    timer::{Timer, TimerPhase},
    timing::{TimeSpan, TimingMethod},
    ui::App,
};

const TICK_RATE_MS: u64 = 100;

/// terminal split timer host showing the goal-streak component
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A minimal terminal split-timer host for the Streak component: tracks how many consecutive attempts finish under a goal time."
)]
struct Cli {
    /// splits file holding the run and its attempt history
    #[clap(short, long)]
    splits: Option<PathBuf>,

    /// layout file overriding the default location
    #[clap(long)]
    layout: Option<PathBuf>,

    /// timing method used for streak qualification
    #[clap(short = 'm', long, value_enum, default_value_t = MethodArg::RealTime)]
    timing_method: MethodArg,

    /// goal time override, e.g. "28:30"
    #[clap(short, long)]
    goal: Option<String>,

    /// start with the streak label and value on two rows
    #[clap(long)]
    two_rows: bool,

    /// print the streak value for the splits file and exit
    #[clap(long)]
    print_streak: bool,

    /// write the attempt history as CSV to the given path and exit
    #[clap(long)]
    export_history: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum MethodArg {
    RealTime,
    GameTime,
}

impl MethodArg {
    fn as_method(self) -> TimingMethod {
        match self {
            MethodArg::RealTime => TimingMethod::RealTime,
            MethodArg::GameTime => TimingMethod::GameTime,
        }
    }
}

/// Unified event type consumed by the TUI loop.
#[derive(Clone, Debug)]
enum HostEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

fn spawn_event_source() -> Receiver<HostEvent> {
    let (tx, rx) = mpsc::channel();

    let key_tx = tx.clone();
    thread::spawn(move || loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => {
                if key_tx.send(HostEvent::Key(key)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Resize(_, _)) => {
                if key_tx.send(HostEvent::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });

    thread::spawn(move || loop {
        if tx.send(HostEvent::Tick).is_err() {
            break;
        }
        thread::sleep(Duration::from_millis(TICK_RATE_MS));
    });

    rx
}

fn load_run(cli: &Cli) -> io::Result<Run> {
    match &cli.splits {
        Some(path) if path.exists() => Run::load(path),
        _ => {
            let mut run = Run::new("New Game", "Any%");
            run.segment_names = vec!["Done".to_string()];
            Ok(run)
        }
    }
}

fn goal_override(cli: &Cli) -> Option<TimeSpan> {
    cli.goal.as_deref().and_then(TimeSpan::parse)
}

/// Headless path: compute and print the streak line, no terminal needed.
fn print_streak(cli: &Cli, run: &Run) {
    let goal = goal_override(cli).unwrap_or_else(|| StreakSettings::default().goal_time);
    let counts = streak_counts(
        &run.attempt_history,
        cli.timing_method.as_method(),
        goal,
    );
    println!("{} (best: {})", counts.current, counts.best);
}

/// Apply a settings edit to every streak component through the settings
/// node contract.
fn edit_streak_settings(layout: &mut Layout, edit: impl Fn(&mut StreakSettings)) {
    for component in layout.components_mut() {
        if component.name() == "Streak" {
            let mut settings = StreakSettings::default();
            settings.merge_node(&component.settings());
            edit(&mut settings);
            component.set_settings(&settings.to_node());
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let run = load_run(&cli)?;

    if let Some(path) = &cli.export_history {
        let file = File::create(path)?;
        run.export_history_csv(file)?;
        return Ok(());
    }

    if cli.print_streak {
        print_streak(&cli, &run);
        return Ok(());
    }

    if !stdin().is_tty() {
        return Err("stdin must be a tty (use --print-streak for headless output)".into());
    }

    let mut timer = Timer::new(run);
    timer.set_current_timing_method(cli.timing_method.as_method());

    let store = match &cli.layout {
        Some(path) => FileLayoutStore::with_path(path),
        None => FileLayoutStore::new(),
    };
    let factories: [&dyn ComponentFactory; 1] = [&StreakFactory];
    let mut layout = store.load(&factories, &timer);
    if layout.is_empty() {
        layout.add_component(StreakFactory.create(&timer));
    }
    if let Some(goal) = goal_override(&cli) {
        edit_streak_settings(&mut layout, |settings| settings.goal_time = goal);
    }
    if cli.two_rows {
        edit_streak_settings(&mut layout, |settings| settings.display_two_rows = true);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(timer, layout);
    let result = run_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    store.save(&app.layout)?;
    if let Some(path) = &cli.splits {
        app.timer.into_run().save(path)?;
    }

    Ok(())
}

fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let events = spawn_event_source();
    app.tick();
    terminal.draw(|frame| frame.render_widget(&mut *app, frame.area()))?;

    loop {
        let mut should_draw = false;
        match events.recv()? {
            HostEvent::Key(key) => {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char(' ') => {
                        if app.timer.phase() == TimerPhase::NotRunning {
                            app.timer.start();
                        } else {
                            app.timer.split();
                        }
                    }
                    KeyCode::Char('u') => app.timer.undo_split(),
                    KeyCode::Char('r') => app.timer.reset(true),
                    KeyCode::Char('x') => app.timer.reset(false),
                    KeyCode::Char('t') => {
                        let toggled = app.timer.current_timing_method().toggled();
                        app.timer.set_current_timing_method(toggled);
                    }
                    KeyCode::Char('b') => {
                        edit_streak_settings(&mut app.layout, |settings| {
                            settings.show_best = !settings.show_best;
                        });
                    }
                    KeyCode::Char('2') => {
                        edit_streak_settings(&mut app.layout, |settings| {
                            settings.display_two_rows = !settings.display_two_rows;
                        });
                    }
                    KeyCode::Char('o') => app.horizontal = !app.horizontal,
                    KeyCode::Char('g') => {
                        edit_streak_settings(&mut app.layout, |settings| {
                            let nudged = settings.goal_time - TimeSpan::from_seconds(30.0);
                            if !nudged.is_negative() {
                                settings.goal_time = nudged;
                            }
                        });
                    }
                    KeyCode::Char('G') => {
                        edit_streak_settings(&mut app.layout, |settings| {
                            settings.goal_time =
                                settings.goal_time + TimeSpan::from_seconds(30.0);
                        });
                    }
                    _ => {}
                }
                should_draw = true;
            }
            HostEvent::Resize => should_draw = true,
            HostEvent::Tick => {
                // Redraw on ticks while the clock is visibly moving.
                if app.timer.phase() == TimerPhase::Running {
                    should_draw = true;
                }
            }
        }

        // Events raised by the key handling above reach every component
        // before the next draw.
        if app.tick() {
            should_draw = true;
        }
        if should_draw {
            terminal.draw(|frame| frame.render_widget(&mut *app, frame.area()))?;
        }
    }

    Ok(())
}
