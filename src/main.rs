use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use typerush::{
    app::{App, AppState},
    app_dirs::AppDirs,
    auth::{AuthProvider, LocalAuth},
    clock::SystemClock,
    config::{parse_launch_query, Config, ConfigStore, FileConfigStore, LaunchParams, QUICK_STARTS},
    corpus::{Corpus, Difficulty},
    error::{ConfigurationError, PersistenceError, TypeRushError},
    logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    scores,
    session::{Effect, Session, SessionConfig},
    store::{ScoreStore, SqliteScoreStore},
    text_generator::TextGenerator,
    ui::screen::current_screen,
};

/// timed typing test with difficulty tiers, high scores and a profile
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed typing test: type the passage before the countdown ends, then see your speed, accuracy and how it compares to your best."
)]
pub struct Cli {
    /// difficulty tier to draw passages from
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// number of seconds to run the test
    #[clap(short = 's', long = "duration", value_parser = clap::value_parser!(u32).range(1..))]
    duration_secs: Option<u32>,

    /// launch parameters as a query string, e.g. "difficulty=hard&duration=120"
    #[clap(long)]
    params: Option<String>,

    /// name scores are recorded under (defaults to $USER)
    #[clap(short = 'u', long)]
    user: Option<String>,

    /// json file with easy/medium/hard passages to use instead of the built-in set
    #[clap(long)]
    corpus: Option<PathBuf>,

    /// write your score history as csv and exit
    #[clap(long, value_name = "PATH")]
    export_csv: Option<PathBuf>,

    /// open the profile screen first
    #[clap(long)]
    profile: bool,
}

impl Cli {
    /// Stored settings, overridden by `--params`, overridden by explicit flags
    fn merge(&self, stored: &Config) -> Config {
        let mut cfg = stored.clone();

        if let Some(query) = &self.params {
            LaunchParams::parse(query).apply_to(&mut cfg);
        }
        if let Some(difficulty) = self.difficulty {
            cfg.difficulty = difficulty;
        }
        if let Some(secs) = self.duration_secs {
            cfg.duration_secs = secs;
        }
        if let Some(user) = &self.user {
            cfg.user_name = Some(user.clone());
        }
        if let Some(path) = &self.corpus {
            cfg.corpus_path = Some(path.clone());
        }
        cfg
    }
}

fn fail(kind: ErrorKind, message: impl std::fmt::Display) -> ! {
    Cli::command().error(kind, message).exit()
}

fn load_corpus(cfg: &Config) -> Result<Corpus, ConfigurationError> {
    let corpus = match &cfg.corpus_path {
        Some(path) => Corpus::from_path(path)?,
        None => Corpus::builtin()?,
    };
    corpus.validate()?;
    Ok(corpus)
}

fn open_store() -> Result<SqliteScoreStore, TypeRushError> {
    let store = match AppDirs::db_path() {
        Some(path) => SqliteScoreStore::open(&path)?,
        None => {
            warn!("no state directory; scores kept in memory for this run");
            SqliteScoreStore::open_in_memory()?
        }
    };
    Ok(store)
}

fn export_history(
    store: &SqliteScoreStore,
    auth: &LocalAuth,
    path: &Path,
) -> Result<usize, TypeRushError> {
    let user = auth.current_user().ok_or(TypeRushError::NotAuthenticated)?;
    let records = store.read_scores(&user.id)?;
    let file = File::create(path).map_err(PersistenceError::from)?;
    scores::export_csv(&records, file)?;
    Ok(records.len())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_path) = AppDirs::log_path() {
        // logging is best effort; the TUI still works without it
        let _ = logging::init(&log_path);
    }

    let config_store = FileConfigStore::new();
    let cfg = cli.merge(&config_store.load());

    let corpus = load_corpus(&cfg).unwrap_or_else(|e| fail(ErrorKind::InvalidValue, e));
    info!(%corpus, difficulty = %cfg.difficulty, duration = cfg.duration_secs, "starting");

    if let Err(e) = config_store.save(&cfg) {
        warn!(path = %config_store.path().display(), error = %e, "could not save config");
    }

    let store = open_store().unwrap_or_else(|e| fail(ErrorKind::Io, e));
    let auth = LocalAuth::new(cfg.user_name.as_deref());

    if let Some(path) = &cli.export_csv {
        let written = export_history(&store, &auth, path).unwrap_or_else(|e| fail(ErrorKind::Io, e));
        println!("wrote {written} scores to {}", path.display());
        return Ok(());
    }

    if !stdin().is_tty() {
        fail(ErrorKind::Io, "stdin must be a tty");
    }

    let session = Session::new(
        cfg.session_config(),
        TextGenerator::with_random(corpus),
        Box::new(SystemClock),
    )
    .unwrap_or_else(|e| fail(ErrorKind::InvalidValue, e));

    let mut app = App::new(session, Box::new(store), Box::new(auth));
    app.refresh_dashboard();
    if cli.profile {
        if let Err(e) = app.show_profile() {
            app.notice = Some(e.to_string());
        }
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Host-side effects: the countdown. Completion is persisted after the next draw.
fn apply_effects(effects: Vec<Effect>, runner: &mut Runner<CrosstermEventSource, FixedTicker>) {
    for effect in effects {
        match effect {
            Effect::StartTimer => runner.arm(),
            Effect::CancelTimer => runner.disarm(),
            Effect::FocusInput | Effect::Completed(_) => {}
        }
    }
}

/// Draw, then write any score waiting on the results screen and redraw with
/// the high-score verdict
fn draw_and_persist<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    terminal.draw(|f| ui(app, f))?;
    if !app.persist_pending() {
        return Ok(());
    }

    let new_high = app
        .outcome
        .as_ref()
        .filter(|o| o.is_new_high_score)
        .map(|o| o.report.metrics.wpm);
    if let Some(wpm) = new_high {
        let size = terminal.size()?;
        app.celebration.start(size.width, size.height, wpm);
    }
    terminal.draw(|f| ui(app, f))?;
    Ok(())
}

fn start(app: &mut App) -> Vec<Effect> {
    match app.start() {
        Ok(effects) => effects,
        Err(e) => {
            app.notice = Some(e.to_string());
            vec![]
        }
    }
}

fn apply_quick_start(app: &mut App, index: usize) -> Vec<Effect> {
    let Some(query) = QUICK_STARTS.get(index) else {
        return vec![];
    };
    let SessionConfig {
        difficulty,
        duration_secs,
    } = parse_launch_query(query);

    if let Err(e) = app
        .set_difficulty(difficulty)
        .and_then(|_| app.set_duration(duration_secs))
    {
        app.notice = Some(e.to_string());
        return vec![];
    }
    start(app)
}

fn show_profile(app: &mut App) {
    if let Err(e) = app.show_profile() {
        app.notice = Some(e.to_string());
    }
}

/// Report a rejected settings change without leaving the setup screen
fn note(app: &mut App, result: Result<bool, ConfigurationError>) {
    if let Err(e) = result {
        app.notice = Some(e.to_string());
    }
}

/// Returns false when the user asked to quit
fn on_key(app: &mut App, key: KeyEvent) -> (bool, Vec<Effect>) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return (false, vec![]);
    }

    let effects = match app.state {
        AppState::Setup => match key.code {
            KeyCode::Esc => return (false, vec![]),
            KeyCode::Enter => start(app),
            KeyCode::Char('d') => {
                let result = app.cycle_difficulty();
                note(app, result);
                vec![]
            }
            KeyCode::Char('t') => {
                let result = app.cycle_duration();
                note(app, result);
                vec![]
            }
            KeyCode::Char(c @ '1'..='3') => apply_quick_start(app, c as usize - '1' as usize),
            KeyCode::Char('p') => {
                show_profile(app);
                vec![]
            }
            _ => vec![],
        },
        AppState::Typing => match key.code {
            KeyCode::Esc => app.abandon(),
            KeyCode::Tab => app.stop(),
            KeyCode::Backspace => {
                app.backspace();
                vec![]
            }
            KeyCode::Char(c) => {
                app.type_char(c);
                vec![]
            }
            _ => vec![],
        },
        AppState::Results => match key.code {
            KeyCode::Esc => return (false, vec![]),
            KeyCode::Char('r') => start(app),
            KeyCode::Char('n') => {
                app.back_to_setup();
                vec![]
            }
            KeyCode::Char('p') => {
                show_profile(app);
                vec![]
            }
            _ => vec![],
        },
        AppState::Profile => match key.code {
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                app.back_to_setup();
                vec![]
            }
            _ => vec![],
        },
    };
    (true, effects)
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::countdown());

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            Some(AppEvent::Tick) => {
                let effects = app.tick();
                apply_effects(effects, &mut runner);
                draw_and_persist(terminal, app)?;
            }
            Some(AppEvent::Resize) => {
                terminal.draw(|f| ui(app, f))?;
            }
            Some(AppEvent::Key(key)) => {
                let (keep_going, effects) = on_key(app, key);
                if !keep_going {
                    break;
                }
                apply_effects(effects, &mut runner);
                draw_and_persist(terminal, app)?;
            }
            None => {
                if app.celebration.is_active {
                    app.celebration.update();
                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }
    }

    if app.session.is_active() {
        app.abandon();
    }
    app.persist_pending();
    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    current_screen(&app.state).render(app, f);
}
