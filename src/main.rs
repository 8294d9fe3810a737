mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dactyl::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, MAX_MINUTES, MIN_MINUTES},
    content::{
        load_reference, remote::DEFAULT_TIMEOUT, BundledSource, ContentError, ContentSource,
        FixedSource, PracticeTest, RemoteSource, SourceKind,
    },
    logging::init_logging,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    session::{Session, SessionConfig},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
};
use tracing::{info, warn};

use crate::ui::{scroll::ScrollState, ui};

/// timed typing practice with word-level feedback
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed typing practice in the terminal. Type the passage before the clock runs out and get words per minute, accuracy and progress towards the test's word goal."
)]
pub struct Cli {
    /// length of the test in minutes
    #[clap(short = 'm', long, value_parser = clap::value_parser!(u64).range(MIN_MINUTES..=MAX_MINUTES))]
    minutes: Option<u64>,

    /// practice test to take texts, duration and word goal from (remote source)
    #[clap(short = 't', long)]
    test_id: Option<u64>,

    /// custom text to practice with
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// where practice texts come from
    #[clap(long, value_enum)]
    source: Option<SourceKind>,

    /// base url of the practice backend
    #[clap(long)]
    api_url: Option<String>,

    /// print the backend's practice tests and exit
    #[clap(long)]
    list_tests: bool,

    /// only list the tests of this institution (with --list-tests)
    #[clap(short = 'i', long, requires = "list_tests")]
    institution: Option<u64>,

    /// print the institutions offering practice tests and exit
    #[clap(long, conflicts_with = "list_tests")]
    list_institutions: bool,

    /// log more (repeat for more detail)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbosity: u8,

    /// write logs here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Layer command line flags over the stored configuration
    fn apply(&self, mut config: Config) -> Config {
        if let Some(minutes) = self.minutes {
            config.minutes = minutes;
        }
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if self.test_id.is_some() {
            config.test_id = self.test_id;
            config.source = SourceKind::Remote;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub session: Session,
    pub state: AppState,
    pub config: Config,
    pub test: Option<PracticeTest>,
    pub scroll: ScrollState,
    source: Box<dyn ContentSource>,
    store: Box<dyn ConfigStore>,
}

fn session_config(config: &Config, test: Option<&PracticeTest>) -> SessionConfig {
    match test {
        Some(test) => SessionConfig {
            duration_secs: test.duration_secs(),
            minimum_words: Some(test.minimum_words),
        },
        None => SessionConfig {
            duration_secs: config.duration_secs(),
            minimum_words: None,
        },
    }
}

/// Pick the content source for this run and look up the selected test
fn resolve_source(
    cli: &Cli,
    config: &Config,
) -> Result<(Box<dyn ContentSource>, Option<PracticeTest>), ContentError> {
    if let Some(prompt) = &cli.prompt {
        return Ok((Box::new(FixedSource::new(prompt.clone())), None));
    }

    match config.source {
        SourceKind::Bundled => Ok((Box::new(BundledSource), None)),
        SourceKind::Remote => {
            let remote = RemoteSource::new(&config.api_base_url, DEFAULT_TIMEOUT)?;
            let test = config.test_id.and_then(|id| match remote.find_test(id) {
                Ok(test) => Some(test),
                Err(err) => {
                    warn!(test_id = id, error = %err, "practice test lookup failed");
                    None
                }
            });
            Ok((Box::new(remote), test))
        }
    }
}

impl App {
    pub fn new(cli: &Cli, store: Box<dyn ConfigStore>) -> Result<Self, ContentError> {
        let config = cli.apply(store.load().with_env(|key| std::env::var(key).ok()));
        let (source, test) = resolve_source(cli, &config)?;
        Ok(Self::with_source(config, store, source, test))
    }

    fn with_source(
        config: Config,
        store: Box<dyn ConfigStore>,
        source: Box<dyn ContentSource>,
        test: Option<PracticeTest>,
    ) -> Self {
        let test_id = test.as_ref().map(|t| t.id).or(config.test_id);
        let content = load_reference(source.as_ref(), test_id);
        let session = Session::new(session_config(&config, test.as_ref()), content);

        Self {
            session,
            state: AppState::Idle,
            config,
            test,
            scroll: ScrollState::default(),
            source,
            store,
        }
    }

    fn test_id(&self) -> Option<u64> {
        self.test.as_ref().map(|t| t.id).or(self.config.test_id)
    }

    /// Fetch another passage; only while nothing is running
    fn load_new_text(&mut self) {
        let content = load_reference(self.source.as_ref(), self.test_id());
        if self.session.set_content(content).is_ok() {
            self.scroll.reset();
            self.state = AppState::Idle;
        }
    }

    fn adjust_minutes(&mut self, delta: i64) {
        if self.test.is_some() {
            return;
        }
        self.config.adjust_minutes(delta);
        if self
            .session
            .set_config(session_config(&self.config, None))
            .is_ok()
        {
            if let Err(err) = self.store.save(&self.config) {
                warn!(error = %err, "could not save config");
            }
        }
    }

    fn start(&mut self) {
        match self.session.start() {
            Ok(()) => {
                self.scroll.reset();
                self.state = AppState::Typing;
            }
            Err(err) => info!(error = %err, "start ignored"),
        }
    }

    fn finish(&mut self) {
        if self.session.finish().is_some() {
            self.scroll.reset();
            self.state = AppState::Results;
        }
    }

    /// Advance the clock; returns whether the screen needs a redraw
    fn on_tick(&mut self) -> bool {
        if self.state != AppState::Typing {
            return false;
        }
        if self.session.on_tick().is_some() {
            self.scroll.reset();
            self.state = AppState::Results;
        }
        true
    }

    fn on_key(&mut self, key: KeyEvent) -> Control {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            AppState::Idle => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                KeyCode::Enter => self.start(),
                KeyCode::Char('n') => self.load_new_text(),
                KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_minutes(1),
                KeyCode::Char('-') => self.adjust_minutes(-1),
                _ => {}
            },
            AppState::Typing => match key.code {
                KeyCode::Esc => {
                    if self.session.cancel().is_ok() {
                        self.scroll.reset();
                        self.state = AppState::Idle;
                    }
                }
                KeyCode::Tab => self.finish(),
                KeyCode::Backspace => self.session.on_backspace(),
                KeyCode::Enter => self.session.on_char(' '),
                KeyCode::Char(c) => self.session.on_char(c),
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => return Control::Quit,
                KeyCode::Enter | KeyCode::Char('r') => {
                    self.session.dismiss_result();
                    self.scroll.reset();
                    self.state = AppState::Idle;
                }
                KeyCode::Char('n') => self.load_new_text(),
                _ => {}
            },
        }

        Control::Continue
    }
}

fn print_tests<W: Write>(
    remote: &RemoteSource,
    institution: Option<u64>,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let tests = remote.list_tests(institution)?;
    if tests.is_empty() {
        writeln!(out, "no practice tests available at {}", remote.base_url())?;
        return Ok(());
    }
    for test in tests {
        writeln!(
            out,
            "{:>4}  {} ({} min, {} words){}",
            test.id,
            test.name,
            test.minutes,
            test.minimum_words,
            test.institution_name
                .as_deref()
                .map(|name| format!(" - {name}"))
                .unwrap_or_default()
        )?;
    }
    Ok(())
}

fn print_institutions<W: Write>(remote: &RemoteSource, out: &mut W) -> Result<(), Box<dyn Error>> {
    let institutions = remote.list_institutions()?;
    if institutions.is_empty() {
        writeln!(out, "no institutions available at {}", remote.base_url())?;
        return Ok(());
    }
    for institution in institutions {
        writeln!(
            out,
            "{:>4}  {}{}",
            institution.id,
            institution.name,
            institution
                .province
                .as_deref()
                .map(|province| format!(" ({province})"))
                .unwrap_or_default()
        )?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(log_file) = cli.log_file.clone().or_else(AppDirs::log_path) {
        // best effort: the app runs without a log
        if let Err(err) = init_logging(cli.verbosity, &log_file) {
            eprintln!("dactyl: logging disabled, {}: {err}", log_file.display());
        }
    }

    if cli.list_tests || cli.list_institutions {
        let store = FileConfigStore::new();
        let config = cli.apply(store.load().with_env(|key| std::env::var(key).ok()));
        let remote = RemoteSource::new(&config.api_base_url, DEFAULT_TIMEOUT)?;
        let mut out = io::stdout().lock();
        return if cli.list_institutions {
            print_institutions(&remote, &mut out)
        } else {
            print_tests(&remote, cli.institution, &mut out)
        };
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(&cli, Box::new(FileConfigStore::new()))?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    terminal.draw(|f| ui(app, f))?;

    loop {
        match runner.step() {
            AppEvent::Tick => {
                if app.on_tick() {
                    terminal.draw(|f| ui(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui(app, f))?;
            }
            AppEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    break;
                }
                terminal.draw(|f| ui(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dactyl::compare::WordStatus;
    use ratatui::{backend::TestBackend, buffer::Buffer};
    use std::cell::Cell;
    use tempfile::TempDir;

    struct CountingSource {
        texts: Vec<&'static str>,
        calls: Cell<usize>,
    }

    impl ContentSource for CountingSource {
        fn fetch_reference_text(&self, _test_id: Option<u64>) -> Result<String, ContentError> {
            let idx = self.calls.get();
            self.calls.set(idx + 1);
            self.texts
                .get(idx)
                .map(|t| t.to_string())
                .ok_or(ContentError::Empty)
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    fn test_app(dir: &TempDir, source: Box<dyn ContentSource>) -> App {
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        App::with_source(Config::default(), Box::new(store), source, None)
    }

    fn fixed_app(dir: &TempDir, text: &str) -> App {
        test_app(dir, Box::new(FixedSource::new(text)))
    }

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| ui(app, f)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    fn buffer_text(buffer: &Buffer) -> String {
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn sample_test() -> PracticeTest {
        PracticeTest {
            id: 1,
            institution_id: 1,
            name: "Poder Judicial".to_string(),
            minutes: 5,
            minimum_words: 3,
            institution_name: None,
            province: None,
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["dactyl"]);

        assert_eq!(cli.minutes, None);
        assert_eq!(cli.test_id, None);
        assert_eq!(cli.prompt, None);
        assert_eq!(cli.source, None);
        assert!(!cli.list_tests);
        assert_eq!(cli.verbosity, 0);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "dactyl", "-m", "2", "-t", "7", "--source", "remote", "--api-url", "http://x", "-vv",
        ]);
        assert_eq!(cli.minutes, Some(2));
        assert_eq!(cli.test_id, Some(7));
        assert_eq!(cli.source, Some(SourceKind::Remote));
        assert_eq!(cli.api_url.as_deref(), Some("http://x"));
        assert_eq!(cli.verbosity, 2);

        let cli = Cli::parse_from(["dactyl", "--prompt", "hola mundo", "--list-tests"]);
        assert_eq!(cli.prompt.as_deref(), Some("hola mundo"));
        assert!(cli.list_tests);
    }

    #[test]
    fn test_cli_catalog_flags() {
        let cli = Cli::parse_from(["dactyl", "--list-tests", "-i", "2"]);
        assert!(cli.list_tests);
        assert_eq!(cli.institution, Some(2));

        let cli = Cli::parse_from(["dactyl", "--list-institutions"]);
        assert!(cli.list_institutions);
        assert_eq!(cli.institution, None);

        // the filter only makes sense when listing tests
        assert!(Cli::try_parse_from(["dactyl", "--institution", "2"]).is_err());
        assert!(Cli::try_parse_from(["dactyl", "--list-tests", "--list-institutions"]).is_err());
    }

    #[test]
    fn test_cli_rejects_out_of_range_minutes() {
        assert!(Cli::try_parse_from(["dactyl", "-m", "0"]).is_err());
        assert!(Cli::try_parse_from(["dactyl", "-m", "61"]).is_err());
        assert!(Cli::try_parse_from(["dactyl", "--source", "ftp"]).is_err());
    }

    #[test]
    fn test_cli_apply_overrides_config() {
        let cli = Cli::parse_from(["dactyl", "-m", "3", "--api-url", "http://localhost:1"]);
        let config = cli.apply(Config::default());
        assert_eq!(config.minutes, 3);
        assert_eq!(config.api_base_url, "http://localhost:1");
        assert_eq!(config.source, SourceKind::Bundled);

        let cli = Cli::parse_from(["dactyl", "-t", "4"]);
        let config = cli.apply(Config::default());
        assert_eq!(config.test_id, Some(4));
        assert_eq!(config.source, SourceKind::Remote);
    }

    #[test]
    fn test_app_new_with_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["dactyl", "-p", "el perro corre", "-m", "1"]);
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let app = App::new(&cli, Box::new(store)).unwrap();

        assert_eq!(app.state, AppState::Idle);
        assert_eq!(app.session.config().duration_secs, 60);
        assert_eq!(app.session.word_states().len(), 3);
        assert!(app.session.can_start());
    }

    #[test]
    fn test_app_new_with_bundled_source() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["dactyl", "--source", "bundled"]);
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let app = App::new(&cli, Box::new(store)).unwrap();
        assert!(app.session.content().reference().is_some());
    }

    #[test]
    fn test_full_session_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro corre");

        // typing before start does nothing
        type_str(&mut app, "el");
        assert!(app.session.input().raw().is_empty());

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Typing);

        type_str(&mut app, "el corre");
        assert_eq!(app.session.word_states()[1].status, WordStatus::Error);
        assert_eq!(app.session.word_states()[2].status, WordStatus::Correct);

        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.state, AppState::Results);
        let result = app.session.result().unwrap();
        assert_eq!(result.correct_words, 2);
        assert_eq!(result.total_words, 3);

        // finishing again changes nothing
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.state, AppState::Results);

        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.state, AppState::Idle);
        assert!(app.session.result().is_none());
    }

    #[test]
    fn test_cancel_returns_to_idle_without_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro");
        app.on_key(key(KeyCode::Enter));
        type_str(&mut app, "el p");
        app.on_key(key(KeyCode::Backspace));
        assert_eq!(app.session.input().raw(), "el ");

        app.on_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Idle);
        assert!(app.session.result().is_none());
        assert!(app.session.input().raw().is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro");
        assert_eq!(app.on_key(key(KeyCode::Esc)), Control::Quit);

        app.on_key(key(KeyCode::Enter));
        // esc while typing cancels instead of quitting
        assert_eq!(app.on_key(key(KeyCode::Esc)), Control::Continue);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Control::Quit
        );
    }

    #[test]
    fn test_unavailable_text_disables_start_until_retry() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource {
            texts: vec!["", "hola mundo"],
            calls: Cell::new(0),
        };
        let mut app = test_app(&dir, Box::new(source));
        assert!(!app.session.can_start());

        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Idle);

        app.on_key(key(KeyCode::Char('n')));
        assert!(app.session.can_start());
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Typing);

        // no new text while running: 'n' is just typed
        app.on_key(key(KeyCode::Char('n')));
        assert_eq!(app.session.input().raw(), "n");
    }

    #[test]
    fn test_minutes_adjustment_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro");
        app.on_key(key(KeyCode::Char('+')));
        assert_eq!(app.config.minutes, 5);
        assert_eq!(app.session.config().duration_secs, 300);
        assert_eq!(app.session.remaining_secs(), 300);

        let stored = FileConfigStore::with_path(dir.path().join("config.json")).load();
        assert_eq!(stored.minutes, 5);

        app.on_key(key(KeyCode::Char('-')));
        app.on_key(key(KeyCode::Char('-')));
        assert_eq!(app.config.minutes, 3);
    }

    #[test]
    fn test_selected_test_sets_duration_and_goal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let mut app = App::with_source(
            Config::default(),
            Box::new(store),
            Box::new(FixedSource::new("uno dos tres")),
            Some(sample_test()),
        );
        assert_eq!(app.session.config().duration_secs, 300);
        assert_eq!(app.session.config().minimum_words, Some(3));

        // duration is fixed by the test
        app.on_key(key(KeyCode::Char('+')));
        assert_eq!(app.session.config().duration_secs, 300);

        app.on_key(key(KeyCode::Enter));
        type_str(&mut app, "uno dos tres");
        app.on_key(key(KeyCode::Tab));
        let goal = app.session.result().unwrap().goal().unwrap();
        assert!(goal.passed());
    }

    #[test]
    fn test_tick_only_redraws_while_typing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro");
        assert!(!app.on_tick());
        app.on_key(key(KeyCode::Enter));
        assert!(app.on_tick());
        assert_eq!(app.state, AppState::Typing);
    }

    #[test]
    fn test_render_idle_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro corre");
        let screen = render(&mut app);
        assert!(screen.contains("04:00"));
        assert!(screen.contains("el perro corre"));
        assert!(screen.contains("(enter) start"));
    }

    #[test]
    fn test_render_typing_screen() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = fixed_app(&dir, "el perro corre");
        app.on_key(key(KeyCode::Enter));
        type_str(&mut app, "el pe");
        let screen = render(&mut app);
        assert!(screen.contains("wpm"));
        assert!(screen.contains("el pe_"));
        assert!(screen.contains("(tab) finish"));
    }

    #[test]
    fn test_render_results_screen() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let mut app = App::with_source(
            Config::default(),
            Box::new(store),
            Box::new(FixedSource::new("uno dos tres")),
            Some(sample_test()),
        );
        app.on_key(key(KeyCode::Enter));
        type_str(&mut app, "uno dos");
        app.on_key(key(KeyCode::Tab));

        let screen = render(&mut app);
        assert!(screen.contains("% acc"));
        assert!(screen.contains("2 of 3 words correct"));
        assert!(screen.contains("2 / 3 words"));
        assert!(screen.contains("(r)etry"));
    }

    #[test]
    fn test_render_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let source = CountingSource {
            texts: vec![],
            calls: Cell::new(0),
        };
        let mut app = test_app(&dir, Box::new(source));
        let screen = render(&mut app);
        assert!(screen.contains("No practice text"));
        assert!(!screen.contains("(enter) start"));
    }

    #[test]
    fn test_long_text_scrolls_to_current_word() {
        let dir = tempfile::tempdir().unwrap();
        let text = (0..400).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let mut app = fixed_app(&dir, &text);
        app.on_key(key(KeyCode::Enter));

        let typed = (0..300).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        type_str(&mut app, &typed);
        type_str(&mut app, " w30");

        let screen = render(&mut app);
        assert!(app.scroll.offset() > 0);
        assert!(screen.contains("w300"));
    }
}
