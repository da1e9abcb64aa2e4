//! Terminal annotation loop over a JSON-lines dataset.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tagloop::config::{self, AppConfig};
use tagloop::dataset;
use tagloop::element::{LabelSet, ModelRef};
use tagloop::hotkeys::KeyCode;
use tagloop::selection::{SamplePool, SelectionMode};
use tagloop::session::StatusTone;
use tagloop::store::MemoryStore;
use tagloop::{AnnotationDispatcher, Navigation, SessionError, SessionState, logging};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let settings = config::load_or_default().unwrap_or_else(|err| {
        tracing::warn!("Using default settings: {err}");
        AppConfig::default()
    });
    let records = dataset::load_jsonl(&options.dataset).map_err(|err| err.to_string())?;
    let store = MemoryStore::new(records).with_scheme(&options.scheme, options.labels.clone());
    let state =
        SessionState::new(options.scheme.clone(), options.user.clone()).with_settings(&settings);
    let mut dispatcher = AnnotationDispatcher::new(store, state)
        .with_keyboard_shortcuts(settings.session.keyboard_shortcuts);

    dispatcher.refresh_project().map_err(|err| err.to_string())?;
    dispatcher.refresh_statistics();
    log_outcome(dispatcher.load_next());
    render(&dispatcher);

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| format!("Failed to read input: {err}"))?;
        match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(Command::Help) => print_help(dispatcher.state()),
            Some(command) => execute(&mut dispatcher, command),
            None => println!("Unknown command; type ? for help"),
        }
        render(&dispatcher);
    }

    if let Some(out) = &options.out {
        dataset::write_annotations(out, dispatcher.store().annotations())
            .map_err(|err| err.to_string())?;
        println!(
            "Wrote {} annotation(s) to {}",
            dispatcher.store().annotations().len(),
            out.display()
        );
    }
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Command {
    Key(KeyCode),
    Label(String),
    Undo,
    Mode(SelectionMode),
    Sample(SamplePool),
    RankBy(String),
    Filter(String),
    Train(String),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    match head {
        "q" | "quit" => Some(Command::Quit),
        "?" | "help" => Some(Command::Help),
        "u" | "undo" => Some(Command::Undo),
        "a" if !rest.is_empty() => Some(Command::Label(rest.to_string())),
        "m" => rest.parse().ok().map(Command::Mode),
        "s" => rest.parse().ok().map(Command::Sample),
        "l" if !rest.is_empty() => Some(Command::RankBy(rest.to_string())),
        "f" => Some(Command::Filter(rest.to_string())),
        "t" => Some(Command::Train(if rest.is_empty() {
            "simple".to_string()
        } else {
            rest.to_string()
        })),
        digit if digit.len() == 1 && digit.chars().all(|c| c.is_ascii_digit()) => {
            Some(Command::Key(KeyCode::from_code(&format!("Digit{digit}"))))
        }
        _ => None,
    }
}

fn execute(dispatcher: &mut AnnotationDispatcher<MemoryStore>, command: Command) {
    match command {
        Command::Key(key) => match dispatcher.handle_key(key) {
            Some(outcome) => log_outcome(outcome),
            None => println!("No label bound to {key}"),
        },
        Command::Label(label) => {
            let element_id = dispatcher.state().element_id().cloned();
            log_outcome(dispatcher.apply_label(&label, element_id.as_ref()));
        }
        Command::Undo => match dispatcher.undo() {
            Ok(Some(navigation)) => log_outcome(Ok(navigation)),
            Ok(None) => {}
            Err(err) => log_outcome(Err(err)),
        },
        Command::Mode(mode) => log_outcome(dispatcher.configure(|config| config.set_mode(mode))),
        Command::Sample(pool) => {
            log_outcome(dispatcher.configure(|config| config.set_sample(pool)))
        }
        Command::RankBy(label) => {
            log_outcome(dispatcher.configure(|config| config.set_label(Some(label))))
        }
        Command::Filter(filter) => {
            log_outcome(dispatcher.configure(|config| config.set_filter(filter)))
        }
        Command::Train(name) => {
            if dispatcher.train_model(ModelRef::named(name)).is_ok() {
                log_outcome(dispatcher.load_next());
            }
        }
        Command::Help | Command::Quit => {}
    }
}

fn log_outcome(outcome: Result<Navigation, SessionError>) {
    match outcome {
        Ok(navigation) => tracing::debug!("Navigation: {navigation:?}"),
        Err(err) => tracing::debug!("Action failed: {err}"),
    }
}

fn render(dispatcher: &AnnotationDispatcher<MemoryStore>) {
    let state = dispatcher.state();
    let mut out = io::stdout().lock();
    let _ = writeln!(out);
    if let Some(stats) = state.statistics() {
        let _ = writeln!(
            out,
            "[{} / {}] history {} | mode {} on {} | model {}",
            stats.annotated_n,
            stats.trainset_n,
            state.history().len(),
            state.config().effective_mode(state.has_model()),
            state.config().sample(),
            state.model().map_or("none", |model| model.model.as_str())
        );
    }
    match state.element() {
        Some(element) => {
            let _ = writeln!(out, "{}", element.in_scope());
            if !element.trailing_context().is_empty() {
                let _ = writeln!(out, "  …{}", element.trailing_context());
            }
            if state.config().display_prediction()
                && let Some(predict) = &element.predict
            {
                let _ = writeln!(out, "Predicted: {} (p={:.3})", predict.label, predict.proba);
            }
            if state.config().display_context() && !element.context.is_empty() {
                let context: Vec<String> = element
                    .context
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect();
                let _ = writeln!(out, "Context: {}", context.join(", "));
            }
        }
        None => {
            let _ = writeln!(out, "(no element)");
        }
    }
    let labels: Vec<String> = match dispatcher.key_binding() {
        Some(binding) => binding
            .labels()
            .iter()
            .enumerate()
            .map(|(index, label)| format!("{}:{label}", index + 1))
            .collect(),
        None => state.labels().iter().map(|label| format!("a {label}")).collect(),
    };
    let _ = writeln!(out, "{}", labels.join("  "));
    if let Some(status) = state.status() {
        let tag = match status.tone {
            StatusTone::Info => "info",
            StatusTone::Warning => "warn",
            StatusTone::Error => "error",
        };
        let _ = writeln!(out, "[{tag}] {}", status.text);
    }
    let _ = write!(out, "> ");
    let _ = out.flush();
}

struct Options {
    dataset: PathBuf,
    labels: LabelSet,
    scheme: String,
    user: String,
    out: Option<PathBuf>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut dataset = None;
    let mut labels = None;
    let mut scheme = "default".to_string();
    let mut user = "user".to_string();
    let mut out = None;
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let mut value = || {
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match flag {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--dataset" => dataset = Some(PathBuf::from(value()?)),
            "--labels" => labels = Some(LabelSet::new(value()?.split(','))),
            "--scheme" => scheme = value()?,
            "--user" => user = value()?,
            "--out" => out = Some(PathBuf::from(value()?)),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    let dataset = dataset.ok_or_else(|| format!("--dataset is required\n\n{}", help_text()))?;
    let labels = labels
        .filter(|labels| !labels.is_empty())
        .ok_or_else(|| format!("--labels is required\n\n{}", help_text()))?;
    Ok(Some(Options {
        dataset,
        labels,
        scheme,
        user,
        out,
    }))
}

fn help_text() -> &'static str {
    "Usage: tagloop --dataset <file.jsonl> --labels <a,b,c> [--scheme <name>] [--user <name>] [--out <file.jsonl>]"
}

fn print_help(state: &SessionState) {
    let modes: Vec<&str> = state.available_modes().iter().map(|mode| mode.as_str()).collect();
    let pools: Vec<&str> = state.samples().iter().map(|pool| pool.as_str()).collect();
    println!("{}", command_help());
    println!("modes: {} | pools: {}", modes.join(", "), pools.join(", "));
}

fn command_help() -> &'static str {
    "1-9 label | a <label> label by name | u undo | m <mode> | s <pool> | l <label> rank by | f <filter> | t [model] train | q quit"
}
