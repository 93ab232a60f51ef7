use std::{fs, io, path::Path, process, sync::Arc};

use navcache::{
    cache::EventKind,
    config::{self, ReplayArgs, Settings},
    context::NavContext,
    infra::{
        clock::SystemClock,
        error::InfraError,
        session_store::{FileSessionStore, MemorySessionStore, SessionStore},
        telemetry,
    },
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

fn main() {
    if let Err(error) = run() {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &InfraError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

fn run() -> Result<(), InfraError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Replay(args) => run_replay(&settings, &args),
        config::Command::CheckConfig => print_json(&settings),
    }
}

fn run_replay(settings: &Settings, args: &ReplayArgs) -> Result<(), InfraError> {
    let events = read_events(&args.file)?;
    let context = NavContext::new(settings, Arc::new(SystemClock), session_store(settings)?);

    if args.restore_snapshot {
        context.messages().restore_snapshot();
    }
    context.messages().set_viewer(args.viewer);

    let event_count = events.len();
    for kind in events {
        context.publish(kind);
    }
    let report = context.consume();

    info!(
        file = %args.file.display(),
        event_count,
        applied = report.events,
        "Replay complete"
    );

    #[derive(Serialize)]
    struct ReplayOutput<'a> {
        report: navcache::cache::ConsumeReport,
        state: &'a navcache::context::CacheSnapshot,
    }

    print_json(&ReplayOutput {
        report,
        state: &context.snapshot(),
    })
}

fn read_events(path: &Path) -> Result<Vec<EventKind>, InfraError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|err| InfraError::input(path.display().to_string(), err.to_string()))
}

fn session_store(settings: &Settings) -> Result<Arc<dyn SessionStore>, InfraError> {
    match settings.session.directory.as_ref() {
        Some(directory) => {
            fs::create_dir_all(directory)?;
            Ok(Arc::new(FileSessionStore::new(directory)))
        }
        None => Ok(Arc::new(MemorySessionStore::new())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), InfraError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| InfraError::input("stdout", err.to_string()))?;
    println!("{rendered}");
    Ok(())
}
