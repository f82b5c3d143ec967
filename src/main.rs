/*!
 * RUM Replay - Main Entry Point
 *
 * Replays recorded instrumentation through a pipeline in virtual time:
 * - one JSON object per line, each stamped with `at` (ms since time origin)
 * - inputs are applied in file order, timers fire as time advances
 * - batches go to the configured intake, or to stdout with `--dry-run`
 *
 * Usage: rum-replay [--dry-run] [--url <page url>] [FILE]
 */

use anyhow::{bail, Context as _};
use rum_pipeline::action::ElementSnapshot;
use rum_pipeline::lifecycle::RequestCompleteEvent;
use rum_pipeline::transport::{RequestSender, ReqwestSender};
use rum_pipeline::{
    init_tracing, Configuration, Context, ErrorSource, PageStart, PerformanceEntry, PipelineHost, RelativeTime,
    RumPipeline, StaticEnvironment, StaticSession, TimeStamp, TransportError, ViewLocation,
};
use serde::Deserialize;
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::rc::Rc;
use tracing::{info, warn};

/// One recorded input
#[derive(Debug, Deserialize)]
struct ReplayLine {
    at: f64,
    #[serde(flatten)]
    input: ReplayInput,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayInput {
    DomMutated,
    PerformanceEntry { entry: PerformanceEntry },
    RequestStarted { request_index: u64 },
    RequestCompleted { request: RequestCompleteEvent },
    Click { target: ElementSnapshot },
    LocationChanged { href: String },
    RenewSession,
    BeforeUnload,
    AddError {
        message: String,
        source: ErrorSource,
        #[serde(default)]
        context: Option<Context>,
    },
    AddAction {
        name: String,
        #[serde(default)]
        context: Option<Context>,
    },
    SetGlobalContext { context: Context },
    AddGlobalContextProperty { key: String, value: Value },
    RemoveGlobalContextProperty { key: String },
    /// Only moves time forward
    Tick,
}

struct Args {
    dry_run: bool,
    url: String,
    input: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        dry_run: false,
        url: "https://localhost/".to_string(),
        input: None,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dry-run" => args.dry_run = true,
            "--url" => args.url = iter.next().context("--url expects a value")?,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => args.input = Some(path.to_string()),
        }
    }
    Ok(args)
}

/// Prints batches instead of sending them
struct StdoutSender;

impl RequestSender for StdoutSender {
    fn send_beacon(&self, _url: &str, _body: &str) -> bool {
        false
    }

    fn post(&self, url: &str, body: String) -> Result<(), TransportError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "POST {url}\n{body}").map_err(|e| TransportError::RequestFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn time_origin() -> TimeStamp {
    let now = time::OffsetDateTime::now_utc();
    TimeStamp((now.unix_timestamp_nanos() / 1_000_000) as f64)
}

fn apply(pipeline: &RumPipeline, session: &StaticSession, input: ReplayInput) -> anyhow::Result<()> {
    match input {
        ReplayInput::DomMutated => pipeline.dom_mutated(),
        ReplayInput::PerformanceEntry { entry } => pipeline.performance_entry(entry),
        ReplayInput::RequestStarted { request_index } => pipeline.request_started(request_index),
        ReplayInput::RequestCompleted { request } => pipeline.request_completed(request),
        ReplayInput::Click { target } => {
            pipeline.click(&target);
        }
        ReplayInput::LocationChanged { href } => pipeline.location_changed(&href)?,
        ReplayInput::RenewSession => {
            session.renew();
            pipeline.renew_session();
        }
        ReplayInput::BeforeUnload => pipeline.before_unload(),
        ReplayInput::AddError {
            message,
            source,
            context,
        } => pipeline.add_error(message, source, context),
        ReplayInput::AddAction { name, context } => pipeline.add_action(name, context),
        ReplayInput::SetGlobalContext { context } => pipeline.set_global_context(context),
        ReplayInput::AddGlobalContextProperty { key, value } => pipeline.add_global_context_property(key, value),
        ReplayInput::RemoveGlobalContextProperty { key } => pipeline.remove_global_context_property(&key),
        ReplayInput::Tick => {}
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = parse_args()?;

    let config = match Configuration::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(2);
        }
    };

    let reqwest_sender = if args.dry_run {
        None
    } else {
        Some(Rc::new(ReqwestSender::new()?))
    };
    let sender: Rc<dyn RequestSender> = match &reqwest_sender {
        Some(sender) => Rc::clone(sender) as Rc<dyn RequestSender>,
        None => Rc::new(StdoutSender),
    };

    let session = Rc::new(StaticSession::tracked());
    let location = ViewLocation::parse(&args.url)?;
    let pipeline = RumPipeline::start(
        config,
        PipelineHost {
            session: Rc::clone(&session) as Rc<dyn rum_pipeline::SessionManager>,
            environment: Rc::new(StaticEnvironment::new()),
            sender,
        },
        PageStart {
            time_origin: time_origin(),
            location,
            referrer: String::new(),
        },
    )?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("cannot open {path}"))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut replayed = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("cannot read line {}", index + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: ReplayLine = match serde_json::from_str(&line) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(line = index + 1, error = %e, "skipping unparsable input");
                continue;
            }
        };

        let at = RelativeTime(entry.at);
        if at < pipeline.now() {
            warn!(line = index + 1, at = %at, now = %pipeline.now(), "input out of order, applied at current time");
        }
        pipeline.advance_to(at);
        apply(&pipeline, &session, entry.input).with_context(|| format!("line {}", index + 1))?;
        replayed += 1;
    }

    pipeline.before_unload();
    pipeline.stop();
    if let Some(sender) = &reqwest_sender {
        sender.join_pending();
    }

    info!(replayed, "replay finished");
    Ok(())
}
