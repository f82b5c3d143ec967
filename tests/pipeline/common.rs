/*!
 * Shared pipeline fixtures
 */

use rum_pipeline::{
    Configuration, PageStart, PipelineHost, RecordingSender, RumPipeline, SessionManager, StaticEnvironment,
    StaticSession, TimeStamp, ViewLocation,
};
use serde_json::Value;
use std::rc::Rc;

pub const TIME_ORIGIN: f64 = 1_700_000_000_000.0;
pub const PAGE_URL: &str = "https://app.example/home";
pub const INTAKE: &str = "https://intake.example/v1/input";

pub struct Harness {
    pub pipeline: RumPipeline,
    pub sender: Rc<RecordingSender>,
    pub session: Rc<StaticSession>,
}

pub fn config() -> Configuration {
    Configuration::new("app-1", INTAKE)
}

pub fn start() -> Harness {
    start_with(config(), StaticSession::tracked())
}

pub fn start_with(config: Configuration, session: StaticSession) -> Harness {
    let sender = Rc::new(RecordingSender::new());
    let session = Rc::new(session);
    let pipeline = RumPipeline::start(
        config,
        PipelineHost {
            session: Rc::clone(&session) as Rc<dyn SessionManager>,
            environment: Rc::new(StaticEnvironment::new()),
            sender: Rc::clone(&sender) as Rc<dyn rum_pipeline::RequestSender>,
        },
        PageStart {
            time_origin: TimeStamp(TIME_ORIGIN),
            location: ViewLocation::parse(PAGE_URL).unwrap(),
            referrer: String::new(),
        },
    )
    .unwrap();

    Harness {
        pipeline,
        sender,
        session,
    }
}

/// Every message sent so far, in order, parsed
pub fn messages(sender: &RecordingSender) -> Vec<Value> {
    sender
        .sent()
        .iter()
        .flat_map(|sent| {
            sent.messages()
                .into_iter()
                .map(|line| serde_json::from_str::<Value>(line).unwrap())
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn of_type(messages: &[Value], event_type: &str) -> Vec<Value> {
    messages
        .iter()
        .filter(|message| message["type"] == event_type)
        .cloned()
        .collect()
}
