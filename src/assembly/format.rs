/*!
 * Wire Formats
 * Serializes assembled events into the payload shape expected by the intake
 *
 * Both shapes come from the same assembled model. `V2` nests the customer
 * context and carries internal fields under `_dd`; `V1` is the legacy shape
 * with an `evt.category` discriminant and context keys at the top level.
 */

use super::assembler::AssembledEvent;
use crate::collection::{RawRumEvent, RumEventType};
use crate::core::limits::FORMAT_VERSION;
use crate::core::types::Context;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    V1,
    #[default]
    V2,
}

impl WireFormat {
    pub fn from_flag(v2_format: bool) -> Self {
        if v2_format {
            Self::V2
        } else {
            Self::V1
        }
    }
}

/// Build the wire payload of an assembled event
pub fn to_wire(event: &AssembledEvent, format: WireFormat) -> serde_json::Result<Value> {
    match format {
        WireFormat::V2 => to_v2(event),
        WireFormat::V1 => to_v1(event),
    }
}

fn to_v2(event: &AssembledEvent) -> serde_json::Result<Value> {
    let mut wire = Map::new();
    wire.insert("application".to_string(), json!({ "id": event.rum.application_id }));
    if let Some(service) = &event.rum.service {
        wire.insert("service".to_string(), json!(service));
    }
    wire.insert(
        "session".to_string(),
        json!({ "id": event.session_id, "type": event.rum.session_type }),
    );
    combine(&mut wire, &as_object(serde_json::to_value(&event.view)?));
    if let Some(action) = &event.action {
        combine(&mut wire, &as_object(serde_json::to_value(action)?));
    }
    combine(&mut wire, &raw_payload(&event.raw)?);

    wire.insert("type".to_string(), json!(event.event_type().as_str()));

    let mut internal = Map::new();
    internal.insert("format_version".to_string(), json!(FORMAT_VERSION));
    if let Some(version) = event.document_version() {
        internal.insert("document_version".to_string(), json!(version));
    }
    wire.insert("_dd".to_string(), Value::Object(internal));

    if let Some(context) = &event.context {
        wire.insert("context".to_string(), Value::Object(context.clone()));
    }
    Ok(Value::Object(wire))
}

fn to_v1(event: &AssembledEvent) -> serde_json::Result<Value> {
    let mut wire = Map::new();
    wire.insert("application_id".to_string(), json!(event.rum.application_id));
    if let Some(service) = &event.rum.service {
        wire.insert("service".to_string(), json!(service));
    }
    wire.insert("session_id".to_string(), json!(event.session_id));
    wire.insert("session".to_string(), json!({ "type": event.rum.session_type }));
    combine(&mut wire, &as_object(serde_json::to_value(&event.view)?));
    if let Some(action) = &event.action {
        combine(&mut wire, &as_object(serde_json::to_value(action)?));
    }
    combine(&mut wire, &raw_payload(&event.raw)?);

    wire.insert("evt".to_string(), json!({ "category": v1_category(event.event_type()) }));
    if let Some(version) = event.document_version() {
        wire.insert("rum".to_string(), json!({ "document_version": version }));
    }

    if let Some(context) = &event.context {
        combine(&mut wire, context);
    }
    Ok(Value::Object(wire))
}

fn v1_category(event_type: RumEventType) -> &'static str {
    match event_type {
        RumEventType::Action => "user_action",
        other => other.as_str(),
    }
}

fn raw_payload(raw: &RawRumEvent) -> serde_json::Result<Map<String, Value>> {
    let value = match raw {
        RawRumEvent::View(event) => serde_json::to_value(event)?,
        RawRumEvent::Action(event) => serde_json::to_value(event)?,
        RawRumEvent::Resource(event) => serde_json::to_value(event)?,
        RawRumEvent::Error(event) => serde_json::to_value(event)?,
        RawRumEvent::LongTask(event) => serde_json::to_value(event)?,
    };
    Ok(as_object(value))
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Deep-merge `overlay` into `base`
///
/// Nested objects merge key by key; any other value in `overlay` replaces the
/// one in `base`.
pub fn combine(base: &mut Context, overlay: &Context) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => combine(existing, incoming),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
