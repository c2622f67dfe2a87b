//! Structured JSON-lines logging.
//!
//! Every event is a single JSON object on stdout with a monotonic sequence
//! number, an RFC 3339 timestamp, a module tag, and free-form fields, so
//! runs can be filtered and replayed with standard line tools.

use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => Level::Debug,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

pub fn ts_now() -> String {
    Utc::now().to_rfc3339()
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

pub fn v_bool(b: bool) -> Value {
    Value::Bool(b)
}

pub fn obj(fields: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.to_string(), value.clone());
    }
    map
}

pub fn json_log_at(level: Level, module: &str, fields: Map<String, Value>) {
    if level < Level::from_env() {
        return;
    }
    let mut event = Map::new();
    event.insert("seq".to_string(), Value::from(next_seq()));
    event.insert("ts".to_string(), v_str(&ts_now()));
    event.insert("level".to_string(), v_str(level.as_str()));
    event.insert("module".to_string(), v_str(module));
    for (key, value) in fields {
        event.insert(key, value);
    }
    println!("{}", Value::Object(event));
}

pub fn json_log(module: &str, fields: Map<String, Value>) {
    json_log_at(Level::Info, module, fields);
}
