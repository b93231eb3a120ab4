//! Human and JSON renderings of command results

use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn formatter(self) -> Box<dyn OutputFormatter> {
        match self {
            OutputFormat::Human => Box::new(HumanFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
        }
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    /// A completed operation; `details` is only shown in JSON mode
    fn success(&self, message: &str, details: Value);
    /// An operation whose failure was logged and skipped (`--best-effort`)
    fn skipped(&self, message: &str);
    /// A line of free-form listing output
    fn info(&self, message: &str);
    fn print_json(&self, value: &Value);
}

/// Human-readable output with check marks
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str, _details: Value) {
        println!("\u{2713} {message}");
    }
    fn skipped(&self, message: &str) {
        eprintln!("\u{26a0} Skipped: {message}");
    }
    fn info(&self, message: &str) {
        println!("  {message}");
    }
    fn print_json(&self, _value: &Value) {}
}

/// One JSON document per result on stdout
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str, details: Value) {
        let mut out = json!({"success": true, "message": message});
        if let (Some(out), Value::Object(details)) = (out.as_object_mut(), details) {
            out.extend(details);
        }
        println!("{out}");
    }
    fn skipped(&self, message: &str) {
        println!("{}", json!({"success": false, "skipped": true, "message": message}));
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &Value) {
        println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
    }
}
