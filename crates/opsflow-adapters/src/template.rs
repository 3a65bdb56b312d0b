//! File-backed template rendering with built-in fallbacks.
//!
//! Templates live as plain text files under the configured directory,
//! keyed by relative path (`email/quote_ready` maps to
//! `<dir>/email/quote_ready.txt`). `{{name}}` placeholders are replaced
//! with values from the variables object. A missing file falls back to a
//! built-in default body, so rendering never fails a flow.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use opsflow_core::traits::TemplateRenderer;

pub struct TemplateEngine {
    dir: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl TemplateEngine {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, cache: Mutex::new(HashMap::new()) }
    }

    fn load(&self, key: &str) -> String {
        if let Ok(cache) = self.cache.lock() {
            if let Some(t) = cache.get(key) {
                return t.clone();
            }
        }
        let path = self.dir.join(format!("{key}.txt"));
        let template = match std::fs::read_to_string(&path) {
            Ok(t) => t,
            Err(_) => builtin(key).to_string(),
        };
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key.to_string(), template.clone());
        }
        template
    }
}

impl TemplateRenderer for TemplateEngine {
    fn render(&self, template_key: &str, variables: &serde_json::Value) -> String {
        substitute(&self.load(template_key), variables)
    }
}

/// Replace `{{name}}` placeholders. Unknown names are left in place so a
/// misrendered body is visible in review rather than silently blank.
pub fn substitute(template: &str, variables: &serde_json::Value) -> String {
    let mut out = template.to_string();
    if let Some(map) = variables.as_object() {
        for (name, value) in map {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            out = out.replace(&format!("{{{{{name}}}}}"), &rendered);
        }
    }
    out
}

fn builtin(key: &str) -> &'static str {
    match key {
        "email/initial_contact" => {
            "Dear {{contactName}},\n\nThank you for taking the time to speak with us. \
             We have prepared a proposal for {{companyName}} and would welcome the \
             chance to walk you through it.\n\nBest regards,\nThe Sales Team"
        }
        "email/follow_up_no_answer" => {
            "Dear {{contactName}},\n\nWe tried to reach you by phone but could not \
             connect. Please let us know a convenient time to talk about \
             {{companyName}}'s needs.\n\nBest regards,\nThe Sales Team"
        }
        "email/quote_ready" => {
            "Dear {{contactName}},\n\nYour quote for {{companyName}} is ready. \
             The document is attached and also available here: {{downloadUrl}}\n\n\
             Best regards,\nThe Sales Team"
        }
        "sms/follow_up" => {
            "Hi, this is the {{companyName}} account team. We just tried to call you. \
             Please check your email for a follow-up."
        }
        "email/session_draft" => {
            "Dear participants,\n\nSession {{sessionNumber}} of the {{programName}} \
             program for {{companyName}} is scheduled for {{sessionDate}} from \
             {{startTime}} to {{endTime}}.\n\nBest regards,\nThe Training Team"
        }
        "email/reminder_t3" => {
            "Dear participants,\n\nA reminder that session {{sessionNumber}} \
             ({{sessionTitle}}) takes place on {{sessionDate}} at {{startTime}}. \
             Join here: {{meetingUrl}}\n\nBest regards,\nThe Training Team"
        }
        "email/reminder_t1" => {
            "Dear participants,\n\nSession {{sessionNumber}} ({{sessionTitle}}) is \
             tomorrow, {{sessionDate}}, starting at {{startTime}}. \
             Join here: {{meetingUrl}}\n\nBest regards,\nThe Training Team"
        }
        "chat/program_start" => {
            "The {{programName}} program for {{companyName}} has kicked off: \
             {{sessionCount}} sessions starting {{startDate}}."
        }
        "chat/reminder_t3" => {
            "Reminder: session {{sessionNumber}} ({{sessionTitle}}) on \
             {{sessionDate}} at {{startTime}}."
        }
        "chat/reminder_t1" => {
            "Tomorrow: session {{sessionNumber}} ({{sessionTitle}}) on \
             {{sessionDate}} at {{startTime}}."
        }
        "chat/session_completed" => {
            "Session {{sessionNumber}} ({{sessionTitle}}) is complete. \
             Recording: {{recordingUrl}}"
        }
        _ => "{{body}}",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_replaces_known_variables() {
        let out = substitute(
            "Hello {{name}}, your total is {{amount}}.",
            &serde_json::json!({"name": "Ana", "amount": 42}),
        );
        assert_eq!(out, "Hello Ana, your total is 42.");
    }

    #[test]
    fn test_substitute_leaves_unknown_placeholders() {
        let out = substitute("Hello {{name}}!", &serde_json::json!({}));
        assert_eq!(out, "Hello {{name}}!");
    }

    #[test]
    fn test_builtin_fallback_when_file_missing() {
        let engine = TemplateEngine::new(PathBuf::from("/nonexistent"));
        let out = engine.render(
            "email/quote_ready",
            &serde_json::json!({
                "contactName": "Ana",
                "companyName": "Acme",
                "downloadUrl": "file:///mock/q.pdf",
            }),
        );
        assert!(out.contains("Ana"));
        assert!(out.contains("file:///mock/q.pdf"));
    }

    #[test]
    fn test_file_template_overrides_builtin() {
        let dir = std::env::temp_dir().join(format!("opsflow-tpl-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("email")).unwrap();
        std::fs::write(dir.join("email/quote_ready.txt"), "Custom: {{downloadUrl}}").unwrap();

        let engine = TemplateEngine::new(dir.clone());
        let out = engine.render("email/quote_ready", &serde_json::json!({"downloadUrl": "u"}));
        assert_eq!(out, "Custom: u");

        std::fs::remove_dir_all(dir).ok();
    }
}
