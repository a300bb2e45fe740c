//! Player-facing message templates.
//!
//! Templates use positional placeholders (`{0}`, `{1}`, ...). A lang file may
//! override any subset of keys; keys it lacks are filled from the English
//! defaults and written back so operators can see what is translatable.

use claimrewards_execution::persistence::{self, PersistError, PersistencePolicy};
use claimrewards_types::{ClaimOutcome, MessageKey};
use std::{collections::BTreeMap, path::Path};
use tracing::warn;

const LABEL: &str = "lang";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Messages {
    templates: BTreeMap<MessageKey, String>,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            templates: MessageKey::ALL
                .into_iter()
                .map(|key| (key, key.default_template().to_string()))
                .collect(),
        }
    }
}

impl Messages {
    pub fn load(path: &Path, policy: PersistencePolicy) -> Result<Self, PersistError> {
        let (overrides, status) =
            persistence::load_json::<BTreeMap<String, String>>(path, policy, LABEL)?;
        let mut messages = Self::default();
        let mut complete = true;
        if let Some(overrides) = overrides {
            for key in MessageKey::ALL {
                if !overrides.contains_key(key.as_str()) {
                    complete = false;
                }
            }
            for (name, template) in overrides {
                match MessageKey::parse(&name) {
                    Some(key) => {
                        messages.templates.insert(key, template);
                    }
                    None => warn!(key = %name, "ignoring unknown message key"),
                }
            }
        }

        if status.needs_write() || !complete {
            let on_disk: BTreeMap<&str, &str> = messages
                .templates
                .iter()
                .map(|(key, template)| (key.as_str(), template.as_str()))
                .collect();
            if let Err(err) = persistence::write_json(path, &on_disk) {
                policy.on_save_error(LABEL, err)?;
            }
        }
        Ok(messages)
    }

    pub fn template(&self, key: MessageKey) -> &str {
        self.templates
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.default_template())
    }

    pub fn render(&self, key: MessageKey, args: &[String]) -> String {
        format_template(self.template(key), args)
    }

    pub fn outcome(&self, outcome: &ClaimOutcome) -> String {
        self.render(outcome.message_key(), &outcome.message_args())
    }
}

/// Substitutes `{n}` with `args[n]`. `{{` and `}}` produce literal braces.
/// Placeholders without a matching argument, and stray braces, are copied
/// verbatim.
pub fn format_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if let Some(after) = tail.strip_prefix("{{").or_else(|| tail.strip_prefix("}}")) {
            out.push_str(&tail[..1]);
            rest = after;
            continue;
        }
        if let Some((arg, after)) = tail
            .strip_prefix('{')
            .and_then(|inner| placeholder(inner, args))
        {
            out.push_str(arg);
            rest = after;
            continue;
        }
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

/// Parses `n}` at the start of `inner` and returns `args[n]` with the text
/// following the closing brace.
fn placeholder<'t, 'a>(inner: &'t str, args: &'a [String]) -> Option<(&'a str, &'t str)> {
    let close = inner.find('}')?;
    let index = inner[..close].parse::<usize>().ok()?;
    let arg = args.get(index)?;
    Some((arg.as_str(), &inner[close + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimrewards_execution::mocks::write_raw;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn formats_positional_arguments() {
        assert_eq!(
            format_template("You have claimed {0} {1}.", &args(&["50", "blood"])),
            "You have claimed 50 blood."
        );
        assert_eq!(format_template("{1}-{0}-{1}", &args(&["a", "b"])), "b-a-b");
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        assert_eq!(format_template("{2} {x} {", &args(&["a"])), "{2} {x} {");
        assert_eq!(format_template("a } b", &args(&["a"])), "a } b");
    }

    #[test]
    fn doubled_braces_are_literal() {
        assert_eq!(format_template("{{0}}", &args(&["a"])), "{0}");
        assert_eq!(format_template("{{{0}}}", &args(&["a"])), "{a}");
        assert_eq!(
            format_template("{{reward}}: {0} {1}", &args(&["50", "blood"])),
            "{reward}: 50 blood"
        );
    }

    #[test]
    fn arguments_are_not_reinterpreted() {
        assert_eq!(format_template("{0} {1}", &args(&["{1}", "b"])), "{1} b");
    }

    #[test]
    fn renders_outcomes_with_defaults() {
        let messages = Messages::default();
        let claimed = ClaimOutcome::Claimed {
            amount: 50,
            item: "blood".to_string(),
        };
        assert_eq!(messages.outcome(&claimed), "You have claimed 50 blood.");
        assert_eq!(
            messages.outcome(&ClaimOutcome::NothingToClaim),
            "Nothing to claim."
        );
        assert_eq!(
            messages.outcome(&ClaimOutcome::NoPermission),
            "You do not have permission to use this command."
        );
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("lang")
            .join("en")
            .join("ClaimPlayerRewards.json");

        let messages = Messages::load(&path, PersistencePolicy::FailOpen).unwrap();

        assert_eq!(messages, Messages::default());
        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["NothingToClaim"], "Nothing to claim.");
        assert_eq!(on_disk.len(), MessageKey::ALL.len());
    }

    #[test]
    fn partial_override_is_completed_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ClaimPlayerRewards.json");
        write_raw(&path, r#"{"NothingToClaim": "Rien à réclamer.", "Bogus": "x"}"#);

        let messages = Messages::load(&path, PersistencePolicy::FailClosed).unwrap();

        assert_eq!(
            messages.template(MessageKey::NothingToClaim),
            "Rien à réclamer."
        );
        assert_eq!(
            messages.template(MessageKey::ClaimSuccess),
            "You have claimed {0} {1}."
        );
        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["NothingToClaim"], "Rien à réclamer.");
        assert!(on_disk.contains_key("ClaimSuccess"));
        assert!(!on_disk.contains_key("Bogus"));
    }
}
