use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Commands permitted out of the box. Members are literal command strings,
/// not patterns: `systemctl restart toy-web` does not admit `systemctl restart db`.
pub fn default_allowed_commands() -> Vec<String> {
    vec![
        "tail -n 200 logs/toy-web.log".into(),
        "tail -n 100 logs/toy-web.log".into(),
        "curl -s http://localhost:8080/health".into(),
        "systemctl restart toy-web".into(),
        "systemctl status toy-web".into(),
    ]
}

/// Fixed set of exact command strings the executor may run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandAllowlist {
    commands: BTreeSet<String>,
}

impl CommandAllowlist {
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }

    /// Byte-exact membership. No trimming, no case folding.
    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains(command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }
}

impl Extend<String> for CommandAllowlist {
    fn extend<T: IntoIterator<Item = String>>(&mut self, iter: T) {
        self.commands.extend(iter);
    }
}
