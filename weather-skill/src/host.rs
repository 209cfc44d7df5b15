//! The contract between a skill and the assistant host that runs it.
//!
//! A host stores credentials, registers skills under public command names and
//! hands every invocation a JSON argument object. Skills answer with a
//! [`Response`] envelope.

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::error::SkillError;

/// Result envelope returned by every skill command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub data: Value,
}

impl Response {
    pub fn success(data: Value) -> Self {
        Self { success: true, data }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: Value::String(message.into()) }
    }

    /// Failure message, if this is a failure envelope.
    pub fn error_message(&self) -> Option<&str> {
        if self.success { None } else { self.data.as_str() }
    }
}

impl From<SkillError> for Response {
    fn from(err: SkillError) -> Self {
        Response::failure(err.to_string())
    }
}

/// Read-only key/value lookup owned by the host.
pub trait CredentialStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;
}

impl CredentialStore for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Description of one parameter of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: &'static str,
    pub optional: bool,
    pub description: &'static str,
}

/// A public command a skill exposes to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

#[async_trait]
pub trait Skill: Send + Sync + Debug {
    fn name(&self) -> &str;

    /// Commands this skill wants registered.
    fn commands(&self) -> &'static [CommandSpec];

    /// Run `command` with host-supplied `args`.
    async fn invoke(&self, command: &str, args: &Value) -> Response;
}

/// Dispatch table from public command name to the skill that serves it.
#[derive(Debug, Default)]
pub struct SkillRegistry {
    skills: Vec<Arc<dyn Skill>>,
    commands: HashMap<&'static str, (usize, CommandSpec)>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every command of `skill`. Fails without registering anything
    /// if one of its command names is already taken.
    pub fn register(&mut self, skill: Arc<dyn Skill>) -> anyhow::Result<()> {
        let specs = skill.commands();

        if let Some(taken) = specs.iter().find(|spec| self.commands.contains_key(spec.name)) {
            return Err(anyhow::anyhow!(
                "Command '{}' of skill '{}' is already registered",
                taken.name,
                skill.name()
            ));
        }

        let idx = self.skills.len();
        for spec in specs {
            self.commands.insert(spec.name, (idx, *spec));
        }
        info!(skill = skill.name(), commands = specs.len(), "registered skill");
        self.skills.push(skill);

        Ok(())
    }

    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.get(name).map(|(_, spec)| spec)
    }

    /// All registered commands, sorted by name.
    pub fn commands(&self) -> Vec<&CommandSpec> {
        let mut specs: Vec<_> = self.commands.values().map(|(_, spec)| spec).collect();
        specs.sort_by_key(|spec| spec.name);
        specs
    }

    pub async fn dispatch(&self, command: &str, args: &Value) -> Response {
        match self.commands.get(command) {
            Some((idx, _)) => {
                info!(command, "dispatching command");
                self.skills[*idx].invoke(command, args).await
            }
            None => SkillError::UnknownCommand(command.to_string()).into(),
        }
    }
}
