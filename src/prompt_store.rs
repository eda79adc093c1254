//! Named instruction templates and the current selection.
//!
//! Invariants held by every public operation:
//! - at least one prompt exists
//! - ids are unique
//! - the selected id always names an existing prompt
//!
//! Insertion order is display order. Persisted as part of `Settings`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub name: String,
    pub text: String,
}

impl Prompt {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("No prompt with id {0}")]
    NotFound(Uuid),
    #[error("You must have at least one prompt available")]
    LastPrompt,
    #[error("Prompt name must not be empty")]
    EmptyName,
}

pub const DEFAULT_PROMPT_TEXT: &str =
    "Improve this text to make it clear, concise, and professional.";

/// Serialized as `{ "prompts": [...], "selected_prompt_id": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PromptStoreRecord", into = "PromptStoreRecord")]
pub struct PromptStore {
    prompts: Vec<Prompt>,
    selected: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PromptStoreRecord {
    #[serde(default)]
    prompts: Vec<Prompt>,
    #[serde(default)]
    selected_prompt_id: Option<Uuid>,
}

impl From<PromptStoreRecord> for PromptStore {
    fn from(record: PromptStoreRecord) -> Self {
        PromptStore::from_parts(record.prompts, record.selected_prompt_id)
    }
}

impl From<PromptStore> for PromptStoreRecord {
    fn from(store: PromptStore) -> Self {
        PromptStoreRecord {
            prompts: store.prompts,
            selected_prompt_id: Some(store.selected),
        }
    }
}

impl Default for PromptStore {
    fn default() -> Self {
        let prompts = vec![
            Prompt::new("Default", DEFAULT_PROMPT_TEXT),
            Prompt::new(
                "Fix Grammar",
                "Fix any grammar and spelling errors in this text. Maintain the original tone and style.",
            ),
            Prompt::new(
                "Make Professional",
                "Make this text more professional and formal.",
            ),
        ];
        let selected = prompts[0].id;
        Self { prompts, selected }
    }
}

impl PromptStore {
    /// Rebuild a store from possibly inconsistent persisted parts.
    ///
    /// Duplicate ids keep their first occurrence, an empty list is replaced
    /// by the defaults, and a dangling selection falls back to the first entry.
    pub fn from_parts(prompts: Vec<Prompt>, selected: Option<Uuid>) -> Self {
        let mut unique: Vec<Prompt> = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            if unique.iter().any(|p| p.id == prompt.id) {
                log::warn!("[PROMPTS] Dropping duplicate prompt id {}", prompt.id);
                continue;
            }
            unique.push(prompt);
        }

        if unique.is_empty() {
            log::info!("[PROMPTS] No prompts stored, seeding defaults");
            return PromptStore::default();
        }

        let selected = match selected {
            Some(id) if unique.iter().any(|p| p.id == id) => id,
            _ => unique[0].id,
        };
        Self {
            prompts: unique,
            selected,
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prompt> {
        self.prompts.iter()
    }

    pub fn get(&self, id: Uuid) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn selected_id(&self) -> Uuid {
        self.selected
    }

    pub fn selected(&self) -> &Prompt {
        // from_parts and every mutation keep `selected` valid
        self.get(self.selected).unwrap_or(&self.prompts[0])
    }

    pub fn select(&mut self, id: Uuid) -> Result<(), PromptError> {
        if self.get(id).is_none() {
            return Err(PromptError::NotFound(id));
        }
        self.selected = id;
        Ok(())
    }

    /// Add a prompt at the end and select it.
    pub fn create(&mut self, name: &str, text: &str) -> Result<Uuid, PromptError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PromptError::EmptyName);
        }
        let prompt = Prompt::new(name, text);
        let id = prompt.id;
        self.prompts.push(prompt);
        self.selected = id;
        Ok(id)
    }

    /// Change name and text. The id never changes.
    pub fn edit(&mut self, id: Uuid, name: &str, text: &str) -> Result<(), PromptError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PromptError::EmptyName);
        }
        let prompt = self
            .prompts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PromptError::NotFound(id))?;
        prompt.name = name.to_string();
        prompt.text = text.to_string();
        Ok(())
    }

    /// Remove a prompt. Refuses the last one; reassigns selection if needed.
    pub fn delete(&mut self, id: Uuid) -> Result<Prompt, PromptError> {
        let index = self
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or(PromptError::NotFound(id))?;
        if self.prompts.len() <= 1 {
            return Err(PromptError::LastPrompt);
        }
        let removed = self.prompts.remove(index);
        if self.selected == id {
            self.selected = self.prompts[0].id;
        }
        Ok(removed)
    }
}
