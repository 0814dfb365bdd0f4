//! In-memory host used by unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::HostError;
use crate::models::{AskOptions, AskRequest, AskResponse, CreatedItem, NewItemSpec, PageDetail};
use crate::services::host::{Assistant, ChatSurface, FileStore, GuideStructure, Host};
use crate::utils::extract_tagged;

type Responder = Box<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Debug, Clone)]
pub struct AddedItem {
    pub item: NewItemSpec,
    pub parent_id: Option<String>,
    pub index: Option<usize>,
}

pub struct FakeHost {
    structure: Option<Value>,
    pages: HashMap<String, Value>,
    pub files: Mutex<HashMap<String, String>>,
    pub added: Mutex<Vec<AddedItem>>,
    pub messages: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub menu_shown: Mutex<usize>,
    fail_chapter: bool,
    fail_page_titles: Vec<String>,
    responder: Responder,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            structure: Some(Value::Null),
            pages: HashMap::new(),
            files: Mutex::new(HashMap::new()),
            added: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            menu_shown: Mutex::new(0),
            fail_chapter: false,
            fail_page_titles: Vec::new(),
            responder: Box::new(default_response),
        }
    }

    pub fn with_structure(mut self, structure: Value) -> Self {
        self.structure = Some(structure);
        self
    }

    pub fn without_structure(mut self) -> Self {
        self.structure = None;
        self
    }

    pub fn with_page(mut self, id: &str, detail: Value) -> Self {
        self.pages.insert(id.to_string(), detail);
        self
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn failing_chapter(mut self) -> Self {
        self.fail_chapter = true;
        self
    }

    pub fn failing_page(mut self, title: &str) -> Self {
        self.fail_page_titles.push(title.to_string());
        self
    }

    pub fn with_responder(
        mut self,
        responder: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }

    pub fn host(&self) -> Host<'_> {
        Host {
            structure: self,
            files: self,
            chat: self,
            assistant: self,
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn added_items(&self) -> Vec<AddedItem> {
        self.added.lock().unwrap().clone()
    }
}

/// Answers each template with a recognisable translation of its input.
pub fn default_response(prompt: &str) -> String {
    if prompt.contains("<original_content>") {
        let original = extract_tagged(prompt, "original_content");
        format!("<translated_content>JS {}</translated_content>", original.trim())
    } else if prompt.contains("<code_file>") {
        let original = extract_tagged(prompt, "code_file");
        format!(
            "<scratchpad>plan</scratchpad>\n<translated_code>// js\n{}</translated_code>",
            original.trim()
        )
    } else if prompt.contains("<file_path>") {
        let path = extract_tagged(prompt, "file_path");
        let path = path.trim();
        let (dir, name) = match path.rsplit_once('/') {
            Some((dir, name)) => (format!("{dir}/"), name),
            None => (String::new(), path),
        };
        format!(
            "<new_filename>{dir}{}</new_filename>",
            name.replace(".java", ".js").to_lowercase()
        )
    } else {
        String::new()
    }
}

#[async_trait]
impl GuideStructure for FakeHost {
    async fn get_structure(&self) -> Result<Value, HostError> {
        self.structure.clone().ok_or_else(|| HostError::Status {
            status: 503,
            message: "structure unavailable".into(),
        })
    }

    async fn get(&self, page_id: &str) -> Result<PageDetail, HostError> {
        let detail = self.pages.get(page_id).ok_or_else(|| HostError::Status {
            status: 404,
            message: format!("no page {page_id}"),
        })?;
        serde_json::from_value(detail.clone())
            .map_err(|e| HostError::InvalidResponse(e.to_string()))
    }

    async fn add(
        &self,
        item: &NewItemSpec,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<CreatedItem, HostError> {
        let rejected = if item.kind == "chapter" {
            self.fail_chapter
        } else {
            self.fail_page_titles.contains(&item.title)
        };
        if rejected {
            return Err(HostError::Status {
                status: 500,
                message: format!("cannot add {}", item.title),
            });
        }

        let mut added = self.added.lock().unwrap();
        added.push(AddedItem {
            item: item.clone(),
            parent_id: parent_id.map(str::to_string),
            index,
        });
        Ok(CreatedItem {
            id: format!("new-{}", added.len()),
            title: item.title.clone(),
            kind: item.kind.clone(),
        })
    }
}

#[async_trait]
impl FileStore for FakeHost {
    async fn get_content(&self, path: &str) -> Result<String, HostError> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| HostError::Status {
                status: 404,
                message: format!("no file {path}"),
            })
    }

    async fn save(&self, path: &str, content: &str) -> Result<(), HostError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }
}

#[async_trait]
impl ChatSurface for FakeHost {
    async fn write(&self, message: &str) -> Result<(), HostError> {
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn show_menu(&self) -> Result<(), HostError> {
        *self.menu_shown.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl Assistant for FakeHost {
    async fn ask(&self, request: &AskRequest, _options: AskOptions) -> anyhow::Result<AskResponse> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());
        Ok(AskResponse {
            result: (self.responder)(&prompt),
        })
    }
}
