use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{PageFailure, Stage};

pub const PAGE_TYPE: &str = "page";
pub const CHAPTER_TYPE: &str = "chapter";
pub const SINGLE_PANEL_LAYOUT: &str = "1-panel";

/// A node of the host's guide tree. Nested children stay in the raw tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideNode {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl GuideNode {
    pub fn is_page(&self) -> bool {
        self.kind == PAGE_TYPE
    }
}

/// Directive telling the host which file or panel to open with a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub panel: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl PageAction {
    pub fn open_file(file_name: impl Into<String>) -> Self {
        PageAction {
            kind: "file".to_string(),
            panel: 0,
            file_name: Some(file_name.into()),
        }
    }
}

/// Page settings as stored by the host. Unknown fields are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_all_tabs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_file_tree: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_terminal_session: Option<bool>,
    #[serde(default)]
    pub actions: Vec<PageAction>,
}

impl PageSettings {
    pub fn is_single_panel(&self) -> bool {
        self.layout.as_deref().unwrap_or(SINGLE_PANEL_LAYOUT) == SINGLE_PANEL_LAYOUT
    }

    /// File opened in the first action, if any.
    pub fn primary_file(&self) -> Option<&str> {
        self.actions
            .first()
            .and_then(|action| action.file_name.as_deref())
    }

    pub fn validate(&self) -> Result<(), String> {
        for (idx, action) in self.actions.iter().enumerate() {
            if action.kind == "file"
                && action.file_name.as_deref().is_none_or(|name| name.trim().is_empty())
            {
                return Err(format!("action {idx} opens a file without a file name"));
            }
        }
        Ok(())
    }
}

/// Full page detail returned by the structure service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDetail {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub settings: PageSettings,
}

impl PageDetail {
    pub fn body(&self) -> String {
        self.content
            .clone()
            .or_else(|| self.settings.content.clone())
            .unwrap_or_default()
    }
}

/// Working record for one page, consumed once by the translator.
#[derive(Debug, Clone)]
pub struct GuidePageRecord {
    pub index: usize,
    pub title: String,
    pub id: String,
    pub content: String,
    pub settings: PageSettings,
}

/// Node spec sent to the host when adding a chapter or page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItemSpec {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_all_tabs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_file_tree: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_terminal_session: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<PageAction>,
}

impl NewItemSpec {
    pub fn chapter(title: impl Into<String>) -> Self {
        NewItemSpec {
            title: title.into(),
            kind: CHAPTER_TYPE.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedItem {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
}

impl AskRequest {
    pub fn single(system_prompt: &str, user_prompt: String) -> Self {
        AskRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: user_prompt,
            }],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskOptions {
    pub stream: bool,
    pub prevent_menu: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        AskOptions {
            stream: false,
            prevent_menu: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub result: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    Translated {
        new_page_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code_file: Option<String>,
    },
    Failed {
        stage: Stage,
        error: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PageOutcome {
    pub index: usize,
    pub title: String,
    pub source_id: String,
    #[serde(flatten)]
    pub status: PageStatus,
}

impl PageOutcome {
    pub fn failed(index: usize, title: &str, source_id: &str, failure: PageFailure) -> Self {
        PageOutcome {
            index,
            title: title.to_string(),
            source_id: source_id.to_string(),
            status: PageStatus::Failed {
                stage: failure.stage,
                error: failure.message,
            },
        }
    }

    pub fn is_translated(&self) -> bool {
        matches!(self.status, PageStatus::Translated { .. })
    }
}

/// Result of one button press.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub chapter_id: Option<String>,
    pub page_count: usize,
    pub pages: Vec<PageOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
}

impl RunReport {
    pub fn new() -> Self {
        RunReport {
            run_id: Uuid::new_v4(),
            chapter_id: None,
            page_count: 0,
            pages: Vec::new(),
            fatal: None,
        }
    }

    pub fn translated_count(&self) -> usize {
        self.pages.iter().filter(|page| page.is_translated()).count()
    }

    /// User-facing summary posted to the chat surface at the end of a run.
    pub fn summary(&self) -> String {
        if let Some(fatal) = &self.fatal {
            return format!("Translation stopped: {fatal}");
        }

        let mut summary = format!(
            "Translation finished: {} of {} pages translated.",
            self.translated_count(),
            self.page_count
        );
        for page in &self.pages {
            if let PageStatus::Failed { stage, error } = &page.status {
                summary.push_str(&format!(
                    "\n- {} (page {}) failed during {}: {}",
                    page.title, page.index, stage, error
                ));
            }
        }
        summary
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_read_camel_case_and_ignore_unknown_fields() {
        let settings: PageSettings = serde_json::from_value(serde_json::json!({
            "layout": "2-panels",
            "closeAllTabs": true,
            "showFileTree": false,
            "learningObjectives": "ignored",
            "actions": [{"type": "file", "panel": 0, "fileName": "src/Main.java"}]
        }))
        .unwrap();

        assert!(!settings.is_single_panel());
        assert_eq!(settings.close_all_tabs, Some(true));
        assert_eq!(settings.primary_file(), Some("src/Main.java"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn guide_node_accepts_null_title_and_children() {
        let node: GuideNode = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "type": "page",
            "title": null,
            "children": null
        }))
        .unwrap();
        assert_eq!(node.title, "");
        assert!(node.is_page());
    }

    #[test]
    fn missing_layout_counts_as_single_panel() {
        assert!(PageSettings::default().is_single_panel());
    }

    #[test]
    fn file_action_without_name_fails_validation() {
        let settings = PageSettings {
            actions: vec![PageAction {
                kind: "file".into(),
                panel: 0,
                file_name: None,
            }],
            ..Default::default()
        };
        assert!(settings.validate().unwrap_err().contains("action 0"));
    }

    #[test]
    fn page_body_falls_back_to_settings_content() {
        let detail = PageDetail {
            content: None,
            settings: PageSettings {
                content: Some("# Lesson".into()),
                ..Default::default()
            },
        };
        assert_eq!(detail.body(), "# Lesson");
    }

    #[test]
    fn chapter_spec_omits_page_fields() {
        let json = serde_json::to_value(NewItemSpec::chapter("JavaScript")).unwrap();
        assert_eq!(json, serde_json::json!({"title": "JavaScript", "type": "chapter"}));
    }

    #[test]
    fn summary_lists_failed_pages() {
        let mut report = RunReport::new();
        report.page_count = 2;
        report.pages.push(PageOutcome {
            index: 0,
            title: "Intro".into(),
            source_id: "p1".into(),
            status: PageStatus::Translated {
                new_page_id: "n1".into(),
                code_file: None,
            },
        });
        report.pages.push(PageOutcome::failed(
            1,
            "Loops",
            "p2",
            PageFailure::new(Stage::Write, "host rejected the page"),
        ));

        let summary = report.summary();
        assert!(summary.starts_with("Translation finished: 1 of 2 pages translated."));
        assert!(summary.contains("Loops (page 1) failed during write: host rejected the page"));
    }
}
