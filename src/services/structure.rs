use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{PageFailure, Stage};
use crate::models::{GuideNode, GuidePageRecord, PAGE_TYPE};
use crate::services::host::GuideStructure;

/// Collects every `page` node of a guide tree, depth-first, in field order.
///
/// Every object and array value is descended into, including the fields of a
/// page itself. Anything that is not an object or array yields nothing.
pub fn flatten_pages(tree: &Value) -> Vec<GuideNode> {
    let mut pages = Vec::new();
    collect_pages(tree, &mut pages);
    pages
}

fn collect_pages(value: &Value, pages: &mut Vec<GuideNode>) {
    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some(PAGE_TYPE) {
                match serde_json::from_value::<GuideNode>(value.clone()) {
                    Ok(node) => pages.push(node),
                    Err(e) => warn!("Skipping malformed page node: {}", e),
                }
            }
            for child in map.values() {
                collect_pages(child, pages);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_pages(item, pages);
            }
        }
        _ => {}
    }
}

/// Fetches the detail of every page, keeping one entry per page in order.
pub async fn load_pages(
    structure: &dyn GuideStructure,
    pages: &[GuideNode],
) -> Vec<Result<GuidePageRecord, PageFailure>> {
    let mut records = Vec::with_capacity(pages.len());

    for (index, page) in pages.iter().enumerate() {
        let record = match structure.get(&page.id).await {
            Ok(detail) => match detail.settings.validate() {
                Ok(()) => {
                    debug!("Loaded page {} ({})", page.id, page.title);
                    Ok(GuidePageRecord {
                        index,
                        title: page.title.clone(),
                        id: page.id.clone(),
                        content: detail.body(),
                        settings: detail.settings,
                    })
                }
                Err(reason) => Err(PageFailure::new(
                    Stage::Load,
                    format!("invalid settings: {reason}"),
                )),
            },
            Err(e) => {
                warn!("Failed to load page {}: {}", page.id, e);
                Err(PageFailure::new(Stage::Load, e.to_string()))
            }
        };
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeHost;
    use serde_json::json;

    fn ids(pages: &[GuideNode]) -> Vec<&str> {
        pages.iter().map(|p| p.id.as_str()).collect()
    }

    fn page(id: &str, title: &str) -> GuideNode {
        GuideNode {
            id: id.into(),
            title: title.into(),
            kind: "page".into(),
        }
    }

    #[test]
    fn flattens_nested_pages_depth_first() {
        let tree = json!({
            "id": "root",
            "type": "root",
            "children": [
                {"id": "c1", "type": "chapter", "title": "Basics", "children": [
                    {"id": "p1", "type": "page", "title": "Intro"},
                    {"id": "s1", "type": "section", "children": [
                        {"id": "p2", "type": "page", "title": "Variables"}
                    ]}
                ]},
                {"id": "p3", "type": "page", "title": "Wrap up"}
            ]
        });

        let pages = flatten_pages(&tree);
        assert_eq!(ids(&pages), ["p1", "p2", "p3"]);
        assert!(pages.iter().all(GuideNode::is_page));
    }

    #[test]
    fn follows_field_order_not_key_order() {
        let tree: Value = serde_json::from_str(
            r#"{"zeta": {"id": "p1", "type": "page"}, "alpha": {"id": "p2", "type": "page"}}"#,
        )
        .unwrap();
        assert_eq!(ids(&flatten_pages(&tree)), ["p1", "p2"]);
    }

    #[test]
    fn descends_into_page_children() {
        let tree = json!([
            {"id": "p1", "type": "page", "children": [{"id": "p2", "type": "page"}]}
        ]);
        assert_eq!(ids(&flatten_pages(&tree)), ["p1", "p2"]);
    }

    #[test]
    fn empty_or_scalar_input_yields_nothing() {
        assert!(flatten_pages(&Value::Null).is_empty());
        assert!(flatten_pages(&json!("page")).is_empty());
        assert!(flatten_pages(&json!(42)).is_empty());
        assert!(flatten_pages(&json!({})).is_empty());
    }

    #[test]
    fn null_title_or_children_still_counts_the_page() {
        let tree = json!({"children": [
            {"id": "p1", "type": "page", "title": null},
            {"id": "p2", "type": "page", "title": "Loops", "children": null},
            {"id": "p3", "type": "page", "title": "End"}
        ]});

        let pages = flatten_pages(&tree);
        assert_eq!(ids(&pages), ["p1", "p2", "p3"]);
        assert_eq!(pages[0].title, "");
    }

    #[test]
    fn page_without_id_is_skipped() {
        let tree = json!({"children": [{"type": "page", "title": "orphan"}, {"id": "p1", "type": "page"}]});
        assert_eq!(ids(&flatten_pages(&tree)), ["p1"]);
    }

    #[tokio::test]
    async fn failed_load_is_reported_in_place() {
        let host = FakeHost::new()
            .with_page("p1", json!({"settings": {"layout": "1-panel", "content": "a"}}))
            .with_page("p3", json!({"content": "c", "settings": {}}));
        let pages = vec![page("p1", "Intro"), page("p2", "Gone"), page("p3", "End")];

        let records = load_pages(&host, &pages).await;

        assert_eq!(records.len(), 3);
        let first = records[0].as_ref().unwrap();
        assert_eq!((first.index, first.content.as_str()), (0, "a"));
        assert_eq!(records[1].as_ref().unwrap_err().stage, Stage::Load);
        let last = records[2].as_ref().unwrap();
        assert_eq!((last.index, last.content.as_str()), (2, "c"));
    }

    #[tokio::test]
    async fn invalid_settings_fail_the_load() {
        let host = FakeHost::new().with_page(
            "p1",
            json!({"settings": {"layout": "2-panels", "actions": [{"type": "file", "panel": 0}]}}),
        );
        let pages = vec![page("p1", "Intro")];

        let records = load_pages(&host, &pages).await;
        let failure = records[0].as_ref().unwrap_err();
        assert!(failure.message.contains("invalid settings"));
    }
}
