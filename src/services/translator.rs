use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::TranslatorConfig;
use crate::error::{PageFailure, Stage};
use crate::models::{
    AskOptions, AskRequest, GuidePageRecord, NewItemSpec, PAGE_TYPE, PageAction, PageOutcome,
    PageStatus, RunReport,
};
use crate::services::host::{Assistant, Host};
use crate::services::prompts::{CODE_TAG, CONTENT_TAG, FILENAME_TAG, PromptSet};
use crate::services::structure::{flatten_pages, load_pages};
use crate::utils::{clean_file_path, extract_tagged, has_extension, parent_dir};

/// Sends one prompt and returns the text inside `<tag>`.
///
/// The result is empty when the answer does not carry the tag pair.
pub async fn fetch_translation(
    assistant: &dyn Assistant,
    system_prompt: &str,
    prompt: String,
    tag: &str,
) -> Result<String> {
    let request = AskRequest::single(system_prompt, prompt);
    let response = assistant.ask(&request, AskOptions::default()).await?;
    Ok(extract_tagged(&response.result, tag))
}

/// Runs the whole course translation for one button press.
pub async fn translate_course(host: &Host<'_>, config: &TranslatorConfig) -> RunReport {
    let mut report = RunReport::new();
    info!(
        "Run {}: translating {} -> {}",
        report.run_id, config.source_language, config.target_language
    );

    let chapter = match host
        .structure
        .add(&NewItemSpec::chapter(&config.target_language), None, None)
        .await
    {
        Ok(chapter) => chapter,
        Err(e) => {
            error!("Failed to create chapter: {}", e);
            report.fatal = Some(format!(
                "could not create the {} chapter: {e}",
                config.target_language
            ));
            finish(host, &report).await;
            return report;
        }
    };
    info!("Created chapter {} ({})", chapter.id, chapter.title);
    report.chapter_id = Some(chapter.id.clone());

    let structure = match host.structure.get_structure().await {
        Ok(structure) => structure,
        Err(e) => {
            error!("Failed to fetch guide structure: {}", e);
            report.fatal = Some(format!("could not read the guide structure: {e}"));
            finish(host, &report).await;
            return report;
        }
    };

    let pages = flatten_pages(&structure);
    report.page_count = pages.len();
    info!("Found {} pages to translate", pages.len());

    let prompts = PromptSet::new(config);
    let records = load_pages(host.structure, &pages).await;

    for (index, (node, record)) in pages.iter().zip(records).enumerate() {
        let outcome = match record {
            Ok(page) => match translate_page(host, config, &prompts, &chapter.id, &page).await {
                Ok(status) => PageOutcome {
                    index: page.index,
                    title: page.title.clone(),
                    source_id: page.id.clone(),
                    status,
                },
                Err(failure) => {
                    warn!("Page {} ({}) failed: {}", page.index, page.title, failure);
                    let message = format!("Could not translate {}: {}", page.title, failure);
                    notify(host, &message).await;
                    PageOutcome::failed(page.index, &page.title, &page.id, failure)
                }
            },
            Err(failure) => PageOutcome::failed(index, &node.title, &node.id, failure),
        };
        report.pages.push(outcome);
    }

    finish(host, &report).await;
    report
}

async fn translate_page(
    host: &Host<'_>,
    config: &TranslatorConfig,
    prompts: &PromptSet,
    chapter_id: &str,
    page: &GuidePageRecord,
) -> Result<PageStatus, PageFailure> {
    info!("{}: {}", page.index, page.title);
    notify(
        host,
        &format!("Translating page on {} at index {}", page.title, page.index),
    )
    .await;

    let content = ask_tagged(
        host.assistant,
        config,
        prompts.content.fill(&page.content),
        CONTENT_TAG,
        Stage::TranslateContent,
    )
    .await?;

    let code_file = match code_file_path(page, config) {
        Some(path) => Some(translate_code_file(host, config, prompts, path).await?),
        None => None,
    };

    let spec = new_page_spec(page, content, code_file.as_deref());
    let created = host
        .structure
        .add(&spec, Some(chapter_id), Some(page.index))
        .await
        .map_err(|e| PageFailure::new(Stage::Write, e.to_string()))?;
    info!("Added page {} for {}", created.id, page.title);

    notify(host, &format!("{} Translation complete!!", page.title)).await;

    Ok(PageStatus::Translated {
        new_page_id: created.id,
        code_file,
    })
}

/// Primary open file of a multi-panel page, when it is a source-language file.
fn code_file_path<'a>(page: &'a GuidePageRecord, config: &TranslatorConfig) -> Option<&'a str> {
    if page.settings.is_single_panel() {
        return None;
    }
    page.settings
        .primary_file()
        .filter(|path| has_extension(path, config.source_extension()))
}

/// Translates the code file, picks its new name and stores it. Returns the new path.
async fn translate_code_file(
    host: &Host<'_>,
    config: &TranslatorConfig,
    prompts: &PromptSet,
    path: &str,
) -> Result<String, PageFailure> {
    info!("Translating code file {}", path);
    let source = host
        .files
        .get_content(path)
        .await
        .map_err(|e| PageFailure::new(Stage::FetchCode, e.to_string()))?;

    let code = ask_tagged(
        host.assistant,
        config,
        prompts.code.fill(&source),
        CODE_TAG,
        Stage::TranslateCode,
    )
    .await?;

    let answer = fetch_translation(
        host.assistant,
        &config.system_prompt,
        prompts.filename.fill(path),
        FILENAME_TAG,
    )
    .await
    .map_err(PageFailure::at(Stage::RenameFile))?;

    // The new name must keep the original directory and carry the target extension.
    let renamed = match clean_file_path(&answer) {
        Some(renamed)
            if has_extension(&renamed, config.target_extension())
                && parent_dir(&renamed) == parent_dir(path) =>
        {
            renamed
        }
        _ => {
            let fallback =
                swap_extension(path, config.source_extension(), config.target_extension());
            warn!(
                "Unusable file name suggestion {:?} for {}, using {}",
                answer.trim(),
                path,
                fallback
            );
            fallback
        }
    };

    host.files
        .save(&renamed, trim_code(&code))
        .await
        .map_err(|e| PageFailure::new(Stage::SaveCode, e.to_string()))?;

    Ok(renamed)
}

async fn ask_tagged(
    assistant: &dyn Assistant,
    config: &TranslatorConfig,
    prompt: String,
    tag: &str,
    stage: Stage,
) -> Result<String, PageFailure> {
    let extracted = fetch_translation(assistant, &config.system_prompt, prompt, tag)
        .await
        .map_err(PageFailure::at(stage))?;

    if extracted.trim().is_empty() {
        return Err(PageFailure::new(
            stage,
            format!("model answer had no <{tag}> content"),
        ));
    }
    Ok(extracted)
}

fn new_page_spec(page: &GuidePageRecord, content: String, code_file: Option<&str>) -> NewItemSpec {
    let settings = &page.settings;
    let actions = match code_file {
        Some(path) => vec![PageAction::open_file(path)],
        None => settings.actions.clone(),
    };

    NewItemSpec {
        title: page.title.clone(),
        kind: PAGE_TYPE.to_string(),
        layout: settings.layout.clone(),
        content: Some(content.trim().to_string()),
        close_all_tabs: settings.close_all_tabs,
        show_file_tree: settings.show_file_tree,
        close_terminal_session: settings.close_terminal_session,
        actions,
    }
}

fn swap_extension(path: &str, from: &str, to: &str) -> String {
    match path.strip_suffix(from) {
        Some(stem) => format!("{stem}{to}"),
        None => format!("{path}{to}"),
    }
}

fn trim_code(code: &str) -> &str {
    code.trim_matches('\n')
}

async fn notify(host: &Host<'_>, message: &str) {
    if let Err(e) = host.chat.write(message).await {
        warn!("Failed to post chat message: {}", e);
    }
}

async fn finish(host: &Host<'_>, report: &RunReport) {
    info!(
        "Run {} finished: {}/{} pages translated",
        report.run_id,
        report.translated_count(),
        report.page_count
    );
    notify(host, &report.summary()).await;
    if let Err(e) = host.chat.show_menu().await {
        warn!("Failed to show the coach menu: {}", e);
    }
}
