use crate::config::TranslatorConfig;

pub const CONTENT_PLACEHOLDER: &str = "{ORIGINAL_CONTENT}";
pub const CODE_PLACEHOLDER: &str = "{CODE_FILE}";
pub const FILENAME_PLACEHOLDER: &str = "{openFilePath}";

pub const CONTENT_TAG: &str = "translated_content";
pub const CODE_TAG: &str = "translated_code";
pub const FILENAME_TAG: &str = "new_filename";

const CONTENT_TEMPLATE: &str = r#"You are an AI assistant with expertise in translating instructional materials from one programming language to another. Your task is to translate the given content while maintaining the same concepts and structure, only changing the programming language-specific elements.

Here is the original content to be translated:
<original_content>
{ORIGINAL_CONTENT}
</original_content>

The original programming language is {SOURCE_LANGUAGE}, and you need to translate it to {TARGET_LANGUAGE}.

Follow these guidelines for the translation:
1. Keep all the content and concepts covered in the original material the same.
2. Only modify programming language-specific elements to ensure correctness in the new language.
3. Maintain the overall structure and flow of the instructional material.
4. Adapt code examples, syntax, and language-specific terminology to the new programming language.
5. Ensure that explanations and comments are updated to reflect the new language's conventions and best practices.
6. Do not add any explanations, additional comments, or extra functionality that wasn't present in the original content.
7. If there are any portions of the code that cannot be directly translated due to language limitations, provide the closest equivalent functionality and include a comment explaining the adaptation.
8. If there is a {Try It} button command on the page, make sure the file path in the command starts with code/, uses the {TARGET_EXTENSION} extension and follows {TARGET_LANGUAGE} file naming conventions, and that the command runs the file with the usual {TARGET_LANGUAGE} tooling. For example: {Try it}(<runner> code/<file_name>{TARGET_EXTENSION})

When handling specific elements:
- Keep all image links exactly the same.
- For code file links, keep the filename the same but update the file extension to {TARGET_EXTENSION}.

Please provide the translated content, ensuring that it accurately reflects the original material while being correctly adapted to {TARGET_LANGUAGE}.
Present your translation in the following format:

<translated_content>
[Your translated content goes here]
</translated_content>

Remember to maintain the educational value and clarity of the original content throughout your translation.
It should also follow markdown formatting.
"#;

const CODE_TEMPLATE: &str = r#"You are tasked with translating a code file from one programming language to another. Your goal is to produce an accurate translation that retains all the original information without adding anything extra.
Follow these instructions carefully:

The original programming language is {SOURCE_LANGUAGE}, and you need to translate it to {TARGET_LANGUAGE}.

Here is the code file to be translated:
<code_file>
{CODE_FILE}
</code_file>

Before translating, think through how you will translate and structure the file in a <scratchpad> section.

Translation process:
   a. Carefully read and understand the entire code file.
   b. Identify the main components, functions, and logic of the code.
   c. Translate each component into the target language, ensuring that the functionality and logic remain identical.
   d. Maintain the original structure and organization of the code as much as possible.
   e. Preserve all comments, translating them if necessary while keeping their original meaning.
   f. Ensure that variable names, function names, and other identifiers follow {TARGET_LANGUAGE} conventions.
   g. Adapt any language-specific idioms or constructs to their equivalent in the target language.
   h. Double-check that all syntax is correct for the target language.

Output requirements:
   a. Provide the translated code inside <translated_code> tags.
   b. Ensure the translated code is properly formatted and indented for readability.
   c. Do not add any explanations, additional comments, or extra functionality that wasn't present in the original code.
   d. If there are any portions of the code that cannot be directly translated due to language limitations, provide the closest equivalent functionality and include a comment explaining the adaptation.

Begin your translation now, and remember to focus solely on accurate translation without adding any extra information or functionality.
"#;

const FILENAME_TEMPLATE: &str = r#"You are renaming a source file that is being translated from {SOURCE_LANGUAGE} to {TARGET_LANGUAGE}.

Here is the original file path:
<file_path>
{openFilePath}
</file_path>

Rules:
1. Keep every directory in the path exactly as it is.
2. Rename only the file's base name so that it follows {TARGET_LANGUAGE} file naming conventions.
3. Replace the {SOURCE_EXTENSION} extension with {TARGET_EXTENSION}.
4. Do not add any explanation.

Present the new path in the following format:

<new_filename>
[new file path]
</new_filename>
"#;

/// A prompt with a single placeholder that is filled right before a request.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    text: String,
    placeholder: &'static str,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>, placeholder: &'static str) -> Self {
        PromptTemplate {
            text: text.into(),
            placeholder,
        }
    }

    /// Replaces the first occurrence of the placeholder. The value is inserted
    /// verbatim.
    pub fn fill(&self, value: &str) -> String {
        self.text.replacen(self.placeholder, value, 1)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The three templates used for one run, bound to the configured language pair.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub content: PromptTemplate,
    pub code: PromptTemplate,
    pub filename: PromptTemplate,
}

impl PromptSet {
    pub fn new(config: &TranslatorConfig) -> Self {
        let bind = |template: &str| {
            template
                .replace("{SOURCE_LANGUAGE}", &config.source_language)
                .replace("{TARGET_LANGUAGE}", &config.target_language)
                .replace("{SOURCE_EXTENSION}", config.source_extension())
                .replace("{TARGET_EXTENSION}", config.target_extension())
        };

        PromptSet {
            content: PromptTemplate::new(bind(CONTENT_TEMPLATE), CONTENT_PLACEHOLDER),
            code: PromptTemplate::new(bind(CODE_TEMPLATE), CODE_PLACEHOLDER),
            filename: PromptTemplate::new(bind(FILENAME_TEMPLATE), FILENAME_PLACEHOLDER),
        }
    }
}
