use crate::models::{substitute_title, ConfigKind, ConfigOverlay, FormTemplateStep, TypeBloc};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"</?[^>]+(>|$)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Reduces rich text to what a reader sees, so cosmetic re-saves compare equal.
pub fn normalize_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Steps of the builder that `overlay` changes compared to the raw template.
///
/// A step counts as modified when one of its options is hidden, or when one of its
/// paragraphs is relabelled with a text that reads differently from the template's.
/// Hiding a whole block does not flag its step.
pub fn compute_modified_steps(
    steps: &[FormTemplateStep],
    overlay: &ConfigOverlay,
    product_title: &str,
) -> BTreeSet<i32> {
    steps
        .iter()
        .filter(|step| {
            has_hidden_option(step, overlay) || has_relabelled_paragraph(step, overlay, product_title)
        })
        .map(|step| step.id)
        .collect()
}

/// Same as `compute_modified_steps`, with an entry for every step.
pub fn step_modification_flags(
    steps: &[FormTemplateStep],
    overlay: &ConfigOverlay,
    product_title: &str,
) -> BTreeMap<i32, bool> {
    let modified = compute_modified_steps(steps, overlay, product_title);
    steps
        .iter()
        .map(|step| (step.id, modified.contains(&step.id)))
        .collect()
}

fn has_hidden_option(step: &FormTemplateStep, overlay: &ConfigOverlay) -> bool {
    let option_ids: BTreeSet<i32> = step.option_ids().collect();
    overlay
        .displays
        .iter()
        .any(|d| d.kind == ConfigKind::BlockOption && d.hidden && option_ids.contains(&d.parent_id))
}

fn has_relabelled_paragraph(step: &FormTemplateStep, overlay: &ConfigOverlay, title: &str) -> bool {
    overlay
        .labels
        .iter()
        .filter(|l| l.kind == ConfigKind::Block)
        .any(|l| {
            let paragraph = step
                .blocks
                .iter()
                .find(|b| b.id == l.parent_id && b.type_bloc == TypeBloc::Paragraph);
            match paragraph.and_then(|b| b.content.as_deref()) {
                Some(content) if !content.is_empty() => {
                    normalize_html(&l.label) != normalize_html(&substitute_title(content, title))
                }
                _ => false,
            }
        })
}
