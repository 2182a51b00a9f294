//! Review page body

use scraper::Html;

use super::element_text;
use super::selectors::REVIEW_PARAGRAPHS;

/// Review text, paragraphs separated by blank lines. `None` when empty.
///
/// Spoiler-guarded reviews only render their paragraphs after the reveal
/// control was clicked, which the caller does before capturing the page.
#[must_use]
pub fn extract_review(doc: &Html) -> Option<String> {
    let paragraphs: Vec<String> = doc
        .select(&REVIEW_PARAGRAPHS)
        .map(element_text)
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_page(body: &str) -> Html {
        Html::parse_document(&format!(
            r#"<div id="content"><div><div><section><section>
                <div class="review body-text -prose -hero -loose"><div><div><div>{body}</div></div></div></div>
            </section></section></div></div></div>"#
        ))
    }

    #[test]
    fn test_paragraphs_joined() {
        let doc = review_page("<p>Great heist.</p><p> Best diner scene. </p>");
        assert_eq!(
            extract_review(&doc).as_deref(),
            Some("Great heist.\n\nBest diner scene.")
        );
    }

    #[test]
    fn test_empty_review() {
        assert_eq!(extract_review(&review_page("")), None);
    }
}
