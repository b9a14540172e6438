//! System prompt construction from memory categories.

use recall_types::MemoryCategory;
use std::fmt::Write;

/// Heading placed between the base instructions and the memory summaries.
pub const DEFAULT_MEMORY_HEADER: &str = "以下是关于用户的信息：";

/// Renders the memory appendix for `categories`.
///
/// One block per category with a usable summary, in retrieval order.
/// Returns an empty string when no category has a summary.
pub fn render_appendix(header: &str, categories: &[MemoryCategory]) -> String {
    let mut appendix = String::new();
    for category in categories {
        if let Some(summary) = category.usable_summary() {
            if appendix.is_empty() {
                let _ = write!(appendix, "\n\n{header}\n\n");
            }
            let _ = write!(appendix, "**{}:** {}\n\n", category.name, summary);
        }
    }
    appendix
}

/// Concatenates `base` with the rendered memory appendix under the default
/// heading.
///
/// Pure: identical inputs always produce identical output, and `base` is
/// returned unchanged when no category carries a summary.
pub fn render(base: &str, categories: &[MemoryCategory]) -> String {
    render_with_header(base, DEFAULT_MEMORY_HEADER, categories)
}

/// [`render`] with a custom heading.
pub fn render_with_header(base: &str, header: &str, categories: &[MemoryCategory]) -> String {
    let mut prompt = base.to_string();
    prompt.push_str(&render_appendix(header, categories));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "你是一个有用的语音人工智能助手。";

    #[test]
    fn empty_summary_leaves_base_unchanged() {
        let categories = vec![MemoryCategory::new("Profile", Some(""))];
        assert_eq!(render(BASE, &categories), BASE);
        assert_eq!(render(BASE, &[]), BASE);
    }

    #[test]
    fn summary_is_appended_once() {
        let categories = vec![MemoryCategory::new("Profile", Some("爱好编程"))];
        let rendered = render(BASE, &categories);
        assert_eq!(
            rendered,
            format!("{BASE}\n\n以下是关于用户的信息：\n\n**Profile:** 爱好编程\n\n")
        );
        assert_eq!(rendered.matches("爱好编程").count(), 1);
    }

    #[test]
    fn rendering_is_idempotent() {
        let categories = vec![
            MemoryCategory::new("Profile", Some("爱好编程")),
            MemoryCategory::new("Events", None),
        ];
        let first = render(BASE, &categories);
        let second = render(BASE, &categories);
        assert_eq!(first, second);
    }

    #[test]
    fn preserves_order_and_skips_blank_categories() {
        let categories = vec![
            MemoryCategory::new("Profile", Some("A")),
            MemoryCategory::new("Empty", Some("")),
            MemoryCategory::new("Events", Some("B")),
            MemoryCategory::new("None", None),
        ];
        let appendix = render_appendix("H", &categories);
        assert_eq!(appendix, "\n\nH\n\n**Profile:** A\n\n**Events:** B\n\n");
        assert!(!appendix.contains("Empty"));
        assert!(!appendix.contains("None"));
    }

    #[test]
    fn whitespace_summary_is_rendered_verbatim() {
        let categories = vec![MemoryCategory::new("Blank", Some(" "))];
        assert_eq!(render_appendix("H", &categories), "\n\nH\n\n**Blank:**  \n\n");
    }
}
