// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pulldown_cmark::Event;
use pulldown_cmark::Parser;
use pulldown_cmark::html::push_html;

/// Render card text as HTML. Raw HTML in the input is escaped rather than
/// passed through, since card text is user input.
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });
    let mut html_output: String = String::new();
    push_html(&mut html_output, parser);
    html_output
}

/// Render card text as HTML, without the enclosing paragraph when the text
/// is a single paragraph.
pub fn markdown_to_html_inline(markdown: &str) -> String {
    let text = markdown_to_html(markdown);
    if text.starts_with("<p>") && text.ends_with("</p>\n") {
        let len = text.len();
        text[3..len - 5].to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html() {
        assert_eq!(markdown_to_html("*hi*"), "<p><em>hi</em></p>\n");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_markdown_to_html_inline() {
        assert_eq!(markdown_to_html_inline("Paris"), "Paris");
        assert_eq!(markdown_to_html_inline("**Paris**"), "<strong>Paris</strong>");
    }
}
