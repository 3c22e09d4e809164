//! Server-rendered page for one render pass. Every dynamic string goes through `html_escape`.

use dataqa_core::{Message, Page};

const STYLE: &str = r#"
body { font-family: "Source Sans Pro", system-ui, sans-serif; margin: 0; background: #ffffff; color: #31333F; }
main { max-width: 1100px; margin: 0 auto; padding: 2rem 1.5rem; }
h1 { font-size: 2.2rem; margin-bottom: 1.5rem; }
h2 { font-size: 1.4rem; margin-top: 2rem; }
table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
th, td { border: 1px solid #e6e9ef; padding: 0.35rem 0.6rem; text-align: left; }
th small { color: #808495; font-weight: normal; }
.caption { color: #808495; font-size: 0.85rem; margin-top: 0.4rem; }
.grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
.grid button { width: 100%; }
button { padding: 0.5rem 0.9rem; border: 1px solid #d3d5db; border-radius: 0.5rem; background: #fff; cursor: pointer; }
button:hover { border-color: #FF4B4B; color: #FF4B4B; }
input[type=text] { width: 100%; box-sizing: border-box; padding: 0.55rem; border: 1px solid #d3d5db; border-radius: 0.5rem; }
.msg { padding: 1rem; border-radius: 0.5rem; margin: 1rem 0; white-space: pre-wrap; }
.msg-success { background: #dff5e3; color: #177233; }
.msg-error { background: #ffe2e0; color: #7d353b; }
#spinner { display: none; margin: 1rem 0; color: #808495; }
form.busy #spinner, body.busy #spinner { display: block; }
"#;

const SCRIPT: &str = r#"
document.querySelectorAll("form").forEach(function (f) {
  f.addEventListener("submit", function () {
    document.body.classList.add("busy");
    document.querySelectorAll("button").forEach(function (b) { b.disabled = true; });
  });
});
"#;

pub fn render_page(page: &Page) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>", html_escape(&page.heading)));

    if let Some(err) = &page.init_error {
        body.push_str(&message_html(&Message::Error(err.clone())));
    }

    if let Some(err) = &page.load_error {
        body.push_str(&message_html(&Message::Error(err.clone())));
    }

    if let Some(preview) = &page.preview {
        body.push_str("<h2>Data Preview</h2><table><thead><tr>");
        for (name, ty) in preview.headers.iter().zip(&preview.column_types) {
            body.push_str(&format!(
                "<th>{}<br><small>{}</small></th>",
                html_escape(name),
                ty
            ));
        }
        body.push_str("</tr></thead><tbody>");
        for row in &preview.rows {
            body.push_str("<tr>");
            for cell in row {
                body.push_str(&format!("<td>{}</td>", html_escape(cell)));
            }
            body.push_str("</tr>");
        }
        body.push_str(&format!(
            r#"</tbody></table><p class="caption">Showing {} of {} rows</p>"#,
            preview.rows.len(),
            preview.total_rows
        ));
    }

    if !page.presets.is_empty() {
        body.push_str(r#"<h2>Quick Questions</h2><div class="grid">"#);
        for (i, preset) in page.presets.iter().enumerate() {
            body.push_str(&format!(
                r#"<form method="post" action="/preset/{}"><button type="submit">{}</button></form>"#,
                i,
                html_escape(preset.label)
            ));
        }
        body.push_str("</div>");
    }

    if page.show_question_input {
        let value = page.last_question.as_deref().unwrap_or("");
        body.push_str(&format!(
            r#"<h2>Ask Your Own Question</h2><form method="post" action="/ask"><label for="question">Enter your question about the data:</label><input type="text" id="question" name="question" value="{}"></form>"#,
            html_escape(value)
        ));
    }

    body.push_str(r#"<div id="spinner">Analyzing...</div>"#);

    if let Some(answer) = &page.answer {
        body.push_str(&message_html(answer));
    }

    format!(
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{}</title><style>{}</style></head><body><main>{}</main><script>{}</script></body></html>"#,
        html_escape(&page.title),
        STYLE,
        body,
        SCRIPT
    )
}

fn message_html(msg: &Message) -> String {
    let (class, text) = match msg {
        Message::Success(t) => ("msg msg-success", t),
        Message::Error(t) => ("msg msg-error", t),
    };
    format!(r#"<div class="{}">{}</div>"#, class, html_escape(text))
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataqa_core::{ColumnType, Preview, PRESETS};

    fn page() -> Page {
        Page {
            title: "CSV Data Analysis Agent".into(),
            heading: "📊 Vikas Group Demo".into(),
            init_error: None,
            preview: Some(Preview {
                headers: vec!["City".into(), "Price".into()],
                column_types: vec![ColumnType::Text, ColumnType::Integer],
                rows: vec![vec!["Gurgaon".into(), "850000".into()]],
                total_rows: 12,
            }),
            load_error: None,
            presets: PRESETS.to_vec(),
            show_question_input: true,
            last_question: None,
            answer: None,
        }
    }

    #[test]
    fn renders_preview_and_presets() {
        let html = render_page(&page());
        assert!(html.contains("<title>CSV Data Analysis Agent</title>"));
        assert!(html.contains("<td>Gurgaon</td>"));
        assert!(html.contains("Showing 1 of 12 rows"));
        assert!(html.contains(r#"action="/preset/2""#));
        assert!(html.contains("Total price of cars purchased by corporates?"));
        assert!(html.contains(r#"action="/ask""#));
    }

    #[test]
    fn answers_are_escaped() {
        let mut p = page();
        p.answer = Some(Message::Success("<script>alert(1)</script>".into()));
        let html = render_page(&p);
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("msg-success"));
    }

    #[test]
    fn aborted_pass_has_no_question_ui() {
        let mut p = page();
        p.preview = None;
        p.presets.clear();
        p.show_question_input = false;
        p.load_error = Some("Error loading CSV file: cannot load data.csv".into());
        let html = render_page(&p);
        assert!(html.contains("msg-error"));
        assert!(!html.contains("Quick Questions"));
        assert!(!html.contains(r#"action="/ask""#));
    }
}
