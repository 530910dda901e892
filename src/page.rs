//! The single control page.

use crate::session::SessionStatus;

/// Status line shown above the forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub message: String,
    pub color: &'static str,
}

impl Banner {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            color: "green",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            color: "red",
        }
    }
}

pub fn render_page(banner: &Banner, status: Option<&SessionStatus>) -> String {
    let file_line = match status.and_then(|s| s.file_name.as_deref()) {
        Some(name) => format!(
            r#"<p>Current file: <strong>{}</strong> ({} captures) <a href="/download">Download</a></p>"#,
            escape_html(name),
            status.map(|s| s.captures).unwrap_or_default()
        ),
        None => "<p>No file yet.</p>".to_string(),
    };

    PAGE_HTML
        .replace("{{color}}", banner.color)
        .replace("{{message}}", &escape_html(&banner.message))
        .replace("{{file_line}}", &file_line)
}

/// Escapes braces too, so user text can never form a placeholder.

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Autoscreen</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 2rem auto; }
  form { margin: 1rem 0; }
  .message { font-weight: bold; }
</style>
</head>
<body>
<h1>Autoscreen</h1>
<p class="message" style="color: {{color}}">{{message}}</p>
{{file_line}}
<form method="post" action="/new_file">
  <input type="text" name="file_name" placeholder="File name" required>
  <select name="file_format">
    <option value="Word">Word</option>
    <option value="Excel">Excel</option>
  </select>
  <button type="submit">New File</button>
</form>
<form method="post" action="/screenshot_on">
  <input type="text" name="file_name" placeholder="File name (if none yet)">
  <button type="submit">Screenshot On</button>
</form>
<form method="post" action="/screenshot_off">
  <button type="submit">Screenshot Off</button>
</form>
</body>
</html>
"#;
