//! HTML rendering for the final report document.
//!
//! One self-contained page per run: a header with run metadata, then a
//! section per test node with status-colored entries and links to any
//! captured screenshots.

use super::report::{RunMeta, Status, TestNode};

const TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub fn render(
    meta: &RunMeta,
    nodes: &[TestNode],
    title: &str,
    name: &str,
    theme: &str,
) -> String {
    let mut out = String::with_capacity(4096 + nodes.len() * 1024);

    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape(title)));
    out.push_str("<style>\n");
    out.push_str(stylesheet(theme));
    out.push_str("</style>\n</head>\n<body>\n");

    out.push_str(&format!("<h1>{}</h1>\n", escape(name)));

    out.push_str("<table class=\"meta\">\n");
    meta_row(&mut out, "Run ID", &meta.run_id.to_string());
    meta_row(&mut out, "Application URL", &meta.app_url);
    meta_row(&mut out, "Browser", &meta.browser);
    meta_row(&mut out, "Environment", &meta.environment);
    meta_row(&mut out, "Operating System", &meta.os);
    meta_row(&mut out, "Execution Mode", &meta.execution_mode);
    meta_row(&mut out, "Grid Enabled", &meta.grid_enabled.to_string());
    meta_row(
        &mut out,
        "Started",
        &meta.started_at.format(TIME_FORMAT).to_string(),
    );
    out.push_str("</table>\n");

    let passed = nodes.iter().filter(|n| n.outcome == Status::Pass).count();
    let failed = nodes.iter().filter(|n| n.outcome == Status::Fail).count();
    let skipped = nodes.iter().filter(|n| n.outcome == Status::Skip).count();
    out.push_str(&format!(
        "<p class=\"summary\">{} tests &mdash; <span class=\"pass\">{passed} passed</span>, \
         <span class=\"fail\">{failed} failed</span>, \
         <span class=\"skip\">{skipped} skipped</span></p>\n",
        nodes.len()
    ));

    for node in nodes {
        out.push_str(&format!(
            "<section class=\"test {}\">\n",
            css_class(node.outcome)
        ));
        out.push_str(&format!("<h2>{}</h2>\n", escape(&node.name)));
        if !node.description.is_empty() {
            out.push_str(&format!("<p class=\"desc\">{}</p>\n", escape(&node.description)));
        }
        out.push_str(&format!(
            "<p class=\"tags\">category: {} &middot; author: {} &middot; started: {}</p>\n",
            escape(&node.class),
            escape(&node.author),
            node.started_at.format(TIME_FORMAT)
        ));

        out.push_str("<ul class=\"entries\">\n");
        for entry in &node.entries {
            out.push_str(&format!(
                "<li class=\"{}\"><span class=\"time\">{}</span> <span class=\"status\">{}</span> {}",
                css_class(entry.status),
                entry.at.format("%H:%M:%S"),
                entry.status.label(),
                escape(&entry.message)
            ));
            if let Some(shot) = &entry.screenshot {
                let title = entry.screenshot_title.as_deref().unwrap_or("screenshot");
                out.push_str(&format!(
                    " <a href=\"{}\">{}</a>",
                    escape(&shot.display().to_string()),
                    escape(title)
                ));
            }
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n</section>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn meta_row(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!(
        "<tr><th>{}</th><td>{}</td></tr>\n",
        escape(key),
        escape(value)
    ));
}

fn css_class(status: Status) -> &'static str {
    match status {
        Status::Info => "info",
        Status::Pass => "pass",
        Status::Fail => "fail",
        Status::Warning => "warning",
        Status::Skip => "skip",
    }
}

fn stylesheet(theme: &str) -> &'static str {
    // Two fixed themes; anything unknown falls back to standard.
    if theme.eq_ignore_ascii_case("dark") {
        "body{font-family:sans-serif;margin:2em;background:#1e1e1e;color:#ddd}\
         table.meta th{text-align:left;padding-right:1em}\
         section.test{border-left:4px solid #2e8b57;padding-left:1em;margin:1.5em 0}\
         section.test.pass{border-left-color:#28a745}\
         section.test.fail{border-left-color:#dc3545}\
         section.test.skip{border-left-color:#ffc107}\
         ul.entries{list-style:none;padding-left:0}\
         li .time{color:#888}\
         li.pass .status{color:#28a745}li.fail .status{color:#dc3545}\
         li.warning .status{color:#fd7e14}li.skip .status{color:#ffc107}\
         li.info .status{color:#4f9ee0}\
         .summary .pass{color:#28a745}.summary .fail{color:#dc3545}.summary .skip{color:#ffc107}"
    } else {
        "body{font-family:sans-serif;margin:2em;color:#222}\
         table.meta th{text-align:left;padding-right:1em}\
         section.test{border-left:4px solid #2e8b57;padding-left:1em;margin:1.5em 0}\
         section.test.pass{border-left-color:#28a745}\
         section.test.fail{border-left-color:#dc3545}\
         section.test.skip{border-left-color:#ffc107}\
         ul.entries{list-style:none;padding-left:0}\
         li .time{color:#999}\
         li.pass .status{color:#28a745}li.fail .status{color:#dc3545}\
         li.warning .status{color:#fd7e14}li.skip .status{color:#b8860b}\
         li.info .status{color:#0d6efd}\
         .summary .pass{color:#28a745}.summary .fail{color:#dc3545}.summary .skip{color:#b8860b}"
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::report::ReportEntry;
    use chrono::Local;

    fn sample_meta() -> RunMeta {
        RunMeta {
            run_id: uuid::Uuid::nil(),
            app_url: "https://www.saucedemo.com".to_string(),
            browser: "chrome".to_string(),
            environment: "qa".to_string(),
            os: "linux".to_string(),
            execution_mode: "Headless".to_string(),
            grid_enabled: false,
            started_at: Local::now(),
        }
    }

    #[test]
    fn escapes_markup_in_messages() {
        assert_eq!(escape("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
    }

    #[test]
    fn renders_nodes_with_status_classes() {
        let node = TestNode {
            name: "login_standard_user".to_string(),
            description: "Valid login reaches inventory".to_string(),
            class: "login".to_string(),
            author: "Automation Team".to_string(),
            started_at: Local::now(),
            outcome: Status::Fail,
            entries: vec![ReportEntry {
                at: Local::now(),
                status: Status::Fail,
                message: "error banner said <nothing>".to_string(),
                screenshot: None,
                screenshot_title: None,
            }],
        };

        let page = render(&sample_meta(), &[node], "title", "name", "standard");
        assert!(page.contains("login_standard_user"));
        assert!(page.contains("class=\"test fail\""));
        assert!(page.contains("error banner said &lt;nothing&gt;"));
        assert!(page.contains("Grid Enabled"));
    }

    #[test]
    fn unknown_theme_falls_back_to_standard() {
        let meta = sample_meta();
        let standard = render(&meta, &[], "t", "n", "standard");
        let unknown = render(&meta, &[], "t", "n", "solarized");
        assert_eq!(standard, unknown);
    }
}
