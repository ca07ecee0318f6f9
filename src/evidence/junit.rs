//! JUnit XML summary for CI ingestion.
//!
//! The HTML report is the human-facing artifact; this writer emits the
//! machine-facing one, in the schema Jenkins/GitLab/GitHub Actions all
//! consume:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <testsuites tests="3" failures="1" time="42.1">
//!   <testsuite name="storecheck" tests="3" failures="1" skipped="0" time="42.1">
//!     <testcase classname="login" name="login_standard_user" time="12.3"/>
//!     <testcase classname="login" name="login_bad_password" time="8.0">
//!       <failure message="error banner mismatch">error banner mismatch</failure>
//!     </testcase>
//!   </testsuite>
//! </testsuites>
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Outcome of one case, as JUnit models it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed,
    Skipped,
}

/// One testcase row.
#[derive(Clone, Debug)]
pub struct JUnitCase {
    pub name: String,
    pub class: String,
    pub duration: Duration,
    pub outcome: CaseOutcome,
    pub message: Option<String>,
}

/// Write the suite summary to `path`, creating parent directories.
pub fn write_file(path: &Path, suite: &str, cases: &[JUnitCase]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let xml = generate(suite, cases)?;
    std::fs::write(path, xml).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Generate the XML document.
pub fn generate(suite: &str, cases: &[JUnitCase]) -> anyhow::Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let tests = cases.len();
    let failures = cases
        .iter()
        .filter(|c| c.outcome == CaseOutcome::Failed)
        .count();
    let skipped = cases
        .iter()
        .filter(|c| c.outcome == CaseOutcome::Skipped)
        .count();
    let total_time: f64 = cases.iter().map(|c| c.duration.as_secs_f64()).sum();

    let mut suites = BytesStart::new("testsuites");
    suites.push_attribute(("tests", tests.to_string().as_str()));
    suites.push_attribute(("failures", failures.to_string().as_str()));
    suites.push_attribute(("time", format!("{total_time:.3}").as_str()));
    writer.write_event(Event::Start(suites))?;

    let mut suite_el = BytesStart::new("testsuite");
    suite_el.push_attribute(("name", suite));
    suite_el.push_attribute(("tests", tests.to_string().as_str()));
    suite_el.push_attribute(("failures", failures.to_string().as_str()));
    suite_el.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_el.push_attribute(("time", format!("{total_time:.3}").as_str()));
    writer.write_event(Event::Start(suite_el))?;

    for case in cases {
        let mut case_el = BytesStart::new("testcase");
        case_el.push_attribute(("classname", case.class.as_str()));
        case_el.push_attribute(("name", case.name.as_str()));
        case_el.push_attribute((
            "time",
            format!("{:.3}", case.duration.as_secs_f64()).as_str(),
        ));

        match case.outcome {
            CaseOutcome::Passed => {
                writer.write_event(Event::Empty(case_el))?;
            }
            CaseOutcome::Failed => {
                writer.write_event(Event::Start(case_el))?;
                let message = case.message.as_deref().unwrap_or("test failed");
                let mut failure = BytesStart::new("failure");
                failure.push_attribute(("message", message));
                writer.write_event(Event::Start(failure))?;
                writer.write_event(Event::Text(BytesText::new(message)))?;
                writer.write_event(Event::End(BytesEnd::new("failure")))?;
                writer.write_event(Event::End(BytesEnd::new("testcase")))?;
            }
            CaseOutcome::Skipped => {
                writer.write_event(Event::Start(case_el))?;
                writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
                writer.write_event(Event::End(BytesEnd::new("testcase")))?;
            }
        }
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}
