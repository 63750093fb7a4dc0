//! HTML and plaintext renderings of a [`NarrativeReport`].
//!
//! Both renderings are pure functions of their inputs. Every string that
//! came from the text generator or the audited site is escaped in HTML.

use std::fmt::Write as _;

use siteaudit_core::{NarrativeIssue, NarrativeReport, ScoreBand, Severity};

/// Facts shown above the narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportHeader {
    pub site_url: String,
    pub overall_score: u8,
    pub report_url: String,
    pub customer_name: Option<String>,
}

#[must_use]
pub fn render_html(header: &ReportHeader, report: &NarrativeReport) -> String {
    let band = ScoreBand::from_score(header.overall_score);
    let greeting = header
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(String::new, |name| {
            format!(r#"<p style="margin:0 0 16px;">Hi {},</p>"#, html_escape(name))
        });

    let mut summary = String::new();
    for paragraph in &report.executive_summary {
        let _ = write!(
            summary,
            r#"<p style="margin:0 0 12px;line-height:1.5;">{}</p>"#,
            html_escape(paragraph)
        );
    }

    let actions = if report.top_actions.is_empty() {
        String::new()
    } else {
        let items: String = report
            .top_actions
            .iter()
            .map(|a| format!(r#"<li style="margin-bottom:6px;">{}</li>"#, html_escape(a)))
            .collect();
        format!(
            r#"<h2 style="font-size:18px;margin:24px 0 8px;">Top actions</h2><ol style="padding-left:20px;margin:0;">{items}</ol>"#
        )
    };

    let mut modules = String::new();
    for module in &report.modules {
        let issues: String = module.issues.iter().map(render_issue_html).collect();
        let _ = write!(
            modules,
            r#"<div style="border:1px solid #e0e0e0;border-radius:8px;padding:16px;margin-bottom:16px;background:#fff;">
<h3 style="font-size:16px;margin:0 0 8px;">{name}</h3>
<p style="color:#555;margin:0 0 12px;line-height:1.5;">{overview}</p>
{issues}
</div>"#,
            name = html_escape(&module.module_name),
            overview = html_escape(&module.overview),
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Website audit for {site}</title>
</head>
<body style="margin:0;padding:0;background:#fafafa;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;color:#1a1a1a;">
<div style="max-width:640px;margin:0 auto;padding:24px;">
<div style="background:#1a1a1a;color:#fff;padding:20px 24px;border-radius:8px 8px 0 0;">
<h1 style="font-size:20px;margin:0 0 4px;">Website audit</h1>
<p style="margin:0;color:#ccc;font-size:14px;">{site}</p>
</div>
<div style="background:#fff;border:1px solid #e0e0e0;border-top:none;padding:20px 24px;margin-bottom:24px;border-radius:0 0 8px 8px;">
<p style="margin:0;font-size:14px;color:#888;">Overall score</p>
<p style="margin:4px 0 12px;font-size:36px;font-weight:700;color:{color};">{score}<span style="font-size:16px;color:#888;">/100</span> <span style="font-size:14px;font-weight:600;">{band}</span></p>
<a href="{link}" style="display:inline-block;padding:8px 18px;background:#0066cc;color:#fff;border-radius:4px;text-decoration:none;font-size:14px;">View your full report</a>
</div>
{greeting}
<h2 style="font-size:18px;margin:0 0 8px;">Summary</h2>
{summary}
{actions}
<h2 style="font-size:18px;margin:24px 0 12px;">Findings by area</h2>
{modules}
</div>
</body>
</html>"#,
        site = html_escape(&header.site_url),
        color = band_color(band),
        score = header.overall_score,
        band = band.label(),
        link = html_escape(&header.report_url),
    )
}

fn render_issue_html(issue: &NarrativeIssue) -> String {
    let severity = Severity::parse_lenient(&issue.severity);
    let (bg, fg) = match severity {
        Severity::High => ("#fce4ec", "#c62828"),
        Severity::Medium => ("#fff3e0", "#e65100"),
        Severity::Low => ("#e3f2fd", "#1565c0"),
    };
    let fix = if issue.fix.trim().is_empty() {
        String::new()
    } else {
        format!(
            r#"<p style="margin:4px 0 0;font-size:14px;"><strong>How to fix:</strong> {}</p>"#,
            html_escape(&issue.fix)
        )
    };
    format!(
        r#"<div style="border-top:1px solid #eee;padding:10px 0;">
<span style="display:inline-block;padding:2px 8px;border-radius:12px;font-size:11px;font-weight:600;text-transform:uppercase;background:{bg};color:{fg};">{severity}</span>
<strong style="margin-left:6px;">{title}</strong>
<p style="margin:6px 0 0;font-size:14px;color:#333;line-height:1.5;">{explanation}</p>
{fix}
</div>"#,
        title = html_escape(&issue.title),
        explanation = html_escape(&issue.explanation),
    )
}

fn band_color(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "#2e7d32",
        ScoreBand::NeedsImprovement => "#e65100",
        ScoreBand::NeedsWork => "#c62828",
    }
}

#[must_use]
pub fn render_plaintext(header: &ReportHeader, report: &NarrativeReport) -> String {
    let mut out = String::new();
    let band = ScoreBand::from_score(header.overall_score);

    if let Some(name) = header.customer_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "Hi {name},\n");
    }
    let _ = writeln!(out, "WEBSITE AUDIT: {}", header.site_url);
    let _ = writeln!(out, "Overall score: {}/100 ({})", header.overall_score, band.label());
    let _ = writeln!(out, "Full report: {}", header.report_url);

    if !report.executive_summary.is_empty() {
        out.push_str("\nSUMMARY\n\n");
        for paragraph in &report.executive_summary {
            let _ = writeln!(out, "{}\n", paragraph.trim());
        }
    }

    if !report.top_actions.is_empty() {
        out.push_str("\nTOP ACTIONS\n\n");
        for (i, action) in report.top_actions.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, action.trim());
        }
    }

    for module in &report.modules {
        let _ = writeln!(out, "\n== {} ==\n", module.module_name);
        if !module.overview.trim().is_empty() {
            let _ = writeln!(out, "{}\n", module.overview.trim());
        }
        for issue in &module.issues {
            let severity = Severity::parse_lenient(&issue.severity);
            let _ = writeln!(
                out,
                "- [{}] {}",
                severity.as_str().to_ascii_uppercase(),
                issue.title.trim()
            );
            if !issue.explanation.trim().is_empty() {
                let _ = writeln!(out, "  {}", issue.explanation.trim());
            }
            if !issue.fix.trim().is_empty() {
                let _ = writeln!(out, "  How to fix: {}", issue.fix.trim());
            }
        }
    }

    out
}

pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use siteaudit_core::NarrativeModule;

    use super::*;

    fn header() -> ReportHeader {
        ReportHeader {
            site_url: "https://acme.example".to_string(),
            overall_score: 96,
            report_url: "https://reports.example/r/1?token=a&b".to_string(),
            customer_name: Some("Dana".to_string()),
        }
    }

    fn report() -> NarrativeReport {
        NarrativeReport {
            executive_summary: vec!["Your site is <strong>fast</strong>.".to_string()],
            top_actions: vec!["Add alt text".to_string(), "Enable HSTS".to_string()],
            modules: vec![NarrativeModule {
                module_name: "Security".to_string(),
                overview: "Mostly fine.".to_string(),
                issues: vec![NarrativeIssue {
                    title: "Missing HSTS".to_string(),
                    severity: "high".to_string(),
                    explanation: "Browsers may use plain HTTP.".to_string(),
                    fix: "Send Strict-Transport-Security.".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn html_escapes_generated_text() {
        let html = render_html(&header(), &report());
        assert!(html.contains("Your site is &lt;strong&gt;fast&lt;/strong&gt;."));
        assert!(!html.contains("<strong>fast</strong>"));
        assert!(html.contains("token=a&amp;b"));
    }

    #[test]
    fn html_has_header_modules_and_issues() {
        let html = render_html(&header(), &report());
        assert!(html.contains(">96<"));
        assert!(html.contains("Hi Dana,"));
        assert!(html.contains("<h3 style=\"font-size:16px;margin:0 0 8px;\">Security</h3>"));
        assert!(html.contains("Missing HSTS"));
        assert!(html.contains("<li style=\"margin-bottom:6px;\">Enable HSTS</li>"));
    }

    #[test]
    fn plaintext_layout_is_stable() {
        let text = render_plaintext(&header(), &report());
        let expected = [
            "Hi Dana,",
            "",
            "WEBSITE AUDIT: https://acme.example",
            "Overall score: 96/100 (good)",
            "Full report: https://reports.example/r/1?token=a&b",
            "",
            "SUMMARY",
            "",
            "Your site is <strong>fast</strong>.",
            "",
            "",
            "TOP ACTIONS",
            "",
            "1. Add alt text",
            "2. Enable HSTS",
            "",
            "== Security ==",
            "",
            "Mostly fine.",
            "",
            "- [HIGH] Missing HSTS",
            "  Browsers may use plain HTTP.",
            "  How to fix: Send Strict-Transport-Security.",
            "",
        ]
        .join("\n");
        assert_eq!(text, expected);
        assert_eq!(text, render_plaintext(&header(), &report()));
    }

    #[test]
    fn empty_report_still_renders_header() {
        let mut h = header();
        h.customer_name = None;
        let text = render_plaintext(&h, &NarrativeReport::default());
        assert!(text.starts_with("WEBSITE AUDIT: https://acme.example\n"));
        assert!(!render_html(&h, &NarrativeReport::default()).contains("Hi "));
    }
}
