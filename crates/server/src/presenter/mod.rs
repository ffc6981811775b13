//! Server-side HTML for the screening page.
//!
//! Rendering is a pure function of a [`Snapshot`]; nothing here touches storage.

pub mod charts;

use shared::{
    domain::Record,
    protocol::{Counts, ExportReport, Snapshot},
};

pub const COMPLETE_MESSAGE: &str = "All studies have been screened.";

/// One-off message shown above the study after an action.
#[derive(Debug, Clone)]
pub enum Notice {
    Exported(ExportReport),
    Failed(String),
}

pub fn render_page(snapshot: &Snapshot, notice: Option<&Notice>) -> String {
    let counts = snapshot.counts();
    let mut body = String::new();

    if let Some(notice) = notice {
        body.push_str(&render_notice(notice));
    }

    match snapshot {
        Snapshot::Active { record, .. } => {
            body.push_str(&format!(
                "<h3 class=\"study-heading\">Study {}</h3>",
                record.id.display_number()
            ));
            body.push_str(&render_cards(&counts));
            body.push_str(&render_fields(record));
            body.push_str(&render_actions(record));
        }
        Snapshot::Complete { .. } => {
            body.push_str(&format!("<p class=\"complete\">{COMPLETE_MESSAGE}</p>"));
            body.push_str(&render_cards(&counts));
        }
    }

    body.push_str(&format!(
        "<section class=\"charts\"><div>{}</div><div>{}</div></section>",
        charts::pie_chart_svg(&counts),
        charts::bar_chart_svg(&counts)
    ));
    body.push_str(
        "<form method=\"post\" action=\"/export\" class=\"export\"><button type=\"submit\">Export Data</button></form>",
    );

    layout(&body)
}

pub fn render_error_page(message: &str) -> String {
    layout(&format!(
        "<div class=\"notice error\">{}</div><p><a href=\"/\">Back to screening</a></p>",
        escape_html(message)
    ))
}

fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Exported(report) => format!(
            "<div class=\"notice ok\">Exported {} studies to {}. Download the screened data <a href=\"/export/download\">here</a>.</div>",
            report.rows,
            escape_html(&report.path)
        ),
        Notice::Failed(message) => {
            format!("<div class=\"notice error\">{}</div>", escape_html(message))
        }
    }
}

fn render_cards(counts: &Counts) -> String {
    let cards = [
        ("Total Studies", counts.total),
        ("Screened Studies", counts.decided),
        ("Remaining Studies", counts.remaining()),
    ];
    let mut html = String::from("<section class=\"cards\">");
    for (label, value) in cards {
        html.push_str(&format!(
            "<div class=\"card\"><strong>{label}</strong><span>{value}</span></div>"
        ));
    }
    html.push_str("</section>");
    html
}

fn render_fields(record: &Record) -> String {
    let fields = [
        ("NCT Number", &record.nct_number),
        ("Study Title", &record.title),
        ("Brief Summary", &record.summary),
        ("Conditions", &record.conditions),
        ("Interventions", &record.interventions),
        ("Locations", &record.locations),
        ("Countries", &record.countries),
        ("MCountries", &record.secondary_countries),
    ];
    let mut html = String::from("<dl class=\"study\">");
    for (label, value) in fields {
        html.push_str(&format!(
            "<dt>{label}</dt><dd>{}</dd>",
            escape_html(value)
        ));
    }
    html.push_str("</dl>");
    html
}

fn render_actions(record: &Record) -> String {
    let id = record.id.0;
    format!(
        r#"<section class="actions">
<form method="post" action="/decide"><input type="hidden" name="id" value="{id}"><input type="hidden" name="decision" value="Include"><button type="submit" class="include">Include</button></form>
<form method="post" action="/decide"><input type="hidden" name="id" value="{id}"><input type="hidden" name="decision" value="Exclude"><button type="submit" class="exclude">Exclude</button></form>
<form method="post" action="/next"><button type="submit">Next</button></form>
</section>"#
    )
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Study Screening</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            max-width: 1100px;
            margin: 0 auto;
            padding: 20px;
            line-height: 1.5;
        }}
        .cards, .actions, .charts {{
            display: flex;
            gap: 16px;
            margin: 16px 0;
        }}
        .card {{
            flex: 1;
            border: 1px solid #ddd;
            border-radius: 6px;
            padding: 12px;
        }}
        .card span {{
            display: block;
            font-size: 24px;
        }}
        .charts > div {{
            flex: 1;
        }}
        dt {{
            font-weight: 600;
            margin-top: 8px;
        }}
        .notice {{
            padding: 10px;
            border-radius: 4px;
        }}
        .notice.ok {{
            background: #e6f4ea;
        }}
        .notice.error {{
            background: #fdecea;
        }}
        button {{
            padding: 8px 20px;
            font-weight: 600;
        }}
    </style>
</head>
<body>
    <h1>Study Screening</h1>
{body}
</body>
</html>"#
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
