use super::*;
use chrono::Utc;
use shared::domain::RecordId;

fn record() -> Record {
    Record {
        id: RecordId(4),
        nct_number: "NCT04567890".into(),
        title: "Effect of <b>bold</b> & brave dosing".into(),
        summary: "A randomized trial".into(),
        conditions: "Malaria".into(),
        interventions: "Drug: artesunate".into(),
        locations: "Accra".into(),
        countries: "Ghana".into(),
        secondary_countries: "Togo".into(),
        decision: None,
        label: None,
    }
}

fn counts() -> Counts {
    Counts {
        total: 10,
        decided: 4,
        included: 3,
        excluded: 1,
    }
}

#[test]
fn active_page_shows_one_based_heading_and_fields() {
    let html = render_page(
        &Snapshot::Active {
            record: record(),
            counts: counts(),
        },
        None,
    );
    assert!(html.contains("Study 5</h3>"));
    assert!(html.contains("<dt>NCT Number</dt><dd>NCT04567890</dd>"));
    assert!(html.contains("<dt>MCountries</dt><dd>Togo</dd>"));
    assert!(html.contains("<strong>Remaining Studies</strong><span>6</span>"));
    assert!(html.contains("name=\"id\" value=\"4\""));
    assert!(html.contains(">Next</button>"));
}

#[test]
fn record_text_is_escaped() {
    let html = render_page(
        &Snapshot::Active {
            record: record(),
            counts: counts(),
        },
        None,
    );
    assert!(html.contains("Effect of &lt;b&gt;bold&lt;/b&gt; &amp; brave dosing"));
    assert!(!html.contains("<b>bold</b>"));
}

#[test]
fn complete_page_shows_terminal_message_without_actions() {
    let mut done = counts();
    done.decided = 10;
    done.included = 6;
    done.excluded = 4;
    let html = render_page(&Snapshot::Complete { counts: done }, None);
    assert!(html.contains(COMPLETE_MESSAGE));
    assert!(!html.contains("action=\"/decide\""));
    assert!(!html.contains(">Next</button>"));
}

#[test]
fn export_control_is_always_rendered() {
    let active = render_page(
        &Snapshot::Active {
            record: record(),
            counts: counts(),
        },
        None,
    );
    let complete = render_page(&Snapshot::Complete { counts: counts() }, None);
    for html in [active, complete] {
        assert!(html.contains("action=\"/export\""));
        assert!(html.contains("<svg"));
    }
}

#[test]
fn export_notice_links_to_download() {
    let notice = Notice::Exported(ExportReport {
        path: "./screening_results.csv".into(),
        rows: 10,
        exported_at: Utc::now(),
    });
    let html = render_page(&Snapshot::Complete { counts: counts() }, Some(&notice));
    assert!(html.contains("Exported 10 studies"));
    assert!(html.contains("href=\"/export/download\""));
}

#[test]
fn failure_notice_is_rendered_escaped() {
    let html = render_page(
        &Snapshot::Active {
            record: record(),
            counts: counts(),
        },
        Some(&Notice::Failed("study <5> is already marked Include".into())),
    );
    assert!(html.contains("<div class=\"notice error\">study &lt;5&gt; is already marked Include</div>"));
}

#[test]
fn escape_covers_quotes() {
    assert_eq!(escape_html(r#"a "b" 'c'"#), "a &quot;b&quot; &#39;c&#39;");
}
