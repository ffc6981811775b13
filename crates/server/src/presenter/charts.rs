use shared::protocol::Counts;

const PIE_WIDTH: f64 = 400.0;
const PIE_HEIGHT: f64 = 340.0;
const PIE_RADIUS: f64 = 100.0;
const PIE_START_DEG: f64 = 140.0;
const PIE_EXPLODE: f64 = 0.1;

const BAR_WIDTH: f64 = 420.0;
const BAR_HEIGHT: f64 = 360.0;
const PLOT_LEFT: f64 = 70.0;
const PLOT_RIGHT: f64 = 400.0;
const PLOT_TOP: f64 = 50.0;
const PLOT_BOTTOM: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartEntry {
    pub label: &'static str,
    pub value: u64,
    pub color: &'static str,
}

pub fn pie_entries(counts: &Counts) -> [ChartEntry; 3] {
    [
        ChartEntry {
            label: "Included",
            value: counts.included,
            color: "green",
        },
        ChartEntry {
            label: "Excluded",
            value: counts.excluded,
            color: "red",
        },
        ChartEntry {
            label: "Undecided",
            value: counts.undecided(),
            color: "grey",
        },
    ]
}

pub fn bar_entries(counts: &Counts) -> [ChartEntry; 3] {
    [
        ChartEntry {
            label: "Total Studies",
            value: counts.total,
            color: "blue",
        },
        ChartEntry {
            label: "Screened Studies",
            value: counts.decided,
            color: "orange",
        },
        ChartEntry {
            label: "Remaining Studies",
            value: counts.remaining(),
            color: "green",
        },
    ]
}

/// Decision proportions, drawn counter-clockwise from 140 degrees with every
/// slice pulled out by a tenth of the radius.
pub fn pie_chart_svg(counts: &Counts) -> String {
    let entries = pie_entries(counts);
    let total: u64 = entries.iter().map(|e| e.value).sum();
    let (cx, cy) = (PIE_WIDTH / 2.0, PIE_HEIGHT / 2.0);

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="chart pie" viewBox="0 0 {PIE_WIDTH} {PIE_HEIGHT}" role="img" aria-label="Decision proportions">"#
    );

    if total == 0 {
        svg.push_str(&format!(
            r##"<circle cx="{cx}" cy="{cy}" r="{PIE_RADIUS}" fill="none" stroke="#999" stroke-dasharray="4 4"/><text x="{cx}" y="{cy}" text-anchor="middle">No studies</text></svg>"##
        ));
        return svg;
    }

    let visible: Vec<&ChartEntry> = entries.iter().filter(|e| e.value > 0).collect();
    let mut start = PIE_START_DEG;
    for entry in &visible {
        let fraction = entry.value as f64 / total as f64;
        let sweep = fraction * 360.0;
        let mid = start + sweep / 2.0;

        let (sx, sy) = if visible.len() == 1 {
            (cx, cy)
        } else {
            polar(cx, cy, PIE_RADIUS * PIE_EXPLODE, mid)
        };

        if visible.len() == 1 {
            svg.push_str(&format!(
                r#"<circle class="slice" cx="{sx:.2}" cy="{sy:.2}" r="{PIE_RADIUS}" fill="{}"/>"#,
                entry.color
            ));
        } else {
            let (x0, y0) = polar(sx, sy, PIE_RADIUS, start);
            let (x1, y1) = polar(sx, sy, PIE_RADIUS, start + sweep);
            let large_arc = u8::from(sweep > 180.0);
            svg.push_str(&format!(
                r#"<path class="slice" d="M {sx:.2} {sy:.2} L {x0:.2} {y0:.2} A {PIE_RADIUS} {PIE_RADIUS} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{}"/>"#,
                entry.color
            ));
        }

        let (lx, ly) = polar(sx, sy, PIE_RADIUS * 1.2, mid);
        let anchor = if mid.to_radians().cos() >= 0.0 {
            "start"
        } else {
            "end"
        };
        svg.push_str(&format!(
            r#"<text x="{lx:.2}" y="{ly:.2}" text-anchor="{anchor}">{}</text>"#,
            entry.label
        ));

        let (px, py) = polar(sx, sy, PIE_RADIUS * 0.6, mid);
        svg.push_str(&format!(
            r#"<text class="pct" x="{px:.2}" y="{py:.2}" text-anchor="middle">{}</text>"#,
            percent_label(fraction)
        ));

        start += sweep;
    }

    svg.push_str("</svg>");
    svg
}

pub fn bar_chart_svg(counts: &Counts) -> String {
    let entries = bar_entries(counts);
    let max = entries.iter().map(|e| e.value).max().unwrap_or(0).max(1) as f64;
    let plot_height = PLOT_BOTTOM - PLOT_TOP;
    let slot = (PLOT_RIGHT - PLOT_LEFT) / entries.len() as f64;
    let bar_width = slot * 0.6;

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" class="chart bar" viewBox="0 0 {BAR_WIDTH} {BAR_HEIGHT}" role="img" aria-label="Study statistics">"#
    );
    svg.push_str(&format!(
        r#"<text class="title" x="{:.2}" y="24" text-anchor="middle">Study Statistics</text>"#,
        (PLOT_LEFT + PLOT_RIGHT) / 2.0
    ));
    svg.push_str(&format!(
        r#"<line x1="{PLOT_LEFT}" y1="{PLOT_TOP}" x2="{PLOT_LEFT}" y2="{PLOT_BOTTOM}" stroke="black"/><line x1="{PLOT_LEFT}" y1="{PLOT_BOTTOM}" x2="{PLOT_RIGHT}" y2="{PLOT_BOTTOM}" stroke="black"/>"#
    ));
    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{PLOT_BOTTOM}" text-anchor="end">0</text><text x="{:.2}" y="{PLOT_TOP}" text-anchor="end">{}</text>"#,
        PLOT_LEFT - 6.0,
        PLOT_LEFT - 6.0,
        max as u64
    ));

    for (idx, entry) in entries.iter().enumerate() {
        let height = entry.value as f64 / max * plot_height;
        let center = PLOT_LEFT + slot * (idx as f64 + 0.5);
        let x = center - bar_width / 2.0;
        let y = PLOT_BOTTOM - height;
        svg.push_str(&format!(
            r#"<rect class="bar" x="{x:.2}" y="{y:.2}" width="{bar_width:.2}" height="{height:.2}" fill="{}"/>"#,
            entry.color
        ));
        svg.push_str(&format!(
            r#"<text class="value" x="{center:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            y - 4.0,
            entry.value
        ));
        let label_y = PLOT_BOTTOM + 16.0;
        svg.push_str(&format!(
            r#"<text x="{center:.2}" y="{label_y:.2}" text-anchor="end" transform="rotate(-30 {center:.2} {label_y:.2})">{}</text>"#,
            entry.label
        ));
    }

    svg.push_str(&format!(
        r#"<text x="{:.2}" y="{:.2}" text-anchor="middle">Categories</text>"#,
        (PLOT_LEFT + PLOT_RIGHT) / 2.0,
        BAR_HEIGHT - 8.0
    ));
    svg.push_str(&format!(
        r#"<text x="18" y="{:.2}" text-anchor="middle" transform="rotate(-90 18 {:.2})">Number of Studies</text>"#,
        (PLOT_TOP + PLOT_BOTTOM) / 2.0,
        (PLOT_TOP + PLOT_BOTTOM) / 2.0
    ));
    svg.push_str("</svg>");
    svg
}

pub fn percent_label(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

// Angles are counter-clockwise from +x; SVG y grows downwards.
fn polar(cx: f64, cy: f64, r: f64, deg: f64) -> (f64, f64) {
    let rad = deg.to_radians();
    (cx + r * rad.cos(), cy - r * rad.sin())
}
