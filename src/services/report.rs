// src/services/report.rs

//! Assessment reports rendered straight to PDF.
//!
//! Content is built as plain text sections from the stored assessment
//! snapshot, then laid out on A4 pages with the builtin Helvetica fonts.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use thiserror::Error;

use crate::engine::{DesignRecommendation, Dimensions};
use crate::models::Assessment;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.5;
const BODY_SIZE: f32 = 10.5;
const LINE_STEP: f32 = 5.5;
/// Characters per line at BODY_SIZE across the printable width.
const WRAP_COLUMNS: usize = 92;

pub const COMMENTARY_SYSTEM_PROMPT: &str = "Provide pragmatic, safe hydrology guidance.";
pub const GUIDE_SYSTEM_PROMPT: &str = "You are a senior hydrology engineer. Be precise and practical.";

pub const COMMENTARY_QUOTA_TEXT: &str = "AI commentary unavailable due to usage limits. Provide a brief summary manually: \
     include recharge potential, key risks (clogging/overflow/contamination), and 2-3 actionable improvements.";
pub const COMMENTARY_FAILED_TEXT: &str = "AI commentary unavailable.";
pub const GUIDE_QUOTA_TEXT: &str = "AI steps unavailable due to usage limits. Use the generic steps below.";
pub const GUIDE_FAILED_TEXT: &str = "AI steps unavailable.";
pub const GUIDE_NOT_CONFIGURED_TEXT: &str = "AI not configured. Use the generic steps below.";

pub const GENERIC_STEPS: [&str; 9] = [
    "Site marking",
    "Silt trap",
    "Excavation",
    "Filter media layering (coarse to fine)",
    "Recharge pit/trench construction",
    "Inlet/outlet protection",
    "First-flush diverter",
    "Signage",
    "O&M schedule including periodic desilting and water quality checks",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
}

impl Section {
    pub fn new(heading: impl Into<String>, lines: Vec<String>) -> Self {
        Self { heading: heading.into(), lines }
    }
}

/// Typed view of the stored snapshot; `None` if it no longer matches the
/// current result shape.
pub fn recommendation(a: &Assessment) -> Option<DesignRecommendation> {
    serde_json::from_value(a.results.clone()).ok()
}

/// A site is worth building for when it yields runoff and the sized
/// structure holds something.
pub fn is_feasible(a: &Assessment) -> bool {
    let runoff = a.results["runoff"]["annual_runoff_volume_liters"].as_f64().unwrap_or(0.0);
    let storage = a.results["structure"]["storage_volume_liters"].as_f64().unwrap_or(0.0);
    runoff > 0.0 && storage > 0.0
}

pub fn site_section(a: &Assessment) -> Section {
    let mut lines = vec![
        format!("Assessment #{} created {}", a.id, a.created_at.format("%Y-%m-%d %H:%M UTC")),
        format!("Location: {:.5}, {:.5}", a.latitude, a.longitude),
        format!("Rooftop area: {:.1} m2", a.rooftop_area_m2),
        format!("Open space: {:.1} m2", a.open_space_area_m2),
        format!("Dwellers: {}", a.num_dwellers),
    ];
    if !a.user_name.is_empty() {
        lines.insert(1, format!("Prepared for: {}", a.user_name));
    }
    if !a.location_desc.is_empty() {
        lines.push(format!("Site: {}", a.location_desc));
    }
    if let Some(p) = a.preferred_structure.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!("Preferred structure: {p}"));
    }
    Section::new("Site", lines)
}

pub fn recommendation_sections(a: &Assessment) -> Vec<Section> {
    let Some(rec) = recommendation(a) else {
        // Older snapshot layout: print the stored JSON as-is.
        let raw = serde_json::to_string_pretty(&a.results).unwrap_or_default();
        return vec![Section::new("Results", raw.lines().map(str::to_string).collect())];
    };

    let runoff = Section::new(
        "Runoff",
        vec![
            format!("Annual rainfall: {:.0} mm", rec.runoff.annual_rainfall_mm),
            format!("Runoff coefficient: {:.2}", rec.runoff.runoff_coefficient),
            format!("Annual runoff: {:.0} L", rec.runoff.annual_runoff_volume_liters),
        ],
    );

    let dims = match rec.structure.dimensions {
        Dimensions::Rectangular { length_m, breadth_m, depth_m } => {
            format!("Dimensions: {length_m} m x {breadth_m} m x {depth_m} m deep")
        }
        Dimensions::Circular { diameter_m, depth_m } => {
            format!("Dimensions: {diameter_m} m diameter x {depth_m} m deep")
        }
    };
    let structure = Section::new(
        "Recommended structure",
        vec![
            format!("Type: {}", rec.structure.structure_type),
            dims,
            format!("Effective storage: {:.0} L", rec.structure.effective_storage_liters),
            format!("Recharge potential: {:.0} L/year", rec.recharge_potential_liters),
            format!("Notes: {}", rec.structure.notes),
        ],
    );

    let cost = Section::new(
        "Cost and benefit",
        vec![
            format!("Capital cost: {:.0}", rec.cost.capex_currency),
            format!("Operating cost: {:.0} per year", rec.cost.opex_currency_per_year),
            format!("Water savings: {:.0} L per year", rec.cost.water_savings_liters_per_year),
            format!("Payback: {:.1} years", rec.cost.payback_years),
        ],
    );

    let aquifer = Section::new(
        "Aquifer",
        vec![
            format!("Type: {}", rec.aquifer.aquifer_type),
            format!("Groundwater depth: {:.1} m", rec.aquifer.gw_depth_m),
            format!("Transmissivity: {:.0} m2/day", rec.aquifer.transmissivity_m2_per_day),
            format!("Storativity: {:.3}", rec.aquifer.storativity),
        ],
    );

    vec![runoff, structure, cost, aquifer]
}

pub fn commentary_prompt(a: &Assessment) -> String {
    format!(
        "You are a civil/water engineer. Based on the following assessment JSON, write a concise \
         paragraph (120-180 words) summarizing recharge potential, risks, and 2-3 actionable \
         improvements.\n\nAssessment: {}",
        a.results
    )
}

pub fn guide_prompt(a: &Assessment) -> String {
    format!(
        "Create a clear, numbered step-by-step implementation guide (8-12 steps) for rooftop \
         rainwater harvesting and artificial recharge based on this assessment JSON. Include safety \
         and O&M notes. Keep steps short and actionable.\n\nAssessment: {}",
        a.results
    )
}

pub fn standard_report(a: &Assessment) -> Vec<Section> {
    let mut sections = vec![site_section(a)];
    sections.extend(recommendation_sections(a));
    sections
}

pub fn commentary_report(a: &Assessment, commentary: &str) -> Vec<Section> {
    let mut sections = standard_report(a);
    sections.push(Section::new("Engineer's commentary", vec![commentary.to_string()]));
    sections
}

/// `ai_steps` replaces the generic list when present; a short notice
/// (quota, not configured) is printed above the generic list instead.
pub fn guide_report(a: &Assessment, ai_steps: Option<&str>, notice: Option<&str>) -> Vec<Section> {
    let mut sections = vec![site_section(a)];
    if !is_feasible(a) {
        sections.push(Section::new(
            "Feasibility",
            vec!["Not feasible: the site yields no runoff or no usable storage.".to_string()],
        ));
        return sections;
    }
    sections.push(Section::new(
        "Feasibility",
        vec!["Feasible: runoff and storage are both positive.".to_string()],
    ));
    let steps = match ai_steps {
        Some(text) => text.lines().map(str::to_string).collect(),
        None => {
            let mut lines: Vec<String> = notice.map(str::to_string).into_iter().collect();
            lines.extend(GENERIC_STEPS.iter().enumerate().map(|(i, s)| format!("{}. {s}", i + 1)));
            lines
        }
    };
    sections.push(Section::new("Implementation steps", steps));
    sections
}

/// Builtin PDF fonts only cover WinAnsi; keep the text printable.
fn ascii(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '²' => '2',
            '–' | '—' => '-',
            '‘' | '’' => '\'',
            '“' | '”' => '"',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            out.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() || out.is_empty() {
        out.push(line);
    }
    out
}

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

pub fn render_pdf(title: &str, sections: &[Section]) -> Result<Vec<u8>, ReportError> {
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    let mut cursor = Cursor { layer: doc.get_page(page).get_layer(layer), y: PAGE_H - MARGIN };
    let mut write = |text: &str, size: f32, font: &IndirectFontRef, step: f32| {
        if cursor.y < MARGIN {
            let (p, l) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            cursor = Cursor { layer: doc.get_page(p).get_layer(l), y: PAGE_H - MARGIN };
        }
        cursor.layer.use_text(text, size, Mm(MARGIN), Mm(cursor.y), font);
        cursor.y -= step;
    };

    write(&ascii(title), TITLE_SIZE, &bold, LINE_STEP * 2.0);
    for section in sections {
        write(&ascii(&section.heading), HEADING_SIZE, &bold, LINE_STEP * 1.4);
        for line in &section.lines {
            for chunk in wrap(&ascii(line), WRAP_COLUMNS) {
                write(&chunk, BODY_SIZE, &regular, LINE_STEP);
            }
        }
        write("", BODY_SIZE, &regular, LINE_STEP);
    }

    doc.save_to_bytes().map_err(|e| ReportError::Pdf(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{compute_recommendation, EnvironmentalContext, SiteInput};
    use chrono::Utc;

    fn assessment(roof: f64) -> Assessment {
        let site = SiteInput {
            latitude: 12.97,
            longitude: 77.59,
            roof_area_m2: roof,
            open_space_area_m2: 10.0,
            occupants: 4,
            preferred_structure: None,
        };
        let rec = compute_recommendation(&site, &EnvironmentalContext::default()).unwrap();
        Assessment {
            id: 3,
            user_id: None,
            created_at: Utc::now(),
            user_name: "Ravi".into(),
            location_desc: "Whitefield".into(),
            latitude: 12.97,
            longitude: 77.59,
            num_dwellers: 4,
            rooftop_area_m2: roof,
            open_space_area_m2: 10.0,
            preferred_structure: None,
            results: serde_json::to_value(rec).unwrap(),
        }
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn strips_non_ascii() {
        assert_eq!(ascii("120 m² – ok"), "120 m2 - ok");
        assert_eq!(ascii("ℓ"), "?");
    }

    #[test]
    fn standard_report_reads_snapshot() {
        let a = assessment(100.0);
        let sections = standard_report(&a);
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, ["Site", "Runoff", "Recommended structure", "Cost and benefit", "Aquifer"]);
        assert!(sections[2].lines[0].ends_with("pit"));
    }

    #[test]
    fn unknown_snapshot_falls_back_to_raw_json() {
        let mut a = assessment(100.0);
        a.results = serde_json::json!({ "legacy": true });
        let sections = recommendation_sections(&a);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].lines.iter().any(|l| l.contains("legacy")));
    }

    #[test]
    fn guide_uses_generic_steps_without_llm() {
        let a = assessment(100.0);
        assert!(is_feasible(&a));
        let sections = guide_report(&a, None, Some(GUIDE_NOT_CONFIGURED_TEXT));
        let steps = &sections.last().unwrap().lines;
        assert_eq!(steps[0], GUIDE_NOT_CONFIGURED_TEXT);
        assert_eq!(steps.len(), GENERIC_STEPS.len() + 1);
    }

    #[test]
    fn zero_roof_is_not_feasible() {
        let a = assessment(0.0);
        assert!(!is_feasible(&a));
        let sections = guide_report(&a, Some("1. dig"), None);
        assert_eq!(sections.len(), 2);
    }

    #[test]
    fn renders_multi_page_pdf() {
        let a = assessment(250.0);
        let long = (0..120).map(|i| format!("line {i}")).collect();
        let mut sections = standard_report(&a);
        sections.push(Section::new("Appendix", long));
        let bytes = render_pdf("Assessment 3", &sections).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
