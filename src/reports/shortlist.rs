//! Client-facing shortlist PDF: project header, then one block per expert
//! the client is considering.

use std::io::BufWriter;

use chrono::NaiveDate;
use printpdf::*;
use rusqlite::Connection;
use uuid::Uuid;

use super::ReportError;
use crate::db;
use crate::models::*;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: f32 = 280.0;
const BOTTOM: f32 = 20.0;

#[derive(Debug, Clone)]
pub struct ShortlistEntry {
    pub name: String,
    pub headline: Option<String>,
    pub country: Option<String>,
    pub availability_note: Option<String>,
    pub answers: Vec<VqAnswer>,
}

#[derive(Debug, Clone)]
pub struct ShortlistDocument {
    pub project_name: String,
    pub client_name: Option<String>,
    pub generated_on: NaiveDate,
    pub experts: Vec<ShortlistEntry>,
}

/// An assignment belongs on the shortlist once it was shortlisted, accepted
/// by the client or picked for a call.
fn on_shortlist(pe: &ProjectExpert) -> bool {
    matches!(
        pe.pipeline_status,
        Some(PipelineStatus::Shortlisted) | Some(PipelineStatus::Accepted)
    ) || pe.status == ProjectExpertStatus::ClientSelected
}

fn headline(expert: &Expert) -> Option<String> {
    match (expert.job_title.as_deref(), expert.company.as_deref()) {
        (Some(title), Some(company)) => Some(format!("{title}, {company}")),
        (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
        (None, None) => None,
    }
}

pub fn load_shortlist(
    conn: &Connection,
    project_id: &Uuid,
    generated_on: NaiveDate,
) -> Result<ShortlistDocument, ReportError> {
    let project = db::require_project(conn, project_id)?;
    let client_name = match &project.client_organization_id {
        Some(id) => db::get_client_organization(conn, id)?.map(|c| c.name),
        None => None,
    };

    let assignments = db::list_project_experts(
        conn,
        &ProjectExpertFilter {
            project_id: Some(project.id),
            ..Default::default()
        },
    )?;

    let mut experts = Vec::new();
    for pe in assignments.into_iter().filter(on_shortlist) {
        let expert = db::require_expert(conn, &pe.expert_id)?;
        experts.push(ShortlistEntry {
            headline: headline(&expert),
            name: expert.name,
            country: expert.country,
            availability_note: pe.availability_note,
            answers: pe.vq_answers,
        });
    }

    Ok(ShortlistDocument {
        project_name: project.name,
        client_name,
        generated_on,
        experts,
    })
}

/// Writes lines top to bottom, starting a new page when the margin is hit.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
}

impl PageCursor<'_> {
    fn line(&mut self, text: &str, size: f32, indent: f32, font: &IndirectFontRef, advance: f32) {
        if self.y.0 < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(TOP);
        }
        self.layer.use_text(text, size, Mm(20.0 + indent), self.y, font);
        self.y -= Mm(advance);
    }

    fn wrapped(&mut self, text: &str, size: f32, indent: f32, font: &IndirectFontRef, width: usize) {
        for line in wrap_text(text, width) {
            self.line(&line, size, indent, font, 4.5);
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= Mm(mm);
    }
}

/// Renders the shortlist. Returns PDF bytes.
pub fn render_shortlist_pdf(shortlist: &ShortlistDocument) -> Result<Vec<u8>, ReportError> {
    let title = format!("Expert shortlist: {}", shortlist.project_name);
    let (doc, page1, layer1) = PdfDocument::new(&title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(format!("font: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(format!("font: {e}")))?;

    let mut cursor = PageCursor {
        layer: doc.get_page(page1).get_layer(layer1),
        doc: &doc,
        y: Mm(TOP),
    };

    cursor.line(&title, 14.0, 0.0, &bold, 7.0);
    if let Some(client) = &shortlist.client_name {
        cursor.line(&format!("Prepared for {client}"), 10.0, 0.0, &font, 5.0);
    }
    cursor.line(
        &format!("Generated {}", shortlist.generated_on.format("%Y-%m-%d")),
        9.0,
        0.0,
        &font,
        5.0,
    );
    cursor.gap(5.0);

    if shortlist.experts.is_empty() {
        cursor.line("No experts have been shortlisted yet.", 10.0, 0.0, &font, 5.0);
    }

    for (i, entry) in shortlist.experts.iter().enumerate() {
        cursor.line(&format!("{}. {}", i + 1, entry.name), 12.0, 0.0, &bold, 6.0);
        if let Some(headline) = &entry.headline {
            cursor.wrapped(headline, 9.0, 5.0, &font, 85);
        }
        if let Some(country) = &entry.country {
            cursor.line(&format!("Based in {country}"), 9.0, 5.0, &font, 4.5);
        }
        if let Some(note) = &entry.availability_note {
            cursor.wrapped(&format!("Availability: {note}"), 9.0, 5.0, &font, 85);
        }
        if !entry.answers.is_empty() {
            cursor.gap(1.5);
            cursor.line("Vetting answers", 10.0, 5.0, &bold, 5.0);
            for answer in &entry.answers {
                cursor.wrapped(&format!("Q: {}", answer.question), 9.0, 8.0, &bold, 80);
                cursor.wrapped(&format!("A: {}", answer.answer), 9.0, 8.0, &font, 80);
                cursor.gap(1.5);
            }
        }
        cursor.gap(5.0);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer: {e}")))
}

/// Download name for a project's shortlist.
pub fn shortlist_filename(project_name: &str) -> String {
    let slug: String = project_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "shortlist.pdf".into()
    } else {
        format!("shortlist-{slug}.pdf")
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 20).unwrap()
    }

    #[test]
    fn only_shortlisted_or_selected_experts_are_listed() {
        let conn = open_memory_database().unwrap();
        let project = fixtures::project(&conn, "Cobalt supply");
        let picked = fixtures::expert(&conn, "Picked", None);
        let waiting = fixtures::expert(&conn, "Waiting", None);

        let mut pe = fixtures::assignment(&conn, &project, &picked);
        pe.pipeline_status = Some(PipelineStatus::Shortlisted);
        pe.availability_note = Some("Mornings".into());
        db::save_project_expert(&conn, &pe).unwrap();
        fixtures::assignment(&conn, &project, &waiting);

        let doc = load_shortlist(&conn, &project.id, today()).unwrap();
        assert_eq!(doc.experts.len(), 1);
        assert_eq!(doc.experts[0].name, "Picked");
        assert_eq!(doc.experts[0].availability_note.as_deref(), Some("Mornings"));
    }

    #[test]
    fn renders_pdf_bytes_across_pages() {
        let answers = (0..40)
            .map(|i| VqAnswer {
                question_id: None,
                question: format!("Question {i} about the supply chain"),
                answer: "A fairly long answer that needs wrapping because it keeps going well past the width of a single printed line on the page".into(),
            })
            .collect();
        let doc = ShortlistDocument {
            project_name: "Cobalt supply".into(),
            client_name: Some("Acme Capital".into()),
            generated_on: today(),
            experts: vec![ShortlistEntry {
                name: "Marta Reis".into(),
                headline: Some("Head of Procurement, MinCo".into()),
                country: Some("Chile".into()),
                availability_note: Some("Weekdays".into()),
                answers,
            }],
        };

        let bytes = render_shortlist_pdf(&doc).unwrap();
        assert_eq!(&bytes[0..4], b"%PDF");
    }

    #[test]
    fn filename_is_slugged() {
        assert_eq!(shortlist_filename("Cobalt: Supply / 2025"), "shortlist-cobalt-supply-2025.pdf");
        assert_eq!(shortlist_filename("***"), "shortlist.pdf");
    }

    #[test]
    fn headline_joins_title_and_company() {
        let conn = open_memory_database().unwrap();
        let mut expert = fixtures::expert(&conn, "E", None);
        expert.job_title = Some("CFO".into());
        assert_eq!(headline(&expert).as_deref(), Some("CFO"));
        expert.company = Some("MinCo".into());
        assert_eq!(headline(&expert).as_deref(), Some("CFO, MinCo"));
    }
}
