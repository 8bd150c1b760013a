//! Markdown projection of a resume draft

use crate::processing::resume::{
    Achievement, Certification, Education, Entry, Experience, Project, ResumeDraft,
};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Renders the draft section by section, skipping sections with nothing to show.
/// The output depends only on the draft, so exporting twice gives identical text.
pub fn export_resume(draft: &ResumeDraft) -> String {
    let mut md = String::new();

    let name = draft.contact.name.trim();
    if !name.is_empty() {
        md.push_str(&format!("# {}\n\n", name));
    }

    let contact_details: Vec<String> = [
        ("📧", &draft.contact.email),
        ("📱", &draft.contact.phone),
        ("📍", &draft.contact.location),
        ("💼", &draft.contact.linkedin),
    ]
    .iter()
    .filter(|(_, value)| !value.trim().is_empty())
    .map(|(icon, value)| format!("{} {}", icon, value.trim()))
    .collect();

    if !contact_details.is_empty() {
        md.push_str(&contact_details.join(" | "));
        md.push_str("\n\n");
    }

    if !draft.summary.trim().is_empty() {
        md.push_str("## Professional Summary\n\n");
        md.push_str(&format!("{}\n\n", draft.summary.trim()));
    }

    section(&mut md, "Experience", &draft.experience, experience_shown, |md, exp| {
        md.push_str(&format!("### {} | {}\n", exp.title, exp.company));
        if has_any(&[&exp.location, &exp.start_date, &exp.end_date]) {
            md.push_str(&format!("{} | {} - {}\n\n", exp.location, exp.start_date, exp.end_date));
        }
        paragraph(md, &exp.description);
    });

    section(&mut md, "Education", &draft.education, education_shown, |md, edu| {
        md.push_str(&format!("### {} | {}\n", edu.degree, edu.institution));
        if has_any(&[&edu.location, &edu.graduation_date]) {
            md.push_str(&format!("{} | {}\n\n", edu.location, edu.graduation_date));
        }
        paragraph(md, &edu.description);
    });

    section(&mut md, "Certifications", &draft.certifications, certification_shown, |md, cert| {
        md.push_str(&format!("### {}\n", cert.name));
        if has_any(&[&cert.issuer, &cert.date]) {
            md.push_str(&format!("{} | {}\n\n", cert.issuer, cert.date));
        }
        labeled(md, "Credential", &cert.url);
    });

    let skills: Vec<&str> = draft
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        md.push_str("## Skills\n\n");
        md.push_str(&skills.join(", "));
        md.push_str("\n\n");
    }

    section(&mut md, "Projects", &draft.projects, project_shown, |md, proj| {
        md.push_str(&format!("### {}\n", proj.title));
        labeled(md, "Technologies", &proj.technologies);
        paragraph(md, &proj.description);
        labeled(md, "Link", &proj.url);
    });

    section(&mut md, "Achievements", &draft.achievements, achievement_shown, |md, ach| {
        md.push_str(&format!("### {}\n", ach.title));
        if !ach.date.trim().is_empty() {
            md.push_str(&format!("{}\n\n", ach.date));
        }
        paragraph(md, &ach.description);
    });

    md
}

/// `{Name_With_Underscores}_{YYYYmmdd_HHMMSS}.md`, or `my_resume_...` when unnamed
pub fn resume_filename<Tz: TimeZone>(draft: &ResumeDraft, timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let name = draft.contact.name.trim().replace(' ', "_");
    let name = if name.is_empty() { "my_resume".to_string() } else { name };
    format!("{}_{}.md", name, timestamp.format("%Y%m%d_%H%M%S"))
}

pub fn project_filename<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("project_idea_{}.md", timestamp.format("%Y%m%d_%H%M%S"))
}

fn section<E: Entry>(
    md: &mut String,
    heading: &str,
    entries: &[E],
    shown: fn(&E) -> bool,
    render: impl Fn(&mut String, &E),
) {
    if !entries.iter().any(shown) {
        return;
    }

    md.push_str(&format!("## {}\n\n", heading));
    for entry in entries.iter().filter(|e| shown(e)) {
        render(md, entry);
    }
}

fn experience_shown(exp: &Experience) -> bool {
    has_any(&[&exp.title, &exp.company])
}

fn education_shown(edu: &Education) -> bool {
    has_any(&[&edu.degree, &edu.institution])
}

fn certification_shown(cert: &Certification) -> bool {
    has_any(&[&cert.name])
}

fn project_shown(proj: &Project) -> bool {
    has_any(&[&proj.title])
}

fn achievement_shown(ach: &Achievement) -> bool {
    has_any(&[&ach.title])
}

fn has_any(values: &[&String]) -> bool {
    values.iter().any(|v| !v.trim().is_empty())
}

fn paragraph(md: &mut String, text: &str) {
    if !text.trim().is_empty() {
        md.push_str(&format!("{}\n\n", text.trim()));
    }
}

fn labeled(md: &mut String, label: &str, value: &str) {
    if !value.trim().is_empty() {
        md.push_str(&format!("**{}:** {}\n\n", label, value.trim()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::resume::Section;
    use chrono::Utc;

    fn sample_draft() -> ResumeDraft {
        let mut draft = ResumeDraft::template();
        draft.contact.name = "Jane Doe".to_string();
        draft.contact.email = "jane@example.com".to_string();
        draft.contact.linkedin = "linkedin.com/in/jane".to_string();
        draft.summary = "Backend engineer.".to_string();
        draft.experience[0].title = "Engineer".to_string();
        draft.experience[0].company = "Acme".to_string();
        draft.experience[0].start_date = "2020".to_string();
        draft.experience[0].end_date = "Present".to_string();
        draft.experience[0].description = "- Built APIs".to_string();
        draft.add_skill("Rust");
        draft.add_skill("SQL");
        draft
    }

    #[test]
    fn test_export_layout() {
        let md = export_resume(&sample_draft());

        assert!(md.starts_with("# Jane Doe\n\n📧 jane@example.com | 💼 linkedin.com/in/jane\n\n"));
        assert!(md.contains("## Professional Summary\n\nBackend engineer.\n\n"));
        assert!(md.contains("### Engineer | Acme\n | 2020 - Present\n\n- Built APIs\n\n"));
        assert!(md.contains("## Skills\n\nRust, SQL\n\n"));
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let md = export_resume(&sample_draft());
        // Template education and project entries are still blank
        assert!(!md.contains("## Education"));
        assert!(!md.contains("## Projects"));
        assert!(!md.contains("## Certifications"));
        assert!(!md.contains("## Achievements"));
    }

    #[test]
    fn test_empty_template_exports_nothing() {
        assert_eq!(export_resume(&ResumeDraft::template()), "");
    }

    #[test]
    fn test_export_is_idempotent() {
        let draft = sample_draft();
        assert_eq!(export_resume(&draft), export_resume(&draft));
    }

    #[test]
    fn test_optional_sections_render_when_filled() {
        let mut draft = sample_draft();
        let i = draft.add_entry(Section::Certifications).unwrap();
        draft.set_field(Section::Certifications, i, "name", "CKA").unwrap();
        draft.set_field(Section::Certifications, i, "issuer", "CNCF").unwrap();
        draft.set_field(Section::Projects, 0, "title", "Crawler").unwrap();
        draft.set_field(Section::Projects, 0, "url", "https://example.com").unwrap();

        let md = export_resume(&draft);
        assert!(md.contains("## Certifications\n\n### CKA\nCNCF | \n\n"));
        assert!(md.contains("## Projects\n\n### Crawler\n**Link:** https://example.com\n\n"));
        // Field order follows the document layout
        assert!(md.find("## Skills").unwrap() < md.find("## Projects").unwrap());
    }

    #[test]
    fn test_filenames() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(resume_filename(&sample_draft(), &ts), "Jane_Doe_20240305_140709.md");
        assert_eq!(resume_filename(&ResumeDraft::default(), &ts), "my_resume_20240305_140709.md");
        assert_eq!(project_filename(&ts), "project_idea_20240305_140709.md");
    }
}
