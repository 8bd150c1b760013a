//! In-memory resume draft edited by the builder
//!
//! List entries are addressed by position; each carries a generated id but
//! has no other identity. Every mutation happens in place.

use crate::error::{CareerMateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Flat record inside one of the list sections
pub trait Entry: Default {
    const FIELDS: &'static [&'static str];

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn field(&self, name: &str) -> Option<&str>;
    fn field_mut(&mut self, name: &str) -> Option<&mut String>;

    fn blank() -> Self {
        let mut entry = Self::default();
        entry.set_id(new_id());
        entry
    }

    fn is_blank(&self) -> bool {
        Self::FIELDS
            .iter()
            .all(|name| self.field(name).map_or(true, |value| value.trim().is_empty()))
    }
}

macro_rules! entry_type {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub id: String,
            $(pub $field: String,)+
        }

        impl Entry for $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn id(&self) -> &str {
                &self.id
            }

            fn set_id(&mut self, id: String) {
                self.id = id;
            }

            fn field(&self, name: &str) -> Option<&str> {
                match name {
                    $(stringify!($field) => Some(&self.$field),)+
                    _ => None,
                }
            }

            fn field_mut(&mut self, name: &str) -> Option<&mut String> {
                match name {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }
        }
    };
}

entry_type!(Experience {
    title,
    company,
    location,
    start_date,
    end_date,
    description,
});

entry_type!(Education {
    degree,
    institution,
    location,
    graduation_date,
    description,
});

entry_type!(Certification { name, issuer, date, url });

entry_type!(Project {
    title,
    technologies,
    description,
    url,
});

entry_type!(Achievement { title, date, description });

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
}

impl Contact {
    pub const FIELDS: &'static [&'static str] = &["name", "email", "phone", "location", "linkedin"];

    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "email" => Some(&self.email),
            "phone" => Some(&self.phone),
            "location" => Some(&self.location),
            "linkedin" | "link" => Some(&self.linkedin),
            _ => None,
        }
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "name" => Some(&mut self.name),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "location" => Some(&mut self.location),
            "linkedin" | "link" => Some(&mut self.linkedin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Contact,
    Summary,
    Experience,
    Education,
    Certifications,
    Projects,
    Achievements,
    Skills,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Contact,
        Section::Summary,
        Section::Experience,
        Section::Education,
        Section::Certifications,
        Section::Projects,
        Section::Achievements,
        Section::Skills,
    ];

    /// Field name used in the serialized draft
    pub fn key(self) -> &'static str {
        match self {
            Section::Contact => "contact",
            Section::Summary => "summary",
            Section::Experience => "experience",
            Section::Education => "education",
            Section::Certifications => "certifications",
            Section::Projects => "projects",
            Section::Achievements => "achievements",
            Section::Skills => "skills",
        }
    }

    pub fn is_list(self) -> bool {
        !matches!(self, Section::Contact | Section::Summary)
    }

    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Section::Contact => Contact::FIELDS,
            Section::Experience => Experience::FIELDS,
            Section::Education => Education::FIELDS,
            Section::Certifications => Certification::FIELDS,
            Section::Projects => Project::FIELDS,
            Section::Achievements => Achievement::FIELDS,
            Section::Summary | Section::Skills => &[],
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Section {
    type Err = CareerMateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "contact" => Ok(Section::Contact),
            "summary" => Ok(Section::Summary),
            "experience" | "experiences" => Ok(Section::Experience),
            "education" | "educations" => Ok(Section::Education),
            "certification" | "certifications" => Ok(Section::Certifications),
            "project" | "projects" => Ok(Section::Projects),
            "achievement" | "achievements" => Ok(Section::Achievements),
            "skill" | "skills" => Ok(Section::Skills),
            other => Err(CareerMateError::InvalidInput(format!(
                "Unknown section: {}. Sections: {}",
                other,
                Section::ALL.map(Section::key).join(", ")
            ))),
        }
    }
}

/// `section[.index][.field]`, e.g. `experience.1.title`, `contact.email`, `summary`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub section: Section,
    pub index: usize,
    pub field: Option<String>,
}

impl FromStr for FieldPath {
    type Err = CareerMateError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split('.');
        let section: Section = parts.next().unwrap_or_default().parse()?;

        let mut index = None;
        let mut field = None;
        for part in parts {
            match part.parse::<usize>().ok() {
                Some(i) if index.is_none() && field.is_none() => index = Some(i),
                None if field.is_none() && !part.is_empty() => field = Some(part.to_string()),
                _ => {
                    return Err(CareerMateError::InvalidInput(format!("Invalid field path: {}", s)));
                }
            }
        }

        Ok(Self {
            section,
            index: index.unwrap_or(0),
            field,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeDraft {
    pub contact: Contact,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub projects: Vec<Project>,
    pub achievements: Vec<Achievement>,
    pub skills: Vec<String>,
}

impl ResumeDraft {
    /// Empty draft with one blank experience, education and project entry
    pub fn template() -> Self {
        Self {
            experience: vec![Experience::blank()],
            education: vec![Education::blank()],
            projects: vec![Project::blank()],
            ..Self::default()
        }
    }

    pub fn get_field(&self, section: Section, index: usize, field: &str) -> Result<String> {
        match section {
            Section::Contact => self
                .contact
                .field(field)
                .map(str::to_string)
                .ok_or_else(|| unknown_field(section, field)),
            Section::Summary => Ok(self.summary.clone()),
            Section::Skills => self
                .skills
                .get(index)
                .cloned()
                .ok_or_else(|| out_of_range(section, index, self.skills.len())),
            Section::Experience => entry_field(&self.experience, section, index, field),
            Section::Education => entry_field(&self.education, section, index, field),
            Section::Certifications => entry_field(&self.certifications, section, index, field),
            Section::Projects => entry_field(&self.projects, section, index, field),
            Section::Achievements => entry_field(&self.achievements, section, index, field),
        }
    }

    pub fn set_field(&mut self, section: Section, index: usize, field: &str, value: &str) -> Result<()> {
        let slot = match section {
            Section::Contact => self
                .contact
                .field_mut(field)
                .ok_or_else(|| unknown_field(section, field))?,
            Section::Summary => &mut self.summary,
            Section::Skills => {
                let len = self.skills.len();
                self.skills
                    .get_mut(index)
                    .ok_or_else(|| out_of_range(section, index, len))?
            }
            Section::Experience => entry_field_mut(&mut self.experience, section, index, field)?,
            Section::Education => entry_field_mut(&mut self.education, section, index, field)?,
            Section::Certifications => entry_field_mut(&mut self.certifications, section, index, field)?,
            Section::Projects => entry_field_mut(&mut self.projects, section, index, field)?,
            Section::Achievements => entry_field_mut(&mut self.achievements, section, index, field)?,
        };

        *slot = value.to_string();
        Ok(())
    }

    /// Appends a blank entry and returns its index
    pub fn add_entry(&mut self, section: Section) -> Result<usize> {
        let len = match section {
            Section::Experience => push_blank(&mut self.experience),
            Section::Education => push_blank(&mut self.education),
            Section::Certifications => push_blank(&mut self.certifications),
            Section::Projects => push_blank(&mut self.projects),
            Section::Achievements => push_blank(&mut self.achievements),
            Section::Contact | Section::Summary | Section::Skills => {
                return Err(CareerMateError::InvalidInput(format!(
                    "Cannot add a blank entry to {}",
                    section
                )));
            }
        };
        Ok(len - 1)
    }

    pub fn remove_entry(&mut self, section: Section, index: usize) -> Result<()> {
        match section {
            Section::Experience => remove_at(&mut self.experience, section, index),
            Section::Education => remove_at(&mut self.education, section, index),
            Section::Certifications => remove_at(&mut self.certifications, section, index),
            Section::Projects => remove_at(&mut self.projects, section, index),
            Section::Achievements => remove_at(&mut self.achievements, section, index),
            Section::Skills => remove_at(&mut self.skills, section, index),
            Section::Contact | Section::Summary => Err(CareerMateError::InvalidInput(format!(
                "{} is not a list section",
                section
            ))),
        }
    }

    pub fn section_len(&self, section: Section) -> Option<usize> {
        match section {
            Section::Experience => Some(self.experience.len()),
            Section::Education => Some(self.education.len()),
            Section::Certifications => Some(self.certifications.len()),
            Section::Projects => Some(self.projects.len()),
            Section::Achievements => Some(self.achievements.len()),
            Section::Skills => Some(self.skills.len()),
            Section::Contact | Section::Summary => None,
        }
    }

    /// Adds a trimmed, non-empty skill unless it is already listed
    pub fn add_skill(&mut self, skill: &str) -> bool {
        let skill = skill.trim();
        if skill.is_empty() || self.skills.iter().any(|s| s == skill) {
            return false;
        }
        self.skills.push(skill.to_string());
        true
    }

    /// Imported drafts never trust ids coming from outside
    pub fn assign_fresh_ids(&mut self) {
        fn refresh<E: Entry>(entries: &mut [E]) {
            entries.iter_mut().for_each(|entry| entry.set_id(new_id()));
        }

        refresh(&mut self.experience);
        refresh(&mut self.education);
        refresh(&mut self.certifications);
        refresh(&mut self.projects);
        refresh(&mut self.achievements);
    }

    /// JSON view of one section, used by the `show` command
    pub fn section_value(&self, section: Section) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        Ok(value
            .get_mut(section.key())
            .map(serde_json::Value::take)
            .unwrap_or(serde_json::Value::Null))
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn push_blank<E: Entry>(entries: &mut Vec<E>) -> usize {
    entries.push(E::blank());
    entries.len()
}

fn remove_at<T>(entries: &mut Vec<T>, section: Section, index: usize) -> Result<()> {
    if index >= entries.len() {
        return Err(out_of_range(section, index, entries.len()));
    }
    entries.remove(index);
    Ok(())
}

fn entry_field<E: Entry>(entries: &[E], section: Section, index: usize, field: &str) -> Result<String> {
    let entry = entries
        .get(index)
        .ok_or_else(|| out_of_range(section, index, entries.len()))?;
    entry
        .field(field)
        .map(str::to_string)
        .ok_or_else(|| unknown_field(section, field))
}

fn entry_field_mut<'a, E: Entry>(
    entries: &'a mut [E],
    section: Section,
    index: usize,
    field: &str,
) -> Result<&'a mut String> {
    let len = entries.len();
    let entry = entries
        .get_mut(index)
        .ok_or_else(|| out_of_range(section, index, len))?;
    entry
        .field_mut(field)
        .ok_or_else(|| unknown_field(section, field))
}

fn out_of_range(section: Section, index: usize, len: usize) -> CareerMateError {
    CareerMateError::InvalidInput(format!(
        "{} has {} entries; index {} is out of range",
        section, len, index
    ))
}

fn unknown_field(section: Section, field: &str) -> CareerMateError {
    CareerMateError::InvalidInput(format!(
        "Unknown field '{}' in {}. Fields: {}",
        field,
        section,
        section.fields().join(", ")
    ))
}
