use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Status of an application as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Sent,
    Complete,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 3] = [Self::Draft, Self::Sent, Self::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single uploaded file. A missing status on the wire means `draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl FileStatus {
    pub const ALL: [FileStatus; 4] = [Self::Draft, Self::Sent, Self::Accepted, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a document plays in a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    PassportApplication,
    OwnershipOrContract,
    BreedingOrCertificate,
    FoalIdentificationAct,
    GeneticCertificate,
    Media,
}

impl FileType {
    /// All types in the order the portal lays out its sections.
    pub const ALL: [FileType; 6] = [
        Self::PassportApplication,
        Self::OwnershipOrContract,
        Self::BreedingOrCertificate,
        Self::FoalIdentificationAct,
        Self::GeneticCertificate,
        Self::Media,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassportApplication => "passport_application",
            Self::OwnershipOrContract => "ownership_or_contract",
            Self::BreedingOrCertificate => "breeding_or_certificate",
            Self::FoalIdentificationAct => "foal_identification_act",
            Self::GeneticCertificate => "genetic_certificate",
            Self::Media => "media",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PassportApplication => "Passport application",
            Self::OwnershipOrContract => "Ownership document or contract",
            Self::BreedingOrCertificate => "Breeding record or certificate",
            Self::FoalIdentificationAct => "Foal identification act",
            Self::GeneticCertificate => "Genetic certificate",
            Self::Media => "Photos and video",
        }
    }

    /// Single-slot types allow at most one non-rejected file per application.
    pub fn is_single_slot(&self) -> bool {
        matches!(
            self,
            Self::PassportApplication
                | Self::BreedingOrCertificate
                | Self::FoalIdentificationAct
                | Self::GeneticCertificate
        )
    }

    /// Values accepted for the `choice` field, empty for types without one.
    pub fn choices(&self) -> &'static [&'static str] {
        match self {
            Self::OwnershipOrContract => &["ownership", "contract"],
            Self::BreedingOrCertificate => &["breeding", "certificate"],
            _ => &[],
        }
    }

    /// Key prefix under which the portal remembers the selected choice.
    pub fn choice_store_prefix(&self) -> Option<&'static str> {
        match self {
            Self::OwnershipOrContract => Some("ownership_select"),
            Self::BreedingOrCertificate => Some("breeding_select"),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An application record. Listing rows use the same shape with the
/// detail-only fields left at their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub horse_name_ru: Option<String>,
    #[serde(default)]
    pub horse_name_en: Option<String>,
    #[serde(default)]
    pub horse_year: i32,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub mare_ownership_confirmed: bool,
    #[serde(default)]
    pub genetic_done_through_association: bool,
    #[serde(default)]
    pub genetic_pending: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

impl Application {
    fn trimmed(name: &Option<String>) -> &str {
        name.as_deref().map(str::trim).unwrap_or("")
    }

    /// Name as the portal shows it: both names joined, or whichever is set.
    pub fn display_name(&self) -> String {
        let ru = Self::trimmed(&self.horse_name_ru);
        let en = Self::trimmed(&self.horse_name_en);
        match (ru.is_empty(), en.is_empty()) {
            (false, false) => format!("{} / {}", ru, en),
            (false, true) => ru.to_string(),
            (true, false) => en.to_string(),
            (true, true) => UNNAMED.to_string(),
        }
    }

    /// Name as the console shows it: the Russian name, falling back to English.
    pub fn short_name(&self) -> String {
        let ru = Self::trimmed(&self.horse_name_ru);
        let en = Self::trimmed(&self.horse_name_en);
        if !ru.is_empty() {
            ru.to_string()
        } else if !en.is_empty() {
            en.to_string()
        } else {
            UNNAMED.to_string()
        }
    }

    pub fn year_text(&self) -> String {
        if self.horse_year > 0 {
            self.horse_year.to_string()
        } else {
            String::new()
        }
    }
}

pub const UNNAMED: &str = "Unnamed";

/// A file attached to an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub application_id: String,
    pub file_type: FileType,
    pub original_name: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default)]
    pub choice: Option<String>,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Read model returned by `GET /applications/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDetail {
    pub application: Application,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<FileRecord>,
}

impl ApplicationDetail {
    pub fn files_of_type(&self, file_type: FileType) -> impl Iterator<Item = &FileRecord> {
        self.files.iter().filter(move |f| f.file_type == file_type)
    }

    pub fn file(&self, file_id: &str) -> Option<&FileRecord> {
        self.files.iter().find(|f| f.id == file_id)
    }
}

/// The backend encodes empty lists as `null`.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Horse identity as typed by the submitter, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HorseIdentity {
    pub name_ru: String,
    pub name_en: String,
    pub year: Option<i32>,
}

impl HorseIdentity {
    pub fn new(name_ru: impl Into<String>, name_en: impl Into<String>, year: Option<i32>) -> Self {
        Self {
            name_ru: name_ru.into(),
            name_en: name_en.into(),
            year,
        }
    }

    pub fn from_application(app: &Application) -> Self {
        Self {
            name_ru: app.horse_name_ru.clone().unwrap_or_default(),
            name_en: app.horse_name_en.clone().unwrap_or_default(),
            year: (app.horse_year > 0).then_some(app.horse_year),
        }
    }

    fn non_empty(name: &str) -> Option<String> {
        let trimmed = name.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn ru(&self) -> Option<String> {
        Self::non_empty(&self.name_ru)
    }

    pub fn en(&self) -> Option<String> {
        Self::non_empty(&self.name_en)
    }
}

/// Body of `POST /applications`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewApplication {
    pub horse_name_ru: Option<String>,
    pub horse_name_en: Option<String>,
    pub horse_year: i32,
    pub notes: String,
}

/// Body of the best-effort `PATCH /applications/{id}` sent before submitting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityUpdate {
    pub horse_name_ru: Option<String>,
    pub horse_name_en: Option<String>,
    pub horse_year: i32,
}

/// A local file to attach to an application.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub path: PathBuf,
    pub file_type: FileType,
    pub choice: Option<String>,
}
