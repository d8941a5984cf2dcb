//! Applicant portal session.
//!
//! All state the portal needs lives in [`PortalApp`]: the search results,
//! the working copy of the open application and the last snapshot the
//! backend confirmed. Permissions are always computed from that snapshot.

use super::in_flight::{Action, InFlight};
use super::state::{ActionError, TextInput};
use crate::domain::{
    check_delete, check_edit_metadata, check_submit, check_upload, current_year, parse_year,
    validate_identity, validate_upload, Application, ApplicationDetail, ApplicationStatus,
    FileRecord, FileType, FileUpload, HorseIdentity, IdentityUpdate, NewApplication, Permissions,
};
use crate::infrastructure::{selection_key, ApiError, ApplicationService, SideStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Splits several paths typed into one media or document prompt.
pub const UPLOAD_PATH_SEPARATOR: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalScreen {
    Search,
    Application,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalMode {
    /// Navigation; shortcuts available
    Normal,
    /// Typing a search query
    Searching,
    /// Typing into one identity field
    Editing(IdentityField),
    /// Typing the path of a file to attach
    UploadPath(FileType),
    /// Waiting for y/n before deleting a file
    ConfirmDelete(String),
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    NameRu,
    NameEn,
    Year,
}

impl IdentityField {
    pub const ALL: [IdentityField; 3] = [Self::NameRu, Self::NameEn, Self::Year];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NameRu => "Name (Russian)",
            Self::NameEn => "Name (English)",
            Self::Year => "Year of birth",
        }
    }
}

/// One navigable line of the application screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormRow {
    Field(IdentityField),
    Section(FileType),
    File { file_type: FileType, file_id: String },
}

/// Working copy of the application open on the portal.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    /// `None` until the backend has created the application
    pub application_id: Option<String>,
    /// Last state confirmed by the backend
    pub snapshot: Option<ApplicationDetail>,
    pub name_ru: String,
    pub name_en: String,
    pub year: String,
    /// Selected index into [`FileType::choices`] per choice-bearing type
    choices: HashMap<FileType, usize>,
    /// Index into [`ApplicationForm::rows`]
    pub cursor: usize,
}

impl ApplicationForm {
    pub fn from_detail(detail: ApplicationDetail) -> Self {
        let app = &detail.application;
        Self {
            application_id: Some(app.id.clone()),
            name_ru: app.horse_name_ru.clone().unwrap_or_default(),
            name_en: app.horse_name_en.clone().unwrap_or_default(),
            year: app.year_text(),
            snapshot: Some(detail),
            ..Self::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.application_id.is_none()
    }

    pub fn identity(&self) -> HorseIdentity {
        HorseIdentity::new(self.name_ru.clone(), self.name_en.clone(), parse_year(&self.year))
    }

    pub fn status(&self) -> ApplicationStatus {
        self.snapshot
            .as_ref()
            .map(|d| d.application.status)
            .unwrap_or_default()
    }

    pub fn files(&self) -> &[FileRecord] {
        self.snapshot.as_ref().map(|d| d.files.as_slice()).unwrap_or(&[])
    }

    pub fn file(&self, file_id: &str) -> Option<&FileRecord> {
        self.snapshot.as_ref().and_then(|d| d.file(file_id))
    }

    pub fn field(&self, field: IdentityField) -> &str {
        match field {
            IdentityField::NameRu => &self.name_ru,
            IdentityField::NameEn => &self.name_en,
            IdentityField::Year => &self.year,
        }
    }

    pub fn set_field(&mut self, field: IdentityField, value: String) {
        match field {
            IdentityField::NameRu => self.name_ru = value,
            IdentityField::NameEn => self.name_en = value,
            IdentityField::Year => self.year = value,
        }
    }

    pub fn choice(&self, file_type: FileType) -> Option<&'static str> {
        let options = file_type.choices();
        if options.is_empty() {
            return None;
        }
        let index = self.choices.get(&file_type).copied().unwrap_or(0);
        options.get(index).copied()
    }

    /// Selects `value` if it is one of the type's choices.
    pub fn set_choice(&mut self, file_type: FileType, value: &str) -> bool {
        match file_type.choices().iter().position(|c| *c == value) {
            Some(index) => {
                self.choices.insert(file_type, index);
                true
            }
            None => false,
        }
    }

    pub fn cycle_choice(&mut self, file_type: FileType) -> Option<&'static str> {
        let count = file_type.choices().len();
        if count == 0 {
            return None;
        }
        let next = (self.choices.get(&file_type).copied().unwrap_or(0) + 1) % count;
        self.choices.insert(file_type, next);
        self.choice(file_type)
    }

    pub fn rows(&self) -> Vec<FormRow> {
        let mut rows: Vec<FormRow> = IdentityField::ALL.iter().map(|&f| FormRow::Field(f)).collect();
        for file_type in FileType::ALL {
            rows.push(FormRow::Section(file_type));
            if let Some(detail) = &self.snapshot {
                rows.extend(detail.files_of_type(file_type).map(|file| FormRow::File {
                    file_type,
                    file_id: file.id.clone(),
                }));
            }
        }
        rows
    }

    pub fn current_row(&self) -> Option<FormRow> {
        self.rows().get(self.cursor).cloned()
    }

    fn clamp_cursor(&mut self) {
        let last = self.rows().len().saturating_sub(1);
        self.cursor = self.cursor.min(last);
    }
}

pub struct PortalApp<S: ApplicationService> {
    service: S,
    store: Box<dyn SideStore>,
    in_flight: InFlight,
    current_year: i32,
    pub screen: PortalScreen,
    pub mode: PortalMode,
    /// Buffer for whichever prompt is open
    pub input: TextInput,
    pub search_query: String,
    pub results: Vec<Application>,
    pub selected_result: usize,
    pub form: ApplicationForm,
    pub status_message: Option<String>,
    pub help_scroll: usize,
}

impl<S: ApplicationService> PortalApp<S> {
    pub fn new(service: S, store: Box<dyn SideStore>) -> Self {
        Self {
            service,
            store,
            in_flight: InFlight::default(),
            current_year: current_year(),
            screen: PortalScreen::Search,
            mode: PortalMode::Normal,
            input: TextInput::default(),
            search_query: String::new(),
            results: Vec::new(),
            selected_result: 0,
            form: ApplicationForm::default(),
            status_message: None,
            help_scroll: 0,
        }
    }

    /// Pins the calendar year used for the birth-year bound.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::compute(
            self.form.status(),
            self.form.files(),
            &self.form.identity(),
            self.current_year,
        )
    }

    pub fn can_delete(&self, file: &FileRecord) -> bool {
        check_delete(self.form.status(), file).is_ok()
    }

    pub fn is_busy(&self, action: &Action) -> bool {
        self.in_flight.is_busy(action)
    }

    fn run<T>(&mut self, action: Action, f: impl FnOnce(&mut Self) -> Result<T, ActionError>) -> Result<T, ActionError> {
        if !self.in_flight.begin(&action) {
            return Err(ActionError::Busy(action));
        }
        let result = f(self);
        self.in_flight.finish(&action);
        if let Err(e) = &result {
            tracing::warn!(action = %action, error = %e, "portal action failed");
        }
        result
    }

    // --- search screen ---

    pub fn start_search(&mut self) {
        self.mode = PortalMode::Searching;
        self.input = TextInput::with_text(self.search_query.clone());
        self.status_message = None;
    }

    pub fn finish_search(&mut self) -> Result<(), ActionError> {
        self.search_query = self.input.take();
        self.mode = PortalMode::Normal;
        self.search()
    }

    pub fn cancel_prompt(&mut self) {
        self.mode = PortalMode::Normal;
        self.input.clear();
    }

    /// Lists applications matching the current query; an empty query lists all.
    pub fn search(&mut self) -> Result<(), ActionError> {
        self.run(Action::Search, |app| app.search_inner())
    }

    fn search_inner(&mut self) -> Result<(), ActionError> {
        let results = self.service.search_applications(&self.search_query)?;
        self.status_message = Some(if results.is_empty() {
            "No applications found".to_string()
        } else {
            format!("{} application(s)", results.len())
        });
        self.results = results;
        self.selected_result = 0;
        Ok(())
    }

    pub fn select_next_result(&mut self) {
        if self.selected_result + 1 < self.results.len() {
            self.selected_result += 1;
        }
    }

    pub fn select_previous_result(&mut self) {
        self.selected_result = self.selected_result.saturating_sub(1);
    }

    pub fn open_selected(&mut self) -> Result<(), ActionError> {
        let id = self
            .results
            .get(self.selected_result)
            .map(|a| a.id.clone())
            .ok_or(ActionError::NothingSelected)?;
        self.open(&id)
    }

    // --- application screen ---

    pub fn open(&mut self, id: &str) -> Result<(), ActionError> {
        self.run(Action::Load, |app| {
            let detail = app.service.get_application(id)?;
            tracing::debug!(application_id = id, files = detail.files.len(), "application loaded");
            app.form = ApplicationForm::from_detail(detail);
            app.restore_selections();
            app.screen = PortalScreen::Application;
            app.mode = PortalMode::Normal;
            app.status_message = None;
            Ok(())
        })
    }

    pub fn new_application(&mut self) {
        self.form = ApplicationForm::default();
        self.screen = PortalScreen::Application;
        self.mode = PortalMode::Normal;
        self.status_message = None;
    }

    pub fn back_to_search(&mut self) {
        self.screen = PortalScreen::Search;
        self.mode = PortalMode::Normal;
    }

    pub fn refresh(&mut self) -> Result<(), ActionError> {
        self.run(Action::Refresh, |app| app.reload_snapshot())
    }

    fn reload_snapshot(&mut self) -> Result<(), ActionError> {
        let Some(id) = self.form.application_id.clone() else {
            return Ok(());
        };
        let detail = self.service.get_application(&id)?;
        self.form.snapshot = Some(detail);
        self.form.clamp_cursor();
        Ok(())
    }

    pub fn move_cursor_down(&mut self) {
        if self.form.cursor + 1 < self.form.rows().len() {
            self.form.cursor += 1;
        }
    }

    pub fn move_cursor_up(&mut self) {
        self.form.cursor = self.form.cursor.saturating_sub(1);
    }

    /// Enter on the current row: edit a field, attach to a section, or delete a file.
    pub fn activate_current_row(&mut self) -> Result<(), ActionError> {
        match self.form.current_row() {
            Some(FormRow::Field(field)) => self.start_editing(field),
            Some(FormRow::Section(file_type)) => self.start_upload(file_type),
            Some(FormRow::File { file_id, .. }) => self.start_delete(&file_id),
            None => Err(ActionError::NothingSelected),
        }
    }

    pub fn start_editing(&mut self, field: IdentityField) -> Result<(), ActionError> {
        check_edit_metadata(self.form.status(), self.form.files())?;
        self.input = TextInput::with_text(self.form.field(field));
        self.mode = PortalMode::Editing(field);
        self.status_message = None;
        Ok(())
    }

    pub fn finish_editing(&mut self) {
        if let PortalMode::Editing(field) = self.mode {
            let value = self.input.take();
            self.form.set_field(field, value);
        }
        self.mode = PortalMode::Normal;
    }

    pub fn cycle_choice(&mut self, file_type: FileType) {
        if let Some(choice) = self.form.cycle_choice(file_type) {
            self.status_message = Some(format!("{}: {}", file_type.label(), choice));
            self.save_selections();
        }
    }

    fn restore_selections(&mut self) {
        let Some(id) = self.form.application_id.clone() else {
            return;
        };
        for file_type in FileType::ALL {
            if let Some(value) = selection_key(file_type, &id).and_then(|key| self.store.get(&key)) {
                self.form.set_choice(file_type, &value);
            }
        }
    }

    fn save_selections(&mut self) {
        let Some(id) = self.form.application_id.clone() else {
            return;
        };
        for file_type in FileType::ALL {
            let (Some(key), Some(choice)) = (selection_key(file_type, &id), self.form.choice(file_type)) else {
                continue;
            };
            if let Err(e) = self.store.set(&key, choice) {
                tracing::warn!(key = %key, error = %e, "could not remember selection");
            }
        }
    }

    /// Creates the application on first use from the typed identity.
    fn ensure_application_exists(&mut self) -> Result<String, ActionError> {
        if let Some(id) = &self.form.application_id {
            return Ok(id.clone());
        }
        let identity = self.form.identity();
        validate_identity(&identity, self.current_year)?;
        let new = NewApplication {
            horse_name_ru: identity.ru(),
            horse_name_en: identity.en(),
            horse_year: identity.year.unwrap_or_default(),
            notes: String::new(),
        };
        let created = self.service.create_application(&new)?;
        let id = created.id.clone();
        self.form.application_id = Some(id.clone());
        self.form.snapshot = Some(ApplicationDetail {
            application: created,
            files: Vec::new(),
        });
        self.save_selections();
        Ok(id)
    }

    // --- upload ---

    pub fn start_upload(&mut self, file_type: FileType) -> Result<(), ActionError> {
        check_upload(self.form.status(), self.form.files(), file_type)?;
        self.input.clear();
        self.mode = PortalMode::UploadPath(file_type);
        self.status_message = None;
        Ok(())
    }

    pub fn finish_upload(&mut self) -> Result<(), ActionError> {
        let PortalMode::UploadPath(file_type) = self.mode else {
            return Ok(());
        };
        let line = self.input.take();
        self.mode = PortalMode::Normal;
        if file_type.is_single_slot() {
            return self.upload(file_type, Path::new(line.trim()));
        }
        let paths: Vec<PathBuf> = line
            .split(UPLOAD_PATH_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect();
        match paths.as_slice() {
            [] => self.upload(file_type, Path::new("")),
            [path] => self.upload(file_type, path),
            _ => self.upload_many(file_type, &paths),
        }
    }

    /// Attaches a local file, creating the application first when it is new.
    pub fn upload(&mut self, file_type: FileType, path: &Path) -> Result<(), ActionError> {
        self.run(Action::Upload(file_type), |app| app.upload_inner(file_type, path))
    }

    /// Attaches several files to a multi-file section in order, stopping at
    /// the first one that fails.
    pub fn upload_many(&mut self, file_type: FileType, paths: &[PathBuf]) -> Result<(), ActionError> {
        self.run(Action::Upload(file_type), |app| {
            for path in paths {
                app.upload_inner(file_type, path)?;
            }
            app.status_message = Some(format!("Uploaded {} files", paths.len()));
            Ok(())
        })
    }

    fn upload_inner(&mut self, file_type: FileType, path: &Path) -> Result<(), ActionError> {
        check_upload(self.form.status(), self.form.files(), file_type)?;

        let unreadable = |source| ActionError::UnreadableFile {
            path: path.display().to_string(),
            source,
        };
        let metadata = std::fs::metadata(path).map_err(unreadable)?;
        if !metadata.is_file() {
            return Err(unreadable(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        validate_upload(&file_name, metadata.len())?;

        let was_new = self.form.is_new();
        let application_id = self.ensure_application_exists()?;
        let upload = FileUpload {
            path: path.to_path_buf(),
            file_type,
            choice: self.form.choice(file_type).map(str::to_string),
        };

        if let Err(e) = self.service.upload_file(&application_id, &upload) {
            if was_new {
                // the application itself was created, show it
                let _ = self.reload_snapshot();
            }
            return Err(e.into());
        }

        self.reload_snapshot()?;
        self.status_message = Some(format!("Uploaded {}", file_name));
        Ok(())
    }

    // --- delete ---

    pub fn start_delete(&mut self, file_id: &str) -> Result<(), ActionError> {
        let file = self
            .form
            .file(file_id)
            .ok_or_else(|| ActionError::UnknownFile(file_id.to_string()))?;
        check_delete(self.form.status(), file)?;
        self.status_message = Some(format!("Delete {}? (y/n)", file.original_name));
        self.mode = PortalMode::ConfirmDelete(file_id.to_string());
        Ok(())
    }

    pub fn confirm_delete(&mut self) -> Result<(), ActionError> {
        let PortalMode::ConfirmDelete(file_id) = std::mem::replace(&mut self.mode, PortalMode::Normal) else {
            return Ok(());
        };
        self.status_message = None;
        self.delete(&file_id)
    }

    pub fn delete(&mut self, file_id: &str) -> Result<(), ActionError> {
        self.run(Action::Delete(file_id.to_string()), |app| {
            let file = app
                .form
                .file(file_id)
                .ok_or_else(|| ActionError::UnknownFile(file_id.to_string()))?;
            check_delete(app.form.status(), file)?;
            let name = file.original_name.clone();
            app.service.delete_file(file_id)?;
            app.reload_snapshot()?;
            app.status_message = Some(format!("Deleted {}", name));
            Ok(())
        })
    }

    // --- submit ---

    /// Sends the application. On success the portal returns to the search screen.
    pub fn submit(&mut self) -> Result<(), ActionError> {
        self.run(Action::Submit, |app| app.submit_inner())
    }

    fn submit_inner(&mut self) -> Result<(), ActionError> {
        let identity = self.form.identity();
        check_submit(&identity, self.form.status(), self.current_year)?;

        let was_new = self.form.is_new();
        let mut warning = None;
        let id = match self.form.application_id.clone() {
            None => self.ensure_application_exists()?,
            Some(id) => {
                if check_edit_metadata(self.form.status(), self.form.files()).is_ok() {
                    warning = self.push_identity(&id, &identity);
                }
                id
            }
        };
        self.save_selections();

        if let Err(e) = self.service.submit_application(&id) {
            if was_new {
                let _ = self.reload_snapshot();
            }
            return Err(e.into());
        }
        tracing::info!(application_id = %id, "application submitted");

        self.form = ApplicationForm::default();
        self.screen = PortalScreen::Search;
        self.mode = PortalMode::Normal;
        if let Err(e) = self.search_inner() {
            tracing::warn!(error = %e, "listing refresh after submit failed");
        }
        self.status_message = Some(match warning {
            Some(w) => format!("Application submitted (warning: {})", w),
            None => "Application submitted".to_string(),
        });
        Ok(())
    }

    /// Best-effort identity update; returns a warning worth showing, if any.
    fn push_identity(&mut self, id: &str, identity: &HorseIdentity) -> Option<String> {
        let update = IdentityUpdate {
            horse_name_ru: identity.ru(),
            horse_name_en: identity.en(),
            horse_year: identity.year.unwrap_or_default(),
        };
        match self.service.update_identity(id, &update) {
            Ok(()) => None,
            Err(ApiError::Unauthorized) => {
                tracing::debug!(application_id = id, "identity update not permitted, skipped");
                None
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(application_id = id, "identity update not supported, skipped");
                None
            }
            Err(e) => {
                tracing::warn!(application_id = id, error = %e, "identity update failed");
                Some(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake::{FailingSideStore, FakeService};
    use crate::domain::{DomainError, FileStatus};
    use crate::infrastructure::MemorySideStore;
    use std::io::Write;

    fn portal() -> PortalApp<FakeService> {
        PortalApp::new(FakeService::default(), Box::new(MemorySideStore::default())).with_current_year(2026)
    }

    fn temp_file(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        (dir, path)
    }

    #[test]
    fn test_search_lists_and_filters() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.search().unwrap();
        assert_eq!(app.results.len(), 1);

        app.start_search();
        app.input.insert('x');
        app.finish_search().unwrap();
        assert!(app.results.is_empty());
        assert_eq!(app.status_message.as_deref(), Some("No applications found"));
    }

    #[test]
    fn test_failed_search_keeps_previous_results() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.search().unwrap();
        app.service.backend().failing.push("search");
        assert!(matches!(app.search(), Err(ActionError::Remote(_))));
        assert_eq!(app.results.len(), 1);
    }

    #[test]
    fn test_upload_creates_application_then_refreshes() {
        let mut app = portal();
        app.new_application();
        app.form.name_en = "Starlight".to_string();
        app.form.year = "2005".to_string();
        let (_dir, path) = temp_file("passport.pdf");

        app.upload(FileType::PassportApplication, &path).unwrap();

        assert_eq!(app.form.application_id.as_deref(), Some("app-1"));
        assert_eq!(app.form.files().len(), 1);
        assert_eq!(app.form.files()[0].original_name, "passport.pdf");
        assert_eq!(app.service.backend().count_calls("get:"), 1);
        assert!(!app.permissions().upload(FileType::PassportApplication));
    }

    #[test]
    fn test_upload_of_new_application_needs_valid_identity() {
        let mut app = portal();
        app.new_application();
        let (_dir, path) = temp_file("passport.pdf");
        let err = app.upload(FileType::PassportApplication, &path).unwrap_err();
        assert!(matches!(err, ActionError::Domain(DomainError::MissingName)));
        assert!(app.service.backend().calls.is_empty());
    }

    #[test]
    fn test_hidden_script_never_creates_application() {
        let mut app = portal();
        app.new_application();
        app.form.name_en = "Starlight".to_string();
        app.form.year = "2005".to_string();
        let (_dir, path) = temp_file(".sh");

        let err = app.upload(FileType::Media, &path).unwrap_err();
        assert!(matches!(err, ActionError::Domain(DomainError::ForbiddenExtension(_))));
        assert!(app.service.backend().calls.is_empty());
        assert!(app.form.is_new());
    }

    #[test]
    fn test_several_media_paths_in_one_prompt() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.open("a1").unwrap();
        let (_dir, first) = temp_file("front.jpg");
        let second = first.with_file_name("side view.jpg");
        std::fs::write(&second, b"jpeg").unwrap();

        app.start_upload(FileType::Media).unwrap();
        app.input = TextInput::with_text(format!("{} ; {};", first.display(), second.display()));
        app.finish_upload().unwrap();

        let names: Vec<&str> = app.form.files().iter().map(|f| f.original_name.as_str()).collect();
        assert_eq!(names, ["front.jpg", "side view.jpg"]);
        assert_eq!(app.service.backend().count_calls("upload:media"), 2);
        assert_eq!(app.status_message.as_deref(), Some("Uploaded 2 files"));
        assert!(!app.is_busy(&Action::Upload(FileType::Media)));
    }

    #[test]
    fn test_multi_path_upload_stops_at_first_bad_file() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.open("a1").unwrap();
        let (dir, good) = temp_file("front.jpg");
        let missing = dir.path().join("missing.jpg");
        let (_other, later) = temp_file("later.jpg");

        app.start_upload(FileType::Media).unwrap();
        app.input = TextInput::with_text(format!("{};{};{}", good.display(), missing.display(), later.display()));
        let err = app.finish_upload().unwrap_err();

        assert!(matches!(err, ActionError::UnreadableFile { .. }));
        assert_eq!(app.form.files().len(), 1);
        assert_eq!(app.service.backend().count_calls("upload:"), 1);
    }

    #[test]
    fn test_single_slot_prompt_keeps_semicolons() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.open("a1").unwrap();
        let (_dir, path) = temp_file("passport;scan.pdf");

        app.start_upload(FileType::PassportApplication).unwrap();
        app.input = TextInput::with_text(path.display().to_string());
        app.finish_upload().unwrap();

        assert_eq!(app.form.files()[0].original_name, "passport;scan.pdf");
    }

    #[test]
    fn test_broken_side_store_does_not_block_work() {
        let mut app = PortalApp::new(FakeService::default(), Box::new(FailingSideStore)).with_current_year(2026);
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.open("a1").unwrap();

        app.cycle_choice(FileType::OwnershipOrContract);
        assert_eq!(app.form.choice(FileType::OwnershipOrContract), Some("contract"));

        let (_dir, path) = temp_file("contract.pdf");
        app.upload(FileType::OwnershipOrContract, &path).unwrap();
        assert_eq!(app.form.files()[0].choice.as_deref(), Some("contract"));
        assert_eq!(app.service.backend().count_calls("get:a1"), 2);

        app.submit().unwrap();
        assert_eq!(app.service.backend().count_calls("submit:a1"), 1);
        assert_eq!(app.status_message.as_deref(), Some("Application submitted"));
    }

    #[test]
    fn test_forbidden_extension_is_caught_locally() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.open("a1").unwrap();
        let (_dir, path) = temp_file("install.sh");
        let err = app.upload(FileType::Media, &path).unwrap_err();
        assert!(matches!(err, ActionError::Domain(DomainError::ForbiddenExtension(_))));
        assert_eq!(app.service.backend().count_calls("upload:"), 0);
    }

    #[test]
    fn test_occupied_slot_blocks_prompt() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::GeneticCertificate, FileStatus::Sent);
        }
        app.open("a1").unwrap();
        assert!(matches!(
            app.start_upload(FileType::GeneticCertificate),
            Err(ActionError::Domain(DomainError::SlotOccupied(FileType::GeneticCertificate)))
        ));
        assert_eq!(app.mode, PortalMode::Normal);
        assert!(app.start_upload(FileType::Media).is_ok());
        assert_eq!(app.mode, PortalMode::UploadPath(FileType::Media));
    }

    #[test]
    fn test_rejected_file_frees_the_slot() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::PassportApplication, FileStatus::Rejected);
        }
        app.open("a1").unwrap();
        let (_dir, path) = temp_file("passport-v2.pdf");
        app.upload(FileType::PassportApplication, &path).unwrap();
        assert_eq!(app.form.files().len(), 2);
    }

    #[test]
    fn test_choice_is_sent_and_remembered() {
        let mut app = portal();
        app.service.backend().add_application("a1", ApplicationStatus::Draft);
        app.open("a1").unwrap();
        assert_eq!(app.form.choice(FileType::OwnershipOrContract), Some("ownership"));
        app.cycle_choice(FileType::OwnershipOrContract);

        let (_dir, path) = temp_file("contract.pdf");
        app.upload(FileType::OwnershipOrContract, &path).unwrap();
        assert_eq!(app.form.files()[0].choice.as_deref(), Some("contract"));

        app.back_to_search();
        app.open("a1").unwrap();
        assert_eq!(app.form.choice(FileType::OwnershipOrContract), Some("contract"));
        assert_eq!(app.form.choice(FileType::BreedingOrCertificate), Some("breeding"));
    }

    #[test]
    fn test_delete_only_offered_for_draft_files() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::Media, FileStatus::Draft);
            backend.add_file("f2", "a1", FileType::Media, FileStatus::Sent);
        }
        app.open("a1").unwrap();

        assert!(matches!(
            app.start_delete("f2"),
            Err(ActionError::Domain(DomainError::NotDeletable))
        ));
        app.start_delete("f1").unwrap();
        assert_eq!(app.mode, PortalMode::ConfirmDelete("f1".to_string()));
        app.confirm_delete().unwrap();
        assert_eq!(app.form.files().len(), 1);
        assert_eq!(app.service.backend().count_calls("delete:"), 1);
    }

    #[test]
    fn test_failed_delete_leaves_snapshot() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::Media, FileStatus::Draft);
            backend.failing.push("delete");
        }
        app.open("a1").unwrap();
        let gets = app.service.backend().count_calls("get:");

        assert!(matches!(app.delete("f1"), Err(ActionError::Remote(_))));
        assert_eq!(app.form.files().len(), 1);
        assert_eq!(app.service.backend().count_calls("get:"), gets);
        assert!(!app.is_busy(&Action::Delete("f1".to_string())));
    }

    #[test]
    fn test_editing_locked_after_send() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::Media, FileStatus::Sent);
        }
        app.open("a1").unwrap();
        assert!(matches!(
            app.start_editing(IdentityField::NameEn),
            Err(ActionError::Domain(DomainError::MetadataLocked))
        ));
    }

    #[test]
    fn test_edit_field_roundtrip() {
        let mut app = portal();
        app.new_application();
        app.start_editing(IdentityField::NameRu).unwrap();
        for c in "Звезда".chars() {
            app.input.insert(c);
        }
        app.finish_editing();
        assert_eq!(app.form.name_ru, "Звезда");
        assert_eq!(app.mode, PortalMode::Normal);
    }

    #[test]
    fn test_submit_new_application() {
        let mut app = portal();
        app.new_application();
        app.form.name_en = "Starlight".to_string();
        app.form.year = "2005".to_string();
        app.submit().unwrap();

        assert_eq!(app.screen, PortalScreen::Search);
        assert_eq!(app.status_message.as_deref(), Some("Application submitted"));
        let backend = app.service.backend();
        assert_eq!(backend.count_calls("create:"), 1);
        assert_eq!(backend.count_calls("submit:app-1"), 1);
        assert_eq!(backend.applications[0].status, ApplicationStatus::Sent);
    }

    #[test]
    fn test_submit_existing_tolerates_unauthorized_patch() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::Media, FileStatus::Draft);
        }
        app.open("a1").unwrap();
        app.submit().unwrap();

        let backend = app.service.backend();
        assert_eq!(backend.count_calls("update:a1"), 1);
        assert_eq!(backend.files[0].status, FileStatus::Sent);
    }

    #[test]
    fn test_submit_warns_when_identity_update_fails() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.failing.push("update");
        }
        app.open("a1").unwrap();
        app.submit().unwrap();

        let message = app.status_message.clone().unwrap_or_default();
        assert!(message.starts_with("Application submitted"));
        assert!(message.contains("warning"));
        assert_eq!(app.service.backend().count_calls("submit:a1"), 1);
        assert_eq!(app.screen, PortalScreen::Search);
    }

    #[test]
    fn test_submit_ignores_missing_identity_endpoint() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.update_status = Some(404);
        }
        app.open("a1").unwrap();
        app.submit().unwrap();

        assert_eq!(app.status_message.as_deref(), Some("Application submitted"));
        assert_eq!(app.service.backend().count_calls("update:a1"), 1);
        assert_eq!(app.service.backend().applications[0].status, ApplicationStatus::Sent);
    }

    #[test]
    fn test_submit_rejected_locally() {
        let mut app = portal();
        app.new_application();
        app.form.name_en = "Starlight".to_string();
        app.form.year = "1989".to_string();
        assert!(matches!(
            app.submit(),
            Err(ActionError::Domain(DomainError::InvalidYear { .. }))
        ));

        app.service.backend().add_application("done", ApplicationStatus::Complete);
        app.open("done").unwrap();
        assert!(!app.permissions().submit);
        assert!(matches!(
            app.submit(),
            Err(ActionError::Domain(DomainError::ApplicationComplete))
        ));
        assert_eq!(app.service.backend().count_calls("submit:"), 0);
    }

    #[test]
    fn test_busy_action_is_refused() {
        let mut app = portal();
        assert!(app.in_flight.begin(&Action::Submit));
        assert!(matches!(app.submit(), Err(ActionError::Busy(Action::Submit))));
        assert!(app.service.backend().calls.is_empty());
    }

    #[test]
    fn test_rows_follow_snapshot() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("f1", "a1", FileType::PassportApplication, FileStatus::Draft);
        }
        app.open("a1").unwrap();
        let rows = app.form.rows();
        assert_eq!(rows.len(), 3 + FileType::ALL.len() + 1);
        assert_eq!(rows[3], FormRow::Section(FileType::PassportApplication));
        assert_eq!(
            rows[4],
            FormRow::File {
                file_type: FileType::PassportApplication,
                file_id: "f1".to_string()
            }
        );

        app.form.cursor = rows.len() - 1;
        app.service.backend().files.clear();
        app.refresh().unwrap();
        assert_eq!(app.form.cursor, app.form.rows().len() - 1);
    }

    #[test]
    fn test_rows_group_files_under_their_section() {
        let mut app = portal();
        {
            let mut backend = app.service.backend();
            backend.add_application("a1", ApplicationStatus::Draft);
            backend.add_file("m1", "a1", FileType::Media, FileStatus::Draft);
            backend.add_file("p1", "a1", FileType::PassportApplication, FileStatus::Sent);
            backend.add_file("m2", "a1", FileType::Media, FileStatus::Draft);
        }
        app.open("a1").unwrap();
        let rows = app.form.rows();
        let media = rows
            .iter()
            .position(|r| *r == FormRow::Section(FileType::Media))
            .unwrap();
        let under_media: Vec<&str> = rows[media + 1..]
            .iter()
            .map_while(|r| match r {
                FormRow::File { file_id, .. } => Some(file_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(under_media, ["m1", "m2"]);
    }
}
