//! Administrator console session.

use super::in_flight::{Action, InFlight};
use super::state::{ActionError, TextInput};
use crate::domain::{
    can_mark_complete, is_visible_to_admin, next_status_on_admin_accept, next_status_on_admin_reject,
    Application, ApplicationDetail, ApplicationStatus, DomainError, FileRecord, FileStatus,
};
use crate::infrastructure::{ApplicationService, ListingExporter};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminScreen {
    List,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminMode {
    Normal,
    Searching,
    ConfirmComplete,
    ConfirmDelete(String),
    /// Typing the destination of a CSV export
    ExportPath,
    Help,
}

/// Accept or reject, the two review outcomes for a sent file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Accept,
    Reject,
}

pub struct AdminApp<S: ApplicationService> {
    service: S,
    in_flight: InFlight,
    pub screen: AdminScreen,
    pub mode: AdminMode,
    pub input: TextInput,
    pub query: String,
    /// `None` shows every status
    pub status_filter: Option<ApplicationStatus>,
    /// Search results after the status filter
    pub listing: Vec<Application>,
    pub selected: usize,
    pub detail: Option<ApplicationDetail>,
    pub selected_file: usize,
    pub status_message: Option<String>,
    pub help_scroll: usize,
}

impl<S: ApplicationService> AdminApp<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            in_flight: InFlight::default(),
            screen: AdminScreen::List,
            mode: AdminMode::Normal,
            input: TextInput::default(),
            query: String::new(),
            status_filter: None,
            listing: Vec::new(),
            selected: 0,
            detail: None,
            selected_file: 0,
            status_message: None,
            help_scroll: 0,
        }
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
            tracing::warn!(action = %action, error = %e, "admin action failed");
        }
        result
    }

    // --- list ---

    pub fn start_search(&mut self) {
        self.mode = AdminMode::Searching;
        self.input = TextInput::with_text(self.query.clone());
    }

    pub fn finish_search(&mut self) -> Result<(), ActionError> {
        self.query = self.input.take();
        self.mode = AdminMode::Normal;
        self.load_list()
    }

    pub fn cancel_prompt(&mut self) {
        self.mode = AdminMode::Normal;
        self.input.clear();
        self.status_message = None;
    }

    pub fn load_list(&mut self) -> Result<(), ActionError> {
        self.run(Action::Search, |app| {
            let found = app.service.search_applications(&app.query)?;
            let total = found.len();
            app.listing = found
                .into_iter()
                .filter(|a| app.status_filter.is_none_or(|s| a.status == s))
                .collect();
            app.selected = app.selected.min(app.listing.len().saturating_sub(1));
            tracing::debug!(total, shown = app.listing.len(), "listing loaded");
            app.status_message = Some(app.summary());
            Ok(())
        })
    }

    /// "N shown", plus per-status counts of the shown rows.
    pub fn summary(&self) -> String {
        let counts: Vec<String> = ApplicationStatus::ALL
            .iter()
            .map(|s| format!("{} {}", self.listing.iter().filter(|a| a.status == *s).count(), s))
            .collect();
        format!("{} shown ({})", self.listing.len(), counts.join(", "))
    }

    /// Steps the filter through all, draft, sent, complete and reloads.
    pub fn cycle_filter(&mut self) -> Result<(), ActionError> {
        self.status_filter = match self.status_filter {
            None => Some(ApplicationStatus::Draft),
            Some(ApplicationStatus::Draft) => Some(ApplicationStatus::Sent),
            Some(ApplicationStatus::Sent) => Some(ApplicationStatus::Complete),
            Some(ApplicationStatus::Complete) => None,
        };
        self.load_list()
    }

    pub fn filter_label(&self) -> &'static str {
        self.status_filter.map(|s| s.as_str()).unwrap_or("all")
    }

    pub fn select_next(&mut self) {
        match self.screen {
            AdminScreen::List if self.selected + 1 < self.listing.len() => self.selected += 1,
            AdminScreen::Detail if self.selected_file + 1 < self.visible_files().len() => self.selected_file += 1,
            _ => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.screen {
            AdminScreen::List => self.selected = self.selected.saturating_sub(1),
            AdminScreen::Detail => self.selected_file = self.selected_file.saturating_sub(1),
        }
    }

    pub fn open_selected(&mut self) -> Result<(), ActionError> {
        let id = self
            .listing
            .get(self.selected)
            .map(|a| a.id.clone())
            .ok_or(ActionError::NothingSelected)?;
        self.open(&id)
    }

    pub fn start_export(&mut self) {
        self.mode = AdminMode::ExportPath;
        self.input = TextInput::with_text("applications.csv");
    }

    pub fn finish_export(&mut self) -> Result<(), ActionError> {
        let path = self.input.take();
        self.mode = AdminMode::Normal;
        self.export(Path::new(path.trim()))
    }

    /// Writes the filtered listing as CSV.
    pub fn export(&mut self, path: &Path) -> Result<(), ActionError> {
        let written = ListingExporter::export_to_csv(&self.listing, path)?;
        tracing::info!(rows = written, path = %path.display(), "listing exported");
        self.status_message = Some(format!("Exported {} row(s) to {}", written, path.display()));
        Ok(())
    }

    // --- detail ---

    pub fn open(&mut self, id: &str) -> Result<(), ActionError> {
        self.run(Action::Load, |app| {
            app.detail = Some(app.service.get_application(id)?);
            app.selected_file = 0;
            app.screen = AdminScreen::Detail;
            app.mode = AdminMode::Normal;
            app.status_message = None;
            Ok(())
        })
    }

    pub fn back_to_list(&mut self) -> Result<(), ActionError> {
        self.detail = None;
        self.screen = AdminScreen::List;
        self.mode = AdminMode::Normal;
        self.load_list()
    }

    pub fn refresh(&mut self) -> Result<(), ActionError> {
        self.run(Action::Refresh, |app| app.reload_detail())
    }

    fn reload_detail(&mut self) -> Result<(), ActionError> {
        let Some(id) = self.detail.as_ref().map(|d| d.application.id.clone()) else {
            return Ok(());
        };
        self.detail = Some(self.service.get_application(&id)?);
        self.selected_file = self.selected_file.min(self.visible_files().len().saturating_sub(1));
        Ok(())
    }

    /// Files the submitter has sent; drafts stay hidden.
    pub fn visible_files(&self) -> Vec<&FileRecord> {
        self.detail
            .as_ref()
            .map(|d| d.files.iter().filter(|f| is_visible_to_admin(f)).collect())
            .unwrap_or_default()
    }

    pub fn current_file(&self) -> Option<&FileRecord> {
        self.visible_files().get(self.selected_file).copied()
    }

    fn current_file_id(&self) -> Result<String, ActionError> {
        self.current_file()
            .map(|f| f.id.clone())
            .ok_or(ActionError::NothingSelected)
    }

    pub fn review_selected(&mut self, review: Review) -> Result<(), ActionError> {
        let file_id = self.current_file_id()?;
        self.review(&file_id, review)
    }

    /// Moves a sent file to accepted or rejected.
    pub fn review(&mut self, file_id: &str, review: Review) -> Result<(), ActionError> {
        self.run(Action::ReviewFile(file_id.to_string()), |app| {
            let file = app
                .detail
                .as_ref()
                .and_then(|d| d.file(file_id))
                .ok_or_else(|| ActionError::UnknownFile(file_id.to_string()))?;
            let next = match review {
                Review::Accept => next_status_on_admin_accept(file)?,
                Review::Reject => next_status_on_admin_reject(file)?,
            };
            let name = file.original_name.clone();
            app.service.admin_set_file_status(file_id, next)?;
            tracing::info!(file_id, status = %next, "file reviewed");
            app.reload_detail()?;
            app.status_message = Some(format!("{} marked {}", name, next));
            Ok(())
        })
    }

    pub fn can_mark_complete(&self) -> bool {
        self.detail
            .as_ref()
            .is_some_and(|d| can_mark_complete(d.application.status))
    }

    pub fn start_mark_complete(&mut self) -> Result<(), ActionError> {
        let detail = self.detail.as_ref().ok_or(ActionError::NothingSelected)?;
        if !can_mark_complete(detail.application.status) {
            return Err(DomainError::ApplicationComplete.into());
        }
        self.status_message = Some(format!("Mark {} complete? (y/n)", detail.application.short_name()));
        self.mode = AdminMode::ConfirmComplete;
        Ok(())
    }

    pub fn mark_complete(&mut self) -> Result<(), ActionError> {
        self.mode = AdminMode::Normal;
        self.run(Action::MarkComplete, |app| {
            let detail = app.detail.as_ref().ok_or(ActionError::NothingSelected)?;
            if !can_mark_complete(detail.application.status) {
                return Err(DomainError::ApplicationComplete.into());
            }
            let id = detail.application.id.clone();
            app.service
                .admin_set_application_status(&id, ApplicationStatus::Complete)?;
            tracing::info!(application_id = %id, "application marked complete");
            app.reload_detail()?;
            app.status_message = Some("Application marked complete".to_string());
            Ok(())
        })
    }

    pub fn start_delete(&mut self) -> Result<(), ActionError> {
        let (id, name) = self
            .current_file()
            .map(|f| (f.id.clone(), f.original_name.clone()))
            .ok_or(ActionError::NothingSelected)?;
        self.status_message = Some(format!("Delete {}? (y/n)", name));
        self.mode = AdminMode::ConfirmDelete(id);
        Ok(())
    }

    pub fn confirm_delete(&mut self) -> Result<(), ActionError> {
        let AdminMode::ConfirmDelete(file_id) = std::mem::replace(&mut self.mode, AdminMode::Normal) else {
            return Ok(());
        };
        self.delete(&file_id)
    }

    pub fn delete(&mut self, file_id: &str) -> Result<(), ActionError> {
        self.run(Action::AdminDelete(file_id.to_string()), |app| {
            app.service.admin_delete_file(file_id)?;
            tracing::info!(file_id, "file deleted by administrator");
            app.reload_detail()?;
            app.status_message = Some("File deleted".to_string());
            Ok(())
        })
    }

    /// Whether the selected file was sent and still awaits review.
    pub fn selected_awaits_review(&self) -> bool {
        self.current_file().is_some_and(|f| f.status == FileStatus::Sent)
    }
}
