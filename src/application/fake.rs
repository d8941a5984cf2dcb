//! In-memory backend used by the session tests. Mirrors the server rules
//! closely enough to exercise refresh-after-mutation.

use crate::domain::{
    Application, ApplicationDetail, ApplicationStatus, FileRecord, FileStatus, FileType, FileUpload,
    IdentityUpdate, NewApplication,
};
use crate::infrastructure::{ApiError, ApiResult, ApplicationService, SideStore, StoreError};
use std::cell::{RefCell, RefMut};

#[derive(Debug, Default)]
pub struct FakeBackend {
    pub applications: Vec<Application>,
    pub files: Vec<FileRecord>,
    pub calls: Vec<String>,
    pub failing: Vec<&'static str>,
    /// Status answered to identity updates. `None` is the public
    /// portal's 401.
    pub update_status: Option<u16>,
    next_id: u32,
}

impl FakeBackend {
    pub fn add_application(&mut self, id: &str, status: ApplicationStatus) {
        self.applications.push(Application {
            id: id.to_string(),
            horse_name_ru: None,
            horse_name_en: Some("Starlight".to_string()),
            horse_year: 2005,
            status,
            mare_ownership_confirmed: false,
            genetic_done_through_association: false,
            genetic_pending: false,
            created_at: None,
            notes: String::new(),
        });
    }

    pub fn add_file(&mut self, id: &str, application_id: &str, file_type: FileType, status: FileStatus) {
        self.files.push(FileRecord {
            id: id.to_string(),
            application_id: application_id.to_string(),
            file_type,
            original_name: format!("{}.pdf", id),
            size_bytes: 1024,
            status,
            choice: None,
            content_type: "application/pdf".to_string(),
            uploaded_at: None,
        });
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&mut self, op: &'static str, detail: &str) -> ApiResult<()> {
        self.calls.push(format!("{}:{}", op, detail));
        if self.failing.contains(&op) {
            return Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }

    fn application_mut(&mut self, id: &str) -> ApiResult<&mut Application> {
        self.applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }

    fn bad_request(body: &str) -> ApiError {
        ApiError::Status {
            status: 400,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeService {
    state: RefCell<FakeBackend>,
}

impl FakeService {
    pub fn backend(&self) -> RefMut<'_, FakeBackend> {
        self.state.borrow_mut()
    }
}

impl ApplicationService for FakeService {
    fn search_applications(&self, query: &str) -> ApiResult<Vec<Application>> {
        let mut b = self.backend();
        b.record("search", query)?;
        let needle = query.trim().to_lowercase();
        Ok(b.applications
            .iter()
            .filter(|a| {
                needle.is_empty()
                    || [&a.horse_name_ru, &a.horse_name_en]
                        .iter()
                        .any(|n| n.as_deref().unwrap_or("").to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    fn get_application(&self, id: &str) -> ApiResult<ApplicationDetail> {
        let mut b = self.backend();
        b.record("get", id)?;
        let application = b.application_mut(id)?.clone();
        let files = b.files.iter().filter(|f| f.application_id == id).cloned().collect();
        Ok(ApplicationDetail { application, files })
    }

    fn create_application(&self, new: &NewApplication) -> ApiResult<Application> {
        let mut b = self.backend();
        b.record("create", "")?;
        b.next_id += 1;
        let id = format!("app-{}", b.next_id);
        b.add_application(&id, ApplicationStatus::Draft);
        let app = b.application_mut(&id)?;
        app.horse_name_ru = new.horse_name_ru.clone();
        app.horse_name_en = new.horse_name_en.clone();
        app.horse_year = new.horse_year;
        Ok(app.clone())
    }

    fn update_identity(&self, id: &str, _update: &IdentityUpdate) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("update", id)?;
        match b.update_status {
            None | Some(401) => Err(ApiError::Unauthorized),
            Some(status) if (200..300).contains(&status) => Ok(()),
            Some(status) => Err(ApiError::Status {
                status,
                body: "update refused".to_string(),
            }),
        }
    }

    fn upload_file(&self, application_id: &str, upload: &FileUpload) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("upload", upload.file_type.as_str())?;
        if b.application_mut(application_id)?.status == ApplicationStatus::Complete {
            return Err(FakeBackend::bad_request("cannot upload files to a complete application"));
        }
        b.next_id += 1;
        let id = format!("file-{}", b.next_id);
        b.add_file(&id, application_id, upload.file_type, FileStatus::Draft);
        if let Some(file) = b.files.last_mut() {
            file.choice = upload.choice.clone();
            if let Some(name) = upload.path.file_name() {
                file.original_name = name.to_string_lossy().into_owned();
            }
        }
        Ok(())
    }

    fn delete_file(&self, file_id: &str) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("delete", file_id)?;
        let Some(index) = b.files.iter().position(|f| f.id == file_id && f.status == FileStatus::Draft) else {
            return Err(FakeBackend::bad_request("not found or not deletable"));
        };
        let application_id = b.files[index].application_id.clone();
        if b.application_mut(&application_id)?.status != ApplicationStatus::Draft {
            return Err(FakeBackend::bad_request("application is not draft"));
        }
        b.files.remove(index);
        Ok(())
    }

    fn submit_application(&self, id: &str) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("submit", id)?;
        let app = b.application_mut(id)?;
        if app.status == ApplicationStatus::Complete {
            return Err(FakeBackend::bad_request("application is already complete"));
        }
        app.status = ApplicationStatus::Sent;
        for file in b.files.iter_mut().filter(|f| f.application_id == id && f.status == FileStatus::Draft) {
            file.status = FileStatus::Sent;
        }
        Ok(())
    }

    fn admin_set_application_status(&self, id: &str, status: ApplicationStatus) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("admin_app", &format!("{}:{}", id, status))?;
        b.application_mut(id)?.status = status;
        Ok(())
    }

    fn admin_set_file_status(&self, file_id: &str, status: FileStatus) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("admin_file", &format!("{}:{}", file_id, status))?;
        if let Some(file) = b.files.iter_mut().find(|f| f.id == file_id) {
            file.status = status;
        }
        Ok(())
    }

    fn admin_delete_file(&self, file_id: &str) -> ApiResult<()> {
        let mut b = self.backend();
        b.record("admin_delete", file_id)?;
        b.files.retain(|f| f.id != file_id);
        Ok(())
    }
}

/// Side store whose writes always fail and which remembers nothing.
#[derive(Debug, Default)]
pub struct FailingSideStore;

impl SideStore for FailingSideStore {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }
}
