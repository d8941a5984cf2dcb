use crate::domain::Application;
use std::path::Path;

pub struct ListingExporter;

impl ListingExporter {
    /// Writes the listing rows to `path`, returning how many were written.
    pub fn export_to_csv(applications: &[Application], path: impl AsRef<Path>) -> Result<usize, csv::Error> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["id", "horse_name_ru", "horse_name_en", "horse_year", "status", "created_at"])?;

        for app in applications {
            let created_at = app.created_at.map(|t| t.to_rfc3339()).unwrap_or_default();
            let year = app.year_text();
            writer.write_record([
                app.id.as_str(),
                app.horse_name_ru.as_deref().unwrap_or(""),
                app.horse_name_en.as_deref().unwrap_or(""),
                year.as_str(),
                app.status.as_str(),
                created_at.as_str(),
            ])?;
        }

        writer.flush()?;
        Ok(applications.len())
    }
}
