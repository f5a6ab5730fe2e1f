use crate::dataset::{parse_dataset, search};
use crate::error::{FormError, Result};
use crate::export::export_form;
use crate::model::{FormField, FormState, ImageAttachment, ImageSlot, RawRecord};
use crate::parser::map_record_to_fields;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Clears the export flag however the export ends.
struct ExportGuard(Arc<AtomicBool>);

impl ExportGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything one technician is working on: the imported dataset, the
/// current lookup and the form being filled in.
#[derive(Default)]
pub struct FormSession {
    dataset: Vec<RawRecord>,
    query: String,
    selected: Option<usize>,
    form: FormState,
    exporting: Arc<AtomicBool>,
}

impl FormSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn selected(&self) -> Option<&RawRecord> {
        self.selected.and_then(|idx| self.dataset.get(idx))
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Replaces the dataset with the contents of `path`. The form is untouched.
    pub async fn import_dataset(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        self.load_dataset(parse_dataset(bytes.as_slice())?);
        info!(path = %path.display(), records = self.dataset.len(), "dataset imported");
        Ok(self.dataset.len())
    }

    pub fn load_dataset(&mut self, records: Vec<RawRecord>) {
        self.dataset = records;
        self.selected = None;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn candidates(&self) -> Vec<&RawRecord> {
        search(&self.dataset, &self.query)
    }

    /// Fills the form from the dataset row at `index`.
    ///
    /// Only the fields derived from the record change. The query switches to
    /// the record's `WO #` first; if the record then cannot be mapped the form
    /// and the selection are left as they were.
    pub fn select(&mut self, index: usize) -> Result<()> {
        let record = self
            .dataset
            .get(index)
            .ok_or_else(|| FormError::RecordNotFound(format!("row {}", index)))?;
        self.query = record.work_order().unwrap_or_default().to_string();
        let parsed = map_record_to_fields(record)?;

        self.selected = Some(index);
        info!(won = %parsed.won, "record selected");
        self.form.merge(parsed);
        Ok(())
    }

    /// Selects the first record whose `WO #` equals `won` exactly.
    pub fn select_work_order(&mut self, won: &str) -> Result<()> {
        let index = self
            .dataset
            .iter()
            .position(|r| r.work_order() == Some(won))
            .ok_or_else(|| FormError::RecordNotFound(won.to_string()))?;
        self.select(index)
    }

    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        debug!(%field, %value, "field edited");
        self.form.set(field, value);
    }

    pub async fn attach_image(&mut self, slot: ImageSlot, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let image = ImageAttachment::new(file_name, bytes)
            .ok_or_else(|| FormError::ImageLoad(format!("{} is not an image", path.display())))?;
        info!(%slot, path = %path.display(), mime = image.mime, "image attached");
        self.form.set_image(slot, image);
        Ok(())
    }

    /// Writes the current form into `dir`.
    ///
    /// Only one export may run at a time; a second call while one is running
    /// fails with [`FormError::ExportInProgress`].
    pub async fn export(&self, dir: impl Into<PathBuf>) -> Result<PathBuf> {
        let _guard = ExportGuard::acquire(&self.exporting).ok_or(FormError::ExportInProgress)?;

        let form = self.form.clone();
        let dir = dir.into();
        let outcome = tokio::task::spawn_blocking(move || export_form(&form, &dir))
            .await
            .map_err(|e| FormError::Export(e.to_string()))
            .and_then(|r| r.map_err(|e| FormError::Export(e.to_string())));

        if let Err(e) = &outcome {
            error!(error = %e, "export failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Vec<RawRecord> {
        vec![
            [
                ("WO #", "WO-1"),
                ("Site No.", "10"),
                ("Site Name", "Leeds"),
                ("Problem Description", "DB1 LOOSE LID - EDN 001"),
                ("Date Completed", "2024-01-02"),
            ]
            .into_iter()
            .collect(),
            [("WO #", "WO-2"), ("Date Completed", "garbage")]
                .into_iter()
                .collect(),
            [("WO #", "wo-3"), ("Site Name", "York")].into_iter().collect(),
        ]
    }

    fn session() -> FormSession {
        let mut s = FormSession::new();
        s.load_dataset(dataset());
        s
    }

    #[test]
    fn selection_fills_parsed_fields_and_query() {
        let mut s = session();
        s.select(0).unwrap();
        assert_eq!(s.form().won, "WO-1");
        assert_eq!(s.form().store_number_name, "10 Leeds");
        assert_eq!(s.form().edn_number, "EDN 001");
        assert_eq!(s.form().db_id, "DB1");
        assert_eq!(s.form().description, "LOOSE LID");
        assert_eq!(s.form().date_completed, "2024-01-02");
        assert_eq!(s.query(), "WO-1");
        assert_eq!(s.selected().and_then(|r| r.work_order()), Some("WO-1"));
    }

    #[test]
    fn reselection_keeps_manual_fields() {
        let mut s = session();
        s.set_field(FormField::Rating, "32A");
        s.set_field(FormField::TechnicianName, "Sam");
        s.select(0).unwrap();
        s.select_work_order("wo-3").unwrap();
        assert_eq!(s.form().rating, "32A");
        assert_eq!(s.form().technician_name, "Sam");
        assert_eq!(s.form().won, "wo-3");
        assert_eq!(s.form().store_number_name, "York");
        assert_eq!(s.form().edn_number, "");
        assert_eq!(s.form().date_completed, "");
    }

    #[test]
    fn bad_date_moves_query_but_keeps_form() {
        let mut s = session();
        s.select(0).unwrap();
        let before = s.form().clone();
        assert!(matches!(s.select(1), Err(FormError::InvalidDate(_))));
        assert_eq!(s.form(), &before);
        assert_eq!(s.query(), "WO-2");
        assert_eq!(s.selected().and_then(|r| r.work_order()), Some("WO-1"));
    }

    #[test]
    fn unknown_work_order_is_reported() {
        let mut s = session();
        assert!(matches!(
            s.select_work_order("WO-9"),
            Err(FormError::RecordNotFound(_))
        ));
        assert!(matches!(s.select(99), Err(FormError::RecordNotFound(_))));
    }

    #[test]
    fn candidates_follow_query() {
        let mut s = session();
        assert_eq!(s.candidates().len(), 3);
        s.set_query("WO-");
        assert_eq!(s.candidates().len(), 3);
        s.set_query("2");
        assert_eq!(s.candidates().len(), 1);
    }

    #[test]
    fn reloading_dataset_clears_selection_only() {
        let mut s = session();
        s.select(0).unwrap();
        s.load_dataset(Vec::new());
        assert!(s.selected().is_none());
        assert_eq!(s.form().won, "WO-1");
    }

    #[tokio::test]
    async fn export_refuses_reentry() {
        let s = session();
        let guard = ExportGuard::acquire(&s.exporting).unwrap();
        assert!(s.is_exporting());
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            s.export(dir.path()).await,
            Err(FormError::ExportInProgress)
        ));
        drop(guard);
        assert!(!s.is_exporting());
    }

    #[tokio::test]
    async fn failed_export_resets_flag() {
        let s = session();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does/not/exist");
        assert!(matches!(s.export(missing).await, Err(FormError::Export(_))));
        assert!(!s.is_exporting());
    }
}
