//! Data quality dashboard console

use tracing::{debug, info};

use super::DbSettings;
use crate::{PerseusError, Result};

/// Backend serving finished data quality checks.
#[cfg_attr(test, mockall::automock)]
pub trait DqdService {
    fn download(&self, result: &str) -> Result<serde_json::Value>;
}

/// Client-side file save.
#[cfg_attr(test, mockall::automock)]
pub trait FileSaver {
    fn save_as(&mut self, blob: &[u8], content_type: &str, filename: &str) -> Result<()>;
}

/// Console wrapper around a data quality check run.
#[derive(Debug, Clone)]
pub struct DqdConsole {
    settings: DbSettings,
    result: Option<String>,
}

impl DqdConsole {
    pub fn new(settings: DbSettings) -> Self {
        Self {
            settings,
            result: None,
        }
    }

    pub fn on_finish(&mut self, result: impl Into<String>) {
        let result = result.into();
        info!(result = %result, "data quality check finished");
        self.result = Some(result);
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Dashboard page showing the finished run.
    pub fn result_url(&self, dqd_url: &str) -> Option<String> {
        let base = dqd_url.trim_end_matches('/');
        self.result
            .as_ref()
            .map(|result| format!("{}/index.html?result={}", base, result))
    }

    /// Name the downloaded report is saved under.
    pub fn result_file_name(&self) -> String {
        format!("{}.{}.json", self.settings.database, self.settings.schema)
    }

    /// Download the finished report and hand it to `saver` as JSON.
    pub fn save_result(
        &self,
        service: &dyn DqdService,
        saver: &mut dyn FileSaver,
    ) -> Result<String> {
        let result = self
            .result
            .as_deref()
            .ok_or_else(|| PerseusError::Service("no data quality result to save".to_string()))?;

        let report = service.download(result)?;
        let blob = serde_json::to_vec(&report)?;
        let file_name = self.result_file_name();

        saver.save_as(&blob, "application/json", &file_name)?;
        debug!(file = %file_name, bytes = blob.len(), "data quality report saved");
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn console() -> DqdConsole {
        DqdConsole::new(DbSettings {
            database: "synthea".to_string(),
            schema: "cdm".to_string(),
            ..DbSettings::default()
        })
    }

    #[test]
    fn test_result_url_requires_finished_run() {
        let mut console = console();
        assert_eq!(console.result_url("http://dqd"), None);

        console.on_finish("run-42");

        assert_eq!(console.result(), Some("run-42"));
        assert_eq!(
            console.result_url("http://dqd/").as_deref(),
            Some("http://dqd/index.html?result=run-42")
        );
    }

    #[test]
    fn test_save_result_downloads_and_saves_json() {
        let mut console = console();
        console.on_finish("run-7");

        let mut service = MockDqdService::new();
        service
            .expect_download()
            .withf(|result| result == "run-7")
            .times(1)
            .returning(|_| Ok(json!({"passed": 10})));

        let mut saver = MockFileSaver::new();
        saver
            .expect_save_as()
            .withf(|blob, content_type, file_name| {
                blob == br#"{"passed":10}"#
                    && content_type == "application/json"
                    && file_name == "synthea.cdm.json"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let file_name = console.save_result(&service, &mut saver).unwrap();
        assert_eq!(file_name, "synthea.cdm.json");
    }

    #[test]
    fn test_save_without_result_fails() {
        let service = MockDqdService::new();
        let mut saver = MockFileSaver::new();

        let err = console().save_result(&service, &mut saver).unwrap_err();
        assert!(matches!(err, PerseusError::Service(_)));
    }

    #[test]
    fn test_download_failure_is_propagated() {
        let mut console = console();
        console.on_finish("run-9");

        let mut service = MockDqdService::new();
        service
            .expect_download()
            .returning(|_| Err(PerseusError::Service("dqd unavailable".to_string())));
        let mut saver = MockFileSaver::new();
        saver.expect_save_as().never();

        assert!(console.save_result(&service, &mut saver).is_err());
    }
}
