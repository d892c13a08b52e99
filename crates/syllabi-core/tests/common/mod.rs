#![allow(unused_imports, dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use syllabi_core::generation::{
    CurriculumGenerator, GenerationRequest, GenerationResult, OfflineGenerator,
};
use syllabi_core::model::{CurriculumRequest, IndustryMode};
use syllabi_core::storage::{MemoryStorage, SqliteStorage, StorageBackend};
use syllabi_core::{GenerationError, Workbench};

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "Abc123!@";

/// Offline generator with a queue of failures to inject.
#[derive(Clone, Default)]
pub struct FlakyGenerator {
    failures: Arc<Mutex<VecDeque<GenerationError>>>,
}

impl FlakyGenerator {
    pub fn fail_next(&self, error: GenerationError) {
        self.failures.lock().unwrap().push_back(error);
    }
}

impl CurriculumGenerator for FlakyGenerator {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let failure = self.failures.lock().unwrap().pop_front();
        match failure {
            Some(error) => Err(error),
            None => OfflineGenerator.generate(request).await,
        }
    }

    fn describe(&self) -> String {
        "flaky-offline".to_string()
    }
}

pub fn data_science_request() -> CurriculumRequest {
    CurriculumRequest::new("Data Science & ML", IndustryMode::Corporate)
        .with_duration(12)
        .with_credits(4)
}

/// Workbench over in-memory storage with a logged-in identity.
pub async fn signed_in() -> (Workbench<FlakyGenerator, MemoryStorage>, FlakyGenerator) {
    let generator = FlakyGenerator::default();
    let wb = Workbench::new(MemoryStorage::new(), generator.clone(), 20);
    wb.register("Ada", EMAIL, PASSWORD)
        .await
        .expect("registration should succeed");
    (wb, generator)
}

/// Unique on-disk database path under the temp dir.
pub fn temp_db_path() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("syllabi-it-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join("profile.db")
}
