//! In-memory Repository

use crate::{FeatureRecord, FeatureSink, StorageError};
use async_trait::async_trait;
use feature_engine::FeatureName;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, info};

/// Default retention limit
pub const DEFAULT_MAX_RECORDS: usize = 100_000;

/// Feature repository held in memory, oldest records evicted first
pub struct Repository {
    records: Mutex<VecDeque<FeatureRecord>>,
    max_records: usize,
}

impl Repository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::with_max_records(DEFAULT_MAX_RECORDS)
    }

    /// Create a repository keeping at most `max_records` records
    pub fn with_max_records(max_records: usize) -> Self {
        info!("Creating in-memory repository (max {} records)", max_records);
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records.min(10_000))),
            max_records: max_records.max(1),
        }
    }

    /// Insert a record
    pub fn insert(&self, record: FeatureRecord) -> Result<(), StorageError> {
        let mut records = self.lock()?;

        // Enforce retention
        while records.len() >= self.max_records {
            records.pop_front();
        }

        records.push_back(record);
        Ok(())
    }

    /// Most recent records, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<FeatureRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    /// Records of one bearing channel in insertion order
    pub fn records_for(
        &self,
        bearing_name: &str,
        channel: &str,
    ) -> Result<Vec<FeatureRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .filter(|r| r.bearing_name.as_deref() == Some(bearing_name) && r.channel == channel)
            .cloned()
            .collect())
    }

    /// One series per requested feature for a bearing channel
    pub fn list_features(
        &self,
        bearing_name: &str,
        channel: &str,
        features: &[FeatureName],
    ) -> Result<Vec<Vec<f64>>, StorageError> {
        let mut matching = self.records_for(bearing_name, channel)?;
        matching.sort_by_key(|r| r.file_idx);

        Ok(features
            .iter()
            .map(|&name| matching.iter().map(|r| r.features.get(name)).collect())
            .collect())
    }

    /// Get total record count
    pub fn count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Clear all data
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<FeatureRecord>>, StorageError> {
        self.records
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeatureSink for Repository {
    async fn store(&self, batch: Vec<FeatureRecord>) -> Vec<Result<(), StorageError>> {
        let len = batch.len();
        let results: Vec<_> = batch.into_iter().map(|record| self.insert(record)).collect();
        debug!("Stored {} feature records in memory", len);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use feature_engine::FeatureVector;
    use signal_model::DataSource;

    fn record(bearing: &str, channel: &str, idx: u32, rms: f64) -> FeatureRecord {
        FeatureRecord {
            source: DataSource::Xjtu,
            filename: format!("{bearing}/{idx}.csv"),
            channel: channel.to_string(),
            bearing_name: Some(bearing.to_string()),
            file_idx: Some(idx),
            features: FeatureVector {
                rms,
                kurtosis: rms * 2.0,
                ..Default::default()
            },
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_retrieve() {
        let repo = Repository::new();
        repo.insert(record("Bearing1_1", "H", 1, 0.5)).unwrap();

        let recent = repo.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].features.rms, 0.5);
    }

    #[test]
    fn test_retention_limit() {
        let repo = Repository::with_max_records(5);
        for i in 0..10 {
            repo.insert(record("Bearing1_1", "H", i, i as f64)).unwrap();
        }
        assert_eq!(repo.count(), 5);
        assert_eq!(repo.recent(1).unwrap()[0].file_idx, Some(9));
    }

    #[test]
    fn test_list_features_ordered_by_file_idx() {
        let repo = Repository::new();
        repo.insert(record("Bearing1_1", "H", 2, 2.0)).unwrap();
        repo.insert(record("Bearing1_1", "V", 1, 9.0)).unwrap();
        repo.insert(record("Bearing1_1", "H", 1, 1.0)).unwrap();
        repo.insert(record("Bearing2_1", "H", 1, 7.0)).unwrap();

        let series = repo
            .list_features("Bearing1_1", "H", &[FeatureName::Rms, FeatureName::Kurtosis])
            .unwrap();
        assert_eq!(series, vec![vec![1.0, 2.0], vec![2.0, 4.0]]);
    }

    #[tokio::test]
    async fn test_store_batch() {
        let repo = Repository::new();
        let results = repo
            .store(vec![record("B", "H", 1, 1.0), record("B", "H", 2, 1.0)])
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(repo.count(), 2);

        repo.clear();
        assert_eq!(repo.count(), 0);
    }
}
