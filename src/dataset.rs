use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use csv::{ByteRecord, StringRecord};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classify;
use crate::config::DataSource;
use crate::error::{DashboardError, Result};
use crate::models::{ClassifiedRecord, Field, Reading, StudentRecord};

/// Known header spellings per column, tried in order.
pub const COLUMN_ALIASES: [(Field, &[&str]); 5] = [
    (Field::Gpa, &["IPK", "IPK_Clean", "GPA"]),
    (
        Field::EconomicIndex,
        &["Indeks Ekonomi", "Indeks_Ekonomi", "economic_index"],
    ),
    (
        Field::StressManagement,
        &["Manajemen Stres", "Manajemen_Stres", "stress_management"],
    ),
    (Field::CreditLoad, &["Beban SKS", "Beban_SKS", "credit_load"]),
    (
        Field::Program,
        &["Prodi", "Program Studi (Prodi)", "program"],
    ),
];

/// Header index per canonical column, resolved once per load. GPA and
/// Program are required; the rest may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    gpa: usize,
    economic_index: Option<usize>,
    stress_management: Option<usize>,
    credit_load: Option<usize>,
    program: usize,
}

impl ColumnMap {
    pub fn resolve(headers: &StringRecord) -> Result<Self> {
        let names: Vec<&str> = headers.iter().map(str::trim).collect();
        let lookup = |field: Field| -> Option<usize> {
            COLUMN_ALIASES
                .iter()
                .find(|(candidate, _)| *candidate == field)
                .and_then(|(_, aliases)| {
                    aliases
                        .iter()
                        .find_map(|alias| names.iter().position(|name| name == alias))
                })
        };
        let require = |field: Field| -> Result<usize> {
            lookup(field).ok_or_else(|| DashboardError::Schema {
                missing: field.canonical_name(),
                available: names.iter().map(|name| name.to_string()).collect(),
            })
        };

        Ok(Self {
            gpa: require(Field::Gpa)?,
            economic_index: lookup(Field::EconomicIndex),
            stress_management: lookup(Field::StressManagement),
            credit_load: lookup(Field::CreditLoad),
            program: require(Field::Program)?,
        })
    }

    pub fn index_of(&self, field: Field) -> Option<usize> {
        match field {
            Field::Gpa => Some(self.gpa),
            Field::EconomicIndex => self.economic_index,
            Field::StressManagement => self.stress_management,
            Field::CreditLoad => self.credit_load,
            Field::Program => Some(self.program),
        }
    }

    /// Cells are decoded lossily, so bytes that are not UTF-8 end up as
    /// `Reading::Invalid` in numeric columns instead of failing the row.
    pub fn to_record(&self, row: &ByteRecord) -> StudentRecord {
        let cell = |index: Option<usize>| {
            index
                .and_then(|index| row.get(index))
                .map(String::from_utf8_lossy)
        };
        let reading = |index: Option<usize>| Reading::parse(cell(index).as_deref());
        let line = row.position().map(|position| position.line());

        let credit_load = match reading(self.credit_load) {
            Reading::Value(credits) if credits >= 0.0 && credits.fract() == 0.0 => {
                Some(credits as u32)
            }
            Reading::Missing => None,
            other => {
                debug!(?line, value = %other, "credit load is not a whole number, treated as missing");
                None
            }
        };

        StudentRecord {
            gpa: reading(Some(self.gpa)),
            economic_index: reading(self.economic_index),
            stress_management: reading(self.stress_management),
            credit_load,
            program: cell(Some(self.program))
                .map(|program| program.trim().to_string())
                .unwrap_or_default(),
        }
    }
}

pub fn read_records<R: Read>(reader: R) -> Result<Vec<StudentRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = ColumnMap::resolve(reader.headers()?)?;

    for field in Field::ALL {
        if columns.index_of(field).is_none() {
            info!(column = %field, "optional column absent, values treated as missing");
        }
    }

    let mut records = Vec::new();
    for result in reader.byte_records() {
        let row = result?;
        records.push(columns.to_record(&row));
    }
    Ok(records)
}

#[derive(Serialize)]
struct ClassifiedRow<'a> {
    #[serde(rename = "GPA")]
    gpa: String,
    #[serde(rename = "EconomicIndex")]
    economic_index: String,
    #[serde(rename = "StressManagement")]
    stress_management: String,
    #[serde(rename = "CreditLoad")]
    credit_load: Option<u32>,
    #[serde(rename = "Program")]
    program: &'a str,
    #[serde(rename = "Status")]
    status: crate::models::Status,
}

/// Writes the status-annotated dataset under canonical column names.
pub fn write_classified<W: Write>(writer: W, records: &[ClassifiedRecord]) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    for classified in records {
        let record = &classified.record;
        writer.serialize(ClassifiedRow {
            gpa: record.gpa.to_string(),
            economic_index: record.economic_index.to_string(),
            stress_management: record.stress_management.to_string(),
            credit_load: record.credit_load,
            program: &record.program,
            status: classified.status,
        })?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// An immutable, classified view of the dataset at one point in time.
#[derive(Debug)]
pub struct DatasetSnapshot {
    pub id: Uuid,
    pub source: PathBuf,
    pub loaded_at: DateTime<Utc>,
    pub modified: Option<SystemTime>,
    pub records: Vec<ClassifiedRecord>,
}

impl DatasetSnapshot {
    pub fn load(source: &DataSource) -> Result<Self> {
        let path = source.resolve()?;
        let modified = modified_time(&path);
        let file = std::fs::File::open(&path)?;
        let records = read_records(file)?;
        let records = classify::classify_all(records);

        let snapshot = Self {
            id: Uuid::new_v4(),
            source: path,
            loaded_at: Utc::now(),
            modified,
            records,
        };
        info!(
            snapshot = %snapshot.id,
            path = %snapshot.source.display(),
            records = snapshot.records.len(),
            "dataset loaded"
        );
        Ok(snapshot)
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Load-once handle over the dataset. Reloading is always an explicit call.
#[derive(Debug)]
pub struct DatasetCache {
    source: DataSource,
    current: Option<Arc<DatasetSnapshot>>,
}

impl DatasetCache {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            current: None,
        }
    }

    pub fn get_or_load(&mut self) -> Result<Arc<DatasetSnapshot>> {
        if let Some(snapshot) = &self.current {
            return Ok(Arc::clone(snapshot));
        }
        self.reload()
    }

    pub fn invalidate(&mut self) {
        if let Some(snapshot) = self.current.take() {
            info!(snapshot = %snapshot.id, "dataset snapshot invalidated");
        }
    }

    /// Swaps in a fresh snapshot. A failed load keeps the current one.
    pub fn reload(&mut self) -> Result<Arc<DatasetSnapshot>> {
        let snapshot = Arc::new(DatasetSnapshot::load(&self.source)?);
        self.invalidate();
        self.current = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Reloads when the backing file's modification time moved since the
    /// cached snapshot was taken. Loads if nothing is cached yet.
    pub fn refresh_if_changed(&mut self) -> Result<Arc<DatasetSnapshot>> {
        let Some(snapshot) = &self.current else {
            return self.reload();
        };
        let unchanged = snapshot.source.is_file()
            && self.source.resolve().ok().as_deref() == Some(snapshot.source.as_path())
            && modified_time(&snapshot.source) == snapshot.modified;
        if unchanged {
            Ok(Arc::clone(snapshot))
        } else {
            self.reload()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ews-dataset-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resolves_first_alias_present() {
        let headers = StringRecord::from(vec![
            "Nama",
            "IPK_Clean",
            "Indeks_Ekonomi",
            "Manajemen Stres",
            "Beban_SKS",
            "Program Studi (Prodi)",
        ]);
        let columns = ColumnMap::resolve(&headers).unwrap();
        assert_eq!(columns.index_of(Field::Gpa), Some(1));
        assert_eq!(columns.index_of(Field::EconomicIndex), Some(2));
        assert_eq!(columns.index_of(Field::StressManagement), Some(3));
        assert_eq!(columns.index_of(Field::CreditLoad), Some(4));
        assert_eq!(columns.index_of(Field::Program), Some(5));
    }

    #[test]
    fn earlier_alias_wins_when_both_exist() {
        let headers = StringRecord::from(vec!["GPA", "IPK", "Prodi"]);
        let columns = ColumnMap::resolve(&headers).unwrap();
        assert_eq!(columns.index_of(Field::Gpa), Some(1));
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let headers = StringRecord::from(vec!["Nama", "Prodi", "Indeks Ekonomi"]);
        match ColumnMap::resolve(&headers) {
            Err(DashboardError::Schema { missing, available }) => {
                assert_eq!(missing, "GPA");
                assert_eq!(available, vec!["Nama", "Prodi", "Indeks Ekonomi"]);
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn reads_rows_with_gaps_and_bad_cells() {
        let data = "\
IPK,Indeks Ekonomi,Manajemen Stres,Beban SKS,Prodi
3.2,0.8,3.5,21,Informatika
2.9,abc,2.0,18,Sistem Informasi
3.7,1.9
";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].credit_load, Some(21));
        assert_eq!(records[0].program, "Informatika");
        assert_eq!(records[1].economic_index, Reading::Invalid("abc".to_string()));
        assert_eq!(records[2].stress_management, Reading::Missing);
        assert_eq!(records[2].program, "");
    }

    #[test]
    fn undecodable_bytes_do_not_abort_the_load() {
        let data: &[u8] = b"IPK,Indeks Ekonomi,Manajemen Stres,Beban SKS,Prodi\n\
3.2,0.8,3.5,21,Informatika\n\
2.9,1.2,3.0,18,Sist\xffem\n\
3.1,\xfe,3.0,-2,Hukum\n";
        let records = read_records(data).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].program, "Sist\u{FFFD}em");
        assert_eq!(records[1].economic_index, Reading::Value(1.2));
        assert_eq!(
            records[2].economic_index,
            Reading::Invalid("\u{FFFD}".to_string())
        );
        assert_eq!(records[2].credit_load, None);

        let statuses: Vec<Status> = classify::classify_all(records)
            .into_iter()
            .map(|classified| classified.status)
            .collect();
        assert_eq!(
            statuses,
            vec![Status::EconomicallyVulnerable, Status::Safe, Status::Unknown]
        );
    }

    #[test]
    fn absent_optional_column_yields_missing_readings() {
        let data = "IPK,Prodi,Manajemen Stres\n3.0,Hukum,4.0\n";
        let records = read_records(data.as_bytes()).unwrap();
        assert_eq!(records[0].economic_index, Reading::Missing);
        assert_eq!(records[0].credit_load, None);
    }

    #[test]
    fn writes_status_column() {
        let data = "IPK,Indeks Ekonomi,Manajemen Stres,Beban SKS,Prodi\n3.2,0.8,3.5,21,TI\n2.9,,2.0,18,SI\n";
        let classified = classify::classify_all(read_records(data.as_bytes()).unwrap());
        let mut out = Vec::new();
        assert_eq!(write_classified(&mut out, &classified).unwrap(), 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "GPA,EconomicIndex,StressManagement,CreditLoad,Program,Status\n\
             3.2,0.8,3.5,21,TI,economically_vulnerable\n\
             2.9,,2,18,SI,unknown\n"
        );
    }

    #[test]
    fn falls_back_to_draft_file() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("processed_data_for_dashboard.csv"),
            "IPK,Indeks Ekonomi,Manajemen Stres,Beban SKS,Prodi\n3.0,0.5,3.0,20,TI\n",
        )
        .unwrap();

        let snapshot = DatasetSnapshot::load(&DataSource::Directory(dir.clone())).unwrap();
        assert!(snapshot.source.ends_with("processed_data_for_dashboard.csv"));
        assert_eq!(snapshot.records[0].status, Status::EconomicallyVulnerable);
    }

    #[test]
    fn cache_loads_once_until_invalidated() {
        let dir = temp_dir();
        let path = dir.join("processed_data_final.csv");
        std::fs::write(&path, "IPK,Prodi\n3.0,TI\n").unwrap();

        let mut cache = DatasetCache::new(DataSource::File(path.clone()));
        assert!(cache.current.is_none());
        let first = cache.get_or_load().unwrap();
        let second = cache.get_or_load().unwrap();
        assert_eq!(first.id, second.id);
        assert!(Arc::ptr_eq(&first, &second));

        cache.invalidate();
        assert!(cache.current.is_none());
        let third = cache.get_or_load().unwrap();
        assert_ne!(first.id, third.id);
        assert_eq!(first.records.len(), 1);
    }

    #[test]
    fn refresh_keeps_snapshot_when_file_unchanged() {
        let dir = temp_dir();
        let path = dir.join("processed_data_final.csv");
        std::fs::write(&path, "IPK,Prodi\n3.0,TI\n").unwrap();

        let mut cache = DatasetCache::new(DataSource::File(path));
        let first = cache.get_or_load().unwrap();
        let refreshed = cache.refresh_if_changed().unwrap();
        assert_eq!(first.id, refreshed.id);
    }

    #[test]
    fn refresh_reloads_when_file_is_rewritten() {
        let dir = temp_dir();
        let path = dir.join("processed_data_final.csv");
        std::fs::write(&path, "IPK,Prodi\n3.0,TI\n").unwrap();

        let mut cache = DatasetCache::new(DataSource::File(path.clone()));
        let first = cache.get_or_load().unwrap();
        let modified = first.modified.expect("filesystem reports mtime");

        std::fs::write(&path, "IPK,Prodi\n3.0,TI\n2.5,SI\n3.8,Hukum\n").unwrap();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_modified(modified + std::time::Duration::from_secs(60))
            .unwrap();
        drop(file);

        let refreshed = cache.refresh_if_changed().unwrap();
        assert_ne!(first.id, refreshed.id);
        assert_eq!(refreshed.records.len(), 3);
        assert_eq!(first.records.len(), 1);

        let again = cache.refresh_if_changed().unwrap();
        assert_eq!(refreshed.id, again.id);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let dir = temp_dir();
        let path = dir.join("processed_data_final.csv");
        std::fs::write(&path, "IPK,Prodi\n3.0,TI\n").unwrap();

        let mut cache = DatasetCache::new(DataSource::File(path.clone()));
        let first = cache.get_or_load().unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            cache.refresh_if_changed(),
            Err(DashboardError::MissingData { .. })
        ));
        assert_eq!(cache.get_or_load().unwrap().id, first.id);
    }

    #[test]
    fn refresh_reloads_when_primary_file_appears() {
        let dir = temp_dir();
        std::fs::write(
            dir.join("processed_data_for_dashboard.csv"),
            "IPK,Prodi\n3.0,TI\n",
        )
        .unwrap();

        let mut cache = DatasetCache::new(DataSource::Directory(dir.clone()));
        let draft = cache.get_or_load().unwrap();
        assert_eq!(draft.records.len(), 1);

        std::fs::write(
            dir.join("processed_data_final.csv"),
            "IPK,Prodi\n3.0,TI\n2.5,SI\n",
        )
        .unwrap();
        let refreshed = cache.refresh_if_changed().unwrap();
        assert_ne!(draft.id, refreshed.id);
        assert_eq!(refreshed.records.len(), 2);
    }

    #[test]
    fn missing_file_is_fatal() {
        let mut cache = DatasetCache::new(DataSource::Directory(temp_dir()));
        assert!(matches!(
            cache.get_or_load(),
            Err(DashboardError::MissingData { .. })
        ));
    }
}
