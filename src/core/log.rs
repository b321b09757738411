use hashbrown::HashMap;

use crate::{qso::Qso, types::QsoId};

use super::indices::{call_key, VecIndex};

/// Errors returned by [`QsoLog`] mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// No entry with this id.
    MissingQso(QsoId),
    /// An entry with this id is already present.
    AlreadyExists(QsoId),
}

/// Caller-owned QSO log. Entries are only appended or soft-deleted, so
/// positions stay stable and analysis can borrow the backing slice.
#[derive(Debug, Default, Clone)]
pub struct QsoLog {
    records: Vec<Qso>,
    pos: HashMap<QsoId, usize>,
    by_call: VecIndex<String>,
    next_qso_id: QsoId,
}

impl QsoLog {
    /// Empty log; ids start at 1.
    pub fn new() -> Self {
        Self {
            next_qso_id: 1,
            ..Self::default()
        }
    }

    /// Rebuilds a log from entries in order, keeping their ids.
    pub fn from_qsos(qsos: Vec<Qso>) -> Result<Self, LogError> {
        let mut log = Self::new();
        for qso in qsos {
            log.insert_with_id(qso)?;
        }
        Ok(log)
    }

    /// Appends `qso` under a fresh id and returns it.
    pub fn append(&mut self, mut qso: Qso) -> QsoId {
        qso.id = self.next_qso_id;
        let id = qso.id;
        self.index(qso);
        id
    }

    /// Appends `qso` keeping its id.
    pub fn insert_with_id(&mut self, qso: Qso) -> Result<QsoId, LogError> {
        if self.pos.contains_key(&qso.id) {
            return Err(LogError::AlreadyExists(qso.id));
        }
        let id = qso.id;
        self.index(qso);
        Ok(id)
    }

    /// Sets the soft-delete flag.
    pub fn set_deleted(&mut self, id: QsoId, deleted: bool) -> Result<(), LogError> {
        let idx = *self.pos.get(&id).ok_or(LogError::MissingQso(id))?;
        self.records[idx].deleted = deleted;
        Ok(())
    }

    /// Entry with `id`.
    pub fn get(&self, id: QsoId) -> Option<&Qso> {
        self.pos.get(&id).map(|idx| &self.records[*idx])
    }

    /// Entries with `call` (deleted ones included), in log order.
    pub fn by_call(&self, call: &str) -> Vec<&Qso> {
        self.by_call
            .get(&call_key(call))
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.get(*id))
            .collect()
    }

    /// Last `n` entries.
    pub fn recent(&self, n: usize) -> &[Qso] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Every entry in log order.
    pub fn qsos(&self) -> &[Qso] {
        &self.records
    }

    /// Number of entries, deleted ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn index(&mut self, qso: Qso) {
        self.next_qso_id = self.next_qso_id.max(qso.id.saturating_add(1));
        if qso.is_contact() {
            self.by_call
                .entry(call_key(&qso.their.call))
                .or_default()
                .push(qso.id);
        }
        self.pos.insert(qso.id, self.records.len());
        self.records.push(qso);
    }
}
