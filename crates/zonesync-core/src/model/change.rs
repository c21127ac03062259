use std::fmt;

use super::record::Record;

/// Kind of mutation a change performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// Insert a new record; the record id is always 0
    Create,
    /// Replace the record with the given id
    Update,
    /// Remove the record with the given id
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        })
    }
}

/// One planned operation against a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub record: Record,
}

impl Change {
    pub fn create(mut record: Record) -> Self {
        record.id = 0;
        Self {
            action: ChangeAction::Create,
            record,
        }
    }

    pub fn update(record: Record) -> Self {
        Self {
            action: ChangeAction::Update,
            record,
        }
    }

    pub fn delete(record: Record) -> Self {
        Self {
            action: ChangeAction::Delete,
            record,
        }
    }

    /// Update and Delete need a persisted record to act on
    pub fn is_matched(&self) -> bool {
        self.action == ChangeAction::Create || self.record.is_persisted()
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = &self.record;
        if r.id != 0 {
            write!(
                f,
                "{} zone (ID : {}) : {} {} IN {} {}",
                r.zone, r.id, r.sub_domain, r.ttl, r.field_type, r.target
            )
        } else {
            write!(
                f,
                "{} zone : {} {} IN {} {}",
                r.zone, r.sub_domain, r.ttl, r.field_type, r.target
            )
        }
    }
}

/// Tally of a change list by action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ChangeCounts {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

impl ChangeCounts {
    pub fn of(changes: &[Change]) -> Self {
        changes.iter().fold(Self::default(), |mut acc, c| {
            match c.action {
                ChangeAction::Create => acc.create += 1,
                ChangeAction::Update => acc.update += 1,
                ChangeAction::Delete => acc.delete += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.create + self.update + self.delete
    }
}
