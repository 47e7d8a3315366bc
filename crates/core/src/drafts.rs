//! Draft collection with separate local and API namespaces.
//!
//! A local and an API draft may share an id; every operation addresses a
//! draft by `(id, source)` and never moves a draft between namespaces.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::draft::{Draft, DraftSource};
use crate::domain::request::{RequestId, ServiceRequest};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DraftBook {
    local: BTreeMap<RequestId, Draft>,
    api: BTreeMap<RequestId, Draft>,
}

impl DraftBook {
    pub fn from_local(drafts: impl IntoIterator<Item = Draft>) -> Self {
        let mut book = Self::default();
        for draft in drafts.into_iter().filter(|draft| draft.source == DraftSource::Local) {
            book.local.insert(draft.id.clone(), draft);
        }
        book
    }

    /// Replaces or inserts a local draft, keeping the original `created_at`.
    pub fn upsert_local(&mut self, id: RequestId, data: ServiceRequest, now: DateTime<Utc>) -> &Draft {
        let created_at = self.local.get(&id).map_or(now, |existing| existing.created_at);
        let draft = Draft { id: id.clone(), created_at, last_modified: now, data, source: DraftSource::Local };
        self.local.insert(id.clone(), draft);
        &self.local[&id]
    }

    /// Replaces the whole API namespace. Drafts are re-tagged `Api` whatever
    /// the server sent.
    pub fn replace_remote(&mut self, drafts: impl IntoIterator<Item = Draft>) {
        self.api = drafts
            .into_iter()
            .map(|draft| (draft.id.clone(), Draft { source: DraftSource::Api, ..draft }))
            .collect();
    }

    pub fn remove(&mut self, id: &RequestId, source: DraftSource) -> Option<Draft> {
        self.namespace_mut(source).remove(id)
    }

    /// Drops every local draft and returns how many were removed.
    pub fn clear_local_only(&mut self) -> usize {
        let removed = self.local.len();
        self.local.clear();
        removed
    }

    pub fn get(&self, id: &RequestId, source: DraftSource) -> Option<&Draft> {
        self.namespace(source).get(id)
    }

    pub fn local(&self) -> impl Iterator<Item = &Draft> {
        self.local.values()
    }

    pub fn api(&self) -> impl Iterator<Item = &Draft> {
        self.api.values()
    }

    /// Every draft, most recently modified first.
    pub fn all(&self) -> Vec<&Draft> {
        let mut drafts: Vec<&Draft> = self.local.values().chain(self.api.values()).collect();
        drafts.sort_by(|left, right| right.last_modified.cmp(&left.last_modified));
        drafts
    }

    pub fn len(&self) -> usize {
        self.local.len() + self.api.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn namespace(&self, source: DraftSource) -> &BTreeMap<RequestId, Draft> {
        match source {
            DraftSource::Local => &self.local,
            DraftSource::Api => &self.api,
        }
    }

    fn namespace_mut(&mut self, source: DraftSource) -> &mut BTreeMap<RequestId, Draft> {
        match source {
            DraftSource::Local => &mut self.local,
            DraftSource::Api => &mut self.api,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::DraftBook;
    use crate::domain::draft::{Draft, DraftSource};
    use crate::domain::request::{RequestId, ServiceRequest};

    fn id(raw: &str) -> RequestId {
        RequestId(raw.to_string())
    }

    fn api_draft(raw: &str) -> Draft {
        Draft {
            id: id(raw),
            created_at: Utc::now(),
            last_modified: Utc::now(),
            data: ServiceRequest::default(),
            source: DraftSource::Local,
        }
    }

    #[test]
    fn local_upsert_leaves_api_namespace_untouched() {
        let mut book = DraftBook::default();
        book.replace_remote([api_draft("A1"), api_draft("A2")]);
        let api_before: Vec<Draft> = book.api().cloned().collect();
        assert!(api_before.iter().all(|draft| draft.source == DraftSource::Api));

        book.upsert_local(id("L1"), ServiceRequest::default(), Utc::now());

        assert_eq!(book.api().cloned().collect::<Vec<_>>(), api_before);
        assert_eq!(book.local().count(), 1);
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn same_id_is_independently_removable_per_source() {
        let mut book = DraftBook::default();
        book.replace_remote([api_draft("R1")]);
        book.upsert_local(id("R1"), ServiceRequest::default(), Utc::now());

        assert!(book.remove(&id("R1"), DraftSource::Local).is_some());
        assert!(book.get(&id("R1"), DraftSource::Api).is_some());
        assert!(book.remove(&id("R1"), DraftSource::Local).is_none());
    }

    #[test]
    fn upsert_keeps_creation_time_and_clear_spares_api_drafts() {
        let mut book = DraftBook::default();
        let first = Utc::now();
        let later = first + Duration::minutes(5);
        book.upsert_local(id("R1"), ServiceRequest::default(), first);
        let updated = book.upsert_local(id("R1"), ServiceRequest::default(), later).clone();

        assert_eq!(updated.created_at, first);
        assert_eq!(updated.last_modified, later);

        book.replace_remote([api_draft("R2")]);
        assert_eq!(book.clear_local_only(), 1);
        assert_eq!(book.api().count(), 1);
        assert_eq!(book.all()[0].id, id("R2"));
    }
}
