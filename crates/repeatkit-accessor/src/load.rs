use repeatkit_core::wire::decode_instances;
use repeatkit_core::{EventId, RecordId, RecordPayload, RepeatClass};
use repeatkit_store::{DataRequest, RecordStore};

use crate::accessor::FormAccessor;
use crate::cache::FormData;
use crate::error::AccessError;

impl<S: RecordStore> FormAccessor<S> {
    /// Fetch records for one event into the cache and return how many
    /// (record, event) entries were merged.
    ///
    /// `None` or an empty slice loads the whole project; an unfiltered
    /// whole-project load marks the event as exhaustively loaded. The filter
    /// is handed to the store as-is. Filtered results are merged but do not
    /// count as a full read of the record, so later reads still go to the
    /// store. Earlier reads are kept: entries are merged, not replaced.
    pub fn load(
        &mut self,
        records: Option<&[RecordId]>,
        event_id: Option<EventId>,
        filter: Option<&str>,
    ) -> Result<usize, AccessError> {
        let (event_id, class) = self.resolve(event_id)?;
        let records = records.filter(|r| !r.is_empty());
        let filter = filter.filter(|f| !f.trim().is_empty());
        let whole_project = records.is_none();

        let fetched = self.fetch(records, event_id, class, filter)?;
        let returned = fetched.len();

        let mut merged = 0;
        for (record, entry) in fetched {
            if filter.is_none() {
                self.cache.acknowledge(&record, event_id);
            }
            if let Some(entry) = entry {
                self.cache.merge_read(record, event_id, entry);
                merged += 1;
            }
        }

        if whole_project && filter.is_none() {
            self.cache.mark_exhaustive(event_id);
        }

        tracing::debug!(
            project_id = %self.project.project_id,
            form = %self.form,
            event_id = %event_id,
            class = %class,
            filtered = filter.is_some(),
            returned,
            merged,
            "form data loaded"
        );
        Ok(merged)
    }

    /// Read (record, event) through `filter` straight from the store. The
    /// cache is neither consulted nor updated.
    pub(crate) fn fetch_filtered(
        &self,
        record: &RecordId,
        event_id: EventId,
        class: RepeatClass,
        filter: &str,
    ) -> Result<FormData, AccessError> {
        let fetched = self.fetch(Some(std::slice::from_ref(record)), event_id, class, Some(filter))?;
        match fetched.into_iter().find(|(returned, _)| returned == record) {
            Some((_, entry)) => Ok(entry.unwrap_or_else(|| FormData::empty(class))),
            None => Err(AccessError::NotFound {
                record: record.clone(),
                event_id,
            }),
        }
    }

    fn fetch(
        &self,
        records: Option<&[RecordId]>,
        event_id: EventId,
        class: RepeatClass,
        filter: Option<&str>,
    ) -> Result<Vec<(RecordId, Option<FormData>)>, AccessError> {
        let request = DataRequest {
            project_id: self.project.project_id,
            records: records.map(<[RecordId]>::to_vec),
            fields: self.fields.clone(),
            event_id,
            filter: filter.map(str::to_string),
        };
        self.store
            .get_data(&request)?
            .into_iter()
            .map(|(record, data)| {
                let entry = self.extract(&data, event_id, class)?;
                Ok((record, entry))
            })
            .collect()
    }

    /// Pull this form's slice out of one record's payload. Instance keys are
    /// turned into explicit ids here.
    fn extract(
        &self,
        data: &RecordPayload,
        event_id: EventId,
        class: RepeatClass,
    ) -> Result<Option<FormData>, AccessError> {
        match class {
            RepeatClass::Singleton => Ok(data.singleton_fields(event_id).cloned().map(FormData::Fields)),
            RepeatClass::RepeatingInstrument | RepeatClass::RepeatingEvent => {
                match data.form_instances(event_id, &self.form) {
                    Some(wire) => Ok(Some(FormData::Instances(decode_instances(wire)?))),
                    None => Ok(None),
                }
            }
        }
    }

    /// Load `record` without a filter unless the cache can already answer
    /// for it.
    pub(crate) fn ensure_loaded(
        &mut self,
        record: &RecordId,
        event_id: EventId,
    ) -> Result<(), AccessError> {
        if self.cache.is_settled(record, event_id) {
            tracing::trace!(record = %record, event_id = %event_id, "cache hit");
            return Ok(());
        }
        self.load(Some(std::slice::from_ref(record)), Some(event_id), None)?;
        Ok(())
    }

    /// Cached data for (record, event): the entry itself, an empty value of
    /// the right shape when an unfiltered read returned the record without
    /// data for this form, or `NotFound`.
    pub(crate) fn cached(
        &self,
        record: &RecordId,
        event_id: EventId,
        class: RepeatClass,
    ) -> Result<FormData, AccessError> {
        if self.cache.is_acknowledged(record, event_id) {
            return Ok(self
                .cache
                .get(record, event_id)
                .cloned()
                .unwrap_or_else(|| FormData::empty(class)));
        }
        Err(AccessError::NotFound {
            record: record.clone(),
            event_id,
        })
    }
}
