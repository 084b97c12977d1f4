use repeatkit_core::{EventId, FieldMap, InstanceId, RecordId};
use repeatkit_store::{RecordStore, SurveyLinkRequest};

use crate::accessor::FormAccessor;
use crate::cache::FormData;
use crate::error::AccessError;

impl<S: RecordStore> FormAccessor<S> {
    /// All data for (record, event): every instance for a repeating form,
    /// the flat fields for a singleton. Loads on a cache miss.
    ///
    /// A record the store returned without any data for this form yields an
    /// empty value; a record the store does not know is `NotFound`.
    pub fn get_all_instances(
        &mut self,
        record: &RecordId,
        event_id: Option<EventId>,
    ) -> Result<FormData, AccessError> {
        let (event_id, class) = self.resolve(event_id)?;
        self.ensure_loaded(record, event_id)?;
        self.cached(record, event_id, class)
    }

    /// Like [`Self::get_all_instances`], narrowed to one instance when the
    /// form repeats and `instance` is given. For singleton forms `instance`
    /// is ignored.
    ///
    /// With a `filter` the read always goes to the store and returns only
    /// what passes it; the result is not cached, so instance numbering keeps
    /// working from the full set.
    pub fn get(
        &mut self,
        record: &RecordId,
        event_id: Option<EventId>,
        instance: Option<InstanceId>,
        filter: Option<&str>,
    ) -> Result<FormData, AccessError> {
        let (event_id, class) = self.resolve(event_id)?;
        let data = match filter.filter(|f| !f.trim().is_empty()) {
            Some(filter) => self.fetch_filtered(record, event_id, class, filter)?,
            None => {
                self.ensure_loaded(record, event_id)?;
                self.cached(record, event_id, class)?
            }
        };

        match (data, instance) {
            (FormData::Instances(mut instances), Some(instance)) => instances
                .remove(&instance)
                .map(FormData::Fields)
                .ok_or_else(|| AccessError::InstanceNotFound {
                    record: record.clone(),
                    event_id,
                    instance,
                }),
            (data, _) => Ok(data),
        }
    }

    /// Instance ids for (record, event) in ascending numeric order.
    fn instance_ids(
        &mut self,
        record: &RecordId,
        event_id: Option<EventId>,
    ) -> Result<Vec<InstanceId>, AccessError> {
        let (event_id, _) = self.resolve_repeating(event_id)?;
        Ok(self.get_all_instances(record, Some(event_id))?.instance_ids())
    }

    /// Lowest existing instance id, `None` when there are no instances.
    pub fn first_instance_id(
        &mut self,
        record: &RecordId,
        event_id: Option<EventId>,
    ) -> Result<Option<InstanceId>, AccessError> {
        Ok(self.instance_ids(record, event_id)?.first().copied())
    }

    /// Highest existing instance id, `None` when there are no instances.
    pub fn last_instance_id(
        &mut self,
        record: &RecordId,
        event_id: Option<EventId>,
    ) -> Result<Option<InstanceId>, AccessError> {
        Ok(self.instance_ids(record, event_id)?.last().copied())
    }

    /// Highest existing instance id plus one, or 1 when none exist. Gaps are
    /// never reused.
    pub fn next_instance_id(
        &mut self,
        record: &RecordId,
        event_id: Option<EventId>,
    ) -> Result<InstanceId, AccessError> {
        match self.last_instance_id(record, event_id)? {
            None => Ok(InstanceId::FIRST),
            Some(last) => last
                .successor()
                .ok_or_else(|| AccessError::InvalidInput(format!("no instance id after {last}"))),
        }
    }

    /// Find the instance whose stored fields contain every key/value of
    /// `needle`. When several match, the highest id wins; a matching
    /// singleton reports instance 1.
    ///
    /// Never loads: (record, event) must already have been read without a
    /// filter, otherwise this fails with `NotLoaded`.
    pub fn exists(
        &self,
        needle: &FieldMap,
        record: &RecordId,
        event_id: Option<EventId>,
    ) -> Result<Option<InstanceId>, AccessError> {
        let (event_id, _) = self.resolve(event_id)?;

        if !self.cache.is_settled(record, event_id) {
            return Err(AccessError::NotLoaded {
                record: record.clone(),
                event_id,
            });
        }
        let Some(data) = self
            .cache
            .get(record, event_id)
            .filter(|_| self.cache.is_acknowledged(record, event_id))
        else {
            return Ok(None);
        };

        let found = match data {
            FormData::Fields(fields) => contains_all(fields, needle).then_some(InstanceId::FIRST),
            FormData::Instances(instances) => instances
                .iter()
                .rev()
                .find(|(_, fields)| contains_all(fields, needle))
                .map(|(id, _)| *id),
        };

        if found.is_none() {
            tracing::debug!(record = %record, event_id = %event_id, "no instance matches the supplied data");
        }
        Ok(found)
    }

    /// Survey link for one instance of this form.
    pub fn get_survey_url(
        &self,
        record: &RecordId,
        instance: InstanceId,
        event_id: Option<EventId>,
    ) -> Result<String, AccessError> {
        if !self.is_survey() {
            return Err(AccessError::NotASurvey(self.form.clone()));
        }
        let event_id = self.resolve_event(event_id)?;

        let url = self.store.survey_link(&SurveyLinkRequest {
            project_id: self.project.project_id,
            record: record.clone(),
            form: self.form.clone(),
            event_id,
            instance,
        })?;
        Ok(url)
    }
}

fn contains_all(candidate: &FieldMap, needle: &FieldMap) -> bool {
    needle
        .iter()
        .all(|(field, value)| candidate.get(field) == Some(value))
}
