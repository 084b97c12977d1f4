use repeatkit_core::wire::{encode_instance, encode_instances};
use repeatkit_core::{DataPayload, EventId, InstanceId, InstanceMap, RecordId, RecordPayload};
use repeatkit_store::RecordStore;

use crate::accessor::FormAccessor;
use crate::cache::FormData;
use crate::error::AccessError;

impl<S: RecordStore> FormAccessor<S> {
    /// Save a record's data for this form.
    ///
    /// Singleton forms take flat fields; repeating forms take every instance
    /// to write, keyed by id (use [`Self::save_instance`] for just one).
    /// Instances not mentioned are left untouched by the store.
    pub fn save(
        &mut self,
        record: &RecordId,
        data: FormData,
        event_id: Option<EventId>,
    ) -> Result<(), AccessError> {
        let (event_id, class) = self.resolve(event_id)?;

        let payload = match (&data, class.is_repeating()) {
            (FormData::Fields(fields), false) => RecordPayload::singleton(event_id, fields.clone()),
            (FormData::Instances(instances), true) => {
                RecordPayload::repeating(event_id, &self.form, encode_instances(instances))
            }
            (FormData::Instances(_), false) => {
                return Err(AccessError::InvalidInput(format!(
                    "{} is a singleton in event {event_id}, expected flat field data",
                    self.form
                )));
            }
            (FormData::Fields(_), true) => {
                return Err(AccessError::InvalidInput(format!(
                    "{} repeats in event {event_id}, expected data keyed by instance id",
                    self.form
                )));
            }
        };

        self.write(record, event_id, payload)?;
        self.cache.merge_write(record, event_id, data);
        Ok(())
    }

    /// Save one instance of a repeating form, overwriting the fields given.
    ///
    /// `instance` must be 1 or greater and `data` must be flat fields. All
    /// checks run before the store is called.
    pub fn save_instance(
        &mut self,
        record: &RecordId,
        data: FormData,
        instance: i64,
        event_id: Option<EventId>,
    ) -> Result<(), AccessError> {
        let (event_id, _) = self.resolve_repeating(event_id)?;
        let instance =
            InstanceId::new(instance).map_err(|e| AccessError::InvalidInput(e.to_string()))?;
        let FormData::Fields(fields) = data else {
            return Err(AccessError::InvalidInput(
                "instance data must be a flat field map".to_string(),
            ));
        };

        let payload =
            RecordPayload::repeating(event_id, &self.form, encode_instance(instance, &fields));
        self.write(record, event_id, payload)?;
        self.cache.merge_write(
            record,
            event_id,
            FormData::Instances(InstanceMap::from([(instance, fields)])),
        );
        Ok(())
    }

    /// Not supported: removing an instance also has to clean up attachments,
    /// locks, e-signatures and survey responses, which only the host
    /// platform's own deletion pipeline does.
    pub fn delete_instance(
        &mut self,
        record: &RecordId,
        instance: InstanceId,
        event_id: Option<EventId>,
    ) -> Result<(), AccessError> {
        tracing::debug!(
            record = %record,
            instance = %instance,
            event_id = ?event_id,
            "delete_instance called"
        );
        Err(AccessError::NotImplemented("instance deletion"))
    }

    fn write(
        &self,
        record: &RecordId,
        event_id: EventId,
        payload: RecordPayload,
    ) -> Result<(), AccessError> {
        let payload = DataPayload::from([(record.clone(), payload)]);
        let outcome = self.store.save_data(self.project.project_id, &payload)?;

        if !outcome.is_success() {
            let diagnostic =
                serde_json::to_string(&outcome).unwrap_or_else(|_| format!("{outcome:?}"));
            tracing::warn!(
                project_id = %self.project.project_id,
                form = %self.form,
                record = %record,
                event_id = %event_id,
                diagnostic = %diagnostic,
                "store rejected save"
            );
            return Err(AccessError::Save {
                record: record.clone(),
                event_id,
                diagnostic,
            });
        }

        tracing::debug!(
            project_id = %self.project.project_id,
            form = %self.form,
            record = %record,
            event_id = %event_id,
            items = outcome.item_count,
            "form data saved"
        );
        Ok(())
    }
}
