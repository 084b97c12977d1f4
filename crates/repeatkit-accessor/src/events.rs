use repeatkit_core::{EventId, RepeatClass};
use repeatkit_store::RecordStore;

use crate::accessor::FormAccessor;
use crate::error::AccessError;

impl<S: RecordStore> FormAccessor<S> {
    /// Turn an optional event id into one the form is enabled in.
    ///
    /// Without an id, a non-longitudinal project falls back to its only
    /// event; a longitudinal project fails with `MissingEvent`.
    pub fn resolve_event(&self, event_id: Option<EventId>) -> Result<EventId, AccessError> {
        self.resolve(event_id).map(|(event_id, _)| event_id)
    }

    pub(crate) fn resolve(
        &self,
        event_id: Option<EventId>,
    ) -> Result<(EventId, RepeatClass), AccessError> {
        let event_id = match event_id {
            Some(event_id) => event_id,
            None if self.project.longitudinal => {
                return Err(AccessError::MissingEvent(self.project.project_id));
            }
            None => self
                .project
                .first_event_id()
                .ok_or(AccessError::MissingEvent(self.project.project_id))?,
        };

        let class = self
            .classes
            .get(&event_id)
            .copied()
            .ok_or_else(|| AccessError::FormNotEnabled {
                form: self.form.clone(),
                event_id,
            })?;
        Ok((event_id, class))
    }

    /// Resolve and require one of the repeating classifications.
    pub(crate) fn resolve_repeating(
        &self,
        event_id: Option<EventId>,
    ) -> Result<(EventId, RepeatClass), AccessError> {
        let (event_id, class) = self.resolve(event_id)?;
        if !class.is_repeating() {
            return Err(AccessError::WrongClassification {
                form: self.form.clone(),
                event_id,
                actual: class,
                expected: "repeating",
            });
        }
        Ok((event_id, class))
    }
}
