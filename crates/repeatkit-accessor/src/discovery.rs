use std::collections::BTreeMap;

use repeatkit_core::{EventId, ProjectMetadata, RepeatClass, RepeatSetup};

/// Classify `form` in every event it is designated for.
///
/// Events missing from the result do not carry the form at all. A form that
/// repeats on its own wins over a whole-event repeat setup.
pub fn classify_events(project: &ProjectMetadata, form: &str) -> BTreeMap<EventId, RepeatClass> {
    project
        .events_for_form(form)
        .map(|event_id| (event_id, classify(project.repeat_setup(event_id), form)))
        .collect()
}

fn classify(setup: Option<&RepeatSetup>, form: &str) -> RepeatClass {
    match setup {
        Some(RepeatSetup::Forms(forms)) if forms.contains(form) => RepeatClass::RepeatingInstrument,
        Some(RepeatSetup::WholeEvent) => RepeatClass::RepeatingEvent,
        Some(RepeatSetup::Forms(_)) | None => RepeatClass::Singleton,
    }
}
