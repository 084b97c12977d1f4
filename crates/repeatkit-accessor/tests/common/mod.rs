#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use repeatkit_core::models::payload::WireInstances;
use repeatkit_core::{
    EventId, EventMeta, FieldDefinition, FieldMap, FormMeta, InstanceId, ProjectId,
    ProjectMetadata, RecordId, RecordPayload, RepeatSetup,
};
use repeatkit_store::MemoryStore;

/// Longitudinal project: baseline (medications repeat on their own),
/// follow-up (the whole event repeats), close-out (plain).
pub const STUDY: ProjectId = ProjectId(7);
pub const BASELINE: EventId = EventId(10);
pub const FOLLOWUP: EventId = EventId(20);
pub const CLOSEOUT: EventId = EventId(30);

/// Classic project with a single event.
pub const CLASSIC: ProjectId = ProjectId(8);
pub const ONLY_EVENT: EventId = EventId(100);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn rec(id: &str) -> RecordId {
    RecordId::from(id)
}

pub fn id(n: i64) -> InstanceId {
    InstanceId::new(n).unwrap()
}

fn def(field: &str, form: &str) -> FieldDefinition {
    FieldDefinition {
        field_name: field.to_string(),
        form_name: form.to_string(),
        field_type: "text".to_string(),
        field_label: String::new(),
    }
}

fn event(name: &str, forms: &[&str]) -> EventMeta {
    EventMeta {
        unique_name: name.to_string(),
        arm: 1,
        forms: forms.iter().map(|f| f.to_string()).collect(),
    }
}

fn instances(entries: &[(&str, FieldMap)]) -> WireInstances {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

pub fn study_store() -> MemoryStore {
    let metadata = ProjectMetadata {
        project_id: STUDY,
        longitudinal: true,
        forms: BTreeMap::from([
            ("demographics".to_string(), FormMeta::default()),
            ("medications".to_string(), FormMeta::default()),
            (
                "consent".to_string(),
                FormMeta {
                    label: "Consent".to_string(),
                    survey_id: Some(3),
                },
            ),
        ]),
        events: BTreeMap::from([
            (BASELINE, event("baseline_arm_1", &["demographics", "medications", "consent"])),
            (FOLLOWUP, event("followup_arm_1", &["medications"])),
            (CLOSEOUT, event("closeout_arm_1", &["demographics"])),
        ]),
        repeating: BTreeMap::from([
            (BASELINE, RepeatSetup::Forms(BTreeSet::from(["medications".to_string()]))),
            (FOLLOWUP, RepeatSetup::WholeEvent),
        ]),
    };
    let dictionary = vec![
        def("dob", "demographics"),
        def("sex", "demographics"),
        def("med_name", "medications"),
        def("med_dose", "medications"),
        def("consent_signed", "consent"),
    ];

    let store = MemoryStore::new();
    store.add_project(metadata, dictionary).unwrap();

    store
        .put_record(
            STUDY,
            "1",
            RecordPayload::singleton(BASELINE, fields(&[("dob", "2001-02-03"), ("sex", "1")])),
        )
        .unwrap();
    store
        .put_record(
            STUDY,
            "1",
            RecordPayload::repeating(
                BASELINE,
                "medications",
                instances(&[
                    ("", fields(&[("med_name", "aspirin"), ("med_dose", "81")])),
                    ("2", fields(&[("med_name", "ibuprofen"), ("med_dose", "200")])),
                    ("5", fields(&[("med_name", "statin"), ("med_dose", "20")])),
                ]),
            ),
        )
        .unwrap();

    store
        .put_record(STUDY, "2", RecordPayload::singleton(BASELINE, fields(&[("sex", "2")])))
        .unwrap();

    store
        .put_record(
            STUDY,
            "3",
            RecordPayload::repeating(
                BASELINE,
                "medications",
                instances(&[
                    ("3", fields(&[("med_name", "c")])),
                    ("1", fields(&[("med_name", "a")])),
                    ("7", fields(&[("med_name", "g")])),
                ]),
            ),
        )
        .unwrap();

    store
        .put_record(
            STUDY,
            "4",
            RecordPayload::repeating(
                FOLLOWUP,
                "medications",
                instances(&[
                    ("", fields(&[("med_name", "metformin")])),
                    ("2", fields(&[("med_name", "insulin")])),
                ]),
            ),
        )
        .unwrap();

    store
}

pub fn classic_store() -> MemoryStore {
    let metadata = ProjectMetadata {
        project_id: CLASSIC,
        longitudinal: false,
        forms: BTreeMap::from([
            ("intake".to_string(), FormMeta::default()),
            ("notes".to_string(), FormMeta::default()),
        ]),
        events: BTreeMap::from([(ONLY_EVENT, event("event_1_arm_1", &["intake", "notes"]))]),
        repeating: BTreeMap::from([(
            ONLY_EVENT,
            RepeatSetup::Forms(BTreeSet::from(["notes".to_string()])),
        )]),
    };
    let dictionary = vec![
        def("height", "intake"),
        def("weight", "intake"),
        def("note_text", "notes"),
    ];

    let store = MemoryStore::new();
    store.add_project(metadata, dictionary).unwrap();
    store
        .put_record(CLASSIC, "A", RecordPayload::singleton(ONLY_EVENT, fields(&[("height", "180")])))
        .unwrap();
    store
        .put_record(
            CLASSIC,
            "A",
            RecordPayload::repeating(
                ONLY_EVENT,
                "notes",
                instances(&[
                    ("", fields(&[("note_text", "first")])),
                    ("2", fields(&[("note_text", "second")])),
                ]),
            ),
        )
        .unwrap();
    store
}
