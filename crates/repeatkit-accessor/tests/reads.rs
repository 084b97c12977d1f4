mod common;

use common::*;
use repeatkit_accessor::{AccessError, ErrorKind, FormAccessor, FormData};
use repeatkit_core::{InstanceId, InstanceMap};

#[test]
fn singleton_data_has_no_instance_dimension() {
    init_tracing();
    let store = study_store();
    let mut demo = FormAccessor::new(&store, STUDY, "demographics").unwrap();

    let data = demo.get_all_instances(&rec("1"), Some(BASELINE)).unwrap();
    assert_eq!(data, FormData::Fields(fields(&[("dob", "2001-02-03"), ("sex", "1")])));
}

#[test]
fn repeating_data_is_keyed_by_explicit_instance_ids() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let data = meds.get_all_instances(&rec("1"), Some(BASELINE)).unwrap();
    let instances = data.as_instances().unwrap();
    assert_eq!(instances.keys().map(|i| i.get()).collect::<Vec<_>>(), vec![1, 2, 5]);
    assert_eq!(instances[&InstanceId::FIRST]["med_name"], "aspirin");
}

#[test]
fn repeating_event_reads_like_repeating_instrument() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let data = meds.get_all_instances(&rec("4"), Some(FOLLOWUP)).unwrap();
    let expected = InstanceMap::from([
        (InstanceId::FIRST, fields(&[("med_name", "metformin")])),
        (id(2), fields(&[("med_name", "insulin")])),
    ]);
    assert_eq!(data, FormData::Instances(expected));
}

#[test]
fn get_narrows_to_one_instance() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let second = meds.get(&rec("1"), Some(BASELINE), Some(id(2)), None).unwrap();
    assert_eq!(
        second,
        FormData::Fields(fields(&[("med_name", "ibuprofen"), ("med_dose", "200")]))
    );

    let all = meds.get(&rec("1"), Some(BASELINE), None, None).unwrap();
    assert_eq!(all.instance_ids().len(), 3);

    let err = meds.get(&rec("1"), Some(BASELINE), Some(id(3)), None).unwrap_err();
    assert!(matches!(err, AccessError::InstanceNotFound { instance, .. } if instance == id(3)));
    assert_eq!(err.kind(), ErrorKind::InstanceNotFound);
}

#[test]
fn singleton_get_ignores_instance() {
    let store = classic_store();
    let mut intake = FormAccessor::new(&store, CLASSIC, "intake").unwrap();

    let data = intake.get(&rec("A"), None, Some(id(9)), None).unwrap();
    assert_eq!(data, FormData::Fields(fields(&[("height", "180")])));
}

#[test]
fn unknown_record_is_not_found() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let err = meds.get_all_instances(&rec("999"), Some(BASELINE)).unwrap_err();
    assert!(matches!(err, AccessError::NotFound { ref record, .. } if record.as_str() == "999"));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn known_record_without_form_data_is_empty() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let data = meds.get_all_instances(&rec("2"), Some(BASELINE)).unwrap();
    assert_eq!(data, FormData::Instances(InstanceMap::new()));
    assert!(data.is_empty());

    let mut demo = FormAccessor::new(&store, STUDY, "demographics").unwrap();
    let data = demo.get_all_instances(&rec("3"), Some(BASELINE)).unwrap();
    assert_eq!(data, FormData::Fields(Default::default()));
}

#[test]
fn cached_reads_do_not_hit_the_store_again() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    meds.get_all_instances(&rec("1"), Some(BASELINE)).unwrap();
    meds.get(&rec("1"), Some(BASELINE), Some(id(5)), None).unwrap();
    meds.last_instance_id(&rec("1"), Some(BASELINE)).unwrap();
    assert_eq!(store.get_calls(), 1);

    // Acknowledged-but-empty records are settled too.
    meds.get_all_instances(&rec("2"), Some(BASELINE)).unwrap();
    meds.get_all_instances(&rec("2"), Some(BASELINE)).unwrap();
    assert_eq!(store.get_calls(), 2);
}

#[test]
fn first_and_last_use_numeric_order() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    assert_eq!(meds.first_instance_id(&rec("3"), Some(BASELINE)).unwrap(), Some(id(1)));
    assert_eq!(meds.last_instance_id(&rec("3"), Some(BASELINE)).unwrap(), Some(id(7)));
}

#[test]
fn next_instance_skips_past_gaps() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    assert_eq!(meds.next_instance_id(&rec("1"), Some(BASELINE)).unwrap(), id(6));
    assert_eq!(meds.next_instance_id(&rec("3"), Some(BASELINE)).unwrap(), id(8));
}

#[test]
fn no_instances_is_a_result_not_an_error() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    assert_eq!(meds.first_instance_id(&rec("2"), Some(BASELINE)).unwrap(), None);
    assert_eq!(meds.last_instance_id(&rec("2"), Some(BASELINE)).unwrap(), None);
    assert_eq!(meds.next_instance_id(&rec("2"), Some(BASELINE)).unwrap(), InstanceId::FIRST);
}

#[test]
fn instance_queries_propagate_failures() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();
    assert_eq!(
        meds.next_instance_id(&rec("999"), Some(BASELINE)).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    let mut demo = FormAccessor::new(&store, STUDY, "demographics").unwrap();
    assert_eq!(
        demo.first_instance_id(&rec("1"), Some(BASELINE)).unwrap_err().kind(),
        ErrorKind::WrongClassification
    );
}

#[test]
fn loads_merge_instead_of_replacing() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    assert_eq!(meds.load(Some(&[rec("1")]), Some(BASELINE), None).unwrap(), 1);
    assert_eq!(meds.load(Some(&[rec("3")]), Some(BASELINE), None).unwrap(), 1);
    assert_eq!(store.get_calls(), 2);

    assert_eq!(meds.get_all_instances(&rec("1"), Some(BASELINE)).unwrap().instance_ids().len(), 3);
    assert_eq!(meds.get_all_instances(&rec("3"), Some(BASELINE)).unwrap().instance_ids().len(), 3);
    assert_eq!(store.get_calls(), 2);
}

#[test]
fn whole_project_load_is_exhaustive() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let merged = meds.load(None, Some(BASELINE), None).unwrap();
    assert_eq!(merged, 2);
    assert!(meds.cache().is_exhaustive(BASELINE));

    let err = meds.get(&rec("999"), Some(BASELINE), None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.get_calls(), 1);

    // Other events are not covered.
    assert!(!meds.cache().is_exhaustive(FOLLOWUP));
    meds.get_all_instances(&rec("4"), Some(FOLLOWUP)).unwrap();
    assert_eq!(store.get_calls(), 2);
}

#[test]
fn filtered_whole_project_load_is_not_exhaustive() {
    let store = study_store();
    let mut demo = FormAccessor::new(&store, STUDY, "demographics").unwrap();

    assert_eq!(demo.load(None, Some(BASELINE), Some("[sex] = '2'")).unwrap(), 1);
    assert!(!demo.cache().is_exhaustive(BASELINE));

    let data = demo.get_all_instances(&rec("1"), Some(BASELINE)).unwrap();
    assert_eq!(data.as_fields().unwrap()["sex"], "1");
    assert_eq!(store.get_calls(), 2);
}

#[test]
fn filter_on_get_is_passed_to_the_store() {
    let store = study_store();
    let mut demo = FormAccessor::new(&store, STUDY, "demographics").unwrap();

    let err = demo
        .get(&rec("1"), Some(BASELINE), None, Some("[sex] = '2'"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn filtered_get_leaves_instance_numbering_intact() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let filtered = meds
        .get(&rec("1"), Some(BASELINE), None, Some("[med_name] = 'aspirin'"))
        .unwrap();
    assert_eq!(filtered.instance_ids(), vec![InstanceId::FIRST]);
    assert!(meds.cache().is_empty());

    assert_eq!(meds.next_instance_id(&rec("1"), Some(BASELINE)).unwrap(), id(6));
    let fifth = meds.get(&rec("1"), Some(BASELINE), Some(id(5)), None).unwrap();
    assert_eq!(fifth.as_fields().unwrap()["med_name"], "statin");
    assert_eq!(store.get_calls(), 2);
}

#[test]
fn filtered_load_does_not_settle_the_record() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let merged = meds
        .load(Some(&[rec("1")]), Some(BASELINE), Some("[med_name] = 'aspirin'"))
        .unwrap();
    assert_eq!(merged, 1);

    let err = meds
        .exists(&fields(&[("med_name", "statin")]), &rec("1"), Some(BASELINE))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotLoaded);

    assert_eq!(meds.last_instance_id(&rec("1"), Some(BASELINE)).unwrap(), Some(id(5)));
    assert_eq!(store.get_calls(), 2);
    assert_eq!(
        meds.exists(&fields(&[("med_name", "statin")]), &rec("1"), Some(BASELINE)).unwrap(),
        Some(id(5))
    );
}

#[test]
fn exists_finds_matching_instance() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();
    meds.load(Some(&[rec("1")]), Some(BASELINE), None).unwrap();

    let hit = meds
        .exists(&fields(&[("med_name", "ibuprofen")]), &rec("1"), Some(BASELINE))
        .unwrap();
    assert_eq!(hit, Some(id(2)));

    let partial = meds
        .exists(&fields(&[("med_name", "statin"), ("med_dose", "20")]), &rec("1"), Some(BASELINE))
        .unwrap();
    assert_eq!(partial, Some(id(5)));

    let miss = meds
        .exists(&fields(&[("med_name", "statin"), ("med_dose", "40")]), &rec("1"), Some(BASELINE))
        .unwrap();
    assert_eq!(miss, None);
}

#[test]
fn exists_prefers_the_highest_matching_instance() {
    let store = study_store();
    let mut meds = FormAccessor::new(&store, STUDY, "medications").unwrap();
    meds.load(Some(&[rec("3")]), Some(BASELINE), None).unwrap();

    assert_eq!(meds.exists(&fields(&[]), &rec("3"), Some(BASELINE)).unwrap(), Some(id(7)));
}

#[test]
fn exists_on_singleton_reports_first_instance() {
    let store = classic_store();
    let mut intake = FormAccessor::new(&store, CLASSIC, "intake").unwrap();
    intake.load(Some(&[rec("A")]), None, None).unwrap();

    assert_eq!(
        intake.exists(&fields(&[("height", "180")]), &rec("A"), None).unwrap(),
        Some(InstanceId::FIRST)
    );
    assert_eq!(intake.exists(&fields(&[("height", "170")]), &rec("A"), None).unwrap(), None);
}

#[test]
fn exists_never_loads() {
    let store = study_store();
    let meds = FormAccessor::new(&store, STUDY, "medications").unwrap();

    let err = meds
        .exists(&fields(&[("med_name", "aspirin")]), &rec("1"), Some(BASELINE))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotLoaded);
    assert_eq!(store.get_calls(), 0);
}

#[test]
fn survey_url_only_for_surveys() {
    let store = study_store();
    let consent = FormAccessor::new(&store, STUDY, "consent").unwrap();
    let url = consent
        .get_survey_url(&rec("1"), InstanceId::FIRST, Some(BASELINE))
        .unwrap();
    assert!(url.contains("/surveys/?s="));

    let meds = FormAccessor::new(&store, STUDY, "medications").unwrap();
    let err = meds
        .get_survey_url(&rec("1"), InstanceId::FIRST, Some(BASELINE))
        .unwrap_err();
    assert!(matches!(err, AccessError::NotASurvey(ref form) if form == "medications"));
}
