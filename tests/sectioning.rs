use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use qsoscore::{
    config::Settings,
    engine::{
        errors::{ErrorSink, HandlerError, HandlerResult},
        registry::{ref_hook, HookCategory, Registry},
        score::{Contribution, Score},
        sections::{analyze_and_section_qsos, AnalyzeInput, Analysis, SectionEngine},
        traits::{
            AccumulateInput, Accumulator, DayAccumulator, Handler, QsoScorer, ScoringInput,
            SummarizeInput, Summarizer,
        },
    },
    handlers::activity::{ActivityScoringPolicy, Dimension},
    operation::{Operation, OperationPatch},
    qso::{EventKind, Qso, Reference, SpotInfo},
    types::{Band, Mode, QsoId, DAY_MS},
};

fn qso(id: QsoId, call: &str, band: Band, mode: Mode, ts: u64) -> Qso {
    Qso::contact(id, call, band, mode, Some(ts))
}

fn pota_registry() -> Registry {
    let mut registry = Registry::with_builtins();
    registry.register_activity(
        ActivityScoringPolicy::builder("pota", "potaActivation")
            .hunting_type("pota")
            .unique_per([Dimension::Band, Dimension::Mode])
            .qsos_to_activate(1)
            .build()
            .expect("valid descriptor"),
    );
    registry
}

fn analyze_with(
    registry: &Registry,
    qsos: &[Qso],
    operation: &Operation,
    show_deleted: bool,
) -> Analysis {
    analyze_and_section_qsos(
        registry,
        &AnalyzeInput {
            qsos,
            operation,
            settings: &Settings::default(),
            show_deleted_qsos: show_deleted,
        },
    )
}

fn analyze(registry: &Registry, qsos: &[Qso], operation: &Operation) -> Analysis {
    analyze_with(registry, qsos, operation, false)
}

#[test]
fn two_days_make_two_sections() {
    let registry = Registry::with_builtins();
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000).with_location("K", Some("ME")),
        qso(2, "W2XYZ", Band::B40m, Mode::CW, DAY_MS + 1_000).with_location("K", Some("NY")),
    ];
    let analysis = analyze(&registry, &qsos, &Operation::default());

    assert_eq!(analysis.sections.len(), 2);
    let (day1, day2) = (&analysis.sections[0], &analysis.sections[1]);
    assert_eq!((day1.day, day2.day), (0, DAY_MS));
    assert_eq!((day1.count, day2.count), (1, 1));

    // day-style resets
    assert_eq!(day1.scores["defaultOperation"].qsos, 1);
    assert_eq!(day2.scores["defaultOperation"].qsos, 1);

    // operation-style carries over
    assert_eq!(day1.scores["entities"].qsos, 1);
    assert_eq!(day2.scores["entities"].qsos, 2);
    assert_eq!(day2.scores["entities"].tally("K"), 2);
    assert_eq!(day1.scores["primarySubdivisions"].value, 1);
    assert_eq!(day2.scores["primarySubdivisions"].value, 2);
    assert_eq!(day1.scores["bandsAndModes"].value, 2);
    assert_eq!(day2.scores["bandsAndModes"].value, 4);
    assert_eq!(day2.scores["secondarySubdivisions"].value, 0);
}

#[test]
fn carried_seed_is_the_exact_prior_score() {
    let registry = pota_registry();
    let operation = Operation::with_refs(vec![Reference::new("potaActivation", "US-0001")]);
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000).with_location("K", Some("ME")),
        Qso::marker(2, EventKind::Note, Some(DAY_MS + 1_000), None),
    ];
    let analysis = analyze(&registry, &qsos, &operation);
    let (day1, day2) = (&analysis.sections[0], &analysis.sections[1]);

    for key in ["entities", "primarySubdivisions", "bandsAndModes"] {
        assert_eq!(day1.scores[key].undecorated(), day2.scores[key].undecorated(), "{key}");
    }

    // the activation resets to its declared empty shape
    assert_eq!(day1.scores["potaActivation"].activated, Some(true));
    let reset = &day2.scores["potaActivation"];
    assert_eq!((reset.qsos, reset.activated), (0, Some(false)));
    assert_eq!(day2.events, 1);
    assert_eq!(day2.count, 0);
}

#[test]
fn summaries_close_every_section_and_roll_up_at_the_end() {
    let registry = Registry::with_builtins();
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000),
        qso(2, "K1ABC", Band::B20m, Mode::SSB, 2_000),
        qso(3, "W2XYZ", Band::B40m, Mode::CW, DAY_MS + 1_000),
    ];
    let analysis = analyze(&registry, &qsos, &Operation::default());

    let first = analysis.sections[0].scores["defaultOperation"]
        .presentation
        .as_ref()
        .expect("summarized");
    assert_eq!(first.summary, "1 QSOs, 1 dupes");
    assert_eq!(first.long_summary, None);

    let last = analysis.sections[1].scores["defaultOperation"]
        .presentation
        .as_ref()
        .expect("summarized");
    assert_eq!(last.summary, "1 QSOs");
    assert_eq!(last.long_summary.as_deref(), Some("2 QSOs over 2 days"));
}

#[test]
fn start_event_re_resolves_and_keeps_scores() {
    let registry = pota_registry();
    let patch = OperationPatch {
        refs: Some(vec![Reference::new("potaActivation", "US-0001")]),
        ..OperationPatch::default()
    };
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000),
        Qso::marker(2, EventKind::Start, Some(2_000), Some(patch)),
        qso(3, "W2XYZ", Band::B20m, Mode::SSB, 3_000),
    ];
    let analysis = analyze(&registry, &qsos, &Operation::default());

    assert_eq!(analysis.sections.len(), 1);
    let section = &analysis.sections[0];
    assert_eq!((section.count, section.events), (2, 1));

    assert!(analysis.qso_scores[&1].contains_key("defaultOperation"));
    assert!(!analysis.qso_scores[&1].contains_key("potaActivation"));
    assert!(analysis.qso_scores[&3].contains_key("potaActivation"));
    assert!(!analysis.qso_scores[&3].contains_key("defaultOperation"));

    assert_eq!(section.scores["defaultOperation"].qsos, 1);
    assert_eq!(section.scores["potaActivation"].qsos, 1);
    assert_eq!(section.scores["bandsAndModes"].tally("band:20m"), 2);
}

#[test]
fn break_without_patch_returns_to_base_operation() {
    let registry = pota_registry();
    let base = Operation::with_refs(vec![Reference::new("potaActivation", "US-0001")]);
    let away = OperationPatch {
        refs: Some(Vec::new()),
        ..OperationPatch::default()
    };
    let qsos = vec![
        Qso::marker(1, EventKind::Start, Some(500), Some(away)),
        qso(2, "K1ABC", Band::B20m, Mode::SSB, 1_000),
        Qso::marker(3, EventKind::Break, Some(2_000), None),
        qso(4, "W2XYZ", Band::B20m, Mode::SSB, 3_000),
    ];
    let analysis = analyze(&registry, &qsos, &base);

    assert!(analysis.qso_scores[&2].contains_key("defaultOperation"));
    assert!(analysis.qso_scores[&4].contains_key("potaActivation"));
    assert_eq!(analysis.sections[0].scores["potaActivation"].qsos, 1);
}

#[test]
fn note_events_do_not_re_resolve() {
    let registry = pota_registry();
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000),
        Qso::marker(2, EventKind::Note, Some(2_000), None),
        qso(3, "W2XYZ", Band::B20m, Mode::SSB, 3_000),
    ];
    let analysis = analyze(&registry, &qsos, &Operation::default());
    assert_eq!(analysis.sections[0].scores["defaultOperation"].qsos, 2);
    assert_eq!(analysis.sections[0].events, 1);
}

#[test]
fn deleted_and_spot_entries() {
    let registry = Registry::with_builtins();
    let mut gone = qso(2, "K1ABC", Band::B20m, Mode::SSB, 2_000);
    gone.deleted = true;
    let mut spot = qso(4, "N3QQ", Band::B20m, Mode::SSB, 4_000);
    spot.spot = Some(SpotInfo {
        source: "rbn".to_string(),
        comments: None,
    });
    let qsos = vec![
        qso(1, "W2XYZ", Band::B20m, Mode::SSB, 1_000),
        gone,
        qso(3, "K1ABC", Band::B20m, Mode::SSB, 3_000),
        spot,
    ];

    let hidden = analyze(&registry, &qsos, &Operation::default());
    let ids = |v: &[Qso]| v.iter().map(|q| q.id).collect::<Vec<_>>();
    assert_eq!(ids(&hidden.qsos), vec![1, 3]);
    assert_eq!(ids(&hidden.active_qsos), vec![1, 3]);
    let section = &hidden.sections[0];
    assert_eq!((section.count, section.deleted, section.events), (2, 1, 0));
    assert_eq!(ids(&section.data), vec![1, 3]);
    // a deleted contact is not a dupe source
    assert_eq!(hidden.qso_scores[&3]["defaultOperation"].value, 1);

    let shown = analyze_with(&registry, &qsos, &Operation::default(), true);
    assert_eq!(ids(&shown.qsos), vec![1, 2, 3]);
    assert_eq!(ids(&shown.active_qsos), vec![1, 3]);
    assert_eq!(ids(&shown.sections[0].data), vec![1, 2, 3]);
}

#[test]
fn start_event_can_switch_settings() {
    let registry = pota_registry();
    let quiet = OperationPatch {
        settings: Some(Settings {
            general_hunting: false,
            ..Settings::default()
        }),
        ..OperationPatch::default()
    };
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000),
        Qso::marker(2, EventKind::Start, Some(2_000), Some(quiet)),
        qso(3, "W2XYZ", Band::B20m, Mode::SSB, 3_000),
        Qso::marker(4, EventKind::Break, Some(4_000), None),
        qso(5, "N3QQ", Band::B20m, Mode::SSB, 5_000),
    ];
    let analysis = analyze(&registry, &qsos, &Operation::default());

    assert!(analysis.qso_scores[&1].contains_key("pota"));
    assert!(!analysis.qso_scores[&3].contains_key("pota"));
    assert!(analysis.qso_scores[&3].contains_key("defaultOperation"));
    // a bare break restores the run-wide settings
    assert!(analysis.qso_scores[&5].contains_key("pota"));
    assert_eq!(analysis.sections.len(), 1);
}

#[test]
fn leading_deleted_or_untimed_entries_join_the_first_day() {
    let registry = Registry::with_builtins();
    let day5 = 5 * DAY_MS;
    let shape = |a: &Analysis| {
        a.sections
            .iter()
            .map(|s| (s.day, s.count, s.deleted))
            .collect::<Vec<_>>()
    };

    let mut gone = qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000);
    gone.deleted = true;
    let deleted_first = vec![gone, qso(2, "W2XYZ", Band::B20m, Mode::SSB, day5)];
    let analysis = analyze(&registry, &deleted_first, &Operation::default());
    assert_eq!(shape(&analysis), vec![(day5, 1, 1)]);

    let untimed_first = vec![
        Qso::contact(1, "K1ABC", Band::B20m, Mode::SSB, None),
        qso(2, "W2XYZ", Band::B20m, Mode::SSB, day5),
    ];
    let analysis = analyze(&registry, &untimed_first, &Operation::default());
    assert_eq!(shape(&analysis), vec![(day5, 2, 0)]);
    let ids: Vec<QsoId> = analysis.sections[0].data.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(analysis.qso_scores.contains_key(&1));

    let only_untimed = vec![Qso::contact(1, "K1ABC", Band::B20m, Mode::SSB, None)];
    let analysis = analyze(&registry, &only_untimed, &Operation::default());
    assert_eq!(shape(&analysis), vec![(0, 1, 0)]);
}

#[test]
fn empty_log_has_no_sections() {
    let analysis = analyze(&Registry::with_builtins(), &[], &Operation::default());
    assert!(analysis.sections.is_empty());
    assert!(analysis.qsos.is_empty());
}

/// Panics on `BOOM`, fails on `FAIL`, otherwise counts one.
struct Unreliable;

impl QsoScorer for Unreliable {
    fn score_qso(&self, input: &ScoringInput<'_>) -> HandlerResult<Contribution> {
        match input.qso.their.call.as_str() {
            "BOOM" => panic!("boom"),
            "FAIL" => Err(HandlerError::Failed("refused".to_string())),
            _ => Ok(Contribution::counted(1)),
        }
    }
}

impl DayAccumulator for Unreliable {
    fn accumulate_for_day(&self, input: &AccumulateInput<'_>) -> HandlerResult<Score> {
        let mut score = input.score.clone();
        score.value += input.contribution.value;
        score.qsos += 1;
        Ok(score)
    }
}

impl Summarizer for Unreliable {
    fn summarize(&self, _input: &SummarizeInput<'_>) -> HandlerResult<Score> {
        Err(HandlerError::MissingData("labels".to_string()))
    }
}

impl Handler for Unreliable {
    fn key(&self) -> &str {
        "unreliable"
    }

    fn scorer(&self) -> Option<&dyn QsoScorer> {
        Some(self)
    }

    fn accumulator(&self) -> Option<Accumulator<'_>> {
        Some(Accumulator::ForDay(self))
    }

    fn summarizer(&self) -> Option<&dyn Summarizer> {
        Some(self)
    }
}

#[derive(Default)]
struct Collect {
    seen: Mutex<Vec<(String, HandlerError)>>,
}

impl ErrorSink for Collect {
    fn report_error(&self, message: &str, error: &HandlerError) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((message.to_string(), error.clone()));
        }
    }
}

#[test]
fn handler_failures_are_isolated_and_reported() {
    let mut registry = Registry::with_builtins();
    registry.register(ref_hook("contest"), HookCategory::Reference, 0, Arc::new(Unreliable));
    let operation = Operation::with_refs(vec![Reference::new("contest", "TEST-1")]);
    let qsos = vec![
        qso(1, "K1ABC", Band::B20m, Mode::SSB, 1_000),
        qso(2, "BOOM", Band::B40m, Mode::SSB, 2_000),
        qso(3, "FAIL", Band::B15m, Mode::SSB, 3_000),
        qso(4, "W2XYZ", Band::B10m, Mode::SSB, 4_000),
    ];
    let sink = Collect::default();
    let settings = Settings::default();
    let analysis = SectionEngine::new(&registry).with_error_sink(&sink).analyze(&AnalyzeInput {
        qsos: &qsos,
        operation: &operation,
        settings: &settings,
        show_deleted_qsos: false,
    });

    let section = &analysis.sections[0];
    let contest = &section.scores["contest"];
    assert_eq!((contest.value, contest.qsos), (2, 2));
    // summarizer failed, so the raw score is kept
    assert_eq!(contest.presentation, None);
    // other handlers saw every QSO
    assert_eq!(section.scores["bandsAndModes"].distinct_with_prefix("band:"), 4);
    assert!(!analysis.qso_scores[&2].contains_key("contest"));
    assert!(analysis.qso_scores[&2].contains_key("bandsAndModes"));

    let seen = sink.seen.lock().expect("lock");
    assert_eq!(seen.len(), 3);
    assert!(seen[0].0.contains("`contest`") && seen[0].0.contains("QSO 2"));
    assert_eq!(seen[0].1, HandlerError::Panicked("boom".to_string()));
    assert!(seen[1].0.contains("QSO 3"));
    assert_eq!(seen[1].1, HandlerError::Failed("refused".to_string()));
    assert_eq!(seen[2].1, HandlerError::MissingData("labels".to_string()));
}

fn entry_strategy() -> impl Strategy<Value = (u8, u8, u8, u8, bool)> {
    (0u8..5, 0u8..3, 0u8..2, 0u8..10, proptest::bool::weighted(0.1))
}

proptest! {
    #[test]
    fn analysis_is_idempotent(entries in proptest::collection::vec(entry_strategy(), 0..60)) {
        let calls = ["K1ABC", "W2XYZ", "N3QQ", "VE3AA", "K4ZZ"];
        let bands = [Band::B20m, Band::B40m, Band::B15m];
        let modes = [Mode::SSB, Mode::CW];
        let mut ts = 0u64;
        let qsos: Vec<Qso> = entries
            .iter()
            .enumerate()
            .map(|(i, (c, b, m, gap, deleted))| {
                ts += u64::from(*gap) * 3_600_000;
                let band = bands[*b as usize];
                let mut q = qso(i as QsoId + 1, calls[*c as usize], band, modes[*m as usize], ts)
                    .with_location(if *c == 3 { "VE" } else { "K" }, Some("XX"));
                q.deleted = *deleted;
                q
            })
            .collect();
        let registry = pota_registry();
        let operation = Operation::with_refs(vec![Reference::new("potaActivation", "US-0001")]);

        let first = analyze(&registry, &qsos, &operation);
        let second = analyze(&registry, &qsos, &operation);
        prop_assert_eq!(&first, &second);

        let active = qsos.iter().filter(|q| !q.deleted).count();
        let counted: usize = first.sections.iter().map(|s| s.count).sum();
        prop_assert_eq!(counted, active);
    }
}
