//! End-to-end tests for the live typing loop.
//!
//! Events enter through `MockInputSource`, travel over the real `mpsc`
//! channel into the event pump, and the correction lands in a
//! `MockOutputInjector`.  `apply_to` then shows what the user's document
//! would contain.

use std::sync::Arc;
use std::time::Duration;

use bijoy_core::{BengaliReshaper, IdentityReshaper, MappingTable, ScriptReshaper, Transliterator};
use bijoy_typer::application::capture::{CaptureStateMachine, EngineMode, DEFAULT_MAX_WORD_LEN};
use bijoy_typer::application::correct_word::CorrectWordUseCase;
use bijoy_typer::application::replay::{OutputInjector, ReplayCoordinator, ReplayTiming};
use bijoy_typer::infrastructure::input_capture::{
    mock::MockInputSource, CaptureEvent, InputSource, MouseButton,
};
use bijoy_typer::infrastructure::output_injection::mock::{InjectedAction, MockOutputInjector};

struct Harness {
    source: MockInputSource,
    use_case: Arc<CorrectWordUseCase>,
    injector: Arc<MockOutputInjector>,
    pump: tokio::task::JoinHandle<()>,
}

impl Harness {
    fn start(table: MappingTable, reshaper: Arc<dyn ScriptReshaper>, active: bool) -> Self {
        let injector = Arc::new(MockOutputInjector::new());
        let output = Arc::clone(&injector) as Arc<dyn OutputInjector>;
        let use_case = Arc::new(CorrectWordUseCase::new(
            CaptureStateMachine::new(active, DEFAULT_MAX_WORD_LEN),
            Transliterator::new(table, reshaper),
            ReplayCoordinator::new(output, ReplayTiming::immediate()),
            tokio::runtime::Handle::current(),
        ));

        let source = MockInputSource::new();
        let events = source.start().expect("mock source starts");
        let pump_use_case = Arc::clone(&use_case);
        let pump = tokio::task::spawn_blocking(move || pump_use_case.run_pump(events));

        Self {
            source,
            use_case,
            injector,
            pump,
        }
    }

    fn scenario_table() -> MappingTable {
        MappingTable::from_json_str(r#"{ "k": "ক", "i": "ই" }"#).unwrap()
    }

    /// Waits until every injected event has been handled and no correction
    /// is in flight.
    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        for _ in 0..400 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.use_case.mode() != EngineMode::ActiveProcessing {
                return;
            }
        }
        panic!("correction did not finish");
    }

    async fn shutdown(self) -> Arc<MockOutputInjector> {
        self.source.stop();
        self.pump.await.expect("pump exits cleanly");
        self.injector
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_typed_word_is_replaced_and_boundary_restored() {
    // Arrange
    let harness = Harness::start(Harness::scenario_table(), Arc::new(IdentityReshaper), true);

    // Act: the user types "ki " in some editor
    harness.source.type_text("ki ");
    harness.settle().await;
    let mode = harness.use_case.mode();
    let injector = harness.shutdown().await;

    // Assert
    assert_eq!(
        injector.actions(),
        vec![
            InjectedAction::DeleteBackward,
            InjectedAction::DeleteBackward,
            InjectedAction::DeleteBackward,
            InjectedAction::InsertText("কই".to_string()),
            InjectedAction::PressBoundary,
        ]
    );
    assert_eq!(injector.apply_to("ki "), "কই ");
    assert_eq!(mode, EngineMode::ActiveIdle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bijoy_words_are_rewritten_one_at_a_time() {
    // Arrange
    let table = MappingTable::bijoy_classic().unwrap();
    let harness = Harness::start(table, Arc::new(BengaliReshaper), true);

    // Act
    harness.source.type_text("gfmfv ");
    harness.settle().await;
    let first = harness.injector.apply_to("gfmfv ");
    harness.source.type_text("dj ");
    harness.settle().await;
    let injector = harness.shutdown().await;

    // Assert
    assert_eq!(first, "আমার ");
    assert!(injector
        .actions()
        .contains(&InjectedAction::InsertText("কি".to_string())));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nothing_is_replayed_until_activated() {
    // Arrange
    let harness = Harness::start(Harness::scenario_table(), Arc::new(IdentityReshaper), false);

    // Act
    harness.source.type_text("ki ");
    harness.settle().await;
    let before_toggle = harness.injector.actions();
    harness.source.inject_event(CaptureEvent::ToggleActivation);
    harness.source.type_text("ki ");
    harness.settle().await;
    let injector = harness.shutdown().await;

    // Assert
    assert!(before_toggle.is_empty());
    assert_eq!(
        injector.actions().last(),
        Some(&InjectedAction::PressBoundary)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_click_mid_word_discards_earlier_characters() {
    // Arrange
    let harness = Harness::start(Harness::scenario_table(), Arc::new(IdentityReshaper), true);

    // Act: "k", click elsewhere, then "i "
    harness.source.type_text("k");
    harness.source.inject_event(CaptureEvent::PointerPress {
        button: MouseButton::Left,
    });
    harness.source.type_text("i ");
    harness.settle().await;
    let injector = harness.shutdown().await;

    // Assert: only "i" was corrected
    assert_eq!(
        injector.actions(),
        vec![
            InjectedAction::DeleteBackward,
            InjectedAction::DeleteBackward,
            InjectedAction::InsertText("ই".to_string()),
            InjectedAction::PressBoundary,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_backspace_and_enter_edit_the_buffer() {
    // Arrange
    let harness = Harness::start(Harness::scenario_table(), Arc::new(IdentityReshaper), true);

    // Act: Enter throws away "k"; the next word is "kix" minus the "x"
    harness.source.type_text("kx");
    harness.source.inject_event(CaptureEvent::Backspace);
    harness.source.inject_event(CaptureEvent::Enter);
    harness.source.type_text("kix");
    harness.source.inject_event(CaptureEvent::Backspace);
    harness.source.type_text(" ");
    harness.settle().await;
    let injector = harness.shutdown().await;

    // Assert
    assert!(injector
        .actions()
        .contains(&InjectedAction::InsertText("কই".to_string())));
    assert_eq!(injector.apply_to("ki "), "কই ");
}
