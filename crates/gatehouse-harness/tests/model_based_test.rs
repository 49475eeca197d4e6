//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! controller and widgets behave identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!      ModelWorld    RealWorld      Compare
//!      (reference)   (SimEnv)       Results
//! ```

use std::time::Duration;

use gatehouse_core::{
    AccessController, ChaoticStore, ContactInfo, ControllerConfig, DEFAULT_RECORD_KEY,
    DownloadableResource, Environment, MemoryStore, ResourceWidget, Store, Viewer, WidgetAction,
    WidgetError, WidgetEvent,
};
use gatehouse_harness::{
    ModelWorld, ObservableState, Operation, OperationError, OperationResult, SimEnv, WidgetSlot,
};
use proptest::prelude::*;

const HOUR: Duration = Duration::from_secs(60 * 60);
const WINDOW: Duration = Duration::from_secs(14 * 24 * 60 * 60);

type RealStore = ChaoticStore<MemoryStore>;
type RealController = AccessController<SimEnv, RealStore>;

/// Real system wrapper that mirrors ModelWorld's interface.
struct RealWorld {
    env: SimEnv,
    store: RealStore,
    config: ControllerConfig,
    controller: RealController,
    viewer: Viewer,
    widgets: Vec<Option<ResourceWidget<SimEnv, RealStore>>>,
}

impl RealWorld {
    fn new(num_slots: usize, window: Duration) -> Self {
        let env = SimEnv::new();
        let store = ChaoticStore::new(MemoryStore::new());
        let config = ControllerConfig::default().with_unlock_duration(window);
        let controller = AccessController::with_config(env.clone(), store.clone(), config.clone());
        let viewer = Viewer::parse("https://assets.example.com/").expect("asset base");

        Self {
            env,
            store,
            config,
            controller,
            viewer,
            widgets: (0..num_slots).map(|_| None).collect(),
        }
    }

    fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Mount { slot, gated } => self.apply_mount(*slot, *gated),
            Operation::Unmount { slot } => match self.slot(*slot).map(Option::take) {
                Ok(Some(widget)) => {
                    widget.unmount();
                    OperationResult::Ok
                },
                Ok(None) => OperationResult::Error(OperationError::NoWidget),
                Err(e) => OperationResult::Error(e),
            },
            Operation::Click { slot } => self.handle(*slot, WidgetEvent::Click),
            Operation::Submit { slot, complete } => {
                self.handle(*slot, WidgetEvent::SubmitForm(contact(*complete)))
            },
            Operation::CloseForm { slot } => self.handle(*slot, WidgetEvent::CloseForm),
            Operation::AdvanceTime { hours } => {
                self.env.advance(HOUR * u32::from(*hours));
                OperationResult::Ok
            },
            Operation::SetWriteFailure { fail } => {
                self.store.set_fail_writes(*fail);
                OperationResult::Ok
            },
            Operation::CorruptRecord => {
                self.store.inner().set(DEFAULT_RECORD_KEY, "{{{ not a record").expect("seed");
                OperationResult::Ok
            },
            Operation::Reload => {
                self.widgets.iter_mut().for_each(|w| *w = None);
                self.controller = AccessController::with_config(
                    self.env.clone(),
                    self.store.clone(),
                    self.config.clone(),
                );
                OperationResult::Ok
            },
        }
    }

    fn apply_mount(&mut self, slot: WidgetSlot, gated: bool) -> OperationResult {
        let resource = if gated {
            DownloadableResource::gated(format!("Gated {slot}"), format!("/files/{slot}.pdf"))
        } else {
            DownloadableResource::open(format!("Open {slot}"), "//cdn.example.com/care.pdf")
        };
        let controller = self.controller.clone();
        let viewer = self.viewer.clone();

        match self.slot(slot) {
            Ok(entry) if entry.is_none() => {
                *entry = Some(ResourceWidget::mount(resource, controller, viewer));
                OperationResult::Ok
            },
            Ok(_) => OperationResult::Error(OperationError::SlotOccupied),
            Err(e) => OperationResult::Error(e),
        }
    }

    fn handle(&mut self, slot: WidgetSlot, event: WidgetEvent) -> OperationResult {
        let widget = match self.slot(slot) {
            Ok(Some(widget)) => widget,
            Ok(None) => return OperationResult::Error(OperationError::NoWidget),
            Err(e) => return OperationResult::Error(e),
        };

        match widget.handle(event) {
            Ok(actions) => classify(&actions),
            Err(WidgetError::FormNotOpen) => OperationResult::Error(OperationError::FormNotOpen),
            Err(e) => panic!("unexpected widget error: {e}"),
        }
    }

    fn slot(
        &mut self,
        slot: WidgetSlot,
    ) -> Result<&mut Option<ResourceWidget<SimEnv, RealStore>>, OperationError> {
        self.widgets.get_mut(usize::from(slot)).ok_or(OperationError::InvalidSlot)
    }

    fn observable_state(&self) -> ObservableState {
        ObservableState {
            now_ms: self.env.now_ms(),
            unlocked: self.controller.check_access(),
            unlocked_until: self.controller.unlocked_until(),
            subscribers: self.controller.subscriber_count(),
            widgets: self.widgets.iter().map(|w| w.as_ref().map(ResourceWidget::state)).collect(),
        }
    }
}

fn contact(complete: bool) -> ContactInfo {
    let contact = ContactInfo::new().with("name", "A").with("email", "a@x.com").with("company", "X");
    if complete { contact.with("phone", "123") } else { contact }
}

fn classify(actions: &[WidgetAction]) -> OperationResult {
    if actions.iter().any(|a| matches!(a, WidgetAction::Open(_))) {
        OperationResult::Opened
    } else if actions.contains(&WidgetAction::ShowUnlockForm) {
        OperationResult::FormShown
    } else if actions.iter().any(|a| matches!(a, WidgetAction::ShowValidationErrors(_))) {
        OperationResult::ValidationFailed
    } else {
        OperationResult::Ok
    }
}

/// Strategy for generating operations with valid slots.
fn operation_strategy(num_slots: usize) -> impl Strategy<Value = Operation> {
    let slot = 0..u8::try_from(num_slots).expect("few slots");

    prop_oneof![
        // Weight towards the unlock flow
        3 => (slot.clone(), any::<bool>())
            .prop_map(|(slot, gated)| Operation::Mount { slot, gated }),
        1 => slot.clone().prop_map(|slot| Operation::Unmount { slot }),
        4 => slot.clone().prop_map(|slot| Operation::Click { slot }),
        3 => (slot.clone(), prop::bool::weighted(0.8))
            .prop_map(|(slot, complete)| Operation::Submit { slot, complete }),
        1 => slot.prop_map(|slot| Operation::CloseForm { slot }),
        2 => (0u16..400).prop_map(|hours| Operation::AdvanceTime { hours }),
        1 => any::<bool>().prop_map(|fail| Operation::SetWriteFailure { fail }),
        1 => Just(Operation::CorruptRecord),
        1 => Just(Operation::Reload),
    ]
}

proptest! {
    /// Verify that operation results and observable state match between the
    /// model and the real controller after every step.
    #[test]
    fn prop_model_matches_real(
        num_slots in 1..5usize,
        ops in prop::collection::vec(operation_strategy(4), 0..60)
    ) {
        let mut model = ModelWorld::new(num_slots, WINDOW);
        let mut real = RealWorld::new(num_slots, WINDOW);

        for (i, op) in ops.iter().enumerate() {
            let op = op.clone().clamp_slot(num_slots);

            let model_result = model.apply(&op);
            let real_result = real.apply(&op);

            prop_assert_eq!(
                &model_result,
                &real_result,
                "Divergence at operation {}: {:?}",
                i,
                op
            );
            prop_assert_eq!(
                model.observable_state(),
                real.observable_state(),
                "State divergence after operation {}: {:?}",
                i,
                op
            );
        }
    }

    /// Short windows make expiry happen within a run.
    #[test]
    fn prop_model_matches_real_short_window(
        ops in prop::collection::vec(operation_strategy(3), 0..60)
    ) {
        let window = Duration::from_secs(5 * 60 * 60);
        let mut model = ModelWorld::new(3, window);
        let mut real = RealWorld::new(3, window);

        for op in &ops {
            let op = op.clone().clamp_slot(3);
            prop_assert_eq!(model.apply(&op), real.apply(&op));
            prop_assert_eq!(model.observable_state(), real.observable_state());
        }
    }

    /// Every mounted widget agrees with the controller right after a
    /// successful submission.
    #[test]
    fn prop_grant_reaches_all_widgets(
        ops in prop::collection::vec(operation_strategy(4), 0..40)
    ) {
        let mut real = RealWorld::new(4, WINDOW);

        for op in &ops {
            let op = op.clone().clamp_slot(4);
            let result = real.apply(&op);
            if !matches!(op, Operation::Submit { .. }) || result != OperationResult::Opened {
                continue;
            }

            prop_assert!(real.controller.check_access());
            for widget in real.widgets.iter().flatten() {
                prop_assert!(widget.is_unlocked());
            }
        }
    }
}

#[test]
fn out_of_range_slot_is_rejected() {
    let mut model = ModelWorld::new(2, WINDOW);
    let mut real = RealWorld::new(2, WINDOW);
    let op = Operation::Click { slot: 7 };

    assert_eq!(model.apply(&op), OperationResult::Error(OperationError::InvalidSlot));
    assert_eq!(real.apply(&op), OperationResult::Error(OperationError::InvalidSlot));
}

#[test]
fn scripted_session_then_reload() {
    let script = [
        Operation::Mount { slot: 0, gated: true },
        Operation::Mount { slot: 1, gated: false },
        Operation::SetWriteFailure { fail: true },
        Operation::Click { slot: 0 },
        Operation::Submit { slot: 0, complete: true },
        Operation::Reload,
        Operation::Mount { slot: 0, gated: true },
    ];

    let mut model = ModelWorld::new(2, WINDOW);
    let mut real = RealWorld::new(2, WINDOW);
    for op in &script {
        assert_eq!(model.apply(op), real.apply(op), "{op:?}");
    }

    let state = real.observable_state();
    assert_eq!(state, model.observable_state());
    assert!(!state.unlocked, "session grant does not survive reload");
    assert_eq!(state.subscribers, 1);
}
