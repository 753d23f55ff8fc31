/// Messaging module for Event/Command architecture
///
/// - **Events**: Notifications of things that happened (past tense, broadcast)
/// - **Commands**: Requests to perform actions (imperative, targeted)
///
/// ## Architecture
///
/// ```text
/// ┌─────────┐     Command      ┌─────────┐     Event      ┌─────────────┐
/// │  CLI /  │ ───────────────> │ Session │ ─────────────> │  Event Bus  │
/// │   UI    │                  │         │                │             │
/// └─────────┘                  └─────────┘                └─────────────┘
///                                   ▲                            │
///                                   │ Events                     │ Publishes
///                           ┌───────────────┐                    ▼
///                           │ Detection loop│              ┌──────────┐
///                           └───────────────┘              │ Handlers │
///                                                          └──────────┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let (rx, _id) = session.event_bus().subscribe();
///
/// session.execute(Command::CreateSignal { name: "fist".into() });
/// session.execute(Command::Record);
///
/// while let Ok(event) = rx.recv() {
///     match event {
///         Event::PredictionsUpdated { predictions } => { /* render */ }
///         _ => {}
///     }
/// }
/// ```

pub mod bus;
pub mod commands;
pub mod events;

pub use bus::{EventBus, SubscriberId};
pub use commands::{Command, CommandResult};
pub use events::Event;
