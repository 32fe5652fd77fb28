//! slashkey - inline `/keyword` text expansion for editable fields
//!
//! Typing `/` followed by part of a keyword inside an editable field opens a
//! ranked suggestion list; choosing one replaces the token with the stored
//! phrase. Plain controls and rich-text regions are both supported, the
//! latter without disturbing surrounding formatting where possible.
//!
//! The engine is host-agnostic: a page implements [`host::FieldHost`] and
//! forwards its events to an [`expand_manager::ExpandManager`].

pub mod commit;
pub mod config;
pub mod debounce;
pub mod error;
pub mod expand_manager;
pub mod field;
pub mod host;
pub mod logging;
pub mod page;
pub mod panel;
pub mod selector;
pub mod store;
pub mod suggest;
pub mod trigger;

pub use commit::{commit, CommitOutcome};
pub use config::Config;
pub use error::{ExpandError, FieldError, StoreError};
pub use expand_manager::{ExpandManager, Key, KeyDisposition, KeyEvent, Modifiers, PointerTarget};
pub use field::{FieldHandle, FieldKind, FieldRef, ReplacePath};
pub use host::{ElementId, FieldHost};
pub use store::{MappingStore, MappingStoreClient, MappingTable};
pub use trigger::{detect_complete, detect_partial, TriggerMatch};
