//! Editors living behind a script channel
//!
//! When the embedded editor runs inside a webview, options cannot be set by
//! direct calls. [`BridgedEditor`] implements the option capability by
//! encoding every change as a [`BridgeMessage`] and handing it to a sink
//! (typically something that evaluates the script in the webview). The last
//! value sent for each option is cached so reads never cross the bridge.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::editor::{EditorAction, EditorOption, EditorWidget, InstanceId, OptionBag, OptionKey};

/// JavaScript entry point the page side installs
pub const BRIDGE_RECEIVER: &str = "window.editorSync.receive";

// ---------------------------------------------------------------------------
// Messages: Rust → embedded editor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    /// `editor.setOption(name, value)`
    SetOption { name: String, value: Value },
    /// `editor.execCommand(name)`
    ExecCommand { name: String },
}

impl BridgeMessage {
    pub fn set_option(option: &EditorOption) -> Self {
        let value = match option {
            EditorOption::KeyMap(name) | EditorOption::Theme(name) => Value::from(name.as_str()),
            EditorOption::MatchBrackets(flag) | EditorOption::IndentWithTabs(flag) => {
                Value::from(*flag)
            }
            EditorOption::IndentUnit(size) => Value::from(*size),
        };
        BridgeMessage::SetOption {
            name: option.key().as_str().to_string(),
            value,
        }
    }

    pub fn exec(action: EditorAction) -> Self {
        BridgeMessage::ExecCommand {
            name: action.as_str().to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Script that delivers this message to the page
    pub fn to_script(&self) -> Result<String, serde_json::Error> {
        Ok(format!("{}({});", BRIDGE_RECEIVER, self.to_json()?))
    }
}

type Sink = Box<dyn Fn(&BridgeMessage)>;

/// An embedded editor reachable only through messages
pub struct BridgedEditor {
    id: InstanceId,
    options: RefCell<HashMap<OptionKey, EditorOption>>,
    sink: Sink,
}

impl BridgedEditor {
    pub fn new(id: InstanceId, sink: impl Fn(&BridgeMessage) + 'static) -> Self {
        Self {
            id,
            options: RefCell::new(HashMap::new()),
            sink: Box::new(sink),
        }
    }

    /// Seed the cache with options the page was created with
    ///
    /// Nothing is sent across the bridge.
    pub fn with_initial(self, options: impl IntoIterator<Item = EditorOption>) -> Self {
        {
            let mut cached = self.options.borrow_mut();
            for option in options {
                cached.insert(option.key(), option);
            }
        }
        self
    }
}

impl OptionBag for BridgedEditor {
    fn set_option(&self, option: EditorOption) {
        (self.sink)(&BridgeMessage::set_option(&option));
        self.options.borrow_mut().insert(option.key(), option);
    }

    fn option(&self, key: OptionKey) -> Option<EditorOption> {
        self.options.borrow().get(&key).cloned()
    }

    fn exec(&self, action: EditorAction) {
        (self.sink)(&BridgeMessage::exec(action));
    }
}

impl EditorWidget for BridgedEditor {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn native_options(&self) -> Option<&dyn OptionBag> {
        Some(self)
    }
}

impl std::fmt::Debug for BridgedEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgedEditor")
            .field("id", &self.id)
            .field("options", &self.options.borrow())
            .finish()
    }
}
