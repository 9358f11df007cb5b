//! User preference persistence.
//!
//! Preferences are a string-keyed store of scalar and list primitives with
//! typed accessors and change notification. Values persist to a JSON file
//! under the application's config directory, but only when the application
//! was constructed with a non-empty unique identifier; without one the
//! store is in-memory for the life of the process and every operation logs
//! a warning.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use atrium_core::logging::targets;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::settings::config_root;

/// A value stored in preferences: a scalar primitive or a list of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Integer(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A string value.
    String(String),
    /// A list of booleans.
    BoolList(Vec<bool>),
    /// A list of integers.
    IntegerList(Vec<i64>),
    /// A list of floats.
    FloatList(Vec<f64>),
    /// A list of strings.
    StringList(Vec<String>),
}

impl PreferenceValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            PreferenceValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            PreferenceValue::Integer(value) => Some(*value),
            PreferenceValue::Float(value) => Some(*value as i64),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            PreferenceValue::Float(value) => Some(*value),
            PreferenceValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<String> {
        match self {
            PreferenceValue::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

type ChangeListener = std::sync::Arc<dyn Fn() + Send + Sync>;

/// The preference store owned by the application object.
pub struct Preferences {
    values: RwLock<HashMap<String, PreferenceValue>>,
    path: Option<PathBuf>,
    listeners: Mutex<Vec<ChangeListener>>,
}

impl Preferences {
    /// Create a store for the given application id. An empty id means no
    /// persistence.
    pub(crate) fn new(app_id: &str) -> Self {
        let path = if app_id.is_empty() {
            None
        } else {
            Some(config_root().join(app_id).join("preferences.json"))
        };
        Self::with_path(path)
    }

    pub(crate) fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            path,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Load previously persisted values. Missing files are fine; corrupt
    /// files are logged and leave the store empty.
    pub(crate) fn load(&self) {
        let Some(path) = &self.path else { return };
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return,
            Err(err) => {
                tracing::warn!(
                    target: targets::PREFERENCES,
                    path = %path.display(),
                    %err,
                    "preferences file could not be read, starting empty"
                );
                return;
            }
        };
        match serde_json::from_str::<HashMap<String, PreferenceValue>>(&raw) {
            Ok(values) => *self.values.write() = values,
            Err(err) => {
                tracing::warn!(
                    target: targets::PREFERENCES,
                    path = %path.display(),
                    %err,
                    "preferences file is not valid JSON, starting empty"
                );
            }
        }
    }

    /// Register a callback invoked after every preference mutation.
    pub fn add_change_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners.lock().push(std::sync::Arc::new(listener));
    }

    /// The boolean stored under `key`, or `false`.
    pub fn bool(&self, key: &str) -> bool {
        self.bool_with_fallback(key, false)
    }

    /// The boolean stored under `key`, or `fallback`.
    pub fn bool_with_fallback(&self, key: &str, fallback: bool) -> bool {
        self.lookup(key, fallback, PreferenceValue::as_bool)
    }

    /// Store a boolean under `key`.
    pub fn set_bool(&self, key: &str, value: bool) {
        self.store(key, PreferenceValue::Bool(value));
    }

    /// The integer stored under `key`, or `0`.
    pub fn int(&self, key: &str) -> i64 {
        self.int_with_fallback(key, 0)
    }

    /// The integer stored under `key`, or `fallback`.
    pub fn int_with_fallback(&self, key: &str, fallback: i64) -> i64 {
        self.lookup(key, fallback, PreferenceValue::as_int)
    }

    /// Store an integer under `key`.
    pub fn set_int(&self, key: &str, value: i64) {
        self.store(key, PreferenceValue::Integer(value));
    }

    /// The float stored under `key`, or `0.0`.
    pub fn float(&self, key: &str) -> f64 {
        self.float_with_fallback(key, 0.0)
    }

    /// The float stored under `key`, or `fallback`.
    pub fn float_with_fallback(&self, key: &str, fallback: f64) -> f64 {
        self.lookup(key, fallback, PreferenceValue::as_float)
    }

    /// Store a float under `key`.
    pub fn set_float(&self, key: &str, value: f64) {
        self.store(key, PreferenceValue::Float(value));
    }

    /// The string stored under `key`, or the empty string.
    pub fn string(&self, key: &str) -> String {
        self.string_with_fallback(key, String::new())
    }

    /// The string stored under `key`, or `fallback`.
    pub fn string_with_fallback(&self, key: &str, fallback: String) -> String {
        self.lookup(key, fallback, PreferenceValue::as_string)
    }

    /// Store a string under `key`.
    pub fn set_string(&self, key: &str, value: impl Into<String>) {
        self.store(key, PreferenceValue::String(value.into()));
    }

    /// The boolean list stored under `key`, or an empty list.
    pub fn bool_list(&self, key: &str) -> Vec<bool> {
        self.lookup(key, Vec::new(), |value| match value {
            PreferenceValue::BoolList(list) => Some(list.clone()),
            _ => None,
        })
    }

    /// Store a boolean list under `key`.
    pub fn set_bool_list(&self, key: &str, value: Vec<bool>) {
        self.store(key, PreferenceValue::BoolList(value));
    }

    /// The integer list stored under `key`, or an empty list.
    pub fn int_list(&self, key: &str) -> Vec<i64> {
        self.lookup(key, Vec::new(), |value| match value {
            PreferenceValue::IntegerList(list) => Some(list.clone()),
            _ => None,
        })
    }

    /// Store an integer list under `key`.
    pub fn set_int_list(&self, key: &str, value: Vec<i64>) {
        self.store(key, PreferenceValue::IntegerList(value));
    }

    /// The float list stored under `key`, or an empty list.
    pub fn float_list(&self, key: &str) -> Vec<f64> {
        self.lookup(key, Vec::new(), |value| match value {
            PreferenceValue::FloatList(list) => Some(list.clone()),
            _ => None,
        })
    }

    /// Store a float list under `key`.
    pub fn set_float_list(&self, key: &str, value: Vec<f64>) {
        self.store(key, PreferenceValue::FloatList(value));
    }

    /// The string list stored under `key`, or an empty list.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.lookup(key, Vec::new(), |value| match value {
            PreferenceValue::StringList(list) => Some(list.clone()),
            _ => None,
        })
    }

    /// Store a string list under `key`.
    pub fn set_string_list(&self, key: &str, value: Vec<String>) {
        self.store(key, PreferenceValue::StringList(value));
    }

    /// Remove the value stored under `key`, if any.
    pub fn remove_value(&self, key: &str) {
        self.warn_missing_id();
        let removed = self.values.write().remove(key).is_some();
        if removed {
            self.notify_listeners();
            self.save();
        }
    }

    fn lookup<T>(
        &self,
        key: &str,
        fallback: T,
        extract: impl Fn(&PreferenceValue) -> Option<T>,
    ) -> T {
        self.warn_missing_id();
        self.values
            .read()
            .get(key)
            .and_then(extract)
            .unwrap_or(fallback)
    }

    fn store(&self, key: &str, value: PreferenceValue) {
        self.warn_missing_id();
        self.values.write().insert(key.to_string(), value);
        self.notify_listeners();
        self.save();
    }

    fn notify_listeners(&self) {
        let listeners: Vec<ChangeListener> = self.listeners.lock().clone();
        for listener in listeners {
            listener();
        }
    }

    fn warn_missing_id(&self) {
        if self.path.is_none() {
            tracing::warn!(
                target: targets::PREFERENCES,
                "preferences require a unique application ID to persist, values are in-memory only"
            );
        }
    }

    fn save(&self) {
        let Some(path) = &self.path else { return };
        let json = {
            let values = self.values.read();
            match serde_json::to_string_pretty(&*values) {
                Ok(json) => json,
                Err(err) => {
                    tracing::error!(
                        target: targets::PREFERENCES,
                        %err,
                        "could not serialize preferences"
                    );
                    return;
                }
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::error!(
                    target: targets::PREFERENCES,
                    path = %parent.display(),
                    %err,
                    "could not create the preferences directory"
                );
                return;
            }
        }
        if let Err(err) = write_atomic(path, json.as_bytes()) {
            tracing::error!(
                target: targets::PREFERENCES,
                path = %path.display(),
                %err,
                "could not write the preferences file"
            );
        }
    }
}

/// Write through a sibling temp file and rename so readers never observe a
/// half-written file.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
