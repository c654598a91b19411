//! Recording library persisted in `window.localStorage`.

use crate::logging::ensure_initialized;
use crate::payload::{from_js, to_js};
use lyapunov_core::error::{LabError, LabResult};
use lyapunov_core::recording::{KeyValueStore, Recording, RecordingLibrary};
use wasm_bindgen::prelude::*;
use web_sys::Storage;

pub(crate) struct LocalStorage {
    storage: Storage,
}

impl LocalStorage {
    pub(crate) fn open() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available."))?;
        let storage = window
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("Local storage is unavailable."))?;
        Ok(Self { storage })
    }
}

fn storage_error(action: &str, key: &str, err: JsValue) -> LabError {
    LabError::Store(format!("cannot {} `{}`: {:?}", action, key, err))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{}", storage_error("read", key, err));
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: String) -> LabResult<()> {
        self.storage
            .set_item(key, &value)
            .map_err(|err| storage_error("write", key, err))
    }

    fn remove(&mut self, key: &str) -> LabResult<()> {
        self.storage
            .remove_item(key)
            .map_err(|err| storage_error("remove", key, err))
    }
}

fn store_failure(err: LabError) -> JsValue {
    JsValue::from_str(&format!("Recording store failed: {}", err))
}

#[wasm_bindgen]
pub struct WasmRecordingLibrary {
    inner: RecordingLibrary<LocalStorage>,
}

#[wasm_bindgen]
impl WasmRecordingLibrary {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmRecordingLibrary, JsValue> {
        ensure_initialized();
        Ok(WasmRecordingLibrary {
            inner: RecordingLibrary::new(LocalStorage::open()?),
        })
    }

    pub fn list(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.list())
    }

    pub fn get(&self, id: &str) -> Result<JsValue, JsValue> {
        to_js(&self.inner.get(id))
    }

    pub fn save(&mut self, recording_val: JsValue) -> Result<(), JsValue> {
        let recording: Recording = from_js(recording_val, "recording")?;
        self.inner.save(recording).map_err(store_failure)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, JsValue> {
        self.inner.delete(id).map_err(store_failure)
    }

    pub fn delete_many(&mut self, ids: Vec<String>) -> Result<usize, JsValue> {
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        self.inner.delete_many(&ids).map_err(store_failure)
    }

    pub fn clear(&mut self) -> Result<(), JsValue> {
        self.inner.clear().map_err(store_failure)
    }

    pub fn next_id(&self, timestamp: f64) -> String {
        self.inner.next_id(timestamp)
    }
}
