//! Observable dashboard state for the UI layer.

use crate::logging::ensure_initialized;
use crate::payload::{from_js, to_js};
use js_sys::Function;
use lyapunov_core::store::{DashboardPatch, DashboardState, Store};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmDashboard {
    store: Store<DashboardState>,
}

#[wasm_bindgen]
impl WasmDashboard {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmDashboard {
        ensure_initialized();
        WasmDashboard {
            store: Store::default(),
        }
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(self.store.state())
    }

    /// Applies a partial state; subscribers run only when something changed.
    pub fn patch(&mut self, patch_val: JsValue) -> Result<bool, JsValue> {
        let patch: DashboardPatch = from_js(patch_val, "dashboard patch")?;
        Ok(self.store.patch(patch))
    }

    /// Registers `callback(state)`; the returned id unsubscribes it.
    pub fn subscribe(&mut self, callback: Function) -> f64 {
        let id = self.store.subscribe(move |state: &DashboardState| {
            let value = match to_js(state) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("cannot serialize dashboard state: {:?}", err);
                    return;
                }
            };
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                log::warn!("dashboard subscriber threw: {:?}", err);
            }
        });
        id as f64
    }

    pub fn unsubscribe(&mut self, id: f64) -> bool {
        self.store.unsubscribe(id as u64)
    }
}

impl Default for WasmDashboard {
    fn default() -> Self {
        Self::new()
    }
}
