use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::SpinConfig;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "wheel_state")]
    WheelState(WheelStateMsg),
    #[serde(rename = "sets_state")]
    SetsState(SetsStateMsg),
    #[serde(rename = "winner")]
    Winner(WinnerMsg),
    #[serde(rename = "rejected")]
    Rejected(RejectedMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub self_id: u32,
    pub wheel: WheelStateMsg,
    pub sets: SetsStateMsg,
    pub config: SpinConfig,
}

/// Everything a renderer needs besides the names: the wheel's absolute rotation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WheelStateMsg {
    /// Degrees; the renderer rotates the whole segment group by this angle
    pub angle: f64,
    pub spinning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct NameSetWire {
    pub id: u32,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SetsStateMsg {
    pub sets: Vec<NameSetWire>,
    pub selected_set_id: u32,
    /// Every name on the wheel, in segment order
    pub names: Vec<String>,
    /// Names the next spin may pick from
    pub eligible: Vec<String>,
    /// False when either pool is empty; the spin control should be disabled
    pub can_spin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WinnerMsg {
    pub name: String,
    /// Segment index of the winner in the layout the spin started with
    pub index: u32,
    /// True when the spin was stopped early and the winner is whatever was under the pointer
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
pub struct RejectedMsg {
    pub reason: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../web/src/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// Start a spin when idle, stop it when spinning
    #[serde(rename = "toggle_spin")]
    ToggleSpin,
    #[serde(rename = "add_name")]
    AddName { name: String },
    #[serde(rename = "remove_name")]
    RemoveName { name: String },
    #[serde(rename = "clear_set")]
    ClearSet,
    #[serde(rename = "load_samples")]
    LoadSamples,
    #[serde(rename = "select_set")]
    SelectSet {
        #[serde(rename = "setId")]
        set_id: u32,
    },
}

// === Conversion helpers ===

/// Round to 4 decimal places (plenty for an on-screen angle, keeps JSON small)
#[inline]
pub fn round4(v: f64) -> f64 {
    (v * 10000.0).round() / 10000.0
}
