//! # mantic-detect
//!
//! Cross-layer detection over a registered domain. A caller registers 3 to 6
//! named layers with weights, supplies a value per layer, and picks a mode:
//!
//! - **friction**: divergence between layers signals risk
//! - **emergence**: alignment across layers signals opportunity
//!
//! Both modes share one score from `mantic-kernel`, governed overrides from
//! `mantic-governance`, a coupling diagnostic and an optional hierarchy view.
//! Built-in presets are data run through the same pipeline.
//!
//! ```no_run
//! use mantic_detect::{detect, DetectionMode, DetectionRequest};
//!
//! let request = DetectionRequest::new(
//!     "supply_chain",
//!     &["supply", "demand", "logistics", "regulatory"],
//!     &[0.3, 0.3, 0.2, 0.2],
//!     &[Some(0.8), Some(0.3), Some(0.6), Some(0.7)],
//!     DetectionMode::Friction,
//! );
//! let result = detect(&request)?;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod interpret;
pub mod preset;
pub mod registration;
pub mod request;
pub mod result;
pub mod visibility;

pub use config::{DetectorConfig, EmergenceTiers};
pub use detector::{detect, detect_preset, Detector, DETECTION_THRESHOLD};
pub use error::{DetectError, DetectResult};
pub use interpret::{
    interpret_emergence, interpret_friction, EmergenceOutcome, FrictionOutcome, Outcome,
};
pub use preset::{find_preset, Preset, PresetThreshold, RuleDef, ThresholdRole, PRESETS};
pub use registration::{validate_registration, Registration, RegistrationInput};
pub use request::{DetectionMode, DetectionRequest, PresetOptions};
pub use result::{Calibration, DetectionResult, DomainType};
pub use visibility::{compute_visibility, HierarchyLevel, LayerVisibility};

pub use mantic_governance as governance;
pub use mantic_kernel as kernel;
