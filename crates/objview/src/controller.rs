//! The reactive render controller: a registration table of named parameters,
//! each mapped to a device setting, with a redraw-and-notify cycle after
//! every accepted change.

use crate::{
    error::ViewerError,
    params::{ParamKind, ParamSpec, ParamValue},
    target::RenderTarget,
    view::ViewSink,
};

/// One registered parameter: its description, current value and the device
/// call that makes the value effective.
struct Slot {
    spec: ParamSpec,
    value: ParamValue,
    apply: fn(&mut RenderTarget, ParamValue),
}

/// Name → validation rule + handler table for the reactive bindings.
///
/// Names, defaults and ranges are interface-stable; the UI layer binds to
/// them by name.
fn builtin_slots() -> Vec<Slot> {
    let slots = vec![
        Slot {
            spec: ParamSpec {
                name: "denoise",
                kind: ParamKind::Bool,
                default: ParamValue::Bool(true),
            },
            value: ParamValue::Bool(true),
            apply: |target, value| {
                if let ParamValue::Bool(on) = value {
                    target.backend_mut().set_denoiser(on);
                }
            },
        },
        Slot {
            spec: ParamSpec {
                name: "ambient",
                kind: ParamKind::Number {
                    min: 0.0,
                    max: 4.0,
                    step: 0.1,
                },
                default: ParamValue::Number(1.0),
            },
            value: ParamValue::Number(1.0),
            apply: |target, value| {
                if let ParamValue::Number(v) = value {
                    target.backend_mut().set_ambient_intensity(v as f32);
                }
            },
        },
        Slot {
            spec: ParamSpec {
                name: "refinement",
                kind: ParamKind::Number {
                    min: 1.0,
                    max: 32.0,
                    step: 1.0,
                },
                default: ParamValue::Number(4.0),
            },
            value: ParamValue::Number(4.0),
            // fractional values are truncated to a sample count
            apply: |target, value| {
                if let ParamValue::Number(v) = value {
                    target.backend_mut().set_samples_per_pixel(v as u32);
                }
            },
        },
    ];

    debug_assert!(slots.iter().all(|s| s.value == s.spec.default));
    slots
}

pub struct RenderController {
    target: RenderTarget,
    sink: Box<dyn ViewSink>,
    slots: Vec<Slot>,
}

impl RenderController {
    /// Registers the built-in parameters and pushes their defaults, plus the
    /// fixed startup configuration, into the device. Nothing is drawn yet;
    /// call [refresh](Self::refresh) once the sink is ready for frames.
    pub fn new(target: RenderTarget, sink: Box<dyn ViewSink>) -> Self {
        let mut this = Self {
            target,
            sink,
            slots: builtin_slots(),
        };

        for i in 0..this.slots.len() {
            (this.slots[i].apply)(&mut this.target, this.slots[i].value);
        }
        this.target.backend_mut().set_ambient_samples(1);
        this.target.backend_mut().set_light_falloff(0.5);

        this
    }

    /// Stores `value` under `name`, makes it effective on the device, redraws
    /// and notifies the view. Rejected values leave everything untouched.
    ///
    /// Setting the same value twice repeats the redraw; there is no
    /// coalescing.
    pub fn set_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), ViewerError> {
        let Some(idx) = self.slots.iter().position(|s| s.spec.name == name) else {
            return Err(ViewerError::InvalidParameter {
                name: name.to_owned(),
                reason: "no such parameter".to_owned(),
            });
        };

        self.slots[idx].spec.validate(&value)?;
        self.slots[idx].value = value;
        (self.slots[idx].apply)(&mut self.target, value);

        self.redraw_and_notify()
    }

    /// The current value of a registered parameter.
    pub fn parameter(&self, name: &str) -> Option<ParamValue> {
        self.slots
            .iter()
            .find(|s| s.spec.name == name)
            .map(|s| s.value)
    }

    /// Descriptions of every registered parameter, for a UI to bind against.
    pub fn parameters(&self) -> impl Iterator<Item = &ParamSpec> {
        self.slots.iter().map(|s| &s.spec)
    }

    /// Reframe the camera on the scene, redraw and notify.
    pub fn reset_view(&mut self) -> Result<(), ViewerError> {
        self.target.reset_camera();
        self.redraw_and_notify()
    }

    /// Redraw the current configuration and notify.
    pub fn refresh(&mut self) -> Result<(), ViewerError> {
        self.redraw_and_notify()
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    fn redraw_and_notify(&mut self) -> Result<(), ViewerError> {
        self.target.render()?;
        self.sink
            .frame_ready(self.target.frame())
            .map_err(ViewerError::View)
    }
}
