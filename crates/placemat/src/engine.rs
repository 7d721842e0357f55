//! The action engine: threads a device through a scripted workload.

use std::collections::HashSet;
use std::time::Instant;

use placemat_engine::Device;
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use crate::action::Action;
use crate::report;

/// Script execution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A scale action ran before any `power_on` built a device.
    #[error("action {index} ({action}): no device is powered on yet")]
    NoDevice {
        /// 1-based position of the action in the script.
        index: usize,
        /// Rendered form of the offending action.
        action: String,
    },
}

/// Executes a parsed action list in order.
///
/// Operator errors raised by scale actions are logged and downgraded to
/// no-ops, keeping the current device; structural violations inside the
/// engine panic and end the run.
pub struct ActionEngine {
    actions: Vec<Action>,
}

impl ActionEngine {
    /// Wrap a parsed action list.
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Run every action, mirroring each step's block to stdout.
    ///
    /// Returns the final device (`None` for an empty script) and the
    /// accumulated report text.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoDevice`] when a scale action precedes `power_on`.
    pub fn run(&self) -> Result<(Option<Device>, String), EngineError> {
        let mut device: Option<Device> = None;
        let mut out = String::new();

        for (index, action) in self.actions.iter().enumerate() {
            let header = report::action_header(action);
            print!("{header}");
            out.push_str(&header);

            let start = Instant::now();
            let next = self.apply(*action, device.take(), index + 1)?;
            let elapsed = start.elapsed();
            info!(step = index + 1, total = next.total(), ?elapsed, "action applied");

            let block = report::step_summary(&next, elapsed);
            print!("{block}");
            out.push_str(&block);
            device = Some(next);
        }

        Ok((device, out))
    }

    fn apply(
        &self,
        action: Action,
        device: Option<Device>,
        index: usize,
    ) -> Result<Device, EngineError> {
        if let Action::PowerOn { rands_num, mg_num, pe_num, pe_weight } = action {
            let mut device = Device::new(mg_num, pe_num, pe_weight);
            for key in new_rands(rands_num) {
                let (mg_id, pe_id) = device.select(key);
                device.add_data_by_id(mg_id, pe_id, key);
            }
            return Ok(device);
        }

        let device = device
            .ok_or_else(|| EngineError::NoDevice { index, action: action.to_string() })?;
        let scaled = match action {
            Action::ScaleOut { mg_id, pe_num, pe_weight } => {
                device.scale_out_mg(mg_id, pe_num, pe_weight)
            }
            Action::ScaleIn { mg_id } => device.scale_in_mg(mg_id),
            Action::ScaleUp { mg_id, pe_id, pe_weight } => {
                device.scale_up_mg(mg_id, pe_id, pe_weight)
            }
            Action::ScaleDown { mg_id, pe_id } => device.scale_down_mg(mg_id, pe_id),
            Action::PowerOn { .. } => unreachable!("handled above"),
        };

        match scaled {
            Ok(next) => Ok(next),
            Err(err) => {
                warn!(%err, %action, "scale action skipped");
                Ok(device)
            }
        }
    }
}

/// Generate `num` distinct random keys, the engine's only
/// non-deterministic input.
fn new_rands(num: u32) -> HashSet<u32> {
    let mut rng = rand::thread_rng();
    let mut keys = HashSet::with_capacity(num as usize);
    while keys.len() < num as usize {
        keys.insert(rng.gen::<u32>());
    }
    keys
}
