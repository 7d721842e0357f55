//! Human-readable report rendering.
//!
//! The report is advisory text for the operator, one block per executed
//! action; its exact layout is not a stable interface.

use std::time::Duration;

use placemat_engine::Device;

use crate::action::Action;

const SEPARATOR: &str = "---------------------------------------------------------------------\n";

/// Header block announcing an action.
pub fn action_header(action: &Action) -> String {
    format!("{SEPARATOR}{action}\n{SEPARATOR}")
}

/// Post-state block: per-MG and per-PE key counts with migration counters,
/// followed by the step's wall time.
pub fn step_summary(device: &Device, elapsed: Duration) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Device: weight = {}, total = {}\n",
        device.weight(),
        device.total()
    ));
    for mg in device.mgs() {
        let stats = mg.migrate_stats();
        out.push_str(&format!(
            "MG[{}]: total = {}, in = {}, out = {}\n",
            mg.id(),
            mg.total(),
            stats.inbound,
            stats.outbound
        ));
        for pe in mg.pes() {
            let stats = pe.migrate_stats();
            out.push_str(&format!(
                "    PE[{}]: count = {}, in = {}, out = {}\n",
                pe.id(),
                pe.key_count(),
                stats.inbound,
                stats.outbound
            ));
        }
    }
    out.push_str(&format!("use time: {elapsed:.2?}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_the_action() {
        let header = action_header(&Action::ScaleIn { mg_id: 3 });
        assert!(header.contains("Scale in: del MG[3]"));
        assert!(header.starts_with(SEPARATOR));
    }

    #[test]
    fn test_summary_lists_every_pe() {
        let mut device = Device::new(2, 3, 4);
        device.add_data_by_id(1, 2, 77);

        let summary = step_summary(&device, Duration::from_millis(5));
        assert!(summary.contains("Device: weight = 24, total = 1"));
        assert!(summary.contains("MG[2]: total = 0"));
        assert!(summary.contains("PE[2]: count = 1"));
        assert!(summary.contains("use time:"));
    }
}
