use ft_domain::config::TimerConfig;
use ft_scheduler::prepare_repeat;

use super::engine_clock;

/// Anchor `cycle` at the engine clock and return the rewritten string.
pub fn run(timers: &TimerConfig, cycle: &str, now: Option<&str>) -> anyhow::Result<String> {
    let clock = engine_clock(timers, now)?;
    Ok(prepare_repeat(cycle, clock.as_ref()))
}
