use crate::error::SpinError;
use rand::Rng;
use wheel_shared::config::SpinConfig;

/// Pick a winner uniformly from `eligible`.
///
/// This is the only place a spin's outcome is decided; the animation that
/// follows just presents it.
pub fn select_winner<'a, T>(eligible: &'a [T], rng: &mut impl Rng) -> Result<&'a T, SpinError> {
    if eligible.is_empty() {
        return Err(SpinError::EmptyPool);
    }
    let index = rng.gen_range(0..eligible.len());
    Ok(&eligible[index])
}

/// Draw how many full turns the wheel makes before landing (inclusive range from config).
pub fn draw_extra_turns(config: &SpinConfig, rng: &mut impl Rng) -> u32 {
    rng.gen_range(config.min_extra_turns..=config.max_extra_turns)
}
