//! Deterministic seeding for synthetic venue data.
//!
//! Two viewers of the same venue and range must see identical numbers, so
//! the generator is a fixed trigonometric hash rather than a stateful RNG.

/// Stable value in `[0, 1)` for a `(seed, offset)` pair.
///
/// `frac(sin(seed * 9999 + offset * 123) * 10000)` in double precision.
pub fn seeded_random(seed: u64, offset: u64) -> f64 {
    let x = (seed as f64 * 9999.0 + offset as f64 * 123.0).sin() * 10000.0;
    x - x.floor()
}

/// Sum of the UTF-16 code units of a venue id. Anagrams collide.
pub fn venue_seed(venue_id: &str) -> u64 {
    venue_id.encode_utf16().map(u64::from).sum()
}
