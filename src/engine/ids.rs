use rand::Rng;

/// A fresh identifier: the current collection size followed by a random
/// five digit fraction, e.g. `12.04817`.
pub fn generate_id(count: u64) -> String {
    let fraction: u32 = rand::thread_rng().gen_range(0..100_000);
    format!("{}.{:05}", count, fraction)
}
