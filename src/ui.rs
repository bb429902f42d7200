//! Console helpers shared by the CLI commands.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shown while a question is being worked on.
pub const LOADING_MESSAGES: &[&str] = &[
    "Consulting the ancient tomes of SQL wisdom...",
    "Casting query spells on your database...",
    "Summoning data from the digital realms...",
    "Deciphering your request into database runes...",
    "Brewing a potion of perfect query syntax...",
    "Channeling the power of database magic...",
    "Translating your words into the language of tables...",
    "Waving my SQL wand to fetch your results...",
    "Performing database divination...",
    "Aligning the database stars for optimal results...",
    "Consulting with the database spirits...",
    "Transforming natural language into database incantations...",
    "Peering into the crystal ball of your database...",
    "Opening a portal to your data dimension...",
    "Enchanting your request with SQL magic...",
    "Invoking the ancient art of query optimization...",
    "Reading between the tables to find your answer...",
    "Conjuring insights from your database depths...",
    "Weaving a tapestry of joins and filters...",
    "Preparing a feast of data for your consideration...",
];

/// Picks working-indicator messages from a seeded generator, so a given
/// seed always yields the same sequence.
pub struct LoadingMessages {
    rng: StdRng,
}

impl LoadingMessages {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pick(&mut self) -> &'static str {
        LOADING_MESSAGES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Working...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = LoadingMessages::new(42);
        let mut b = LoadingMessages::new(42);
        for _ in 0..5 {
            let msg = a.pick();
            assert_eq!(msg, b.pick());
            assert!(LOADING_MESSAGES.contains(&msg));
        }
    }
}
