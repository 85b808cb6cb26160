//! Display names for bot players.

const NAMES: [&str; 10] = [
    "Bot Marlowe",
    "Bot Harlan",
    "Bot Vesper",
    "Bot Quincy",
    "Bot Sable",
    "Bot Fletcher",
    "Bot Imogen",
    "Bot Castor",
    "Bot Delia",
    "Bot Ambrose",
];

/// Picks the first name not already in use, falling back to a numbered
/// variant when the list is exhausted.
pub fn next_free(taken: impl Fn(&str) -> bool) -> String {
    for name in NAMES {
        if !taken(name) {
            return name.to_string();
        }
    }
    let mut i = 2;
    loop {
        let candidate = format!("{} {i}", NAMES[(i - 2) % NAMES.len()]);
        if !taken(&candidate) {
            return candidate;
        }
        i += 1;
    }
}
