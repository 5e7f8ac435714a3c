//! Operator-editable word data: the adjective pool and the launch preset calendar.

/// Adjectives eligible for daily puzzles.
pub const BASE_ADJECTIVES: &[&str] = &[
    "sticky",
    "nostalgic",
    "spooky",
    "cozy",
    "loud",
    "expensive",
    "tiny",
    "dangerous",
    "smelly",
    "romantic",
    "slippery",
    "elegant",
    "fluffy",
    "terrifying",
    "ancient",
    "delicious",
    "shiny",
    "awkward",
    "crunchy",
    "sad",
    "bouncy",
    "sophisticated",
    "cold",
    "comforting",
    "fast",
    "boring",
    "wobbly",
    "majestic",
    "spicy",
    "squishy",
    "glamorous",
    "rusty",
    "suspicious",
    "heavy",
    "fragile",
    "chaotic",
    "sparkly",
    "greasy",
    "peaceful",
    "noisy",
    "sour",
    "wholesome",
    "overrated",
    "forbidden",
    "soggy",
    "dramatic",
    "itchy",
    "luxurious",
    "mysterious",
    "prickly",
    "sweaty",
    "tropical",
    "festive",
    "haunted",
    "juicy",
    "lonely",
    "magical",
    "nerdy",
    "old-fashioned",
    "patriotic",
    "pointy",
    "quiet",
    "rebellious",
    "retro",
    "salty",
    "scratchy",
    "smooth",
    "stinky",
    "stretchy",
    "sunny",
    "tangled",
    "toxic",
    "trendy",
    "ugly",
    "useless",
    "vintage",
    "warm",
    "weird",
    "wet",
    "wild",
    "wise",
    "zesty",
    "bright",
    "chewy",
    "clumsy",
    "dusty",
    "edgy",
    "fancy",
    "flimsy",
    "gooey",
    "hollow",
    "infinite",
    "lazy",
    "messy",
    "nervous",
    "sacred",
];

/// Hand-picked pairings for the first days after launch, indexed by day offset
/// from [`crate::constants::PRESET_EPOCH`].
pub const PRESET_CALENDAR: [&[&str]; 14] = [
    &["sticky", "nostalgic"],
    &["spooky", "cozy"],
    &["loud", "expensive"],
    &["tiny", "dangerous"],
    &["smelly", "romantic"],
    &["slippery", "elegant"],
    &["fluffy", "terrifying"],
    &["ancient", "delicious"],
    &["shiny", "awkward"],
    &["crunchy", "sad"],
    &["bouncy", "sophisticated"],
    &["cold", "comforting"],
    &["fast", "boring"],
    &["wobbly", "majestic"],
];
