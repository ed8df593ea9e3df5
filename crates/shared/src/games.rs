/// Game catalog: which genre each known game belongs to.
///
/// Genres double as catch-all game names ("BoardGames", "CardGames") for
/// communities that play a rotation rather than a single title.
pub const GAME_GENRES: &[(&str, &str)] = &[
    ("DnD", "TTRPG"),
    ("Pathfinder", "TTRPG"),
    ("Call of Cthulhu", "TTRPG"),
    ("LARP", "TTRPG"),
    ("Counter-Strike", "FPS"),
    ("Valorant", "FPS"),
    ("Call of Duty", "FPS"),
    ("Apex Legends", "FPS"),
    ("Civilization", "Strategy"),
    ("Age of Empires", "Strategy"),
    ("StarCraft", "Strategy"),
    ("World of Warcraft", "MMORPG"),
    ("Final Fantasy XIV", "MMORPG"),
    ("Elder Scrolls Online", "MMORPG"),
    ("Sudoku", "Puzzle"),
    ("Crossword", "Puzzle"),
    ("Tetris", "Puzzle"),
    ("Chess", "Puzzle"),
    ("FIFA", "Sports"),
    ("NBA 2K", "Sports"),
    ("Madden NFL", "Sports"),
    ("F1", "Sports"),
    ("Monopoly", "BoardGames"),
    ("Catan", "BoardGames"),
    ("Scrabble", "BoardGames"),
    ("Risk", "BoardGames"),
    ("Magic: The Gathering", "CardGames"),
    ("Poker", "CardGames"),
    ("Yu-Gi-Oh!", "CardGames"),
    ("Hearthstone", "CardGames"),
    ("BoardGames", "BoardGames"),
    ("CardGames", "CardGames"),
    ("VideoGames", "VideoGames"),
];

/// Look up the genre for a game. Matching ignores ASCII case so "DND" and
/// "DnD" resolve the same way.
pub fn genre_for_game(game: &str) -> Option<&'static str> {
    GAME_GENRES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(game.trim()))
        .map(|(_, genre)| *genre)
}

/// Subtitle shown under a community pin, e.g. "Catan · BoardGames".
pub fn game_label(game: &str) -> String {
    match genre_for_game(game) {
        Some(genre) if !genre.eq_ignore_ascii_case(game.trim()) => {
            format!("{} · {}", game.trim(), genre)
        }
        _ => game.trim().to_string(),
    }
}
