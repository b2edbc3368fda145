/// Built-in movie catalog: title search and the static recommendation tier
use serde::Serialize;
use std::collections::HashSet;

pub const MIN_QUERY_LEN: usize = 2;
pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Genre {
    Romance,
    Action,
    Comedy,
    Drama,
    Thriller,
    SciFi,
    Horror,
    Adventure,
    Animation,
    Indian,
    International,
}

impl Genre {
    pub const ALL: [Genre; 11] = [
        Genre::Romance,
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Thriller,
        Genre::SciFi,
        Genre::Horror,
        Genre::Adventure,
        Genre::Animation,
        Genre::Indian,
        Genre::International,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Genre::Romance => "romance",
            Genre::Action => "action",
            Genre::Comedy => "comedy",
            Genre::Drama => "drama",
            Genre::Thriller => "thriller",
            Genre::SciFi => "sci-fi",
            Genre::Horror => "horror",
            Genre::Adventure => "adventure",
            Genre::Animation => "animation",
            Genre::Indian => "bollywood",
            Genre::International => "international",
        }
    }

    /// Substrings that identify this genre in free text
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Genre::Romance => &["romance", "romantic", "love"],
            Genre::Action => &["action", "fight"],
            Genre::Comedy => &["comedy", "comedies", "funny"],
            Genre::Drama => &["drama"],
            Genre::Thriller => &["thriller", "suspense", "mystery"],
            Genre::SciFi => &["sci-fi", "sci fi", "scifi", "science fiction", "space"],
            Genre::Horror => &["horror", "scary"],
            Genre::Adventure => &["adventure"],
            Genre::Animation => &["animation", "animated", "cartoon"],
            Genre::Indian => &["bollywood", "indian", "hindi"],
            Genre::International => &["international", "foreign", "world cinema"],
        }
    }

    /// Genres mentioned anywhere in `text`, case-insensitive
    pub fn detect(text: &str) -> Vec<Genre> {
        let lowered = text.to_lowercase();
        Genre::ALL
            .into_iter()
            .filter(|genre| genre.keywords().iter().any(|k| lowered.contains(k)))
            .collect()
    }
}

impl Serialize for Genre {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

use Genre::*;

const CATALOG: &[(&str, &[Genre])] = &[
    ("La La Land", &[Romance]),
    ("The Notebook", &[Romance]),
    ("500 Days of Summer", &[Romance]),
    ("Eternal Sunshine of the Spotless Mind", &[Romance]),
    ("Before Sunrise", &[Romance]),
    ("Crazy Rich Asians", &[Romance]),
    ("The Proposal", &[Romance]),
    ("Notting Hill", &[Romance]),
    ("When Harry Met Sally", &[Romance]),
    ("Pretty Woman", &[Romance]),
    ("Sleepless in Seattle", &[Romance]),
    ("You've Got Mail", &[Romance]),
    ("Titanic", &[Romance]),
    ("Romeo + Juliet", &[Romance]),
    ("Mad Max: Fury Road", &[Action]),
    ("John Wick", &[Action]),
    ("The Dark Knight", &[Action]),
    ("Mission: Impossible - Fallout", &[Action]),
    ("Die Hard", &[Action]),
    ("The Matrix", &[Action]),
    ("Gladiator", &[Action]),
    ("Braveheart", &[Action]),
    ("The Avengers", &[Action]),
    ("Black Panther", &[Action]),
    ("Wonder Woman", &[Action]),
    ("Captain America: The Winter Soldier", &[Action]),
    ("Top Gun: Maverick", &[Action]),
    ("Mission: Impossible", &[Action]),
    ("The Grand Budapest Hotel", &[Comedy]),
    ("Superbad", &[Comedy]),
    ("Shaun of the Dead", &[Comedy]),
    ("The Big Lebowski", &[Comedy]),
    ("Groundhog Day", &[Comedy]),
    ("Bridesmaids", &[Comedy]),
    ("The Hangover", &[Comedy]),
    ("21 Jump Street", &[Comedy]),
    ("Deadpool", &[Comedy]),
    ("Guardians of the Galaxy", &[Comedy]),
    ("The Lego Movie", &[Comedy]),
    ("Zootopia", &[Comedy]),
    ("The Princess Bride", &[Comedy, Adventure]),
    ("Monty Python and the Holy Grail", &[Comedy]),
    ("The Shawshank Redemption", &[Drama]),
    ("Forrest Gump", &[Drama]),
    ("The Green Mile", &[Drama]),
    ("Schindler's List", &[Drama]),
    ("12 Angry Men", &[Drama]),
    ("The Godfather", &[Drama]),
    ("Goodfellas", &[Drama]),
    ("The Departed", &[Drama]),
    ("Fight Club", &[Drama]),
    ("American Beauty", &[Drama]),
    ("The Social Network", &[Drama]),
    ("Spotlight", &[Drama]),
    ("Pulp Fiction", &[Drama]),
    ("The Silence of the Lambs", &[Drama]),
    ("Se7en", &[Thriller]),
    ("Gone Girl", &[Thriller]),
    ("Zodiac", &[Thriller]),
    ("Prisoners", &[Thriller]),
    ("The Usual Suspects", &[Thriller]),
    ("Memento", &[Thriller]),
    ("Inception", &[Thriller, SciFi]),
    ("The Prestige", &[Thriller]),
    ("Shutter Island", &[Thriller]),
    ("Gone Baby Gone", &[Thriller]),
    ("Mystic River", &[Thriller]),
    ("The Sixth Sense", &[Thriller]),
    ("Blade Runner 2049", &[SciFi]),
    ("Arrival", &[SciFi]),
    ("Ex Machina", &[SciFi]),
    ("Interstellar", &[SciFi]),
    ("The Martian", &[SciFi]),
    ("District 9", &[SciFi]),
    ("Moon", &[SciFi]),
    ("Her", &[SciFi]),
    ("Looper", &[SciFi]),
    ("Source Code", &[SciFi]),
    ("Edge of Tomorrow", &[SciFi]),
    ("Get Out", &[Horror]),
    ("Hereditary", &[Horror]),
    ("The Witch", &[Horror]),
    ("A Quiet Place", &[Horror]),
    ("It Follows", &[Horror]),
    ("The Babadook", &[Horror]),
    ("The Conjuring", &[Horror]),
    ("Insidious", &[Horror]),
    ("Sinister", &[Horror]),
    ("The Descent", &[Horror]),
    ("28 Days Later", &[Horror]),
    ("The Cabin in the Woods", &[Horror]),
    ("Indiana Jones and the Raiders of the Lost Ark", &[Adventure]),
    ("Jurassic Park", &[Adventure]),
    ("The Mummy", &[Adventure]),
    ("National Treasure", &[Adventure]),
    ("The Goonies", &[Adventure]),
    ("The NeverEnding Story", &[Adventure]),
    ("Hook", &[Adventure]),
    ("Jumanji", &[Adventure]),
    ("The Mask of Zorro", &[Adventure]),
    ("The Three Musketeers", &[Adventure]),
    ("Robin Hood: Prince of Thieves", &[Adventure]),
    ("Spirited Away", &[Animation]),
    ("Toy Story", &[Animation]),
    ("Finding Nemo", &[Animation]),
    ("The Lion King", &[Animation]),
    ("Frozen", &[Animation]),
    ("Moana", &[Animation]),
    ("Coco", &[Animation]),
    ("Inside Out", &[Animation]),
    ("Up", &[Animation]),
    ("Wall-E", &[Animation]),
    ("Ratatouille", &[Animation]),
    ("Monsters, Inc.", &[Animation]),
    ("3 Idiots", &[Indian]),
    ("Dangal", &[Indian]),
    ("PK", &[Indian]),
    ("Lagaan", &[Indian]),
    ("Rang De Basanti", &[Indian]),
    ("Swades", &[Indian]),
    ("Taare Zameen Par", &[Indian]),
    ("Queen", &[Indian]),
    ("Gully Boy", &[Indian]),
    ("Andhadhun", &[Indian]),
    ("Article 15", &[Indian]),
    ("Thappad", &[Indian]),
    ("Pink", &[Indian]),
    ("Masaan", &[Indian]),
    ("Parasite", &[International]),
    ("Oldboy", &[International]),
    ("The Handmaiden", &[International]),
    ("Train to Busan", &[International]),
    ("Memories of Murder", &[International]),
    ("Amélie", &[International]),
    ("The Intouchables", &[International]),
    ("La Haine", &[International]),
    ("Run Lola Run", &[International]),
    ("City of God", &[International]),
    ("Y Tu Mamá También", &[International]),
    ("Pan's Labyrinth", &[International]),
    ("The Lives of Others", &[International]),
    ("Downfall", &[International]),
];

/// Titles offered for rating when no provider produced a survey list
pub const SURVEY_FALLBACK: [&str; 10] = [
    "The Shawshank Redemption",
    "The Godfather",
    "Pulp Fiction",
    "Fight Club",
    "Inception",
    "The Dark Knight",
    "Forrest Gump",
    "The Matrix",
    "Goodfellas",
    "The Silence of the Lambs",
];

/// Used to top up a short AI survey list
pub const SURVEY_PADDING: [&str; 5] = [
    "The Green Mile",
    "Schindler's List",
    "12 Angry Men",
    "The Departed",
    "The Prestige",
];

pub fn all_titles() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(title, _)| *title)
}

/// Genres the catalog files `title` under, matched case-insensitively
pub fn genres_of(title: &str) -> &'static [Genre] {
    CATALOG
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(title.trim()))
        .map(|(_, genres)| *genres)
        .unwrap_or(&[])
}

/// Case-insensitive substring search, `None` when the query is too short
pub fn search(query: &str) -> Option<Vec<&'static str>> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_QUERY_LEN {
        return None;
    }

    Some(
        all_titles()
            .filter(|title| title.to_lowercase().contains(&query))
            .take(MAX_SEARCH_RESULTS)
            .collect(),
    )
}

/// Static recommendations for a user whose favorite genre is `favorite_genre`
///
/// Titles in `exclude` (lowercased) are skipped. When nothing in the matching
/// genres is left, any remaining catalog title is used instead.
pub fn fallback_titles(
    favorite_genre: Option<&str>,
    exclude: &HashSet<String>,
    count: usize,
) -> Vec<String> {
    let wanted = favorite_genre.map(Genre::detect).unwrap_or_default();
    let available = || {
        CATALOG
            .iter()
            .filter(|(title, _)| !exclude.contains(&title.to_lowercase()))
    };

    let by_genre: Vec<String> = available()
        .filter(|(_, genres)| genres.iter().any(|g| wanted.contains(g)))
        .take(count)
        .map(|(title, _)| title.to_string())
        .collect();

    if !by_genre.is_empty() {
        return by_genre;
    }

    available()
        .take(count)
        .map(|(title, _)| title.to_string())
        .collect()
}
