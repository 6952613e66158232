//! Catalog genre id mapping
//!
//! Maps the catalog's numeric genre ids to display names for profile
//! analysis and prompt text. Unrecognized ids land in an "Unknown"
//! catch-all bucket rather than being dropped.

/// Display name for a catalog genre id.
pub fn genre_name(id: u16) -> &'static str {
    match id {
        28 => "Action",
        12 => "Adventure",
        16 => "Animation",
        35 => "Comedy",
        80 => "Crime",
        99 => "Documentary",
        18 => "Drama",
        10751 => "Family",
        14 => "Fantasy",
        36 => "History",
        27 => "Horror",
        10402 => "Music",
        9648 => "Mystery",
        10749 => "Romance",
        878 => "Science Fiction",
        53 => "Thriller",
        10752 => "War",
        37 => "Western",
        10759 => "Action & Adventure",
        10765 => "Sci-Fi & Fantasy",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_ids() {
        assert_eq!(genre_name(28), "Action");
        assert_eq!(genre_name(878), "Science Fiction");
    }

    #[test]
    fn unknown_ids_fall_through() {
        assert_eq!(genre_name(4242), "Unknown");
    }
}
